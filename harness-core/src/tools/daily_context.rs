//! DailyContext: a small asynchronous tool environment.
//!
//! Lookups start a background job and return before the job finishes. By
//! default the job comes back to the driver as a [`ToolOutcome::Deferred`]
//! handle. In future-id mode the model instead gets `{"future_id": ...}` and
//! must collect the result itself.
//!
//! Two function sets exist. [`DailyContextVersion::V1`] looks up temperatures
//! by location and collects them with `eval_future`. [`DailyContextVersion::V2`]
//! keys temperatures on location and time, adds a location lookup plus two
//! clock functions, and collects results with `get_future`.

use crate::config::constants::tools;
use crate::llm::types::{ArgumentMap, ToolDeclaration};
use crate::tools::{JobHandle, ToolExecutor, ToolOutcome};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use rand::RngCore;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

const UNKNOWN_FUTURE: &str = "Unknown future_id";
const WRONG_FORMAT: &str = "location or time in wrong format";

const STANFORD: &str = "Stanford";
const BERKELEY: &str = "Berkeley";
const WORK_TIME: &str = "9:00";
const CURRENT_TIME: &str = "8:00";

/// Which DailyContext function set to expose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DailyContextVersion {
    #[default]
    V1,
    V2,
}

impl DailyContextVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    /// Declarations for the functions this version implements
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        match self {
            Self::V1 => v1_declarations(),
            Self::V2 => v2_declarations(),
        }
    }
}

impl fmt::Display for DailyContextVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DailyContextVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            other => Err(format!("unknown DailyContext version '{other}' (expected v1 or v2)")),
        }
    }
}

enum Job {
    Running(JoinHandle<Value>),
    Finished(Value),
}

pub struct DailyContext {
    jobs: Mutex<HashMap<String, Job>>,
    latency: Duration,
    future_ids: bool,
    version: DailyContextVersion,
}

impl Default for DailyContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DailyContext {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            latency: Duration::from_millis(50),
            future_ids: false,
            version: DailyContextVersion::V1,
        }
    }

    /// Simulated duration of a lookup
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Return `{"future_id": ...}` to the model instead of a deferred handle
    pub fn with_future_ids(mut self) -> Self {
        self.future_ids = true;
        self
    }

    pub fn with_version(mut self, version: DailyContextVersion) -> Self {
        self.version = version;
        self
    }

    /// Declarations for the functions this environment implements
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.version.declarations()
    }

    /// Register a background job that yields `body` after the lookup latency
    async fn submit(&self, body: Value) -> ToolOutcome {
        let id = future_id();
        let latency = self.latency;
        let job = tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            body
        });
        self.jobs.lock().await.insert(id.clone(), Job::Running(job));
        debug!(future_id = %id, version = %self.version, "lookup started");
        if self.future_ids {
            ToolOutcome::Ready(json!({ "future_id": id }).to_string())
        } else {
            ToolOutcome::Deferred(JobHandle::new(id))
        }
    }

    /// Await a registered job. `None` if the id is unknown. With `keep` the
    /// finished body stays registered so the id can be polled again.
    async fn await_job(&self, id: &str, keep: bool) -> Option<Result<Value>> {
        let job = self.jobs.lock().await.remove(id)?;
        let body = match job {
            Job::Finished(body) => body,
            Job::Running(handle) => match handle.await {
                Ok(body) => body,
                Err(e) => return Some(Err(anyhow!("lookup failed: {e}"))),
            },
        };
        if keep {
            self.jobs
                .lock()
                .await
                .insert(id.to_string(), Job::Finished(body.clone()));
        }
        Some(Ok(body))
    }

    async fn collect(&self, args: &ArgumentMap, keep: bool) -> Result<ToolOutcome> {
        let id = string_arg(args, "future_id")?;
        let body = match self.await_job(&id, keep).await {
            Some(result) => result?,
            None => json!({ "error": UNKNOWN_FUTURE }),
        };
        Ok(ToolOutcome::Ready(body.to_string()))
    }
}

#[async_trait]
impl ToolExecutor for DailyContext {
    async fn execute(&self, name: &str, args: &ArgumentMap) -> Result<ToolOutcome> {
        use DailyContextVersion::{V1, V2};

        match (self.version, name) {
            (V1, tools::GET_TEMPERATURE) => {
                let location = string_arg(args, "location")?;
                Ok(self.submit(temperature_in(&location)).await)
            }
            (V1, tools::EVAL_FUTURE) => self.collect(args, false).await,
            (V1, tools::SUBTRACT) => {
                let a = number_arg(args, "a")?;
                let b = number_arg(args, "b")?;
                Ok(ToolOutcome::Ready(json!({ "result": a - b }).to_string()))
            }
            (V2, tools::GET_TEMPERATURE) => {
                let location = string_arg(args, "location")?;
                let time = string_arg(args, "time")?;
                Ok(self.submit(temperature_at(&location, &time)).await)
            }
            (V2, tools::GET_LOCATION) => {
                let time = string_arg(args, "time")?;
                Ok(self.submit(location_at(&time)).await)
            }
            (V2, tools::GET_FUTURE) => self.collect(args, true).await,
            (V2, tools::GET_WORK_TIME) => {
                Ok(ToolOutcome::Ready(json!({ "result": WORK_TIME }).to_string()))
            }
            (V2, tools::GET_CURRENT_TIME) => {
                Ok(ToolOutcome::Ready(json!({ "result": CURRENT_TIME }).to_string()))
            }
            (_, other) => bail!("Unknown function '{other}'"),
        }
    }

    async fn resolve(&self, handle: &JobHandle) -> Result<String> {
        let body = self
            .await_job(handle.as_str(), false)
            .await
            .with_context(|| format!("{UNKNOWN_FUTURE}: {handle}"))??;
        Ok(body.to_string())
    }
}

fn temperature_in(location: &str) -> Value {
    let value = if location == STANFORD { 30.0 } else { 20.0 };
    json!({ "result": value })
}

fn temperature_at(location: &str, time: &str) -> Value {
    if ![STANFORD, BERKELEY].contains(&location) || ![WORK_TIME, CURRENT_TIME].contains(&time) {
        return json!({ "error": WRONG_FORMAT });
    }
    let value = match (location, time) {
        (STANFORD, WORK_TIME) => 30.0,
        (BERKELEY, CURRENT_TIME) => 20.0,
        _ => 40.4,
    };
    json!({ "result": value })
}

fn location_at(time: &str) -> Value {
    match time {
        WORK_TIME => json!({ "result": STANFORD }),
        CURRENT_TIME => json!({ "result": BERKELEY }),
        _ => json!({ "error": WRONG_FORMAT }),
    }
}

fn v1_declarations() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration::new(
            tools::GET_TEMPERATURE,
            "Start looking up the current temperature in a location. Returns a future_id.",
            json!({
                "type": "dict",
                "properties": {
                    "location": {"type": "string", "description": "City name, e.g. Stanford."}
                },
                "required": ["location"]
            }),
        ),
        ToolDeclaration::new(
            tools::EVAL_FUTURE,
            "Wait for a pending lookup and return its result.",
            json!({
                "type": "dict",
                "properties": {
                    "future_id": {"type": "string", "description": "Identifier returned by get_temperature."}
                },
                "required": ["future_id"]
            }),
        ),
        ToolDeclaration::new(
            tools::SUBTRACT,
            "Subtract one number from another.",
            json!({
                "type": "dict",
                "properties": {
                    "a": {"type": "float", "description": "Number to subtract from."},
                    "b": {"type": "float", "description": "Number to subtract."}
                },
                "required": ["a", "b"]
            }),
        ),
    ]
}

fn v2_declarations() -> Vec<ToolDeclaration> {
    let dummy = json!({
        "type": "dict",
        "properties": {
            "dummy": {"type": "boolean", "description": "Unused; pass true."}
        },
        "required": []
    });
    vec![
        ToolDeclaration::new(
            tools::GET_TEMPERATURE,
            "Start looking up the temperature in a location at a given time. Returns a future_id.",
            json!({
                "type": "dict",
                "properties": {
                    "location": {"type": "string", "description": "City name, e.g. Stanford."},
                    "time": {"type": "string", "description": "Time of day as H:MM, e.g. 9:00."}
                },
                "required": ["location", "time"]
            }),
        ),
        ToolDeclaration::new(
            tools::GET_LOCATION,
            "Start looking up where the user is at a given time. Returns a future_id.",
            json!({
                "type": "dict",
                "properties": {
                    "time": {"type": "string", "description": "Time of day as H:MM, e.g. 8:00."}
                },
                "required": ["time"]
            }),
        ),
        ToolDeclaration::new(
            tools::GET_FUTURE,
            "Wait for a pending lookup and return its result.",
            json!({
                "type": "dict",
                "properties": {
                    "future_id": {"type": "string", "description": "Identifier returned by a lookup."}
                },
                "required": ["future_id"]
            }),
        ),
        ToolDeclaration::new(
            tools::GET_WORK_TIME,
            "Get the time the user starts work.",
            dummy.clone(),
        ),
        ToolDeclaration::new(
            tools::GET_CURRENT_TIME,
            "Get the current time.",
            dummy,
        ),
    ]
}

fn future_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn string_arg(args: &ArgumentMap, key: &str) -> Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .with_context(|| format!("missing string argument '{key}'"))
}

fn number_arg(args: &ArgumentMap, key: &str) -> Result<f64> {
    args.get(key)
        .and_then(Value::as_f64)
        .with_context(|| format!("missing numeric argument '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, Value)]) -> ArgumentMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn v2() -> DailyContext {
        DailyContext::new().with_version(DailyContextVersion::V2)
    }

    async fn ready(env: &DailyContext, name: &str, call_args: ArgumentMap) -> String {
        match env.execute(name, &call_args).await.expect("execute") {
            ToolOutcome::Ready(body) => body,
            ToolOutcome::Deferred(handle) => panic!("expected ready outcome, got {handle}"),
        }
    }

    async fn deferred(env: &DailyContext, name: &str, call_args: ArgumentMap) -> String {
        match env.execute(name, &call_args).await.expect("execute") {
            ToolOutcome::Deferred(handle) => env.resolve(&handle).await.expect("resolve"),
            ToolOutcome::Ready(body) => panic!("expected deferred outcome, got {body}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_lookup_resolves_to_temperature() {
        let env = DailyContext::new();
        let outcome = env
            .execute(tools::GET_TEMPERATURE, &args(&[("location", json!("Stanford"))]))
            .await
            .expect("execute");
        let ToolOutcome::Deferred(handle) = outcome else {
            panic!("expected deferred outcome");
        };
        assert_eq!(handle.as_str().len(), 32);
        assert_eq!(env.resolve(&handle).await.expect("resolve"), r#"{"result":30.0}"#);
        // a handle resolves once
        assert!(env.resolve(&handle).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn future_id_mode_goes_through_eval_future() {
        let env = DailyContext::new().with_future_ids();
        let body = ready(
            &env,
            tools::GET_TEMPERATURE,
            args(&[("location", json!("Berkeley"))]),
        )
        .await;
        let body: Value = serde_json::from_str(&body).expect("json");
        let id = body["future_id"].as_str().expect("future id").to_string();

        let result = ready(&env, tools::EVAL_FUTURE, args(&[("future_id", json!(id))])).await;
        assert_eq!(result, r#"{"result":20.0}"#);
    }

    #[tokio::test]
    async fn unknown_future_is_content_not_error() {
        let env = DailyContext::new();
        let result = ready(&env, tools::EVAL_FUTURE, args(&[("future_id", json!("nope"))])).await;
        assert_eq!(result, r#"{"error":"Unknown future_id"}"#);

        let result = ready(&v2(), tools::GET_FUTURE, args(&[("future_id", json!("nope"))])).await;
        assert_eq!(result, r#"{"error":"Unknown future_id"}"#);
    }

    #[tokio::test]
    async fn subtract_and_bad_calls() {
        let env = DailyContext::new();
        let result = ready(
            &env,
            tools::SUBTRACT,
            args(&[("a", json!(30.0)), ("b", json!(20))]),
        )
        .await;
        assert_eq!(result, r#"{"result":10.0}"#);

        assert!(env.execute(tools::SUBTRACT, &args(&[("a", json!(1))])).await.is_err());
        assert!(env.execute("launch_rocket", &ArgumentMap::new()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn v2_temperature_depends_on_location_and_time() {
        let env = v2();
        let cases = [
            ("Stanford", "9:00", r#"{"result":30.0}"#),
            ("Berkeley", "8:00", r#"{"result":20.0}"#),
            ("Stanford", "8:00", r#"{"result":40.4}"#),
            ("Berkeley", "9:00", r#"{"result":40.4}"#),
        ];
        for (location, time, expected) in cases {
            let call = args(&[("location", json!(location)), ("time", json!(time))]);
            assert_eq!(deferred(&env, tools::GET_TEMPERATURE, call).await, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn v2_wrong_format_is_reported_as_content() {
        let env = v2();
        let wrong = r#"{"error":"location or time in wrong format"}"#;
        for (location, time) in [("Palo Alto", "9:00"), ("Stanford", "09:00"), ("stanford", "8:00")] {
            let call = args(&[("location", json!(location)), ("time", json!(time))]);
            assert_eq!(deferred(&env, tools::GET_TEMPERATURE, call).await, wrong);
        }
        let call = args(&[("time", json!("noon"))]);
        assert_eq!(deferred(&env, tools::GET_LOCATION, call).await, wrong);
    }

    #[tokio::test(start_paused = true)]
    async fn v2_location_follows_time() {
        let env = v2();
        let call = args(&[("time", json!("9:00"))]);
        assert_eq!(deferred(&env, tools::GET_LOCATION, call).await, r#"{"result":"Stanford"}"#);
        let call = args(&[("time", json!("8:00"))]);
        assert_eq!(deferred(&env, tools::GET_LOCATION, call).await, r#"{"result":"Berkeley"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn v2_get_future_can_be_polled_again() {
        let env = v2().with_future_ids();
        let body = ready(&env, tools::GET_LOCATION, args(&[("time", json!("9:00"))])).await;
        let body: Value = serde_json::from_str(&body).expect("json");
        let id = body["future_id"].as_str().expect("future id").to_string();

        for _ in 0..2 {
            let result = ready(&env, tools::GET_FUTURE, args(&[("future_id", json!(id))])).await;
            assert_eq!(result, r#"{"result":"Stanford"}"#);
        }
    }

    #[tokio::test]
    async fn v2_clock_functions_answer_immediately() {
        let env = v2();
        let dummy = args(&[("dummy", json!(true))]);
        assert_eq!(ready(&env, tools::GET_WORK_TIME, dummy.clone()).await, r#"{"result":"9:00"}"#);
        assert_eq!(ready(&env, tools::GET_CURRENT_TIME, dummy).await, r#"{"result":"8:00"}"#);
        // the dummy flag is optional
        let result = ready(&env, tools::GET_CURRENT_TIME, ArgumentMap::new()).await;
        assert_eq!(result, r#"{"result":"8:00"}"#);
    }

    #[tokio::test]
    async fn versions_do_not_share_functions() {
        let v1_only = args(&[("a", json!(1)), ("b", json!(2))]);
        assert!(v2().execute(tools::SUBTRACT, &v1_only).await.is_err());
        assert!(DailyContext::new().execute(tools::GET_WORK_TIME, &ArgumentMap::new()).await.is_err());
        // v2 lookups need a time
        let call = args(&[("location", json!("Stanford"))]);
        assert!(v2().execute(tools::GET_TEMPERATURE, &call).await.is_err());
    }

    #[test]
    fn declarations_cover_every_function() {
        let names = |env: DailyContext| -> Vec<String> {
            env.declarations().into_iter().map(|d| d.name).collect()
        };
        assert_eq!(
            names(DailyContext::new()),
            [tools::GET_TEMPERATURE, tools::EVAL_FUTURE, tools::SUBTRACT]
        );
        assert_eq!(
            names(v2()),
            [
                tools::GET_TEMPERATURE,
                tools::GET_LOCATION,
                tools::GET_FUTURE,
                tools::GET_WORK_TIME,
                tools::GET_CURRENT_TIME
            ]
        );
        let temperature = &v2().declarations()[0];
        assert_eq!(temperature.parameters["required"], json!(["location", "time"]));
    }

    #[test]
    fn version_parses_from_cli_text() {
        assert_eq!("v2".parse::<DailyContextVersion>(), Ok(DailyContextVersion::V2));
        assert_eq!("V1".parse::<DailyContextVersion>(), Ok(DailyContextVersion::V1));
        assert_eq!("2".parse::<DailyContextVersion>(), Ok(DailyContextVersion::V2));
        assert!("v3".parse::<DailyContextVersion>().is_err());
        assert_eq!(DailyContextVersion::default().to_string(), "v1");
    }
}
