use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{Session, SessionError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const OUT_OF_BOUNDS_CODE: &str = "move target out of bounds";

/// W3C WebDriver client attached to a session someone else started.
/// It never creates, navigates or closes the session.
pub struct WebDriverSession {
    client: Client,
    base: String,
}

impl WebDriverSession {
    pub fn attach(endpoint: &str, session_id: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base = format!("{}/session/{}", endpoint.trim_end_matches('/'), session_id);
        Ok(Self { client, base })
    }

    fn unwrap_value(response: reqwest::blocking::Response) -> Result<Value, SessionError> {
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| SessionError::Transport(format!("invalid response body: {}", e)))?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        match value.get("error").and_then(Value::as_str) {
            Some(code) => Err(classify_error(code, &value)),
            None if !status.is_success() => {
                Err(SessionError::Transport(format!("HTTP {}", status)))
            }
            None => Ok(value),
        }
    }
}

fn classify_error(code: &str, value: &Value) -> SessionError {
    if code == OUT_OF_BOUNDS_CODE {
        return SessionError::OutOfBounds;
    }
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    SessionError::Script {
        code: code.to_string(),
        message,
    }
}

impl Session for WebDriverSession {
    fn page_source(&mut self) -> Result<String, SessionError> {
        let response = self
            .client
            .get(format!("{}/source", self.base))
            .send()
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        let value = Self::unwrap_value(response)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SessionError::Transport("page source is not a string".to_string()))
    }

    fn execute_script(&mut self, script: &str) -> Result<Value, SessionError> {
        debug!("execute: {}", script);
        let response = self
            .client
            .post(format!("{}/execute/sync", self.base))
            .json(&json!({ "script": script, "args": [] }))
            .send()
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Self::unwrap_value(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_builds_session_base() {
        let s = WebDriverSession::attach("http://localhost:4444/", "abc123").unwrap();
        assert_eq!(s.base, "http://localhost:4444/session/abc123");
    }

    #[test]
    fn out_of_bounds_code_is_distinguished() {
        let value = json!({"error": OUT_OF_BOUNDS_CODE, "message": "offset too large"});
        assert!(matches!(
            classify_error(OUT_OF_BOUNDS_CODE, &value),
            SessionError::OutOfBounds
        ));
    }

    #[test]
    fn other_codes_become_script_errors() {
        let value = json!({"error": "javascript error", "message": "x is null"});
        match classify_error("javascript error", &value) {
            SessionError::Script { code, message } => {
                assert_eq!(code, "javascript error");
                assert_eq!(message, "x is null");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
