use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "Error";

/// Common JSON envelope shared by every API response.
///
/// Handlers flatten it into their payload so a successful sign-in renders as
/// `{"status":"OK","token":"..."}` and a failure as `{"status":"Error","error":"..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self { status: STATUS_OK.to_string(), error: None }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self { status: STATUS_ERROR.to_string(), error: Some(msg.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_omits_error() {
        let v = serde_json::to_value(Response::ok()).unwrap();
        assert_eq!(v, serde_json::json!({"status": "OK"}));
    }

    #[test]
    fn error_envelope_carries_message() {
        let r = Response::error("empty request");
        assert_eq!(r.status, STATUS_ERROR);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "Error");
        assert_eq!(v["error"], "empty request");
    }
}
