use ledgerprep_core::{
    constants::{STATUS_ACCEPTED, STATUS_CREATED, STATUS_OK},
    Error,
};
use serde_json::Value;

/// Status and payload returned by the ledger
///
/// A non-success status is not an error at this layer: callers decide what
/// a given status means for them.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerResponse {
    pub status: u16,
    pub body: Value,
}

impl LedgerResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(STATUS_OK, body)
    }

    pub fn created(body: Value) -> Self {
        Self::new(STATUS_CREATED, body)
    }

    pub fn accepted(message: &str) -> Self {
        Self::new(STATUS_ACCEPTED, serde_json::json!({ "message": message }))
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn is_created(&self) -> bool {
        self.status == STATUS_CREATED
    }

    pub fn is_accepted(&self) -> bool {
        self.status == STATUS_ACCEPTED
    }

    /// Human readable message carried by the body, if any
    pub fn message(&self) -> String {
        match &self.body {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("message").or_else(|| map.get("error")) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => self.body.to_string(),
            },
            other => other.to_string(),
        }
    }

    /// Turn an unexpected status into a rejection error for `function`
    pub fn into_rejection(self, function: impl Into<String>) -> Error {
        let message = self.message();
        Error::ledger_rejection(function, self.status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_from_object_body() {
        let response = LedgerResponse::new(400, json!({"message": "unknown traintuple"}));
        assert_eq!(response.message(), "unknown traintuple");
    }

    #[test]
    fn test_message_from_string_and_null_body() {
        assert_eq!(LedgerResponse::new(500, json!("boom")).message(), "boom");
        assert_eq!(LedgerResponse::new(500, Value::Null).message(), "");
    }

    #[test]
    fn test_into_rejection_keeps_status() {
        let err = LedgerResponse::new(408, json!({"error": "timeout"})).into_rejection("registerData");

        match err {
            Error::LedgerRejection {
                function,
                status,
                message,
            } => {
                assert_eq!(function, "registerData");
                assert_eq!(status, 408);
                assert_eq!(message, "timeout");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_accepted_carries_message() {
        let response = LedgerResponse::accepted("queued");
        assert!(response.is_accepted());
        assert_eq!(response.message(), "queued");
    }
}
