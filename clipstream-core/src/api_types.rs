use serde::{Deserialize, Serialize};

/// Standard API envelope used by the REST server.
///
/// Success responses carry `success: true` plus the payload; the error side
/// of the envelope is produced by the server's boundary translator so that
/// failures always serialize as `{"success": false, "message": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "data": 42}));
    }

    #[test]
    fn message_is_carried_when_set() {
        let body =
            serde_json::to_value(ApiResponse::success(()).with_message("created")).unwrap();
        assert_eq!(body["message"], "created");
    }
}
