use serde::Serialize;

/// Failure of one API call, classified the way the dashboard reacts to it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 401, or no stored session. The user has to log in again.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// 400 with the server's message.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    /// 404 with the entity-specific message.
    #[error("{0}")]
    NotFound(String),

    #[error("Could not reach the server, please check your connection and try again")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    /// Classifies a non-success HTTP status and the envelope's message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClientError::SessionExpired,
            400 | 422 => ClientError::Validation(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            _ => ClientError::Server { status, message },
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Uniform result handed to the presentation layer. Built from any call
/// result, so errors never escape as anything but `success: false`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOutcome<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiOutcome<T> {
    pub fn from_result(result: Result<T, ClientError>, success_message: &str) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                message: success_message.to_string(),
                requires_auth: false,
                data: Some(data),
            },
            Err(err) => Self::failure(&err),
        }
    }

    pub fn failure(err: &ClientError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            requires_auth: err.requires_auth(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ClientError::from_status(401, "whatever".to_string()),
            ClientError::SessionExpired
        ));
        assert!(matches!(
            ClientError::from_status(400, "Lead name is required".to_string()),
            ClientError::Validation(m) if m == "Lead name is required"
        ));
        assert!(matches!(
            ClientError::from_status(404, "Lead not found".to_string()),
            ClientError::NotFound(m) if m == "Lead not found"
        ));
        assert!(matches!(
            ClientError::from_status(503, "down".to_string()),
            ClientError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn test_outcome_distinguishes_session_expiry() {
        let expired: ApiOutcome<()> = ApiOutcome::from_result(Err(ClientError::SessionExpired), "ok");
        assert!(!expired.success);
        assert!(expired.requires_auth);

        let network: ApiOutcome<()> =
            ApiOutcome::from_result(Err(ClientError::Network("refused".to_string())), "ok");
        assert!(!network.requires_auth);
        assert!(network.message.contains("try again"));

        let value = serde_json::to_value(&network).unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("requiresAuth").is_none());
        assert!(value.get("data").is_none());

        let ok = ApiOutcome::from_result(Ok(3), "Leads fetched");
        assert!(ok.success);
        assert_eq!(ok.data, Some(3));
    }
}
