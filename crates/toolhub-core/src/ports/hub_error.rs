//! Service-level error types for hub operations.

use thiserror::Error;

use super::ConfigStoreError;

/// Domain-specific errors for hub service operations.
///
/// This error type wraps store errors and adds service-level failure
/// modes without leaking infrastructure details (OS process errors,
/// storage errors, etc.).
#[derive(Debug, Error)]
pub enum HubServiceError {
    /// Config store operation failed.
    #[error(transparent)]
    Store(#[from] ConfigStoreError),

    /// The referenced server is not registered.
    #[error("Tool server not found: {0}")]
    NotFound(String),

    /// The server failed the security gate.
    #[error("Security check failed: {0}")]
    Security(String),

    /// Server failed to start or discovery failed.
    #[error("Failed to start tool server: {0}")]
    StartFailed(String),

    /// Operation requires a running server.
    #[error("Tool server not running: {0}")]
    NotRunning(String),

    /// Tool invocation failed at the transport level.
    #[error("Tool call error: {0}")]
    ToolError(String),

    /// Configuration validation error.
    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),

    /// Internal service error.
    #[error("Internal hub error: {0}")]
    Internal(String),
}

/// User-safe error information for hub events.
///
/// This type is used in `HubEvent::ServerError` to provide error details
/// that are safe to display (no raw process or transport errors).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubErrorInfo {
    /// Identifier of the server (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,

    /// Display name of the server.
    pub server_name: String,

    /// User-friendly error message.
    pub message: String,

    /// Error category for UI handling.
    pub category: HubErrorCategory,
}

/// Categories of hub errors for UI handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubErrorCategory {
    /// Security gate rejection.
    Security,
    /// Server process or transport lifecycle error.
    Process,
    /// Tool invocation error.
    Tool,
    /// Configuration error.
    Configuration,
    /// Unknown/internal error.
    Unknown,
}

impl From<&HubServiceError> for HubErrorCategory {
    fn from(error: &HubServiceError) -> Self {
        match error {
            HubServiceError::Store(_) | HubServiceError::Internal(_) => Self::Unknown,
            HubServiceError::Security(_) => Self::Security,
            HubServiceError::NotFound(_)
            | HubServiceError::StartFailed(_)
            | HubServiceError::NotRunning(_) => Self::Process,
            HubServiceError::ToolError(_) => Self::Tool,
            HubServiceError::InvalidConfig(_) => Self::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lock down the error-to-category mapping used for event payloads.
    #[test]
    fn test_category_mapping_covers_every_variant() {
        let cases = vec![
            (
                HubServiceError::Store(ConfigStoreError::Internal("disk".to_string())),
                HubErrorCategory::Unknown,
            ),
            (
                HubServiceError::Internal("bug".to_string()),
                HubErrorCategory::Unknown,
            ),
            (
                HubServiceError::Security("untrusted".to_string()),
                HubErrorCategory::Security,
            ),
            (
                HubServiceError::NotFound("s1".to_string()),
                HubErrorCategory::Process,
            ),
            (
                HubServiceError::StartFailed("spawn".to_string()),
                HubErrorCategory::Process,
            ),
            (
                HubServiceError::NotRunning("s1".to_string()),
                HubErrorCategory::Process,
            ),
            (
                HubServiceError::ToolError("timeout".to_string()),
                HubErrorCategory::Tool,
            ),
            (
                HubServiceError::InvalidConfig("blank id".to_string()),
                HubErrorCategory::Configuration,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(HubErrorCategory::from(&error), expected, "{error}");
        }
    }
}
