use thiserror::Error;

/// Unified error type for Vigil.
#[derive(Error, Debug)]
pub enum VigilError {
    /// Shared-secret check failed. Deliberately carries no detail.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

impl VigilError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            VigilError::Unauthorized => 401,
            VigilError::Serde(_) => 400,
            _ => 500,
        }
    }

    /// JSON error body. Internal failures are not echoed to clients.
    pub fn to_json_body(&self) -> Vec<u8> {
        let msg = match self {
            VigilError::Unauthorized | VigilError::Serde(_) => self.to_string(),
            _ => "Internal server error".to_string(),
        };
        serde_json::json!({ "error": msg }).to_string().into_bytes()
    }
}
