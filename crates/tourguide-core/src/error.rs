use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuideError {
    #[error("No API key configured. Set GEMINI_API_KEY or add api_key to the config file")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Location lookup failed: {0}")]
    Location(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GuideError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GuideError>;
