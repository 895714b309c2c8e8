use std::sync::Arc;

use tracing::{error, info};

use crate::error::GuideError;
use crate::prompt::compose_request;
use crate::provider::{Citation, GuideProvider};
use crate::state::{ChatMessage, CitationLink, LocationState, UserPreferences};

pub const FALLBACK_TEXT: &str = "I'm sorry, I couldn't generate a guide for you right now.";
pub const APOLOGY_TEXT: &str = "Oops! My guide connection seems a bit lost. Please try again.";

/// What the conversation receives for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideAnswer {
    pub text: String,
    pub links: Vec<CitationLink>,
}

impl GuideAnswer {
    pub fn apology() -> Self {
        Self {
            text: APOLOGY_TEXT.to_string(),
            links: Vec::new(),
        }
    }
}

/// Wraps a provider so that every chat resolves to an answer.
#[derive(Clone)]
pub struct GuideService {
    provider: Option<Arc<dyn GuideProvider>>,
}

impl GuideService {
    pub fn new(provider: Arc<dyn GuideProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// A service with no backend: every chat returns the apology.
    pub fn unconfigured() -> Self {
        Self { provider: None }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider_label(&self) -> String {
        match &self.provider {
            Some(p) => format!("{}: {}", p.name(), p.model()),
            None => "no API key".to_string(),
        }
    }

    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatMessage],
        preferences: &UserPreferences,
        location: &LocationState,
    ) -> GuideAnswer {
        let Some(provider) = &self.provider else {
            error!(error = %GuideError::MissingApiKey, "Guide request failed");
            return GuideAnswer::apology();
        };

        let request = compose_request(message, history, preferences, location);

        match provider.generate(&request).await {
            Ok(reply) => {
                let links: Vec<CitationLink> = reply
                    .citations
                    .into_iter()
                    .filter_map(Citation::into_link)
                    .collect();
                info!(links = links.len(), "Guide answered");
                GuideAnswer {
                    text: reply
                        .text
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| FALLBACK_TEXT.to_string()),
                    links,
                }
            }
            Err(e) => {
                error!(error = %e, "Guide request failed");
                GuideAnswer::apology()
            }
        }
    }
}
