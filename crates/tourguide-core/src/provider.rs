use async_trait::async_trait;

use crate::error::Result;
use crate::prompt::GuideRequest;
use crate::state::CitationLink;

/// A grounding source attached to a generated answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    Map(CitationLink),
    Web(CitationLink),
    /// A category we do not render
    Unknown,
}

impl Citation {
    pub fn into_link(self) -> Option<CitationLink> {
        match self {
            Citation::Map(link) | Citation::Web(link) => Some(link),
            Citation::Unknown => None,
        }
    }
}

/// Normalized provider output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideReply {
    /// Generated text; `None` when the model produced nothing
    pub text: Option<String>,
    pub citations: Vec<Citation>,
}

/// A backend capable of answering a composed guide request.
#[async_trait]
pub trait GuideProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn generate(&self, request: &GuideRequest) -> Result<GuideReply>;
}
