use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{GuideError, Result};
use crate::prompt::{GuideRequest, RetrievalTool};
use crate::provider::{Citation, GuideProvider, GuideReply};
use crate::state::CitationLink;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    system_instruction: GeminiContent,
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum GeminiTool {
    GoogleMaps {},
    GoogleSearch {},
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    retrieval_config: RetrievalConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfig {
    lat_lng: LatLng,
}

#[derive(Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<GeminiApiError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    maps: Option<ChunkSource>,
    web: Option<ChunkSource>,
}

#[derive(Deserialize)]
struct ChunkSource {
    title: Option<String>,
    uri: Option<String>,
}

impl ChunkSource {
    fn into_link(self) -> CitationLink {
        CitationLink::new(self.title.unwrap_or_default(), self.uri.unwrap_or_default())
    }
}

impl From<GroundingChunk> for Citation {
    fn from(chunk: GroundingChunk) -> Self {
        if let Some(maps) = chunk.maps {
            Citation::Map(maps.into_link())
        } else if let Some(web) = chunk.web {
            Citation::Web(web.into_link())
        } else {
            Citation::Unknown
        }
    }
}

#[derive(Deserialize)]
struct GeminiApiError {
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "gemini-2.5-flash".to_string(),
            "gemini-2.5-pro".to_string(),
            "gemini-2.0-flash".to_string(),
        ]
    }
}

fn build_request(request: &GuideRequest) -> GeminiRequest {
    let contents = request
        .turns
        .iter()
        .map(|turn| GeminiContent {
            role: Some(turn.role.as_str().to_string()),
            parts: vec![GeminiPart {
                text: Some(turn.text.clone()),
            }],
        })
        .collect();

    let tools = request
        .tools
        .iter()
        .map(|tool| match tool {
            RetrievalTool::Maps => GeminiTool::GoogleMaps {},
            RetrievalTool::Search => GeminiTool::GoogleSearch {},
        })
        .collect();

    let tool_config = request.location_bias.map(|c| ToolConfig {
        retrieval_config: RetrievalConfig {
            lat_lng: LatLng {
                latitude: c.latitude,
                longitude: c.longitude,
            },
        },
    });

    GeminiRequest {
        contents,
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(request.system_instruction.clone()),
            }],
        },
        tools,
        tool_config,
    }
}

/// Reduce a decoded response to text plus citations from the first candidate.
fn parse_response(response: GeminiResponse) -> Result<GuideReply> {
    if let Some(err) = response.error {
        return Err(GuideError::api(200, err.message));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(GuideReply::default());
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let citations = candidate
        .grounding_metadata
        .map(|m| m.grounding_chunks.into_iter().map(Citation::from).collect())
        .unwrap_or_default();

    Ok(GuideReply {
        text: if text.is_empty() { None } else { Some(text) },
        citations,
    })
}

#[async_trait]
impl GuideProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GuideRequest) -> Result<GuideReply> {
        let body = build_request(request);

        debug!(model = %self.model, turns = request.turns.len(), "Sending guide request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .map_or(text, |e| e.message);
            error!(status = %status, "Gemini API error");
            return Err(GuideError::api(status.as_u16(), message));
        }

        let decoded: GeminiResponse = serde_json::from_str(&text)?;
        parse_response(decoded)
    }
}
