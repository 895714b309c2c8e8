//! UI-agnostic session data types
//!
//! Messages, preferences, location and saved guides are shared between the
//! session controller and whatever front end renders them. Nothing here knows
//! about the terminal.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ADDRESS: &str = "Worldwide";
pub const DETECTED_ADDRESS: &str = "Your current area";

/// Interests offered by the preference editor.
pub const INTEREST_OPTIONS: &[&str] = &[
    "History",
    "Food",
    "Nightlife",
    "Nature",
    "Art",
    "Shopping",
    "Adventure",
];

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A citation returned alongside a generated answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationLink {
    pub title: String,
    pub uri: String,
}

impl CitationLink {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }

    /// Title to show, falling back to the URI when the provider sent none.
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.uri
        } else {
            &self.title
        }
    }
}

/// A chat message in the guide conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
    pub links: Option<Vec<CitationLink>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: ChatRole::User,
            content: content.into(),
            timestamp: Local::now(),
            links: None,
        }
    }

    pub fn assistant(content: impl Into<String>, links: Vec<CitationLink>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Local::now(),
            links: Some(links),
        }
    }

    pub fn welcome() -> Self {
        Self {
            id: "welcome".to_string(),
            role: ChatRole::Assistant,
            content: WELCOME_MESSAGE.to_string(),
            timestamp: Local::now(),
            links: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == ChatRole::Assistant
    }

    pub fn links(&self) -> &[CitationLink] {
        self.links.as_deref().unwrap_or(&[])
    }
}

const WELCOME_MESSAGE: &str = "👋 Hi there! I'm your **TourGuide AI**. Whether you're a local or just visiting, I can help you find the best spots, hidden gems, and local secrets. \n\nWhere are we exploring today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Budget {
    Budget,
    #[default]
    MidRange,
    Luxury,
}

impl Budget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Budget => "budget",
            Budget::MidRange => "mid-range",
            Budget::Luxury => "luxury",
        }
    }

    pub fn all() -> Vec<Budget> {
        vec![Budget::Budget, Budget::MidRange, Budget::Luxury]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelStyle {
    #[default]
    Solo,
    Couple,
    Family,
    Group,
}

impl TravelStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelStyle::Solo => "solo",
            TravelStyle::Couple => "couple",
            TravelStyle::Family => "family",
            TravelStyle::Group => "group",
        }
    }

    pub fn all() -> Vec<TravelStyle> {
        vec![
            TravelStyle::Solo,
            TravelStyle::Couple,
            TravelStyle::Family,
            TravelStyle::Group,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub budget: Budget,
    pub travel_style: TravelStyle,
    pub interests: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            budget: Budget::MidRange,
            travel_style: TravelStyle::Solo,
            interests: vec!["Food".to_string(), "History".to_string()],
        }
    }
}

impl UserPreferences {
    pub fn has_interest(&self, interest: &str) -> bool {
        self.interests.iter().any(|i| i == interest)
    }

    /// Add the interest if absent, remove it if present.
    pub fn toggle_interest(&mut self, interest: &str) {
        if self.has_interest(interest) {
            self.interests.retain(|i| i != interest);
        } else {
            self.interests.push(interest.to_string());
        }
    }
}

/// Latitude/longitude pair from location detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: String,
    pub is_auto_detected: bool,
}

impl Default for LocationState {
    fn default() -> Self {
        Self {
            lat: None,
            lng: None,
            address: DEFAULT_ADDRESS.to_string(),
            is_auto_detected: false,
        }
    }
}

impl LocationState {
    pub fn manual(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn detected(coords: Coordinates) -> Self {
        Self {
            lat: Some(coords.latitude),
            lng: Some(coords.longitude),
            address: DETECTED_ADDRESS.to_string(),
            is_auto_detected: true,
        }
    }

    /// Both coordinates, when known.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// Snapshot of an assistant message kept by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGuide {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
}

impl SavedGuide {
    pub fn from_message(message: &ChatMessage, location: &LocationState) -> Self {
        Self {
            id: message.id.clone(),
            title: format!("Guide to {}", location.address),
            content: message.content.clone(),
            date: Local::now().date_naive(),
        }
    }
}
