pub mod ai;
pub mod config;
pub mod conversation;
pub mod editor;
pub mod error;
pub mod guide;
pub mod location;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::GeminiClient;
pub use config::Config;
pub use conversation::{Conversation, SavedGuides};
pub use editor::{PreferenceDraft, PreferenceField};
pub use error::{GuideError, Result};
pub use guide::{GuideAnswer, GuideService, APOLOGY_TEXT, FALLBACK_TEXT};
pub use location::{IpLocator, Locator};
pub use prompt::{compose_request, GuideRequest, QuickReply, QUICK_REPLIES};
pub use provider::{Citation, GuideProvider, GuideReply};
pub use session::{PendingExchange, Session};
pub use state::{
    Budget, ChatMessage, ChatRole, CitationLink, Coordinates, LocationState, SavedGuide,
    TravelStyle, UserPreferences,
};
