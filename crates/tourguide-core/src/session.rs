use tracing::info;

use crate::conversation::{Conversation, SavedGuides};
use crate::guide::{GuideAnswer, GuideService};
use crate::state::{
    ChatMessage, Coordinates, LocationState, SavedGuide, UserPreferences,
};

/// Everything the guide needs to answer one message, captured at send time
#[derive(Debug, Clone)]
pub struct PendingExchange {
    pub message: String,
    pub history: Vec<ChatMessage>,
    pub preferences: UserPreferences,
    pub location: LocationState,
}

impl PendingExchange {
    pub async fn run(&self, service: &GuideService) -> GuideAnswer {
        service
            .chat(&self.message, &self.history, &self.preferences, &self.location)
            .await
    }
}

/// In-memory state for one chat session
#[derive(Debug, Clone)]
pub struct Session {
    conversation: Conversation,
    preferences: UserPreferences,
    location: LocationState,
    saved_guides: SavedGuides,
    in_flight: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            conversation: Conversation::with_welcome(),
            preferences: UserPreferences::default(),
            location: LocationState::default(),
            saved_guides: SavedGuides::new(),
            in_flight: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn location(&self) -> &LocationState {
        &self.location
    }

    pub fn saved_guides(&self) -> &SavedGuides {
        &self.saved_guides
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Start an exchange. Returns `None` for blank text or while another
    /// exchange is awaiting its answer.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingExchange> {
        if text.trim().is_empty() || self.in_flight {
            return None;
        }

        let history = self.conversation.messages().to_vec();
        self.conversation.push(ChatMessage::user(text));
        self.in_flight = true;

        Some(PendingExchange {
            message: text.to_string(),
            history,
            preferences: self.preferences.clone(),
            location: self.location.clone(),
        })
    }

    pub fn complete_send(&mut self, answer: GuideAnswer) -> &ChatMessage {
        self.conversation
            .push(ChatMessage::assistant(answer.text, answer.links));
        self.in_flight = false;
        // just pushed
        &self.conversation.messages()[self.conversation.len() - 1]
    }

    /// Run a whole exchange. Returns false when the send was a no-op.
    pub async fn send(&mut self, service: &GuideService, text: &str) -> bool {
        let Some(pending) = self.begin_send(text) else {
            return false;
        };
        let answer = pending.run(service).await;
        self.complete_send(answer);
        true
    }

    pub fn update_preferences(&mut self, preferences: UserPreferences) {
        info!(
            budget = preferences.budget.as_str(),
            style = preferences.travel_style.as_str(),
            "Preferences updated"
        );
        self.preferences = preferences;
    }

    pub fn set_manual_location(&mut self, address: &str) {
        self.location = LocationState::manual(address);
    }

    pub fn apply_detected_location(&mut self, coords: Coordinates) {
        self.location = LocationState::detected(coords);
    }

    /// Snapshot an assistant message into the saved guides.
    pub fn save_guide(&mut self, message_id: &str) -> Option<&SavedGuide> {
        let message = self.conversation.get(message_id)?;
        if !message.is_assistant() {
            return None;
        }
        let guide = SavedGuide::from_message(message, &self.location);
        info!(id = %guide.id, title = %guide.title, "Guide saved");
        self.saved_guides.add(guide);
        self.saved_guides.guides().last()
    }

    pub fn delete_saved_guide(&mut self, id: &str) -> bool {
        self.saved_guides.remove(id).is_some()
    }

    /// Delete the saved guide at a list position.
    pub fn delete_saved_guide_at(&mut self, idx: usize) -> bool {
        match self.saved_guides.remove_at(idx) {
            Some(guide) => {
                info!(id = %guide.id, title = %guide.title, "Guide deleted");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_send_is_noop() {
        let mut session = Session::new();
        assert!(session.begin_send("   \n\t").is_none());
        assert!(session.begin_send("").is_none());
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_begin_send_snapshots_history_before_message() {
        let mut session = Session::new();
        let pending = session.begin_send("Best tacos?").unwrap();
        assert_eq!(pending.history.len(), 1);
        assert_eq!(pending.history[0].id, "welcome");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, "Best tacos?");
        assert!(session.is_in_flight());
    }

    #[test]
    fn test_second_send_while_in_flight_is_noop() {
        let mut session = Session::new();
        session.begin_send("one").unwrap();
        assert!(session.begin_send("two").is_none());
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_complete_send_clears_in_flight() {
        let mut session = Session::new();
        session.begin_send("one").unwrap();
        let msg = session.complete_send(GuideAnswer {
            text: "answer".to_string(),
            links: Vec::new(),
        });
        assert_eq!(msg.content, "answer");
        assert!(!session.is_in_flight());
        assert!(session.begin_send("two").is_some());
    }

    #[test]
    fn test_cannot_save_user_message() {
        let mut session = Session::new();
        session.begin_send("hello").unwrap();
        let user_id = session.messages()[1].id.clone();
        assert!(session.save_guide(&user_id).is_none());
        assert!(session.saved_guides().is_empty());
    }

    #[test]
    fn test_manual_location_clears_detection() {
        let mut session = Session::new();
        session.apply_detected_location(Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        });
        assert!(session.location().is_auto_detected);

        session.set_manual_location("Kyoto, Japan");
        assert_eq!(session.location().address, "Kyoto, Japan");
        assert_eq!(session.location().lat, None);
        assert_eq!(session.location().lng, None);
        assert!(!session.location().is_auto_detected);
    }
}
