//! Context composition for guide requests
//!
//! Every outbound request carries the conversation so far, a final user turn
//! wrapping the message in the traveler's location and preferences, the fixed
//! guide persona, and the retrieval tools the model may ground on.

use crate::state::{ChatMessage, ChatRole, Coordinates, LocationState, UserPreferences};

pub const SYSTEM_INSTRUCTION: &str = "You are \"TourGuide AI\", a friendly, knowledgeable, and engaging virtual local guide. \n\
Your goal is to help travelers discover the best of any destination. \n\
\n\
Guidelines:\n\
1. Persona: Speak like a local friend who loves their city. Use warm, inviting language.\n\
2. Expertise: Provide detailed info on attractions, history, culture, food, transport, and hidden gems.\n\
3. Customization: Always consider the user's budget, travel style (family, solo, etc.), and interests.\n\
4. Concise but Rich: Give enough detail to be useful but keep it readable for someone on the move.\n\
5. Structure: Use Markdown for formatting. Use bold for names of places. Use bullet points for lists.\n\
6. Safety & Accuracy: Give general travel safety tips but never legal or emergency advice. Include a brief disclaimer that info (prices, hours) can change.\n\
7. Location: If a user asks \"nearby\", use their provided coordinates to suggest specific places. \n\
8. Recommendations: Always try to explain *why* a place is worth visiting.\n\
\n\
Example structure for an itinerary:\n\
### One Day in [City]\n\
- **Morning**: Visit [Place] (Engaging fact...)\n\
- **Lunch**: Eat at [Restaurant] (Known for...)\n\
...etc.";

/// A predefined prompt shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickReply {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const QUICK_REPLIES: &[QuickReply] = &[
    QuickReply {
        id: "attractions",
        label: "🎡 Attractions",
        prompt: "What are the top must-see attractions here?",
    },
    QuickReply {
        id: "food",
        label: "🍜 Local Food",
        prompt: "Recommend some great local food and where to find it.",
    },
    QuickReply {
        id: "transport",
        label: "🚌 Transport",
        prompt: "How do I get around this city easily?",
    },
    QuickReply {
        id: "tips",
        label: "💡 Local Tips",
        prompt: "Give me some local tips and etiquette I should know.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

impl From<ChatRole> for TurnRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => TurnRole::User,
            ChatRole::Assistant => TurnRole::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

/// Retrieval tools the model may use to ground its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTool {
    Maps,
    Search,
}

/// Provider-agnostic request produced by [`compose_request`]
#[derive(Debug, Clone, PartialEq)]
pub struct GuideRequest {
    pub turns: Vec<Turn>,
    pub system_instruction: String,
    pub tools: Vec<RetrievalTool>,
    pub location_bias: Option<Coordinates>,
}

impl GuideRequest {
    /// Text of the final (context-wrapped) user turn.
    pub fn context_prompt(&self) -> Option<&str> {
        self.turns.last().map(|t| t.text.as_str())
    }
}

pub fn build_context_prompt(
    message: &str,
    preferences: &UserPreferences,
    location: &LocationState,
) -> String {
    let coords = location
        .coordinates()
        .map(|c| format!("(Lat: {}, Lng: {})", c.latitude, c.longitude))
        .unwrap_or_default();

    format!(
        "\n[User Context]\nCurrent Location: {} {}\nTraveler Preferences: Budget: {}, Style: {}, Interests: {}\n\n[User Message]\n{}\n",
        location.address,
        coords,
        preferences.budget.as_str(),
        preferences.travel_style.as_str(),
        preferences.interests.join(", "),
        message,
    )
}

/// Build the full request. `history` is the conversation before `message`.
pub fn compose_request(
    message: &str,
    history: &[ChatMessage],
    preferences: &UserPreferences,
    location: &LocationState,
) -> GuideRequest {
    let mut turns: Vec<Turn> = history
        .iter()
        .map(|m| Turn {
            role: m.role.into(),
            text: m.content.clone(),
        })
        .collect();

    turns.push(Turn {
        role: TurnRole::User,
        text: build_context_prompt(message, preferences, location),
    });

    GuideRequest {
        turns,
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        tools: vec![RetrievalTool::Maps, RetrievalTool::Search],
        location_bias: location.coordinates(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Budget, TravelStyle};

    fn prefs() -> UserPreferences {
        UserPreferences {
            budget: Budget::Luxury,
            travel_style: TravelStyle::Family,
            interests: vec!["Art".to_string(), "Nature".to_string(), "Food".to_string()],
        }
    }

    #[test]
    fn test_context_prompt_inlines_preferences() {
        let prompt = build_context_prompt("Where should we eat?", &prefs(), &LocationState::manual("Porto"));
        assert!(prompt.contains("Current Location: Porto "));
        assert!(prompt.contains("Budget: luxury"));
        assert!(prompt.contains("Style: family"));
        assert!(prompt.contains("Interests: Art, Nature, Food"));
        assert!(prompt.ends_with("[User Message]\nWhere should we eat?\n"));
        assert!(!prompt.contains("Lat:"));
    }

    #[test]
    fn test_context_prompt_exact_layout() {
        let prompt = build_context_prompt("hi", &UserPreferences::default(), &LocationState::default());
        assert_eq!(
            prompt,
            "\n[User Context]\nCurrent Location: Worldwide \nTraveler Preferences: Budget: mid-range, Style: solo, Interests: Food, History\n\n[User Message]\nhi\n"
        );
    }

    #[test]
    fn test_context_prompt_with_coordinates() {
        let loc = LocationState::detected(Coordinates {
            latitude: 48.8566,
            longitude: 2.3522,
        });
        let prompt = build_context_prompt("nearby cafes?", &prefs(), &loc);
        assert!(prompt.contains("Current Location: Your current area (Lat: 48.8566, Lng: 2.3522)"));
    }

    #[test]
    fn test_compose_maps_roles_and_appends_context_turn() {
        let history = vec![ChatMessage::welcome(), ChatMessage::user("Hello")];
        let req = compose_request("What now?", &history, &prefs(), &LocationState::default());

        let roles: Vec<TurnRole> = req.turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::Model, TurnRole::User, TurnRole::User]);
        assert_eq!(req.turns[1].text, "Hello");
        assert!(req.context_prompt().unwrap().contains("What now?"));
        assert_eq!(req.system_instruction, SYSTEM_INSTRUCTION);
        assert_eq!(req.tools, vec![RetrievalTool::Maps, RetrievalTool::Search]);
        assert!(req.location_bias.is_none());
    }

    #[test]
    fn test_compose_sets_location_bias() {
        let coords = Coordinates {
            latitude: -33.86,
            longitude: 151.21,
        };
        let req = compose_request("hi", &[], &prefs(), &LocationState::detected(coords));
        assert_eq!(req.location_bias, Some(coords));
    }

    #[test]
    fn test_system_instruction_keeps_exact_text() {
        let lines: Vec<&str> = SYSTEM_INSTRUCTION.split('\n').collect();
        assert_eq!(lines.len(), 18);
        assert!(lines[0].ends_with("virtual local guide. "));
        assert!(lines[1].ends_with("any destination. "));
        assert!(lines[10].ends_with("suggest specific places. "));
        assert_eq!(lines[14], "### One Day in [City]");
        assert_eq!(lines[17], "...etc.");
    }

    #[test]
    fn test_quick_replies_have_prompts() {
        assert_eq!(QUICK_REPLIES.len(), 4);
        assert!(QUICK_REPLIES.iter().all(|q| !q.prompt.trim().is_empty()));
    }
}
