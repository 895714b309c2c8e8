use std::sync::{Arc, Mutex};

use tourguide_core::{
    Budget, ChatRole, Citation, CitationLink, GuideError, GuideProvider, GuideReply,
    GuideRequest, GuideService, Session, TravelStyle, UserPreferences, APOLOGY_TEXT,
    FALLBACK_TEXT,
};

/// Mock provider that returns a canned reply and records every request.
struct MockProvider {
    reply: Mutex<Option<Result<GuideReply, GuideError>>>,
    requests: Arc<Mutex<Vec<GuideRequest>>>,
}

impl MockProvider {
    fn new(reply: Result<GuideReply, GuideError>) -> Self {
        Self {
            reply: Mutex::new(Some(reply)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn text(text: &str, citations: Vec<Citation>) -> Self {
        Self::new(Ok(GuideReply {
            text: Some(text.to_string()),
            citations,
        }))
    }
}

#[async_trait::async_trait]
impl GuideProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: &GuideRequest) -> Result<GuideReply, GuideError> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(GuideReply::default()))
    }
}

fn service_with(provider: MockProvider) -> (GuideService, Arc<Mutex<Vec<GuideRequest>>>) {
    let requests = provider.requests.clone();
    (GuideService::new(Arc::new(provider)), requests)
}

#[tokio::test]
async fn test_send_appends_user_then_assistant() {
    let (service, _) = service_with(MockProvider::text("Go to the market.", Vec::new()));
    let mut session = Session::new();

    assert!(session.send(&service, "What should I see?").await);

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, ChatRole::User);
    assert_eq!(messages[1].content, "What should I see?");
    assert_eq!(messages[2].role, ChatRole::Assistant);
    assert_eq!(messages[2].content, "Go to the market.");
    assert!(!session.is_in_flight());
}

#[tokio::test]
async fn test_user_message_visible_before_answer() {
    let (service, _) = service_with(MockProvider::text("later", Vec::new()));
    let mut session = Session::new();

    let pending = session.begin_send("Hi").unwrap();
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].content, "Hi");

    let answer = pending.run(&service).await;
    session.complete_send(answer);
    assert_eq!(session.messages().len(), 3);
}

#[tokio::test]
async fn test_send_while_in_flight_is_noop() {
    let (service, requests) = service_with(MockProvider::text("ok", Vec::new()));
    let mut session = Session::new();

    let _pending = session.begin_send("first").unwrap();
    assert!(!session.send(&service, "second").await);
    assert_eq!(session.messages().len(), 2);
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_send_is_noop() {
    let (service, requests) = service_with(MockProvider::text("ok", Vec::new()));
    let mut session = Session::new();

    assert!(!session.send(&service, "   ").await);
    assert_eq!(session.messages().len(), 1);
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_context_contains_preferences_and_location() {
    let (service, requests) = service_with(MockProvider::text("ok", Vec::new()));
    let mut session = Session::new();
    session.set_manual_location("Hanoi, Vietnam");
    session.update_preferences(UserPreferences {
        budget: Budget::Budget,
        travel_style: TravelStyle::Couple,
        interests: vec!["Food".to_string(), "Nightlife".to_string()],
    });

    session.send(&service, "Street food tips?").await;

    let requests = requests.lock().unwrap();
    let context = requests[0].context_prompt().unwrap();
    assert!(context.contains("Hanoi, Vietnam"));
    assert!(context.contains("budget"));
    assert!(context.contains("couple"));
    assert!(context.contains("Food, Nightlife"));
    assert!(context.contains("Street food tips?"));
    // welcome message + context turn
    assert_eq!(requests[0].turns.len(), 2);
}

#[tokio::test]
async fn test_success_with_map_citation() {
    let citation = Citation::Map(CitationLink::new("X", "Y"));
    let (service, _) = service_with(MockProvider::text("T", vec![citation]));
    let mut session = Session::new();

    session.send(&service, "Where?").await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.content, "T");
    assert_eq!(last.links(), &[CitationLink::new("X", "Y")]);
}

#[tokio::test]
async fn test_unknown_citations_are_dropped() {
    let citations = vec![
        Citation::Unknown,
        Citation::Web(CitationLink::new("Blog", "https://blog.example")),
    ];
    let (service, _) = service_with(MockProvider::text("T", citations));
    let mut session = Session::new();

    session.send(&service, "Where?").await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.links(), &[CitationLink::new("Blog", "https://blog.example")]);
}

#[tokio::test]
async fn test_provider_failure_yields_apology() {
    let (service, _) = service_with(MockProvider::new(Err(GuideError::api(500, "boom"))));
    let mut session = Session::new();

    session.send(&service, "Anything?").await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert_eq!(last.content, APOLOGY_TEXT);
    assert!(last.links().is_empty());
    assert!(!session.is_in_flight());
}

#[tokio::test]
async fn test_empty_text_uses_fallback() {
    let (service, _) = service_with(MockProvider::new(Ok(GuideReply {
        text: None,
        citations: vec![Citation::Web(CitationLink::new("a", "b"))],
    })));
    let mut session = Session::new();

    session.send(&service, "Hello?").await;

    let last = session.messages().last().unwrap();
    assert_eq!(last.content, FALLBACK_TEXT);
    assert_eq!(last.links().len(), 1);
}

#[tokio::test]
async fn test_unconfigured_service_yields_apology() {
    let service = GuideService::unconfigured();
    assert!(!service.is_configured());
    let mut session = Session::new();

    session.send(&service, "Hello?").await;

    assert_eq!(session.messages().last().unwrap().content, APOLOGY_TEXT);
}

#[tokio::test]
async fn test_save_and_delete_guides() {
    let (service, _) = service_with(MockProvider::text("Try the pastries.", Vec::new()));
    let mut session = Session::new();
    session.set_manual_location("Lisbon");
    session.send(&service, "Dessert?").await;

    let answer_id = session.messages()[2].id.clone();
    let welcome_id = session.messages()[0].id.clone();

    let saved = session.save_guide(&answer_id).unwrap();
    assert_eq!(saved.content, "Try the pastries.");
    assert_eq!(saved.title, "Guide to Lisbon");
    session.save_guide(&welcome_id).unwrap();
    assert_eq!(session.saved_guides().len(), 2);

    assert!(session.delete_saved_guide(&answer_id));
    assert_eq!(session.saved_guides().len(), 1);
    assert_eq!(session.saved_guides().guides()[0].id, welcome_id);

    // the source message is untouched
    assert_eq!(session.messages()[2].content, "Try the pastries.");
}
