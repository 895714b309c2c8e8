use crate::state::{ChatMessage, SavedGuide};

/// Ordered, append-only list of exchanged messages (newest last).
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation opened by the guide's welcome message.
    pub fn with_welcome() -> Self {
        Self {
            messages: vec![ChatMessage::welcome()],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// User-curated list of guide snapshots.
#[derive(Debug, Clone, Default)]
pub struct SavedGuides {
    guides: Vec<SavedGuide>,
}

impl SavedGuides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, guide: SavedGuide) {
        self.guides.push(guide);
    }

    /// Removes the first guide with `id`. Returns the removed guide.
    pub fn remove(&mut self, id: &str) -> Option<SavedGuide> {
        let idx = self.guides.iter().position(|g| g.id == id)?;
        Some(self.guides.remove(idx))
    }

    /// Removes the guide at `idx`, leaving entries that share its id.
    pub fn remove_at(&mut self, idx: usize) -> Option<SavedGuide> {
        if idx < self.guides.len() {
            Some(self.guides.remove(idx))
        } else {
            None
        }
    }

    pub fn guides(&self) -> &[SavedGuide] {
        &self.guides
    }

    pub fn get(&self, idx: usize) -> Option<&SavedGuide> {
        self.guides.get(idx)
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }
}
