use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tourguide_core::{
    Coordinates, GuideAnswer, GuideService, Locator, PreferenceDraft, Session, QUICK_REPLIES,
};

/// Ticks a status message stays in the footer (300ms each)
const STATUS_TICKS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: Session,
    pub guide: GuideService,

    // Chat input
    pub input: String,
    pub cursor: usize, // cursor position in input (chars)

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub selected_message: Option<usize>,
    pub chat_area: Option<Rect>,

    // Outstanding work
    pub query_task: Option<JoinHandle<GuideAnswer>>,
    pub location_task: Option<JoinHandle<tourguide_core::Result<Coordinates>>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Preference editor (Some while open)
    pub preference_editor: Option<PreferenceDraft>,

    // Saved guides panel
    pub show_saved_guides: bool,
    pub saved_guides_state: ListState,
    pub show_guide_view: bool,
    pub guide_view_scroll: u16,

    // Manual location prompt
    pub show_location_prompt: bool,
    pub location_input: String,
    pub location_cursor: usize,

    // Transient footer message
    pub status: Option<String>,
    status_ticks: u8,
}

impl App {
    pub fn new(guide: GuideService) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            session: Session::new(),
            guide,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            selected_message: None,
            chat_area: None,

            query_task: None,
            location_task: None,

            animation_frame: 0,

            preference_editor: None,

            show_saved_guides: false,
            saved_guides_state: ListState::default(),
            show_guide_view: false,
            guide_view_scroll: 0,

            show_location_prompt: false,
            location_input: String::new(),
            location_cursor: 0,

            status: None,
            status_ticks: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_in_flight()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.status_ticks = STATUS_TICKS;
    }

    // Sending

    /// Send whatever is in the input box.
    pub fn submit_input(&mut self) {
        let text = self.input.clone();
        if self.send_message(&text) {
            self.input.clear();
            self.cursor = 0;
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn send_quick_reply(&mut self, idx: usize) {
        if let Some(reply) = QUICK_REPLIES.get(idx) {
            self.send_message(reply.prompt);
        }
    }

    /// Start an exchange in the background. Returns false if it was a no-op.
    pub fn send_message(&mut self, text: &str) -> bool {
        let Some(pending) = self.session.begin_send(text) else {
            return false;
        };

        let guide = self.guide.clone();
        self.query_task = Some(tokio::spawn(async move { pending.run(&guide).await }));
        self.selected_message = None;

        // Scroll to bottom so the loading indicator is visible
        self.scroll_chat_to_bottom();
        true
    }

    pub fn spawn_location_detection(&mut self, locator: Arc<dyn Locator>) {
        self.location_task = Some(tokio::spawn(async move { locator.locate().await }));
    }

    /// Collect finished background tasks.
    pub async fn poll_tasks(&mut self) {
        if self.query_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.query_task.take() {
                let answer = task.await.unwrap_or_else(|e| {
                    error!(error = %e, "Guide task failed");
                    GuideAnswer::apology()
                });
                self.session.complete_send(answer);
                self.scroll_chat_to_bottom();
            }
        }

        if self.location_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.location_task.take() {
                match task.await {
                    Ok(Ok(coords)) => {
                        info!(lat = coords.latitude, lng = coords.longitude, "Location detected");
                        self.session.apply_detected_location(coords);
                    }
                    Ok(Err(e)) => warn!(error = %e, "Location access denied or unavailable"),
                    Err(e) => warn!(error = %e, "Location task failed"),
                }
            }
        }
    }

    /// Abort outstanding tasks before exit.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.query_task.take() {
            task.abort();
        }
        if let Some(task) = self.location_task.take() {
            task.abort();
        }
    }

    // Message selection

    pub fn select_next_message(&mut self) {
        let len = self.session.messages().len();
        if len == 0 {
            return;
        }
        let next = match self.selected_message {
            Some(i) => (i + 1).min(len - 1),
            None => len - 1,
        };
        self.selected_message = Some(next);
    }

    pub fn select_prev_message(&mut self) {
        let len = self.session.messages().len();
        if len == 0 {
            return;
        }
        let prev = match self.selected_message {
            Some(i) => i.saturating_sub(1),
            None => len - 1,
        };
        self.selected_message = Some(prev);
    }

    /// Save the selected message, or the latest guide answer if none is selected.
    pub fn save_selected_message(&mut self) {
        let messages = self.session.messages();
        let target = match self.selected_message {
            Some(i) => messages.get(i),
            None => messages.iter().rev().find(|m| m.is_assistant()),
        };
        let Some(message) = target else {
            return;
        };
        if !message.is_assistant() {
            self.set_status("Only guide answers can be saved");
            return;
        }

        let id = message.id.clone();
        if self.session.save_guide(&id).is_some() {
            self.set_status("Guide saved for offline view!");
        }
    }

    // Preferences

    pub fn open_preferences(&mut self) {
        self.preference_editor = Some(PreferenceDraft::new(self.session.preferences()));
    }

    pub fn commit_preferences(&mut self) {
        if let Some(editor) = self.preference_editor.take() {
            self.session.update_preferences(editor.commit());
            self.set_status("Preferences saved");
        }
    }

    pub fn cancel_preferences(&mut self) {
        self.preference_editor = None;
    }

    // Saved guides

    pub fn open_saved_guides(&mut self) {
        self.show_saved_guides = true;
        self.show_guide_view = false;
        if self.session.saved_guides().is_empty() {
            self.saved_guides_state.select(None);
        } else if self.saved_guides_state.selected().is_none() {
            self.saved_guides_state.select(Some(0));
        }
    }

    pub fn saved_guides_nav_down(&mut self) {
        let len = self.session.saved_guides().len();
        if len > 0 {
            let i = self.saved_guides_state.selected().unwrap_or(0);
            self.saved_guides_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn saved_guides_nav_up(&mut self) {
        let i = self.saved_guides_state.selected().unwrap_or(0);
        self.saved_guides_state.select(Some(i.saturating_sub(1)));
    }

    pub fn view_selected_guide(&mut self) {
        if self.saved_guides_state.selected().is_some() && !self.session.saved_guides().is_empty() {
            self.show_guide_view = true;
            self.guide_view_scroll = 0;
        }
    }

    pub fn delete_selected_guide(&mut self) {
        let Some(i) = self.saved_guides_state.selected() else {
            return;
        };
        if !self.session.delete_saved_guide_at(i) {
            return;
        }

        // Adjust selection
        let len = self.session.saved_guides().len();
        if len == 0 {
            self.saved_guides_state.select(None);
        } else if i >= len {
            self.saved_guides_state.select(Some(len - 1));
        }
    }

    // Location prompt

    pub fn open_location_prompt(&mut self) {
        self.location_input = self.session.location().address.clone();
        self.location_cursor = self.location_input.chars().count();
        self.show_location_prompt = true;
    }

    pub fn submit_location(&mut self) {
        let address = self.location_input.trim().to_string();
        if !address.is_empty() {
            // Manual entry wins over a detection still in progress
            if let Some(task) = self.location_task.take() {
                task.abort();
            }
            self.session.set_manual_location(&address);
        }
        self.close_location_prompt();
    }

    pub fn close_location_prompt(&mut self) {
        self.show_location_prompt = false;
        self.location_input.clear();
        self.location_cursor = 0;
    }

    /// Tick animation frame and expire the status line (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.status_ticks > 0 {
            self.status_ticks -= 1;
            if self.status_ticks == 0 {
                self.status = None;
            }
        }
    }

    // Chat scrolling

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the newest message is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for msg in self.session.messages() {
            total_lines += 1; // Label line
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines += (char_count / wrap_width) + 1;
            }
            if !msg.links().is_empty() {
                total_lines += 1 + msg.links().len(); // Sources header + links
            }
            total_lines += 1; // Blank line after message
        }

        if self.is_loading() {
            total_lines += 2; // Label + "checking maps..."
        }

        let total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}
