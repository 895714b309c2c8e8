use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text editing shared by the chat input and the location prompt.
/// Returns false if the key was not an editing key.
fn edit_line(text: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(text.chars().count()),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = text.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

fn insert_str(text: &mut String, cursor: &mut usize, pasted: &str) {
    // Single-line inputs
    let pasted: String = pasted.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let byte_pos = char_to_byte_index(text, *cursor);
    text.insert_str(byte_pos, &pasted);
    *cursor += pasted.chars().count();
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => app.scroll_chat_to_bottom(),
        AppEvent::Tick => app.tick(),
    }
    app.poll_tasks().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Popups take keys in priority order
    if app.show_location_prompt {
        handle_location_prompt(app, key);
    } else if app.preference_editor.is_some() {
        handle_preferences(app, key);
    } else if app.show_guide_view {
        handle_guide_view(app, key);
    } else if app.show_saved_guides {
        handle_saved_guides(app, key);
    } else {
        match app.input_mode {
            InputMode::Normal => handle_normal_mode(app, key),
            InputMode::Editing => handle_editing_mode(app, key),
        }
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Start typing (input is disabled while the guide is answering)
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            if !app.is_loading() {
                app.input_mode = InputMode::Editing;
                app.selected_message = None;
            }
        }

        // Quick replies
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c as usize - '1' as usize;
            app.send_quick_reply(idx);
        }

        // Message selection
        KeyCode::Char('j') | KeyCode::Down => app.select_next_message(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev_message(),
        KeyCode::Esc => app.selected_message = None,

        // Chat scrolling
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height.max(2) / 2),
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height.max(2) / 2),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,

        // Panels
        KeyCode::Char('s') => app.save_selected_message(),
        KeyCode::Char('S') => app.open_saved_guides(),
        KeyCode::Char('p') => app.open_preferences(),
        KeyCode::Char('l') => app.open_location_prompt(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_input(),
        _ => {
            edit_line(&mut app.input, &mut app.cursor, key);
        }
    }
}

fn handle_preferences(app: &mut App, key: KeyEvent) {
    let Some(editor) = app.preference_editor.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => app.cancel_preferences(),
        KeyCode::Char('s') => app.commit_preferences(),
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => editor.next_field(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => editor.prev_field(),
        KeyCode::Char('l') | KeyCode::Right => editor.next_option(),
        KeyCode::Char('h') | KeyCode::Left => editor.prev_option(),
        KeyCode::Char(' ') | KeyCode::Enter => editor.activate(),
        _ => {}
    }
}

fn handle_saved_guides(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('S') => app.show_saved_guides = false,
        KeyCode::Char('j') | KeyCode::Down => app.saved_guides_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.saved_guides_nav_up(),
        KeyCode::Enter => app.view_selected_guide(),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected_guide(),
        _ => {}
    }
}

fn handle_guide_view(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => app.show_guide_view = false,
        KeyCode::Char('j') | KeyCode::Down => {
            app.guide_view_scroll = app.guide_view_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.guide_view_scroll = app.guide_view_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_location_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_location_prompt(),
        KeyCode::Enter => app.submit_location(),
        _ => {
            edit_line(&mut app.location_input, &mut app.location_cursor, key);
        }
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if app.show_location_prompt {
        insert_str(&mut app.location_input, &mut app.location_cursor, text);
    } else if app.input_mode == InputMode::Editing {
        insert_str(&mut app.input, &mut app.cursor, text);
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);

    let popup_open = app.show_saved_guides
        || app.show_guide_view
        || app.show_location_prompt
        || app.preference_editor.is_some();
    if !in_chat || popup_open {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp => app.scroll_chat_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourguide_core::{Budget, GuideService};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "café ok";
        assert_eq!(char_to_byte_index(s, 4), 5);
        assert_eq!(char_to_byte_index(s, 100), s.len());
    }

    #[test]
    fn test_edit_line_inserts_and_deletes() {
        let mut text = String::new();
        let mut cursor = 0;
        for c in "Kyto".chars() {
            edit_line(&mut text, &mut cursor, key(KeyCode::Char(c)));
        }
        edit_line(&mut text, &mut cursor, key(KeyCode::Left));
        edit_line(&mut text, &mut cursor, key(KeyCode::Left));
        edit_line(&mut text, &mut cursor, key(KeyCode::Char('o')));
        assert_eq!(text, "Kyoto");
        edit_line(&mut text, &mut cursor, key(KeyCode::End));
        edit_line(&mut text, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(text, "Kyot");
        assert!(!edit_line(&mut text, &mut cursor, key(KeyCode::F(1))));
    }

    #[test]
    fn test_paste_strips_newlines() {
        let mut text = "ab".to_string();
        let mut cursor = 1;
        insert_str(&mut text, &mut cursor, "x\ny");
        assert_eq!(text, "axyb");
        assert_eq!(cursor, 3);
    }

    #[tokio::test]
    async fn test_enter_sends_typed_message() {
        let mut app = App::new(GuideService::unconfigured());
        handle_key(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.input_mode, InputMode::Editing);
        type_text(&mut app, "Hidden gems?");
        handle_key(&mut app, key(KeyCode::Enter));

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.session.messages().len(), 2);
        assert_eq!(app.session.messages()[1].content, "Hidden gems?");

        // input stays disabled while the answer is outstanding
        handle_key(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.input_mode, InputMode::Normal);
        app.shutdown();
    }

    #[test]
    fn test_preferences_save_with_keys() {
        let mut app = App::new(GuideService::unconfigured());
        handle_key(&mut app, key(KeyCode::Char('p')));
        assert!(app.preference_editor.is_some());
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Char('s')));

        assert!(app.preference_editor.is_none());
        assert_eq!(app.session.preferences().budget, Budget::Budget);
    }

    #[test]
    fn test_preferences_escape_discards() {
        let mut app = App::new(GuideService::unconfigured());
        handle_key(&mut app, key(KeyCode::Char('p')));
        handle_key(&mut app, key(KeyCode::Right));
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Esc));

        assert_eq!(app.session.preferences().budget, Budget::MidRange);
    }

    #[test]
    fn test_location_prompt_keys() {
        let mut app = App::new(GuideService::unconfigured());
        handle_key(&mut app, key(KeyCode::Char('l')));
        assert!(app.show_location_prompt);
        for _ in 0.."Worldwide".len() {
            handle_key(&mut app, key(KeyCode::Backspace));
        }
        type_text(&mut app, "Cusco, Peru");
        handle_key(&mut app, key(KeyCode::Enter));

        assert_eq!(app.session.location().address, "Cusco, Peru");
        assert!(!app.session.location().is_auto_detected);
    }

    #[test]
    fn test_save_then_delete_from_panel() {
        let mut app = App::new(GuideService::unconfigured());
        handle_key(&mut app, key(KeyCode::Char('s')));
        handle_key(&mut app, key(KeyCode::Char('S')));
        assert!(app.show_saved_guides);
        assert_eq!(app.session.saved_guides().len(), 1);
        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(app.session.saved_guides().is_empty());
    }

    fn scroll_down_at(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_mouse_scrolls_chat() {
        let mut app = App::new(GuideService::unconfigured());
        app.chat_area = Some(Rect::new(0, 2, 80, 20));
        handle_mouse(&mut app, scroll_down_at(10, 5));
        assert_eq!(app.chat_scroll, 3);
        handle_mouse(&mut app, scroll_down_at(10, 40));
        assert_eq!(app.chat_scroll, 3);
    }

    #[test]
    fn test_mouse_ignored_behind_popups() {
        let mut app = App::new(GuideService::unconfigured());
        app.chat_area = Some(Rect::new(0, 2, 80, 20));

        app.show_guide_view = true;
        handle_mouse(&mut app, scroll_down_at(10, 5));
        app.show_guide_view = false;

        app.open_location_prompt();
        handle_mouse(&mut app, scroll_down_at(10, 5));

        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_ctrl_c_quits_from_popup() {
        let mut app = App::new(GuideService::unconfigured());
        handle_key(&mut app, key(KeyCode::Char('p')));
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
