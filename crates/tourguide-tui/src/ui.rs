use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use tourguide_core::editor::PreferenceField;
use tourguide_core::state::INTEREST_OPTIONS;
use tourguide_core::{Budget, ChatMessage, ChatRole, TravelStyle, QUICK_REPLIES};
use crate::app::{App, InputMode};

const ACCENT: Color = Color::Green;
const DISCLAIMER: &str = "Information can change. Double check opening hours & local safety.";

/// Parse a line of text and convert **bold** and *italic* markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' {
            current_text.push(c);
            continue;
        }

        let bold = chars.peek() == Some(&'*');
        if bold {
            chars.next();
        }

        // Collect up to the matching closing marker
        let mut inner = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' {
                if !bold {
                    found_close = true;
                    break;
                }
                if chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
            }
            inner.push(c);
        }

        let marker = if bold { "**" } else { "*" };
        if found_close && !inner.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            let modifier = if bold { Modifier::BOLD } else { Modifier::ITALIC };
            spans.push(Span::styled(inner, Style::default().add_modifier(modifier)));
        } else {
            // No closing marker (e.g. a "* " bullet), treat as literal
            current_text.push_str(marker);
            current_text.push_str(&inner);
            if found_close {
                current_text.push_str(marker);
            }
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Headings get their own style; everything else goes through inline markdown.
fn render_content_line(line: &str) -> Line<'static> {
    if line.starts_with('#') {
        let heading = line.trim_start_matches('#').trim_start().to_string();
        Line::from(Span::styled(
            heading,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
    } else {
        parse_markdown_line(line)
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, quick replies, input, disclaimer, footer
    let [header_area, chat_area, replies_area, input_area, disclaimer_area, footer_area] =
        Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_quick_replies(app, frame, replies_area);
    render_input(app, frame, input_area);

    let disclaimer = Paragraph::new(DISCLAIMER)
        .style(Style::default().fg(Color::DarkGray))
        .centered();
    frame.render_widget(disclaimer, disclaimer_area);

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.show_location_prompt {
        render_location_prompt(app, frame, area);
    } else if app.preference_editor.is_some() {
        render_preferences(app, frame, area);
    } else if app.show_guide_view {
        render_guide_view(app, frame, area);
    } else if app.show_saved_guides {
        render_saved_guides(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let [title_area, location_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

    let saved_count = app.session.saved_guides().len();
    let saved_indicator = if saved_count > 0 {
        format!(" [{} saved]", saved_count)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" TourGuide AI ", Style::default().fg(Color::White).bold()),
        Span::styled(saved_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(app.guide.provider_label(), Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(
        Paragraph::new(title).style(Style::default().bg(Color::Rgb(4, 120, 87))),
        title_area,
    );

    let location = app.session.location();
    let auto = if location.is_auto_detected { " (Auto)" } else { "" };
    let location_line = Line::from(vec![
        Span::raw(" 📍 "),
        Span::styled(format!("{}{}", location.address, auto), Style::default().fg(Color::White)),
        Span::styled("  l: change", Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(
        Paragraph::new(location_line).style(Style::default().bg(Color::Rgb(6, 95, 70))),
        location_area,
    );
}

fn message_lines(msg: &ChatMessage, selected: bool) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let time = msg.timestamp.format("%H:%M").to_string();

    let (label, color) = match msg.role {
        ChatRole::User => ("You", Color::Cyan),
        ChatRole::Assistant => ("Virtual Guide", ACCENT),
    };
    let mut label_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    if selected {
        label_style = label_style.add_modifier(Modifier::REVERSED);
    }
    lines.push(Line::from(vec![
        Span::styled(if selected { "> " } else { "" }, Style::default().fg(Color::Yellow)),
        Span::styled(label, label_style),
        Span::styled(format!("  {}", time), Style::default().fg(Color::DarkGray)),
    ]));

    match msg.role {
        ChatRole::User => {
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        ChatRole::Assistant => {
            for line in msg.content.lines() {
                lines.push(render_content_line(line));
            }
        }
    }

    if !msg.links().is_empty() {
        lines.push(Line::from(Span::styled(
            "Map & Web Sources",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )));
        for link in msg.links() {
            lines.push(Line::from(vec![
                Span::styled(" ↗ ", Style::default().fg(ACCENT)),
                Span::styled(link.label().to_string(), Style::default().fg(ACCENT)),
                Span::styled(format!("  {}", link.uri), Style::default().fg(Color::DarkGray)),
            ]));
        }
    }

    lines.push(Line::default());
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let focused = app.input_mode == InputMode::Normal;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let mut lines: Vec<Line> = Vec::new();
    for (i, msg) in app.session.messages().iter().enumerate() {
        lines.extend(message_lines(msg, app.selected_message == Some(i)));
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "Virtual Guide",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Guide is checking maps{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_quick_replies(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = if app.is_loading() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans = vec![Span::raw(" ")];
    for (i, reply) in QUICK_REPLIES.iter().enumerate() {
        spans.push(Span::styled(format!(" {} ", i + 1), key_style));
        spans.push(Span::styled(format!(" {}  ", reply.label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask (i to type) ");

    if app.is_loading() {
        let waiting = Paragraph::new("Waiting for your guide...")
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block);
        frame.render_widget(waiting, area);
        return;
    }

    if app.input.is_empty() && !editing {
        let placeholder = Paragraph::new("Ask about attractions, food, transport...")
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " TYPE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |k: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", k), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let hints: Vec<Span> = if let Some(status) = &app.status {
        vec![Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Yellow).bold(),
        )]
    } else if app.show_location_prompt {
        [hint("Enter", "set"), hint("Esc", "cancel")].concat()
    } else if app.preference_editor.is_some() {
        [
            hint("j/k", "field"),
            hint("h/l", "option"),
            hint("Space", "pick"),
            hint("s", "save"),
            hint("Esc", "cancel"),
        ]
        .concat()
    } else if app.show_guide_view {
        [hint("j/k", "scroll"), hint("Esc", "back")].concat()
    } else if app.show_saved_guides {
        [
            hint("j/k", "nav"),
            hint("Enter", "view"),
            hint("d", "delete"),
            hint("Esc", "close"),
        ]
        .concat()
    } else {
        match app.input_mode {
            InputMode::Editing => [hint("Enter", "send"), hint("Esc", "stop typing")].concat(),
            InputMode::Normal => [
                hint("i", "type"),
                hint("1-4", "quick"),
                hint("j/k", "select"),
                hint("s", "save"),
                hint("S", "saved"),
                hint("p", "prefs"),
                hint("l", "location"),
                hint("q", "quit"),
            ]
            .concat(),
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn option_spans<T: Copy + PartialEq>(
    options: &[T],
    name: impl Fn(T) -> String,
    is_chosen: impl Fn(T) -> bool,
    highlighted: Option<usize>,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, &opt) in options.iter().enumerate() {
        let mut style = if is_chosen(opt) {
            Style::default().bg(ACCENT).fg(Color::Black).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        if highlighted == Some(i) {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
        }
        spans.push(Span::styled(format!(" {} ", name(opt)), style));
        spans.push(Span::raw(" "));
    }
    spans
}

fn render_preferences(app: &App, frame: &mut Frame, area: Rect) {
    let Some(editor) = &app.preference_editor else {
        return;
    };
    let draft = editor.draft();

    let popup_area = centered_rect(70, 12, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" Customize Your Experience ");

    let highlight_for = |field: PreferenceField| {
        if editor.field() == field {
            Some(editor.option_idx())
        } else {
            None
        }
    };

    let mut lines: Vec<Line> = Vec::new();
    for field in PreferenceField::all() {
        let label_style = if editor.field() == field {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));

        let spans = match field {
            PreferenceField::Budget => option_spans(
                &Budget::all(),
                |b| b.as_str().to_string(),
                |b| b == draft.budget,
                highlight_for(field),
            ),
            PreferenceField::Style => option_spans(
                &TravelStyle::all(),
                |s| s.as_str().to_string(),
                |s| s == draft.travel_style,
                highlight_for(field),
            ),
            PreferenceField::Interests => option_spans(
                INTEREST_OPTIONS,
                |i| i.to_string(),
                |i| draft.has_interest(i),
                highlight_for(field),
            ),
        };
        lines.push(Line::from(spans));
        lines.push(Line::default());
    }

    let body = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(body, popup_area);
}

fn render_saved_guides(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area.width.saturating_sub(6), area.height.saturating_sub(4), area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" My Saved Guides ({}) ", app.session.saved_guides().len()));

    if app.session.saved_guides().is_empty() {
        let placeholder = Paragraph::new(
            "No guides saved yet.\nSelect a guide answer in the chat and press 's' to save it for offline view!",
        )
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(placeholder, popup_area);
        return;
    }

    let preview_width = popup_area.width.saturating_sub(8) as usize;
    let items: Vec<ListItem> = app
        .session
        .saved_guides()
        .guides()
        .iter()
        .map(|g| {
            let preview: String = g
                .content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(preview_width)
                .collect();
            ListItem::new(vec![
                Line::from(Span::styled(g.title.clone(), Style::default().fg(Color::Yellow).bold())),
                Line::from(Span::styled(
                    g.date.format("%b %-d, %Y").to_string(),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(preview),
                Line::default(),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.saved_guides_state);
}

fn render_guide_view(app: &App, frame: &mut Frame, area: Rect) {
    let Some(guide) = app
        .saved_guides_state
        .selected()
        .and_then(|i| app.session.saved_guides().get(i))
    else {
        return;
    };

    let popup_area = centered_rect(area.width.saturating_sub(6), area.height.saturating_sub(4), area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" {} · {} ", guide.title, guide.date.format("%b %-d, %Y")));

    let lines: Vec<Line> = guide.content.lines().map(render_content_line).collect();
    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.guide_view_scroll, 0));
    frame.render_widget(body, popup_area);
}

fn render_location_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 7, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Change Location ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Enter your location (e.g. Kyoto, Japan)")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let width = input_area.width as usize;
    let scroll_offset = (app.location_cursor + 1).saturating_sub(width);
    let visible: String = app
        .location_input
        .chars()
        .skip(scroll_offset)
        .take(width)
        .collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = (app.location_cursor - scroll_offset) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_bold_and_italic_spans() {
        let line = parse_markdown_line("Visit **Alfama** for *fado* nights");
        assert_eq!(span_texts(&line), vec!["Visit ", "Alfama", " for ", "fado", " nights"]);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(line.spans[3].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_unclosed_marker_is_literal() {
        let line = parse_markdown_line("* bullet without close");
        assert_eq!(span_texts(&line).concat(), "* bullet without close");
    }

    #[test]
    fn test_heading_line_is_bold_without_markers() {
        let line = render_content_line("### One Day in Lisbon");
        assert_eq!(span_texts(&line), vec!["One Day in Lisbon"]);
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_message_lines_include_sources() {
        let msg = ChatMessage::assistant(
            "Line one\nLine two",
            vec![tourguide_core::CitationLink::new("Tram 28", "https://maps.example/28")],
        );
        let lines = message_lines(&msg, false);
        // label, 2 content lines, sources header, 1 link, blank
        assert_eq!(lines.len(), 6);
        assert!(span_texts(&lines[4]).concat().contains("Tram 28"));
    }

    #[test]
    fn test_centered_rect_fits_area() {
        let area = Rect::new(0, 0, 40, 10);
        let r = centered_rect(100, 100, area);
        assert!(r.width <= 36 && r.height <= 8);
        assert!(r.x + r.width <= area.width);
    }
}
