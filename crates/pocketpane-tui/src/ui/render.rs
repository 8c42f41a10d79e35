use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Pocket pane
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_pane(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  pocketpane";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

/// Push the pane body into a bordered, scrollable view
fn render_pane(frame: &mut Frame, app: &App, area: Rect) {
    let (title, body, _ok) = app.content();

    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(body.to_string())
        .style(styles::body_style())
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[r]eset | [R]efresh | [q]uit";

    let mut left = vec![Span::raw(" ")];
    if let Some(ref pane) = app.pane {
        let state = pane.state();
        left.push(Span::styled(state.label(), styles::auth_state_style(state)));

        if let Some(wait) = pane.retry_in(Instant::now()) {
            left.push(Span::styled(
                format!(" | retry in {}s", wait.as_secs() + 1),
                styles::muted_style(),
            ));
        }
    } else {
        left.push(Span::styled("Not configured", styles::muted_style()));
    }

    if let Some(ref msg) = app.status_message {
        left.push(Span::styled(format!(" | {}", msg), styles::highlight_style()));
    } else if let Some(at) = app.last_refresh {
        left.push(Span::styled(
            format!(" | Updated {}", at.format("%H:%M:%S")),
            styles::muted_style(),
        ));
    }

    let right_text = format!(" {} ", shortcuts);
    let left_len: usize = left.iter().map(|s| s.content.chars().count()).sum();
    let padding_len = (area.width as usize)
        .saturating_sub(left_len)
        .saturating_sub(right_text.len());

    left.push(Span::raw(" ".repeat(padding_len)));
    left.push(Span::styled(right_text, styles::muted_style()));

    let paragraph = Paragraph::new(Line::from(left)).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 16, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  pocketpane", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("j/k ↓/↑", "Scroll one line"),
        key("PgDn/PgUp", "Scroll one page"),
        key("g", "Back to top"),
        Line::from(""),
        Line::from(Span::styled(" Pocket", styles::highlight_style())),
        key("r", "Start authorization over"),
        key("R", "Refresh now"),
        Line::from(""),
        key("?/Esc", "Close help"),
        key("q", "Quit"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
