use ratatui::style::{Color, Modifier, Style};

use pocketpane_core::auth::AuthState;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn body_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Status-bar color for each stage of the authorization flow
pub fn auth_state_style(state: AuthState) -> Style {
    match state {
        AuthState::NoToken => muted_style(),
        AuthState::PendingAuthorization => highlight_style(),
        AuthState::Authorized => Style::default()
            .fg(SECONDARY)
            .add_modifier(Modifier::BOLD),
    }
}
