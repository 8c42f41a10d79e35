//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    app.status_message = None;

    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.scroll_up(PAGE_SCROLL_SIZE),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),

        // Authorization
        KeyCode::Char('r') => app.reset_authorization(),
        KeyCode::Char('R') => app.refresh().await,

        _ => {}
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pocketpane_core::Config;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_body() -> App {
        let mut app = App::new(Config::default());
        app.setup_error = Some("1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\n12".to_string());
        app
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = app_with_body();
        assert!(handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let mut app = app_with_body();
        handle_input(&mut app, press(KeyCode::Char('?'))).await.unwrap();
        assert_eq!(app.state, AppState::ShowingHelp);

        // 'j' does nothing while help is open
        handle_input(&mut app, press(KeyCode::Char('j'))).await.unwrap();
        assert_eq!(app.scroll, 0);

        // 'q' closes help instead of quitting
        let quit = handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap();
        assert!(!quit);
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_scroll_keys() {
        let mut app = app_with_body();

        handle_input(&mut app, press(KeyCode::Char('j'))).await.unwrap();
        handle_input(&mut app, press(KeyCode::Down)).await.unwrap();
        assert_eq!(app.scroll, 2);

        handle_input(&mut app, press(KeyCode::PageDown)).await.unwrap();
        assert_eq!(app.scroll, 11);

        handle_input(&mut app, press(KeyCode::Char('k'))).await.unwrap();
        assert_eq!(app.scroll, 10);

        handle_input(&mut app, press(KeyCode::Char('g'))).await.unwrap();
        assert_eq!(app.scroll, 0);
    }

    #[tokio::test]
    async fn test_reset_without_pane_is_harmless() {
        let mut app = app_with_body();
        handle_input(&mut app, press(KeyCode::Char('r'))).await.unwrap();
        assert!(app.status_message.is_none());
        assert!(app.pane.is_none());
    }
}
