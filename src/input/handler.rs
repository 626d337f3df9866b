use crate::app::AppState;
use crate::domain::UiMode;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Handle keyboard input events. Returns true when the app should quit.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    if app.ui_mode.is_input() {
        return handle_input_form_mode(app, key);
    }
    handle_normal_mode(app, key)
}

/// Handle keys in normal mode
fn handle_normal_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        // Navigation (with Shift modifier for reordering)
        KeyCode::Up => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.move_item_up();
            } else {
                app.move_selection_up();
            }
        }
        KeyCode::Down => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.move_item_down();
            } else {
                app.move_selection_down();
            }
        }

        // Timer
        KeyCode::Char(' ') => app.toggle_timer(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.reset_timer(),
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            app.select_preset(index);
        }
        KeyCode::Char('c') | KeyCode::Char('C') => app.start_custom_time(),

        // Tasks
        KeyCode::Enter => app.toggle_selected(),
        KeyCode::Char('a') | KeyCode::Char('A') => app.start_add_task(),
        KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Delete => app.delete_selected(),

        KeyCode::Char('p') | KeyCode::Char('P') => app.toggle_panel(),
        KeyCode::Char('m') | KeyCode::Char('M') => app.toggle_mute(),

        KeyCode::Esc if app.panel_open => app.toggle_panel(),
        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(true),

        _ => {}
    }
    Ok(false)
}

/// Handle keys while a text prompt is open
fn handle_input_form_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter => app.submit_input_form(),
        KeyCode::Esc => app.cancel_input_form(),
        KeyCode::Backspace => app.input_form_backspace(),
        KeyCode::Char(c) => app.input_form_add_char(c),
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{ListSurface, TimerStatus};
    use crate::persistence::{MemoryStore, SharedStorage};
    use crate::store::sync::Signals;
    use crate::time_utils::{MEDIUM_BREAK, EXTENDED};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn create_test_app() -> AppState {
        let storage: SharedStorage = Rc::new(RefCell::new(MemoryStore::new()));
        let clock = Rc::new(ManualClock::new(1_700_000_000_000));
        let app = AppState::new(storage, Rc::new(Signals::new()), clock);
        app.settings.set_music_muted(true);
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn test_handle_quit() {
        let mut app = create_test_app();
        let should_quit = handle_key(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(should_quit);
    }

    #[test]
    fn test_q_is_text_while_typing() {
        let mut app = create_test_app();
        handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
        let should_quit = handle_key(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(!should_quit);
        assert_eq!(app.input_form.as_ref().unwrap().text, "q");
    }

    #[test]
    fn test_handle_add_task() {
        let mut app = create_test_app();

        // Press 'a' to open form
        handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.ui_mode, UiMode::AddingTask);

        type_text(&mut app, "Neww");
        handle_key(&mut app, key(KeyCode::Backspace)).unwrap();

        // Submit with Enter
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.ui_mode, UiMode::Normal);
        assert_eq!(app.rows()[0].text, "New");
    }

    #[test]
    fn test_escape_cancels_form() {
        let mut app = create_test_app();
        handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "Draft");
        handle_key(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.ui_mode, UiMode::Normal);
        assert!(app.rows().is_empty());
    }

    #[test]
    fn test_space_starts_and_pauses() {
        let mut app = create_test_app();
        handle_key(&mut app, key(KeyCode::Char(' '))).unwrap();
        assert_eq!(app.timer.status(), TimerStatus::Running);
        handle_key(&mut app, key(KeyCode::Char(' '))).unwrap();
        assert_eq!(app.timer.status(), TimerStatus::Paused);
        handle_key(&mut app, key(KeyCode::Char('r'))).unwrap();
        assert_eq!(app.timer.status(), TimerStatus::Idle);
    }

    #[test]
    fn test_number_keys_select_presets() {
        let mut app = create_test_app();
        handle_key(&mut app, key(KeyCode::Char('2'))).unwrap();
        assert_eq!(app.timer.initial_time(), MEDIUM_BREAK);
        handle_key(&mut app, key(KeyCode::Char('4'))).unwrap();
        assert_eq!(app.timer.initial_time(), EXTENDED);
    }

    #[test]
    fn test_shift_arrows_reorder() {
        let mut app = create_test_app();
        for text in ["Second", "First"] {
            handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
            type_text(&mut app, text);
            handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        }
        // Both created in the same millisecond; the later one is stored last
        let before: Vec<String> = app.rows().into_iter().map(|t| t.text).collect();

        app.selected_index = 0;
        handle_key(&mut app, KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT)).unwrap();
        let after: Vec<String> = app.rows().into_iter().map(|t| t.text).collect();
        assert_eq!(after, vec![before[1].clone(), before[0].clone()]);
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn test_p_and_escape_toggle_panel() {
        let mut app = create_test_app();
        handle_key(&mut app, key(KeyCode::Char('p'))).unwrap();
        assert_eq!(app.surface(), ListSurface::Panel);
        handle_key(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.surface(), ListSurface::Inline);
    }

    #[test]
    fn test_delete_key_removes_task() {
        let mut app = create_test_app();
        handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "Gone");
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();

        handle_key(&mut app, key(KeyCode::Delete)).unwrap();
        assert!(app.rows().is_empty());
    }
}
