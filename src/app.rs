use crate::clock::Clock;
use crate::domain::{ListGroup, ListSurface, Todo, UiMode};
use crate::notifications;
use crate::persistence::{Settings, SharedStorage};
use crate::store::sync::Signals;
use crate::store::TaskStore;
use crate::time_utils::{format_time_spent, seconds_to_minutes, validate_custom_minutes, PRESETS};
use crate::timer::TimerEngine;
use std::rc::Rc;
use tracing::{debug, info};

/// Text input state for the add-task and custom-time prompts
#[derive(Debug, Clone, Default)]
pub struct InputFormState {
    pub text: String,
}

/// Main application state
pub struct AppState {
    pub timer: TimerEngine,
    pub settings: Settings,
    /// List shown under the timer
    pub inline: TaskStore,
    /// Overlay list opened while focusing
    pub panel: TaskStore,
    pub panel_open: bool,
    pub selected_index: usize,
    pub ui_mode: UiMode,
    pub input_form: Option<InputFormState>,
    /// One-line feedback shown in the footer
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(storage: SharedStorage, signals: Rc<Signals>, clock: Rc<dyn Clock>) -> Self {
        let settings = Settings::new(storage.clone(), signals.clone());
        let timer = TimerEngine::new(settings.initial_time(), clock.clone());
        let inline = TaskStore::open("inline", storage.clone(), signals.clone(), clock.clone());
        let panel = TaskStore::open("panel", storage, signals, clock);

        Self {
            timer,
            settings,
            inline,
            panel,
            panel_open: false,
            selected_index: 0,
            ui_mode: UiMode::Normal,
            input_form: None,
            status_message: None,
        }
    }

    /// Which mounted list keyboard actions go to
    pub fn surface(&self) -> ListSurface {
        if self.panel_open {
            ListSurface::Panel
        } else {
            ListSurface::Inline
        }
    }

    pub fn store(&self) -> &TaskStore {
        match self.surface() {
            ListSurface::Inline => &self.inline,
            ListSurface::Panel => &self.panel,
        }
    }

    /// Deliver due timer ticks and react to completion
    pub fn tick(&mut self) {
        let outcome = self.timer.poll();
        if outcome.completed {
            let minutes = seconds_to_minutes(self.timer.initial_time());
            self.status_message = Some("Time's up! Take a break.".to_string());
            if !self.settings.music_muted() {
                notifications::notify_timer_complete(minutes);
            }
        }
    }

    /// Run the persistence step of every mounted list
    pub fn flush(&self) {
        self.inline.flush();
        self.panel.flush();
    }

    /// Start or pause the countdown
    pub fn toggle_timer(&mut self) {
        if self.timer.is_running() {
            self.timer.pause();
        } else {
            self.timer.start();
        }
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset();
        self.status_message = None;
    }

    /// Switch to one of the preset durations (0-based)
    pub fn select_preset(&mut self, index: usize) {
        if let Some((label, seconds)) = PRESETS.get(index) {
            self.apply_duration(*seconds);
            info!(preset = label, seconds, "Preset selected");
        }
    }

    /// Switch to a custom duration given in minutes
    pub fn set_custom_minutes(&mut self, minutes: u32) -> Result<(), String> {
        let seconds = validate_custom_minutes(minutes)?;
        self.apply_duration(seconds);
        self.settings.save_custom_time(seconds);
        Ok(())
    }

    fn apply_duration(&mut self, seconds: u32) {
        self.timer.set_time(seconds);
        self.status_message = None;
    }

    pub fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
        self.selected_index = 0;
        debug!(panel_open = self.panel_open, "Task panel toggled");
    }

    /// Rows of the list keyboard actions apply to
    pub fn rows(&self) -> Vec<Todo> {
        list_rows(self.store())
    }

    pub fn selected_todo(&self) -> Option<Todo> {
        self.rows().into_iter().nth(self.selected_index)
    }

    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.rows().len() {
            self.selected_index += 1;
        }
    }

    /// Complete or reopen the selected task, crediting the running session
    pub fn toggle_selected(&mut self) {
        let Some(todo) = self.selected_todo() else {
            return;
        };
        let ctx = self.timer.context();
        let Some(updated) = self.store().toggle(&todo.id, &ctx) else {
            return;
        };

        if let Some(seconds) = updated.focus_seconds() {
            let spent = format_time_spent(seconds);
            self.status_message = Some(format!("Completed \"{}\" in {}", updated.text, spent));
            if !self.settings.music_muted() {
                notifications::notify_task_done(&updated.text, &spent);
            }
        }
        self.select_id(&updated.id);
    }

    pub fn delete_selected(&mut self) {
        if let Some(todo) = self.selected_todo() {
            self.store().delete(&todo.id);
            self.clamp_selection();
        }
    }

    /// Move the selected task one place up within its group
    pub fn move_item_up(&mut self) {
        self.move_item(-1);
    }

    /// Move the selected task one place down within its group
    pub fn move_item_down(&mut self) {
        self.move_item(1);
    }

    fn move_item(&mut self, delta: isize) {
        let Some(todo) = self.selected_todo() else {
            return;
        };
        let group = todo.group();
        let members = self.store().group(&group);
        let Some(from) = members.iter().position(|t| t.id == todo.id) else {
            return;
        };
        let Some(to) = from.checked_add_signed(delta) else {
            return;
        };
        if to >= members.len() {
            return;
        }

        if self.store().reorder(&group, from, to) {
            self.select_id(&todo.id);
        }
    }

    pub fn start_add_task(&mut self) {
        self.input_form = Some(InputFormState::default());
        self.ui_mode = UiMode::AddingTask;
    }

    pub fn start_custom_time(&mut self) {
        self.input_form = Some(InputFormState::default());
        self.ui_mode = UiMode::SettingTime;
    }

    pub fn input_form_add_char(&mut self, c: char) {
        if let Some(form) = &mut self.input_form {
            // Durations are whole minutes
            if self.ui_mode == UiMode::SettingTime && !c.is_ascii_digit() {
                return;
            }
            form.text.push(c);
        }
    }

    pub fn input_form_backspace(&mut self) {
        if let Some(form) = &mut self.input_form {
            form.text.pop();
        }
    }

    /// Submit the open prompt
    pub fn submit_input_form(&mut self) {
        let Some(form) = self.input_form.take() else {
            return;
        };

        match self.ui_mode {
            UiMode::AddingTask => {
                if let Some(todo) = self.store().create(&form.text, None) {
                    self.select_id(&todo.id);
                }
            }
            UiMode::SettingTime => {
                let result = form
                    .text
                    .parse::<u32>()
                    .map_err(|_| "Please enter a whole number of minutes".to_string())
                    .and_then(|minutes| self.set_custom_minutes(minutes));
                if let Err(message) = result {
                    self.status_message = Some(message);
                }
            }
            UiMode::Normal => {}
        }
        self.ui_mode = UiMode::Normal;
    }

    pub fn cancel_input_form(&mut self) {
        self.input_form = None;
        self.ui_mode = UiMode::Normal;
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.settings.toggle_music_muted();
        self.status_message = Some(if muted { "Sound off" } else { "Sound on" }.to_string());
    }

    fn select_id(&mut self, id: &str) {
        if let Some(index) = self.rows().iter().position(|t| t.id == id) {
            self.selected_index = index;
        } else {
            self.clamp_selection();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }
}

/// Display rows of one list: open tasks then completed ones, each grouped
/// unfiled first and then by project
pub fn list_rows(store: &TaskStore) -> Vec<Todo> {
    let todos = store.todos();

    let mut project_ids: Vec<Option<String>> = vec![None];
    project_ids.extend(store.projects().into_iter().map(|p| Some(p.id)));
    for todo in &todos {
        if !project_ids.contains(&todo.project_id) {
            project_ids.push(todo.project_id.clone());
        }
    }

    let mut rows = Vec::with_capacity(todos.len());
    for completed in [false, true] {
        for project_id in &project_ids {
            rows.extend(store.group(&ListGroup {
                project_id: project_id.clone(),
                completed,
            }));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::TimerStatus;
    use crate::persistence::{MemoryStore, CUSTOM_TIME_KEY};
    use crate::persistence::KeyValueStore;
    use crate::time_utils::{POMODORO, SHORT_BREAK};
    use std::cell::RefCell;

    const T0: i64 = 1_700_000_000_000;

    fn create_test_app() -> (AppState, Rc<ManualClock>, Rc<RefCell<MemoryStore>>) {
        crate::logging::init_test_logging();
        let memory = Rc::new(RefCell::new(MemoryStore::new()));
        let storage: SharedStorage = memory.clone();
        let clock = Rc::new(ManualClock::new(T0));
        let mut app = AppState::new(storage, Rc::new(Signals::new()), clock.clone());
        // Muted so tests never reach the desktop notifier
        app.settings.set_music_muted(true);
        (app, clock, memory)
    }

    fn add(app: &mut AppState, clock: &ManualClock, text: &str) {
        app.start_add_task();
        for c in text.chars() {
            app.input_form_add_char(c);
        }
        app.submit_input_form();
        clock.advance_ms(1);
    }

    fn texts(app: &AppState) -> Vec<String> {
        app.rows().into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_app_state_new() {
        let (app, _, _) = create_test_app();
        assert_eq!(app.timer.initial_time(), POMODORO);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.ui_mode, UiMode::Normal);
        assert_eq!(app.surface(), ListSurface::Inline);
        assert!(app.rows().is_empty());
    }

    #[test]
    fn test_saved_custom_time_is_used_at_startup() {
        let mut memory = MemoryStore::new();
        memory.set(CUSTOM_TIME_KEY, "900").unwrap();
        let storage: SharedStorage = Rc::new(RefCell::new(memory));
        let app = AppState::new(storage, Rc::new(Signals::new()), Rc::new(ManualClock::new(T0)));
        assert_eq!(app.timer.initial_time(), 900);
    }

    #[test]
    fn test_add_task_selects_it() {
        let (mut app, clock, _) = create_test_app();
        add(&mut app, &clock, "First");
        add(&mut app, &clock, "Second");

        assert_eq!(texts(&app), vec!["Second", "First"]);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.ui_mode, UiMode::Normal);
        assert!(app.input_form.is_none());
    }

    #[test]
    fn test_blank_task_is_ignored() {
        let (mut app, _, memory) = create_test_app();
        let writes = memory.borrow().write_count();
        app.start_add_task();
        app.input_form_add_char(' ');
        app.submit_input_form();
        assert!(app.rows().is_empty());
        assert_eq!(memory.borrow().write_count(), writes);
    }

    #[test]
    fn test_move_selection() {
        let (mut app, clock, _) = create_test_app();
        add(&mut app, &clock, "A");
        add(&mut app, &clock, "B");
        app.selected_index = 0;

        app.move_selection_down();
        assert_eq!(app.selected_index, 1);
        app.move_selection_down();
        assert_eq!(app.selected_index, 1);
        app.move_selection_up();
        app.move_selection_up();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_toggle_timer_and_tick() {
        let (mut app, clock, _) = create_test_app();
        app.select_preset(0);
        assert_eq!(app.timer.initial_time(), SHORT_BREAK);

        app.toggle_timer();
        assert!(app.timer.is_running());
        clock.advance_secs(2);
        app.tick();
        assert_eq!(app.timer.time_remaining(), SHORT_BREAK - 2);

        app.toggle_timer();
        assert_eq!(app.timer.status(), TimerStatus::Paused);
    }

    #[test]
    fn test_completion_sets_message() {
        let (mut app, clock, _) = create_test_app();
        app.set_custom_minutes(1).unwrap();
        app.toggle_timer();
        clock.advance_secs(60);
        app.tick();
        assert!(app.timer.is_complete());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_completing_during_session_credits_time() {
        let (mut app, clock, _) = create_test_app();
        add(&mut app, &clock, "Deep work");
        app.toggle_timer();
        clock.advance_secs(125);
        app.tick();

        app.toggle_selected();
        let todo = app.inline.completed().pop().unwrap();
        assert_eq!(todo.time_spent, Some(125));
        assert_eq!(todo.session_id, Some(1));
        assert!(app.status_message.unwrap().contains("2m 5s"));
    }

    #[test]
    fn test_completing_while_paused_credits_nothing() {
        let (mut app, clock, _) = create_test_app();
        add(&mut app, &clock, "Email");
        app.toggle_timer();
        clock.advance_secs(30);
        app.tick();
        app.toggle_timer();

        app.toggle_selected();
        let todo = app.inline.completed().pop().unwrap();
        assert!(todo.completed);
        assert_eq!(todo.time_spent, None);
    }

    #[test]
    fn test_panel_operations_reach_inline_list() {
        let (mut app, clock, memory) = create_test_app();
        add(&mut app, &clock, "Shared");
        let writes = memory.borrow().write_count();

        app.toggle_panel();
        assert_eq!(app.surface(), ListSurface::Panel);
        assert_eq!(texts(&app), vec!["Shared"]);

        app.toggle_selected();
        assert_eq!(app.inline.completed().len(), 1);

        // One write for the toggle, none for the inline list's adoption
        app.flush();
        assert_eq!(memory.borrow().write_count(), writes + 1);
    }

    #[test]
    fn test_reorder_follows_selection() {
        let (mut app, clock, _) = create_test_app();
        add(&mut app, &clock, "C");
        add(&mut app, &clock, "B");
        add(&mut app, &clock, "A");
        assert_eq!(texts(&app), vec!["A", "B", "C"]);

        app.selected_index = 2;
        app.move_item_up();
        assert_eq!(texts(&app), vec!["A", "C", "B"]);
        assert_eq!(app.selected_index, 1);

        app.move_item_down();
        assert_eq!(texts(&app), vec!["A", "B", "C"]);
        assert_eq!(app.selected_index, 2);

        // Already last: nothing happens
        app.move_item_down();
        assert_eq!(texts(&app), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reorder_stays_within_group() {
        let (mut app, clock, _) = create_test_app();
        add(&mut app, &clock, "Open");
        add(&mut app, &clock, "Done");
        app.selected_index = 0;
        app.toggle_selected();
        assert_eq!(texts(&app), vec!["Open", "Done"]);

        // First completed row cannot move above the open tasks
        app.selected_index = 1;
        app.move_item_up();
        assert_eq!(texts(&app), vec!["Open", "Done"]);
    }

    #[test]
    fn test_delete_selected_clamps() {
        let (mut app, clock, _) = create_test_app();
        add(&mut app, &clock, "A");
        add(&mut app, &clock, "B");
        app.selected_index = 1;
        app.delete_selected();
        assert_eq!(texts(&app), vec!["B"]);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_custom_time_prompt() {
        let (mut app, _, _) = create_test_app();
        app.start_custom_time();
        app.input_form_add_char('1');
        app.input_form_add_char('x');
        app.input_form_add_char('0');
        app.submit_input_form();
        assert_eq!(app.timer.initial_time(), 600);
        assert_eq!(app.settings.initial_time(), 600);

        app.start_custom_time();
        for c in "90".chars() {
            app.input_form_add_char(c);
        }
        app.submit_input_form();
        assert_eq!(app.timer.initial_time(), 600);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_preset_keeps_saved_custom_time() {
        let (mut app, _, memory) = create_test_app();
        memory.borrow_mut().set(CUSTOM_TIME_KEY, "600").unwrap();

        app.select_preset(0);
        assert_eq!(app.timer.initial_time(), SHORT_BREAK);
        assert_eq!(memory.borrow().get(CUSTOM_TIME_KEY).unwrap(), Some("600".to_string()));
        assert_eq!(app.settings.initial_time(), 600);
    }

    #[test]
    fn test_toggle_mute() {
        let (mut app, _, _) = create_test_app();
        assert!(app.settings.music_muted());
        app.toggle_mute();
        assert!(!app.settings.music_muted());
    }
}
