pub mod input_form;
pub mod keybindings;
pub mod layout;
pub mod list_pane;
pub mod modal;
pub mod styles;
pub mod timer_pane;

use crate::app::AppState;
use crate::ui::styles::hint_style;
use input_form::render_input_form;
use keybindings::render_keybindings;
use layout::create_layout;
use list_pane::render_list_pane;
use modal::render_task_panel;
use ratatui::{widgets::Paragraph, Frame};
use timer_pane::render_timer_pane;

/// Main render function - draws the entire UI
pub fn render(f: &mut Frame, app: &AppState) {
    let size = f.size();
    let layout = create_layout(size);

    // Render keybindings bar
    render_keybindings(f, layout.keybindings_area);

    // Render panes
    render_timer_pane(f, app, layout.timer_area);
    render_list_pane(f, app, layout.list_area);

    if let Some(message) = &app.status_message {
        f.render_widget(
            Paragraph::new(format!(" {}", message)).style(hint_style()),
            layout.status_area,
        );
    }

    // Overlay panel sits above the list
    render_task_panel(f, app, size);

    // Render input form if active
    if app.input_form.is_some() {
        render_input_form(f, app, size);
    }
}
