use crate::app::AppState;
use crate::domain::ListSurface;
use crate::ui::{layout::create_modal_area, list_pane::task_list};
use ratatui::{layout::Rect, widgets::Clear, Frame};

/// Render the overlay task panel on top of the timer view
pub fn render_task_panel(f: &mut Frame, app: &AppState, area: Rect) {
    if app.surface() != ListSurface::Panel {
        return;
    }

    let modal_area = create_modal_area(area, area.height.saturating_sub(6).max(8));

    // Clear the area behind the panel
    f.render_widget(Clear, modal_area);

    let list = task_list(&app.panel, Some(app.selected_index), " Focus Tasks · p/Esc close ");
    f.render_widget(list, modal_area);
}
