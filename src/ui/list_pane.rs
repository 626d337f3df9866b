use crate::app::{list_rows, AppState};
use crate::domain::{ListSurface, Todo};
use crate::store::TaskStore;
use crate::time_utils::format_time_spent;
use crate::ui::styles::{
    border_style, default_style, done_style, selected_style, tag_style, time_spent_style,
    title_style,
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the task list under the timer
pub fn render_list_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let selected = match app.surface() {
        ListSurface::Inline => Some(app.selected_index),
        ListSurface::Panel => None,
    };
    let list = task_list(&app.inline, selected, " Tasks ");
    f.render_widget(list, area);
}

/// Build the list widget for one mounted store
pub fn task_list(store: &TaskStore, selected: Option<usize>, title: &str) -> List<'static> {
    let rows = list_rows(store);
    let open = rows.iter().filter(|t| !t.completed).count();

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(idx, todo)| {
            let project = todo
                .project_id
                .as_deref()
                .and_then(|id| store.project_name(id));
            let line = create_task_line(todo, project.as_deref());
            let style = if Some(idx) == selected {
                selected_style()
            } else {
                default_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = format!("{}({} open, {} done) ", title, open, rows.len() - open);

    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title(Span::styled(title, title_style())),
    )
}

/// Create a single line for a task
/// Format: [x] Write proposal  [Thesis]  ⏱ 25m
fn create_task_line(todo: &Todo, project: Option<&str>) -> Line<'static> {
    let mut spans = Vec::new();

    if todo.completed {
        spans.push(Span::raw("[x] ".to_string()));
        spans.push(Span::styled(todo.text.clone(), done_style()));
    } else {
        spans.push(Span::raw("[ ] ".to_string()));
        spans.push(Span::raw(todo.text.clone()));
    }

    if let Some(name) = project {
        spans.push(Span::raw("  ".to_string()));
        spans.push(Span::styled(format!("[{}]", name), tag_style()));
    }

    if let Some(seconds) = todo.focus_seconds() {
        spans.push(Span::styled(
            format!("  ⏱ {}", format_time_spent(seconds)),
            time_spent_style(),
        ));
    }

    Line::from(spans)
}
