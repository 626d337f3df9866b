use crate::app::AppState;
use crate::domain::UiMode;
use crate::time_utils::{MAX_CUSTOM_MINUTES, MIN_CUSTOM_MINUTES};
use crate::ui::{
    layout::create_modal_area,
    styles::{modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the text prompt for adding a task or setting a custom duration
pub fn render_input_form(f: &mut Frame, app: &AppState, area: Rect) {
    if let Some(form) = &app.input_form {
        let modal_area = create_modal_area(area, 8);

        // Clear the area behind the form
        f.render_widget(Clear, modal_area);

        let (title_text, label) = match app.ui_mode {
            UiMode::SettingTime => (
                " Custom Time ",
                format!("Minutes ({}-{}):", MIN_CUSTOM_MINUTES, MAX_CUSTOM_MINUTES),
            ),
            _ => (" Add Task ", "Task:".to_string()),
        };

        let lines = vec![
            Line::raw(""),
            Line::raw(label),
            Line::from(vec![
                Span::raw("> "),
                Span::styled(form.text.as_str(), modal_title_style()),
                Span::styled("█", modal_title_style()), // Cursor
            ]),
            Line::raw(""),
            Line::raw("Enter to submit  ·  Esc to cancel"),
        ];

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(title_text, modal_title_style()))
                    .style(modal_bg_style()),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, modal_area);
    }
}
