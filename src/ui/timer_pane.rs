use crate::app::AppState;
use crate::time_utils::{format_time, seconds_to_minutes};
use crate::ui::styles::{border_style, clock_style, gauge_style, status_style, title_style};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

/// Render the countdown with its status and a cup that empties as time runs down
pub fn render_timer_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let timer = &app.timer;
    let status = timer.status();

    let session = if timer.session_id() > 0 {
        format!(" · session {}", timer.session_id())
    } else {
        String::new()
    };
    let title = format!(
        " Pourover ☕ {}m{} ",
        seconds_to_minutes(timer.initial_time()),
        session
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(title, title_style()));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Countdown
            Constraint::Length(1), // Status
            Constraint::Length(1), // Spacing
            Constraint::Length(1), // Gauge
            Constraint::Min(0),
        ])
        .split(block.inner(area));

    let countdown = Paragraph::new(Line::from(Span::styled(
        format_time(timer.time_remaining()),
        clock_style(),
    )))
    .alignment(Alignment::Center);

    let badge = Paragraph::new(Line::from(Span::styled(
        status.to_tag(),
        status_style(status),
    )))
    .alignment(Alignment::Center);

    let fill = timer.fill_percentage();
    let gauge = Gauge::default()
        .gauge_style(gauge_style())
        .percent(fill.round() as u16)
        .label(format!("{:.0}%", fill));

    f.render_widget(block, area);
    f.render_widget(countdown, chunks[0]);
    f.render_widget(badge, chunks[1]);
    f.render_widget(gauge, chunks[3]);
}
