use crate::domain::TimerStatus;
use ratatui::style::{Color, Modifier, Style};

/// Default text style
pub fn default_style() -> Style {
    Style::default().fg(Color::White)
}

/// Selected row highlight style
pub fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::LightCyan)
        .add_modifier(Modifier::BOLD)
}

/// Badge style for the timer status
pub fn status_style(status: TimerStatus) -> Style {
    match status {
        TimerStatus::Running => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        TimerStatus::Paused => Style::default().fg(Color::Yellow),
        TimerStatus::Complete => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        TimerStatus::Idle => Style::default().fg(Color::Gray),
    }
}

/// Big countdown digits
pub fn clock_style() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

/// Title style for panes
pub fn title_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Border style
pub fn border_style() -> Style {
    Style::default().fg(Color::Gray)
}

/// Modal background style
pub fn modal_bg_style() -> Style {
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

/// Modal title style
pub fn modal_title_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

/// Keybinding hint style
pub fn hint_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Coffee fill gauge
pub fn gauge_style() -> Style {
    Style::default().fg(Color::Rgb(111, 78, 55)).bg(Color::DarkGray)
}

/// Done/completed task style
pub fn done_style() -> Style {
    Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::CROSSED_OUT)
}

/// Project badge style
pub fn tag_style() -> Style {
    Style::default().fg(Color::Blue)
}

/// Focus time credited to a task
pub fn time_spent_style() -> Style {
    Style::default().fg(Color::Yellow)
}
