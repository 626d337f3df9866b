use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main layout structure
pub struct MainLayout {
    pub keybindings_area: Rect,
    pub timer_area: Rect,
    pub list_area: Rect,
    pub status_area: Rect,
}

/// Create the main layout
/// - Top bar: keybindings (1 row)
/// - Timer: countdown, status and fill gauge
/// - Task list fills the rest
/// - Bottom bar: status message (1 row)
pub fn create_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Keybindings bar
            Constraint::Length(7), // Timer
            Constraint::Min(0),    // Task list
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    MainLayout {
        keybindings_area: chunks[0],
        timer_area: chunks[1],
        list_area: chunks[2],
        status_area: chunks[3],
    }
}

/// Create centered modal area (for the overlay panel and prompts)
pub fn create_modal_area(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    let row = Rect::new(area.x, area.y + (area.height - height) / 2, area.width, height);

    let horizontal_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(15),
            Constraint::Percentage(70),
            Constraint::Percentage(15),
        ])
        .split(row);

    horizontal_chunks[1]
}
