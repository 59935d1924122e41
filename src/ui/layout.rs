use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main screen areas
pub struct MainLayout {
    pub content: Rect,
    pub notifications: Rect,
    pub keyboard_hints: Rect,
}

/// Split the screen into content, a notification line and the keyboard hints bar
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Main content area
            Constraint::Length(1), // Notifications
            Constraint::Length(1), // Keyboard hints bar
        ])
        .split(area);

    MainLayout {
        content: chunks[0],
        notifications: chunks[1],
        keyboard_hints: chunks[2],
    }
}

/// Create centered rectangle for popups/overlays
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
