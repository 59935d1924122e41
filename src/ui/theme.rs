use ratatui::prelude::*;

/// Runtime theme with direct field access for all UI elements
#[derive(Debug, Clone)]
pub struct Theme {
    // === Default Colors ===
    pub default_fg: Color,
    pub default_bg: Color,

    // === Overlay ===
    pub overlay_bg: Color,
    pub overlay_border: Style,
    pub overlay_title: Style,

    // === Selection ===
    pub selection_bg: Color,

    // === Clip List ===
    pub clip_number: Style,
    pub clip_text: Style,
    pub clip_text_selected: Style,
    pub timestamp: Style,
    pub clip_list_header: Style,
    pub clip_list_item_count: Style,
    pub empty_text: Style,

    // === Search ===
    pub search_input: Style,

    // === Status Bar ===
    pub status_bar_bg: Color,
    pub status_key: Style,
    pub status_desc: Style,

    // === Notifications ===
    pub notify_error: Style,
    pub notify_warn: Style,
    pub notify_info: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    /// Theme for the `dark_mode` setting
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode { Self::dark() } else { Self::light() }
    }

    pub fn light() -> Self {
        let fg = Color::Rgb(26, 26, 26);
        let bg = Color::Rgb(255, 255, 255);
        let accent = Color::Rgb(0, 120, 212);
        let muted = Color::Rgb(102, 102, 102);

        Theme {
            default_fg: fg,
            default_bg: bg,

            overlay_bg: bg,
            overlay_border: Style::default().fg(accent),
            overlay_title: Style::default().fg(accent).add_modifier(Modifier::BOLD),

            selection_bg: Color::Rgb(227, 242, 253),

            clip_number: Style::default().fg(Color::Rgb(153, 153, 153)),
            clip_text: Style::default().fg(fg),
            clip_text_selected: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            timestamp: Style::default().fg(muted),
            clip_list_header: Style::default().fg(muted).add_modifier(Modifier::BOLD),
            clip_list_item_count: Style::default().fg(muted).add_modifier(Modifier::DIM),
            empty_text: Style::default().fg(muted).add_modifier(Modifier::ITALIC),

            search_input: Style::default().fg(accent),

            status_bar_bg: Color::Rgb(248, 248, 248),
            status_key: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            status_desc: Style::default().fg(muted),

            notify_error: Style::default()
                .fg(Color::Rgb(198, 40, 40))
                .add_modifier(Modifier::BOLD),
            notify_warn: Style::default().fg(Color::Rgb(239, 108, 0)),
            notify_info: Style::default().fg(accent),
        }
    }

    pub fn dark() -> Self {
        let fg = Color::Rgb(255, 255, 255);
        let bg = Color::Rgb(30, 30, 30);
        let accent = Color::Rgb(0, 120, 212);
        let muted = Color::Rgb(136, 136, 136);

        Theme {
            default_fg: fg,
            default_bg: bg,

            overlay_bg: Color::Rgb(43, 43, 43),
            overlay_border: Style::default().fg(accent),
            overlay_title: Style::default().fg(fg).add_modifier(Modifier::BOLD),

            selection_bg: Color::Rgb(69, 90, 100),

            clip_number: Style::default().fg(muted),
            clip_text: Style::default().fg(fg),
            clip_text_selected: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            timestamp: Style::default().fg(muted),
            clip_list_header: Style::default()
                .fg(Color::Rgb(170, 170, 170))
                .add_modifier(Modifier::BOLD),
            clip_list_item_count: Style::default().fg(muted).add_modifier(Modifier::DIM),
            empty_text: Style::default().fg(muted).add_modifier(Modifier::ITALIC),

            search_input: Style::default().fg(Color::Rgb(249, 226, 175)),

            status_bar_bg: Color::Rgb(43, 43, 43),
            status_key: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            status_desc: Style::default().fg(Color::Rgb(170, 170, 170)),

            notify_error: Style::default()
                .fg(Color::Rgb(243, 139, 168))
                .add_modifier(Modifier::BOLD),
            notify_warn: Style::default().fg(Color::Rgb(250, 179, 135)),
            notify_info: Style::default().fg(Color::Rgb(137, 180, 250)),
        }
    }

    /// Style for a notification of `level`
    pub fn notification(&self, level: log::Level) -> Style {
        match level {
            log::Level::Error => self.notify_error,
            log::Level::Warn => self.notify_warn,
            _ => self.notify_info,
        }
    }
}
