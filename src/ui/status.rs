use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::Theme;
use crate::logging::Notification;

/// Which set of keyboard hints to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintMode {
    /// Overlay closed
    Idle,
    /// Overlay open while the modifier is held
    Cycling,
    /// Overlay open without a held modifier
    Picking,
}

const IDLE_HINTS: &[(&[&str], &str)] = &[(&["Ctrl-c"], "quit")];

const CYCLING_HINTS: &[(&[&str], &str)] = &[
    (&["release"], "paste"),
    (&["↑", "↓"], "move"),
    (&["Esc"], "cancel"),
    (&["type"], "filter"),
];

const PICKING_HINTS: &[(&[&str], &str)] = &[
    (&["↑", "↓"], "move"),
    (&["Enter"], "paste"),
    (&["Esc"], "cancel"),
    (&["type"], "filter"),
];

fn push_hint<'a>(hints: &mut Vec<Span<'a>>, keys: &[&'a str], description: &'a str, theme: &Theme) {
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            hints.push(Span::styled("/", theme.status_desc.add_modifier(Modifier::DIM)));
        }
        hints.push(Span::styled(*key, theme.status_key));
    }
    hints.push(Span::raw(" "));
    hints.push(Span::styled(description, theme.status_desc));
    hints.push(Span::raw("  "));
}

/// Render keyboard hints bar showing mode-specific shortcuts
///
/// `open_key` is the open hotkey as text; it is shown while idle.
pub fn render_keyboard_hints(
    frame: &mut Frame,
    area: Rect,
    mode: HintMode,
    open_key: Option<&str>,
    theme: &Theme,
) {
    let hint_data = match mode {
        HintMode::Idle => IDLE_HINTS,
        HintMode::Cycling => CYCLING_HINTS,
        HintMode::Picking => PICKING_HINTS,
    };

    let mut hints = Vec::new();
    if mode == HintMode::Idle {
        if let Some(key) = open_key {
            push_hint(&mut hints, &[key], "open", theme);
        }
    }
    for (keys, description) in hint_data {
        push_hint(&mut hints, keys, description, theme);
    }

    let paragraph =
        Paragraph::new(Line::from(hints)).style(theme.status_desc.bg(theme.status_bar_bg));

    frame.render_widget(paragraph, area);
}

/// Render the most recent notification, if any
pub fn render_notifications(
    frame: &mut Frame,
    area: Rect,
    notifications: &[Notification],
    theme: &Theme,
) {
    let Some(latest) = notifications.last() else {
        return;
    };

    let mut spans = vec![Span::styled(
        latest.message.as_str(),
        theme.notification(latest.level),
    )];
    if notifications.len() > 1 {
        spans.push(Span::styled(
            format!("  (+{})", notifications.len() - 1),
            theme.status_desc,
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
