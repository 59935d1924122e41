use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding};
use tui_input::Input;

use super::clip_list::{ClipListRenderContext, ListHeader, render_clip_list};
use super::layout::centered_rect;
use super::Theme;
use crate::cycle::{CycleState, Phase};
use crate::models::ClipboardEntry;

/// Render the selection overlay over `area`
pub fn render_overlay(frame: &mut Frame, area: Rect, state: &CycleState, input: &Input, theme: &Theme) {
    let overlay_area = centered_rect(80, 70, area);
    frame.render_widget(Clear, overlay_area);

    let title = match state.phase() {
        Phase::Open => " SmartClip ",
        Phase::Cycling => " SmartClip · cycling ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.overlay_border)
        .title(Span::styled(title, theme.overlay_title))
        .style(Style::default().bg(theme.overlay_bg))
        .padding(Padding::horizontal(1));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let entries: Vec<&ClipboardEntry> = state.visible().collect();
    let empty_message = if state.snapshot().is_empty() {
        "History is empty"
    } else {
        "No matches"
    };

    render_clip_list(
        frame,
        inner,
        &entries,
        ClipListRenderContext {
            selected: (!entries.is_empty()).then(|| state.cursor()),
            header: ListHeader::Search(input),
            empty_message,
            theme,
        },
    );
}
