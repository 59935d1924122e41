pub mod clip_list;
pub mod layout;
pub mod overlay;
pub mod status;
pub mod terminal;
pub mod theme;

use ratatui::prelude::*;
use ratatui::widgets::Block;
use tui_input::Input;

use crate::cycle::CycleState;
use crate::logging::Notification;
use crate::models::{ClipboardEntry, HistoryStore};

pub use clip_list::{ClipListRenderContext, ListHeader, render_clip_list};
pub use layout::{centered_rect, create_main_layout};
pub use overlay::render_overlay;
pub use status::{HintMode, render_keyboard_hints, render_notifications};
pub use terminal::{TerminalKeys, TerminalSession};
pub use theme::Theme;

/// Everything one frame needs
pub struct ViewContext<'a> {
    pub history: &'a HistoryStore,
    pub cycle: Option<&'a CycleState>,
    pub search_input: &'a Input,
    pub notifications: &'a [Notification],
    pub open_key: Option<String>,
    pub theme: &'a Theme,
}

/// Render the whole screen: history in the background, the overlay on top
/// while a cycle is open, then notifications and hints
pub fn render(frame: &mut Frame, ctx: &ViewContext) {
    let size = frame.area();
    let theme = ctx.theme;

    frame.render_widget(
        Block::default().style(Style::default().fg(theme.default_fg).bg(theme.default_bg)),
        size,
    );

    let layout = create_main_layout(size);

    let entries: Vec<&ClipboardEntry> = ctx.history.entries().iter().collect();
    let title = format!(
        "Clipboard History ({} max)",
        ctx.history.capacity()
    );
    render_clip_list(
        frame,
        layout.content,
        &entries,
        ClipListRenderContext {
            selected: None,
            header: ListHeader::Title(&title),
            empty_message: "Nothing copied yet",
            theme,
        },
    );

    let mode = match ctx.cycle {
        Some(state) => {
            render_overlay(frame, layout.content, state, ctx.search_input, theme);
            if state.is_active() {
                HintMode::Cycling
            } else {
                HintMode::Picking
            }
        }
        None => HintMode::Idle,
    };

    render_notifications(frame, layout.notifications, ctx.notifications, theme);
    render_keyboard_hints(
        frame,
        layout.keyboard_hints,
        mode,
        ctx.open_key.as_deref(),
        theme,
    );
}
