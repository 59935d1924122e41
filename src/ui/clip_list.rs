use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};
use tui_input::Input;
use unicode_width::UnicodeWidthStr;

use super::Theme;
use crate::models::ClipboardEntry;

/// Width of `ClipboardEntry::display_time`, e.g. "26 Nov  11:57:44 PM"
const TIME_COL_WIDTH: u16 = 19;

/// Prefix drawn before the search query
const SEARCH_PREFIX: &str = "/ ";

/// Header line of the list
pub enum ListHeader<'a> {
    /// Fixed title
    Title(&'a str),
    /// Editable search query; the cursor is placed in it
    Search(&'a Input),
}

/// Context for rendering the clip list
pub struct ClipListRenderContext<'a> {
    pub selected: Option<usize>,
    pub header: ListHeader<'a>,
    /// Shown instead of rows when there are no entries
    pub empty_message: &'a str,
    pub theme: &'a Theme,
}

/// Table rows: number, preview, time
fn render_table_rows<'a>(
    entries: &[&ClipboardEntry],
    selected: Option<usize>,
    content_col_width: usize,
    theme: &'a Theme,
) -> Vec<Row<'a>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let is_selected = selected == Some(i);

            let number_cell = Cell::from(Span::styled(format!("{:3}", i + 1), theme.clip_number));

            let preview_style = if is_selected {
                theme.clip_text_selected
            } else {
                theme.clip_text
            };
            let preview_cell =
                Cell::from(Span::styled(entry.preview(content_col_width), preview_style));

            let time_cell = Cell::from(Span::styled(entry.display_time(), theme.timestamp));

            let row = Row::new(vec![number_cell, preview_cell, time_cell]);
            if is_selected {
                row.style(Style::default().bg(theme.selection_bg))
            } else {
                row
            }
        })
        .collect()
}

/// Render a header line plus the entry table
/// The header shows the title or the search query, with the item count right-aligned
pub fn render_clip_list(
    frame: &mut Frame,
    area: Rect,
    entries: &[&ClipboardEntry],
    ctx: ClipListRenderContext,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(1),    // List
        ])
        .split(area);

    let header_area = chunks[0];
    let list_area = chunks[1];

    let count_text = match entries.len() {
        1 => "1 item".to_string(),
        n => format!("{} items", n),
    };

    let (header_text, header_style) = match &ctx.header {
        ListHeader::Title(title) => (title.to_string(), ctx.theme.clip_list_header),
        ListHeader::Search(input) => (
            format!("{}{}", SEARCH_PREFIX, input.value()),
            ctx.theme.search_input,
        ),
    };

    // Split header horizontally: title on left, 1-space gap, count on right
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(count_text.width() as u16),
        ])
        .split(header_area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(header_text, header_style))),
        header_chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            count_text,
            ctx.theme.clip_list_item_count,
        ))),
        header_chunks[2],
    );

    if let ListHeader::Search(input) = &ctx.header {
        let cursor_x = header_area.x + SEARCH_PREFIX.width() as u16 + input.visual_cursor() as u16;
        frame.set_cursor_position(Position::new(
            cursor_x.min(header_chunks[0].right().saturating_sub(1)),
            header_area.y,
        ));
    }

    if entries.is_empty() {
        let message = Paragraph::new(Line::from(Span::styled(
            ctx.empty_message,
            ctx.theme.empty_text,
        )))
        .alignment(Alignment::Center);
        frame.render_widget(message, list_area);
        return;
    }

    // Number column (3) plus the spacing between three columns
    let content_col_width = list_area
        .width
        .saturating_sub(3)
        .saturating_sub(TIME_COL_WIDTH)
        .saturating_sub(2);

    let rows = render_table_rows(entries, ctx.selected, content_col_width as usize, ctx.theme);
    let widths = [
        Constraint::Length(3),              // Number
        Constraint::Min(10),                // Preview (fills remaining)
        Constraint::Length(TIME_COL_WIDTH), // Time
    ];
    let table = Table::new(rows, widths);

    // Selecting keeps the cursor row scrolled into view
    let mut table_state = TableState::default();
    table_state.select(ctx.selected);

    frame.render_stateful_widget(table, list_area, &mut table_state);
}
