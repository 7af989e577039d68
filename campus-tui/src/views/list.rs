//! Generic rendering of an infinite list with its sentinel row.

use crate::state::{ListScreen, ScreenFilter};
use crate::theme::SynthBruteTheme;
use crate::widgets::StatusRow;
use campus_core::ListEntity;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Lines for the visible window: item rows, then the status row once the
/// window reaches past the last item.
pub fn visible_lines<E, F>(
    screen: &ListScreen<E>,
    theme: &SynthBruteTheme,
    row: F,
) -> Vec<Line<'static>>
where
    E: ListEntity,
    E::Filter: ScreenFilter,
    F: Fn(&E) -> Line<'static>,
{
    let viewport = &screen.viewport;
    let items = screen.query.items();
    let range = viewport.visible_range();
    let selected = viewport.selected();

    let mut lines: Vec<Line<'static>> = items[range.clone()]
        .iter()
        .zip(range.clone())
        .map(|(item, idx)| {
            let mut line = row(item);
            if selected == Some(idx) {
                line.style = line
                    .style
                    .bg(theme.bg_highlight)
                    .add_modifier(Modifier::BOLD);
            }
            line
        })
        .collect();

    if viewport.offset() + viewport.height() > items.len() {
        let status = screen.status_line();
        lines.push(
            StatusRow {
                status: &status,
                theme,
            }
            .line(),
        );
    }
    lines
}

pub fn render<E, F>(
    f: &mut Frame<'_>,
    screen: &ListScreen<E>,
    theme: &SynthBruteTheme,
    title: &str,
    area: Rect,
    row: F,
) where
    E: ListEntity,
    E::Filter: ScreenFilter,
    F: Fn(&E) -> Line<'static>,
{
    let lines = visible_lines(screen, theme, row);
    let list = Paragraph::new(lines).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border_focus)),
    );
    f.render_widget(list, area);
}
