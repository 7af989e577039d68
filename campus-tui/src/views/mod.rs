//! View rendering dispatch.

pub mod list;
pub mod payment;
pub mod student;

use crate::nav::Screen;
use crate::notifications::NotificationLevel;
use crate::state::App;
use crate::theme::progress_color;
use crate::widgets::ProgressBar;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

const HEADER_ROWS: u16 = 3;
const FILTER_ROWS: u16 = 3;
const PROGRESS_ROWS: u16 = 3;
const FOOTER_ROWS: u16 = 3;
const LIST_BORDER_ROWS: u16 = 2;

/// Item rows available to a list for a terminal `height` rows tall.
pub fn list_rows(height: u16) -> usize {
    usize::from(height.saturating_sub(
        HEADER_ROWS + FILTER_ROWS + PROGRESS_ROWS + FOOTER_ROWS + LIST_BORDER_ROWS,
    ))
}

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_ROWS),
            Constraint::Length(FILTER_ROWS),
            Constraint::Min(0),
            Constraint::Length(PROGRESS_ROWS),
            Constraint::Length(FOOTER_ROWS),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active {
        Screen::Students => {
            student::render_filters(f, app, layout[1]);
            student::render(f, app, layout[2]);
        }
        Screen::Payments => {
            payment::render_filters(f, app, layout[1]);
            payment::render(f, app, layout[2]);
        }
    }

    render_progress(f, app, layout[3]);
    render_footer(f, app, layout[4]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let titles: Vec<Line> = Screen::all()
        .iter()
        .map(|screen| Line::from(format!("{} {}", screen.index() + 1, screen.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(Span::styled(
            "CAMPUS CONSOLE",
            Style::default().fg(app.theme.primary),
        )))
        .select(app.active.index())
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_progress(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (loaded, total) = match app.active {
        Screen::Students => (app.students.query.items().len(), app.students.query.total_count()),
        Screen::Payments => (app.payments.query.items().len(), app.payments.query.total_count()),
    };
    let bar = ProgressBar {
        title: "Loaded".to_string(),
        loaded,
        total,
        style: Style::default(),
    };
    let percent = (bar.ratio() * 100.0) as f32;
    ProgressBar {
        style: Style::default().fg(progress_color(percent, &app.theme)),
        ..bar
    }
    .render(f, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    if let Some(prompt) = &app.search {
        let prompt = Paragraph::new(format!("/{}", prompt.input))
            .block(Block::default().borders(Borders::ALL).title("Search (Enter apply, Esc cancel)"))
            .style(Style::default().fg(app.theme.primary));
        f.render_widget(prompt, area);
        return;
    }

    let help = "j/k move • g/G top/bottom • Tab switch • / search • s status • c clear • r retry • ^r reload • q quit";
    let (text, style) = if let Some(note) = app.notifications.last() {
        let color = match note.level {
            NotificationLevel::Info => app.theme.info,
            NotificationLevel::Warning => app.theme.warning,
            NotificationLevel::Error => app.theme.error,
        };
        (note.summary(), Style::default().fg(color))
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}
