//! Students screen.

use crate::state::{App, ScreenFilter};
use crate::theme::student_status_color;
use crate::views::list;
use crate::widgets::{DetailPanel, FilterBar, FilterOption};
use campus_core::{FilterSet, Student, StudentFilter};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    Frame,
};

pub fn filter_options(filter: &StudentFilter) -> Vec<FilterOption> {
    let center = filter.center_id.map(|id| id.to_string());
    vec![
        FilterOption::field("status", filter.status_label()),
        FilterOption::field("course", filter.course.as_deref()),
        FilterOption::field("center", center.as_deref()),
        FilterOption::field("search", filter.search()),
    ]
}

pub fn render_filters(f: &mut Frame<'_>, app: &App, area: Rect) {
    let options = filter_options(app.students.query.filter());
    FilterBar {
        title: "Filters [s status / search c clear]",
        filters: &options,
        active_style: Style::default().fg(app.theme.secondary),
        inactive_style: Style::default().fg(app.theme.text_dim),
    }
    .render(f, area);
}

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let theme = &app.theme;
    list::render(f, &app.students, theme, "Students", chunks[0], |student: &Student| {
        Line::from(vec![
            Span::styled(
                format!("{:<12}", student.registration_number),
                Style::default().fg(theme.primary_dim),
            ),
            Span::styled(format!("{:<24}", student.full_name()), Style::default().fg(theme.text)),
            Span::styled(format!("{:<14}", student.course), Style::default().fg(theme.text_dim)),
            Span::styled(
                student.status.as_str().to_string(),
                Style::default().fg(student_status_color(student.status, theme)),
            ),
        ])
    });

    if let Some(student) = app.students.selected_item() {
        let fields = vec![
            ("Student ID", student.student_id.to_string()),
            ("Registration", student.registration_number.clone()),
            ("Name", student.full_name()),
            ("Email", student.email.clone().unwrap_or_else(|| "-".to_string())),
            ("Phone", student.phone.clone().unwrap_or_else(|| "-".to_string())),
            ("Center", student.center_id.to_string()),
            ("Course", student.course.clone()),
            ("Status", student.status.to_string()),
            ("Enrolled", student.enrolled_at.to_rfc3339()),
        ];
        DetailPanel {
            title: "Details",
            fields,
            label_style: Style::default().fg(theme.secondary),
        }
        .render(f, chunks[1]);
    }
}
