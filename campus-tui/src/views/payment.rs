//! Payments screen.

use crate::state::{App, ScreenFilter};
use crate::theme::payment_status_color;
use crate::views::list;
use crate::widgets::{DetailPanel, FilterBar, FilterOption};
use campus_core::{FilterSet, Payment, PaymentFilter};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    Frame,
};

pub fn filter_options(filter: &PaymentFilter) -> Vec<FilterOption> {
    let student = filter.student_id.map(|id| id.to_string());
    vec![
        FilterOption::field("status", filter.status_label()),
        FilterOption::field("method", filter.method.map(|m| m.as_str())),
        FilterOption::field("student", student.as_deref()),
        FilterOption::field("search", filter.search()),
    ]
}

pub fn render_filters(f: &mut Frame<'_>, app: &App, area: Rect) {
    let options = filter_options(app.payments.query.filter());
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
    list::render(f, &app.payments, theme, "Payments", chunks[0], |payment: &Payment| {
        Line::from(vec![
            Span::styled(
                format!("{:<12}", payment.receipt_number),
                Style::default().fg(theme.primary_dim),
            ),
            Span::styled(format!("{:<22}", payment.student_name), Style::default().fg(theme.text)),
            Span::styled(format!("{:>14} ", payment.display_amount()), Style::default().fg(theme.tertiary)),
            Span::styled(
                payment.status.as_str().to_string(),
                Style::default().fg(payment_status_color(payment.status, theme)),
            ),
        ])
    });

    if let Some(payment) = app.payments.selected_item() {
        let fields = vec![
            ("Payment ID", payment.payment_id.to_string()),
            ("Receipt", payment.receipt_number.clone()),
            ("Student", payment.student_name.clone()),
            ("Student ID", payment.student_id.to_string()),
            ("Amount", payment.display_amount()),
            ("Method", payment.method.to_string()),
            ("Status", payment.status.to_string()),
            ("Paid", payment.paid_at.to_rfc3339()),
        ];
        DetailPanel {
            title: "Details",
            fields,
            label_style: Style::default().fg(theme.secondary),
        }
        .render(f, chunks[1]);
    }
}
