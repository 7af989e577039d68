//! Filter bar widget.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub label: String,
    pub active: bool,
}

impl FilterOption {
    /// `name: value` when set, `name: any` otherwise.
    pub fn field(name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => Self {
                label: format!("{}: {}", name, value),
                active: true,
            },
            None => Self {
                label: format!("{}: any", name),
                active: false,
            },
        }
    }
}

pub struct FilterBar<'a> {
    pub title: &'a str,
    pub filters: &'a [FilterOption],
    pub active_style: Style,
    pub inactive_style: Style,
}

impl<'a> FilterBar<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let spans: Vec<Span> = self
            .filters
            .iter()
            .map(|filter| {
                let style = if filter.active {
                    self.active_style
                } else {
                    self.inactive_style
                };
                Span::styled(format!(" {} ", filter.label), style)
            })
            .collect();

        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().title(self.title).borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_label() {
        assert_eq!(
            FilterOption::field("status", Some("active")),
            FilterOption {
                label: "status: active".to_string(),
                active: true
            }
        );
        assert!(!FilterOption::field("course", None).active);
    }
}
