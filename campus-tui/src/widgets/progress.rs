//! Gauge of loaded records against the server's total.

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Gauge},
    Frame,
};

pub struct ProgressBar {
    pub title: String,
    pub loaded: usize,
    pub total: Option<u64>,
    pub style: Style,
}

impl ProgressBar {
    pub fn ratio(&self) -> f64 {
        match self.total {
            Some(0) => 1.0,
            Some(total) => (self.loaded as f64 / total as f64).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    pub fn label(&self) -> String {
        match self.total {
            Some(total) => format!("{} / {}", self.loaded, total),
            None => format!("{} / ?", self.loaded),
        }
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let gauge = Gauge::default()
            .block(Block::default().title(self.title.as_str()).borders(Borders::ALL))
            .gauge_style(self.style)
            .label(self.label())
            .ratio(self.ratio());
        f.render_widget(gauge, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(loaded: usize, total: Option<u64>) -> ProgressBar {
        ProgressBar {
            title: "Loaded".to_string(),
            loaded,
            total,
            style: Style::default(),
        }
    }

    #[test]
    fn test_ratio_and_label() {
        assert_eq!(bar(10, Some(40)).ratio(), 0.25);
        assert_eq!(bar(10, Some(40)).label(), "10 / 40");
        assert_eq!(bar(0, Some(0)).ratio(), 1.0);
        assert_eq!(bar(3, None).label(), "3 / ?");
        assert_eq!(bar(50, Some(40)).ratio(), 1.0);
    }
}
