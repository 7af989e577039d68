//! Sentinel row rendered under the last list item.

use crate::state::StatusLine;
use crate::theme::SynthBruteTheme;
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

pub struct StatusRow<'a> {
    pub status: &'a StatusLine,
    pub theme: &'a SynthBruteTheme,
}

impl<'a> StatusRow<'a> {
    pub fn text(&self) -> String {
        match self.status {
            StatusLine::Idle => String::new(),
            StatusLine::Loading(label)
            | StatusLine::FetchingMore(label)
            | StatusLine::Exhausted(label)
            | StatusLine::Empty(label) => label.clone(),
            StatusLine::More { loaded, total } => match total {
                Some(total) => format!("{} of {} loaded", loaded, total),
                None => format!("{} loaded", loaded),
            },
            StatusLine::Error { label, message } if message.is_empty() => {
                format!("{} (r to retry)", label)
            }
            StatusLine::Error { label, message } => {
                format!("{}: {} (r to retry)", label, message)
            }
        }
    }

    pub fn style(&self) -> Style {
        let color = match self.status {
            StatusLine::Error { .. } => self.theme.error,
            StatusLine::Loading(_) | StatusLine::FetchingMore(_) => self.theme.warning,
            StatusLine::Exhausted(_) | StatusLine::Empty(_) => self.theme.text_dim,
            StatusLine::Idle | StatusLine::More { .. } => self.theme.text_muted,
        };
        Style::default().fg(color).add_modifier(Modifier::ITALIC)
    }

    pub fn line(&self) -> Line<'static> {
        Line::from(Span::styled(self.text(), self.style()))
    }
}
