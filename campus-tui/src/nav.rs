//! Navigation between list screens.

use campus_core::Collection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    Students,
    Payments,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Students => "Students",
            Screen::Payments => "Payments",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Screen::Students => Collection::Students,
            Screen::Payments => Collection::Payments,
        }
    }

    pub fn all() -> &'static [Screen] {
        &[Screen::Students, Screen::Payments]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Screen> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> Screen {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> Screen {
        let all = Self::all();
        let idx = self.index();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycling_wraps_both_ways() {
        assert_eq!(Screen::Students.next(), Screen::Payments);
        assert_eq!(Screen::Payments.next(), Screen::Students);
        assert_eq!(Screen::Students.previous(), Screen::Payments);
    }
}
