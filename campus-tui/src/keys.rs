//! Keybinding definitions for the console.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextScreen,
    PrevScreen,
    SwitchScreen(usize),
    MoveUp,
    MoveDown,
    ScrollTop,
    ScrollBottom,
    OpenSearch,
    CycleStatus,
    ClearFilters,
    Retry,
    Refetch,
    DismissNotification,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refetch),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextScreen),
        KeyCode::BackTab => Some(Action::PrevScreen),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Home | KeyCode::Char('g') => Some(Action::ScrollTop),
        KeyCode::End | KeyCode::Char('G') => Some(Action::ScrollBottom),
        KeyCode::Char('/') => Some(Action::OpenSearch),
        KeyCode::Char('s') => Some(Action::CycleStatus),
        KeyCode::Char('c') => Some(Action::ClearFilters),
        KeyCode::Char('r') => Some(Action::Retry),
        KeyCode::Esc => Some(Action::DismissNotification),
        KeyCode::Char('1') => Some(Action::SwitchScreen(0)),
        KeyCode::Char('2') => Some(Action::SwitchScreen(1)),
        _ => None,
    }
}

/// Edits to the search prompt while it is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEdit {
    Insert(char),
    Backspace,
    Submit,
    Cancel,
}

pub fn map_prompt_key(event: KeyEvent) -> Option<PromptEdit> {
    match event.code {
        KeyCode::Enter => Some(PromptEdit::Submit),
        KeyCode::Esc => Some(PromptEdit::Cancel),
        KeyCode::Backspace => Some(PromptEdit::Backspace),
        KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(PromptEdit::Insert(c))
        }
        _ => None,
    }
}
