//! Event types for the console event loop.

use crate::nav::Screen;
use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    Input(KeyEvent),
    Tick,
    Resize { width: u16, height: u16 },
    /// A page fetch for `screen` finished; its completion is waiting.
    FetchSettled { screen: Screen },
    /// The debounce window armed by the viewport trigger elapsed.
    ViewportElapsed { screen: Screen, token: u64 },
    Error(String),
}
