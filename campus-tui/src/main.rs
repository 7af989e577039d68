//! Campus console entry point.

use campus_tui::api_client::RestClient;
use campus_tui::config::ConsoleConfig;
use campus_tui::error::TuiError;
use campus_tui::events::ConsoleEvent;
use campus_tui::logging;
use campus_tui::state::App;
use campus_tui::views::{list_rows, render_view};
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = ConsoleConfig::load()?;
    logging::init(&config)?;
    let client = Arc::new(RestClient::new(&config)?);
    tracing::info!(base_url = client.base_url(), "console starting");

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let (event_tx, mut event_rx) = mpsc::channel::<ConsoleEvent>(256);
    spawn_input_reader(event_tx.clone());

    let mut app = App::new(config, client, event_tx.clone());
    let size = terminal.size()?;
    app.set_list_height(list_rows(size.height));
    app.start();

    let mut ticker = tokio::time::interval(app.config.refresh_interval());

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                app.handle_event(ConsoleEvent::Tick);
            }
            Some(event) = event_rx.recv() => {
                if app.handle_event(event) {
                    break;
                }
            }
        }
    }

    tracing::info!("console exiting");
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<ConsoleEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let event = match evt {
                    CrosstermEvent::Key(key) => ConsoleEvent::Input(key),
                    CrosstermEvent::Resize(width, height) => ConsoleEvent::Resize { width, height },
                    _ => continue,
                };
                if sender.blocking_send(event).is_err() {
                    break;
                }
            }
        }
    });
}
