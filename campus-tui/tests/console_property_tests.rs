use async_trait::async_trait;
use campus_core::{
    FetchError, FilterSet, Page, PageFetcher, PageRequest, Payment, Student, StudentStatus,
};
use campus_test_utils::fixtures::{paged_payments, paged_students};
use campus_test_utils::ScriptedFetcher;
use campus_tui::config::{ConfigError, ConsoleConfig};
use campus_tui::events::ConsoleEvent;
use campus_tui::keys::{map_key, map_prompt_key, Action, PromptEdit};
use campus_tui::nav::Screen;
use campus_tui::notifications::{NotificationAction, NotificationLevel, MAX_NOTIFICATIONS};
use campus_tui::state::{App, StatusLine};
use campus_tui::viewport::ListViewport;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;

const BASE_CONFIG: &str = r#"
api_base_url = "http://localhost:8080"
request_timeout_ms = 5000
refresh_interval_ms = 250
log_path = "tmp/campus-console.log"
log_level = "info"
cache_ttl_ms = 300000

[auth]
api_key = "test-key"

[lists.students]
page_size = 10

[lists.payments]
page_size = 10
"#;

fn base_config() -> ConsoleConfig {
    ConsoleConfig::from_toml(BASE_CONFIG).unwrap()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn config_base_is_valid() {
    let config = base_config();
    assert!(config.validate().is_ok());
    assert_eq!(config.retry.attempts, 2);
    assert!(config.lists.students.infinite_scroll);
}

#[test]
fn config_requires_auth() {
    let mut config = base_config();
    config.auth.api_key = None;
    config.auth.jwt = None;
    assert!(config.validate().is_err());
}

#[test]
fn config_rejects_threshold_out_of_range() {
    let mut config = base_config();
    config.lists.students.threshold = 1.5;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "lists.students",
            ..
        })
    ));
}

#[test]
fn config_rejects_backoff_cap_below_initial() {
    let mut config = base_config();
    config.retry.initial_ms = 500;
    config.retry.max_ms = 100;
    assert!(config.validate().is_err());
}

#[test]
fn config_reads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("console.toml");
    std::fs::write(&path, BASE_CONFIG).unwrap();
    let config = ConsoleConfig::from_path(&path).unwrap();
    assert_eq!(config.api_base_url, "http://localhost:8080");
}

// ============================================================================
// KEYS AND VIEWPORT
// ============================================================================

proptest! {
    #[test]
    fn keybinding_digit_switches_screen(digit in 0u8..=9u8) {
        let ch = char::from(b'0' + digit);
        let expected = match ch {
            '1' => Some(Action::SwitchScreen(0)),
            '2' => Some(Action::SwitchScreen(1)),
            _ => None,
        };
        prop_assert_eq!(map_key(key(KeyCode::Char(ch))), expected);
    }

    #[test]
    fn prompt_inserts_plain_characters(ch in any::<char>()) {
        prop_assert_eq!(map_prompt_key(key(KeyCode::Char(ch))), Some(PromptEdit::Insert(ch)));
    }

    #[test]
    fn viewport_selection_stays_in_bounds(
        height in 0usize..20,
        len in 0usize..60,
        moves in proptest::collection::vec(0u8..4, 0..40),
    ) {
        let mut viewport = ListViewport::new(height);
        viewport.set_content_len(len);
        for step in moves {
            match step {
                0 => viewport.select_next(),
                1 => viewport.select_previous(),
                2 => viewport.scroll_to_bottom(),
                _ => viewport.scroll_to_top(),
            }
            let range = viewport.visible_range();
            prop_assert!(range.len() <= height);
            prop_assert!(range.end <= len);
            match viewport.selected() {
                Some(sel) => {
                    prop_assert!(sel < len);
                    if height > 0 {
                        prop_assert!(range.contains(&sel));
                    }
                }
                None => prop_assert_eq!(len, 0),
            }
            let ratio = viewport.sentinel_ratio(0, 1);
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }
}

// ============================================================================
// APP
// ============================================================================

struct Campus {
    students: ScriptedFetcher<Student>,
    payments: ScriptedFetcher<Payment>,
}

#[async_trait]
impl PageFetcher<Student> for Campus {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Student>, FetchError> {
        self.students.fetch_page(request).await
    }
}

#[async_trait]
impl PageFetcher<Payment> for Campus {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Payment>, FetchError> {
        self.payments.fetch_page(request).await
    }
}

fn app(campus: &Arc<Campus>, rows: usize) -> (App, mpsc::Receiver<ConsoleEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let mut app = App::new(base_config(), Arc::clone(campus), tx);
    app.set_list_height(rows);
    app.start();
    (app, rx)
}

fn campus(students: u32, payments: u32) -> Arc<Campus> {
    Arc::new(Campus {
        students: paged_students(students),
        payments: paged_payments(payments),
    })
}

async fn pump(app: &mut App, rx: &mut mpsc::Receiver<ConsoleEvent>) -> ConsoleEvent {
    let event = rx.recv().await.expect("event channel open");
    app.handle_event(event.clone());
    event
}

#[tokio::test(start_paused = true)]
async fn app_scrolling_to_the_end_loads_the_next_page() {
    let campus = campus(25, 0);
    let (mut app, mut rx) = app(&campus, 5);

    assert!(matches!(pump(&mut app, &mut rx).await, ConsoleEvent::FetchSettled { .. }));
    assert_eq!(app.students.query.items().len(), 10);
    assert!(!app.students.trigger.is_armed());

    app.handle_action(Action::ScrollBottom);
    assert!(app.students.trigger.is_armed());

    assert!(matches!(pump(&mut app, &mut rx).await, ConsoleEvent::ViewportElapsed { .. }));
    assert!(app.students.query.is_fetching_next_page());
    assert!(matches!(
        app.students.status_line(),
        StatusLine::FetchingMore(_)
    ));

    pump(&mut app, &mut rx).await;
    assert_eq!(app.students.query.items().len(), 20);
    assert_eq!(campus.students.requested_pages(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn app_switching_screens_mounts_the_new_list() {
    let campus = campus(5, 5);
    let (mut app, mut rx) = app(&campus, 10);
    pump(&mut app, &mut rx).await;

    app.handle_action(Action::NextScreen);
    assert_eq!(app.active, Screen::Payments);
    assert!(app.payments.query.is_mounted());
    assert!(!app.students.query.is_mounted());

    pump(&mut app, &mut rx).await;
    assert_eq!(app.payments.query.items().len(), 5);
    assert!(matches!(app.payments.status_line(), StatusLine::Exhausted(_)));

    app.handle_action(Action::SwitchScreen(0));
    assert_eq!(app.active, Screen::Students);
    assert_eq!(app.students.query.items().len(), 5);
    assert_eq!(campus.students.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn app_background_screen_never_arms_its_trigger() {
    let campus = campus(25, 5);
    let (mut app, mut rx) = app(&campus, 5);
    pump(&mut app, &mut rx).await;
    app.handle_action(Action::ScrollBottom);
    assert!(app.students.trigger.is_armed());

    app.handle_action(Action::NextScreen);
    assert!(!app.students.trigger.is_armed());
    app.handle_event(ConsoleEvent::Tick);
    assert!(!app.students.trigger.is_armed());

    pump(&mut app, &mut rx).await;
    app.handle_event(ConsoleEvent::Tick);
    assert!(!app.students.trigger.is_armed());
    assert_eq!(app.payments.query.items().len(), 5);
    assert_eq!(campus.students.requested_pages(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn app_failed_page_notifies_and_retries() {
    let campus = campus(5, 0);
    campus
        .students
        .fail_next(1, FetchError::server(Some(500), "Database unavailable"));
    let (mut app, mut rx) = app(&campus, 10);
    pump(&mut app, &mut rx).await;

    let note = app.notifications.last().expect("failure notification");
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.action, Some(NotificationAction::Retry));
    assert!(note.message.contains("Database unavailable"));
    assert_eq!(
        app.students.status_line(),
        StatusLine::Error {
            label: "Could not load data".to_string(),
            message: "Database unavailable".to_string(),
        }
    );

    app.handle_event(ConsoleEvent::Input(key(KeyCode::Char('r'))));
    pump(&mut app, &mut rx).await;
    assert_eq!(app.students.query.items().len(), 5);
    assert_eq!(campus.students.requested_pages(), vec![1, 1]);

    app.handle_action(Action::DismissNotification);
    assert!(app.notifications.is_empty());

    app.handle_action(Action::Retry);
    let note = app.notifications.last().expect("nothing-to-retry warning");
    assert_eq!(note.level, NotificationLevel::Warning);
    assert_eq!(note.action, Some(NotificationAction::Dismiss));

    app.handle_action(Action::Refetch);
    let note = app.notifications.last().expect("reload notice");
    assert_eq!(note.level, NotificationLevel::Info);
    assert_eq!(note.message, "Reloading Students.");
}

#[tokio::test(start_paused = true)]
async fn app_search_prompt_applies_a_new_filter() {
    let campus = campus(30, 0);
    let (mut app, mut rx) = app(&campus, 10);
    pump(&mut app, &mut rx).await;

    app.handle_event(ConsoleEvent::Input(key(KeyCode::Char('/'))));
    assert!(app.search.is_some());
    for ch in "asha".chars() {
        app.handle_event(ConsoleEvent::Input(key(KeyCode::Char(ch))));
    }
    assert!(app.search.is_some());
    app.handle_event(ConsoleEvent::Input(key(KeyCode::Enter)));
    assert!(app.search.is_none());
    assert_eq!(app.students.query.filter().search(), Some("asha"));

    pump(&mut app, &mut rx).await;
    assert!(!app.students.query.items().is_empty());
    assert!(app
        .students
        .query
        .items()
        .iter()
        .all(|s| s.first_name == "Asha"));
    assert_eq!(app.students.viewport.selected(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn app_status_cycle_reaches_the_request() {
    let campus = campus(5, 0);
    let (mut app, mut rx) = app(&campus, 10);
    pump(&mut app, &mut rx).await;

    app.handle_action(Action::CycleStatus);
    assert_eq!(app.students.query.filter().status, Some(StudentStatus::ALL[0]));
    pump(&mut app, &mut rx).await;

    let last = campus.students.requests().pop().expect("request recorded");
    assert!(last
        .params
        .iter()
        .any(|(name, value)| name == "status" && value == StudentStatus::ALL[0].as_str()));

    app.handle_action(Action::ClearFilters);
    assert_eq!(app.students.query.filter().status, None);
}

#[tokio::test]
async fn app_notifications_are_capped() {
    let campus = campus(0, 0);
    let (mut app, _rx) = app(&campus, 10);
    for n in 0..(MAX_NOTIFICATIONS + 3) {
        app.notify(NotificationLevel::Info, format!("note {}", n));
    }
    assert_eq!(app.notifications.len(), MAX_NOTIFICATIONS);
    assert_eq!(
        app.notifications.last().map(|n| n.message.as_str()),
        Some("note 7")
    );
}

#[tokio::test]
async fn app_resize_updates_list_height() {
    let campus = campus(0, 0);
    let (mut app, _rx) = app(&campus, 10);
    app.handle_event(ConsoleEvent::Resize {
        width: 120,
        height: 40,
    });
    assert_eq!(app.students.viewport.height(), 26);
    assert_eq!(app.payments.viewport.height(), 26);
}

#[tokio::test]
async fn app_quit_keys_exit() {
    let campus = campus(0, 0);
    let (mut app, _rx) = app(&campus, 10);
    assert!(app.handle_event(ConsoleEvent::Input(key(KeyCode::Char('q')))));
    let ctrl_c = KeyEvent {
        code: KeyCode::Char('c'),
        modifiers: KeyModifiers::CONTROL,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    };
    assert_eq!(map_key(ctrl_c), Some(Action::Quit));
}
