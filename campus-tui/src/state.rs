//! Application state and list screen state.

use crate::config::{ConsoleConfig, ListConfig};
use crate::events::ConsoleEvent;
use crate::keys::{map_key, map_prompt_key, Action, PromptEdit};
use crate::nav::Screen;
use crate::notifications::{
    Notification, NotificationAction, NotificationLevel, MAX_NOTIFICATIONS,
};
use crate::query::InfiniteQuery;
use crate::theme::SynthBruteTheme;
use crate::views;
use crate::viewport::{ListViewport, TriggerConfig, TriggerGate, ViewportTrigger};
use campus_core::{
    ApplyOutcome, CursorState, FilterSet, ListEntity, PageFetcher, Payment, PaymentFilter,
    PaymentStatus, Student, StudentFilter, StudentStatus,
};
use std::sync::Arc;
use tokio::sync::mpsc;

// ============================================================================
// FILTER CONTROLS
// ============================================================================

/// Screen-level controls over a collection's filter set.
pub trait ScreenFilter: FilterSet {
    /// Advance the status filter: none, each status in turn, none again.
    fn cycle_status(&mut self);

    fn status_label(&self) -> Option<&'static str>;
}

fn cycle<T: Copy + PartialEq>(current: Option<T>, all: &[T]) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(value) => all
            .iter()
            .position(|candidate| *candidate == value)
            .and_then(|idx| all.get(idx + 1))
            .copied(),
    }
}

impl ScreenFilter for StudentFilter {
    fn cycle_status(&mut self) {
        self.status = cycle(self.status, &StudentStatus::ALL);
    }

    fn status_label(&self) -> Option<&'static str> {
        self.status.map(|s| s.as_str())
    }
}

impl ScreenFilter for PaymentFilter {
    fn cycle_status(&mut self) {
        self.status = cycle(self.status, &PaymentStatus::ALL);
    }

    fn status_label(&self) -> Option<&'static str> {
        self.status.map(|s| s.as_str())
    }
}

// ============================================================================
// LIST SCREEN
// ============================================================================

/// What the sentinel row under the last item shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Idle,
    Loading(String),
    FetchingMore(String),
    More { loaded: usize, total: Option<u64> },
    Exhausted(String),
    Empty(String),
    Error { label: String, message: String },
}

pub struct ListScreen<E: ListEntity> {
    pub query: InfiniteQuery<E>,
    pub viewport: ListViewport,
    pub trigger: ViewportTrigger,
    pub config: ListConfig,
}

impl<E: ListEntity> ListScreen<E>
where
    E::Filter: ScreenFilter,
{
    pub fn new(query: InfiniteQuery<E>, config: ListConfig, events: mpsc::Sender<ConsoleEvent>) -> Self {
        let trigger_config = TriggerConfig {
            debounce: config.debounce(),
            margin_rows: usize::from(config.margin_rows),
            threshold: config.threshold,
            sentinel_rows: 1,
        };
        Self {
            trigger: ViewportTrigger::new(query.screen(), trigger_config, events),
            query,
            viewport: ListViewport::default(),
            config,
        }
    }

    pub fn gate(&self) -> TriggerGate {
        TriggerGate {
            enabled: self.config.infinite_scroll,
            has_next_page: self.query.has_next_page(),
            in_flight: self.query.is_in_flight(),
            errored: self.query.is_error(),
        }
    }

    /// Bring the viewport and trigger in line with the query.
    pub fn sync(&mut self) {
        self.viewport.set_content_len(self.query.items().len());
        if !self.query.is_mounted() {
            self.trigger.disarm();
            return;
        }
        let gate = self.gate();
        self.trigger.observe(&self.viewport, gate);
    }

    pub fn mount(&mut self) -> bool {
        let started = self.query.mount();
        self.sync();
        started
    }

    pub fn unmount(&mut self) {
        self.trigger.reset();
        self.query.unmount();
    }

    pub fn set_height(&mut self, height: usize) {
        self.viewport.set_height(height);
        self.sync();
    }

    pub fn on_fetch_settled(&mut self) -> Vec<ApplyOutcome> {
        let outcomes = self.query.drain();
        self.sync();
        outcomes
    }

    /// Load the next page if the elapsed window still warrants it.
    pub fn on_viewport_elapsed(&mut self, token: u64) -> bool {
        let gate = self.gate();
        if !self.trigger.on_elapsed(token, &self.viewport, gate) {
            return false;
        }
        let issued = self.query.fetch_next_page();
        self.sync();
        issued
    }

    /// Apply a new filter set. A new key resets scroll and the trigger.
    pub fn apply_filter(&mut self, filter: E::Filter) -> bool {
        let previous = self.query.key().clone();
        self.query.set_filter(filter);
        let changed = *self.query.key() != previous;
        if changed {
            self.trigger.reset();
            self.viewport.scroll_to_top();
        }
        self.sync();
        changed
    }

    pub fn cycle_status(&mut self) -> bool {
        let mut filter = self.query.filter().clone();
        filter.cycle_status();
        self.apply_filter(filter)
    }

    pub fn clear_filters(&mut self) -> bool {
        self.apply_filter(E::Filter::default())
    }

    pub fn set_search(&mut self, search: &str) -> bool {
        let mut filter = self.query.filter().clone();
        let search = search.trim();
        filter.set_search((!search.is_empty()).then(|| search.to_string()));
        self.apply_filter(filter)
    }

    pub fn retry(&mut self) -> bool {
        let issued = self.query.retry();
        self.sync();
        issued
    }

    pub fn refetch(&mut self) -> bool {
        self.trigger.reset();
        let issued = self.query.refetch();
        self.sync();
        issued
    }

    pub fn select_next(&mut self) {
        self.viewport.select_next();
        self.sync();
    }

    pub fn select_previous(&mut self) {
        self.viewport.select_previous();
        self.sync();
    }

    pub fn scroll_to_top(&mut self) {
        self.viewport.scroll_to_top();
        self.sync();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.viewport.scroll_to_bottom();
        self.sync();
    }

    pub fn selected_item(&self) -> Option<&E> {
        self.viewport
            .selected()
            .and_then(|idx| self.query.items().get(idx))
    }

    pub fn status_line(&self) -> StatusLine {
        let labels = &self.config.labels;
        match self.query.state() {
            CursorState::Idle => StatusLine::Idle,
            CursorState::Loading => StatusLine::Loading(labels.loading.clone()),
            CursorState::FetchingNext => StatusLine::FetchingMore(labels.fetching_more.clone()),
            CursorState::Error => StatusLine::Error {
                label: labels.error.clone(),
                message: self
                    .query
                    .error()
                    .map(|e| e.user_message())
                    .unwrap_or_default(),
            },
            CursorState::Exhausted if self.query.items().is_empty() => {
                StatusLine::Empty(labels.empty.clone())
            }
            CursorState::Exhausted => StatusLine::Exhausted(labels.exhausted.clone()),
            CursorState::Ready => StatusLine::More {
                loaded: self.query.items().len(),
                total: self.query.total_count(),
            },
        }
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SearchPrompt {
    pub input: String,
}

pub struct App {
    pub config: ConsoleConfig,
    pub theme: SynthBruteTheme,
    pub active: Screen,
    pub students: ListScreen<Student>,
    pub payments: ListScreen<Payment>,
    pub notifications: Vec<Notification>,
    pub search: Option<SearchPrompt>,
}

macro_rules! on_active {
    ($app:expr, |$screen:ident| $body:expr) => {
        match $app.active {
            Screen::Students => {
                let $screen = &mut $app.students;
                $body
            }
            Screen::Payments => {
                let $screen = &mut $app.payments;
                $body
            }
        }
    };
}

impl App {
    pub fn new<P>(config: ConsoleConfig, fetcher: Arc<P>, events: mpsc::Sender<ConsoleEvent>) -> Self
    where
        P: PageFetcher<Student> + PageFetcher<Payment> + 'static,
    {
        let ttl = config.cache_ttl();
        let students_config = config.lists.for_collection(Screen::Students.collection()).clone();
        let payments_config = config.lists.for_collection(Screen::Payments.collection()).clone();

        let students = ListScreen::new(
            InfiniteQuery::<Student>::new(
                Screen::Students,
                Arc::clone(&fetcher),
                StudentFilter::default(),
                students_config.page_size,
                ttl,
            )
            .with_events(events.clone()),
            students_config,
            events.clone(),
        );
        let payments = ListScreen::new(
            InfiniteQuery::<Payment>::new(
                Screen::Payments,
                fetcher,
                PaymentFilter::default(),
                payments_config.page_size,
                ttl,
            )
            .with_events(events.clone()),
            payments_config,
            events,
        );

        Self {
            config,
            theme: SynthBruteTheme::synthbrute(),
            active: Screen::Students,
            students,
            payments,
            notifications: Vec::new(),
            search: None,
        }
    }

    /// Mount the active screen.
    pub fn start(&mut self) {
        on_active!(self, |screen| {
            screen.mount();
        });
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.push_notification(
            Notification::new(level, message).with_action(NotificationAction::Dismiss),
        );
    }

    fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }

    pub fn switch_to(&mut self, screen: Screen) {
        if screen == self.active {
            return;
        }
        on_active!(self, |current| current.unmount());
        self.active = screen;
        self.search = None;
        self.start();
    }

    /// Size both list viewports to `rows` item rows.
    pub fn set_list_height(&mut self, rows: usize) {
        self.students.set_height(rows);
        self.payments.set_height(rows);
    }

    /// Handle one loop event. Returns `true` when the console should exit.
    pub fn handle_event(&mut self, event: ConsoleEvent) -> bool {
        match event {
            ConsoleEvent::Input(key) => {
                if self.search.is_some() {
                    if let Some(edit) = map_prompt_key(key) {
                        self.edit_search(edit);
                    }
                    return false;
                }
                if let Some(action) = map_key(key) {
                    return self.handle_action(action);
                }
            }
            ConsoleEvent::FetchSettled { screen } => self.settle(screen),
            ConsoleEvent::ViewportElapsed { screen, token } => {
                match screen {
                    Screen::Students => self.students.on_viewport_elapsed(token),
                    Screen::Payments => self.payments.on_viewport_elapsed(token),
                };
            }
            ConsoleEvent::Tick => {
                self.settle(Screen::Students);
                self.settle(Screen::Payments);
            }
            ConsoleEvent::Error(message) => self.notify(NotificationLevel::Error, message),
            ConsoleEvent::Resize { height, .. } => self.set_list_height(views::list_rows(height)),
        }
        false
    }

    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextScreen => self.switch_to(self.active.next()),
            Action::PrevScreen => self.switch_to(self.active.previous()),
            Action::SwitchScreen(index) => {
                if let Some(screen) = Screen::from_index(index) {
                    self.switch_to(screen);
                }
            }
            Action::MoveDown => on_active!(self, |screen| screen.select_next()),
            Action::MoveUp => on_active!(self, |screen| screen.select_previous()),
            Action::ScrollTop => on_active!(self, |screen| screen.scroll_to_top()),
            Action::ScrollBottom => on_active!(self, |screen| screen.scroll_to_bottom()),
            Action::OpenSearch => {
                let input = on_active!(self, |screen| screen
                    .query
                    .filter()
                    .search()
                    .unwrap_or_default()
                    .to_string());
                self.search = Some(SearchPrompt { input });
            }
            Action::CycleStatus => {
                on_active!(self, |screen| screen.cycle_status());
            }
            Action::ClearFilters => {
                on_active!(self, |screen| screen.clear_filters());
            }
            Action::Retry => {
                if !on_active!(self, |screen| screen.retry()) {
                    self.notify(NotificationLevel::Warning, "Nothing to retry.");
                }
            }
            Action::Refetch => {
                if on_active!(self, |screen| screen.refetch()) {
                    let message = format!("Reloading {}.", self.active.title());
                    self.notify(NotificationLevel::Info, message);
                }
            }
            Action::DismissNotification => {
                self.notifications.pop();
            }
        }
        false
    }

    fn edit_search(&mut self, edit: PromptEdit) {
        let Some(prompt) = self.search.as_mut() else {
            return;
        };
        match edit {
            PromptEdit::Insert(c) => prompt.input.push(c),
            PromptEdit::Backspace => {
                prompt.input.pop();
            }
            PromptEdit::Cancel => self.search = None,
            PromptEdit::Submit => {
                let input = std::mem::take(&mut prompt.input);
                self.search = None;
                on_active!(self, |screen| screen.set_search(&input));
            }
        }
    }

    fn settle(&mut self, screen: Screen) {
        let outcomes = match screen {
            Screen::Students => self.students.on_fetch_settled(),
            Screen::Payments => self.payments.on_fetch_settled(),
        };
        for outcome in outcomes {
            if let ApplyOutcome::Failed { page, error } = outcome {
                self.push_notification(
                    Notification::new(
                        NotificationLevel::Error,
                        format!("{} page {}: {}", screen.title(), page, error.user_message()),
                    )
                    .with_action(NotificationAction::Retry),
                );
            }
        }
    }
}
