//! Scrolling viewport over a list screen and the sentinel-driven load trigger.
//!
//! The list is rendered as `content_len` item rows followed by a sentinel
//! (status) row. [`ViewportTrigger`] watches how much of the sentinel falls
//! inside the viewport, expanded by a margin, and asks for the next page once
//! it has stayed visible for a debounce window while the gate is open.

use crate::events::ConsoleEvent;
use crate::nav::Screen;
use crate::timer::TimerHandle;
use std::ops::Range;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// VIEWPORT GEOMETRY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListViewport {
    offset: usize,
    height: usize,
    content_len: usize,
    selected: Option<usize>,
}

impl ListViewport {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn content_len(&self) -> usize {
        self.content_len
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.keep_selection_visible();
    }

    /// Track the number of item rows. Offset and selection are kept; only a
    /// shrinking list clamps them.
    pub fn set_content_len(&mut self, len: usize) {
        self.content_len = len;
        self.selected = match (self.selected, len) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(sel), _) => Some(sel.min(len - 1)),
        };
        self.offset = self.offset.min(len);
        self.keep_selection_visible();
    }

    /// Item rows currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height).min(self.content_len);
        self.offset.min(end)..end
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.selected = if self.content_len == 0 { None } else { Some(0) };
    }

    pub fn scroll_to_bottom(&mut self) {
        if self.content_len == 0 {
            self.offset = 0;
            self.selected = None;
            return;
        }
        self.selected = Some(self.content_len - 1);
        self.keep_selection_visible();
    }

    /// Select `index` and bring it on screen. Out-of-range indices are clamped.
    pub fn scroll_to_element(&mut self, index: usize) {
        if self.content_len == 0 {
            return;
        }
        self.selected = Some(index.min(self.content_len - 1));
        self.keep_selection_visible();
    }

    pub fn select_next(&mut self) {
        if let Some(sel) = self.selected {
            self.scroll_to_element(sel + 1);
        } else {
            self.scroll_to_top();
        }
    }

    pub fn select_previous(&mut self) {
        if let Some(sel) = self.selected {
            self.scroll_to_element(sel.saturating_sub(1));
        }
    }

    /// Fraction of the sentinel rows inside the viewport grown by `margin_rows`
    /// on both edges.
    pub fn sentinel_ratio(&self, margin_rows: usize, sentinel_rows: usize) -> f32 {
        if self.height == 0 || sentinel_rows == 0 {
            return 0.0;
        }
        let view_start = self.offset.saturating_sub(margin_rows);
        let view_end = self.offset + self.height + margin_rows;
        let sentinel_start = self.content_len;
        let sentinel_end = self.content_len + sentinel_rows;

        let overlap_start = view_start.max(sentinel_start);
        let overlap_end = view_end.min(sentinel_end);
        let overlap = overlap_end.saturating_sub(overlap_start);
        overlap as f32 / sentinel_rows as f32
    }

    // Selecting the last item also reveals the sentinel row below it.
    fn keep_selection_visible(&mut self) {
        if self.height == 0 {
            return;
        }
        let Some(sel) = self.selected else {
            return;
        };
        if sel < self.offset {
            self.offset = sel;
        }
        let bottom = if sel + 1 == self.content_len && self.height > 1 {
            sel + 1
        } else {
            sel
        };
        if bottom >= self.offset + self.height {
            self.offset = bottom + 1 - self.height;
        }
    }
}

// ============================================================================
// LOAD TRIGGER
// ============================================================================

/// Conditions under which the trigger may request another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerGate {
    pub enabled: bool,
    pub has_next_page: bool,
    pub in_flight: bool,
    pub errored: bool,
}

impl TriggerGate {
    pub fn is_open(&self) -> bool {
        self.enabled && self.has_next_page && !self.in_flight && !self.errored
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    pub debounce: Duration,
    pub margin_rows: usize,
    /// Minimum visible fraction of the sentinel, in `(0, 1]`.
    pub threshold: f32,
    pub sentinel_rows: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            margin_rows: 0,
            threshold: 0.1,
            sentinel_rows: 1,
        }
    }
}

#[derive(Debug)]
struct Armed {
    token: u64,
    _timer: TimerHandle,
}

#[derive(Debug)]
pub struct ViewportTrigger {
    screen: Screen,
    config: TriggerConfig,
    events: mpsc::Sender<ConsoleEvent>,
    armed: Option<Armed>,
    next_token: u64,
}

impl ViewportTrigger {
    pub fn new(screen: Screen, config: TriggerConfig, events: mpsc::Sender<ConsoleEvent>) -> Self {
        Self {
            screen,
            config,
            events,
            armed: None,
            next_token: 0,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn sentinel_visible(&self, viewport: &ListViewport) -> bool {
        viewport.sentinel_ratio(self.config.margin_rows, self.config.sentinel_rows)
            >= self.config.threshold
    }

    /// Re-evaluate after any scroll, resize or state change.
    ///
    /// Arms the debounce timer when the sentinel is visible and the gate is
    /// open; disarms it otherwise. An armed timer is left running. Returns
    /// whether a new timer was armed.
    pub fn observe(&mut self, viewport: &ListViewport, gate: TriggerGate) -> bool {
        if !gate.is_open() || !self.sentinel_visible(viewport) {
            self.disarm();
            return false;
        }
        if self.armed.is_some() {
            return false;
        }
        self.next_token += 1;
        let token = self.next_token;
        let timer = TimerHandle::schedule(
            self.config.debounce,
            self.events.clone(),
            ConsoleEvent::ViewportElapsed {
                screen: self.screen,
                token,
            },
        );
        tracing::trace!(screen = ?self.screen, token, "load trigger armed");
        self.armed = Some(Armed {
            token,
            _timer: timer,
        });
        true
    }

    /// Handle an elapsed debounce window. Returns `true` when the caller
    /// should load the next page.
    pub fn on_elapsed(&mut self, token: u64, viewport: &ListViewport, gate: TriggerGate) -> bool {
        match &self.armed {
            Some(armed) if armed.token == token => {}
            _ => return false,
        }
        self.armed = None;
        let fire = gate.is_open() && self.sentinel_visible(viewport);
        tracing::trace!(screen = ?self.screen, token, fire, "load trigger elapsed");
        fire
    }

    /// Cancel a pending window.
    pub fn disarm(&mut self) {
        if self.armed.take().is_some() {
            tracing::trace!(screen = ?self.screen, "load trigger disarmed");
        }
    }

    /// Forget everything tied to the previous cache key.
    pub fn reset(&mut self) {
        self.disarm();
    }
}
