use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use tracing::{debug, trace};

use super::channel::navigation_channel;
use super::commit::commit_token;
use super::filter::filter_suggestions;
use super::popup::{PopupPhase, SuggestionPopup};
use super::query::{DEFAULT_TRIGGER, Query, detect_query};
use super::router::{CommandRouter, Route};
use super::scheduler::DeferredQueue;
use crate::caret::{CaretLocator, CaretOffset, LayoutSnapshot, LocateRequest};
use crate::editor::{EditCommand, TextEngine};

pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "Cool Company",
    "Whirling Dervish Inc",
    "Potato Purveyors",
    "Coca-Cola",
    "Forge",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutocompleteSettings {
    pub trigger: char,
    pub candidates: Vec<String>,
    /// Wait before measuring the caret; measurement always happens after the
    /// next frame has been laid out.
    pub measure_delay: Duration,
    /// Grace period between losing focus and closing the popup.
    pub blur_delay: Duration,
    /// Wait before a programmatic activation inserts the trigger.
    pub activation_delay: Duration,
    /// Added to the measured caret position to place the popup.
    pub anchor_offset: CaretOffset,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER,
            candidates: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
            measure_delay: Duration::ZERO,
            blur_delay: Duration::from_millis(100),
            activation_delay: Duration::from_millis(50),
            anchor_offset: CaretOffset::new(1, 0),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AutocompleteMode {
    #[default]
    Inactive,
    Active {
        query: Option<Query>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deferred {
    MeasureCaret,
    DeactivateAfterBlur,
    InsertTrigger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key drove the popup; the editor must ignore it.
    Consumed,
    /// The key confirmed a suggestion and the document now holds a new token.
    Committed,
    /// The editor should handle the key as usual.
    PassThrough,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeferredOutcome {
    /// Something visible changed.
    pub changed: bool,
    /// The document was edited.
    pub edited: bool,
}

/// Ties the autocomplete pieces together for one editing surface: mode and
/// query tracking, the mounted popup, key routing and deferred work.
#[derive(Debug)]
pub struct AutocompleteSession {
    settings: AutocompleteSettings,
    mode: AutocompleteMode,
    popup: Option<SuggestionPopup>,
    router: CommandRouter,
    deferred: DeferredQueue<Deferred>,
    blur_suppressed: bool,
}

impl AutocompleteSession {
    pub fn new(settings: AutocompleteSettings) -> Self {
        let router = CommandRouter::new(settings.trigger);
        Self {
            settings,
            mode: AutocompleteMode::Inactive,
            popup: None,
            router,
            deferred: DeferredQueue::new(),
            blur_suppressed: false,
        }
    }

    pub fn settings(&self) -> &AutocompleteSettings {
        &self.settings
    }

    pub fn mode(&self) -> &AutocompleteMode {
        &self.mode
    }

    pub fn is_active(&self) -> bool {
        matches!(self.mode, AutocompleteMode::Active { .. })
    }

    pub fn query(&self) -> Option<&Query> {
        match &self.mode {
            AutocompleteMode::Active { query } => query.as_ref(),
            AutocompleteMode::Inactive => None,
        }
    }

    pub fn phase(&self) -> PopupPhase {
        self.popup
            .as_ref()
            .map(SuggestionPopup::phase)
            .unwrap_or_default()
    }

    pub fn show_suggestions(&self) -> bool {
        self.anchor().is_some()
    }

    pub fn anchor(&self) -> Option<CaretOffset> {
        self.popup.as_ref().and_then(SuggestionPopup::anchor)
    }

    pub fn suggestions(&self) -> &[String] {
        self.popup
            .as_ref()
            .map(SuggestionPopup::suggestions)
            .unwrap_or(&[])
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.popup.as_ref().map(SuggestionPopup::selected_index)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deferred.next_due()
    }

    /// First look at every key press on the editing surface.
    pub fn handle_key<E>(&mut self, key: &KeyEvent, engine: &mut E, now: Instant) -> KeyOutcome
    where
        E: TextEngine + ?Sized,
    {
        match self.router.route(self.is_active(), key) {
            Route::Navigate(_) => {
                let chosen = self.popup.as_mut().and_then(SuggestionPopup::pump);
                match chosen {
                    Some(suggestion) if self.select(engine, &suggestion) => KeyOutcome::Committed,
                    _ => KeyOutcome::Consumed,
                }
            }
            Route::Activate => {
                self.activate(now);
                KeyOutcome::PassThrough
            }
            Route::PassThrough => KeyOutcome::PassThrough,
        }
    }

    /// Turns autocomplete mode on and mounts a popup. Returns `false` when it
    /// was already on.
    pub fn activate(&mut self, now: Instant) -> bool {
        if !self.mount() {
            return false;
        }
        self.deferred
            .schedule(now, self.settings.measure_delay, Deferred::MeasureCaret);
        true
    }

    /// Activation for input paths that never deliver a trigger key press:
    /// mode goes on now, the trigger is typed on the user's behalf shortly
    /// after. The caret is measured once the trigger is in place.
    pub fn activate_programmatically(&mut self, now: Instant) {
        self.mount();
        self.deferred
            .schedule(now, self.settings.activation_delay, Deferred::InsertTrigger);
    }

    fn mount(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        let generation = self.deferred.invalidate();
        let (sender, receiver) = navigation_channel();
        self.router.attach(sender);

        let mut popup = SuggestionPopup::mount(receiver);
        popup.set_suggestions(filter_suggestions(&self.settings.candidates, None));
        self.popup = Some(popup);
        self.mode = AutocompleteMode::Active { query: None };
        self.blur_suppressed = false;
        debug!(generation, "autocomplete activated");
        true
    }

    pub fn deactivate(&mut self, reason: &'static str) {
        if !self.is_active() {
            return;
        }
        if let Some(mut popup) = self.popup.take() {
            popup.dismiss();
        }
        self.router.detach();
        self.deferred.invalidate();
        self.mode = AutocompleteMode::Inactive;
        self.blur_suppressed = false;
        debug!(reason, "autocomplete deactivated");
    }

    /// Re-derives the query after the document or the caret changed.
    pub fn on_change<E>(&mut self, engine: &E, now: Instant)
    where
        E: TextEngine + ?Sized,
    {
        if !self.is_active() {
            return;
        }
        let Some(query) =
            detect_query(&engine.focus_text(), engine.focus_offset(), self.settings.trigger)
        else {
            self.deactivate("query no longer extractable");
            return;
        };

        let filtered = filter_suggestions(&self.settings.candidates, Some(query.term()));
        if let Some(popup) = self.popup.as_mut() {
            popup.set_suggestions(filtered);
            if popup.phase().needs_measurement() {
                self.deferred
                    .schedule(now, self.settings.measure_delay, Deferred::MeasureCaret);
            }
        }
        trace!(query = %query.typed(), "query updated");
        self.mode = AutocompleteMode::Active { query: Some(query) };
    }

    /// The editing surface lost focus. Returns `true` when the session took
    /// care of it, in which case the editor keeps its own focus state.
    pub fn on_blur(&mut self, now: Instant) -> bool {
        if !self.is_active() {
            return false;
        }
        self.deferred
            .schedule(now, self.settings.blur_delay, Deferred::DeactivateAfterBlur);
        true
    }

    pub fn hover(&mut self, index: usize) -> bool {
        self.popup
            .as_mut()
            .is_some_and(|popup| popup.hover(index))
    }

    /// Pointer pressed on a suggestion. A blur arriving around the same time
    /// no longer closes the popup.
    pub fn pointer_down(&mut self, index: usize) -> bool {
        let Some(popup) = self.popup.as_mut() else {
            return false;
        };
        self.blur_suppressed = true;
        popup.hover(index);
        true
    }

    /// Pointer released, on the popup or anywhere else. Ends the blur
    /// suppression started by [`AutocompleteSession::pointer_down`].
    pub fn pointer_up(&mut self) {
        self.blur_suppressed = false;
    }

    /// Pointer released on a suggestion: confirm it.
    pub fn click<E>(&mut self, index: usize, engine: &mut E) -> bool
    where
        E: TextEngine + ?Sized,
    {
        let Some(suggestion) = self.suggestions().get(index).cloned() else {
            return false;
        };
        self.select(engine, &suggestion)
    }

    /// Commits `suggestion` as a token. On success autocomplete ends; with no
    /// query left at the caret nothing happens and the mode stays on.
    pub fn select<E>(&mut self, engine: &mut E, suggestion: &str) -> bool
    where
        E: TextEngine + ?Sized,
    {
        let committed = commit_token(engine, suggestion, self.settings.trigger);
        if committed {
            self.deactivate("suggestion confirmed");
        }
        committed
    }

    /// Runs deferred work that has come due. Call right after a frame was
    /// drawn so `layout` describes the current document.
    pub fn run_due<E>(
        &mut self,
        now: Instant,
        engine: &mut E,
        locator: &dyn CaretLocator,
        layout: &LayoutSnapshot,
    ) -> DeferredOutcome
    where
        E: TextEngine + ?Sized,
    {
        let mut outcome = DeferredOutcome::default();
        let generation = self.deferred.generation();

        for task in self.deferred.take_due(now) {
            if self.deferred.generation() != generation {
                trace!(?task, "skipping task invalidated during this run");
                continue;
            }
            match task {
                Deferred::MeasureCaret => {
                    let Some(popup) = self.popup.as_mut() else {
                        continue;
                    };
                    if !popup.phase().needs_measurement() {
                        continue;
                    }
                    let request = LocateRequest::new(engine.selection_range())
                        .with_offset(self.settings.anchor_offset);
                    let anchor = locator.locate(layout, &request);
                    debug!(locator = locator.name(), ?anchor, "measured caret");
                    popup.caret_measured(anchor);
                    outcome.changed = true;
                }
                Deferred::DeactivateAfterBlur => {
                    if self.blur_suppressed {
                        self.blur_suppressed = false;
                        trace!("blur ignored, pointer is on a suggestion");
                    } else {
                        self.deactivate("blur");
                        outcome.changed = true;
                    }
                }
                Deferred::InsertTrigger => {
                    let inserted = engine.apply(vec![
                        EditCommand::InsertText(self.settings.trigger.to_string()),
                        EditCommand::Focus,
                    ]);
                    if inserted {
                        outcome.edited = true;
                        outcome.changed = true;
                        self.on_change(engine, now);
                    }
                }
            }
        }
        outcome
    }
}

impl Default for AutocompleteSession {
    fn default() -> Self {
        Self::new(AutocompleteSettings::default())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
