use super::channel::NavigationReceiver;
use super::navigation::NavigationController;
use crate::caret::CaretOffset;

/// Visibility of the suggestion popup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PopupPhase {
    #[default]
    Hidden,
    /// Mounted, waiting for a caret measurement.
    Positioning,
    Shown {
        anchor: CaretOffset,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupEvent {
    Mounted,
    CaretMeasured(Option<CaretOffset>),
    Dismissed,
}

impl PopupPhase {
    /// The anchor is measured once per activation: later measurements are
    /// ignored until the popup is dismissed. A failed measurement keeps the
    /// popup waiting for the next one.
    pub fn reduce(self, event: PopupEvent) -> PopupPhase {
        match (self, event) {
            (_, PopupEvent::Dismissed) => PopupPhase::Hidden,
            (PopupPhase::Hidden, PopupEvent::Mounted) => PopupPhase::Positioning,
            (PopupPhase::Positioning, PopupEvent::CaretMeasured(Some(anchor))) => {
                PopupPhase::Shown { anchor }
            }
            (phase, _) => phase,
        }
    }

    pub fn anchor(&self) -> Option<CaretOffset> {
        match self {
            PopupPhase::Shown { anchor } => Some(*anchor),
            _ => None,
        }
    }

    pub fn needs_measurement(&self) -> bool {
        matches!(self, PopupPhase::Positioning)
    }
}

/// A mounted popup: the visible suggestions plus the navigation subscription
/// that lives exactly as long as the popup does.
#[derive(Debug)]
pub struct SuggestionPopup {
    phase: PopupPhase,
    suggestions: Vec<String>,
    navigation: NavigationController,
}

impl SuggestionPopup {
    pub fn mount(receiver: NavigationReceiver) -> Self {
        Self {
            phase: PopupPhase::Hidden.reduce(PopupEvent::Mounted),
            suggestions: Vec::new(),
            navigation: NavigationController::new(receiver),
        }
    }

    pub fn phase(&self) -> PopupPhase {
        self.phase
    }

    pub fn anchor(&self) -> Option<CaretOffset> {
        self.phase.anchor()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn selected_index(&self) -> usize {
        self.navigation.selected_index()
    }

    pub fn selected(&self) -> Option<&str> {
        self.suggestions
            .get(self.navigation.selected_index())
            .map(String::as_str)
    }

    /// Replaces the visible list. A different list resets the highlight to
    /// the first entry; an identical one keeps it.
    pub fn set_suggestions(&mut self, suggestions: Vec<String>) -> bool {
        if suggestions == self.suggestions {
            return false;
        }
        self.suggestions = suggestions;
        self.navigation.reset();
        true
    }

    pub fn caret_measured(&mut self, anchor: Option<CaretOffset>) {
        self.phase = self.phase.reduce(PopupEvent::CaretMeasured(anchor));
    }

    pub fn dismiss(&mut self) {
        self.phase = self.phase.reduce(PopupEvent::Dismissed);
    }

    pub fn hover(&mut self, index: usize) -> bool {
        self.navigation.select_index(index, self.suggestions.len())
    }

    /// Processes queued navigation commands, returning a confirmed choice.
    pub fn pump(&mut self) -> Option<String> {
        self.navigation.drain(&self.suggestions)
    }
}
