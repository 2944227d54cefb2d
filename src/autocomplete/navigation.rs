use tracing::trace;

use super::channel::{NavCommand, NavigationReceiver};

/// Next index after `command` on a list of `len` entries, wrapping at both
/// ends. An empty list keeps the index untouched.
pub fn step_index(index: usize, len: usize, command: NavCommand) -> usize {
    if len == 0 {
        return index;
    }
    match command {
        NavCommand::Up => (index % len + len - 1) % len,
        NavCommand::Down => (index % len + 1) % len,
        NavCommand::Enter => index,
    }
}

/// Keeps the highlighted suggestion and consumes commands from the router.
#[derive(Debug)]
pub struct NavigationController {
    receiver: NavigationReceiver,
    index: usize,
}

impl NavigationController {
    pub fn new(receiver: NavigationReceiver) -> Self {
        Self { receiver, index: 0 }
    }

    pub fn selected_index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Pointer hover. Out-of-range indices are ignored.
    pub fn select_index(&mut self, index: usize, len: usize) -> bool {
        if index >= len || index == self.index {
            return false;
        }
        self.index = index;
        true
    }

    /// Applies one command. `Enter` yields the highlighted suggestion, or
    /// nothing when the list is empty.
    pub fn handle(&mut self, command: NavCommand, suggestions: &[String]) -> Option<String> {
        match command {
            NavCommand::Enter => suggestions.get(self.index).cloned(),
            NavCommand::Up | NavCommand::Down => {
                self.index = step_index(self.index, suggestions.len(), command);
                None
            }
        }
    }

    /// Drains pending commands. Stops at the first `Enter` that picks a
    /// suggestion; anything queued behind it is discarded with the popup.
    pub fn drain(&mut self, suggestions: &[String]) -> Option<String> {
        while let Some(command) = self.receiver.try_next() {
            trace!(?command, index = self.index, "navigation command");
            if let Some(chosen) = self.handle(command, suggestions) {
                return Some(chosen);
            }
        }
        None
    }
}
