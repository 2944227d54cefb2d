use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

use super::channel::{NavCommand, NavigationSender};

/// What the editing surface should do with a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Forwarded to the popup; the editor must not see the key.
    Navigate(NavCommand),
    /// The trigger was typed: autocomplete turns on and the character is
    /// still inserted by the editor.
    Activate,
    PassThrough,
}

#[derive(Debug)]
pub struct CommandRouter {
    trigger: char,
    sender: Option<NavigationSender>,
}

impl CommandRouter {
    pub fn new(trigger: char) -> Self {
        Self {
            trigger,
            sender: None,
        }
    }

    pub fn trigger(&self) -> char {
        self.trigger
    }

    /// Connects the router to a freshly mounted popup.
    pub fn attach(&mut self, sender: NavigationSender) {
        self.sender = Some(sender);
    }

    pub fn detach(&mut self) {
        self.sender = None;
    }

    pub fn is_attached(&self) -> bool {
        self.sender.is_some()
    }

    pub fn route(&self, mode_active: bool, key: &KeyEvent) -> Route {
        if mode_active {
            if let Some(command) = navigation_command(key) {
                let delivered = self
                    .sender
                    .as_ref()
                    .is_some_and(|sender| sender.emit(command));
                trace!(?command, delivered, "routed navigation key");
                return Route::Navigate(command);
            }
        }

        if self.is_trigger(key) {
            return Route::Activate;
        }

        Route::PassThrough
    }

    fn is_trigger(&self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch) if ch == self.trigger => {
                !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
            }
            _ => false,
        }
    }
}

/// Shift-Enter stays with the editor as a soft line break.
fn navigation_command(key: &KeyEvent) -> Option<NavCommand> {
    match key.code {
        KeyCode::Enter if !key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(NavCommand::Enter)
        }
        KeyCode::Up => Some(NavCommand::Up),
        KeyCode::Down => Some(NavCommand::Down),
        _ => None,
    }
}
