//! Single-consumer channel carrying navigation commands from the key router
//! to the popup that currently owns the suggestion list.

use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavCommand {
    Up,
    Down,
    Enter,
}

/// Sending half, held by the router while a popup is mounted.
#[derive(Clone, Debug)]
pub struct NavigationSender {
    inner: Sender<NavCommand>,
}

impl NavigationSender {
    /// Returns `false` once the receiving popup has been dropped.
    pub fn emit(&self, command: NavCommand) -> bool {
        self.inner.send(command).is_ok()
    }
}

/// Receiving half. Not clonable: exactly one subscriber per popup, and
/// dropping it unsubscribes.
#[derive(Debug)]
pub struct NavigationReceiver {
    inner: Receiver<NavCommand>,
}

impl NavigationReceiver {
    pub fn try_next(&self) -> Option<NavCommand> {
        self.inner.try_recv().ok()
    }
}

pub fn navigation_channel() -> (NavigationSender, NavigationReceiver) {
    let (sender, receiver) = mpsc::channel();
    (
        NavigationSender { inner: sender },
        NavigationReceiver { inner: receiver },
    )
}
