//! Slash-triggered autocomplete.
//!
//! Typing the trigger character turns autocomplete mode on. While it is on,
//! the text between the nearest trigger and the caret is the query, the
//! suggestion popup lists the candidates matching it, and the navigation keys
//! drive the popup instead of the editor. Confirming a suggestion replaces
//! the query with a token.
//!
//! [`AutocompleteSession`] owns all of this for one editing surface; the
//! submodules are the individual pieces it wires together.

mod channel;
mod commit;
mod filter;
mod navigation;
mod popup;
mod query;
mod router;
mod scheduler;
mod session;

pub use channel::{NavCommand, NavigationReceiver, NavigationSender, navigation_channel};
pub use commit::commit_token;
pub use filter::filter_suggestions;
pub use navigation::{NavigationController, step_index};
pub use popup::{PopupEvent, PopupPhase, SuggestionPopup};
pub use query::{DEFAULT_TRIGGER, ESCAPE_CHAR, Query, detect_query};
pub use router::{CommandRouter, Route};
pub use scheduler::DeferredQueue;
pub use session::{
    AutocompleteMode, AutocompleteSession, AutocompleteSettings, DEFAULT_SUGGESTIONS,
    DeferredOutcome, KeyOutcome,
};
