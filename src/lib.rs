pub mod autocomplete;
pub mod caret;
pub mod config;
pub mod document;
pub mod editor;
pub mod render;
pub mod theme;
