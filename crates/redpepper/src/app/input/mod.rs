//! Input event handling.
//!
//! Routes every event to exactly one focused surface, or through the
//! sequence matcher and global key bindings, then broadcasts to the
//! always-listening components.

mod event;
mod mouse;

pub use event::handle_event;
