//! vo-timeline: Timeline coordinate model and drag editing
//!
//! Pure time↔pixel math (zoom, scroll-follow) plus the pointer-driven drag
//! state machines for clips, the playhead, and the sidebar boundary. The
//! drag editor emits [`EditRequest`]s; applying them is the host's job.

mod drag;
mod view;

pub use drag::*;
pub use view::*;
