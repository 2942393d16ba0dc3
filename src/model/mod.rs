//! In-memory models shared by the workbook reader, the template engine and
//! the generation loop.
//!
//! The workbook reader produces a [`Dataset`]; the generation loop turns each
//! selected [`Record`] into a [`PlaceholderMap`]; the template engine exposes
//! each document part as a list of [`TextBlock`]s that substitution edits.

mod dataset;
mod placeholder;
mod text;

pub use dataset::*;
pub use placeholder::*;
pub use text::*;
