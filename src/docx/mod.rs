//! DOCX (Word) templates.
//!
//! A template is a `.docx` package whose text contains bracketed tokens such
//! as `[cpf]`. [`Template`] loads the package, substitutes a
//! [`PlaceholderMap`](crate::model::PlaceholderMap) run by run and writes a
//! new package with every other entry copied through unchanged.

mod fill;
mod part;
mod template;

pub use fill::{fill_blocks, FillReport};
pub use part::XmlPart;
pub use template::Template;
