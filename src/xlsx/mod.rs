//! XLSX workbook reading.
//!
//! Reads one worksheet of an Office Open XML workbook into a [`Dataset`]
//! of text cells.
//!
//! # Example
//!
//! ```no_run
//! use docfill::xlsx::WorkbookReader;
//!
//! let reader = WorkbookReader::open("dados/banco_de_dados.xlsx")?;
//! println!("Sheets: {:?}", reader.sheet_names());
//! let dataset = reader.read_sheet("termo")?;
//! println!("Records: {}", dataset.len());
//! # Ok::<(), docfill::Error>(())
//! ```
//!
//! [`Dataset`]: crate::model::Dataset

mod reader;
mod shared_strings;
mod styles;

pub use reader::WorkbookReader;
