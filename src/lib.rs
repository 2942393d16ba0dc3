//! # docfill
//!
//! Batch generation of Word documents from spreadsheet rows.
//!
//! Records are read from a sheet of an `.xlsx` workbook. The operator picks
//! some of them, types the values that are not in the spreadsheet, and every
//! picked record is rendered into a copy of a `.docx` template whose bracketed
//! tokens (`[cpf]`, `[data_atual]`, ...) are replaced run by run, keeping the
//! template's formatting.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docfill::{Config, ConsoleOperator};
//!
//! let config = Config::load("docfill.toml")?;
//! let report = docfill::run(&config, &mut ConsoleOperator::stdio())?;
//! println!("{} document(s) generated", report.generated_count());
//! # Ok::<(), docfill::Error>(())
//! ```
//!
//! ## Non-interactive use
//!
//! ```no_run
//! use docfill::{Config, FillMode, PresetOperator};
//!
//! let mut operator = PresetOperator::new("0,2")
//!     .with_mode(FillMode::Group)
//!     .with_field("categoria", "Música")
//!     .with_field("valor", "1.500,00");
//! let report = docfill::run(&Config::default(), &mut operator)?;
//! # Ok::<(), docfill::Error>(())
//! ```
//!
//! ## Templates
//!
//! ```no_run
//! use docfill::{PlaceholderMap, Template};
//!
//! let mut template = Template::open("modelo/modelo_termo.docx")?;
//! println!("{:?}", template.placeholders());
//!
//! let mut map = PlaceholderMap::new();
//! map.insert("[nome_completo]", "Ana Souza");
//! template.fill(&map);
//! template.save("Termo_Ana Souza.docx")?;
//! # Ok::<(), docfill::Error>(())
//! ```

pub mod config;
pub mod container;
pub mod date;
pub mod detect;
pub mod docx;
pub mod error;
pub mod generate;
pub mod model;
pub mod naming;
pub mod operator;
pub mod selection;
pub mod xlsx;

// Re-exports
pub use config::{ColumnMapping, Config, DataConfig, OutputConfig, TemplateConfig};
pub use container::OoxmlContainer;
pub use date::{format_long_date, today_long};
pub use detect::{detect_format_from_bytes, FormatType};
pub use docx::{FillReport, Template};
pub use error::{Error, Result};
pub use generate::{GenerationReport, Generator, RecordFailure};
pub use model::{field_token, Dataset, ListingEntry, PlaceholderMap, Record, TextBlock, TextRun};
pub use naming::{sanitize, OutputNamer};
pub use operator::{ConsoleOperator, FieldScope, Operator, PresetOperator, Progress};
pub use selection::{parse_selection, FillMode};
pub use xlsx::WorkbookReader;

/// Load the configured sheet and run the generation loop with `operator`.
///
/// Data-source errors are returned before the operator sees anything.
///
/// # Example
///
/// ```no_run
/// use docfill::{Config, PresetOperator};
///
/// let report = docfill::run(&Config::default(), &mut PresetOperator::new("0"))?;
/// assert!(report.is_complete());
/// # Ok::<(), docfill::Error>(())
/// ```
pub fn run<O: Operator + ?Sized>(config: &Config, operator: &mut O) -> Result<GenerationReport> {
    let dataset = Dataset::load(&config.data.path, &config.data.sheet)?;
    tracing::debug!(
        records = dataset.len(),
        columns = dataset.columns().len(),
        "loaded dataset"
    );
    Generator::new(config, &dataset).run(operator)
}
