//! The generation loop: one filled document per selected record.

use crate::config::Config;
use crate::date::format_long_date;
use crate::docx::{FillReport, Template};
use crate::error::{Error, Result};
use crate::model::{Dataset, PlaceholderMap, Record};
use crate::naming::OutputNamer;
use crate::operator::{FieldScope, Operator, Progress};
use crate::selection::{needs_mode_choice, parse_selection, FillMode};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// A record that could not be rendered.
#[derive(Debug)]
pub struct RecordFailure {
    /// Selected index
    pub index: i64,
    /// Identifying value of the record
    pub id: String,
    /// What went wrong
    pub error: Error,
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Documents written, in selection order
    pub generated: Vec<PathBuf>,
    /// Selected indices that named no record
    pub skipped: Vec<i64>,
    /// Records that failed without stopping the run
    pub failures: Vec<RecordFailure>,
    /// Error that stopped the run early
    pub aborted: Option<Error>,
}

impl GenerationReport {
    /// Number of documents written.
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }

    /// Whether the run went through the whole selection.
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Fills the template once per selected record.
///
/// The dataset is borrowed read-only; a fresh [`Template`] is opened for
/// every record so no substitution leaks from one document to the next.
#[derive(Debug)]
pub struct Generator<'a> {
    config: &'a Config,
    dataset: &'a Dataset,
    date_text: String,
}

impl<'a> Generator<'a> {
    /// Create a generator stamping documents with today's date.
    pub fn new(config: &'a Config, dataset: &'a Dataset) -> Self {
        Self::with_date(config, dataset, crate::date::today())
    }

    /// Create a generator stamping documents with `date`.
    pub fn with_date(config: &'a Config, dataset: &'a Dataset, date: NaiveDate) -> Self {
        Self {
            config,
            dataset,
            date_text: format_long_date(date),
        }
    }

    /// Placeholder mapping for one record: mapped columns first, then the
    /// interactive values, then the date. A later source overrides an earlier
    /// one for the same token.
    pub fn mapping(&self, record: &Record, interactive: &PlaceholderMap) -> Result<PlaceholderMap> {
        let mut map = PlaceholderMap::new();
        for column in &self.config.columns {
            map.insert(column.placeholder.as_str(), record.require(&column.column)?);
        }
        map.extend_from(interactive);
        map.insert(self.config.template.date_placeholder.as_str(), &self.date_text);
        Ok(map)
    }

    /// Run the whole interaction: listing, selection, mode, fields, documents.
    ///
    /// Errors before the loop (missing identifying column, invalid selection,
    /// operator I/O, output directory) are returned. Inside the loop, a
    /// missing template stops the run and is recorded in
    /// [`GenerationReport::aborted`]; any other per-record error is recorded
    /// and the loop continues.
    pub fn run<O: Operator + ?Sized>(&self, operator: &mut O) -> Result<GenerationReport> {
        let id_column = self.config.data.id_column.as_str();

        let listing = self.dataset.listing(id_column)?;
        operator.show_listing(&listing)?;

        let selection = parse_selection(&operator.read_selection()?)?;
        let mode = if needs_mode_choice(&selection) {
            operator.choose_mode()?
        } else {
            FillMode::Individual
        };
        tracing::debug!(?selection, %mode, "selection accepted");

        let group_values = match mode {
            FillMode::Group => Some(operator.collect_fields(&self.config.fields, FieldScope::Group)?),
            FillMode::Individual => None,
        };

        let output_dir = self.config.output.dir.as_path();
        std::fs::create_dir_all(output_dir)?;
        let mut namer = OutputNamer::new(output_dir, self.config.output.prefix.as_str());

        let mut report = GenerationReport::default();
        let mut unmatched_checked = false;
        operator.notify(Progress::Started {
            count: selection.len(),
        })?;

        for &index in &selection {
            let Some(record) = self.dataset.get(index) else {
                tracing::debug!(index, records = self.dataset.len(), "index out of range, skipped");
                operator.notify(Progress::Skipped { index })?;
                report.skipped.push(index);
                continue;
            };
            let id = record.get(id_column).unwrap_or_default();

            let values = match &group_values {
                Some(values) => values.clone(),
                None => operator.collect_fields(&self.config.fields, FieldScope::Record(id))?,
            };

            let outcome = self.mapping(record, &values).and_then(|map| {
                let path = namer.next_path(id);
                self.render(&map, &path, !unmatched_checked).map(|_| path)
            });

            match outcome {
                Ok(path) => {
                    unmatched_checked = true;
                    namer.reserve(path.clone());
                    tracing::debug!(index, id, path = %path.display(), "document generated");
                    operator.notify(Progress::Generated { id, path: &path })?;
                    report.generated.push(path);
                }
                Err(error) if error.is_fatal() => {
                    tracing::debug!(index, id, error = %error, "generation aborted");
                    operator.notify(Progress::Aborted { error: &error })?;
                    report.aborted = Some(error);
                    break;
                }
                Err(error) => {
                    tracing::debug!(index, id, error = %error, "document not generated");
                    operator.notify(Progress::Failed { id, error: &error })?;
                    report.failures.push(RecordFailure {
                        index,
                        id: id.to_string(),
                        error,
                    });
                }
            }
        }

        operator.notify(Progress::Finished {
            generated: report.generated_count(),
            dir: output_dir,
        })?;

        Ok(report)
    }

    /// Open a fresh template, fill it and save it to `path`.
    fn render(&self, map: &PlaceholderMap, path: &Path, check_unmatched: bool) -> Result<FillReport> {
        let mut template = Template::open(&self.config.template.path)?;

        if check_unmatched {
            let present = template.placeholders();
            for token in map.tokens().filter(|t| !present.iter().any(|p| p == *t)) {
                tracing::warn!(placeholder = token, "placeholder does not occur in the template");
            }
        }

        let report = template.fill(map);
        template.save(path)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnMapping;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            ["Nome do Artista", "CPF"],
            vec![vec!["Ana Souza", "111"], vec!["Bruno Lima", "222"]],
        )
    }

    #[test]
    fn test_mapping_order_and_overrides() {
        let config = Config::default()
            .with_columns(vec![
                ColumnMapping::new("Nome do Artista", "[nome_completo]"),
                ColumnMapping::new("CPF", "[cpf]"),
            ])
            .with_fields(["valor"]);
        let ds = dataset();
        let generator = Generator::with_date(
            &config,
            &ds,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        );

        let interactive: PlaceholderMap = [("[valor]", "100"), ("[cpf]", "digitado")]
            .into_iter()
            .collect();
        let map = generator.mapping(ds.get(0).unwrap(), &interactive).unwrap();

        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            vec![
                ("[nome_completo]", "Ana Souza"),
                ("[cpf]", "digitado"),
                ("[valor]", "100"),
                ("[data_atual]", "5 de janeiro de 2024"),
            ]
        );
    }

    #[test]
    fn test_mapping_missing_column() {
        let config = Config::default();
        let ds = dataset();
        let generator = Generator::new(&config, &ds);
        let err = generator
            .mapping(ds.get(0).unwrap(), &PlaceholderMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(c) if c == "Endereço Completo"));
    }

    #[test]
    fn test_report_counts() {
        let mut report = GenerationReport::default();
        assert!(report.is_complete());
        report.generated.push(PathBuf::from("a.docx"));
        report.aborted = Some(Error::TemplateNotFound(PathBuf::from("m.docx")));
        assert_eq!(report.generated_count(), 1);
        assert!(!report.is_complete());
    }
}
