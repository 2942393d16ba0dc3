//! Operator interaction.
//!
//! Everything the generation loop needs from a person goes through the
//! [`Operator`] trait: showing the listing, reading the selection, choosing
//! the fill mode, typing field values and following progress.
//! [`ConsoleOperator`] speaks the interactive console protocol;
//! [`PresetOperator`] answers from values collected up front.

use crate::error::{Error, Result};
use crate::model::{field_token, ListingEntry, PlaceholderMap};
use crate::selection::FillMode;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Whose values are being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope<'a> {
    /// Once, for every selected record
    Group,
    /// For the record with this identifying value
    Record(&'a str),
}

/// Progress events of a generation run.
#[derive(Debug)]
pub enum Progress<'a> {
    /// The loop is about to process `count` selected indices
    Started { count: usize },
    /// A document was written
    Generated { id: &'a str, path: &'a Path },
    /// The index does not name a record
    Skipped { index: i64 },
    /// The record could not be rendered
    Failed { id: &'a str, error: &'a Error },
    /// The loop stopped early
    Aborted { error: &'a Error },
    /// The loop is over
    Finished { generated: usize, dir: &'a Path },
}

/// Source of operator decisions and sink for progress.
pub trait Operator {
    /// Present the numbered record listing.
    fn show_listing(&mut self, entries: &[ListingEntry<'_>]) -> Result<()>;

    /// The raw comma-separated index list.
    fn read_selection(&mut self) -> Result<String>;

    /// Individual or group mode. Only asked when several indices were selected.
    fn choose_mode(&mut self) -> Result<FillMode>;

    /// Values for the interactive fields, keyed by `[field]` token.
    fn collect_fields(&mut self, fields: &[String], scope: FieldScope<'_>) -> Result<PlaceholderMap>;

    /// Report progress.
    fn notify(&mut self, progress: Progress<'_>) -> Result<()>;
}

/// Interactive console protocol over any line reader and writer.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    /// Create an operator reading answers from `input` and writing prompts to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Print a prompt and read one line, without its line terminator. End of
    /// input reads as an empty line.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl ConsoleOperator<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Operator on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn show_listing(&mut self, entries: &[ListingEntry<'_>]) -> Result<()> {
        writeln!(self.output, "\n--- Lista de Itens Disponíveis ---")?;
        for entry in entries {
            writeln!(self.output, "{}: {}", entry.index, entry.label)?;
        }
        Ok(())
    }

    fn read_selection(&mut self) -> Result<String> {
        writeln!(self.output, "\n--- Seleção de Itens ---")?;
        self.ask("Digite os números dos itens, separados por vírgula: ")
    }

    fn choose_mode(&mut self) -> Result<FillMode> {
        writeln!(self.output, "\n--- Modo de Preenchimento ---")?;
        writeln!(
            self.output,
            "Você selecionou múltiplos itens. Deseja usar os mesmos dados para todos?"
        )?;
        writeln!(self.output, "[1] Não, preencher para cada um individualmente.")?;
        writeln!(self.output, "[2] Sim, usar os mesmos dados para todo o grupo.")?;
        let answer = self.ask("Sua escolha (1 ou 2): ")?;
        Ok(FillMode::from_choice(&answer))
    }

    fn collect_fields(&mut self, fields: &[String], scope: FieldScope<'_>) -> Result<PlaceholderMap> {
        match scope {
            FieldScope::Group => writeln!(self.output, "\n--- Preenchendo Dados para o Grupo ---")?,
            FieldScope::Record(id) => writeln!(self.output, "\n> Preenchendo dados para: {}", id)?,
        }

        let mut values = PlaceholderMap::new();
        for field in fields {
            let prompt = match scope {
                FieldScope::Group => {
                    format!("  Digite o valor de [{}] para TODOS os selecionados: ", field)
                }
                FieldScope::Record(_) => format!("  Digite o valor para [{}]: ", field),
            };
            let value = self.ask(&prompt)?;
            values.insert(field_token(field), value);
        }
        Ok(values)
    }

    fn notify(&mut self, progress: Progress<'_>) -> Result<()> {
        match progress {
            Progress::Started { .. } => writeln!(self.output, "\n--- Processando Documentos ---")?,
            Progress::Generated { id, .. } => {
                writeln!(self.output, "  ✔ Documento para '{}' gerado com sucesso!", id)?
            }
            Progress::Skipped { index } => writeln!(
                self.output,
                "\n[AVISO] O índice {} é inválido e será ignorado.",
                index
            )?,
            Progress::Failed { id, error } => writeln!(
                self.output,
                "\n[ERRO] Ocorreu um erro ao gerar o documento para {}: {}",
                id, error
            )?,
            Progress::Aborted { error } => {
                writeln!(self.output, "\n[ERRO] Geração interrompida: {}", error)?
            }
            Progress::Finished { generated, dir } => {
                writeln!(self.output, "\n--- Processo Finalizado! ---")?;
                writeln!(
                    self.output,
                    "{} documento(s) foram gerados na pasta '{}'.",
                    generated,
                    dir.display()
                )?;
            }
        }
        self.output.flush()?;
        Ok(())
    }
}

/// Non-interactive operator answering from preset values.
///
/// Every selected record receives the same field values, whatever the mode.
/// Progress is sent to the log.
#[derive(Debug, Clone, Default)]
pub struct PresetOperator {
    selection: String,
    mode: FillMode,
    values: HashMap<String, String>,
}

impl PresetOperator {
    /// Create an operator that selects `selection` (e.g. `"0,2"`).
    pub fn new(selection: impl Into<String>) -> Self {
        Self {
            selection: selection.into(),
            ..Self::default()
        }
    }

    /// Set the fill mode.
    pub fn with_mode(mut self, mode: FillMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the value of one field (name without brackets).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Parse a `NAME=VALUE` pair, as given on the command line.
    pub fn parse_field(pair: &str) -> Result<(String, String)> {
        match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(Error::Config(format!(
                "field '{}' must be given as NAME=VALUE",
                pair
            ))),
        }
    }
}

impl Operator for PresetOperator {
    fn show_listing(&mut self, entries: &[ListingEntry<'_>]) -> Result<()> {
        tracing::debug!(records = entries.len(), "listing available records");
        Ok(())
    }

    fn read_selection(&mut self) -> Result<String> {
        Ok(self.selection.clone())
    }

    fn choose_mode(&mut self) -> Result<FillMode> {
        Ok(self.mode)
    }

    fn collect_fields(&mut self, fields: &[String], _scope: FieldScope<'_>) -> Result<PlaceholderMap> {
        fields
            .iter()
            .map(|field| match self.values.get(field) {
                Some(value) => Ok((field_token(field), value.clone())),
                None => Err(Error::Config(format!("no value given for field '{}'", field))),
            })
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().collect())
    }

    fn notify(&mut self, progress: Progress<'_>) -> Result<()> {
        match progress {
            Progress::Started { count } => tracing::info!(count, "processing selection"),
            Progress::Generated { id, path } => {
                tracing::info!(id, path = %path.display(), "document generated")
            }
            Progress::Skipped { index } => tracing::warn!(index, "invalid index ignored"),
            Progress::Failed { id, error } => {
                tracing::error!(id, error = %error, "document generation failed")
            }
            Progress::Aborted { error } => tracing::error!(error = %error, "generation aborted"),
            Progress::Finished { generated, dir } => {
                tracing::info!(generated, dir = %dir.display(), "generation finished")
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> ConsoleOperator<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleOperator::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(op: ConsoleOperator<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(op.into_inner().1).unwrap()
    }

    #[test]
    fn test_console_listing_and_selection() {
        let mut op = console("0, 2\r\n");
        op.show_listing(&[
            ListingEntry { index: 0, label: "Ana" },
            ListingEntry { index: 1, label: "Bruno" },
        ])
        .unwrap();
        assert_eq!(op.read_selection().unwrap(), "0, 2");

        let out = output(op);
        assert!(out.contains("0: Ana\n1: Bruno\n"));
        assert!(out.ends_with("Digite os números dos itens, separados por vírgula: "));
    }

    #[test]
    fn test_console_mode_choice() {
        let mut op = console("2\n");
        assert_eq!(op.choose_mode().unwrap(), FillMode::Group);

        let mut op = console("talvez\n");
        assert_eq!(op.choose_mode().unwrap(), FillMode::Individual);

        let mut op = console("");
        assert_eq!(op.choose_mode().unwrap(), FillMode::Individual);
    }

    #[test]
    fn test_console_collects_fields_in_order() {
        let fields = vec!["categoria".to_string(), "valor".to_string()];

        let mut op = console("Música\n 1.500 \n");
        let values = op.collect_fields(&fields, FieldScope::Record("Ana")).unwrap();
        assert_eq!(
            values.iter().collect::<Vec<_>>(),
            vec![("[categoria]", "Música"), ("[valor]", " 1.500 ")]
        );
        let out = output(op);
        assert!(out.contains("> Preenchendo dados para: Ana"));
        assert!(out.contains("  Digite o valor para [valor]: "));

        let mut op = console("Teatro\n100\n");
        op.collect_fields(&fields, FieldScope::Group).unwrap();
        assert!(output(op).contains("  Digite o valor de [categoria] para TODOS os selecionados: "));
    }

    #[test]
    fn test_console_progress_lines() {
        let mut op = console("");
        op.notify(Progress::Generated {
            id: "Ana",
            path: Path::new("saida/Termo_Ana.docx"),
        })
        .unwrap();
        op.notify(Progress::Skipped { index: 7 }).unwrap();
        op.notify(Progress::Finished {
            generated: 1,
            dir: Path::new("saida"),
        })
        .unwrap();

        let out = output(op);
        assert!(out.contains("  ✔ Documento para 'Ana' gerado com sucesso!"));
        assert!(out.contains("[AVISO] O índice 7 é inválido e será ignorado."));
        assert!(out.contains("1 documento(s) foram gerados na pasta 'saida'."));
    }

    #[test]
    fn test_preset_operator() {
        let mut op = PresetOperator::new("0,1")
            .with_mode(FillMode::Group)
            .with_field("valor", "100");
        assert_eq!(op.read_selection().unwrap(), "0,1");
        assert_eq!(op.choose_mode().unwrap(), FillMode::Group);

        let values = op
            .collect_fields(&["valor".to_string()], FieldScope::Group)
            .unwrap();
        assert_eq!(values.get("[valor]"), Some("100"));

        let err = op
            .collect_fields(&["categoria".to_string()], FieldScope::Record("Ana"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_field_pair() {
        assert_eq!(
            PresetOperator::parse_field("valor=1.500=00").unwrap(),
            ("valor".to_string(), "1.500=00".to_string())
        );
        assert!(PresetOperator::parse_field("valor").is_err());
        assert!(PresetOperator::parse_field("=x").is_err());
    }
}
