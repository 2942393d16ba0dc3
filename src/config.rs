//! Run configuration.
//!
//! A [`Config`] is built once at startup, either from [`Config::default`] or
//! from a TOML file, and passed into the pipeline:
//!
//! ```toml
//! fields = ["categoria", "valor"]
//!
//! [data]
//! path = "dados/banco_de_dados.xlsx"
//! sheet = "termo"
//! id_column = "Nome do Artista"
//!
//! [template]
//! path = "modelo/modelo_termo.docx"
//! date_placeholder = "[data_atual]"
//!
//! [output]
//! dir = "documentos_gerados"
//! prefix = "Termo_Compromisso"
//!
//! [[columns]]
//! column = "Nome do Artista"
//! placeholder = "[nome_completo]"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "docfill.toml";

/// Where the records come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the .xlsx workbook
    pub path: PathBuf,
    /// Sheet holding the records
    pub sheet: String,
    /// Column shown in the listing and used to name output files
    pub id_column: String,
}

/// The document every record is rendered into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Path to the .docx template
    pub path: PathBuf,
    /// Token replaced with the current date
    #[serde(default = "default_date_placeholder")]
    pub date_placeholder: String,
}

/// Where generated documents go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, created on demand
    pub dir: PathBuf,
    /// File name prefix: `{prefix}_{id}.docx`
    pub prefix: String,
}

/// A spreadsheet column feeding one placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column header in the sheet
    pub column: String,
    /// Token in the template, brackets included
    pub placeholder: String,
}

impl ColumnMapping {
    /// Create a mapping.
    pub fn new(column: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            placeholder: placeholder.into(),
        }
    }
}

/// Complete configuration of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Fields asked from the operator; each fills `[field]`
    #[serde(default)]
    pub fields: Vec<String>,

    /// Data source
    pub data: DataConfig,

    /// Template document
    pub template: TemplateConfig,

    /// Output location
    pub output: OutputConfig,

    /// Column to placeholder associations, applied in declaration order
    #[serde(default)]
    pub columns: Vec<ColumnMapping>,
}

fn default_date_placeholder() -> String {
    "[data_atual]".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fields: vec!["categoria".to_string(), "valor".to_string()],
            data: DataConfig {
                path: Path::new("dados").join("banco_de_dados.xlsx"),
                sheet: "termo".to_string(),
                id_column: "Nome do Artista".to_string(),
            },
            template: TemplateConfig {
                path: Path::new("modelo").join("modelo_termo.docx"),
                date_placeholder: default_date_placeholder(),
            },
            output: OutputConfig {
                dir: PathBuf::from("documentos_gerados"),
                prefix: "Termo_Compromisso".to_string(),
            },
            columns: vec![
                ColumnMapping::new("Nome do Artista", "[nome_completo]"),
                ColumnMapping::new("CPF", "[cpf]"),
                ColumnMapping::new("Endereço Completo", "[endereco]"),
            ],
        }
    }
}

impl Config {
    /// Load a configuration from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.data.sheet.trim().is_empty() {
            return Err(Error::Config("data.sheet must not be empty".to_string()));
        }
        if self.data.id_column.trim().is_empty() {
            return Err(Error::Config("data.id_column must not be empty".to_string()));
        }
        if self.output.prefix.trim().is_empty() {
            return Err(Error::Config("output.prefix must not be empty".to_string()));
        }

        check_token("template.date_placeholder", &self.template.date_placeholder)?;
        for mapping in &self.columns {
            if mapping.column.trim().is_empty() {
                return Err(Error::Config("columns.column must not be empty".to_string()));
            }
            check_token(&format!("columns[{}]", mapping.column), &mapping.placeholder)?;
        }
        for field in &self.fields {
            if field.trim().is_empty() || field.contains(['[', ']']) {
                return Err(Error::Config(format!(
                    "field name '{}' must be non-empty and without brackets",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Every placeholder this configuration fills, in substitution order.
    pub fn placeholders(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        let all = self
            .columns
            .iter()
            .map(|m| m.placeholder.clone())
            .chain(self.fields.iter().map(|f| crate::model::field_token(f)))
            .chain(std::iter::once(self.template.date_placeholder.clone()));
        for token in all {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Set the workbook path.
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data.path = path.into();
        self
    }

    /// Set the sheet name.
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.data.sheet = sheet.into();
        self
    }

    /// Set the identifying column.
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.data.id_column = column.into();
        self
    }

    /// Set the template path.
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template.path = path.into();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.dir = dir.into();
        self
    }

    /// Set the output file prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output.prefix = prefix.into();
        self
    }

    /// Replace the column mappings.
    pub fn with_columns(mut self, columns: Vec<ColumnMapping>) -> Self {
        self.columns = columns;
        self
    }

    /// Replace the interactive fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

fn check_token(what: &str, token: &str) -> Result<()> {
    let well_formed = token.len() > 2 && token.starts_with('[') && token.ends_with(']');
    if !well_formed {
        return Err(Error::Config(format!(
            "{}: placeholder '{}' must look like [name]",
            what, token
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_builtin_setup() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.data.sheet, "termo");
        assert_eq!(config.output.prefix, "Termo_Compromisso");
        assert_eq!(
            config.placeholders(),
            vec![
                "[nome_completo]",
                "[cpf]",
                "[endereco]",
                "[categoria]",
                "[valor]",
                "[data_atual]"
            ]
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default().with_prefix("Contrato");
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_from_toml_keeps_column_order() {
        let config = Config::from_toml(
            r#"
fields = ["valor"]

[data]
path = "dados.xlsx"
sheet = "Plan1"
id_column = "Nome"

[template]
path = "modelo.docx"

[output]
dir = "saida"
prefix = "Recibo"

[[columns]]
column = "Nome"
placeholder = "[nome]"

[[columns]]
column = "CPF"
placeholder = "[cpf]"
"#,
        )
        .unwrap();

        assert_eq!(config.template.date_placeholder, "[data_atual]");
        assert_eq!(config.columns[0], ColumnMapping::new("Nome", "[nome]"));
        assert_eq!(config.columns[1], ColumnMapping::new("CPF", "[cpf]"));
    }

    #[test]
    fn test_validate_rejects_bad_placeholder() {
        let config =
            Config::default().with_columns(vec![ColumnMapping::new("CPF", "cpf")]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config::default().with_fields(["[valor]"]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let err = Config::from_toml("fields = []").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
