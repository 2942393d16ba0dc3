//! Dataset and record models.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// One spreadsheet row: column name to cell text, in sheet column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Get the value of a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// `(column, value)` pairs in sheet column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Get the value of a column or fail with [`Error::ColumnNotFound`].
    pub fn require(&self, column: &str) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }

    /// Number of columns in this record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Serialises as a map whose keys follow the sheet columns.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Ordered records plus the ordered list of column names.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

/// One line of the operator listing: `index: identifying value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingEntry<'a> {
    /// Record index (0-based)
    pub index: usize,
    /// Value of the identifying column
    pub label: &'a str,
}

impl Dataset {
    /// Build a dataset from a header row and data rows.
    ///
    /// Header names are normalised the way dataframe readers do it: a blank
    /// header becomes `Unnamed: {col}`, a repeated one gets a `.1`, `.2`, …
    /// suffix. Short rows are padded with empty cells, extra cells beyond the
    /// header are dropped.
    pub fn from_rows<H, R, C>(header: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let columns = normalize_header(header.into_iter().map(Into::into).collect());

        let records = rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter().map(Into::into);
                let fields = columns
                    .iter()
                    .map(|column| (column.clone(), cells.next().unwrap_or_default()))
                    .collect();
                Record { fields }
            })
            .collect();

        Self { columns, records }
    }

    /// Column names in sheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in sheet order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Get a record by operator index. Negative or too large indices yield `None`.
    pub fn get(&self, index: i64) -> Option<&Record> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.records.get(i))
    }

    /// The numbered listing shown to the operator.
    pub fn listing(&self, id_column: &str) -> Result<Vec<ListingEntry<'_>>> {
        if !self.has_column(id_column) {
            return Err(Error::ColumnNotFound(id_column.to_string()));
        }

        Ok(self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| ListingEntry {
                index,
                label: record.get(id_column).unwrap_or_default(),
            })
            .collect())
    }
}

fn normalize_header(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };

        let count = seen.entry(base.clone()).or_insert(0);
        let column = if *count == 0 {
            base
        } else {
            format!("{}.{}", base, count)
        };
        *count += 1;
        columns.push(column);
    }

    columns
}
