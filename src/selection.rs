//! Operator selection: index lists and fill mode.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use std::str::FromStr;

/// How interactive field values are collected when several records are selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Prompt for the fields before each record
    #[default]
    Individual,
    /// Prompt once and reuse the values for every selected record
    Group,
}

impl FillMode {
    /// Interpret the operator's answer to the mode prompt: `2` means group,
    /// anything else individual.
    pub fn from_choice(answer: &str) -> Self {
        if answer.trim() == "2" {
            FillMode::Group
        } else {
            FillMode::Individual
        }
    }
}

impl FromStr for FillMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "individual" | "1" => Ok(FillMode::Individual),
            "group" | "grupo" | "2" => Ok(FillMode::Group),
            other => Err(Error::Config(format!("unknown fill mode '{}'", other))),
        }
    }
}

impl std::fmt::Display for FillMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillMode::Individual => write!(f, "individual"),
            FillMode::Group => write!(f, "group"),
        }
    }
}

/// Parse a comma-separated list of record indices.
///
/// Every token is trimmed and must be an integer, otherwise the whole input
/// is rejected. Range checking is left to the generation loop; an integer too
/// large for `i64` saturates so it is skipped there like any other.
pub fn parse_selection(input: &str) -> Result<Vec<i64>> {
    input
        .split(',')
        .map(|token| match token.trim().parse::<i64>() {
            Ok(index) => Ok(index),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Ok(i64::MAX),
                IntErrorKind::NegOverflow => Ok(i64::MIN),
                _ => Err(Error::InvalidSelection(input.trim().to_string())),
            },
        })
        .collect()
}

/// Fill mode for a selection: the operator is only asked when more than one
/// index was selected.
pub fn needs_mode_choice(selection: &[i64]) -> bool {
    selection.len() > 1
}
