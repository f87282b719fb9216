use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::AnalysisError;

const BUNDLED_OPENINGS: &str = include_str!("../data/openings.json");

/// Opening code (ECO) to display name.
#[derive(Debug, Clone, Default)]
pub struct OpeningTable {
    names: HashMap<String, String>,
}

impl OpeningTable {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_OPENINGS).context("bundled opening table is invalid")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read opening table {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse opening table {}", path.display()))
    }

    /// Loads `path` when given, otherwise the table shipped with the crate.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let names: HashMap<String, String> =
            serde_json::from_str(raw.trim()).context("invalid opening table json")?;
        Ok(Self { names })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Strict lookup: an unknown or absent code is an error, never a fallback name.
    pub fn name_for(&self, code: Option<&str>) -> Result<&str, AnalysisError> {
        let Some(code) = code else {
            return Err(AnalysisError::LookupFailure { code: None });
        };
        self.names
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| AnalysisError::LookupFailure {
                code: Some(code.to_string()),
            })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_table_covers_full_eco_range() {
        let table = OpeningTable::bundled().expect("bundled table parses");
        assert_eq!(table.len(), 500);
        assert_eq!(table.name_for(Some("B20")).unwrap(), "Sicilian Defence");
        assert_eq!(table.name_for(Some("E99")).unwrap(), "King's Indian Defence");
    }

    #[test]
    fn unknown_code_is_a_lookup_failure() {
        let table = OpeningTable::from_pairs([("C50", "Italian Game")]);
        let err = table.name_for(Some("Z99")).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LookupFailure { code: Some(ref c) } if c == "Z99"
        ));
        assert!(matches!(
            table.name_for(None),
            Err(AnalysisError::LookupFailure { code: None })
        ));
    }
}
