//! Supported interpreter versions read from upstream `constants.py`.
//!
//! Only the two version tuples are read; the file is never executed.

use std::path::Path;

use regex::Regex;

use crate::error::{io_err, CoreError};
use crate::types::PythonVersion;

const REMOTE_ONLY: &str = "REMOTE_ONLY_PYTHON_VERSIONS";
const CONTROLLER: &str = "CONTROLLER_PYTHON_VERSIONS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedPythons {
    pub remote_only: Vec<PythonVersion>,
    pub controller: Vec<PythonVersion>,
}

impl SupportedPythons {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Self::parse(&source, path)
    }

    /// Parse both tuples out of `source`; `path` is only used in errors.
    pub fn parse(source: &str, path: &Path) -> Result<Self, CoreError> {
        Ok(Self {
            remote_only: parse_tuple(source, REMOTE_ONLY, path)?,
            controller: parse_tuple(source, CONTROLLER, path)?,
        })
    }

    /// Minimum controller version: the first entry of the controller tuple.
    pub fn controller_min(&self) -> Option<PythonVersion> {
        self.controller.first().copied()
    }

    /// Every supported version, ascending, without duplicates.
    pub fn all(&self) -> Vec<PythonVersion> {
        let mut all: Vec<_> = self
            .remote_only
            .iter()
            .chain(self.controller.iter())
            .copied()
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

fn parse_tuple(source: &str, name: &str, path: &Path) -> Result<Vec<PythonVersion>, CoreError> {
    let missing = || CoreError::MissingConstant {
        path: path.to_path_buf(),
        name: name.to_string(),
    };
    let tuple = Regex::new(&format!(r"(?ms)^{name}\s*=\s*\((.*?)\)")).map_err(|_| missing())?;
    let body = tuple
        .captures(source)
        .and_then(|c| c.get(1))
        .ok_or_else(missing)?
        .as_str();

    let literal = Regex::new(r#"'([^']*)'|"([^"]*)""#).map_err(|_| missing())?;
    literal
        .captures_iter(body)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().parse())
        .collect()
}
