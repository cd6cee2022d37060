//! Pre-build instructions embedded as comments in a requirements file.
//!
//! ```text
//! # pre-build requirement: pyyaml == 6.0.2
//! # pre-build constraint: Cython < 3.0
//! ```
//!
//! Each requirement starts a new instruction; constraints attach to the most
//! recent requirement.

use std::path::Path;

use crate::error::{io_err, ContainerError};
use crate::pip::Pip;
use crate::runner::CommandRunner;

const PREFIX: &str = "# pre-build ";
const REQUIREMENT_PREFIX: &str = "# pre-build requirement: ";
const CONSTRAINT_PREFIX: &str = "# pre-build constraint: ";

/// A wheel to build ahead of installation, with its own constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreBuild {
    pub requirement: String,
    pub constraints: Vec<String>,
}

impl PreBuild {
    /// Write the constraints to a temporary file and build the wheel under them.
    pub fn execute<R: CommandRunner + ?Sized>(&self, pip: &Pip<'_, R>) -> Result<(), ContainerError> {
        let temp_dir = tempfile::tempdir().map_err(|e| io_err(std::env::temp_dir(), e))?;
        let constraints_path = temp_dir.path().join("constraints.txt");
        let mut constraints = self.constraints.join("\n");
        constraints.push('\n');
        std::fs::write(&constraints_path, constraints).map_err(|e| io_err(&constraints_path, e))?;

        pip.wheel(std::slice::from_ref(&self.requirement), &constraints_path)
    }
}

/// Extract pre-build instructions from the text of a requirements file.
pub fn parse_pre_build_instructions(requirements: &str) -> Result<Vec<PreBuild>, ContainerError> {
    let mut instructions: Vec<PreBuild> = Vec::new();

    for line in requirements.lines().filter(|l| l.starts_with(PREFIX)) {
        if let Some(requirement) = line.strip_prefix(REQUIREMENT_PREFIX) {
            instructions.push(PreBuild {
                requirement: requirement.to_string(),
                constraints: Vec::new(),
            });
        } else if let Some(constraint) = line.strip_prefix(CONSTRAINT_PREFIX) {
            let current = instructions
                .last_mut()
                .ok_or_else(|| ContainerError::OrphanConstraint {
                    line: line.to_string(),
                })?;
            current.constraints.push(constraint.to_string());
        } else {
            return Err(ContainerError::PreBuild {
                line: line.to_string(),
            });
        }
    }

    Ok(instructions)
}

/// Load instructions from `path`; a missing file has none.
pub fn load(path: &Path) -> Result<Vec<PreBuild>, ContainerError> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_pre_build_instructions(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(io_err(path, e)),
    }
}
