//! This module provides the `ProgramLoader` struct, responsible for loading transition
//! programs from `.tm` files and strings.
//!
//! A `.tm` file holds transition statements, freely spread over lines. Lines starting with
//! `#` are comments; a `# name: ...` comment names the program.

use crate::encoder::encode;
use crate::parser::parse;
use crate::types::{GraphError, Transition};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of program files.
pub const PROGRAM_EXTENSION: &str = "tm";

const COMMENT: char = '#';
const NAME_KEY: &str = "name:";

/// A named transition program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub transitions: Vec<Transition>,
}

impl Program {
    /// The program in canonical transition notation.
    pub fn source(&self) -> String {
        encode(&self.transitions)
    }
}

/// `ProgramLoader` is a utility struct for loading transition programs.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// Without a `# name:` comment the program is named after the file stem.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed.
    /// * `Err(GraphError::FileError)` if the file cannot be read.
    /// * `Err(GraphError::ParseError)` if a statement is malformed.
    pub fn load_program(path: &Path) -> Result<Program, GraphError> {
        let content = fs::read_to_string(path).map_err(|e| {
            GraphError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let fallback = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::load_program_from_string(&content, &fallback)
    }

    /// Loads a single program from string content, named `fallback_name` unless the content
    /// names itself.
    pub fn load_program_from_string(
        content: &str,
        fallback_name: &str,
    ) -> Result<Program, GraphError> {
        let (name, body) = split_source(content);

        let transitions = parse(&body)?;
        let name = name.unwrap_or_else(|| fallback_name.to_string());
        debug!("Loaded program '{}' ({} transitions)", name, transitions.len());

        Ok(Program { name, transitions })
    }

    /// The statements of a program file with comments and line breaks removed, ready for
    /// `parse_algorithm` when malformed statements should be reported one by one.
    pub fn program_text(content: &str) -> String {
        split_source(content).1
    }

    /// Loads every `.tm` file of a directory. Subdirectories and other files are skipped.
    ///
    /// # Returns
    ///
    /// One entry per program file, in file name order: the path and program, or the error
    /// that prevented loading it.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), GraphError>> {
        if !directory.exists() {
            return vec![Err(GraphError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(GraphError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();

        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(GraphError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }

        paths.retain(|path| {
            !path.is_dir() && path.extension().is_some_and(|ext| ext == PROGRAM_EXTENSION)
        });
        paths.sort();

        results.extend(paths.into_iter().map(|path| {
            Self::load_program(&path)
                .map(|program| (path.clone(), program))
                .map_err(|e| {
                    GraphError::FileError(format!(
                        "Failed to load program from {}: {}",
                        path.display(),
                        e
                    ))
                })
        }));

        results
    }
}

/// Splits file content into the `# name:` value, if any, and the statement text.
fn split_source(content: &str) -> (Option<String>, String) {
    let mut name = None;
    let mut body = String::new();

    for line in content.lines() {
        let line = line.trim();
        match line.strip_prefix(COMMENT) {
            Some(comment) => {
                if let Some(value) = comment.trim().strip_prefix(NAME_KEY) {
                    name = Some(value.trim().to_string());
                }
            }
            None => body.push_str(line),
        }
    }

    (name, body)
}
