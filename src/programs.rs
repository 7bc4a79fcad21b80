use crate::loader::{Program, ProgramLoader};
use crate::types::{GraphError, StateId};
use log::warn;
use std::collections::BTreeSet;

// Default embedded programs
const PROGRAM_TEXTS: [(&str, &str); 5] = [
    ("flip", include_str!("../programs/flip.tm")),
    ("increment", include_str!("../programs/increment.tm")),
    ("parity", include_str!("../programs/parity.tm")),
    ("busy-beaver-2", include_str!("../programs/busy-beaver-2.tm")),
    ("busy-beaver-3", include_str!("../programs/busy-beaver-3.tm")),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<Program> = PROGRAM_TEXTS
        .iter()
        .filter_map(|(stem, text)| match ProgramLoader::load_program_from_string(text, stem) {
            Ok(program) => Some(program),
            Err(e) => {
                warn!("Failed to parse bundled program {}: {}", stem, e);
                None
            }
        })
        .collect();
}

/// Read access to the programs bundled with the crate.
pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, GraphError> {
        PROGRAMS.get(index).cloned().ok_or_else(|| {
            GraphError::ValidationError(format!("Program index {} out of range", index))
        })
    }

    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Result<Program, GraphError> {
        PROGRAMS
            .iter()
            .find(|program| program.name == name)
            .cloned()
            .ok_or_else(|| GraphError::ValidationError(format!("Program '{}' not found", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        PROGRAMS.iter().map(|program| program.name.clone()).collect()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, GraphError> {
        let program = Self::get_program_by_index(index)?;
        let states: BTreeSet<StateId> = program
            .transitions
            .iter()
            .flat_map(|transition| [transition.from, transition.to])
            .collect();

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            state_count: states.len(),
            transition_count: program.transitions.len(),
        })
    }

    /// Search for programs by name, case-insensitively
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .enumerate()
            .filter(|(_, program)| program.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    /// Get the program by its index in canonical transition notation
    pub fn get_program_text_by_index(index: usize) -> Result<String, GraphError> {
        Self::get_program_by_index(index).map(|program| program.source())
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub state_count: usize,
    pub transition_count: usize,
}
