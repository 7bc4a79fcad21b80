//! This module provides the serializer for the transition notation, the syntactic inverse of
//! the parser.

use crate::parser::SEPARATOR;
use crate::types::Transition;

/// Encodes transitions as `From->To:Read,Write/Move;` statements.
///
/// Every statement, including the last one, is followed by a separator, so the output of
/// `encode` parses back into the same transitions and re-encodes into the same text.
///
/// # Arguments
///
/// * `transitions` - The transitions to encode, in order.
///
/// # Returns
///
/// * `String` - The encoded program. Empty when there are no transitions.
pub fn encode(transitions: &[Transition]) -> String {
    transitions
        .iter()
        .map(|transition| format!("{transition}{SEPARATOR}"))
        .collect()
}

/// Encodes transitions one statement per line. Parses to the same transitions as `encode`.
pub fn encode_pretty(transitions: &[Transition]) -> String {
    transitions
        .iter()
        .map(|transition| format!("{transition}{SEPARATOR}\n"))
        .collect()
}
