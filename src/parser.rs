//! This module provides the parser for the transition notation, utilizing the `pest` crate.
//! A program is a sequence of `From->To:Read,Write/Move;` statements. Whitespace anywhere in
//! the text is insignificant.

use crate::types::{Direction, GraphError, StateId, Symbol, Transition, MAX_PROGRAM_SIZE};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

/// Statement separator of the transition notation.
pub const SEPARATOR: char = ';';

/// Derives a `PestParser` for the transition grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TransitionParser;

/// Parses a whole program into its statements, keeping malformed statements as `Err` holes.
///
/// The returned vector is positionally aligned with the statements of `input`, so callers
/// can report which statement failed and still use every well-formed one. An empty text
/// yields no statements, and the empty tail after the final `;` is not a statement.
///
/// # Arguments
///
/// * `input` - The program text.
///
/// # Returns
///
/// * One `Result` per statement.
/// * A single `Err(GraphError::ProgramTooLarge)` if the input exceeds `MAX_PROGRAM_SIZE`.
pub fn parse_algorithm(input: &str) -> Vec<Result<Transition, GraphError>> {
    if input.len() > MAX_PROGRAM_SIZE {
        return vec![Err(GraphError::ProgramTooLarge(input.len()))];
    }

    let compact = strip_whitespace(input);
    if compact.is_empty() {
        return Vec::new();
    }

    let body = compact.strip_suffix(SEPARATOR).unwrap_or(&compact);

    body.split(SEPARATOR)
        .enumerate()
        .map(|(index, statement)| parse_statement(statement, index))
        .collect()
}

/// Parses a whole program, failing on the first malformed statement.
///
/// # Returns
///
/// * `Ok(Vec<Transition>)` with the transitions in statement order.
/// * `Err(GraphError::ParseError)` for the first statement that does not match the grammar.
pub fn parse(input: &str) -> Result<Vec<Transition>, GraphError> {
    parse_algorithm(input).into_iter().collect()
}

/// Parses a single statement such as `0 -> 1 : 0 , 1 / R` (the trailing `;` is optional).
pub fn parse_transition(statement: &str) -> Result<Transition, GraphError> {
    let compact = strip_whitespace(statement);
    let compact = compact.strip_suffix(SEPARATOR).unwrap_or(&compact);

    parse_statement(compact, 0)
}

/// Parses one whitespace-free statement. `index` is recorded in errors.
fn parse_statement(statement: &str, index: usize) -> Result<Transition, GraphError> {
    let root = TransitionParser::parse(Rule::transition, statement)
        .map_err(|source| GraphError::ParseError {
            index,
            source: Box::new(source),
        })?
        .next()
        .ok_or_else(|| GraphError::ParseError {
            index,
            source: Box::new(custom_error("Empty statement", statement)),
        })?;

    let span = root.as_span();
    parse_pairs(root.into_inner(), span, index)
}

/// Maps the fixed token positions of a `transition` pair onto a `Transition`.
///
/// `span` covers the whole statement and locates errors for missing tokens.
fn parse_pairs(
    mut pairs: Pairs<Rule>,
    span: Span,
    index: usize,
) -> Result<Transition, GraphError> {
    let from = parse_state(pairs.next(), span, index)?;
    let to = parse_state(pairs.next(), span, index)?;
    let read = parse_symbol(pairs.next().and_then(|p| p.into_inner().next()), span, index)?;
    let write = parse_symbol(pairs.next().and_then(|p| p.into_inner().next()), span, index)?;
    let direction = parse_direction(pairs.next(), span, index)?;

    Ok(Transition {
        from,
        to,
        read,
        write,
        direction,
    })
}

/// Parses a state id. Ids beyond `u32` are rejected with the offending span.
fn parse_state(
    pair: Option<Pair<Rule>>,
    statement: Span,
    index: usize,
) -> Result<StateId, GraphError> {
    let pair = pair.ok_or_else(|| parse_error("Missing state", statement, index))?;
    let span = pair.as_span();

    pair.as_str()
        .parse::<StateId>()
        .map_err(|_| parse_error(&format!("State id out of range: {}", span.as_str()), span, index))
}

fn parse_symbol(
    pair: Option<Pair<Rule>>,
    statement: Span,
    index: usize,
) -> Result<Symbol, GraphError> {
    let pair = pair.ok_or_else(|| parse_error("Missing symbol", statement, index))?;

    match pair.as_str() {
        "0" => Ok(Symbol::Zero),
        "1" => Ok(Symbol::One),
        other => Err(parse_error(
            &format!("Unknown symbol: {}", other),
            pair.as_span(),
            index,
        )),
    }
}

/// Parses a head movement. `L` and `R` move the head, `H` halts.
fn parse_direction(
    pair: Option<Pair<Rule>>,
    statement: Span,
    index: usize,
) -> Result<Direction, GraphError> {
    let pair = pair.ok_or_else(|| parse_error("Missing direction", statement, index))?;

    match pair.as_str() {
        "L" => Ok(Direction::Left),
        "R" => Ok(Direction::Right),
        "H" => Ok(Direction::Halt),
        other => Err(parse_error(
            &format!("Unknown direction: {}", other),
            pair.as_span(),
            index,
        )),
    }
}

/// Creates a `GraphError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span, index: usize) -> GraphError {
    GraphError::ParseError {
        index,
        source: Box::new(Error::new_from_span(
            ErrorVariant::CustomError {
                message: msg.to_string(),
            },
            span,
        )),
    }
}

fn custom_error(msg: &str, input: &str) -> Error<Rule> {
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        pest::Position::from_start(input),
    )
}

fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_statement() {
        let transition = parse_transition("0->1:0,1/R").unwrap();

        assert_eq!(
            transition,
            Transition::new(0, 1, Symbol::Zero, Symbol::One, Direction::Right)
        );
    }

    #[test]
    fn test_parse_ignores_whitespace() {
        let transition = parse_transition(" 12 -> 3 :\t1 , 0 / L ;\n").unwrap();

        assert_eq!(
            transition,
            Transition::new(12, 3, Symbol::One, Symbol::Zero, Direction::Left)
        );
    }

    #[test]
    fn test_parse_halt_direction() {
        let transition = parse_transition("1->1:0,0/H").unwrap();

        assert_eq!(transition.direction, Direction::Halt);
        assert!(transition.is_self_loop());
    }

    #[test]
    fn test_parse_program() {
        let result = parse("0->1:0,1/R;1->0:1,0/L;1->1:0,0/H;").unwrap();

        assert_eq!(
            result,
            vec![
                Transition::new(0, 1, Symbol::Zero, Symbol::One, Direction::Right),
                Transition::new(1, 0, Symbol::One, Symbol::Zero, Direction::Left),
                Transition::new(1, 1, Symbol::Zero, Symbol::Zero, Direction::Halt),
            ]
        );
    }

    #[test]
    fn test_parse_program_without_trailing_separator() {
        let result = parse("0->1:0,1/R;1->0:1,0/L").unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_parse_empty_program() {
        assert!(parse_algorithm("").is_empty());
        assert!(parse_algorithm("  \n\t ").is_empty());
        assert_eq!(parse("").unwrap(), Vec::new());
    }

    #[test]
    fn test_parse_algorithm_keeps_holes() {
        let result = parse_algorithm("0->1:0,1/R;garbage;1->0:2,0/L;;2->2:1,1/H;");

        assert_eq!(result.len(), 5);
        assert!(result[0].is_ok());
        assert!(matches!(
            result[1],
            Err(GraphError::ParseError { index: 1, .. })
        ));
        // `2` is not a symbol
        assert!(matches!(
            result[2],
            Err(GraphError::ParseError { index: 2, .. })
        ));
        // Empty statement between two separators
        assert!(matches!(
            result[3],
            Err(GraphError::ParseError { index: 3, .. })
        ));
        assert!(result[4].is_ok());
    }

    #[test]
    fn test_parse_reports_first_error() {
        let error = parse("0->1:0,1/R;0->1:0,1/X;").unwrap_err();

        assert!(matches!(error, GraphError::ParseError { index: 1, .. }));
        assert!(error.to_string().contains("statement 1"));
    }

    #[test]
    fn test_parse_rejects_trailing_tokens() {
        assert!(parse_transition("0->1:0,1/RR").is_err());
        assert!(parse_transition("0->1:0,1").is_err());
        assert!(parse_transition("->1:0,1/R").is_err());
        assert!(parse_transition("-1->1:0,1/R").is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_state() {
        let error = parse_transition("99999999999->1:0,1/R").unwrap_err();

        assert!(matches!(error, GraphError::ParseError { .. }));
        assert!(error.to_string().contains("State id out of range"));
    }

    #[test]
    fn test_missing_tokens_are_parse_errors() {
        let statement = Span::new("0->1:0,1/R", 0, 10).unwrap();

        for error in [
            parse_state(None, statement, 4).unwrap_err(),
            parse_symbol(None, statement, 4).unwrap_err(),
            parse_direction(None, statement, 4).unwrap_err(),
        ] {
            assert!(matches!(error, GraphError::ParseError { index: 4, .. }));
        }

        let error = parse_direction(None, statement, 4).unwrap_err();
        assert!(error.to_string().contains("Missing direction"));
    }

    #[test]
    fn test_parse_rejects_oversized_program() {
        let input = "0->1:0,1/R;".repeat(MAX_PROGRAM_SIZE / 10);
        let result = parse(&input);

        assert!(matches!(result, Err(GraphError::ProgramTooLarge(_))));
    }
}
