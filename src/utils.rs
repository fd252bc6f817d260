use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::generator::{GenerationStats, Language};
use crate::grammar::{Grammar, Symbol};

/// Validation and I/O errors raised while building a grammar or writing
/// results. Generation itself never fails.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Invalid symbol name: {0:?}")]
    InvalidSymbol(String),

    #[error("Symbols declared both terminal and non-terminal: {0}")]
    OverlappingSymbols(String),

    #[error("Start symbol is not a non-terminal: {0}")]
    StartNotNonTerminal(String),

    #[error("Unknown non-terminal: {0}")]
    UnknownNonTerminal(String),

    #[error("Undeclared symbol in production: {0}")]
    UndeclaredSymbol(String),

    #[error("Empty symbol set")]
    EmptySymbolSet,

    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("Invalid maximum length: {0:?} (expected a positive integer)")]
    InvalidLength(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// Parse a maximum length, which must be an integer >= 1
pub fn parse_max_length(text: &str) -> Result<usize> {
    match text.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(GrammarError::InvalidLength(text.trim().to_string())),
    }
}

/// `L = { w1, w2, ... }`, with `ε` for the empty word
pub fn format_language(language: &Language) -> String {
    if language.is_empty() {
        return "L = { }".to_string();
    }
    format!("L = {{ {} }}", language.rendered().join(", "))
}

/// Full text report: grammar, bound, language and its size
pub fn render_text(grammar: &Grammar, max_length: usize, language: &Language) -> String {
    format!(
        "{}\n\nLanguage L(G) up to length {}:\n{}\n|L| = {}\n",
        grammar,
        max_length,
        format_language(language),
        language.len()
    )
}

#[derive(Serialize)]
struct Report<'a> {
    grammar: &'a Grammar,
    max_length: usize,
    words: Vec<String>,
    stats: &'a GenerationStats,
}

/// JSON report with the grammar, the bound, the rendered words and the
/// search counters
pub fn render_json(grammar: &Grammar, max_length: usize, language: &Language) -> Result<String> {
    let report = Report {
        grammar,
        max_length,
        words: language
            .words()
            .iter()
            .map(|w| render_word(grammar, w))
            .collect(),
        stats: language.stats(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Like [`Grammar::render`], except the empty word is an empty JSON string
/// rather than `ε`.
fn render_word(grammar: &Grammar, word: &[Symbol]) -> String {
    if word.is_empty() {
        String::new()
    } else {
        grammar.render(word)
    }
}

/// Write `text` to `path`, or to stdout when no path is given
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text)?,
        None => print!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{Generator, GeneratorConfig};
    use crate::grammar::GrammarBuilder;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn epsilon_grammar() -> Grammar {
        GrammarBuilder::new()
            .terminals(["a"])
            .non_terminals(["S"])
            .start("S")
            .rule("S -> aS | ε")
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_max_length() {
        assert_eq!(parse_max_length("4").unwrap(), 4);
        assert_eq!(parse_max_length(" 12 \n").unwrap(), 12);
        for bad in ["0", "-3", "abc", "2.5", ""] {
            assert!(
                matches!(parse_max_length(bad), Err(GrammarError::InvalidLength(_))),
                "input {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_format_language() {
        let grammar = epsilon_grammar();
        let language = Generator::new(&grammar, GeneratorConfig { max_length: 2 }).run();
        assert_eq!(format_language(&language), "L = { ε, a, aa }");

        let only_epsilon = Generator::new(&grammar, GeneratorConfig { max_length: 0 }).run();
        assert_eq!(format_language(&only_epsilon), "L = { ε }");
    }

    #[test]
    fn test_format_language_keeps_words_distinct() {
        let grammar = GrammarBuilder::new()
            .terminals(["a", "b", "ab"])
            .non_terminals(["S"])
            .start("S")
            .rule("S -> a b | ab")
            .build()
            .unwrap();
        let language = Generator::new(&grammar, GeneratorConfig { max_length: 2 }).run();

        assert_eq!(format_language(&language), "L = { ab, a b }");

        let json = render_json(&grammar, 2, &language).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["words"], serde_json::json!(["ab", "a b"]));
    }

    #[test]
    fn test_render_text() {
        let grammar = epsilon_grammar();
        let language = Generator::new(&grammar, GeneratorConfig { max_length: 1 }).run();
        let text = render_text(&grammar, 1, &language);

        assert!(text.starts_with("G = (VT, VN, S, P)"));
        assert!(text.contains("Language L(G) up to length 1:\nL = { ε, a }\n|L| = 2\n"));
    }

    #[test]
    fn test_render_json() {
        let grammar = epsilon_grammar();
        let language = Generator::new(&grammar, GeneratorConfig { max_length: 2 }).run();
        let json = render_json(&grammar, 2, &language).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["max_length"], 2);
        assert_eq!(value["words"], serde_json::json!(["", "a", "aa"]));
        assert_eq!(value["grammar"]["start"], "S");
        assert!(value["stats"]["visited"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("language.txt");

        write_output(Some(path.as_path()), "L = { a }\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "L = { a }\n");
    }

    #[test]
    fn test_write_output_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("language.txt");

        let err = write_output(Some(path.as_path()), "x").unwrap_err();
        assert!(matches!(err, GrammarError::Io(_)));
    }
}
