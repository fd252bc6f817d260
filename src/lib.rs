//! Langgen enumerates the language of a formal grammar up to a bound.
//!
//! Given G = (VT, VN, S, P) and a maximum length, it returns every terminal
//! word derivable from S with at most that many terminals, each exactly once,
//! ordered by length and then lexicographically. The search is breadth-first
//! over leftmost rewrites; see [`generator`] for how it stays finite.
//!
//! # Example
//!
//! ```rust
//! use langgen::{GrammarBuilder, generate};
//!
//! let grammar = GrammarBuilder::new()
//!     .terminals(["0", "1"])
//!     .non_terminals(["S", "X", "Y"])
//!     .start("S")
//!     .rule("S -> XY")
//!     .rule("X -> 1 | 1X")
//!     .rule("Y -> 0")
//!     .build()?;
//!
//! let words: Vec<String> = generate(&grammar, 4).iter().map(|w| grammar.render(w)).collect();
//! assert_eq!(words, ["10", "110", "1110"]);
//! # Ok::<(), langgen::GrammarError>(())
//! ```

pub mod generator;
pub mod grammar;
pub mod interactive;
pub mod utils;

pub use generator::{GenerationStats, Generator, GeneratorConfig, Language, generate};
pub use grammar::{
    Grammar, GrammarBuilder, SententialForm, Symbol, SymbolKind, parse_symbol_list, render_form,
};
pub use utils::{
    GrammarError, Result, format_language, parse_max_length, render_json, render_text,
    write_output,
};
