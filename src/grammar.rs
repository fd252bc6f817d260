use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::{GrammarError, Result};

/// Markers accepted in a production line for the empty right-hand side.
pub const EPSILON_MARKERS: [&str; 2] = ["ε", "λ"];

/// Arrows accepted between the two sides of a production line
pub const ARROWS: [&str; 3] = ["->", "→", "::="];

/// `LHS -> body`, also accepting `→` and `::=`. The left-hand side ends at
/// the first arrow.
static PRODUCTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<lhs>\S+?)\s*(?:->|→|::=)\s*(?P<rhs>.*?)\s*$")
        .expect("production regex is valid")
});

/// An atomic grammar symbol. Symbols may span several characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Symbols must be non-empty, free of whitespace, `|`, `,` and arrows,
    /// and must not shadow an epsilon marker.
    fn check_name(&self) -> Result<()> {
        let name = self.as_str();
        if name.is_empty()
            || name.chars().any(|c| c.is_whitespace() || c == '|' || c == ',')
            || ARROWS.iter().any(|arrow| name.contains(arrow))
            || EPSILON_MARKERS.contains(&name)
        {
            return Err(GrammarError::InvalidSymbol(name.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol(name.to_string())
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol(name)
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol(c.to_string())
    }
}

/// The category a declared symbol belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
}

/// A sequence of symbols; the empty form is epsilon.
pub type SententialForm = Vec<Symbol>;

/// Render a form as text, `separator` between symbols. The empty form
/// renders as `ε`. See [`Grammar::render`] for the separator a grammar uses.
pub fn render_form(form: &[Symbol], separator: &str) -> String {
    if form.is_empty() {
        return EPSILON_MARKERS[0].to_string();
    }
    form.iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

/// A grammar G = (VT, VN, S, P).
///
/// Construction validates that VT and VN are disjoint, that S is in VN and
/// that every production only uses declared symbols. A `Grammar` obtained
/// through serde skips those checks; call [`Grammar::validate`] on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    terminals: BTreeSet<Symbol>,
    non_terminals: BTreeSet<Symbol>,
    start: Symbol,
    /// Right-hand sides per non-terminal, in declaration order
    productions: BTreeMap<Symbol, Vec<SententialForm>>,
}

impl Grammar {
    /// Create a grammar without productions
    pub fn new<T, N, S>(terminals: T, non_terminals: N, start: S) -> Result<Self>
    where
        T: IntoIterator,
        T::Item: Into<Symbol>,
        N: IntoIterator,
        N::Item: Into<Symbol>,
        S: Into<Symbol>,
    {
        let grammar = Grammar {
            terminals: terminals.into_iter().map(Into::into).collect(),
            non_terminals: non_terminals.into_iter().map(Into::into).collect(),
            start: start.into(),
            productions: BTreeMap::new(),
        };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Check every grammar invariant
    pub fn validate(&self) -> Result<()> {
        for symbol in self.terminals.iter().chain(&self.non_terminals) {
            symbol.check_name()?;
        }

        let shared: Vec<String> = self
            .terminals
            .intersection(&self.non_terminals)
            .map(|s| s.to_string())
            .collect();
        if !shared.is_empty() {
            return Err(GrammarError::OverlappingSymbols(shared.join(", ")));
        }

        if !self.non_terminals.contains(&self.start) {
            return Err(GrammarError::StartNotNonTerminal(self.start.to_string()));
        }

        for (lhs, alternatives) in &self.productions {
            if !self.non_terminals.contains(lhs) {
                return Err(GrammarError::UnknownNonTerminal(lhs.to_string()));
            }
            for rhs in alternatives {
                self.check_declared(rhs)?;
            }
        }

        Ok(())
    }

    fn check_declared(&self, form: &[Symbol]) -> Result<()> {
        match form.iter().find(|s| self.kind_of(s).is_none()) {
            Some(unknown) => Err(GrammarError::UndeclaredSymbol(unknown.to_string())),
            None => Ok(()),
        }
    }

    /// Append `lhs -> rhs` to the productions of `lhs`
    pub fn add_production<L, R>(&mut self, lhs: L, rhs: R) -> Result<&mut Self>
    where
        L: Into<Symbol>,
        R: IntoIterator,
        R::Item: Into<Symbol>,
    {
        let lhs = lhs.into();
        if !self.non_terminals.contains(&lhs) {
            return Err(GrammarError::UnknownNonTerminal(lhs.to_string()));
        }
        let rhs: SententialForm = rhs.into_iter().map(Into::into).collect();
        self.check_declared(&rhs)?;

        self.productions.entry(lhs).or_default().push(rhs);
        Ok(self)
    }

    /// Parse and add a production line such as `X -> 1 | 1X | ε`.
    ///
    /// Each alternative is split into symbols by greedy longest match against
    /// the declared symbols; whitespace between symbols is ignored. The match
    /// does not backtrack: with `a`, `ab` and `bc` declared, `abc` is read as
    /// `ab` followed by an undeclared `c`, so write `a bc` instead. An
    /// alternative that is blank or consists of an epsilon marker is the
    /// empty production.
    pub fn add_production_str(&mut self, line: &str) -> Result<&mut Self> {
        let captures = PRODUCTION_REGEX
            .captures(line)
            .ok_or_else(|| GrammarError::Parse(format!("expected `LHS -> RHS`, got `{}`", line.trim())))?;
        let lhs = Symbol::new(&captures["lhs"]);
        if !self.non_terminals.contains(&lhs) {
            return Err(GrammarError::UnknownNonTerminal(lhs.to_string()));
        }

        let mut parsed = Vec::new();
        for alternative in captures["rhs"].split('|') {
            parsed.push(self.tokenize(alternative.trim())?);
        }

        let alternatives = self.productions.entry(lhs).or_default();
        alternatives.extend(parsed);
        Ok(self)
    }

    fn tokenize(&self, body: &str) -> Result<SententialForm> {
        if body.is_empty() || EPSILON_MARKERS.contains(&body) {
            return Ok(Vec::new());
        }

        let mut form = Vec::new();
        let mut rest = body.trim_start();
        while !rest.is_empty() {
            let longest = self
                .terminals
                .iter()
                .chain(&self.non_terminals)
                .filter(|s| rest.starts_with(s.as_str()))
                .max_by_key(|s| s.as_str().len())
                .ok_or_else(|| {
                    let token = rest.split_whitespace().next().unwrap_or(rest);
                    GrammarError::UndeclaredSymbol(token.to_string())
                })?;
            rest = rest[longest.as_str().len()..].trim_start();
            form.push(longest.clone());
        }
        Ok(form)
    }

    pub fn kind_of(&self, symbol: &Symbol) -> Option<SymbolKind> {
        if self.terminals.contains(symbol) {
            Some(SymbolKind::Terminal)
        } else if self.non_terminals.contains(symbol) {
            Some(SymbolKind::NonTerminal)
        } else {
            None
        }
    }

    pub fn is_terminal(&self, symbol: &Symbol) -> bool {
        self.terminals.contains(symbol)
    }

    pub fn is_non_terminal(&self, symbol: &Symbol) -> bool {
        self.non_terminals.contains(symbol)
    }

    /// Right-hand sides for `non_terminal`; empty when it has none
    pub fn productions_for(&self, non_terminal: &Symbol) -> &[SententialForm] {
        self.productions
            .get(non_terminal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn productions(&self) -> &BTreeMap<Symbol, Vec<SententialForm>> {
        &self.productions
    }

    /// Total number of right-hand sides over all non-terminals
    pub fn production_count(&self) -> usize {
        self.productions.values().map(Vec::len).sum()
    }

    pub fn terminals(&self) -> &BTreeSet<Symbol> {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &BTreeSet<Symbol> {
        &self.non_terminals
    }

    pub fn start(&self) -> &Symbol {
        &self.start
    }

    /// Empty when every declared symbol is a single character, a space
    /// otherwise. Applied to all forms alike, so distinct forms never render
    /// the same.
    pub fn symbol_separator(&self) -> &'static str {
        let multi_char = self
            .terminals
            .iter()
            .chain(&self.non_terminals)
            .any(|s| s.as_str().chars().count() > 1);
        if multi_char { " " } else { "" }
    }

    /// Render a form with this grammar's separator
    pub fn render(&self, form: &[Symbol]) -> String {
        render_form(form, self.symbol_separator())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<Symbol>| {
            set.iter()
                .map(Symbol::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        writeln!(f, "G = (VT, VN, S, P)")?;
        writeln!(f, "VT = {{ {} }}", join(&self.terminals))?;
        writeln!(f, "VN = {{ {} }}", join(&self.non_terminals))?;
        writeln!(f, "S = {}", self.start)?;
        write!(f, "P:")?;
        for (lhs, alternatives) in &self.productions {
            let bodies: Vec<String> = alternatives.iter().map(|rhs| self.render(rhs)).collect();
            write!(f, "\n  {} -> {}", lhs, bodies.join(" | "))?;
        }
        Ok(())
    }
}

/// Split a list of symbol names separated by commas and/or whitespace.
/// Surrounding braces are accepted, so `{0, 1}` and `0 1` are equivalent.
pub fn parse_symbol_list(text: &str) -> Result<Vec<Symbol>> {
    let inner = text.trim().trim_start_matches('{').trim_end_matches('}');

    let mut symbols: Vec<Symbol> = Vec::new();
    for name in inner.split(|c: char| c == ',' || c.is_whitespace()) {
        if name.is_empty() {
            continue;
        }
        let symbol = Symbol::new(name);
        symbol.check_name()?;
        if symbols.contains(&symbol) {
            return Err(GrammarError::DuplicateSymbol(name.to_string()));
        }
        symbols.push(symbol);
    }

    if symbols.is_empty() {
        return Err(GrammarError::EmptySymbolSet);
    }
    Ok(symbols)
}

/// Builder for constructing Grammar instances
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    terminals: Vec<Symbol>,
    non_terminals: Vec<Symbol>,
    start: Option<Symbol>,
    rules: Vec<Rule>,
}

#[derive(Debug)]
enum Rule {
    Line(String),
    Symbols(Symbol, SententialForm),
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder::default()
    }

    pub fn terminals<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.terminals.extend(symbols.into_iter().map(Into::into));
        self
    }

    pub fn non_terminals<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.non_terminals.extend(symbols.into_iter().map(Into::into));
        self
    }

    pub fn start(mut self, symbol: impl Into<Symbol>) -> Self {
        self.start = Some(symbol.into());
        self
    }

    /// Add a production line, e.g. `X -> 1 | 1X`
    pub fn rule(mut self, line: &str) -> Self {
        self.rules.push(Rule::Line(line.to_string()));
        self
    }

    /// Add one production given as an explicit symbol sequence
    pub fn production(mut self, lhs: &str, rhs: &[&str]) -> Self {
        let rhs = rhs.iter().copied().map(Symbol::from).collect();
        self.rules.push(Rule::Symbols(Symbol::from(lhs), rhs));
        self
    }

    /// Build and validate the grammar
    pub fn build(self) -> Result<Grammar> {
        let start = self
            .start
            .ok_or_else(|| GrammarError::InvalidGrammar("start symbol not set".to_string()))?;
        let mut grammar = Grammar::new(self.terminals, self.non_terminals, start)?;

        for rule in self.rules {
            match rule {
                Rule::Line(line) => grammar.add_production_str(&line)?,
                Rule::Symbols(lhs, rhs) => grammar.add_production(lhs, rhs)?,
            };
        }

        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn syms(names: &[&str]) -> SententialForm {
        names.iter().copied().map(Symbol::from).collect()
    }

    fn binary_grammar() -> Grammar {
        Grammar::new(["0", "1"], ["S", "X", "Y"], "S").unwrap()
    }

    #[test]
    fn test_parse_production_line() {
        let mut grammar = binary_grammar();
        grammar.add_production_str("X -> 1 | 1X").unwrap();

        let x = Symbol::from("X");
        assert_eq!(
            grammar.productions_for(&x),
            &[syms(&["1"]), syms(&["1", "X"])]
        );
    }

    #[test]
    fn test_arrow_variants_and_spacing() {
        let mut grammar = binary_grammar();
        grammar.add_production_str("S->XY").unwrap();
        grammar.add_production_str("Y → 0").unwrap();
        grammar.add_production_str("  X ::= 1 X  ").unwrap();

        assert_eq!(grammar.productions_for(&"S".into()), &[syms(&["X", "Y"])]);
        assert_eq!(grammar.productions_for(&"Y".into()), &[syms(&["0"])]);
        assert_eq!(grammar.productions_for(&"X".into()), &[syms(&["1", "X"])]);
    }

    #[test]
    fn test_epsilon_alternatives() {
        let mut grammar = Grammar::new(["a"], ["S"], "S").unwrap();
        grammar.add_production_str("S -> aS | ε").unwrap();
        grammar.add_production_str("S -> λ |").unwrap();

        assert_eq!(
            grammar.productions_for(&"S".into()),
            &[syms(&["a", "S"]), vec![], vec![], vec![]]
        );
    }

    #[test]
    fn test_longest_match_tokenization() {
        let mut grammar = Grammar::new(["a", "ab", "b"], ["S", "Sx"], "S").unwrap();
        grammar.add_production_str("S -> abSx | a b").unwrap();

        assert_eq!(
            grammar.productions_for(&"S".into()),
            &[syms(&["ab", "Sx"]), syms(&["a", "b"])]
        );
    }

    #[test]
    fn test_undeclared_symbol_in_body() {
        let mut grammar = binary_grammar();
        let err = grammar.add_production_str("S -> X2Y").unwrap_err();
        assert!(matches!(err, GrammarError::UndeclaredSymbol(ref s) if s == "2Y"));
    }

    #[test]
    fn test_unknown_left_hand_side() {
        let mut grammar = binary_grammar();
        let err = grammar.add_production_str("Z -> 1").unwrap_err();
        assert!(matches!(err, GrammarError::UnknownNonTerminal(ref s) if s == "Z"));

        let err = grammar.add_production("0", ["1"]).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownNonTerminal(_)));
    }

    #[test]
    fn test_malformed_production_line() {
        let mut grammar = binary_grammar();
        for line in ["S", "-> 1", "S = 1", ""] {
            let err = grammar.add_production_str(line).unwrap_err();
            assert!(matches!(err, GrammarError::Parse(_)), "line {:?}", line);
        }
    }

    #[test]
    fn test_overlapping_symbol_sets() {
        let err = Grammar::new(["a", "S"], ["S"], "S").unwrap_err();
        assert!(matches!(err, GrammarError::OverlappingSymbols(ref s) if s == "S"));
    }

    #[test]
    fn test_start_must_be_non_terminal() {
        let err = Grammar::new(["a"], ["S"], "a").unwrap_err();
        assert!(matches!(err, GrammarError::StartNotNonTerminal(_)));

        let err = Grammar::new(["a"], ["S"], "T").unwrap_err();
        assert!(matches!(err, GrammarError::StartNotNonTerminal(_)));
    }

    #[test]
    fn test_reserved_symbol_names() {
        for bad in ["ε", "a b", "a|b", "", "A->B", "x→y", "N::=M"] {
            let err = Grammar::new([bad], ["S"], "S").unwrap_err();
            assert!(matches!(err, GrammarError::InvalidSymbol(_)), "symbol {:?}", bad);
        }
    }

    #[test]
    fn test_symbol_kinds() {
        let grammar = binary_grammar();
        assert_eq!(grammar.kind_of(&"0".into()), Some(SymbolKind::Terminal));
        assert_eq!(grammar.kind_of(&"X".into()), Some(SymbolKind::NonTerminal));
        assert_eq!(grammar.kind_of(&"Q".into()), None);
        assert!(grammar.is_terminal(&"1".into()));
        assert!(grammar.is_non_terminal(&"S".into()));
    }

    #[test]
    fn test_parse_symbol_list() {
        assert_eq!(parse_symbol_list("0,1").unwrap(), syms(&["0", "1"]));
        assert_eq!(parse_symbol_list(" { S, X Y } ").unwrap(), syms(&["S", "X", "Y"]));
        assert!(matches!(parse_symbol_list(" , "), Err(GrammarError::EmptySymbolSet)));
        assert!(matches!(parse_symbol_list("a|b"), Err(GrammarError::InvalidSymbol(_))));
        assert!(matches!(
            parse_symbol_list("a, b, a"),
            Err(GrammarError::DuplicateSymbol(ref s)) if s == "a"
        ));
    }

    #[test]
    fn test_builder() {
        let grammar = GrammarBuilder::new()
            .terminals(["0", "1"])
            .non_terminals(["S", "X", "Y"])
            .start("S")
            .rule("S -> XY")
            .rule("X -> 1 | 1X")
            .production("Y", &["0"])
            .build()
            .unwrap();

        assert_eq!(grammar.production_count(), 4);
        assert_eq!(grammar.start(), &Symbol::from("S"));
    }

    #[test]
    fn test_builder_without_start() {
        let err = GrammarBuilder::new().terminals(["a"]).non_terminals(["S"]).build().unwrap_err();
        assert!(matches!(err, GrammarError::InvalidGrammar(_)));
    }

    #[test]
    fn test_validate_after_deserialize() {
        let json = r#"{
            "terminals": ["a"],
            "non_terminals": ["S"],
            "start": "S",
            "productions": { "S": [["a", "T"]] }
        }"#;
        let grammar: Grammar = serde_json::from_str(json).unwrap();
        assert!(matches!(grammar.validate(), Err(GrammarError::UndeclaredSymbol(ref s)) if s == "T"));
    }

    #[test]
    fn test_render_form() {
        assert_eq!(render_form(&syms(&["1", "X", "0"]), ""), "1X0");
        assert_eq!(render_form(&syms(&["id", "+", "id"]), " "), "id + id");
        assert_eq!(render_form(&[], " "), "ε");
    }

    #[test]
    fn test_separator_follows_declared_symbols() {
        let grammar = binary_grammar();
        assert_eq!(grammar.symbol_separator(), "");
        assert_eq!(grammar.render(&syms(&["1", "X", "0"])), "1X0");

        // `ab` alone and `a b` must stay distinguishable
        let grammar = Grammar::new(["a", "b", "ab"], ["S"], "S").unwrap();
        assert_eq!(grammar.symbol_separator(), " ");
        assert_eq!(grammar.render(&syms(&["ab"])), "ab");
        assert_eq!(grammar.render(&syms(&["a", "b"])), "a b");
    }

    #[test]
    fn test_left_hand_side_with_punctuation() {
        let mut grammar = Grammar::new(["a", "-"], ["A-B", "S:"], "A-B").unwrap();
        grammar.add_production_str("A-B -> a - a").unwrap();
        grammar.add_production_str("S: -> a").unwrap();
        grammar.add_production_str("S:->A-B").unwrap();

        assert_eq!(
            grammar.productions_for(&"A-B".into()),
            &[syms(&["a", "-", "a"])]
        );
        assert_eq!(
            grammar.productions_for(&"S:".into()),
            &[syms(&["a"]), syms(&["A-B"])]
        );
    }

    #[test]
    fn test_no_backtracking_in_tokenization() {
        let mut grammar = Grammar::new(["a", "ab"], ["bc", "S"], "S").unwrap();
        let err = grammar.add_production_str("S -> abc").unwrap_err();
        assert!(matches!(err, GrammarError::UndeclaredSymbol(ref s) if s == "c"));

        grammar.add_production_str("S -> a bc").unwrap();
        assert_eq!(grammar.productions_for(&"S".into()), &[syms(&["a", "bc"])]);
    }

    #[test]
    fn test_display() {
        let mut grammar = Grammar::new(["a"], ["S"], "S").unwrap();
        grammar.add_production_str("S -> aS | ε").unwrap();

        assert_eq!(
            grammar.to_string(),
            "G = (VT, VN, S, P)\nVT = { a }\nVN = { S }\nS = S\nP:\n  S -> aS | ε"
        );
    }
}
