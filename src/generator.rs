//! Bounded enumeration of L(G).
//!
//! The generator runs a breadth-first search over leftmost rewrites starting
//! from `[S]`. A visited set makes every sentential form expand at most once,
//! and a candidate whose terminal count already exceeds the bound is dropped,
//! since no rewrite removes terminals. Together these keep the search finite
//! for left-recursive and cyclic grammars.
//!
//! Only terminals are counted when pruning. A grammar that can grow the
//! number of non-terminals without emitting terminals (e.g. `A -> AA | ε`)
//! is not bounded by that rule, and the search can exhaust memory on it.
//! For other grammars memory still grows combinatorially with the branching
//! factor and with the bound.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::grammar::{Grammar, SententialForm, Symbol, render_form};

/// Configuration options for a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Maximum number of terminal symbols in an accepted word
    pub max_length: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig { max_length: 10 }
    }
}

/// Counters collected during one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Distinct sentential forms expanded or accepted
    pub visited: usize,
    /// Candidates pushed onto the frontier
    pub enqueued: usize,
    /// Candidates dropped because their terminal count exceeded the bound
    pub pruned: usize,
    /// Dequeued forms skipped because they were already visited
    pub duplicates: usize,
}

/// The words of L(G) within the bound, in (length, lexicographic) order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Language {
    words: Vec<SententialForm>,
    stats: GenerationStats,
    /// Symbol separator of the grammar the words came from
    #[serde(skip)]
    separator: &'static str,
}

impl Language {
    pub fn words(&self) -> &[SententialForm] {
        &self.words
    }

    pub fn into_words(self) -> Vec<SententialForm> {
        self.words
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &[Symbol]) -> bool {
        self.words
            .binary_search_by(|w| compare_words(w, word))
            .is_ok()
    }

    /// Words rendered as text, `ε` standing for the empty word
    pub fn rendered(&self) -> Vec<String> {
        self.words
            .iter()
            .map(|w| render_form(w, self.separator))
            .collect()
    }
}

/// Shorter words first, equal lengths in lexicographic symbol order
fn compare_words(a: &[Symbol], b: &[Symbol]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// One linear pass over a form: the leftmost non-terminal, if any, and the
/// number of terminals.
struct Scan {
    leftmost_non_terminal: Option<usize>,
    terminals: usize,
}

fn scan(grammar: &Grammar, form: &[Symbol]) -> Scan {
    let mut leftmost_non_terminal = None;
    let mut terminals = 0;
    for (pos, symbol) in form.iter().enumerate() {
        if grammar.is_terminal(symbol) {
            terminals += 1;
        } else if leftmost_non_terminal.is_none() {
            leftmost_non_terminal = Some(pos);
        }
    }
    Scan {
        leftmost_non_terminal,
        terminals,
    }
}

/// `form[..pos] + rhs + form[pos + 1..]`
fn rewrite(form: &[Symbol], pos: usize, rhs: &[Symbol]) -> SententialForm {
    let mut candidate = Vec::with_capacity(form.len() - 1 + rhs.len());
    candidate.extend_from_slice(&form[..pos]);
    candidate.extend_from_slice(rhs);
    candidate.extend_from_slice(&form[pos + 1..]);
    candidate
}

/// Enumerates the language of a grammar up to a terminal-count bound
#[derive(Debug, Clone)]
pub struct Generator<'g> {
    grammar: &'g Grammar,
    config: GeneratorConfig,
}

impl<'g> Generator<'g> {
    pub fn new(grammar: &'g Grammar, config: GeneratorConfig) -> Self {
        Generator { grammar, config }
    }

    /// Run the search to completion. An empty language is a valid result.
    pub fn run(&self) -> Language {
        let grammar = self.grammar;
        let max_length = self.config.max_length;
        debug!(
            "generating L(G) from {} with max_length = {}",
            grammar.start(),
            max_length
        );

        let mut stats = GenerationStats::default();
        let mut frontier: VecDeque<SententialForm> = VecDeque::new();
        let mut visited: HashSet<SententialForm> = HashSet::new();
        let mut language: HashSet<SententialForm> = HashSet::new();

        frontier.push_back(vec![grammar.start().clone()]);

        while let Some(form) = frontier.pop_front() {
            if !visited.insert(form.clone()) {
                stats.duplicates += 1;
                continue;
            }

            let Scan {
                leftmost_non_terminal,
                terminals,
            } = scan(grammar, &form);

            let Some(pos) = leftmost_non_terminal else {
                if form.len() <= max_length {
                    trace!("accept {}", grammar.render(&form));
                    language.insert(form);
                }
                continue;
            };

            for rhs in grammar.productions_for(&form[pos]) {
                // The replaced symbol is a non-terminal, so the candidate's
                // terminals are the form's plus the right-hand side's.
                let candidate_terminals =
                    terminals + rhs.iter().filter(|s| grammar.is_terminal(s)).count();
                if candidate_terminals > max_length {
                    stats.pruned += 1;
                    continue;
                }

                let candidate = rewrite(&form, pos, rhs);
                if !visited.contains(&candidate) {
                    trace!("{} => {}", grammar.render(&form), grammar.render(&candidate));
                    frontier.push_back(candidate);
                    stats.enqueued += 1;
                }
            }
        }

        stats.visited = visited.len();

        let mut words: Vec<SententialForm> = language.into_iter().collect();
        words.sort_by(|a, b| compare_words(a, b));

        info!(
            "found {} words (visited {}, pruned {}, duplicates {})",
            words.len(),
            stats.visited,
            stats.pruned,
            stats.duplicates
        );

        Language {
            words,
            stats,
            separator: grammar.symbol_separator(),
        }
    }
}

/// Every terminal word derivable from the start symbol with at most
/// `max_length` terminals, each once, ordered by (length, lexicographic).
pub fn generate(grammar: &Grammar, max_length: usize) -> Vec<SententialForm> {
    Generator::new(grammar, GeneratorConfig { max_length })
        .run()
        .into_words()
}
