// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Low-level DFA kernel over bit-vector alphabets
//!
//! States are indexed by an integer from 0 to N-1 where N is the number of
//! states. The alphabet of an automaton over `V` bit positions is the set of
//! `V`-bit symbols; bit `j` of a symbol is the value read at BDD index `j`.
//! Transitions are stored as a dense row per state, so every automaton is
//! total by construction.
//!
//! Construction goes through [DfaBuilder], which mirrors the staged surface
//! of BDD-based DFA packages: declare the state count and width up front,
//! then for each state in order store a number of exception transitions
//! (labelled by [bit patterns](BitPattern) over `{0, 1, X}`) followed by a
//! default successor for every symbol not matched by an exception. A final
//! status string with one `'+'` or `'-'` per state fixes acceptance.
//!
//! The kernel is purely value-like: every operation returns a fresh automaton
//! and leaves its operands untouched. [minimize](Dfa::minimize) renumbers
//! states canonically (breadth-first from the initial state), so two automata
//! with the same language minimize to structurally equal values.
//!

use std::collections::{HashMap, VecDeque};
use std::fmt::Display;

use crate::errors::KernelError;
use crate::minimizer::Minimizer;

/// Widest supported alphabet; transition rows are dense in `2^num_vars`.
const MAX_VARS: usize = 16;

///
/// One position of a transition label
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Bit {
    /// The bit must be 0.
    Zero,
    /// The bit must be 1.
    One,
    /// The bit may be either value.
    Any,
}

///
/// Transition label over `{0, 1, X}`
///
/// Position `j` of a pattern constrains the symbol bit at BDD index `j`.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BitPattern {
    bits: Vec<Bit>,
}

impl BitPattern {
    /// Pattern of the given width with every position unconstrained.
    pub fn any(width: usize) -> Self {
        BitPattern {
            bits: vec![Bit::Any; width],
        }
    }

    /// Fully constrained pattern: position `j` is bit `j` of `symbol`.
    pub fn fixed(width: usize, symbol: u32) -> Self {
        let bits = (0..width)
            .map(|j| {
                if (symbol >> j) & 1 == 1 {
                    Bit::One
                } else {
                    Bit::Zero
                }
            })
            .collect();
        BitPattern { bits }
    }

    /// Number of bit positions.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Constrain (or relax) one position.
    pub fn set(&mut self, index: usize, bit: Bit) -> &mut Self {
        self.bits[index] = bit;
        self
    }

    /// Check whether a symbol matches this pattern.
    pub fn matches(&self, symbol: u32) -> bool {
        self.bits.iter().enumerate().all(|(j, b)| match b {
            Bit::Any => true,
            Bit::One => (symbol >> j) & 1 == 1,
            Bit::Zero => (symbol >> j) & 1 == 0,
        })
    }

    /// All symbols matched by this pattern, in increasing order.
    pub fn symbols(&self) -> Vec<u32> {
        let mut out = vec![0u32];
        for (j, b) in self.bits.iter().enumerate() {
            match b {
                Bit::Zero => {}
                Bit::One => {
                    for s in &mut out {
                        *s |= 1 << j;
                    }
                }
                Bit::Any => {
                    let with_bit: Vec<u32> = out.iter().map(|s| s | (1 << j)).collect();
                    out.extend(with_bit);
                }
            }
        }
        out.sort_unstable();
        out
    }
}

impl Display for BitPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.bits {
            let c = match b {
                Bit::Zero => '0',
                Bit::One => '1',
                Bit::Any => 'X',
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

///
/// Boolean combinator for [Dfa::product]
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BoolOp {
    /// Intersection of languages.
    And,
    /// Union of languages.
    Or,
}

///
/// Deterministic finite automaton over a bit-vector alphabet
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    num_states: usize,
    num_vars: usize,
    initial_state: usize,
    accepting: Box<[bool]>,
    // transitions[s * 2^num_vars + symbol] = successor of s on symbol
    transitions: Box<[usize]>,
}

impl Dfa {
    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Number of bit positions in a symbol.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of symbols, `2^num_vars`.
    pub fn alphabet_size(&self) -> usize {
        1 << self.num_vars
    }

    /// Index of the initial state.
    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    /// Check whether a state is accepting.
    pub fn is_accepting(&self, state: usize) -> bool {
        self.accepting[state]
    }

    // Flip one state's status; used by the trimming pre-acceptance pass.
    pub(crate) fn set_accepting(&mut self, state: usize, accepting: bool) {
        self.accepting[state] = accepting;
    }

    /// Successor of a state on a symbol.
    pub fn next_state(&self, state: usize, symbol: u32) -> usize {
        self.transitions[state * self.alphabet_size() + symbol as usize]
    }

    /// Run a word from the initial state and report acceptance.
    pub fn accepts(&self, word: &[u32]) -> bool {
        let s = word
            .iter()
            .fold(self.initial_state, |s, &c| self.next_state(s, c));
        self.accepting[s]
    }

    /// Complement the language in place by flipping every status.
    pub fn negate(&mut self) {
        for a in self.accepting.iter_mut() {
            *a = !*a;
        }
    }

    /// Complement of this automaton.
    pub fn negation(&self) -> Dfa {
        let mut out = self.clone();
        out.negate();
        out
    }

    ///
    /// Product automaton under a boolean combinator
    ///
    /// Only the reachable part of the pair graph is constructed.
    ///
    /// # Errors
    ///
    /// [KernelError::WidthMismatch] if the operands have different widths.
    ///
    pub fn product(&self, other: &Dfa, op: BoolOp) -> Result<Dfa, KernelError> {
        if self.num_vars != other.num_vars {
            return Err(KernelError::WidthMismatch {
                expected: self.num_vars,
                actual: other.num_vars,
            });
        }
        let alpha = self.alphabet_size();
        let mut ids: HashMap<(usize, usize), usize> = HashMap::new();
        let mut pairs = vec![(self.initial_state, other.initial_state)];
        ids.insert(pairs[0], 0);
        let mut transitions = Vec::new();
        let mut accepting = Vec::new();
        let mut i = 0;
        while i < pairs.len() {
            let (a, b) = pairs[i];
            accepting.push(match op {
                BoolOp::And => self.accepting[a] && other.accepting[b],
                BoolOp::Or => self.accepting[a] || other.accepting[b],
            });
            for symbol in 0..alpha as u32 {
                let q = (self.next_state(a, symbol), other.next_state(b, symbol));
                let id = *ids.entry(q).or_insert_with(|| {
                    pairs.push(q);
                    pairs.len() - 1
                });
                transitions.push(id);
            }
            i += 1;
        }
        Ok(Dfa {
            num_states: pairs.len(),
            num_vars: self.num_vars,
            initial_state: 0,
            accepting: accepting.into(),
            transitions: transitions.into(),
        })
    }

    ///
    /// Existentially project away one bit position
    ///
    /// The result reads symbols one bit narrower: position `index` is removed
    /// and higher positions shift down by one. Projection makes the automaton
    /// nondeterministic, so the result is re-determinized by subset
    /// construction; callers normally [minimize](Self::minimize) afterwards.
    ///
    /// # Panics
    ///
    /// If `index >= num_vars`.
    ///
    pub fn project(&self, index: usize) -> Dfa {
        assert!(index < self.num_vars, "projection index out of range");
        let new_vars = self.num_vars - 1;
        let new_alpha = 1usize << new_vars;
        let low_mask = (1u32 << index) - 1;

        // narrow symbol -> the two wide symbols it stands for
        let widen = |symbol: u32, bit: u32| {
            let high = (symbol & !low_mask) << 1;
            let low = symbol & low_mask;
            high | (bit << index) | low
        };

        let mut ids: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut sets = vec![vec![self.initial_state]];
        ids.insert(sets[0].clone(), 0);
        let mut transitions = Vec::new();
        let mut accepting = Vec::new();
        let mut i = 0;
        while i < sets.len() {
            let set = sets[i].clone();
            accepting.push(set.iter().any(|&s| self.accepting[s]));
            for symbol in 0..new_alpha as u32 {
                let mut succ: Vec<usize> = set
                    .iter()
                    .flat_map(|&s| {
                        [
                            self.next_state(s, widen(symbol, 0)),
                            self.next_state(s, widen(symbol, 1)),
                        ]
                    })
                    .collect();
                succ.sort_unstable();
                succ.dedup();
                let id = *ids.entry(succ.clone()).or_insert_with(|| {
                    sets.push(succ);
                    sets.len() - 1
                });
                transitions.push(id);
            }
            i += 1;
        }
        Dfa {
            num_states: sets.len(),
            num_vars: new_vars,
            initial_state: 0,
            accepting: accepting.into(),
            transitions: transitions.into(),
        }
    }

    ///
    /// Permute the bit positions of every symbol
    ///
    /// `map[j]` is the new position of the bit currently at position `j`.
    ///
    /// # Errors
    ///
    /// [KernelError::BadIndexPermutation] if `map` is not a permutation of
    /// `[0, num_vars)`.
    ///
    pub fn replace_indices(&self, map: &[usize]) -> Result<Dfa, KernelError> {
        let n = self.num_vars;
        let mut seen = vec![false; n];
        if map.len() != n || map.iter().any(|&j| j >= n || std::mem::replace(&mut seen[j], true)) {
            return Err(KernelError::BadIndexPermutation { num_vars: n });
        }
        let alpha = self.alphabet_size();
        let remap = |symbol: u32| {
            let mut out = 0u32;
            for (j, &k) in map.iter().enumerate() {
                out |= ((symbol >> j) & 1) << k;
            }
            out
        };
        let mut transitions = vec![0usize; self.num_states * alpha];
        for s in 0..self.num_states {
            for symbol in 0..alpha as u32 {
                transitions[s * alpha + remap(symbol) as usize] = self.next_state(s, symbol);
            }
        }
        Ok(Dfa {
            num_states: self.num_states,
            num_vars: n,
            initial_state: self.initial_state,
            accepting: self.accepting.clone(),
            transitions: transitions.into(),
        })
    }

    ///
    /// Minimize the automaton
    ///
    /// Unreachable states are removed, language-equivalent states are merged,
    /// and the result is renumbered breadth-first from the initial state.
    /// The renumbering makes minimization canonical: automata with the same
    /// language minimize to equal values, and minimization is idempotent.
    ///
    pub fn minimize(&self) -> Dfa {
        let reachable = self.reachable_order();
        let mut new_id = vec![usize::MAX; self.num_states];
        for (i, &s) in reachable.iter().enumerate() {
            new_id[s] = i;
        }
        let n = reachable.len();
        let alpha = self.alphabet_size();
        let mut transitions = vec![0usize; n * alpha];
        let mut accepting = vec![false; n];
        for (i, &s) in reachable.iter().enumerate() {
            accepting[i] = self.accepting[s];
            for symbol in 0..alpha {
                transitions[i * alpha + symbol] = new_id[self.transitions[s * alpha + symbol]];
            }
        }

        let delta = |s: usize, c: usize| transitions[s * alpha + c];
        let block = Minimizer::new(n, alpha, &delta, &accepting).refine();

        // pick one representative per block and renumber blocks breadth-first
        let mut rep = vec![usize::MAX; n];
        for s in 0..n {
            if rep[block[s]] == usize::MAX {
                rep[block[s]] = s;
            }
        }
        let mut block_id = vec![usize::MAX; n];
        let mut order = VecDeque::new();
        let mut ordered = Vec::new();
        block_id[block[0]] = 0;
        ordered.push(block[0]);
        order.push_back(block[0]);
        while let Some(b) = order.pop_front() {
            for symbol in 0..alpha {
                let t = block[delta(rep[b], symbol)];
                if block_id[t] == usize::MAX {
                    block_id[t] = ordered.len();
                    ordered.push(t);
                    order.push_back(t);
                }
            }
        }
        let m = ordered.len();
        let mut min_transitions = vec![0usize; m * alpha];
        let mut min_accepting = vec![false; m];
        for (i, &b) in ordered.iter().enumerate() {
            min_accepting[i] = accepting[rep[b]];
            for symbol in 0..alpha {
                min_transitions[i * alpha + symbol] = block_id[block[delta(rep[b], symbol)]];
            }
        }
        Dfa {
            num_states: m,
            num_vars: self.num_vars,
            initial_state: 0,
            accepting: min_accepting.into(),
            transitions: min_transitions.into(),
        }
    }

    /// Check whether no accepting state is reachable.
    pub fn is_empty_language(&self) -> bool {
        self.reachable_order()
            .iter()
            .all(|&s| !self.accepting[s])
    }

    ///
    /// The unique non-accepting absorbing state, if present
    ///
    /// Minimized non-universal automata have exactly one.
    ///
    pub fn sink_state(&self) -> Option<usize> {
        (0..self.num_states).find(|&s| {
            !self.accepting[s] && (0..self.alphabet_size() as u32).all(|c| self.next_state(s, c) == s)
        })
    }

    /// A shortest accepted word, or `None` for the empty language.
    pub fn shortest_accepted_word(&self) -> Option<Vec<u32>> {
        let mut back: Vec<Option<(usize, u32)>> = vec![None; self.num_states];
        let mut seen = vec![false; self.num_states];
        let mut queue = VecDeque::new();
        seen[self.initial_state] = true;
        queue.push_back(self.initial_state);
        let mut hit = if self.accepting[self.initial_state] {
            Some(self.initial_state)
        } else {
            None
        };
        while hit.is_none() {
            let s = queue.pop_front()?;
            for symbol in 0..self.alphabet_size() as u32 {
                let t = self.next_state(s, symbol);
                if !seen[t] {
                    seen[t] = true;
                    back[t] = Some((s, symbol));
                    if self.accepting[t] {
                        hit = Some(t);
                        break;
                    }
                    queue.push_back(t);
                }
            }
        }
        let mut word = Vec::new();
        let mut s = hit?;
        while let Some((p, c)) = back[s] {
            word.push(c);
            s = p;
        }
        word.reverse();
        Some(word)
    }

    // Reachable states in breadth-first discovery order.
    fn reachable_order(&self) -> Vec<usize> {
        let mut seen = vec![false; self.num_states];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        seen[self.initial_state] = true;
        queue.push_back(self.initial_state);
        while let Some(s) = queue.pop_front() {
            order.push(s);
            for symbol in 0..self.alphabet_size() as u32 {
                let t = self.next_state(s, symbol);
                if !seen[t] {
                    seen[t] = true;
                    queue.push_back(t);
                }
            }
        }
        order
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} states over {} bit(s), initial s{}",
            self.num_states, self.num_vars, self.initial_state
        )?;
        let width = self.num_vars.max(1);
        for s in 0..self.num_states {
            let mark = if self.accepting[s] { "+" } else { "-" };
            write!(f, "  s{s}{mark}:")?;
            for symbol in 0..self.alphabet_size() as u32 {
                let next = self.next_state(s, symbol);
                write!(f, " {symbol:0width$b}->s{next}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// Exception list of a state under construction.
#[derive(Debug)]
struct RowInConstruction {
    allocated: usize,
    exceptions: Vec<(usize, BitPattern)>,
}

///
/// Staged DFA construction
///
/// Mirrors the setup/store discipline of BDD-based DFA packages: states are
/// defined in index order, each as a batch of exception transitions followed
/// by a default successor, and a final status string fixes acceptance.
///
#[derive(Debug)]
pub struct DfaBuilder {
    num_states: usize,
    num_vars: usize,
    current: RowInConstruction,
    // one dense transition row per completed state
    rows: Vec<Vec<usize>>,
}

impl DfaBuilder {
    ///
    /// Start building an automaton with a fixed state count and symbol width
    ///
    /// # Errors
    ///
    /// [KernelError::TooManyVariables] if the width exceeds the kernel limit.
    ///
    pub fn new(num_states: usize, num_vars: usize) -> Result<Self, KernelError> {
        if num_vars > MAX_VARS {
            return Err(KernelError::TooManyVariables(num_vars));
        }
        Ok(DfaBuilder {
            num_states,
            num_vars,
            current: RowInConstruction {
                allocated: 0,
                exceptions: Vec::new(),
            },
            rows: Vec::new(),
        })
    }

    /// Declare the exception capacity of the state being defined.
    pub fn alloc_exceptions(&mut self, n: usize) -> &mut Self {
        self.current.allocated = n;
        self
    }

    ///
    /// Store one exception transition for the state being defined
    ///
    /// If two exception patterns overlap, the one stored later wins.
    ///
    /// # Errors
    ///
    /// Exception-count overflow, out-of-range target, or width mismatch.
    ///
    pub fn store_exception(
        &mut self,
        target: usize,
        pattern: &BitPattern,
    ) -> Result<&mut Self, KernelError> {
        if self.current.exceptions.len() == self.current.allocated {
            return Err(KernelError::ExceptionOverflow {
                state: self.rows.len(),
                allocated: self.current.allocated,
                stored: self.current.exceptions.len() + 1,
            });
        }
        if target >= self.num_states {
            return Err(KernelError::StateIndexOutOfRange {
                index: target,
                num_states: self.num_states,
            });
        }
        if pattern.width() != self.num_vars {
            return Err(KernelError::WidthMismatch {
                expected: self.num_vars,
                actual: pattern.width(),
            });
        }
        self.current.exceptions.push((target, pattern.clone()));
        Ok(self)
    }

    ///
    /// Finish the state being defined with a default successor
    ///
    /// # Errors
    ///
    /// Out-of-range default target, or more states stored than declared.
    ///
    pub fn store_state(&mut self, default_target: usize) -> Result<&mut Self, KernelError> {
        if self.rows.len() == self.num_states {
            return Err(KernelError::StateIndexOutOfRange {
                index: self.rows.len(),
                num_states: self.num_states,
            });
        }
        if default_target >= self.num_states {
            return Err(KernelError::StateIndexOutOfRange {
                index: default_target,
                num_states: self.num_states,
            });
        }
        let alpha = 1usize << self.num_vars;
        let mut row = vec![default_target; alpha];
        let exceptions = std::mem::take(&mut self.current.exceptions);
        for (target, pattern) in exceptions {
            for symbol in pattern.symbols() {
                row[symbol as usize] = target;
            }
        }
        self.current.allocated = 0;
        self.rows.push(row);
        Ok(self)
    }

    ///
    /// Build the automaton from a status string
    ///
    /// The string has one character per state: `'+'` accepting, `'-'`
    /// rejecting. State 0 is the initial state.
    ///
    /// # Errors
    ///
    /// Status-length mismatch, bad status character, or fewer states stored
    /// than declared.
    ///
    pub fn build(self, statuses: &str) -> Result<Dfa, KernelError> {
        if self.rows.len() != self.num_states {
            return Err(KernelError::StateIndexOutOfRange {
                index: self.rows.len(),
                num_states: self.num_states,
            });
        }
        if statuses.len() != self.num_states {
            return Err(KernelError::StatusLengthMismatch {
                expected: self.num_states,
                actual: statuses.len(),
            });
        }
        let mut accepting = Vec::with_capacity(self.num_states);
        for c in statuses.chars() {
            match c {
                '+' => accepting.push(true),
                '-' => accepting.push(false),
                other => return Err(KernelError::BadStatusChar(other)),
            }
        }
        let transitions: Vec<usize> = self.rows.into_iter().flatten().collect();
        Ok(Dfa {
            num_states: self.num_states,
            num_vars: self.num_vars,
            initial_state: 0,
            accepting: accepting.into(),
            transitions: transitions.into(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Two-state automaton over one bit: words ending in 1.
    fn ends_in_one() -> Dfa {
        let mut b = DfaBuilder::new(2, 1).unwrap();
        b.alloc_exceptions(1);
        b.store_exception(1, &BitPattern::fixed(1, 1)).unwrap();
        b.store_state(0).unwrap();
        b.alloc_exceptions(1);
        b.store_exception(0, &BitPattern::fixed(1, 0)).unwrap();
        b.store_state(1).unwrap();
        b.build("-+").unwrap()
    }

    #[test]
    fn test_builder_and_run() {
        let d = ends_in_one();
        assert_eq!(d.num_states(), 2);
        assert!(!d.accepts(&[]));
        assert!(d.accepts(&[1]));
        assert!(d.accepts(&[0, 1]));
        assert!(!d.accepts(&[1, 0]));
    }

    #[test]
    fn test_exception_overflow() {
        let mut b = DfaBuilder::new(1, 1).unwrap();
        b.alloc_exceptions(0);
        let err = b.store_exception(0, &BitPattern::fixed(1, 0)).unwrap_err();
        assert!(matches!(err, KernelError::ExceptionOverflow { .. }));
    }

    #[test]
    fn test_negation() {
        let d = ends_in_one();
        let n = d.negation();
        assert!(n.accepts(&[]));
        assert!(!n.accepts(&[1]));
        assert!(n.accepts(&[1, 0]));
    }

    #[test]
    fn test_product() {
        // over two bits: bit 0 track ends in 1, bit 1 track ends in 1
        let mut b = DfaBuilder::new(2, 2).unwrap();
        let mut one = BitPattern::any(2);
        one.set(0, Bit::One);
        let mut zero = BitPattern::any(2);
        zero.set(0, Bit::Zero);
        b.alloc_exceptions(1);
        b.store_exception(1, &one).unwrap();
        b.store_state(0).unwrap();
        b.alloc_exceptions(1);
        b.store_exception(0, &zero).unwrap();
        b.store_state(1).unwrap();
        let low = b.build("-+").unwrap();

        let mut b = DfaBuilder::new(2, 2).unwrap();
        let mut one = BitPattern::any(2);
        one.set(1, Bit::One);
        let mut zero = BitPattern::any(2);
        zero.set(1, Bit::Zero);
        b.alloc_exceptions(1);
        b.store_exception(1, &one).unwrap();
        b.store_state(0).unwrap();
        b.alloc_exceptions(1);
        b.store_exception(0, &zero).unwrap();
        b.store_state(1).unwrap();
        let high = b.build("-+").unwrap();

        let both = low.product(&high, BoolOp::And).unwrap();
        assert!(both.accepts(&[3]));
        assert!(!both.accepts(&[1]));
        assert!(!both.accepts(&[2]));
        let either = low.product(&high, BoolOp::Or).unwrap();
        assert!(either.accepts(&[1]));
        assert!(either.accepts(&[2]));
        assert!(!either.accepts(&[0]));
    }

    #[test]
    fn test_project() {
        // language over 2 bits: symbol 3 then end; projecting bit 1 leaves "1"
        let mut b = DfaBuilder::new(3, 2).unwrap();
        b.alloc_exceptions(1);
        b.store_exception(1, &BitPattern::fixed(2, 3)).unwrap();
        b.store_state(2).unwrap();
        b.alloc_exceptions(0);
        b.store_state(2).unwrap();
        b.alloc_exceptions(0);
        b.store_state(2).unwrap();
        let d = b.build("-+-").unwrap();
        let p = d.project(1);
        assert_eq!(p.num_vars(), 1);
        assert!(p.accepts(&[1]));
        assert!(!p.accepts(&[0]));
        assert!(!p.accepts(&[1, 1]));
    }

    #[test]
    fn test_replace_indices() {
        // accepts the single symbol 01 (bit0 = 1); swapping bits gives 10
        let mut b = DfaBuilder::new(3, 2).unwrap();
        b.alloc_exceptions(1);
        b.store_exception(1, &BitPattern::fixed(2, 1)).unwrap();
        b.store_state(2).unwrap();
        b.alloc_exceptions(0);
        b.store_state(2).unwrap();
        b.alloc_exceptions(0);
        b.store_state(2).unwrap();
        let d = b.build("-+-").unwrap();
        let swapped = d.replace_indices(&[1, 0]).unwrap();
        assert!(swapped.accepts(&[2]));
        assert!(!swapped.accepts(&[1]));
        assert!(d.replace_indices(&[0, 0]).is_err());
    }

    #[test]
    fn test_minimize_idempotent_and_canonical() {
        let d = ends_in_one();
        // pad with a redundant copy of state 1 via product with the universe
        let mut b = DfaBuilder::new(1, 1).unwrap();
        b.alloc_exceptions(0);
        b.store_state(0).unwrap();
        let universe = b.build("+").unwrap();
        let padded = d.product(&universe, BoolOp::And).unwrap();
        let m1 = padded.minimize();
        let m2 = m1.minimize();
        assert_eq!(m1, m2);
        assert_eq!(m1.num_states(), 2);
        assert_eq!(m1, d.minimize());
    }

    #[test]
    fn test_empty_language_and_sink() {
        let mut b = DfaBuilder::new(1, 1).unwrap();
        b.alloc_exceptions(0);
        b.store_state(0).unwrap();
        let phi = b.build("-").unwrap();
        assert!(phi.is_empty_language());
        assert_eq!(phi.sink_state(), Some(0));
        assert_eq!(phi.shortest_accepted_word(), None);

        let d = ends_in_one();
        assert!(!d.is_empty_language());
        assert_eq!(d.shortest_accepted_word(), Some(vec![1]));
    }

    #[test]
    fn test_pattern_symbols() {
        let mut p = BitPattern::any(3);
        p.set(1, Bit::One);
        assert_eq!(p.symbols(), vec![2, 3, 6, 7]);
        assert_eq!(p.to_string(), "X1X");
        assert!(p.matches(6));
        assert!(!p.matches(5));
    }
}
