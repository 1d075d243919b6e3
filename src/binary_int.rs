// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Binary integer automata for linear arithmetic
//!
//! A [BinaryIntAutomaton] represents the solution set of an
//! [ArithmeticFormula] over `V` integer variables as a DFA whose alphabet is
//! the set of `V`-bit vectors: one bit per variable per step. Words are read
//! least-significant bit first and interpreted in two's complement, so the
//! last bit read of each track is its sign bit, and repeating the final
//! symbol (sign extension) never changes the encoded values. Within one
//! symbol, the variable at coefficient position `i` occupies bit `V-1-i`:
//! lower bit indices hold later variables, mirroring the convention of
//! BDD-based DFA kernels where lower indices are more significant.
//!
//! # Comparison construction
//!
//! All comparison constructors run the same carry-state schema. For
//! `a1*x1 + ... + an*xn ⊙ c` the machine tracks a running carry label; a
//! transition on bit-vector `m` adds the weighted popcount of `m` and halves
//! the result. States are pairs `(label, flavor)`: the `current` flavor of a
//! label is entered exactly when the step resolves the comparison for a word
//! ending here, and the `current` states are the accepting ones. Equality
//! only follows even carries; the strict-less-than machine follows every
//! transition and decides the entry flavor by iterating the carry update to
//! its fixed point (the effect of sign-extending the final symbol). The
//! remaining kinds reduce to these two: `≤` is `<` with the internal
//! constant decreased by one, `>` and `≥` negate the formula first, and `≠`
//! complements the equality automaton.
//!
//! # Semilinear bridge
//!
//! [from_semilinear_set](BinaryIntAutomaton::from_semilinear_set) builds the
//! automaton of a set of naturals on one track (the other tracks read
//! anything), optionally with a helper track that allows high-order zeros
//! before projection. [to_semilinear_set](BinaryIntAutomaton::to_semilinear_set)
//! inverts it: Tarjan's algorithm separates the acyclic constants from the
//! cyclic tail, and candidate periods are validated by language inclusion
//! before being subtracted, until the automaton is exhausted.
//!

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

use crate::dfa::{Bit, BitPattern, BoolOp, Dfa, DfaBuilder};
use crate::errors::Error;
use crate::formula::{gcd, lcm, ArithmeticFormula, FormulaKind};
use crate::semilinear::SemilinearSet;
use crate::unary::UnaryAutomaton;

// Process-wide automaton ids, used only for tracing.
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

// Bounds for the semilinear extraction loop.
const MAX_EXTRACTION_ROUNDS: usize = 64;
const MEMBER_SCAN_SPAN: u64 = 1024;
const PERIOD_CAP: u64 = 1 << 20;

///
/// DFA over bit-vector symbols encoding the solutions of a linear formula
///
#[derive(Debug)]
pub struct BinaryIntAutomaton {
    id: u64,
    dfa: Dfa,
    formula: ArithmeticFormula,
}

// A carry state: the running label plus the accepting flavor of its entry.
type CarryState = (i64, bool);

// Exploration result of a carry construction: states in discovery order and
// the dense transition list (mask, successor) per state.
struct CarryGraph {
    states: Vec<CarryState>,
    edges: Vec<Vec<(u64, usize)>>,
}

// floor(x / 2), as the carry update requires for negative sums
fn floor_div2(x: i64) -> i64 {
    if x >= 0 {
        x / 2
    } else {
        (x - 1) / 2
    }
}

// Pattern with bit i of mask at position width-1-i: coefficient order is the
// reverse of bit-index order.
fn binary_format(mask: u64, width: usize) -> BitPattern {
    let mut p = BitPattern::any(width);
    for i in 0..width {
        let bit = if (mask >> i) & 1 == 1 { Bit::One } else { Bit::Zero };
        p.set(width - 1 - i, bit);
    }
    p
}

// value of a little-endian 0/1 path; None once it no longer fits
fn value_of_path(path: &[bool]) -> Option<u64> {
    if path.len() > 62 {
        return None;
    }
    Some(
        path.iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| 1u64 << i)
            .sum(),
    )
}

impl BinaryIntAutomaton {
    /// The formula this automaton was built from.
    pub fn formula(&self) -> &ArithmeticFormula {
        &self.formula
    }

    /// The underlying DFA.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// Process-wide id of this automaton, used in logs and errors.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of tracks (one per variable in the formula's ordering).
    pub fn num_tracks(&self) -> usize {
        self.dfa.num_vars()
    }

    /// Check whether the automaton accepts no word at all.
    pub fn is_empty_language(&self) -> bool {
        self.dfa.is_empty_language()
    }

    /// Run a word of symbols and report acceptance.
    pub fn accepts_word(&self, word: &[u32]) -> bool {
        self.dfa.accepts(word)
    }

    ///
    /// Encode an assignment as a word of the given length
    ///
    /// Symbol `t` carries bit `t` of each value, least significant first,
    /// with the sign bit repeated beyond the value's width. The variable at
    /// coefficient position `i` sits at bit `V-1-i` of each symbol.
    ///
    pub fn encode_values(values: &[i64], len: usize) -> Vec<u32> {
        let v = values.len();
        (0..len)
            .map(|t| {
                let mut symbol = 0u32;
                for (i, &value) in values.iter().enumerate() {
                    let bit = (value >> t.min(63)) & 1;
                    symbol |= (bit as u32) << (v - 1 - i);
                }
                symbol
            })
            .collect()
    }

    ///
    /// Check whether an assignment (in coefficient order) satisfies the
    /// automaton, using a word long enough to hold every value
    ///
    pub fn accepts_values(&self, values: &[i64]) -> bool {
        assert_eq!(values.len(), self.num_tracks(), "one value per track");
        let bits = values
            .iter()
            .map(|&v| {
                let magnitude = if v >= 0 { v } else { !v };
                65 - magnitude.leading_zeros() as usize
            })
            .max()
            .unwrap_or(1);
        self.accepts_word(&Self::encode_values(values, bits))
    }

    ///
    /// The empty-language automaton over the formula's tracks
    ///
    pub fn make_phi(formula: ArithmeticFormula) -> Self {
        let v = formula.num_variables();
        let mut b = DfaBuilder::new(1, v).expect("track count within kernel limit");
        b.alloc_exceptions(0);
        b.store_state(0).expect("phi state");
        let dfa = b.build("-").expect("phi build");
        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula,
        };
        trace!(id = auto.id, formula = %auto.formula, "make_phi");
        auto
    }

    // universal automaton over v tracks
    fn make_universe(formula: ArithmeticFormula) -> Self {
        let mut phi = Self::make_phi(formula);
        phi.dfa.negate();
        phi
    }

    ///
    /// Comparison automaton for a formula
    ///
    /// Inconsistent formulas produce the empty-language automaton;
    /// tautologies produce the universal one.
    ///
    /// # Errors
    ///
    /// [Error::UnsupportedFormula] for the `Intersect`/`Union` markers.
    ///
    pub fn make_automaton(formula: ArithmeticFormula) -> Result<Self, Error> {
        match formula.kind() {
            FormulaKind::Eq => Ok(Self::make_equality(formula)),
            FormulaKind::NotEq => Ok(Self::make_not_equality(formula)),
            FormulaKind::Gt => Ok(Self::make_greater_than(formula)),
            FormulaKind::Ge => Ok(Self::make_greater_than_or_equal(formula)),
            FormulaKind::Lt => Ok(Self::make_less_than(formula)),
            FormulaKind::Le => Ok(Self::make_less_than_or_equal(formula)),
            kind => Err(Error::UnsupportedFormula(kind)),
        }
    }

    // Explore the carry graph from the initial label. `step` maps a state and
    // a transition mask to the successor state, or None when the transition
    // is not taken (equality on odd sums).
    fn explore_carries<F>(initial: CarryState, num_masks: u64, step: F) -> CarryGraph
    where
        F: Fn(CarryState, u64) -> Option<CarryState>,
    {
        let mut states = vec![initial];
        let mut ids: HashMap<CarryState, usize> = HashMap::new();
        ids.insert(initial, 0);
        let mut edges: Vec<Vec<(u64, usize)>> = Vec::new();
        let mut i = 0;
        while i < states.len() {
            let state = states[i];
            let mut row = Vec::new();
            for mask in 0..num_masks {
                if let Some(succ) = step(state, mask) {
                    let id = *ids.entry(succ).or_insert_with(|| {
                        states.push(succ);
                        states.len() - 1
                    });
                    row.push((mask, id));
                }
            }
            edges.push(row);
            i += 1;
        }
        CarryGraph { states, edges }
    }

    // Label range of the carry graph: the sums of positive and negative
    // coefficients, widened to cover the initial label.
    fn carry_bounds(formula: &ArithmeticFormula, initial: i64) -> (i64, i64) {
        let mut min = 0;
        let mut max = 0;
        for c in formula.coefficients() {
            if c > 0 {
                max += c;
            } else {
                min += c;
            }
        }
        if max < initial {
            max = initial;
        } else if min > initial {
            min = initial;
        }
        (min, max)
    }

    ///
    /// Equality automaton `sum of coeff * var = constant`
    ///
    pub fn make_equality(mut formula: ArithmeticFormula) -> Self {
        if !formula.simplify() {
            return Self::make_phi(formula);
        }
        if formula.coefficients().all(|c| c == 0) {
            return Self::make_universe(formula);
        }
        let v = formula.num_variables();
        // the machine resolves sum + c0 = 0
        let c0 = -formula.constant();
        let (min, max) = Self::carry_bounds(&formula, c0);
        debug_assert!(min <= c0 && c0 <= max);
        let graph = Self::explore_carries((c0, false), 1 << v, |(label, _), mask| {
            let sum = label + formula.count_ones(mask);
            if sum & 1 == 0 {
                let target = sum / 2;
                Some((target, target == label))
            } else {
                None
            }
        });

        let num_states = graph.states.len() + 1;
        let sink = num_states - 1;
        let mut b = DfaBuilder::new(num_states, v).expect("track count within kernel limit");
        for row in &graph.edges {
            b.alloc_exceptions(row.len());
            for &(mask, target) in row {
                b.store_exception(target, &binary_format(mask, v))
                    .expect("allocated exception");
            }
            b.store_state(sink).expect("carry state");
        }
        b.alloc_exceptions(0);
        b.store_state(sink).expect("sink state");
        let statuses: String = graph
            .states
            .iter()
            .map(|&(_, current)| if current { '+' } else { '-' })
            .chain(['-'])
            .collect();
        let dfa = b.build(&statuses).expect("equality build").minimize();

        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula,
        };
        trace!(id = auto.id, formula = %auto.formula, "make_equality");
        auto
    }

    ///
    /// Disequality automaton, the complement of the equality one
    ///
    pub fn make_not_equality(formula: ArithmeticFormula) -> Self {
        let mut eq_formula = formula;
        eq_formula.set_kind(FormulaKind::Eq);
        let auto = Self::make_equality(eq_formula).complement();
        trace!(id = auto.id, formula = %auto.formula, "make_not_equality");
        auto
    }

    ///
    /// Strictly-less-than automaton `sum of coeff * var < constant`
    ///
    pub fn make_less_than(mut formula: ArithmeticFormula) -> Self {
        if !formula.simplify() {
            return Self::make_phi(formula);
        }
        if formula.coefficients().all(|c| c == 0) {
            return if 0 < formula.constant() {
                Self::make_universe(formula)
            } else {
                Self::make_phi(formula)
            };
        }
        let v = formula.num_variables();
        let c0 = -formula.constant();
        let (min, max) = Self::carry_bounds(&formula, c0);
        debug_assert!(min <= c0 && c0 <= max);
        let graph = Self::explore_carries((c0, false), 1 << v, |(label, _), mask| {
            let weight = formula.count_ones(mask);
            let mut sum = label + weight;
            let target = floor_div2(sum);
            let mut emitted = sum & 1 != 0;
            // sign-extend from the target until the label stops moving; the
            // final emitted bit decides the accepting flavor of the entry
            let mut previous = label;
            let mut current = target;
            while previous != current {
                previous = current;
                sum = previous + weight;
                current = floor_div2(sum);
                emitted = sum & 1 != 0;
            }
            Some((target, emitted))
        });

        let num_states = graph.states.len();
        let mut b = DfaBuilder::new(num_states, v).expect("track count within kernel limit");
        for (i, row) in graph.edges.iter().enumerate() {
            b.alloc_exceptions(row.len());
            for &(mask, target) in row {
                b.store_exception(target, &binary_format(mask, v))
                    .expect("allocated exception");
            }
            // the row covers the full alphabet; the default is never taken
            b.store_state(i).expect("carry state");
        }
        let statuses: String = graph
            .states
            .iter()
            .map(|&(_, current)| if current { '+' } else { '-' })
            .collect();
        let dfa = b.build(&statuses).expect("less-than build").minimize();

        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula,
        };
        trace!(id = auto.id, formula = %auto.formula, "make_less_than");
        auto
    }

    ///
    /// Less-or-equal automaton, built as `<` on the successor constant
    ///
    pub fn make_less_than_or_equal(formula: ArithmeticFormula) -> Self {
        let mut lt = formula.clone();
        lt.set_kind(FormulaKind::Lt);
        lt.set_constant(formula.constant() + 1);
        let mut auto = Self::make_less_than(lt);
        auto.formula = formula;
        trace!(id = auto.id, formula = %auto.formula, "make_less_than_or_equal");
        auto
    }

    ///
    /// Greater-than automaton, built as `<` on the negated formula
    ///
    pub fn make_greater_than(formula: ArithmeticFormula) -> Self {
        let mut lt = formula.multiplied(-1);
        lt.set_kind(FormulaKind::Lt);
        let mut auto = Self::make_less_than(lt);
        auto.formula = formula;
        trace!(id = auto.id, formula = %auto.formula, "make_greater_than");
        auto
    }

    ///
    /// Greater-or-equal automaton
    ///
    pub fn make_greater_than_or_equal(formula: ArithmeticFormula) -> Self {
        let mut lt = formula.multiplied(-1);
        lt.set_kind(FormulaKind::Lt);
        lt.set_constant(lt.constant() + 1);
        let mut auto = Self::make_less_than(lt);
        auto.formula = formula;
        trace!(id = auto.id, formula = %auto.formula, "make_greater_than_or_equal");
        auto
    }

    ///
    /// Complement automaton
    ///
    /// The attached formula becomes its logical negation.
    ///
    pub fn complement(&self) -> Self {
        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa: self.dfa.negation(),
            formula: self.formula.negated(),
        };
        trace!(id = auto.id, source = self.id, "complement");
        auto
    }

    // product + minimize, with the ordering check shared by intersect/union
    fn combine(&self, other: &BinaryIntAutomaton, op: BoolOp) -> Result<Self, Error> {
        if !self.formula.is_variable_ordering_same(&other.formula) {
            return Err(Error::OrderingMismatch {
                left: self.formula.variables().collect::<Vec<_>>().join(", "),
                right: other.formula.variables().collect::<Vec<_>>().join(", "),
            });
        }
        let dfa = self.dfa.product(&other.dfa, op)?.minimize();
        let mut formula = self.formula.clone();
        formula.reset_coefficients();
        formula.set_kind(match op {
            BoolOp::And => FormulaKind::Intersect,
            BoolOp::Or => FormulaKind::Union,
        });
        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula,
        };
        trace!(id = auto.id, left = self.id, right = other.id, ?op, "combine");
        Ok(auto)
    }

    ///
    /// Intersection with another automaton
    ///
    /// # Errors
    ///
    /// [Error::OrderingMismatch] when the variable orderings differ; the
    /// caller must align them first.
    ///
    pub fn intersect(&self, other: &BinaryIntAutomaton) -> Result<Self, Error> {
        self.combine(other, BoolOp::And)
    }

    ///
    /// Union with another automaton
    ///
    /// # Errors
    ///
    /// [Error::OrderingMismatch] when the variable orderings differ.
    ///
    pub fn union(&self, other: &BinaryIntAutomaton) -> Result<Self, Error> {
        self.combine(other, BoolOp::Or)
    }

    ///
    /// Difference: words of `self` not accepted by `other`
    ///
    /// # Errors
    ///
    /// [Error::OrderingMismatch] when the variable orderings differ.
    ///
    pub fn difference(&self, other: &BinaryIntAutomaton) -> Result<Self, Error> {
        self.intersect(&other.complement())
    }

    ///
    /// Language equivalence
    ///
    /// # Errors
    ///
    /// [Error::OrderingMismatch] when the variable orderings differ.
    ///
    pub fn is_equivalent_to(&self, other: &BinaryIntAutomaton) -> Result<bool, Error> {
        Ok(self.difference(other)?.is_empty_language()
            && other.difference(self)?.is_empty_language())
    }

    ///
    /// Single-variable slice: project every track away except `var_name`
    ///
    /// The result reads one track and accepts exactly the values of the
    /// variable admitted by the full formula, other variables unconstrained.
    ///
    /// # Panics
    ///
    /// If `var_name` is not part of the formula's ordering.
    ///
    pub fn project_to(&self, var_name: &str) -> Self {
        let v = self.num_tracks();
        let position = self
            .formula
            .variable_index(var_name)
            .expect("variable must be part of the ordering");
        // bdd bit indices run in reverse coefficient order
        let target = v - position - 1;
        let mut dfa = self.dfa.clone();
        for i in (0..v).rev() {
            if i != target {
                dfa = dfa.project(i).minimize();
            }
        }
        let mut formula = ArithmeticFormula::new(FormulaKind::Intersect);
        formula.set_coefficient(var_name, 1);
        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula,
        };
        trace!(id = auto.id, source = self.id, var = var_name, "project_to");
        auto
    }

    // Three-state guard on the sign bit of selected tracks: accepting exactly
    // when the last bit read on every selected track equals the sign we keep.
    fn make_sign_guard(bdd_indices: &[usize], num_vars: usize, negative: bool) -> Self {
        let mut b = DfaBuilder::new(3, num_vars).expect("track count within kernel limit");
        let (keep, flip) = if negative {
            (Bit::One, Bit::Zero)
        } else {
            (Bit::Zero, Bit::One)
        };
        let mut pattern = BitPattern::any(num_vars);
        for &i in bdd_indices {
            pattern.set(i, keep);
        }
        b.alloc_exceptions(1);
        b.store_exception(1, &pattern).expect("guard exception");
        b.store_state(0).expect("guard state");
        let mut pattern = BitPattern::any(num_vars);
        for &i in bdd_indices {
            pattern.set(i, flip);
        }
        b.alloc_exceptions(1);
        b.store_exception(0, &pattern).expect("guard exception");
        b.store_state(1).expect("guard state");
        b.alloc_exceptions(0);
        b.store_state(2).expect("guard sink");
        let dfa = b.build("-+-").expect("sign guard build");
        BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula: ArithmeticFormula::new(FormulaKind::Intersect),
        }
    }

    ///
    /// Restrict a variable to non-negative values (sign bit zero)
    ///
    /// # Panics
    ///
    /// If `var_name` is not part of the formula's ordering.
    ///
    pub fn positive_values_for(&self, var_name: &str) -> Result<Self, Error> {
        self.sign_slice(var_name, false)
    }

    ///
    /// Restrict a variable to negative values (sign bit one)
    ///
    /// The mirror of [positive_values_for](Self::positive_values_for).
    ///
    /// # Panics
    ///
    /// If `var_name` is not part of the formula's ordering.
    ///
    pub fn negative_values_for(&self, var_name: &str) -> Result<Self, Error> {
        self.sign_slice(var_name, true)
    }

    fn sign_slice(&self, var_name: &str, negative: bool) -> Result<Self, Error> {
        let v = self.num_tracks();
        let position = self
            .formula
            .variable_index(var_name)
            .expect("variable must be part of the ordering");
        let target = v - position - 1;
        let mut guard = Self::make_sign_guard(&[target], v, negative);
        guard.formula = self.formula.clone();
        let auto = self.intersect(&guard)?;
        trace!(id = auto.id, source = self.id, var = var_name, negative, "sign_slice");
        Ok(auto)
    }

    // The five-state helper that forbids spurious high-order zeros: words may
    // not end in 0, except for the single word "0".
    fn make_trim_helper() -> Self {
        let mut b = DfaBuilder::new(5, 1).expect("one track");
        let zero = BitPattern::fixed(1, 0);
        let one = BitPattern::fixed(1, 1);
        // state 0
        b.alloc_exceptions(2);
        b.store_exception(1, &zero).expect("trim edge");
        b.store_exception(2, &one).expect("trim edge");
        b.store_state(0).expect("trim state");
        // state 1
        b.alloc_exceptions(2);
        b.store_exception(3, &zero).expect("trim edge");
        b.store_exception(2, &one).expect("trim edge");
        b.store_state(1).expect("trim state");
        // state 2
        b.alloc_exceptions(1);
        b.store_exception(4, &zero).expect("trim edge");
        b.store_state(2).expect("trim state");
        // state 3
        b.alloc_exceptions(1);
        b.store_exception(2, &one).expect("trim edge");
        b.store_state(3).expect("trim state");
        // state 4
        b.alloc_exceptions(1);
        b.store_exception(2, &one).expect("trim edge");
        b.store_state(4).expect("trim state");
        let dfa = b.build("-++--").expect("trim helper build");
        BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula: ArithmeticFormula::new(FormulaKind::Intersect),
        }
    }

    ///
    /// Normalize a single-track automaton to canonical encodings
    ///
    /// Every state that reaches an accepting state by reading zeros is
    /// pre-accepted, then the language is restricted to words without
    /// high-order zeros (the word `"0"` stays legal). The result accepts one
    /// word per value.
    ///
    /// # Panics
    ///
    /// If the automaton has more than one track.
    ///
    pub fn trim_leading_zeros(&self) -> Self {
        assert_eq!(1, self.num_tracks(), "trimming works on one track");
        let mut dfa = self.dfa.clone();
        // pre-accept along 0-transitions to a fixed point
        let mut changed = true;
        while changed {
            changed = false;
            for s in 0..dfa.num_states() {
                if !dfa.is_accepting(s) && dfa.is_accepting(dfa.next_state(s, 0)) {
                    dfa.set_accepting(s, true);
                    changed = true;
                }
            }
        }
        let mut pre = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula: self.formula.clone(),
        };
        let mut helper = Self::make_trim_helper();
        helper.formula = self.formula.clone();
        pre = pre.intersect(&helper).expect("same single-track ordering");
        pre.formula = self.formula.clone();
        trace!(id = pre.id, source = self.id, "trim_leading_zeros");
        pre
    }

    ///
    /// Check whether the automaton accepts -1 on its single track
    ///
    /// -1 is encoded by all-ones words of every length, so the walk follows
    /// the 1-symbol until a state repeats.
    ///
    /// # Panics
    ///
    /// If the automaton has more than one track.
    ///
    pub fn has_negative_one(&self) -> bool {
        assert_eq!(1, self.num_tracks(), "sign walk works on one track");
        let mut visited = vec![false; self.dfa.num_states()];
        let mut state = self.dfa.initial_state();
        while !visited[state] {
            visited[state] = true;
            state = self.dfa.next_state(state, 1);
            if self.dfa.is_accepting(state) {
                return true;
            }
        }
        false
    }

    ///
    /// Automaton of a semilinear set of naturals
    ///
    /// The set constrains the track of `var_name`; every other track of the
    /// formula's ordering reads arbitrary bits. With `add_leading_zeros` the
    /// construction routes acceptance through an extra helper track that
    /// permits high-order zeros, which is projected away again before
    /// minimization.
    ///
    /// # Panics
    ///
    /// If `var_name` is not part of the formula's ordering.
    ///
    pub fn from_semilinear_set(
        set: &SemilinearSet,
        var_name: &str,
        formula: ArithmeticFormula,
        add_leading_zeros: bool,
    ) -> Result<Self, Error> {
        // mixed sets split into a finite part and a periodic part
        if set.period() > 0 && set.has_constants() {
            let finite = SemilinearSet::from_constants(set.constants().iter().copied());
            let mut tail = SemilinearSet::new();
            tail.set_cycle_head(set.cycle_head());
            tail.set_period(set.period());
            for &p in set.periodic_constants() {
                tail.add_periodic_constant(p);
            }
            let a = Self::from_semilinear_set(&finite, var_name, formula.clone(), add_leading_zeros)?;
            let b = Self::from_semilinear_set(&tail, var_name, formula.clone(), add_leading_zeros)?;
            let mut union = a.union(&b)?;
            union.formula = formula;
            return Ok(union);
        }

        let position = formula
            .variable_index(var_name)
            .expect("variable must be part of the ordering");
        let mut num_vars = formula.num_variables();
        let var_index = num_vars - position - 1;
        let mut lz_index = 0;
        if add_leading_zeros {
            num_vars += 1;
            lz_index = num_vars - 1;
        }

        let (states, edges) = Self::compute_binary_states(set);
        let num_binary = states.len();
        let mut num_states = num_binary + 1;
        let mut leading_zero_state = 0;
        if add_leading_zeros {
            num_states += 1;
            leading_zero_state = num_states - 2;
        }
        let sink = num_states - 1;

        let mut builder = DfaBuilder::new(num_states, num_vars)?;
        let mut statuses = vec!['-'; num_states];
        for (i, state) in states.iter().enumerate() {
            let accepting = Self::is_accepting_binary_state(state, set);
            let (d0, d1) = edges[i];
            if add_leading_zeros && accepting {
                builder
                    .alloc_exceptions(usize::from(d0.is_some()) + usize::from(d1.is_some()) + 1);
                if let Some(t) = d0 {
                    let mut p = BitPattern::any(num_vars);
                    p.set(var_index, Bit::Zero);
                    p.set(lz_index, Bit::Zero);
                    builder.store_exception(t, &p)?;
                }
                if let Some(t) = d1 {
                    let mut p = BitPattern::any(num_vars);
                    p.set(var_index, Bit::One);
                    builder.store_exception(t, &p)?;
                }
                let mut p = BitPattern::any(num_vars);
                p.set(var_index, Bit::Zero);
                p.set(lz_index, Bit::One);
                builder.store_exception(leading_zero_state, &p)?;
            } else {
                builder.alloc_exceptions(usize::from(d0.is_some()) + usize::from(d1.is_some()));
                if let Some(t) = d0 {
                    let mut p = BitPattern::any(num_vars);
                    p.set(var_index, Bit::Zero);
                    builder.store_exception(t, &p)?;
                }
                if let Some(t) = d1 {
                    let mut p = BitPattern::any(num_vars);
                    p.set(var_index, Bit::One);
                    builder.store_exception(t, &p)?;
                }
            }
            builder.store_state(sink)?;
            if !add_leading_zeros && accepting {
                statuses[i] = '+';
            }
        }
        if add_leading_zeros {
            builder.alloc_exceptions(1);
            let mut p = BitPattern::any(num_vars);
            p.set(var_index, Bit::Zero);
            p.set(lz_index, Bit::One);
            builder.store_exception(leading_zero_state, &p)?;
            builder.store_state(sink)?;
            statuses[leading_zero_state] = '+';
        }
        builder.alloc_exceptions(0);
        builder.store_state(sink)?;

        // reading a single 0 must accept when zero is a member
        if let Some(zero_state) = edges[0].0 {
            if Self::is_accepting_binary_state(&states[zero_state], set) {
                statuses[zero_state] = '+';
            }
        }

        let statuses: String = statuses.into_iter().collect();
        let mut dfa = builder.build(&statuses)?;
        if add_leading_zeros {
            dfa = dfa.project(lz_index);
        }
        let dfa = dfa.minimize();
        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula,
        };
        trace!(id = auto.id, set = %set, var = var_name, "from_semilinear_set");
        Ok(auto)
    }

    // Binary states of a semilinear set, with their 0- and 1-successors.
    fn compute_binary_states(set: &SemilinearSet) -> (Vec<BinaryState>, Vec<BinaryEdges>) {
        if set.period() == 0 {
            Self::constant_binary_states(set.constants())
        } else {
            Self::periodic_binary_states(set.cycle_head() as i64, set.period() as i64)
        }
    }

    // Trie of exact binary encodings of the constants, keyed by the
    // accumulated value and the number of bits read.
    fn constant_binary_states(constants: &[u64]) -> (Vec<BinaryState>, Vec<BinaryEdges>) {
        let mut states = vec![BinaryState::val(-1, 0)];
        let mut edges: Vec<BinaryEdges> = vec![(None, None)];
        let mut ids: HashMap<(i64, i64), usize> = HashMap::new();
        for &value in constants {
            let mut i = 0usize;
            let mut rank: i64 = 1;
            let mut mask = value;
            let mut state_value: i64 = 0;
            loop {
                let bit = mask & 1;
                if bit == 1 {
                    state_value |= 1 << (rank - 1);
                }
                let key = (state_value, rank);
                let id = match ids.get(&key) {
                    Some(&id) => id,
                    None => {
                        states.push(BinaryState::val(state_value, rank));
                        edges.push((None, None));
                        let id = states.len() - 1;
                        ids.insert(key, id);
                        if bit == 1 {
                            edges[i].1 = Some(id);
                        } else {
                            edges[i].0 = Some(id);
                        }
                        id
                    }
                };
                i = id;
                mask >>= 1;
                rank += 1;
                if state_value == value as i64 {
                    break;
                }
            }
        }
        (states, edges)
    }

    // Value-accumulation states below the cycle head, then residue states
    // modulo the period: RemT entered on a 1-bit (accepting-eligible), RemF
    // entered on a 0-bit.
    fn periodic_binary_states(cycle_head: i64, period: i64) -> (Vec<BinaryState>, Vec<BinaryEdges>) {
        struct Builder {
            cycle_head: i64,
            period: i64,
            states: Vec<BinaryState>,
            edges: Vec<BinaryEdges>,
            ids: HashMap<BinaryState, usize>,
        }
        impl Builder {
            fn add(&mut self, state: BinaryState) -> usize {
                if let Some(&id) = self.ids.get(&state) {
                    return id;
                }
                let id = self.states.len();
                self.states.push(state);
                self.edges.push((None, None));
                self.ids.insert(state, id);
                let c = self.cycle_head;
                let r = self.period;
                let (v, b) = (state.v, state.b);
                let (d1, d0) = if b < 0 {
                    if c == 0 {
                        (
                            self.add(BinaryState::rem_t(1 % r, 1 % r)),
                            self.add(BinaryState::rem_t(0, 1 % r)),
                        )
                    } else if c == 1 {
                        (
                            self.add(BinaryState::rem_t(1 % r, 1 % r)),
                            self.add(BinaryState::rem_f(0, 1 % r)),
                        )
                    } else {
                        (
                            self.add(BinaryState::val(1, 1)),
                            self.add(BinaryState::val(0, 1)),
                        )
                    }
                } else {
                    match state.kind {
                        BinaryStateKind::Val if v + 2 * b >= c => (
                            self.add(BinaryState::rem_t((v + 2 * b) % r, (2 * b) % r)),
                            self.add(BinaryState::rem_f(v % r, (2 * b) % r)),
                        ),
                        BinaryStateKind::Val => (
                            self.add(BinaryState::val(v + 2 * b, 2 * b)),
                            self.add(BinaryState::val(v, 2 * b)),
                        ),
                        BinaryStateKind::RemT => (
                            self.add(BinaryState::rem_t((v + 2 * b) % r, (2 * b) % r)),
                            self.add(BinaryState::rem_t(v % r, (2 * b) % r)),
                        ),
                        BinaryStateKind::RemF => (
                            self.add(BinaryState::rem_t((v + 2 * b) % r, (2 * b) % r)),
                            self.add(BinaryState::rem_f(v % r, (2 * b) % r)),
                        ),
                    }
                };
                self.edges[id] = (Some(d0), Some(d1));
                id
            }
        }
        let mut b = Builder {
            cycle_head,
            period,
            states: Vec::new(),
            edges: Vec::new(),
            ids: HashMap::new(),
        };
        b.add(BinaryState::val(-1, -1));
        (b.states, b.edges)
    }

    fn is_accepting_binary_state(state: &BinaryState, set: &SemilinearSet) -> bool {
        match state.kind {
            BinaryStateKind::Val => {
                state.v >= 0 && set.constants().binary_search(&(state.v as u64)).is_ok()
            }
            BinaryStateKind::RemT => set
                .periodic_constants()
                .iter()
                .any(|&p| ((p + set.cycle_head()) % set.period()) as i64 == state.v),
            BinaryStateKind::RemF => false,
        }
    }

    ///
    /// Extract the semilinear set of a single-track automaton
    ///
    /// The automaton is first trimmed to canonical encodings. Constants come
    /// from the acyclic part of the state graph; each periodic progression is
    /// then derived from the base constants of the remainder, validated by
    /// language inclusion, and subtracted, until nothing remains.
    ///
    /// # Errors
    ///
    /// [Error::SemilinearExtraction] when no candidate period validates or
    /// the subtraction loop fails to converge — the value set of the
    /// automaton need not be semilinear.
    ///
    /// # Panics
    ///
    /// If the automaton has more than one track.
    ///
    pub fn to_semilinear_set(&self) -> Result<SemilinearSet, Error> {
        assert_eq!(1, self.num_tracks(), "extraction works on one track");
        let var_name: String = self
            .formula
            .variables()
            .next()
            .expect("single-track formula")
            .to_string();
        let extraction_error = |reason: String| Error::SemilinearExtraction {
            automaton: self.id,
            variable: var_name.clone(),
            reason,
        };

        let trimmed = self.trim_leading_zeros();
        let (in_cycle, is_cyclic) = trimmed.cycle_status();
        let mut constants = trimmed.collect_constants(&in_cycle);
        debug!(id = self.id, ?constants, is_cyclic, "semilinear extraction start");
        if !is_cyclic {
            return Ok(SemilinearSet::from_constants(constants));
        }

        let mut subject;
        if constants.is_empty() {
            subject = trimmed;
        } else {
            // constants below the maximum may hide inside cycles; re-extract
            // them from the acyclic intersection with [0, max]
            let max = *constants.last().expect("nonempty constants");
            let range = SemilinearSet::from_constants(0..=max);
            let range_auto =
                Self::from_semilinear_set(&range, &var_name, self.formula.clone(), false)?;
            let within = trimmed.intersect(&range_auto)?;
            let (within_cycles, _) = within.cycle_status();
            constants = within.collect_constants(&within_cycles);
            subject = trimmed.difference(&within)?;
        }

        let mut result = SemilinearSet::from_constants(constants);
        let mut rounds = 0;
        while !subject.is_empty_language() {
            rounds += 1;
            if rounds > MAX_EXTRACTION_ROUNDS {
                return Err(extraction_error("subtraction loop did not converge".into()));
            }
            let bases = subject.base_constants();
            let &head = bases
                .first()
                .ok_or_else(|| extraction_error("non-empty automaton without base constants".into()))?;

            // augment the bases with the next few members by direct scan
            let mut members = bases.clone();
            let mut v = members.last().copied().unwrap_or(head) + 1;
            while members.len() < bases.len() + 3 && v <= head + MEMBER_SCAN_SPAN {
                if subject.accepts_natural(v) {
                    members.push(v);
                }
                v += 1;
            }

            let diffs: Vec<u64> = members.iter().skip(1).map(|&m| m - head).collect();
            let diff_gcd = diffs.iter().copied().fold(0, gcd);
            let diff_lcm = diffs
                .iter()
                .copied()
                .try_fold(1u64, |acc, d| {
                    let l = lcm(acc, d);
                    (l <= PERIOD_CAP).then_some(l)
                });
            let mut pool: Vec<u64> = diffs.clone();
            pool.push(head);
            pool.push(diff_gcd);
            pool.extend(diff_lcm);
            pool.retain(|&r| r > 0 && r <= PERIOD_CAP);
            pool.sort_unstable();
            pool.dedup();
            if pool.is_empty() {
                return Err(extraction_error(format!(
                    "no period candidates for base {head}"
                )));
            }

            let mut chosen = None;
            for &period in &pool {
                let mut candidate = SemilinearSet::new();
                candidate.set_cycle_head(head);
                candidate.set_period(period);
                for &m in &members {
                    candidate.add_periodic_constant((m - head) % period);
                }
                let auto =
                    Self::from_semilinear_set(&candidate, &var_name, self.formula.clone(), false)?
                        .trim_leading_zeros();
                if auto.difference(&subject)?.is_empty_language() {
                    trace!(head, period, "validated period candidate");
                    chosen = Some((candidate, auto));
                    break;
                }
            }
            let (candidate, auto) = chosen.ok_or_else(|| {
                extraction_error(format!("no candidate period validated for base {head}"))
            })?;
            if result.period() > 0 && lcm(result.period(), candidate.period()) > PERIOD_CAP {
                return Err(extraction_error("joint period grew past the cap".into()));
            }
            subject = subject.difference(&auto)?;
            result = result.union_with(&candidate);
        }
        debug!(id = self.id, set = %result, "semilinear extraction done");
        Ok(result)
    }

    ///
    /// Render the value set as an automaton over a one-letter alphabet
    ///
    /// # Errors
    ///
    /// [Error::SemilinearExtraction] when the value set resists extraction.
    ///
    /// # Panics
    ///
    /// If the automaton has more than one track.
    ///
    pub fn to_unary_automaton(&self) -> Result<UnaryAutomaton, Error> {
        let set = self.to_semilinear_set()?;
        Ok(UnaryAutomaton::from_semilinear_set(&set))
    }

    // canonical natural-number word on a single track
    fn accepts_natural(&self, value: u64) -> bool {
        let mut word = Vec::new();
        let mut v = value;
        loop {
            word.push((v & 1) as u32);
            v >>= 1;
            if v == 0 {
                break;
            }
        }
        self.dfa.accepts(&word)
    }

    // Tarjan cycle status over the non-sink part of the state graph: a state
    // is in a cycle when its SCC has more than one state or a self loop.
    fn cycle_status(&self) -> (Vec<bool>, bool) {
        let dfa = &self.dfa;
        let n = dfa.num_states();
        let alpha = dfa.alphabet_size() as u32;
        let sink = dfa.sink_state();
        let mut index = vec![usize::MAX; n];
        let mut low = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut in_cycle = vec![false; n];
        let init = dfa.initial_state();
        if Some(init) == sink {
            return (in_cycle, false);
        }
        let mut counter = 0usize;
        let mut work: Vec<(usize, u32)> = vec![(init, 0)];
        while let Some((v, resume_at)) = work.pop() {
            if resume_at == 0 {
                index[v] = counter;
                low[v] = counter;
                counter += 1;
                stack.push(v);
                on_stack[v] = true;
            }
            let mut descended = false;
            let mut c = resume_at;
            while c < alpha {
                let w = dfa.next_state(v, c);
                if Some(w) != sink {
                    if index[w] == usize::MAX {
                        work.push((v, c + 1));
                        work.push((w, 0));
                        descended = true;
                        break;
                    } else if on_stack[w] {
                        low[v] = low[v].min(index[w]);
                    }
                }
                c += 1;
            }
            if descended {
                continue;
            }
            if low[v] == index[v] {
                let mut component = Vec::new();
                loop {
                    let w = stack.pop().expect("scc stack");
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                let self_loop = (0..alpha).any(|c| dfa.next_state(v, c) == v);
                if component.len() > 1 || self_loop {
                    for w in component {
                        in_cycle[w] = true;
                    }
                }
            }
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[v]);
            }
        }
        let cyclic = in_cycle.iter().any(|&b| b);
        (in_cycle, cyclic)
    }

    // Accepting values reachable without touching any cycle state, as
    // little-endian path values.
    fn collect_constants(&self, in_cycle: &[bool]) -> Vec<u64> {
        fn walk(
            dfa: &Dfa,
            sink: Option<usize>,
            in_cycle: &[bool],
            state: usize,
            path: &mut Vec<bool>,
            out: &mut Vec<u64>,
        ) {
            for bit in 0..2u32 {
                let next = dfa.next_state(state, bit);
                if Some(next) == sink {
                    continue;
                }
                path.push(bit == 1);
                if dfa.is_accepting(next) && !in_cycle[next] {
                    match value_of_path(path) {
                        Some(v) => out.push(v),
                        None => warn!("constant path exceeds 62 bits, skipped"),
                    }
                }
                if !in_cycle[next] {
                    walk(dfa, sink, in_cycle, next, path, out);
                }
                path.pop();
            }
        }
        let mut out = Vec::new();
        let sink = self.dfa.sink_state();
        let init = self.dfa.initial_state();
        if Some(init) != sink && !in_cycle[init] {
            let mut path = Vec::new();
            walk(&self.dfa, sink, in_cycle, init, &mut path, &mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    // Accepting values along simple paths (no state revisited), the seeds of
    // period derivation.
    fn base_constants(&self) -> Vec<u64> {
        fn walk(
            dfa: &Dfa,
            sink: Option<usize>,
            on_path: &mut Vec<bool>,
            state: usize,
            path: &mut Vec<bool>,
            out: &mut Vec<u64>,
        ) {
            on_path[state] = true;
            for bit in 0..2u32 {
                let next = dfa.next_state(state, bit);
                if Some(next) == sink || on_path[next] {
                    continue;
                }
                path.push(bit == 1);
                if dfa.is_accepting(next) {
                    match value_of_path(path) {
                        Some(v) => out.push(v),
                        None => warn!("base constant path exceeds 62 bits, skipped"),
                    }
                }
                walk(dfa, sink, on_path, next, path, out);
                path.pop();
            }
            on_path[state] = false;
        }
        let mut out = Vec::new();
        let sink = self.dfa.sink_state();
        let init = self.dfa.initial_state();
        if Some(init) != sink {
            let mut on_path = vec![false; self.dfa.num_states()];
            let mut path = Vec::new();
            walk(&self.dfa, sink, &mut on_path, init, &mut path, &mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

impl Clone for BinaryIntAutomaton {
    fn clone(&self) -> Self {
        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa: self.dfa.clone(),
            formula: self.formula.clone(),
        };
        trace!(id = auto.id, source = self.id, "clone");
        auto
    }
}

impl Display for BinaryIntAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({} states)",
            self.id,
            self.formula,
            self.dfa.num_states()
        )
    }
}

// Scratch state of the semilinear-set construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BinaryStateKind {
    Val,
    RemT,
    RemF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BinaryState {
    kind: BinaryStateKind,
    v: i64,
    b: i64,
}

type BinaryEdges = (Option<usize>, Option<usize>);

impl BinaryState {
    fn val(v: i64, b: i64) -> Self {
        BinaryState {
            kind: BinaryStateKind::Val,
            v,
            b,
        }
    }
    fn rem_t(v: i64, b: i64) -> Self {
        BinaryState {
            kind: BinaryStateKind::RemT,
            v,
            b,
        }
    }
    fn rem_f(v: i64, b: i64) -> Self {
        BinaryState {
            kind: BinaryStateKind::RemF,
            v,
            b,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn formula(kind: FormulaKind, coeffs: &[(&str, i64)], constant: i64) -> ArithmeticFormula {
        ArithmeticFormula::with_coefficients(
            kind,
            coeffs.iter().map(|&(n, c)| (n, c)),
            constant,
        )
    }

    fn single(kind: FormulaKind, coeff: i64, constant: i64) -> ArithmeticFormula {
        formula(kind, &[("x", coeff)], constant)
    }

    #[test]
    fn test_equality_difference_of_two_variables() {
        // x - y = 5
        let f = formula(FormulaKind::Eq, &[("x", 1), ("y", -1)], 5);
        let auto = BinaryIntAutomaton::make_automaton(f).unwrap();
        assert!(auto.dfa().num_states() >= 3);
        assert!(auto.accepts_values(&[5, 0]));
        assert!(auto.accepts_values(&[6, 1]));
        assert!(auto.accepts_values(&[-1, -6]));
        assert!(auto.accepts_values(&[105, 100]));
        assert!(!auto.accepts_values(&[5, 1]));
        assert!(!auto.accepts_values(&[0, 0]));
        // the empty word encodes nothing
        assert!(!auto.accepts_word(&[]));
    }

    #[test]
    fn test_single_variable_equality() {
        let auto = BinaryIntAutomaton::make_equality(single(FormulaKind::Eq, 1, 5));
        for v in -8..=12 {
            assert_eq!(auto.accepts_values(&[v]), v == 5, "value {v}");
        }
        let neg = BinaryIntAutomaton::make_equality(single(FormulaKind::Eq, 1, -3));
        for v in -8..=8 {
            assert_eq!(neg.accepts_values(&[v]), v == -3, "value {v}");
        }
    }

    #[test]
    fn test_comparison_boundaries() {
        for c in [-4i64, -1, 0, 1, 3, 7] {
            let lt = BinaryIntAutomaton::make_less_than(single(FormulaKind::Lt, 1, c));
            let le = BinaryIntAutomaton::make_less_than_or_equal(single(FormulaKind::Le, 1, c));
            let gt = BinaryIntAutomaton::make_greater_than(single(FormulaKind::Gt, 1, c));
            let ge = BinaryIntAutomaton::make_greater_than_or_equal(single(FormulaKind::Ge, 1, c));
            for v in (c - 5)..=(c + 5) {
                assert_eq!(lt.accepts_values(&[v]), v < c, "{v} < {c}");
                assert_eq!(le.accepts_values(&[v]), v <= c, "{v} <= {c}");
                assert_eq!(gt.accepts_values(&[v]), v > c, "{v} > {c}");
                assert_eq!(ge.accepts_values(&[v]), v >= c, "{v} >= {c}");
            }
        }
    }

    #[test]
    fn test_scaled_comparison() {
        // 2x < 5  <=>  x <= 2
        let auto = BinaryIntAutomaton::make_less_than(single(FormulaKind::Lt, 2, 5));
        for v in -4..=6 {
            assert_eq!(auto.accepts_values(&[v]), 2 * v < 5, "value {v}");
        }
    }

    #[test]
    fn test_inconsistent_formula_gives_phi() {
        // 0 = 5 over one track
        let auto = BinaryIntAutomaton::make_equality(single(FormulaKind::Eq, 0, 5));
        assert!(auto.is_empty_language());
        // 2x = 5 has no integer solution
        let auto = BinaryIntAutomaton::make_equality(single(FormulaKind::Eq, 2, 5));
        assert!(auto.is_empty_language());
        // and its disequality is universal
        let auto = BinaryIntAutomaton::make_not_equality(single(FormulaKind::NotEq, 2, 5));
        for v in -6..=6 {
            assert!(auto.accepts_values(&[v]));
        }
    }

    #[test]
    fn test_not_equality() {
        let auto = BinaryIntAutomaton::make_not_equality(single(FormulaKind::NotEq, 1, 3));
        for v in -6..=8 {
            assert_eq!(auto.accepts_values(&[v]), v != 3, "value {v}");
        }
        assert_eq!(auto.formula().kind(), FormulaKind::NotEq);
    }

    #[test]
    fn test_comparison_duality() {
        for f in [
            single(FormulaKind::Lt, 1, 3),
            single(FormulaKind::Le, 1, -2),
            single(FormulaKind::Eq, 1, 4),
            formula(FormulaKind::Ge, &[("x", 2), ("y", -3)], 1),
        ] {
            let auto = BinaryIntAutomaton::make_automaton(f.clone()).unwrap();
            let dual = BinaryIntAutomaton::make_automaton(f.negated()).unwrap();
            assert!(
                auto.complement().is_equivalent_to(&dual).unwrap(),
                "duality for {f}"
            );
        }
    }

    #[test]
    fn test_de_morgan() {
        let a = BinaryIntAutomaton::make_automaton(formula(
            FormulaKind::Le,
            &[("x", 1), ("y", 1)],
            4,
        ))
        .unwrap();
        let b = BinaryIntAutomaton::make_automaton(formula(
            FormulaKind::Ge,
            &[("x", 1), ("y", -1)],
            0,
        ))
        .unwrap();
        let lhs = a.intersect(&b).unwrap().complement();
        let rhs = a.complement().union(&b.complement()).unwrap();
        assert!(lhs.is_equivalent_to(&rhs).unwrap());
    }

    #[test]
    fn test_ordering_mismatch() {
        let a = BinaryIntAutomaton::make_automaton(formula(
            FormulaKind::Eq,
            &[("x", 1), ("y", 1)],
            0,
        ))
        .unwrap();
        let b = BinaryIntAutomaton::make_automaton(formula(
            FormulaKind::Eq,
            &[("y", 1), ("x", 1)],
            0,
        ))
        .unwrap();
        assert!(matches!(
            a.intersect(&b),
            Err(Error::OrderingMismatch { .. })
        ));
    }

    #[test]
    fn test_projection_of_bounded_system() {
        // 2x + 3y <= 7, x >= 0, y >= 0: x ranges over {0, 1, 2, 3}
        let sum = BinaryIntAutomaton::make_automaton(formula(
            FormulaKind::Le,
            &[("x", 2), ("y", 3)],
            7,
        ))
        .unwrap();
        let x_pos = BinaryIntAutomaton::make_automaton(formula(
            FormulaKind::Ge,
            &[("x", 1), ("y", 0)],
            0,
        ))
        .unwrap();
        let y_pos = BinaryIntAutomaton::make_automaton(formula(
            FormulaKind::Ge,
            &[("x", 0), ("y", 1)],
            0,
        ))
        .unwrap();
        let system = sum.intersect(&x_pos).unwrap().intersect(&y_pos).unwrap();
        assert!(system.accepts_values(&[3, 0]));
        assert!(!system.accepts_values(&[4, 0]));

        let x_values = system.project_to("x");
        assert_eq!(x_values.num_tracks(), 1);
        for v in -3..=6 {
            assert_eq!(x_values.accepts_values(&[v]), (0..=3).contains(&v), "x = {v}");
        }
    }

    #[test]
    fn test_sign_slices() {
        let auto = BinaryIntAutomaton::make_automaton(single(FormulaKind::Eq, 1, -3)).unwrap();
        assert!(auto.positive_values_for("x").unwrap().is_empty_language());
        assert!(auto.negative_values_for("x").unwrap().accepts_values(&[-3]));

        let pos = BinaryIntAutomaton::make_automaton(single(FormulaKind::Eq, 1, 4)).unwrap();
        assert!(pos.positive_values_for("x").unwrap().accepts_values(&[4]));
        assert!(pos.negative_values_for("x").unwrap().is_empty_language());
    }

    #[test]
    fn test_has_negative_one() {
        let minus_one =
            BinaryIntAutomaton::make_automaton(single(FormulaKind::Eq, 1, -1)).unwrap();
        assert!(minus_one.has_negative_one());
        let five = BinaryIntAutomaton::make_automaton(single(FormulaKind::Eq, 1, 5)).unwrap();
        assert!(!five.has_negative_one());
    }

    fn one_track() -> ArithmeticFormula {
        single(FormulaKind::Eq, 1, 0)
    }

    fn natural_members(auto: &BinaryIntAutomaton, bound: u64) -> Vec<u64> {
        (0..=bound).filter(|&v| auto.accepts_natural(v)).collect()
    }

    #[test]
    fn test_semilinear_constants_automaton() {
        let set = SemilinearSet::from_constants([0, 2, 4]);
        let auto =
            BinaryIntAutomaton::from_semilinear_set(&set, "x", one_track(), false).unwrap();
        assert_eq!(natural_members(&auto, 10), vec![0, 2, 4]);
    }

    #[test]
    fn test_semilinear_periodic_automaton() {
        let mut set = SemilinearSet::new();
        set.set_cycle_head(3);
        set.set_period(5);
        set.add_periodic_constant(0);
        set.add_periodic_constant(2);
        let auto =
            BinaryIntAutomaton::from_semilinear_set(&set, "x", one_track(), false).unwrap();
        assert_eq!(natural_members(&auto, 20), vec![3, 5, 8, 10, 13, 15, 18, 20]);
    }

    #[test]
    fn test_semilinear_mixed_automaton() {
        let mut set = SemilinearSet::new();
        set.add_constant(1);
        set.set_cycle_head(2);
        set.set_period(3);
        set.add_periodic_constant(0);
        let auto =
            BinaryIntAutomaton::from_semilinear_set(&set, "x", one_track(), false).unwrap();
        assert_eq!(natural_members(&auto, 12), vec![1, 2, 5, 8, 11]);
    }

    #[test]
    fn test_semilinear_leading_zero_track() {
        let set = SemilinearSet::from_constants([2]);
        let auto = BinaryIntAutomaton::from_semilinear_set(&set, "x", one_track(), true).unwrap();
        // acceptance is routed through the padding track: the encodings of 2
        // carry at least one high-order zero
        assert!(auto.accepts_word(&[0, 1, 0]));
        assert!(auto.accepts_word(&[0, 1, 0, 0]));
        assert!(!auto.accepts_word(&[0, 1]));
        assert!(!auto.accepts_word(&[1, 0]));
    }

    #[test]
    fn test_trim_leading_zeros() {
        let mut set = SemilinearSet::new();
        set.set_cycle_head(2);
        set.set_period(3);
        set.add_periodic_constant(0);
        let auto =
            BinaryIntAutomaton::from_semilinear_set(&set, "x", one_track(), false).unwrap();
        // the periodic construction accepts zero-padded encodings of 2
        assert!(auto.accepts_word(&[0, 1]));
        assert!(auto.accepts_word(&[0, 1, 0]));
        let trimmed = auto.trim_leading_zeros();
        assert!(trimmed.accepts_word(&[0, 1]));
        assert!(!trimmed.accepts_word(&[0, 1, 0]));
    }

    fn roundtrip(set: &SemilinearSet) {
        let auto =
            BinaryIntAutomaton::from_semilinear_set(set, "x", one_track(), false).unwrap();
        let back = auto.to_semilinear_set().unwrap();
        let mut canonical = set.clone();
        canonical.canonicalize();
        assert_eq!(back, canonical, "round trip of {set}");
    }

    #[test]
    fn test_roundtrip_finite() {
        roundtrip(&SemilinearSet::from_constants([0, 2, 4]));
        roundtrip(&SemilinearSet::from_constants([5]));
        roundtrip(&SemilinearSet::from_constants([0]));
    }

    #[test]
    fn test_roundtrip_periodic() {
        let mut s = SemilinearSet::new();
        s.set_cycle_head(3);
        s.set_period(5);
        s.add_periodic_constant(0);
        s.add_periodic_constant(2);
        roundtrip(&s);

        let mut multiples = SemilinearSet::new();
        multiples.set_period(3);
        multiples.add_periodic_constant(0);
        roundtrip(&multiples);

        let mut odds = SemilinearSet::new();
        odds.set_cycle_head(1);
        odds.set_period(2);
        odds.add_periodic_constant(0);
        roundtrip(&odds);

        let mut every_fifth = SemilinearSet::new();
        every_fifth.set_cycle_head(5);
        every_fifth.set_period(5);
        every_fifth.add_periodic_constant(0);
        roundtrip(&every_fifth);
    }

    #[test]
    fn test_roundtrip_mixed() {
        let mut s = SemilinearSet::new();
        s.add_constant(1);
        s.set_cycle_head(2);
        s.set_period(3);
        s.add_periodic_constant(0);
        roundtrip(&s);

        let mut t = SemilinearSet::new();
        t.add_constant(2);
        t.add_constant(3);
        t.set_cycle_head(4);
        t.set_period(6);
        t.add_periodic_constant(0);
        t.add_periodic_constant(3);
        roundtrip(&t);
    }

    #[test]
    fn test_extraction_failure_is_structured() {
        // powers of two: state 0 loops on 0, a single 1 reaches the accepting
        // state, anything further dies. The words 0^k 1 encode 2^k, which is
        // regular but not semilinear.
        let mut builder = DfaBuilder::new(3, 1).unwrap();
        builder.alloc_exceptions(1);
        builder
            .store_exception(0, &BitPattern::fixed(1, 0))
            .unwrap();
        builder.store_state(1).unwrap();
        builder.alloc_exceptions(0);
        builder.store_state(2).unwrap();
        builder.alloc_exceptions(0);
        builder.store_state(2).unwrap();
        let dfa = builder.build("-+-").unwrap();
        let auto = BinaryIntAutomaton {
            id: fresh_id(),
            dfa,
            formula: one_track(),
        };
        match auto.to_semilinear_set() {
            Err(Error::SemilinearExtraction { variable, .. }) => assert_eq!(variable, "x"),
            other => panic!("expected extraction failure, got {other:?}"),
        }
    }

    #[test]
    fn test_unary_bridge() {
        let mut s = SemilinearSet::new();
        s.set_cycle_head(3);
        s.set_period(5);
        s.add_periodic_constant(0);
        s.add_periodic_constant(2);
        let auto =
            BinaryIntAutomaton::from_semilinear_set(&s, "x", one_track(), false).unwrap();
        let unary = auto.to_unary_automaton().unwrap();
        assert_eq!(unary.to_semilinear_set(), s);
    }
}
