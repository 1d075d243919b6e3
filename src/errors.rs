// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Error codes
//!

use thiserror::Error;

use crate::formula::FormulaKind;

///
/// Errors produced by automata construction and combination
///
/// Inconsistent formulas (for example `0 = 5`) are not errors: the comparison
/// constructors map them to the empty-language automaton, which then flows
/// through boolean combinators as an absorbing element.
///
#[derive(Debug, Error)]
pub enum Error {
    /// Two binary automata with different variable orderings were combined.
    ///
    /// The orchestrator must align the coefficient maps of both operands
    /// before calling `intersect` or `union`.
    #[error("cannot combine binary automata with different variable orderings: [{left}] vs [{right}]")]
    OrderingMismatch {
        /// Variable ordering of the left operand.
        left: String,
        /// Variable ordering of the right operand.
        right: String,
    },

    /// A comparison automaton was requested for a non-comparison formula kind.
    #[error("no comparison automaton for formula kind {0}")]
    UnsupportedFormula(FormulaKind),

    /// The DFA kernel detected an internal invariant violation.
    #[error("dfa kernel: {0}")]
    Kernel(#[from] KernelError),

    /// Semilinear-set extraction could not validate a period candidate.
    ///
    /// Not every regular set of naturals is semilinear (the powers of two are
    /// the classic counterexample), so this is a real outcome. The caller may
    /// fall back to an over-approximation.
    #[error("semilinear extraction failed for automaton [{automaton}] over {variable}: {reason}")]
    SemilinearExtraction {
        /// Id of the subject automaton.
        automaton: u64,
        /// Variable of interest.
        variable: String,
        /// What went wrong.
        reason: String,
    },
}

///
/// Invariant violations in the low-level DFA kernel
///
/// These always indicate a bug in the calling construction code, never bad
/// user input.
///
#[derive(Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    /// More exceptions stored for a state than were allocated.
    #[error("state {state}: {stored} exceptions stored but only {allocated} allocated")]
    ExceptionOverflow {
        /// State being defined.
        state: usize,
        /// Number of allocated exception slots.
        allocated: usize,
        /// Number of exceptions actually stored.
        stored: usize,
    },

    /// A transition target or state id is outside `[0, num_states)`.
    #[error("state index {index} out of range (num_states = {num_states})")]
    StateIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Declared number of states.
        num_states: usize,
    },

    /// A bit pattern or a product operand has the wrong number of variables.
    #[error("expected width {expected}, got {actual}")]
    WidthMismatch {
        /// Expected number of bit positions.
        expected: usize,
        /// Actual number of bit positions.
        actual: usize,
    },

    /// The status string passed to `build` does not have one entry per state.
    #[error("status string has {actual} entries for {expected} states")]
    StatusLengthMismatch {
        /// Declared number of states.
        expected: usize,
        /// Entries in the status string.
        actual: usize,
    },

    /// A status string contains a character other than `+` or `-`.
    #[error("bad status character {0:?}")]
    BadStatusChar(char),

    /// An index replacement map is not a permutation of `[0, num_vars)`.
    #[error("index map is not a permutation of [0, {num_vars})")]
    BadIndexPermutation {
        /// Number of bit positions.
        num_vars: usize,
    },

    /// The requested alphabet is too wide for a dense transition table.
    #[error("{0} variables exceed the kernel limit")]
    TooManyVariables(usize),
}
