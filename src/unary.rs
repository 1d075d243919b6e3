// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Unary automata for length analysis
//!
//! A unary automaton reads a one-letter alphabet, so a word is just its
//! length and the language is a set of naturals. Any semilinear set renders
//! as a chain of states for the values below the cycle head followed by one
//! cycle of `period` states; reading `n` letters lands on position `n` (or
//! its residue inside the cycle), which is accepting exactly when `n` is a
//! member.
//!
//! The inverse direction walks the single-symbol path from the initial
//! state: it is shaped like the Greek letter rho, a tail followed by a loop,
//! which reads back directly as constants plus a periodic part.
//!

use std::fmt::Display;

use tracing::trace;

use crate::dfa::{Dfa, DfaBuilder};
use crate::semilinear::SemilinearSet;

///
/// DFA over a singleton alphabet whose language is a set of word lengths
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryAutomaton {
    dfa: Dfa,
}

impl UnaryAutomaton {
    /// The underlying DFA (alphabet size 1).
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.dfa.num_states()
    }

    /// Check whether the length `n` is accepted.
    pub fn accepts_length(&self, n: u64) -> bool {
        let mut state = self.dfa.initial_state();
        for _ in 0..n {
            state = self.dfa.next_state(state, 0);
        }
        self.dfa.is_accepting(state)
    }

    ///
    /// Build the unary automaton of a semilinear set
    ///
    /// With a nonzero period the automaton has `chain + period` states where
    /// `chain` is the cycle head, extended when constants reach past it so
    /// that every constant keeps its own position. A finite set becomes a
    /// chain ending in a sink.
    ///
    pub fn from_semilinear_set(set: &SemilinearSet) -> Self {
        let dfa = if set.period() == 0 {
            // chain of max+1 positions and a sink
            let top = set.constants().last().copied();
            let chain = top.map_or(0, |m| m as usize + 1);
            let num_states = chain + 1;
            let sink = num_states - 1;
            let mut b = DfaBuilder::new(num_states, 0).expect("unary width");
            for i in 0..chain {
                b.alloc_exceptions(0);
                b.store_state(i + 1).expect("chain state");
            }
            b.alloc_exceptions(0);
            b.store_state(sink).expect("sink state");
            let statuses: String = (0..num_states)
                .map(|i| {
                    if i < chain && set.contains(i as u64) {
                        '+'
                    } else {
                        '-'
                    }
                })
                .collect();
            b.build(&statuses).expect("unary build")
        } else {
            let head = set.cycle_head();
            let chain = set
                .constants()
                .last()
                .map_or(head, |&m| head.max(m + 1)) as usize;
            let period = set.period() as usize;
            let num_states = chain + period;
            let mut b = DfaBuilder::new(num_states, 0).expect("unary width");
            for i in 0..num_states {
                let next = if i + 1 < num_states { i + 1 } else { chain };
                b.alloc_exceptions(0);
                b.store_state(next).expect("unary state");
            }
            let statuses: String = (0..num_states)
                .map(|i| if set.contains(i as u64) { '+' } else { '-' })
                .collect();
            b.build(&statuses).expect("unary build")
        };
        let auto = UnaryAutomaton { dfa };
        trace!(set = %set, states = auto.num_states(), "unary from_semilinear_set");
        auto
    }

    ///
    /// Read the semilinear set back off the automaton
    ///
    /// Follows the single-symbol path until a state repeats: accepting
    /// positions on the tail are constants, accepting positions on the loop
    /// form the periodic part. The result is canonical.
    ///
    pub fn to_semilinear_set(&self) -> SemilinearSet {
        let mut seen_at = vec![usize::MAX; self.dfa.num_states()];
        let mut positions = Vec::new();
        let mut state = self.dfa.initial_state();
        while seen_at[state] == usize::MAX {
            seen_at[state] = positions.len();
            positions.push(state);
            state = self.dfa.next_state(state, 0);
        }
        let loop_start = seen_at[state];
        let period = positions.len() - loop_start;
        let mut set = SemilinearSet::new();
        let loop_accepting = positions[loop_start..]
            .iter()
            .any(|&s| self.dfa.is_accepting(s));
        for (i, &s) in positions.iter().enumerate() {
            if !self.dfa.is_accepting(s) {
                continue;
            }
            if i < loop_start || !loop_accepting {
                set.add_constant(i as u64);
            } else {
                set.add_periodic_constant((i - loop_start) as u64);
            }
        }
        if loop_accepting {
            set.set_cycle_head(loop_start as u64);
            set.set_period(period as u64);
        }
        set.canonicalize();
        set
    }
}

impl Display for UnaryAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unary automaton with {} states", self.num_states())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_periodic_set_layout() {
        // cycle head 3, period 5, offsets {0, 2}: 8 states, positions 3 and 5
        // accepting
        let mut s = SemilinearSet::new();
        s.set_cycle_head(3);
        s.set_period(5);
        s.add_periodic_constant(0);
        s.add_periodic_constant(2);
        let auto = UnaryAutomaton::from_semilinear_set(&s);
        assert_eq!(auto.num_states(), 8);
        for n in 0..8 {
            let expect = n == 3 || n == 5;
            assert_eq!(auto.accepts_length(n), expect, "position {n}");
        }
        // beyond the first cycle: 8 = 3 + 0 + 5, 10 = 3 + 2 + 5
        assert!(auto.accepts_length(8));
        assert!(auto.accepts_length(10));
        assert!(!auto.accepts_length(9));
    }

    #[test]
    fn test_finite_set() {
        let s = SemilinearSet::from_constants([1, 4]);
        let auto = UnaryAutomaton::from_semilinear_set(&s);
        for n in 0..12 {
            assert_eq!(auto.accepts_length(n), n == 1 || n == 4, "length {n}");
        }
        assert_eq!(auto.to_semilinear_set(), s);
    }

    #[test]
    fn test_empty_set() {
        let auto = UnaryAutomaton::from_semilinear_set(&SemilinearSet::new());
        for n in 0..5 {
            assert!(!auto.accepts_length(n));
        }
        assert!(auto.to_semilinear_set().is_empty_set());
    }

    #[test]
    fn test_roundtrip_periodic() {
        let mut s = SemilinearSet::new();
        s.set_cycle_head(3);
        s.set_period(5);
        s.add_periodic_constant(0);
        s.add_periodic_constant(2);
        let auto = UnaryAutomaton::from_semilinear_set(&s);
        assert_eq!(auto.to_semilinear_set(), s);
    }

    #[test]
    fn test_roundtrip_with_high_constant() {
        // a constant beyond the cycle head keeps its own chain position
        let mut s = SemilinearSet::new();
        s.add_constant(6);
        s.set_cycle_head(4);
        s.set_period(3);
        s.add_periodic_constant(0);
        let auto = UnaryAutomaton::from_semilinear_set(&s);
        for n in 0..16 {
            let expect = n == 6 || (n >= 4 && (n - 4) % 3 == 0);
            assert_eq!(auto.accepts_length(n), expect, "length {n}");
        }
        assert_eq!(auto.to_semilinear_set(), s);
    }
}
