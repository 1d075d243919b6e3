// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Minimization of deterministic finite-state automata
//!

use std::collections::HashMap;

//
// The automaton is defined by
// - a set of states [0 .. N-1], all reachable
// - an alphabet [0 .. M-1]
// - a transition function delta: S x A -> S
// - the accepting predicate
//
// Moore refinement
// ----------------
// - maintain a partition of S, initially {accepting, rejecting}
// - in each round, split states whose successor blocks differ for some
//   character: the signature of s is (block(s), block(delta(s, 0)), ...,
//   block(delta(s, M-1)))
// - stop when a round does not change the partition
//
// Block ids are renumbered by first occurrence in state order on every round,
// so a stable partition reproduces itself exactly and the loop terminates.
// Including block(s) itself in the signature means blocks only ever split;
// the block count is strictly increasing until the fixed point.
//
pub(crate) struct Minimizer<'a, F: Fn(usize, usize) -> usize> {
    num_states: usize,
    alphabet_size: usize,
    delta: &'a F,
    accepting: &'a [bool],
}

impl<'a, F: Fn(usize, usize) -> usize> Minimizer<'a, F> {
    pub(crate) fn new(
        num_states: usize,
        alphabet_size: usize,
        delta: &'a F,
        accepting: &'a [bool],
    ) -> Self {
        Minimizer {
            num_states,
            alphabet_size,
            delta,
            accepting,
        }
    }

    // Refine to the coarsest stable partition; returns the block of each state.
    pub(crate) fn refine(&self) -> Vec<usize> {
        let n = self.num_states;
        let mut block: Vec<usize> = self.accepting.iter().map(|&a| usize::from(a)).collect();
        // normalize the initial labelling to first-occurrence order
        if n > 0 && block[0] == 1 {
            for b in &mut block {
                *b = 1 - *b;
            }
        }
        loop {
            let mut ids: HashMap<Vec<usize>, usize> = HashMap::new();
            let mut next = vec![0usize; n];
            for s in 0..n {
                let mut sig = Vec::with_capacity(self.alphabet_size + 1);
                sig.push(block[s]);
                for c in 0..self.alphabet_size {
                    sig.push(block[(self.delta)(s, c)]);
                }
                let fresh = ids.len();
                next[s] = *ids.entry(sig).or_insert(fresh);
            }
            if next == block {
                return block;
            }
            block = next;
        }
    }
}
