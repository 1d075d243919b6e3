// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Semilinear sets of natural numbers
//!
//! A semilinear set is a finite set of constants plus, when the period is
//! nonzero, a periodic tail `{cycle_head + p + k*period : p in
//! periodic_constants, k >= 0}`. Every regular language's length set has this
//! shape, which is what connects string automata to integer reasoning.
//!
//! Canonical form:
//! - `periodic_constants` lie in `[0, period)`, are sorted, and contain 0, so
//!   the cycle head is the least element of the tail;
//! - the period is the smallest one that generates the tail;
//! - no constant is already covered by the tail, and constants that merely
//!   extend the tail downward are folded into it by lowering the cycle head.
//!

use std::fmt::Display;

///
/// Semilinear set `constants ∪ (cycle_head + periodic_constants + period·ℕ)`
///
/// A zero period denotes a finite set consisting of the constants alone.
///
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SemilinearSet {
    constants: Vec<u64>,
    cycle_head: u64,
    period: u64,
    periodic_constants: Vec<u64>,
}

impl SemilinearSet {
    /// The empty set.
    pub fn new() -> Self {
        SemilinearSet::default()
    }

    /// Finite set of the given constants.
    pub fn from_constants<I: IntoIterator<Item = u64>>(constants: I) -> Self {
        let mut s = SemilinearSet::new();
        for c in constants {
            s.add_constant(c);
        }
        s
    }

    /// The constants, sorted.
    pub fn constants(&self) -> &[u64] {
        &self.constants
    }

    /// Whether any constants are present.
    pub fn has_constants(&self) -> bool {
        !self.constants.is_empty()
    }

    /// First value of the periodic tail.
    pub fn cycle_head(&self) -> u64 {
        self.cycle_head
    }

    /// Period of the tail; 0 for a finite set.
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Offsets of the tail relative to the cycle head, sorted.
    pub fn periodic_constants(&self) -> &[u64] {
        &self.periodic_constants
    }

    /// Insert a constant, keeping the list sorted and duplicate-free.
    pub fn add_constant(&mut self, value: u64) {
        if let Err(at) = self.constants.binary_search(&value) {
            self.constants.insert(at, value);
        }
    }

    /// Set the cycle head.
    pub fn set_cycle_head(&mut self, cycle_head: u64) {
        self.cycle_head = cycle_head;
    }

    /// Set the period.
    pub fn set_period(&mut self, period: u64) {
        self.period = period;
    }

    /// Insert a periodic offset, keeping the list sorted and duplicate-free.
    pub fn add_periodic_constant(&mut self, offset: u64) {
        if let Err(at) = self.periodic_constants.binary_search(&offset) {
            self.periodic_constants.insert(at, offset);
        }
    }

    /// Reset to the empty set.
    pub fn clear(&mut self) {
        self.constants.clear();
        self.cycle_head = 0;
        self.period = 0;
        self.periodic_constants.clear();
    }

    /// Whether the set has no members at all.
    pub fn is_empty_set(&self) -> bool {
        self.constants.is_empty() && (self.period == 0 || self.periodic_constants.is_empty())
    }

    /// Membership test.
    pub fn contains(&self, value: u64) -> bool {
        if self.constants.binary_search(&value).is_ok() {
            return true;
        }
        self.period > 0
            && value >= self.cycle_head
            && self
                .periodic_constants
                .binary_search(&((value - self.cycle_head) % self.period))
                .is_ok()
    }

    /// All members up to and including a bound, in increasing order.
    pub fn members_up_to(&self, bound: u64) -> Vec<u64> {
        let mut out: Vec<u64> = self.constants.iter().copied().filter(|&c| c <= bound).collect();
        if self.period > 0 {
            for &p in &self.periodic_constants {
                let mut v = self.cycle_head + p;
                while v <= bound {
                    out.push(v);
                    v += self.period;
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    ///
    /// Restore the canonical form after a sequence of mutations
    ///
    pub fn canonicalize(&mut self) {
        if self.period == 0 || self.periodic_constants.is_empty() {
            self.cycle_head = 0;
            self.period = 0;
            self.periodic_constants.clear();
            return;
        }
        let r = self.period;
        let mut offsets: Vec<u64> = self.periodic_constants.iter().map(|&p| p % r).collect();
        offsets.sort_unstable();
        offsets.dedup();

        // smallest divisor of the period whose residue chains reproduce the offsets
        for cand in 1..=r {
            if r % cand != 0 {
                continue;
            }
            let mut reduced: Vec<u64> = offsets.iter().map(|&p| p % cand).collect();
            reduced.sort_unstable();
            reduced.dedup();
            let mut expanded: Vec<u64> = reduced
                .iter()
                .flat_map(|&p| (0..r / cand).map(move |k| p + k * cand))
                .collect();
            expanded.sort_unstable();
            if expanded == offsets {
                self.period = cand;
                offsets = reduced;
                break;
            }
        }
        let r = self.period;

        // drop constants the tail already covers
        let head = self.cycle_head;
        self.constants
            .retain(|&c| !(c >= head && offsets.binary_search(&((c - head) % r)).is_ok()));

        // absorb constants that extend the tail downward
        while self.cycle_head > 0 {
            let v = self.cycle_head - 1;
            let shifted: Vec<u64> = {
                let mut s: Vec<u64> = offsets.iter().map(|&p| (p + 1) % r).collect();
                s.sort_unstable();
                s.dedup();
                s
            };
            let extends = shifted.binary_search(&0).is_ok();
            if extends {
                match self.constants.binary_search(&v) {
                    Ok(at) => {
                        self.constants.remove(at);
                    }
                    Err(_) => break,
                }
            }
            self.cycle_head = v;
            offsets = shifted;
        }

        // shift so the cycle head is the least element of the tail
        let dmin = offsets[0];
        self.cycle_head += dmin;
        for p in &mut offsets {
            *p -= dmin;
        }
        self.periodic_constants = offsets;
    }

    ///
    /// Canonical union of this set with another
    ///
    pub fn union_with(&self, other: &SemilinearSet) -> SemilinearSet {
        let mut out = SemilinearSet::new();
        for &c in self.constants.iter().chain(other.constants.iter()) {
            out.add_constant(c);
        }
        let parts: Vec<&SemilinearSet> = [self, other]
            .into_iter()
            .filter(|s| s.period > 0 && !s.periodic_constants.is_empty())
            .collect();
        match parts.len() {
            0 => {}
            1 => {
                out.cycle_head = parts[0].cycle_head;
                out.period = parts[0].period;
                out.periodic_constants = parts[0].periodic_constants.clone();
            }
            _ => {
                let r = parts
                    .iter()
                    .fold(1, |acc, s| crate::formula::lcm(acc, s.period));
                // minimal member of every residue class modulo the joint period
                let mut mins: Vec<Option<u64>> = vec![None; r as usize];
                for s in &parts {
                    for &p in &s.periodic_constants {
                        for k in 0..r / s.period {
                            let v = s.cycle_head + p + k * s.period;
                            let cls = (v % r) as usize;
                            if mins[cls].map_or(true, |m| v < m) {
                                mins[cls] = Some(v);
                            }
                        }
                    }
                }
                let head = mins.iter().flatten().copied().max().unwrap();
                for m in mins.iter().flatten().copied() {
                    let mut v = m;
                    while v < head {
                        out.add_constant(v);
                        v += r;
                    }
                    out.add_periodic_constant((v - head) % r);
                }
                out.cycle_head = head;
                out.period = r;
            }
        }
        out.canonicalize();
        out
    }
}

impl Display for SemilinearSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, c) in self.constants.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "}}")?;
        if self.period > 0 {
            write!(f, " ∪ {} + {{", self.cycle_head)?;
            for (i, p) in self.periodic_constants.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, "}} + {}ℕ", self.period)?;
        }
        Ok(())
    }
}
