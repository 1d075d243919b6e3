// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! String relations and track maps
//!
//! A [StringRelation] is the relational skeleton the extractor distills from
//! one comparison term: a small tree whose leaves are string variables,
//! string literals, or regex literals, and whose inner nodes carry the
//! comparison. The string-DFA subsystem consumes these trees together with
//! the component's [TrackMap], which fixes the coordinate of every variable
//! in the multi-track alphabet.
//!

use std::fmt::Display;

use indexmap::IndexMap;

///
/// Relational skeleton of a string constraint
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StringRelation {
    /// A string variable, by name.
    StringVar(String),
    /// A string literal.
    StringConstant(String),
    /// A regular-expression literal.
    Regex(String),
    /// A variable concatenated with a constant suffix.
    ConcatVarConstant(Box<StringRelation>, Box<StringRelation>),
    /// Equality of the two sides.
    Eq(Box<StringRelation>, Box<StringRelation>),
    /// Disequality.
    NotEq(Box<StringRelation>, Box<StringRelation>),
    /// Lexicographic less-than.
    Lt(Box<StringRelation>, Box<StringRelation>),
    /// Lexicographic less-or-equal.
    Le(Box<StringRelation>, Box<StringRelation>),
    /// Lexicographic greater-than.
    Gt(Box<StringRelation>, Box<StringRelation>),
    /// Lexicographic greater-or-equal.
    Ge(Box<StringRelation>, Box<StringRelation>),
    /// Prefix relation.
    Begins(Box<StringRelation>, Box<StringRelation>),
    /// Negated prefix relation.
    NotBegins(Box<StringRelation>, Box<StringRelation>),
}

impl StringRelation {
    /// Left child of an inner node.
    pub fn left(&self) -> Option<&StringRelation> {
        match self {
            StringRelation::ConcatVarConstant(l, _)
            | StringRelation::Eq(l, _)
            | StringRelation::NotEq(l, _)
            | StringRelation::Lt(l, _)
            | StringRelation::Le(l, _)
            | StringRelation::Gt(l, _)
            | StringRelation::Ge(l, _)
            | StringRelation::Begins(l, _)
            | StringRelation::NotBegins(l, _) => Some(l),
            _ => None,
        }
    }

    /// Right child of an inner node.
    pub fn right(&self) -> Option<&StringRelation> {
        match self {
            StringRelation::ConcatVarConstant(_, r)
            | StringRelation::Eq(_, r)
            | StringRelation::NotEq(_, r)
            | StringRelation::Lt(_, r)
            | StringRelation::Le(_, r)
            | StringRelation::Gt(_, r)
            | StringRelation::Ge(_, r)
            | StringRelation::Begins(_, r)
            | StringRelation::NotBegins(_, r) => Some(r),
            _ => None,
        }
    }

    ///
    /// The variable this operand contributes to the track map, if any
    ///
    /// A plain variable contributes itself; a variable-plus-constant concat
    /// contributes its variable side. Literals contribute nothing.
    ///
    pub fn track_variable(&self) -> Option<&str> {
        match self {
            StringRelation::StringVar(name) => Some(name),
            StringRelation::ConcatVarConstant(l, _) => l.track_variable(),
            _ => None,
        }
    }
}

impl Display for StringRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StringRelation::StringVar(name) => write!(f, "{name}"),
            StringRelation::StringConstant(value) => write!(f, "{value:?}"),
            StringRelation::Regex(value) => write!(f, "/{value}/"),
            StringRelation::ConcatVarConstant(l, r) => write!(f, "(concat {l} {r})"),
            StringRelation::Eq(l, r) => write!(f, "(= {l} {r})"),
            StringRelation::NotEq(l, r) => write!(f, "(!= {l} {r})"),
            StringRelation::Lt(l, r) => write!(f, "(< {l} {r})"),
            StringRelation::Le(l, r) => write!(f, "(<= {l} {r})"),
            StringRelation::Gt(l, r) => write!(f, "(> {l} {r})"),
            StringRelation::Ge(l, r) => write!(f, "(>= {l} {r})"),
            StringRelation::Begins(l, r) => write!(f, "(begins {l} {r})"),
            StringRelation::NotBegins(l, r) => write!(f, "(not-begins {l} {r})"),
        }
    }
}

///
/// Dense variable-to-track assignment of one relational component
///
/// Indices are assigned in first-occurrence order and stay dense: after
/// registering `n` distinct variables the tracks are exactly `0..n`.
///
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackMap {
    tracks: IndexMap<String, usize>,
}

impl TrackMap {
    /// Empty track map.
    pub fn new() -> Self {
        TrackMap::default()
    }

    ///
    /// Register a variable, assigning the next free track on first sight
    ///
    /// Returns the variable's track index, new or existing.
    ///
    pub fn add_variable(&mut self, name: &str) -> usize {
        if let Some(&track) = self.tracks.get(name) {
            return track;
        }
        let track = self.tracks.len();
        self.tracks.insert(name.to_string(), track);
        track
    }

    /// Track of a registered variable.
    pub fn track_of(&self, name: &str) -> Option<usize> {
        self.tracks.get(name).copied()
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether no variable is registered.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Variables and their tracks in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tracks.iter().map(|(name, &track)| (name.as_str(), track))
    }
}

impl Display for TrackMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, track)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} -> {track}")?;
        }
        write!(f, "}}")
    }
}
