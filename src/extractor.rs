// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! String-relation extraction from assertion trees
//!
//! The [StringRelationGenerator] walks an assertion term bottom-up and
//! distills, per relational component, the string comparisons that the
//! multi-track string-DFA subsystem can represent. A comparison survives
//! only when at least one side is a plain string variable (with a narrow
//! exception for variable-plus-constant concats); everything else is
//! rejected and flows on as "no relation".
//!
//! While visiting a component, every variable that occurs in an accepted
//! relation is registered in the component's [TrackMap] in first-occurrence
//! order. All bookkeeping lives in side tables keyed by term identity; the
//! arena keeps ownership of the terms.
//!

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{ConstantKind, ConstraintInformation, Sort, SymbolTable, Term, TermArena, TermRef};
use crate::relation::{StringRelation, TrackMap};

///
/// Visitor that extracts string relations and assigns track maps
///
#[derive(Debug)]
pub struct StringRelationGenerator<'a, C: ConstraintInformation> {
    arena: &'a TermArena,
    symbols: &'a SymbolTable,
    info: &'a C,
    current_component: Option<TermRef>,
    relations: HashMap<TermRef, Option<StringRelation>>,
    variable_parent: HashMap<String, TermRef>,
    track_maps: HashMap<TermRef, TrackMap>,
    component_relations: HashMap<TermRef, Vec<TermRef>>,
    components: Vec<TermRef>,
}

impl<'a, C: ConstraintInformation> StringRelationGenerator<'a, C> {
    /// New extractor over an arena, a symbol table, and the component oracle.
    pub fn new(arena: &'a TermArena, symbols: &'a SymbolTable, info: &'a C) -> Self {
        StringRelationGenerator {
            arena,
            symbols,
            info,
            current_component: None,
            relations: HashMap::new(),
            variable_parent: HashMap::new(),
            track_maps: HashMap::new(),
            component_relations: HashMap::new(),
            components: Vec::new(),
        }
    }

    /// Run the extraction from an assertion root.
    pub fn start(&mut self, root: TermRef) {
        debug!(?root, "string relation extraction starts");
        self.current_component = Some(root);
        self.visit(root);
    }

    /// The relation extracted for a term, if one survived.
    pub fn relation_of(&self, term: TermRef) -> Option<&StringRelation> {
        self.relations.get(&term).and_then(|r| r.as_ref())
    }

    /// The track map of a component term.
    pub fn track_map_of(&self, component: TermRef) -> Option<&TrackMap> {
        self.track_maps.get(&component)
    }

    /// Component terms in discovery order.
    pub fn components(&self) -> &[TermRef] {
        &self.components
    }

    /// Terms whose relations were accepted under a component.
    pub fn component_relation_terms(&self, component: TermRef) -> &[TermRef] {
        self.component_relations
            .get(&component)
            .map_or(&[], |v| v.as_slice())
    }

    /// The component a string variable was first seen in.
    pub fn parent_term_of(&self, variable: &str) -> Option<TermRef> {
        self.variable_parent.get(variable).copied()
    }

    fn visit(&mut self, term: TermRef) {
        let node = self.arena.get(term);
        match node {
            Term::And(children) => self.visit_and(term, children),
            Term::Or(children) => self.visit_or(term, children),
            Term::Not(child) => self.visit(*child),
            Term::Eq(l, r) => self.visit_comparison(term, *l, *r, Comparison::Eq),
            Term::NotEq(l, r) => self.visit_comparison(term, *l, *r, Comparison::NotEq),
            Term::Lt(l, r) => self.visit_comparison(term, *l, *r, Comparison::Lt),
            Term::Le(l, r) => self.visit_comparison(term, *l, *r, Comparison::Le),
            Term::Gt(l, r) => self.visit_comparison(term, *l, *r, Comparison::Gt),
            Term::Ge(l, r) => self.visit_comparison(term, *l, *r, Comparison::Ge),
            Term::Begins { subject, search } => {
                self.visit_begins(term, *subject, *search, false)
            }
            Term::NotBegins { subject, search } => {
                self.visit_begins(term, *subject, *search, true)
            }
            // concat relations are built lazily by the comparison visitors
            Term::Concat(_) => {}
            Term::QualIdentifier(name) => self.visit_qual_identifier(term, name),
            Term::TermConstant { value, kind } => {
                self.visit_term_constant(term, value, *kind)
            }
        }
    }

    fn visit_and(&mut self, term: TermRef, children: &[TermRef]) {
        let saved = self.current_component;
        self.current_component = Some(term);
        for &child in children {
            self.visit(child);
        }
        if self.info.is_component(term) {
            self.track_maps.entry(term).or_default();
            self.components.push(term);
            debug!(?term, map = %self.track_maps[&term], "component");
        }
        self.current_component = saved;
    }

    fn visit_or(&mut self, term: TermRef, children: &[TermRef]) {
        // each disjunct is its own component; no joint track map
        let saved = self.current_component;
        self.current_component = Some(term);
        for &child in children {
            self.visit(child);
        }
        self.current_component = saved;
    }

    fn visit_qual_identifier(&mut self, term: TermRef, name: &str) {
        let relation = match self.symbols.get_variable(name) {
            Some(variable) if variable.sort() == Sort::String => {
                if let Some(component) = self.current_component {
                    self.variable_parent.insert(name.to_string(), component);
                }
                Some(StringRelation::StringVar(name.to_string()))
            }
            _ => None,
        };
        self.relations.insert(term, relation);
    }

    fn visit_term_constant(&mut self, term: TermRef, value: &str, kind: ConstantKind) {
        if self.relations.contains_key(&term) {
            return;
        }
        let relation = match kind {
            ConstantKind::String => Some(StringRelation::StringConstant(value.to_string())),
            ConstantKind::Regex => Some(StringRelation::Regex(value.to_string())),
            _ => None,
        };
        self.relations.insert(term, relation);
    }

    // Relation of a comparison operand: what the walk stored, or a lazily
    // built variable-plus-constant concat.
    fn operand_relation(&self, term: TermRef) -> Option<StringRelation> {
        if let Some(stored) = self.relations.get(&term) {
            return stored.clone();
        }
        if let Term::Concat(items) = self.arena.get(term) {
            if let [var_term, constant_term] = items[..] {
                if let (Term::QualIdentifier(name), Term::TermConstant { value, kind }) =
                    (self.arena.get(var_term), self.arena.get(constant_term))
                {
                    let is_string_var = self
                        .symbols
                        .get_variable(name)
                        .is_some_and(|v| v.sort() == Sort::String);
                    if is_string_var && *kind == ConstantKind::String {
                        return Some(StringRelation::ConcatVarConstant(
                            Box::new(StringRelation::StringVar(name.clone())),
                            Box::new(StringRelation::StringConstant(value.clone())),
                        ));
                    }
                }
            }
        }
        None
    }

    fn term_is(&self, term: TermRef, predicate: fn(&Term) -> bool) -> bool {
        predicate(self.arena.get(term))
    }

    fn reject(&mut self, term: TermRef, left: TermRef, right: TermRef) {
        self.relations.remove(&left);
        self.relations.remove(&right);
        self.relations.insert(term, None);
    }

    fn accept(&mut self, term: TermRef, left: TermRef, right: TermRef, relation: StringRelation) {
        for side in [relation.left(), relation.right()].into_iter().flatten() {
            if let Some(variable) = side.track_variable() {
                self.register_variable(variable);
            }
        }
        self.relations.remove(&left);
        self.relations.remove(&right);
        debug!(?term, relation = %relation, "accepted relation");
        self.relations.insert(term, Some(relation));
        if let Some(component) = self.current_component {
            self.component_relations
                .entry(component)
                .or_default()
                .push(term);
        }
    }

    fn register_variable(&mut self, name: &str) {
        let component = self
            .current_component
            .expect("start() seeds the root component");
        let map = self.track_maps.entry(component).or_default();
        let track = map.add_variable(name);
        debug!(variable = name, track, "track assignment");
    }

    fn visit_comparison(&mut self, term: TermRef, left: TermRef, right: TermRef, op: Comparison) {
        self.visit(left);
        self.visit(right);
        let left_relation = self.operand_relation(left);
        let right_relation = self.operand_relation(right);
        let (left_relation, right_relation) = match (left_relation, right_relation) {
            (Some(l), Some(r)) => (l, r),
            _ => return self.reject(term, left, right),
        };
        let is_qual = |t: &Term| matches!(t, Term::QualIdentifier(_));
        let is_constant = |t: &Term| matches!(t, Term::TermConstant { .. });
        let is_concat = |t: &Term| matches!(t, Term::Concat(_));
        let rejected = match op {
            // the multitrack form needs a variable side, and a constant side
            // is handled by the single-track solver instead
            Comparison::Eq | Comparison::NotEq => {
                (!self.term_is(left, is_qual) && !self.term_is(right, is_qual))
                    || self.term_is(left, is_constant)
                    || self.term_is(right, is_constant)
            }
            Comparison::Lt | Comparison::Gt | Comparison::Ge => {
                !self.term_is(left, is_qual) && !self.term_is(right, is_qual)
            }
            // like the other orderings, with two concats rejected as well
            Comparison::Le => {
                (!self.term_is(left, is_qual) && !self.term_is(right, is_qual))
                    || (self.term_is(left, is_concat) && self.term_is(right, is_concat))
            }
        };
        if rejected {
            return self.reject(term, left, right);
        }
        let relation = op.build(left_relation, right_relation);
        self.accept(term, left, right, relation);
    }

    fn visit_begins(&mut self, term: TermRef, subject: TermRef, search: TermRef, negated: bool) {
        self.visit(subject);
        self.visit(search);
        let subject_relation = self.operand_relation(subject);
        let search_relation = self.operand_relation(search);
        let (subject_relation, search_relation) = match (subject_relation, search_relation) {
            (Some(s), Some(r)) => (s, r),
            _ => return self.reject(term, subject, search),
        };
        // the subject must be a variable for the prefix relation to align
        if !matches!(subject_relation, StringRelation::StringVar(_)) {
            return self.reject(term, subject, search);
        }
        let relation = if negated {
            StringRelation::NotBegins(Box::new(subject_relation), Box::new(search_relation))
        } else {
            StringRelation::Begins(Box::new(subject_relation), Box::new(search_relation))
        };
        self.accept(term, subject, search, relation);
    }
}

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn build(self, left: StringRelation, right: StringRelation) -> StringRelation {
        let (l, r) = (Box::new(left), Box::new(right));
        match self {
            Comparison::Eq => StringRelation::Eq(l, r),
            Comparison::NotEq => StringRelation::NotEq(l, r),
            Comparison::Lt => StringRelation::Lt(l, r),
            Comparison::Le => StringRelation::Le(l, r),
            Comparison::Gt => StringRelation::Gt(l, r),
            Comparison::Ge => StringRelation::Ge(l, r),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{AllComponents, Term, Variable};

    fn string_symbols(names: &[&str]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for name in names {
            table.add_variable(Variable::new(*name, Sort::String));
        }
        table
    }

    #[test]
    fn test_component_extraction() {
        // (and (= a b) (begins a "x") (= a (concat c "y")))
        let mut arena = TermArena::new();
        let a1 = arena.var("a");
        let b1 = arena.var("b");
        let eq_ab = arena.add(Term::Eq(a1, b1));
        let a2 = arena.var("a");
        let x = arena.str_lit("x");
        let begins = arena.add(Term::Begins {
            subject: a2,
            search: x,
        });
        let a3 = arena.var("a");
        let c1 = arena.var("c");
        let y = arena.str_lit("y");
        let concat = arena.add(Term::Concat(vec![c1, y]));
        let eq_concat = arena.add(Term::Eq(a3, concat));
        let and = arena.add(Term::And(vec![eq_ab, begins, eq_concat]));

        let symbols = string_symbols(&["a", "b", "c"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(and);

        assert_eq!(generator.components(), &[and]);
        let map = generator.track_map_of(and).unwrap();
        assert_eq!(map.track_of("a"), Some(0));
        assert_eq!(map.track_of("b"), Some(1));
        assert_eq!(map.track_of("c"), Some(2));
        assert_eq!(map.len(), 3);

        assert_eq!(generator.component_relation_terms(and).len(), 3);
        assert!(matches!(
            generator.relation_of(eq_ab),
            Some(StringRelation::Eq(_, _))
        ));
        assert!(matches!(
            generator.relation_of(begins),
            Some(StringRelation::Begins(_, _))
        ));
        match generator.relation_of(eq_concat) {
            Some(StringRelation::Eq(_, right)) => {
                assert!(matches!(**right, StringRelation::ConcatVarConstant(_, _)));
                assert_eq!(right.track_variable(), Some("c"));
            }
            other => panic!("unexpected relation {other:?}"),
        }
        assert_eq!(generator.parent_term_of("a"), Some(and));
    }

    #[test]
    fn test_constant_equality_is_rejected() {
        // (and (= a "literal")): no relation, a stays off the track map
        let mut arena = TermArena::new();
        let a = arena.var("a");
        let lit = arena.str_lit("literal");
        let eq = arena.add(Term::Eq(a, lit));
        let and = arena.add(Term::And(vec![eq]));

        let symbols = string_symbols(&["a"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(and);

        assert!(generator.relation_of(eq).is_none());
        let map = generator.track_map_of(and).unwrap();
        assert!(map.is_empty());
        assert!(generator.component_relation_terms(and).is_empty());
    }

    #[test]
    fn test_non_string_sides_are_rejected() {
        // b is undeclared, so (= a b) has no right relation
        let mut arena = TermArena::new();
        let a = arena.var("a");
        let b = arena.var("b");
        let eq = arena.add(Term::Eq(a, b));
        let and = arena.add(Term::And(vec![eq]));

        let symbols = string_symbols(&["a"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(and);
        assert!(generator.relation_of(eq).is_none());
        assert!(generator.track_map_of(and).unwrap().is_empty());
    }

    #[test]
    fn test_le_concat_both_sides_rejected() {
        let mut arena = TermArena::new();
        let a = arena.var("a");
        let x = arena.str_lit("x");
        let left = arena.add(Term::Concat(vec![a, x]));
        let b = arena.var("b");
        let y = arena.str_lit("y");
        let right = arena.add(Term::Concat(vec![b, y]));
        let le = arena.add(Term::Le(left, right));
        let and = arena.add(Term::And(vec![le]));

        let symbols = string_symbols(&["a", "b"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(and);
        assert!(generator.relation_of(le).is_none());
        assert!(generator.track_map_of(and).unwrap().is_empty());
    }

    #[test]
    fn test_le_without_variable_side_rejected() {
        // (<= "foo" (concat a "bar")): neither side is a variable occurrence
        let mut arena = TermArena::new();
        let foo = arena.str_lit("foo");
        let a = arena.var("a");
        let bar = arena.str_lit("bar");
        let concat = arena.add(Term::Concat(vec![a, bar]));
        let le = arena.add(Term::Le(foo, concat));
        let and = arena.add(Term::And(vec![le]));

        let symbols = string_symbols(&["a"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(and);
        assert!(generator.relation_of(le).is_none());
        assert!(generator.track_map_of(and).unwrap().is_empty());
    }

    #[test]
    fn test_or_disjuncts_get_separate_track_maps() {
        // (or (and (= a b)) (and (= b c)))
        let mut arena = TermArena::new();
        let a = arena.var("a");
        let b1 = arena.var("b");
        let eq1 = arena.add(Term::Eq(a, b1));
        let and1 = arena.add(Term::And(vec![eq1]));
        let b2 = arena.var("b");
        let c = arena.var("c");
        let eq2 = arena.add(Term::Eq(b2, c));
        let and2 = arena.add(Term::And(vec![eq2]));
        let or = arena.add(Term::Or(vec![and1, and2]));

        let symbols = string_symbols(&["a", "b", "c"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(or);

        assert_eq!(generator.components(), &[and1, and2]);
        let map1 = generator.track_map_of(and1).unwrap();
        assert_eq!(map1.track_of("a"), Some(0));
        assert_eq!(map1.track_of("b"), Some(1));
        assert_eq!(map1.len(), 2);
        let map2 = generator.track_map_of(and2).unwrap();
        assert_eq!(map2.track_of("b"), Some(0));
        assert_eq!(map2.track_of("c"), Some(1));
        assert_eq!(map2.len(), 2);
    }

    #[test]
    fn test_begins_requires_variable_subject() {
        let mut arena = TermArena::new();
        let lit = arena.str_lit("x");
        let a = arena.var("a");
        let begins = arena.add(Term::Begins {
            subject: lit,
            search: a,
        });
        let and = arena.add(Term::And(vec![begins]));

        let symbols = string_symbols(&["a"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(and);
        assert!(generator.relation_of(begins).is_none());
        assert!(generator.track_map_of(and).unwrap().is_empty());
    }

    #[test]
    fn test_begins_registers_both_variables() {
        let mut arena = TermArena::new();
        let a = arena.var("a");
        let b = arena.var("b");
        let begins = arena.add(Term::NotBegins {
            subject: a,
            search: b,
        });
        let and = arena.add(Term::And(vec![begins]));

        let symbols = string_symbols(&["a", "b"]);
        let mut generator = StringRelationGenerator::new(&arena, &symbols, &AllComponents);
        generator.start(and);
        assert!(matches!(
            generator.relation_of(begins),
            Some(StringRelation::NotBegins(_, _))
        ));
        let map = generator.track_map_of(and).unwrap();
        assert_eq!(map.track_of("a"), Some(0));
        assert_eq!(map.track_of("b"), Some(1));
    }
}
