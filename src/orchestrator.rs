// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//!
//! Per-component bundling of string relations and arithmetic automata
//!
//! The orchestrator wires the string-relation extractor to the automata
//! engine: it walks an assertion tree, and for every relational component
//! produces the track map, the accepted string relations (the input of the
//! external string-DFA subsystem), and binary integer automata compiled from
//! the component's length and arithmetic formulas. Constraints outside these
//! theories never reach this module; the surrounding solver keeps them.
//!

use tracing::{debug, info};

use crate::ast::{ConstraintInformation, SymbolTable, TermArena, TermRef};
use crate::binary_int::BinaryIntAutomaton;
use crate::errors::Error;
use crate::extractor::StringRelationGenerator;
use crate::formula::ArithmeticFormula;
use crate::relation::{StringRelation, TrackMap};
use crate::unary::UnaryAutomaton;

///
/// Everything the surrounding solver needs about one component
///
#[derive(Debug)]
pub struct ComponentBundle {
    /// The component's and-term.
    pub component: TermRef,
    /// Track assignment of the component's string variables.
    pub track_map: TrackMap,
    /// Accepted string relations, in extraction order.
    pub relations: Vec<StringRelation>,
    /// One automaton per arithmetic formula of the component.
    pub arithmetic: Vec<BinaryIntAutomaton>,
    /// Conjunction of the arithmetic automata, when there are any.
    pub solution: Option<BinaryIntAutomaton>,
}

///
/// Glue between the extractor and the automata engine
///
#[derive(Debug)]
pub struct Orchestrator<'a, C: ConstraintInformation> {
    arena: &'a TermArena,
    symbols: &'a SymbolTable,
    info: &'a C,
}

impl<'a, C: ConstraintInformation> Orchestrator<'a, C> {
    /// New orchestrator over the shared assertion context.
    pub fn new(arena: &'a TermArena, symbols: &'a SymbolTable, info: &'a C) -> Self {
        Orchestrator {
            arena,
            symbols,
            info,
        }
    }

    ///
    /// Extract components from an assertion root and bundle each one
    ///
    /// `length_formulas` supplies the arithmetic formulas of a component
    /// (typically length constraints derived from its string relations by
    /// the caller). All formulas of one component must share a variable
    /// ordering.
    ///
    /// # Errors
    ///
    /// [Error::OrderingMismatch] when a component's formulas disagree on
    /// their variable ordering, and any kernel error from construction.
    ///
    pub fn solve<F>(&self, root: TermRef, length_formulas: F) -> Result<Vec<ComponentBundle>, Error>
    where
        F: Fn(TermRef) -> Vec<ArithmeticFormula>,
    {
        let mut generator = StringRelationGenerator::new(self.arena, self.symbols, self.info);
        generator.start(root);

        let mut bundles = Vec::new();
        for &component in generator.components() {
            let track_map = generator
                .track_map_of(component)
                .cloned()
                .unwrap_or_default();
            let relations: Vec<StringRelation> = generator
                .component_relation_terms(component)
                .iter()
                .filter_map(|&term| generator.relation_of(term).cloned())
                .collect();
            let formulas = length_formulas(component);
            let (arithmetic, solution) = Self::compile_formulas(formulas)?;
            debug!(
                ?component,
                tracks = track_map.len(),
                relations = relations.len(),
                automata = arithmetic.len(),
                "component bundled"
            );
            bundles.push(ComponentBundle {
                component,
                track_map,
                relations,
                arithmetic,
                solution,
            });
        }
        info!(components = bundles.len(), "orchestration done");
        Ok(bundles)
    }

    // One automaton per formula, plus their conjunction.
    fn compile_formulas(
        formulas: Vec<ArithmeticFormula>,
    ) -> Result<(Vec<BinaryIntAutomaton>, Option<BinaryIntAutomaton>), Error> {
        let mut automata = Vec::new();
        for formula in formulas {
            automata.push(BinaryIntAutomaton::make_automaton(formula)?);
        }
        let mut solution: Option<BinaryIntAutomaton> = None;
        for auto in &automata {
            solution = Some(match solution {
                None => auto.clone(),
                Some(acc) => acc.intersect(auto)?,
            });
        }
        Ok((automata, solution))
    }

}

///
/// Length profile of one variable of an arithmetic automaton
///
/// Projects the automaton to the variable, keeps the non-negative values,
/// and renders them as a unary automaton — the cross-validation form the
/// string side consumes.
///
/// # Errors
///
/// [Error::SemilinearExtraction] when the value set resists extraction.
///
/// # Panics
///
/// If `var_name` is not part of the automaton's variable ordering.
///
pub fn length_profile(
    automaton: &BinaryIntAutomaton,
    var_name: &str,
) -> Result<UnaryAutomaton, Error> {
    automaton
        .project_to(var_name)
        .positive_values_for(var_name)?
        .to_unary_automaton()
}
