//! EL 推論規則
//!
//! Every processed conclusion is handed to the rules registered for its kind
//! in [`rules_for`]. Rules read the premises of the context being drained and
//! the indexed ontology, and write `(target root, conclusion)` pairs into the
//! worker's buffer. They never touch another context directly.

use crate::conclusion::{Conclusion, ConclusionKind};
use crate::context::Premises;
use crate::SaturationError;
use fukurow_el_index::{
    ClassId, ClassNode, ConjunctPosition, DisjointnessAxiom, DisjointnessId, IndexedClassExpression,
    IndexedOntology, PropertyId, PropertyNode,
};

/// Inference rules of the EL calculus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    // ContextInitialization
    RootContextInitialization,
    OwlThingContextInitialization,
    // SubContextInitialization
    PropagationInitialization,
    // ComposedSubsumer
    SuperClassFromSubClass,
    IndexedClassFromDefinition,
    EquivalentClassFirstFromSecond,
    EquivalentClassSecondFromFirst,
    ObjectIntersectionFromFirstConjunct,
    ObjectIntersectionFromSecondConjunct,
    ObjectUnionFromDisjunct,
    PropagationFromExistentialFiller,
    DisjointSubsumerFromMember,
    ContradictionFromOwlNothing,
    ContradictionFromNegation,
    // DecomposedSubsumer
    ComposedFromDecomposedSubsumer,
    IndexedClassDecomposition,
    IndexedObjectIntersectionOfDecomposition,
    IndexedObjectSomeValuesFromDecomposition,
    IndexedObjectHasSelfDecomposition,
    IndexedObjectComplementOfDecomposition,
    // ForwardLink
    BackwardLinkFromForwardLink,
    NonReflexiveBackwardLinkComposition,
    ReflexiveBackwardLinkComposition,
    // BackwardLink
    SubsumerBackwardLink,
    ContradictionOverBackwardLink,
    BackwardLinkChainFromBackwardLink,
    // Propagation
    SubsumerPropagation,
    // DisjointSubsumer
    ContradictionComposition,
    // Contradiction
    ContradictionPropagation,
}

use RuleKind::*;

const CONTEXT_INITIALIZATION_RULES: &[RuleKind] =
    &[RootContextInitialization, OwlThingContextInitialization];
const SUB_CONTEXT_INITIALIZATION_RULES: &[RuleKind] = &[PropagationInitialization];
const COMPOSED_SUBSUMER_RULES: &[RuleKind] = &[
    SuperClassFromSubClass,
    IndexedClassFromDefinition,
    EquivalentClassFirstFromSecond,
    EquivalentClassSecondFromFirst,
    ObjectIntersectionFromFirstConjunct,
    ObjectIntersectionFromSecondConjunct,
    ObjectUnionFromDisjunct,
    PropagationFromExistentialFiller,
    DisjointSubsumerFromMember,
    ContradictionFromOwlNothing,
    ContradictionFromNegation,
];
const DECOMPOSED_SUBSUMER_RULES: &[RuleKind] = &[
    ComposedFromDecomposedSubsumer,
    IndexedClassDecomposition,
    IndexedObjectIntersectionOfDecomposition,
    IndexedObjectSomeValuesFromDecomposition,
    IndexedObjectHasSelfDecomposition,
    IndexedObjectComplementOfDecomposition,
];
const FORWARD_LINK_RULES: &[RuleKind] = &[
    BackwardLinkFromForwardLink,
    NonReflexiveBackwardLinkComposition,
    ReflexiveBackwardLinkComposition,
];
const BACKWARD_LINK_RULES: &[RuleKind] = &[
    SubsumerBackwardLink,
    ContradictionOverBackwardLink,
    BackwardLinkChainFromBackwardLink,
];
const PROPAGATION_RULES: &[RuleKind] = &[SubsumerPropagation];
const DISJOINT_SUBSUMER_RULES: &[RuleKind] = &[ContradictionComposition];
const CONTRADICTION_RULES: &[RuleKind] = &[ContradictionPropagation];

/// Rules registered for a conclusion kind
pub fn rules_for(kind: ConclusionKind) -> &'static [RuleKind] {
    match kind {
        ConclusionKind::ContextInitialization => CONTEXT_INITIALIZATION_RULES,
        ConclusionKind::SubContextInitialization => SUB_CONTEXT_INITIALIZATION_RULES,
        ConclusionKind::ComposedSubsumer => COMPOSED_SUBSUMER_RULES,
        ConclusionKind::DecomposedSubsumer => DECOMPOSED_SUBSUMER_RULES,
        ConclusionKind::ForwardLink => FORWARD_LINK_RULES,
        ConclusionKind::BackwardLink => BACKWARD_LINK_RULES,
        ConclusionKind::Propagation => PROPAGATION_RULES,
        ConclusionKind::DisjointSubsumer => DISJOINT_SUBSUMER_RULES,
        ConclusionKind::Contradiction => CONTRADICTION_RULES,
    }
}

impl RuleKind {
    pub const COUNT: usize = 29;

    pub const ALL: [RuleKind; RuleKind::COUNT] = [
        RootContextInitialization,
        OwlThingContextInitialization,
        PropagationInitialization,
        SuperClassFromSubClass,
        IndexedClassFromDefinition,
        EquivalentClassFirstFromSecond,
        EquivalentClassSecondFromFirst,
        ObjectIntersectionFromFirstConjunct,
        ObjectIntersectionFromSecondConjunct,
        ObjectUnionFromDisjunct,
        PropagationFromExistentialFiller,
        DisjointSubsumerFromMember,
        ContradictionFromOwlNothing,
        ContradictionFromNegation,
        ComposedFromDecomposedSubsumer,
        IndexedClassDecomposition,
        IndexedObjectIntersectionOfDecomposition,
        IndexedObjectSomeValuesFromDecomposition,
        IndexedObjectHasSelfDecomposition,
        IndexedObjectComplementOfDecomposition,
        BackwardLinkFromForwardLink,
        NonReflexiveBackwardLinkComposition,
        ReflexiveBackwardLinkComposition,
        SubsumerBackwardLink,
        ContradictionOverBackwardLink,
        BackwardLinkChainFromBackwardLink,
        SubsumerPropagation,
        ContradictionComposition,
        ContradictionPropagation,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Kind of the premise this rule is registered for
    pub fn premise(self) -> ConclusionKind {
        match self {
            RootContextInitialization | OwlThingContextInitialization => {
                ConclusionKind::ContextInitialization
            }
            PropagationInitialization => ConclusionKind::SubContextInitialization,
            SuperClassFromSubClass
            | IndexedClassFromDefinition
            | EquivalentClassFirstFromSecond
            | EquivalentClassSecondFromFirst
            | ObjectIntersectionFromFirstConjunct
            | ObjectIntersectionFromSecondConjunct
            | ObjectUnionFromDisjunct
            | PropagationFromExistentialFiller
            | DisjointSubsumerFromMember
            | ContradictionFromOwlNothing
            | ContradictionFromNegation => ConclusionKind::ComposedSubsumer,
            ComposedFromDecomposedSubsumer
            | IndexedClassDecomposition
            | IndexedObjectIntersectionOfDecomposition
            | IndexedObjectSomeValuesFromDecomposition
            | IndexedObjectHasSelfDecomposition
            | IndexedObjectComplementOfDecomposition => ConclusionKind::DecomposedSubsumer,
            BackwardLinkFromForwardLink
            | NonReflexiveBackwardLinkComposition
            | ReflexiveBackwardLinkComposition => ConclusionKind::ForwardLink,
            SubsumerBackwardLink
            | ContradictionOverBackwardLink
            | BackwardLinkChainFromBackwardLink => ConclusionKind::BackwardLink,
            SubsumerPropagation => ConclusionKind::Propagation,
            ContradictionComposition => ConclusionKind::DisjointSubsumer,
            ContradictionPropagation => ConclusionKind::Contradiction,
        }
    }

    /// Rules deriving new subsumers are pointless once the root is unsatisfiable
    pub fn skipped_when_inconsistent(self) -> bool {
        matches!(
            self.premise(),
            ConclusionKind::ComposedSubsumer
                | ConclusionKind::DisjointSubsumer
                | ConclusionKind::Propagation
                | ConclusionKind::SubContextInitialization
        ) || self == SubsumerBackwardLink
    }

    pub fn name(self) -> &'static str {
        match self {
            RootContextInitialization => "RootContextInitialization",
            OwlThingContextInitialization => "OwlThingContextInitialization",
            PropagationInitialization => "PropagationInitialization",
            SuperClassFromSubClass => "SuperClassFromSubClass",
            IndexedClassFromDefinition => "IndexedClassFromDefinition",
            EquivalentClassFirstFromSecond => "EquivalentClassFirstFromSecond",
            EquivalentClassSecondFromFirst => "EquivalentClassSecondFromFirst",
            ObjectIntersectionFromFirstConjunct => "ObjectIntersectionFromFirstConjunct",
            ObjectIntersectionFromSecondConjunct => "ObjectIntersectionFromSecondConjunct",
            ObjectUnionFromDisjunct => "ObjectUnionFromDisjunct",
            PropagationFromExistentialFiller => "PropagationFromExistentialFiller",
            DisjointSubsumerFromMember => "DisjointSubsumerFromMember",
            ContradictionFromOwlNothing => "ContradictionFromOwlNothing",
            ContradictionFromNegation => "ContradictionFromNegation",
            ComposedFromDecomposedSubsumer => "ComposedFromDecomposedSubsumer",
            IndexedClassDecomposition => "IndexedClassDecomposition",
            IndexedObjectIntersectionOfDecomposition => "IndexedObjectIntersectionOfDecomposition",
            IndexedObjectSomeValuesFromDecomposition => "IndexedObjectSomeValuesFromDecomposition",
            IndexedObjectHasSelfDecomposition => "IndexedObjectHasSelfDecomposition",
            IndexedObjectComplementOfDecomposition => "IndexedObjectComplementOfDecomposition",
            BackwardLinkFromForwardLink => "BackwardLinkFromForwardLink",
            NonReflexiveBackwardLinkComposition => "NonReflexiveBackwardLinkComposition",
            ReflexiveBackwardLinkComposition => "ReflexiveBackwardLinkComposition",
            SubsumerBackwardLink => "SubsumerBackwardLink",
            ContradictionOverBackwardLink => "ContradictionOverBackwardLink",
            BackwardLinkChainFromBackwardLink => "BackwardLinkChainFromBackwardLink",
            SubsumerPropagation => "SubsumerPropagation",
            ContradictionComposition => "ContradictionComposition",
            ContradictionPropagation => "ContradictionPropagation",
        }
    }
}

/// What a rule sees while it runs
pub(crate) struct RuleInput<'a> {
    pub index: &'a IndexedOntology,
    pub root: ClassId,
    pub premises: &'a Premises,
}

impl<'a> RuleInput<'a> {
    fn class(&self, id: ClassId) -> Result<&'a ClassNode, SaturationError> {
        self.index.class(id).ok_or(SaturationError::MissingNode {
            kind: "class",
            id: id.0,
        })
    }

    fn property(&self, id: PropertyId) -> Result<&'a PropertyNode, SaturationError> {
        self.index.property(id).ok_or(SaturationError::MissingNode {
            kind: "property",
            id: id.0,
        })
    }

    fn disjointness(&self, id: DisjointnessId) -> Result<&'a DisjointnessAxiom, SaturationError> {
        self.index.disjointness(id).ok_or(SaturationError::MissingNode {
            kind: "disjointness axiom",
            id: id.0,
        })
    }

    /// `source ⊑ ∃relation.target`, stored as a forward link at the source
    /// when some composition has `relation` on its right
    fn link(
        &self,
        source: ClassId,
        relation: PropertyId,
        target: ClassId,
        out: &mut Vec<(ClassId, Conclusion)>,
    ) -> Result<(), SaturationError> {
        if self.property(relation)?.saturated.needs_forward_links {
            out.push((source, Conclusion::ForwardLink { relation, target }));
        } else {
            out.push((target, Conclusion::BackwardLink { relation, source }));
        }
        Ok(())
    }
}

/// Apply one rule to a freshly processed premise
pub(crate) fn apply(
    rule: RuleKind,
    premise: &Conclusion,
    input: &RuleInput<'_>,
    out: &mut Vec<(ClassId, Conclusion)>,
) -> Result<(), SaturationError> {
    let root = input.root;
    let premises = input.premises;

    match (rule, *premise) {
        (RootContextInitialization, Conclusion::ContextInitialization) => {
            out.push((root, Conclusion::DecomposedSubsumer(root)));
        }
        (OwlThingContextInitialization, Conclusion::ContextInitialization) => {
            out.push((root, Conclusion::DecomposedSubsumer(input.index.owl_thing())));
        }

        (PropagationInitialization, Conclusion::SubContextInitialization { sub_root }) => {
            for &sup in &input.property(sub_root)?.saturated.super_properties {
                for &existential in &input.property(sup)?.negative_existentials {
                    if let IndexedClassExpression::ObjectSomeValuesFrom { filler, .. } =
                        input.class(existential)?.expression
                    {
                        if premises.composed.contains(&filler) {
                            let carry = existential;
                            out.push((root, Conclusion::Propagation { relation: sub_root, carry }));
                        }
                    }
                }
            }
        }

        (SuperClassFromSubClass, Conclusion::ComposedSubsumer(d)) => {
            for &sup in &input.class(d)?.told_superclasses {
                out.push((root, Conclusion::DecomposedSubsumer(sup)));
            }
        }
        (IndexedClassFromDefinition, Conclusion::ComposedSubsumer(d)) => {
            for &defined in &input.class(d)?.defined_classes {
                out.push((root, Conclusion::ComposedSubsumer(defined)));
            }
        }
        (EquivalentClassFirstFromSecond, Conclusion::ComposedSubsumer(d)) => {
            for equivalence in input.class(d)?.equivalences.iter().filter(|e| !e.first) {
                out.push((root, Conclusion::DecomposedSubsumer(equivalence.partner)));
            }
        }
        (EquivalentClassSecondFromFirst, Conclusion::ComposedSubsumer(d)) => {
            for equivalence in input.class(d)?.equivalences.iter().filter(|e| e.first) {
                out.push((root, Conclusion::DecomposedSubsumer(equivalence.partner)));
            }
        }
        (ObjectIntersectionFromFirstConjunct, Conclusion::ComposedSubsumer(d)) => {
            compose_conjunctions(d, ConjunctPosition::First, input, out)?;
        }
        (ObjectIntersectionFromSecondConjunct, Conclusion::ComposedSubsumer(d)) => {
            compose_conjunctions(d, ConjunctPosition::Second, input, out)?;
        }
        (ObjectUnionFromDisjunct, Conclusion::ComposedSubsumer(d)) => {
            for &union in &input.class(d)?.negative_unions {
                out.push((root, Conclusion::ComposedSubsumer(union)));
            }
        }
        (PropagationFromExistentialFiller, Conclusion::ComposedSubsumer(d)) => {
            for &existential in &input.class(d)?.negative_existentials {
                let IndexedClassExpression::ObjectSomeValuesFrom { property, .. } =
                    input.class(existential)?.expression
                else {
                    continue;
                };
                let saturated = &input.property(property)?.saturated;
                for &sub in &saturated.sub_properties {
                    if premises.sub_contexts.contains(&sub) {
                        let carry = existential;
                        out.push((root, Conclusion::Propagation { relation: sub, carry }));
                    }
                }
                if saturated.reflexive {
                    out.push((root, Conclusion::ComposedSubsumer(existential)));
                }
            }
        }
        (DisjointSubsumerFromMember, Conclusion::ComposedSubsumer(d)) => {
            for &axiom in &input.class(d)?.disjointness_axioms {
                out.push((root, Conclusion::DisjointSubsumer { axiom, member: d }));
            }
        }
        (ContradictionFromOwlNothing, Conclusion::ComposedSubsumer(d)) => {
            if d == input.index.owl_nothing() {
                out.push((root, Conclusion::Contradiction));
            }
        }
        (ContradictionFromNegation, Conclusion::ComposedSubsumer(d)) => {
            if let Some(complement) = input.class(d)?.positive_complement {
                if premises.decomposed.contains(&complement) {
                    out.push((root, Conclusion::Contradiction));
                }
            }
        }

        (ComposedFromDecomposedSubsumer, Conclusion::DecomposedSubsumer(d)) => {
            if input.class(d)?.is_named() {
                out.push((root, Conclusion::ComposedSubsumer(d)));
            }
        }
        (IndexedClassDecomposition, Conclusion::DecomposedSubsumer(d)) => {
            if let Some(definition) = input.class(d)?.definition {
                out.push((root, Conclusion::DecomposedSubsumer(definition)));
            }
        }
        (IndexedObjectIntersectionOfDecomposition, Conclusion::DecomposedSubsumer(d)) => {
            if let IndexedClassExpression::ObjectIntersectionOf { first, second } =
                input.class(d)?.expression
            {
                out.push((root, Conclusion::DecomposedSubsumer(first)));
                out.push((root, Conclusion::DecomposedSubsumer(second)));
            }
        }
        (IndexedObjectSomeValuesFromDecomposition, Conclusion::DecomposedSubsumer(d)) => {
            if let IndexedClassExpression::ObjectSomeValuesFrom { property, filler } =
                input.class(d)?.expression
            {
                input.link(root, property, filler, out)?;
            }
        }
        (IndexedObjectHasSelfDecomposition, Conclusion::DecomposedSubsumer(d)) => {
            if let IndexedClassExpression::ObjectHasSelf { property } = input.class(d)?.expression {
                input.link(root, property, root, out)?;
            }
        }
        (IndexedObjectComplementOfDecomposition, Conclusion::DecomposedSubsumer(d)) => {
            if let IndexedClassExpression::ObjectComplementOf { negated } =
                input.class(d)?.expression
            {
                if premises.composed.contains(&negated) {
                    out.push((root, Conclusion::Contradiction));
                }
            }
        }

        (BackwardLinkFromForwardLink, Conclusion::ForwardLink { relation, target }) => {
            out.push((target, Conclusion::BackwardLink { relation, source: root }));
        }
        (NonReflexiveBackwardLinkComposition, Conclusion::ForwardLink { relation, target }) => {
            for (&backward, sources) in &premises.backward_links {
                for &composed in input.index.compositions(backward, relation) {
                    for &source in sources {
                        input.link(source, composed, target, out)?;
                    }
                }
            }
        }
        (ReflexiveBackwardLinkComposition, Conclusion::ForwardLink { relation, target }) => {
            for &reflexive in input.index.reflexive_properties() {
                for &composed in input.index.compositions(reflexive, relation) {
                    input.link(root, composed, target, out)?;
                }
            }
        }

        (SubsumerBackwardLink, Conclusion::BackwardLink { relation, source }) => {
            out.push((root, Conclusion::SubContextInitialization { sub_root: relation }));
            if let Some(carries) = premises.propagations.get(&relation) {
                for &carry in carries {
                    out.push((source, Conclusion::ComposedSubsumer(carry)));
                }
            }
        }
        (ContradictionOverBackwardLink, Conclusion::BackwardLink { source, .. }) => {
            if premises.inconsistent {
                out.push((source, Conclusion::Contradiction));
            }
        }
        (BackwardLinkChainFromBackwardLink, Conclusion::BackwardLink { relation, source }) => {
            for (&forward, targets) in &premises.forward_links {
                for &composed in input.index.compositions(relation, forward) {
                    for &target in targets {
                        input.link(source, composed, target, out)?;
                    }
                }
            }
            for &reflexive in input.index.reflexive_properties() {
                for &composed in input.index.compositions(relation, reflexive) {
                    input.link(source, composed, root, out)?;
                }
            }
        }

        (SubsumerPropagation, Conclusion::Propagation { relation, carry }) => {
            if let Some(sources) = premises.backward_links.get(&relation) {
                for &source in sources {
                    out.push((source, Conclusion::ComposedSubsumer(carry)));
                }
            }
        }

        (ContradictionComposition, Conclusion::DisjointSubsumer { axiom, member }) => {
            let disjointness = input.disjointness(axiom)?;
            let clash = disjointness.repeated_members.contains(&member)
                || premises
                    .disjoint_subsumers
                    .get(&axiom)
                    .is_some_and(|members| members.iter().any(|&other| other != member));
            if clash {
                out.push((root, Conclusion::Contradiction));
            }
        }

        (ContradictionPropagation, Conclusion::Contradiction) => {
            for sources in premises.backward_links.values() {
                for &source in sources {
                    out.push((source, Conclusion::Contradiction));
                }
            }
        }

        (rule, premise) => {
            return Err(SaturationError::InvariantViolation(format!(
                "{} cannot handle {}",
                rule.name(),
                premise
            )));
        }
    }

    Ok(())
}

fn compose_conjunctions(
    conjunct: ClassId,
    position: ConjunctPosition,
    input: &RuleInput<'_>,
    out: &mut Vec<(ClassId, Conclusion)>,
) -> Result<(), SaturationError> {
    let negatives = &input.class(conjunct)?.negative_conjunctions;
    for negative in negatives.iter().filter(|n| n.position == position) {
        if input.premises.composed.contains(&negative.partner) {
            out.push((input.root, Conclusion::ComposedSubsumer(negative.conjunction)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fukurow_el_index::{index_ontology, Axiom, ClassExpression, Ontology, OwlIri};
    use std::collections::HashSet;

    fn iri(name: &str) -> String {
        format!("http://example.org/{}", name)
    }

    fn id(index: &IndexedOntology, name: &str) -> ClassId {
        index.class_id(&OwlIri::new(iri(name))).unwrap()
    }

    fn run(
        index: &IndexedOntology,
        root: ClassId,
        premises: &Premises,
        premise: Conclusion,
    ) -> Vec<(ClassId, Conclusion)> {
        let input = RuleInput { index, root, premises };
        let mut out = Vec::new();
        for &rule in rules_for(premise.kind()) {
            apply(rule, &premise, &input, &mut out).unwrap();
        }
        out
    }

    #[test]
    fn test_every_rule_is_registered_exactly_once() {
        let mut seen = HashSet::new();
        for kind in ConclusionKind::ALL {
            for &rule in rules_for(kind) {
                assert_eq!(rule.premise(), kind, "{} registered under {:?}", rule.name(), kind);
                assert!(seen.insert(rule), "{} registered twice", rule.name());
            }
        }
        assert_eq!(seen.len(), RuleKind::COUNT);
    }

    #[test]
    fn test_rule_indices_are_dense() {
        for (i, rule) in RuleKind::ALL.iter().enumerate() {
            assert_eq!(rule.index(), i);
        }
    }

    #[test]
    fn test_inconsistency_skips_subsumer_rules_only() {
        assert!(SuperClassFromSubClass.skipped_when_inconsistent());
        assert!(SubsumerBackwardLink.skipped_when_inconsistent());
        assert!(PropagationInitialization.skipped_when_inconsistent());
        assert!(!IndexedObjectSomeValuesFromDecomposition.skipped_when_inconsistent());
        assert!(!ContradictionOverBackwardLink.skipped_when_inconsistent());
        assert!(!ContradictionPropagation.skipped_when_inconsistent());
    }

    #[test]
    fn test_context_initialization_seeds_root_and_thing() {
        let mut ontology = Ontology::new();
        ontology.declare_class(iri("A"));
        let index = index_ontology(&ontology).unwrap();
        let a = id(&index, "A");

        let out = run(&index, a, &Premises::default(), Conclusion::ContextInitialization);

        assert_eq!(
            out,
            vec![
                (a, Conclusion::DecomposedSubsumer(a)),
                (a, Conclusion::DecomposedSubsumer(index.owl_thing())),
            ]
        );
    }

    #[test]
    fn test_conjunction_needs_composed_partner() {
        let mut ontology = Ontology::new();
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::and([
                ClassExpression::class(iri("B")),
                ClassExpression::class(iri("C")),
            ]),
            ClassExpression::class(iri("D")),
        ));
        let index = index_ontology(&ontology).unwrap();
        let (b, c) = (id(&index, "B"), id(&index, "C"));
        let root = id(&index, "D");

        let mut premises = Premises::default();
        premises.insert(Conclusion::ComposedSubsumer(b));
        assert!(run(&index, root, &premises, Conclusion::ComposedSubsumer(b)).is_empty());

        premises.insert(Conclusion::ComposedSubsumer(c));
        let out = run(&index, root, &premises, Conclusion::ComposedSubsumer(c));
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].1, Conclusion::ComposedSubsumer(_)));
    }

    #[test]
    fn test_existential_decomposition_links_to_filler() {
        let mut ontology = Ontology::new();
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::class(iri("A")),
            ClassExpression::some(iri("r"), ClassExpression::class(iri("B"))),
        ));
        let index = index_ontology(&ontology).unwrap();
        let (a, b) = (id(&index, "A"), id(&index, "B"));
        let r = index.property_id(&OwlIri::new(iri("r"))).unwrap();
        let existential = index.class(a).unwrap().told_superclasses[0];

        let out = run(&index, a, &Premises::default(), Conclusion::DecomposedSubsumer(existential));

        assert_eq!(out, vec![(b, Conclusion::BackwardLink { relation: r, source: a })]);
    }

    #[test]
    fn test_transitive_property_uses_forward_links() {
        let mut ontology = Ontology::new();
        ontology.add_axiom(Axiom::TransitiveObjectProperty(OwlIri::new(iri("r"))));
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::class(iri("A")),
            ClassExpression::some(iri("r"), ClassExpression::class(iri("B"))),
        ));
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::class(iri("B")),
            ClassExpression::some(iri("r"), ClassExpression::class(iri("C"))),
        ));
        let index = index_ontology(&ontology).unwrap();
        let (a, b, c) = (id(&index, "A"), id(&index, "B"), id(&index, "C"));
        let r = index.property_id(&OwlIri::new(iri("r"))).unwrap();

        // B holds A -r-> B and now learns B -r-> C
        let mut premises = Premises::default();
        premises.insert(Conclusion::BackwardLink { relation: r, source: a });
        let forward = Conclusion::ForwardLink { relation: r, target: c };
        premises.insert(forward);
        let out = run(&index, b, &premises, forward);

        assert!(out.contains(&(c, Conclusion::BackwardLink { relation: r, source: b })));
        assert!(out.contains(&(a, Conclusion::ForwardLink { relation: r, target: c })));
    }

    #[test]
    fn test_disjoint_members_clash() {
        let mut ontology = Ontology::new();
        ontology.add_axiom(Axiom::DisjointClasses(vec![
            ClassExpression::class(iri("A")),
            ClassExpression::class(iri("B")),
        ]));
        let index = index_ontology(&ontology).unwrap();
        let (a, b) = (id(&index, "A"), id(&index, "B"));
        let axiom = DisjointnessId(0);

        let mut premises = Premises::default();
        let first = Conclusion::DisjointSubsumer { axiom, member: a };
        premises.insert(first);
        assert!(run(&index, a, &premises, first).is_empty());

        let second = Conclusion::DisjointSubsumer { axiom, member: b };
        premises.insert(second);
        assert_eq!(run(&index, a, &premises, second), vec![(a, Conclusion::Contradiction)]);
    }

    #[test]
    fn test_contradiction_reaches_every_backward_source() {
        let index = index_ontology(&Ontology::new()).unwrap();
        let root = index.owl_nothing();
        let mut premises = Premises::default();
        premises.insert(Conclusion::BackwardLink { relation: PropertyId(0), source: ClassId(7) });
        premises.insert(Conclusion::BackwardLink { relation: PropertyId(1), source: ClassId(8) });
        premises.insert(Conclusion::Contradiction);

        let mut out = run(&index, root, &premises, Conclusion::Contradiction);
        out.sort();

        assert_eq!(
            out,
            vec![
                (ClassId(7), Conclusion::Contradiction),
                (ClassId(8), Conclusion::Contradiction),
            ]
        );
    }

    #[test]
    fn test_unknown_node_is_reported() {
        let index = index_ontology(&Ontology::new()).unwrap();
        let input = RuleInput {
            index: &index,
            root: index.owl_thing(),
            premises: &Premises::default(),
        };
        let mut out = Vec::new();

        let premise = Conclusion::ComposedSubsumer(ClassId(99));
        let result = apply(SuperClassFromSubClass, &premise, &input, &mut out);

        assert!(matches!(result, Err(SaturationError::MissingNode { kind: "class", id: 99 })));
    }

    #[test]
    fn test_wrong_premise_kind_is_an_invariant_violation() {
        let index = index_ontology(&Ontology::new()).unwrap();
        let input = RuleInput {
            index: &index,
            root: index.owl_thing(),
            premises: &Premises::default(),
        };
        let mut out = Vec::new();

        let result = apply(SuperClassFromSubClass, &Conclusion::Contradiction, &input, &mut out);

        match result {
            Err(SaturationError::InvariantViolation(message)) => {
                assert!(message.contains(SuperClassFromSubClass.name()));
            }
            other => panic!("expected an invariant violation, got {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_registered_rules_accept_their_premise() {
        let index = index_ontology(&Ontology::new()).unwrap();
        let premises = Premises::default();
        let input = RuleInput {
            index: &index,
            root: index.owl_thing(),
            premises: &premises,
        };
        let mut out = Vec::new();

        for &rule in rules_for(ConclusionKind::Contradiction) {
            assert!(apply(rule, &Conclusion::Contradiction, &input, &mut out).is_ok());
        }
        for &rule in rules_for(ConclusionKind::ContextInitialization) {
            assert!(apply(rule, &Conclusion::ContextInitialization, &input, &mut out).is_ok());
        }
    }
}
