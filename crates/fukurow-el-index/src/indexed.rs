//! Indexed ontology graph consumed by the saturation engine
//!
//! Every class expression and object property that occurs in the indexed
//! axioms is interned exactly once and addressed by a dense id. The graph is
//! immutable once [`crate::OntologyIndexer::finish`] returns; the engine only
//! ever reads it.

use crate::model::OwlIri;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

dense_id!(
    /// Identity of an indexed class expression
    ClassId
);
dense_id!(
    /// Identity of an indexed object property
    PropertyId
);
dense_id!(
    /// Identity of an indexed disjointness axiom
    DisjointnessId
);

/// Structure of an indexed class expression; children are referenced by id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexedClassExpression {
    Class(OwlIri),
    ObjectIntersectionOf { first: ClassId, second: ClassId },
    ObjectSomeValuesFrom { property: PropertyId, filler: ClassId },
    ObjectHasSelf { property: PropertyId },
    ObjectComplementOf { negated: ClassId },
    ObjectUnionOf { disjuncts: Vec<ClassId> },
}

/// Which side of a binary conjunction a node stands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConjunctPosition {
    First,
    Second,
}

/// A negatively occurring conjunction this node is a conjunct of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NegativeConjunction {
    pub position: ConjunctPosition,
    /// The other conjunct
    pub partner: ClassId,
    pub conjunction: ClassId,
}

/// An `EquivalentClasses` pair this node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equivalence {
    /// Whether this node was listed first in the axiom
    pub first: bool,
    pub partner: ClassId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassNode {
    pub expression: IndexedClassExpression,
    pub positive_occurrences: u32,
    pub negative_occurrences: u32,
    /// `self ⊑ D` for every `D` listed here
    pub told_superclasses: Vec<ClassId>,
    /// `self ≡ D` for a named class with a complex definition
    pub definition: Option<ClassId>,
    /// Named classes whose definition is this node
    pub defined_classes: Vec<ClassId>,
    pub equivalences: Vec<Equivalence>,
    pub negative_conjunctions: Vec<NegativeConjunction>,
    /// Negatively occurring `∃R.self`
    pub negative_existentials: Vec<ClassId>,
    /// Negatively occurring unions listing this node
    pub negative_unions: Vec<ClassId>,
    pub disjointness_axioms: Vec<DisjointnessId>,
    /// Positively occurring `¬self`
    pub positive_complement: Option<ClassId>,
}

impl ClassNode {
    pub(crate) fn new(expression: IndexedClassExpression) -> Self {
        Self {
            expression,
            positive_occurrences: 0,
            negative_occurrences: 0,
            told_superclasses: Vec::new(),
            definition: None,
            defined_classes: Vec::new(),
            equivalences: Vec::new(),
            negative_conjunctions: Vec::new(),
            negative_existentials: Vec::new(),
            negative_unions: Vec::new(),
            disjointness_axioms: Vec::new(),
            positive_complement: None,
        }
    }

    pub fn occurs_positively(&self) -> bool {
        self.positive_occurrences > 0
    }

    pub fn occurs_negatively(&self) -> bool {
        self.negative_occurrences > 0
    }

    pub fn is_named(&self) -> bool {
        matches!(self.expression, IndexedClassExpression::Class(_))
    }

    pub fn iri(&self) -> Option<&OwlIri> {
        match &self.expression {
            IndexedClassExpression::Class(iri) => Some(iri),
            _ => None,
        }
    }
}

/// Property closure computed once all property axioms are indexed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaturatedProperty {
    /// Reflexive transitive closure of the told sub-property relation
    pub sub_properties: Vec<PropertyId>,
    /// Reflexive transitive closure of the told super-property relation
    pub super_properties: Vec<PropertyId>,
    pub reflexive: bool,
    /// Used as the right component of some composition
    pub needs_forward_links: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyNode {
    /// `None` for auxiliary properties introduced by splitting long chains
    pub iri: Option<OwlIri>,
    pub told_super_properties: Vec<PropertyId>,
    pub told_reflexive: bool,
    /// Negatively occurring `∃self.D`
    pub negative_existentials: Vec<ClassId>,
    pub saturated: SaturatedProperty,
}

impl PropertyNode {
    pub(crate) fn new(iri: Option<OwlIri>) -> Self {
        Self {
            iri,
            told_super_properties: Vec::new(),
            told_reflexive: false,
            negative_existentials: Vec::new(),
            saturated: SaturatedProperty::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisjointnessAxiom {
    pub members: Vec<ClassId>,
    /// Members listed more than once; each of them alone is unsatisfiable
    pub repeated_members: HashSet<ClassId>,
}

/// Immutable indexed ontology
#[derive(Debug, Clone)]
pub struct IndexedOntology {
    pub(crate) classes: Vec<ClassNode>,
    pub(crate) properties: Vec<PropertyNode>,
    pub(crate) disjointness: Vec<DisjointnessAxiom>,
    pub(crate) compositions: HashMap<(PropertyId, PropertyId), Vec<PropertyId>>,
    pub(crate) reflexive_properties: Vec<PropertyId>,
    pub(crate) class_ids: HashMap<OwlIri, ClassId>,
    pub(crate) property_ids: HashMap<OwlIri, PropertyId>,
    pub(crate) owl_thing: ClassId,
    pub(crate) owl_nothing: ClassId,
    pub(crate) skipped_axioms: Vec<crate::model::Axiom>,
}

impl IndexedOntology {
    pub fn owl_thing(&self) -> ClassId {
        self.owl_thing
    }

    pub fn owl_nothing(&self) -> ClassId {
        self.owl_nothing
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn contains_class(&self, id: ClassId) -> bool {
        id.index() < self.classes.len()
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassNode> {
        self.classes.get(id.index())
    }

    pub fn property(&self, id: PropertyId) -> Option<&PropertyNode> {
        self.properties.get(id.index())
    }

    pub fn disjointness(&self, id: DisjointnessId) -> Option<&DisjointnessAxiom> {
        self.disjointness.get(id.index())
    }

    pub fn class_id(&self, iri: &OwlIri) -> Option<ClassId> {
        self.class_ids.get(iri).copied()
    }

    pub fn property_id(&self, iri: &OwlIri) -> Option<PropertyId> {
        self.property_ids.get(iri).copied()
    }

    /// All ids of named classes, owl:Thing and owl:Nothing included
    pub fn named_classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_named())
            .map(|(i, _)| ClassId(i as u32))
    }

    /// Properties `T` with `left' ∘ right' ⊑ T`, `left ⊑* left'`, `right ⊑* right'`
    pub fn compositions(&self, left: PropertyId, right: PropertyId) -> &[PropertyId] {
        self.compositions
            .get(&(left, right))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Properties that are reflexive after saturation
    pub fn reflexive_properties(&self) -> &[PropertyId] {
        &self.reflexive_properties
    }

    /// Axioms left out because they fall outside the supported EL fragment
    pub fn skipped_axioms(&self) -> &[crate::model::Axiom] {
        &self.skipped_axioms
    }

    /// IRI of a named class, for diagnostics
    pub fn class_iri(&self, id: ClassId) -> Option<&OwlIri> {
        self.class(id).and_then(ClassNode::iri)
    }
}
