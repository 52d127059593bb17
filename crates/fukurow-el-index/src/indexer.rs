//! OWL EL オントロジーインデクサ

use crate::indexed::{
    ClassId, ClassNode, ConjunctPosition, DisjointnessAxiom, DisjointnessId, Equivalence,
    IndexedClassExpression, IndexedOntology, NegativeConjunction, PropertyId, PropertyNode,
};
use crate::model::{Axiom, ClassExpression, Ontology, OwlIri, OWL_NOTHING, OWL_THING};
use crate::property::{saturate_properties, BinaryChain};
use crate::IndexError;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Position of an expression inside the indexed axioms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Both,
}

impl Polarity {
    pub fn flip(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
            Polarity::Both => Polarity::Both,
        }
    }

    fn positive(self) -> bool {
        matches!(self, Polarity::Positive | Polarity::Both)
    }

    fn negative(self) -> bool {
        matches!(self, Polarity::Negative | Polarity::Both)
    }
}

/// Builds an [`IndexedOntology`] axiom by axiom
pub struct OntologyIndexer {
    classes: Vec<ClassNode>,
    class_lookup: HashMap<IndexedClassExpression, ClassId>,
    properties: Vec<PropertyNode>,
    property_lookup: HashMap<OwlIri, PropertyId>,
    disjointness: Vec<DisjointnessAxiom>,
    chains: Vec<BinaryChain>,
    skipped_axioms: Vec<Axiom>,
    owl_thing: ClassId,
    owl_nothing: ClassId,
}

impl OntologyIndexer {
    pub fn new() -> Self {
        let mut indexer = Self {
            classes: Vec::new(),
            class_lookup: HashMap::new(),
            properties: Vec::new(),
            property_lookup: HashMap::new(),
            disjointness: Vec::new(),
            chains: Vec::new(),
            skipped_axioms: Vec::new(),
            owl_thing: ClassId(0),
            owl_nothing: ClassId(0),
        };
        indexer.owl_thing = indexer.node(IndexedClassExpression::Class(OwlIri::owl_thing()));
        indexer.owl_nothing = indexer.node(IndexedClassExpression::Class(OwlIri::owl_nothing()));
        indexer
    }

    /// Index every declared class and every axiom of the ontology
    pub fn index_ontology(&mut self, ontology: &Ontology) -> Result<(), IndexError> {
        let mut declared: Vec<&OwlIri> = ontology.classes.iter().collect();
        declared.sort();
        for iri in declared {
            self.declare_class(iri);
        }
        for axiom in &ontology.axioms {
            self.add_axiom(axiom)?;
        }
        debug!(
            classes = self.classes.len(),
            properties = self.properties.len(),
            skipped = self.skipped_axioms.len(),
            "Indexed ontology"
        );
        Ok(())
    }

    /// Make a named class known without it occurring in any axiom
    pub fn declare_class(&mut self, iri: &OwlIri) -> ClassId {
        match iri.as_str() {
            OWL_THING => self.owl_thing,
            OWL_NOTHING => self.owl_nothing,
            _ => self.node(IndexedClassExpression::Class(iri.clone())),
        }
    }

    pub fn add_axiom(&mut self, axiom: &Axiom) -> Result<(), IndexError> {
        if let Some(reason) = unsupported_in(axiom) {
            warn!(?axiom, reason, "Skipping axiom outside the supported EL fragment");
            self.skipped_axioms.push(axiom.clone());
            return Ok(());
        }

        match axiom {
            Axiom::SubClassOf(sub, sup) => {
                self.add_subclass(sub, sup);
            }
            Axiom::EquivalentClasses(members) => {
                if members.len() < 2 {
                    return Err(IndexError::TooFewMembers("EquivalentClasses", members.len()));
                }
                let ids: Vec<ClassId> =
                    members.iter().map(|m| self.intern(m, Polarity::Both)).collect();
                let first = ids[0];
                for &other in &ids[1..] {
                    if other == first {
                        continue;
                    }
                    let can_define = self.classes[first.index()].is_named()
                        && !self.classes[other.index()].is_named()
                        && self.classes[first.index()].definition.is_none();
                    if can_define {
                        self.classes[first.index()].definition = Some(other);
                        push_unique(&mut self.classes[other.index()].defined_classes, first);
                    } else {
                        push_unique(
                            &mut self.classes[first.index()].equivalences,
                            Equivalence { first: true, partner: other },
                        );
                        push_unique(
                            &mut self.classes[other.index()].equivalences,
                            Equivalence { first: false, partner: first },
                        );
                    }
                }
            }
            Axiom::DisjointClasses(members) => {
                if members.len() < 2 {
                    return Err(IndexError::TooFewMembers("DisjointClasses", members.len()));
                }
                let ids: Vec<ClassId> =
                    members.iter().map(|m| self.intern(m, Polarity::Negative)).collect();
                self.add_disjointness(ids);
            }
            Axiom::DisjointUnion(defined, members) => {
                if members.is_empty() {
                    return Err(IndexError::EmptyClassList("DisjointUnion"));
                }
                let defined =
                    self.intern(&ClassExpression::Class(defined.clone()), Polarity::Positive);
                let mut ids = Vec::with_capacity(members.len());
                for member in members {
                    let id = self.intern(member, Polarity::Negative);
                    push_unique(&mut self.classes[id.index()].told_superclasses, defined);
                    ids.push(id);
                }
                if ids.len() >= 2 {
                    self.add_disjointness(ids);
                }
            }
            Axiom::SubObjectPropertyOf(sub, sup) => {
                let sub = self.property(sub);
                let sup = self.property(sup);
                push_unique(&mut self.properties[sub.index()].told_super_properties, sup);
            }
            Axiom::EquivalentObjectProperties(members) => {
                if members.len() < 2 {
                    return Err(IndexError::TooFewMembers(
                        "EquivalentObjectProperties",
                        members.len(),
                    ));
                }
                let ids: Vec<PropertyId> = members.iter().map(|m| self.property(m)).collect();
                let first = ids[0];
                for &other in &ids[1..] {
                    push_unique(&mut self.properties[first.index()].told_super_properties, other);
                    push_unique(&mut self.properties[other.index()].told_super_properties, first);
                }
            }
            Axiom::SubObjectPropertyChainOf(chain, sup) => {
                if chain.is_empty() {
                    return Err(IndexError::EmptyPropertyChain);
                }
                let ids: Vec<PropertyId> = chain.iter().map(|p| self.property(p)).collect();
                let sup = self.property(sup);
                self.add_chain(&ids, sup);
            }
            Axiom::TransitiveObjectProperty(p) => {
                let p = self.property(p);
                self.add_chain(&[p, p], p);
            }
            Axiom::ReflexiveObjectProperty(p) => {
                let p = self.property(p);
                self.properties[p.index()].told_reflexive = true;
            }
            Axiom::ObjectPropertyDomain(p, domain) => {
                let existential = ClassExpression::ObjectSomeValuesFrom {
                    property: p.clone(),
                    filler: Box::new(ClassExpression::Thing),
                };
                self.add_subclass(&existential, domain);
            }
        }

        Ok(())
    }

    /// Saturate the property hierarchy and freeze the index
    pub fn finish(mut self) -> IndexedOntology {
        let saturation = saturate_properties(&mut self.properties, &self.chains);

        let class_ids = self
            .classes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.iri().map(|iri| (iri.clone(), ClassId(i as u32))))
            .collect();

        IndexedOntology {
            classes: self.classes,
            properties: self.properties,
            disjointness: self.disjointness,
            compositions: saturation.compositions,
            reflexive_properties: saturation.reflexive_properties,
            class_ids,
            property_ids: self.property_lookup,
            owl_thing: self.owl_thing,
            owl_nothing: self.owl_nothing,
            skipped_axioms: self.skipped_axioms,
        }
    }

    fn add_subclass(&mut self, sub: &ClassExpression, sup: &ClassExpression) {
        let sub = self.intern(sub, Polarity::Negative);
        let sup = self.intern(sup, Polarity::Positive);
        push_unique(&mut self.classes[sub.index()].told_superclasses, sup);
    }

    fn add_disjointness(&mut self, members: Vec<ClassId>) {
        let id = DisjointnessId(self.disjointness.len() as u32);
        let mut seen = HashSet::new();
        let mut repeated_members = HashSet::new();
        for member in &members {
            if !seen.insert(*member) {
                repeated_members.insert(*member);
            }
        }
        for member in &seen {
            push_unique(&mut self.classes[member.index()].disjointness_axioms, id);
        }
        self.disjointness.push(DisjointnessAxiom {
            members,
            repeated_members,
        });
    }

    /// `p1 ∘ ... ∘ pn ⊑ sup`, split right-associatively into binary chains
    fn add_chain(&mut self, chain: &[PropertyId], sup: PropertyId) {
        match chain {
            [] => {}
            [single] => {
                push_unique(&mut self.properties[single.index()].told_super_properties, sup);
            }
            [left, right] => {
                self.chains.push(BinaryChain {
                    left: *left,
                    right: *right,
                    super_property: sup,
                });
            }
            [left, rest @ ..] => {
                let auxiliary = PropertyId(self.properties.len() as u32);
                self.properties.push(PropertyNode::new(None));
                self.chains.push(BinaryChain {
                    left: *left,
                    right: auxiliary,
                    super_property: sup,
                });
                self.add_chain(rest, auxiliary);
            }
        }
    }

    fn property(&mut self, iri: &OwlIri) -> PropertyId {
        if let Some(id) = self.property_lookup.get(iri) {
            return *id;
        }
        let id = PropertyId(self.properties.len() as u32);
        self.properties.push(PropertyNode::new(Some(iri.clone())));
        self.property_lookup.insert(iri.clone(), id);
        id
    }

    fn node(&mut self, expression: IndexedClassExpression) -> ClassId {
        if let Some(id) = self.class_lookup.get(&expression) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassNode::new(expression.clone()));
        self.class_lookup.insert(expression, id);
        id
    }

    fn intern(&mut self, expression: &ClassExpression, polarity: Polarity) -> ClassId {
        let id = match expression {
            ClassExpression::Thing => self.owl_thing,
            ClassExpression::Nothing => self.owl_nothing,
            ClassExpression::Class(iri) => self.declare_class(iri),
            ClassExpression::ObjectIntersectionOf(conjuncts) => match conjuncts.as_slice() {
                [] => self.owl_thing,
                [single] => return self.intern(single, polarity),
                [head, tail @ ..] => {
                    let mut accumulated = self.intern(head, polarity);
                    for conjunct in tail {
                        let second = self.intern(conjunct, polarity);
                        let conjunction = self.node(IndexedClassExpression::ObjectIntersectionOf {
                            first: accumulated,
                            second,
                        });
                        self.occur(conjunction, polarity);
                        accumulated = conjunction;
                    }
                    // the outermost conjunction was already counted in the loop
                    return accumulated;
                }
            },
            ClassExpression::ObjectUnionOf(disjuncts) => {
                let mut ids: Vec<ClassId> = Vec::with_capacity(disjuncts.len());
                for disjunct in disjuncts {
                    let id = self.intern(disjunct, polarity);
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                match ids.as_slice() {
                    [] => self.owl_nothing,
                    [single] => return *single,
                    _ => self.node(IndexedClassExpression::ObjectUnionOf { disjuncts: ids }),
                }
            }
            ClassExpression::ObjectComplementOf(negated) => {
                let negated = self.intern(negated, polarity.flip());
                self.node(IndexedClassExpression::ObjectComplementOf { negated })
            }
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                let property = self.property(property);
                let filler = self.intern(filler, polarity);
                self.node(IndexedClassExpression::ObjectSomeValuesFrom { property, filler })
            }
            ClassExpression::ObjectHasSelf(property) => {
                let property = self.property(property);
                self.node(IndexedClassExpression::ObjectHasSelf { property })
            }
        };
        self.occur(id, polarity);
        id
    }

    /// Count an occurrence and register the structural links that depend on
    /// the node occurring with a given polarity for the first time
    fn occur(&mut self, id: ClassId, polarity: Polarity) {
        let node = &mut self.classes[id.index()];
        let first_positive = polarity.positive() && node.positive_occurrences == 0;
        let first_negative = polarity.negative() && node.negative_occurrences == 0;
        if polarity.positive() {
            node.positive_occurrences += 1;
        }
        if polarity.negative() {
            node.negative_occurrences += 1;
        }

        let expression = node.expression.clone();
        if first_negative {
            match &expression {
                &IndexedClassExpression::ObjectIntersectionOf { first, second } => {
                    push_unique(
                        &mut self.classes[first.index()].negative_conjunctions,
                        NegativeConjunction {
                            position: ConjunctPosition::First,
                            partner: second,
                            conjunction: id,
                        },
                    );
                    push_unique(
                        &mut self.classes[second.index()].negative_conjunctions,
                        NegativeConjunction {
                            position: ConjunctPosition::Second,
                            partner: first,
                            conjunction: id,
                        },
                    );
                }
                &IndexedClassExpression::ObjectSomeValuesFrom { property, filler } => {
                    push_unique(&mut self.classes[filler.index()].negative_existentials, id);
                    push_unique(&mut self.properties[property.index()].negative_existentials, id);
                }
                IndexedClassExpression::ObjectUnionOf { disjuncts } => {
                    for disjunct in disjuncts {
                        push_unique(&mut self.classes[disjunct.index()].negative_unions, id);
                    }
                }
                IndexedClassExpression::Class(_)
                | IndexedClassExpression::ObjectHasSelf { .. }
                | IndexedClassExpression::ObjectComplementOf { .. } => {}
            }
        }
        if first_positive {
            if let IndexedClassExpression::ObjectComplementOf { negated } = expression {
                self.classes[negated.index()].positive_complement = Some(id);
            }
        }
    }
}

impl Default for OntologyIndexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Index a whole ontology in one call
pub fn index_ontology(ontology: &Ontology) -> Result<IndexedOntology, IndexError> {
    let mut indexer = OntologyIndexer::new();
    indexer.index_ontology(ontology)?;
    Ok(indexer.finish())
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Reason why an axiom cannot be handled by the saturation rules, if any
fn unsupported_in(axiom: &Axiom) -> Option<&'static str> {
    match axiom {
        Axiom::SubClassOf(sub, sup) => {
            unsupported_expression(sub, Polarity::Negative)
                .or_else(|| unsupported_expression(sup, Polarity::Positive))
        }
        Axiom::EquivalentClasses(members) => members
            .iter()
            .find_map(|m| unsupported_expression(m, Polarity::Both)),
        Axiom::DisjointClasses(members) | Axiom::DisjointUnion(_, members) => members
            .iter()
            .find_map(|m| unsupported_expression(m, Polarity::Negative)),
        Axiom::ObjectPropertyDomain(_, domain) => {
            unsupported_expression(domain, Polarity::Positive)
        }
        Axiom::SubObjectPropertyOf(..)
        | Axiom::EquivalentObjectProperties(_)
        | Axiom::SubObjectPropertyChainOf(..)
        | Axiom::TransitiveObjectProperty(_)
        | Axiom::ReflexiveObjectProperty(_) => None,
    }
}

fn unsupported_expression(
    expression: &ClassExpression,
    polarity: Polarity,
) -> Option<&'static str> {
    match expression {
        ClassExpression::Class(_) | ClassExpression::Thing | ClassExpression::Nothing => None,
        ClassExpression::ObjectIntersectionOf(conjuncts) => conjuncts
            .iter()
            .find_map(|c| unsupported_expression(c, polarity)),
        ClassExpression::ObjectUnionOf(disjuncts) => {
            if disjuncts.len() > 1 && polarity.positive() {
                return Some("ObjectUnionOf in a positive position");
            }
            disjuncts.iter().find_map(|d| unsupported_expression(d, polarity))
        }
        ClassExpression::ObjectComplementOf(negated) => {
            if polarity.negative() {
                return Some("ObjectComplementOf in a negative position");
            }
            unsupported_expression(negated, polarity.flip())
        }
        ClassExpression::ObjectSomeValuesFrom { filler, .. } => {
            unsupported_expression(filler, polarity)
        }
        ClassExpression::ObjectHasSelf(_) => {
            if polarity.negative() {
                Some("ObjectHasSelf in a negative position")
            } else {
                None
            }
        }
    }
}
