//! OWL EL データモデル

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";

/// OWL IRI wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OwlIri(pub String);

impl OwlIri {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn owl_thing() -> Self {
        Self::new(OWL_THING)
    }

    pub fn owl_nothing() -> Self {
        Self::new(OWL_NOTHING)
    }
}

impl std::fmt::Display for OwlIri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwlIri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// OWL EL Class Expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassExpression {
    /// Named class
    Class(OwlIri),

    /// owl:Thing (⊤)
    Thing,

    /// owl:Nothing (⊥)
    Nothing,

    /// C1 ⊓ C2 ⊓ ... ⊓ Cn
    ObjectIntersectionOf(Vec<ClassExpression>),

    /// C1 ⊔ C2 ⊔ ... ⊔ Cn (EL only allows it on the left of an inclusion)
    ObjectUnionOf(Vec<ClassExpression>),

    /// ¬C (EL only allows it on the right of an inclusion)
    ObjectComplementOf(Box<ClassExpression>),

    /// ∃R.C
    ObjectSomeValuesFrom {
        property: OwlIri,
        filler: Box<ClassExpression>,
    },

    /// ∃R.Self
    ObjectHasSelf(OwlIri),
}

impl ClassExpression {
    pub fn class(iri: impl Into<String>) -> Self {
        ClassExpression::Class(OwlIri::new(iri))
    }

    pub fn some(property: impl Into<String>, filler: ClassExpression) -> Self {
        ClassExpression::ObjectSomeValuesFrom {
            property: OwlIri::new(property),
            filler: Box::new(filler),
        }
    }

    pub fn and(conjuncts: impl IntoIterator<Item = ClassExpression>) -> Self {
        ClassExpression::ObjectIntersectionOf(conjuncts.into_iter().collect())
    }

    pub fn or(disjuncts: impl IntoIterator<Item = ClassExpression>) -> Self {
        ClassExpression::ObjectUnionOf(disjuncts.into_iter().collect())
    }

    pub fn not(negated: ClassExpression) -> Self {
        ClassExpression::ObjectComplementOf(Box::new(negated))
    }

    pub fn has_self(property: impl Into<String>) -> Self {
        ClassExpression::ObjectHasSelf(OwlIri::new(property))
    }

    /// Named classes occurring in this expression
    pub fn signature_classes(&self, out: &mut HashSet<OwlIri>) {
        match self {
            ClassExpression::Class(iri) => {
                out.insert(iri.clone());
            }
            ClassExpression::Thing | ClassExpression::Nothing => {}
            ClassExpression::ObjectIntersectionOf(parts)
            | ClassExpression::ObjectUnionOf(parts) => {
                for part in parts {
                    part.signature_classes(out);
                }
            }
            ClassExpression::ObjectComplementOf(negated) => negated.signature_classes(out),
            ClassExpression::ObjectSomeValuesFrom { filler, .. } => filler.signature_classes(out),
            ClassExpression::ObjectHasSelf(_) => {}
        }
    }

    /// Object properties occurring in this expression
    pub fn signature_properties(&self, out: &mut HashSet<OwlIri>) {
        match self {
            ClassExpression::ObjectIntersectionOf(parts)
            | ClassExpression::ObjectUnionOf(parts) => {
                for part in parts {
                    part.signature_properties(out);
                }
            }
            ClassExpression::ObjectComplementOf(negated) => negated.signature_properties(out),
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                out.insert(property.clone());
                filler.signature_properties(out);
            }
            ClassExpression::ObjectHasSelf(property) => {
                out.insert(property.clone());
            }
            ClassExpression::Class(_) | ClassExpression::Thing | ClassExpression::Nothing => {}
        }
    }
}

/// OWL EL Axiom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axiom {
    /// SubClassOf(C1 C2)
    SubClassOf(ClassExpression, ClassExpression),

    /// EquivalentClasses(C1 ... Cn)
    EquivalentClasses(Vec<ClassExpression>),

    /// DisjointClasses(C1 ... Cn)
    DisjointClasses(Vec<ClassExpression>),

    /// DisjointUnion(A C1 ... Cn)
    DisjointUnion(OwlIri, Vec<ClassExpression>),

    /// SubObjectPropertyOf(P1 P2)
    SubObjectPropertyOf(OwlIri, OwlIri),

    /// EquivalentObjectProperties(P1 ... Pn)
    EquivalentObjectProperties(Vec<OwlIri>),

    /// SubObjectPropertyOf(ObjectPropertyChain(P1 ... Pn) P)
    SubObjectPropertyChainOf(Vec<OwlIri>, OwlIri),

    /// TransitiveObjectProperty(P)
    TransitiveObjectProperty(OwlIri),

    /// ReflexiveObjectProperty(P)
    ReflexiveObjectProperty(OwlIri),

    /// ObjectPropertyDomain(P C)
    ObjectPropertyDomain(OwlIri, ClassExpression),
}

/// OWL EL Ontology
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ontology {
    /// Ontology IRI
    pub iri: Option<OwlIri>,

    /// All axioms in the ontology
    pub axioms: Vec<Axiom>,

    /// All named classes mentioned in the ontology
    pub classes: HashSet<OwlIri>,

    /// All object properties mentioned in the ontology
    pub properties: HashSet<OwlIri>,
}

impl Ontology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iri(iri: OwlIri) -> Self {
        Self {
            iri: Some(iri),
            ..Self::default()
        }
    }

    /// Declare a named class without any axiom about it
    pub fn declare_class(&mut self, iri: impl Into<String>) {
        self.classes.insert(OwlIri::new(iri));
    }

    pub fn add_axiom(&mut self, axiom: Axiom) {
        // Extract classes and properties from the axiom
        match &axiom {
            Axiom::SubClassOf(c1, c2) => {
                c1.signature_classes(&mut self.classes);
                c2.signature_classes(&mut self.classes);
                c1.signature_properties(&mut self.properties);
                c2.signature_properties(&mut self.properties);
            }
            Axiom::EquivalentClasses(classes) | Axiom::DisjointClasses(classes) => {
                for class in classes {
                    class.signature_classes(&mut self.classes);
                    class.signature_properties(&mut self.properties);
                }
            }
            Axiom::DisjointUnion(defined, classes) => {
                self.classes.insert(defined.clone());
                for class in classes {
                    class.signature_classes(&mut self.classes);
                    class.signature_properties(&mut self.properties);
                }
            }
            Axiom::SubObjectPropertyOf(p1, p2) => {
                self.properties.insert(p1.clone());
                self.properties.insert(p2.clone());
            }
            Axiom::EquivalentObjectProperties(properties) => {
                self.properties.extend(properties.iter().cloned());
            }
            Axiom::SubObjectPropertyChainOf(chain, p) => {
                self.properties.extend(chain.iter().cloned());
                self.properties.insert(p.clone());
            }
            Axiom::TransitiveObjectProperty(p) | Axiom::ReflexiveObjectProperty(p) => {
                self.properties.insert(p.clone());
            }
            Axiom::ObjectPropertyDomain(p, c) => {
                self.properties.insert(p.clone());
                c.signature_classes(&mut self.classes);
                c.signature_properties(&mut self.properties);
            }
        }

        self.axioms.push(axiom);
    }
}
