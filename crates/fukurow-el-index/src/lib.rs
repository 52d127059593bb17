//! OWL EL インデックス
//!
//! このクレートは飽和エンジンが読むインデックス済みオントロジーを提供します:
//! - OWL EL 公理とクラス式のモデル
//! - クラス式の構造的インターン化と出現極性の管理
//! - プロパティ階層・プロパティチェーンの飽和

pub mod model;
pub mod indexed;
pub mod indexer;
mod property;

pub use model::{Axiom, ClassExpression, Ontology, OwlIri};
pub use indexed::{
    ClassId, ClassNode, ConjunctPosition, DisjointnessAxiom, DisjointnessId, Equivalence,
    IndexedClassExpression, IndexedOntology, NegativeConjunction, PropertyId, PropertyNode,
    SaturatedProperty,
};
pub use indexer::{index_ontology, OntologyIndexer, Polarity};

// Error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("{0} requires at least one class expression")]
    EmptyClassList(&'static str),

    #[error("{0} requires at least two members, got {1}")]
    TooFewMembers(&'static str, usize),

    #[error("Property chain must not be empty")]
    EmptyPropertyChain,
}
