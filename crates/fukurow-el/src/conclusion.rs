//! Conclusions exchanged between contexts

use fukurow_el_index::{ClassId, DisjointnessId, PropertyId};
use serde::{Deserialize, Serialize};

/// A fact derived about the root of the context that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conclusion {
    /// The context was created; seeds the initialization rules
    ContextInitialization,

    /// Backward links over `sub_root` arrive here, so propagations over it
    /// must be generated
    SubContextInitialization { sub_root: PropertyId },

    /// `root ⊑ D`, obtained by composing other subsumers
    ComposedSubsumer(ClassId),

    /// `root ⊑ D`, still to be broken into its parts
    DecomposedSubsumer(ClassId),

    /// `root ⊑ ∃relation.target`, stored at the source
    ForwardLink { relation: PropertyId, target: ClassId },

    /// `source ⊑ ∃relation.root`, stored at the target
    BackwardLink { relation: PropertyId, source: ClassId },

    /// Every source linked to `root` over `relation` has `carry` as subsumer
    Propagation { relation: PropertyId, carry: ClassId },

    /// `root ⊑ member` where `member` is listed in disjointness `axiom`
    DisjointSubsumer { axiom: DisjointnessId, member: ClassId },

    /// `root ⊑ ⊥`
    Contradiction,
}

/// Field-less tag of a [`Conclusion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConclusionKind {
    ContextInitialization,
    SubContextInitialization,
    ComposedSubsumer,
    DecomposedSubsumer,
    ForwardLink,
    BackwardLink,
    Propagation,
    DisjointSubsumer,
    Contradiction,
}

impl ConclusionKind {
    pub const COUNT: usize = 9;

    pub const ALL: [ConclusionKind; ConclusionKind::COUNT] = [
        ConclusionKind::ContextInitialization,
        ConclusionKind::SubContextInitialization,
        ConclusionKind::ComposedSubsumer,
        ConclusionKind::DecomposedSubsumer,
        ConclusionKind::ForwardLink,
        ConclusionKind::BackwardLink,
        ConclusionKind::Propagation,
        ConclusionKind::DisjointSubsumer,
        ConclusionKind::Contradiction,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ConclusionKind::ContextInitialization => "ContextInitialization",
            ConclusionKind::SubContextInitialization => "SubContextInitialization",
            ConclusionKind::ComposedSubsumer => "ComposedSubsumer",
            ConclusionKind::DecomposedSubsumer => "DecomposedSubsumer",
            ConclusionKind::ForwardLink => "ForwardLink",
            ConclusionKind::BackwardLink => "BackwardLink",
            ConclusionKind::Propagation => "Propagation",
            ConclusionKind::DisjointSubsumer => "DisjointSubsumer",
            ConclusionKind::Contradiction => "Contradiction",
        }
    }
}

impl Conclusion {
    pub fn kind(&self) -> ConclusionKind {
        match self {
            Conclusion::ContextInitialization => ConclusionKind::ContextInitialization,
            Conclusion::SubContextInitialization { .. } => ConclusionKind::SubContextInitialization,
            Conclusion::ComposedSubsumer(_) => ConclusionKind::ComposedSubsumer,
            Conclusion::DecomposedSubsumer(_) => ConclusionKind::DecomposedSubsumer,
            Conclusion::ForwardLink { .. } => ConclusionKind::ForwardLink,
            Conclusion::BackwardLink { .. } => ConclusionKind::BackwardLink,
            Conclusion::Propagation { .. } => ConclusionKind::Propagation,
            Conclusion::DisjointSubsumer { .. } => ConclusionKind::DisjointSubsumer,
            Conclusion::Contradiction => ConclusionKind::Contradiction,
        }
    }
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conclusion::ContextInitialization => write!(f, "Init"),
            Conclusion::SubContextInitialization { sub_root } => write!(f, "SubInit({})", sub_root),
            Conclusion::ComposedSubsumer(d) => write!(f, "Composed({})", d),
            Conclusion::DecomposedSubsumer(d) => write!(f, "Decomposed({})", d),
            Conclusion::ForwardLink { relation, target } => {
                write!(f, "ForwardLink({} -> {})", relation, target)
            }
            Conclusion::BackwardLink { relation, source } => {
                write!(f, "BackwardLink({} <- {})", relation, source)
            }
            Conclusion::Propagation { relation, carry } => {
                write!(f, "Propagation({}, {})", relation, carry)
            }
            Conclusion::DisjointSubsumer { axiom, member } => {
                write!(f, "DisjointSubsumer({}, {})", axiom, member)
            }
            Conclusion::Contradiction => write!(f, "⊥"),
        }
    }
}
