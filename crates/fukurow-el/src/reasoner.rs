//! OWL EL リーナー

use crate::config::SaturationConfig;
use crate::engine::{ClassExpressionSaturation, SaturationOutcome};
use crate::scheduler::Interrupter;
use crate::statistics::SaturationStatistics;
use crate::SaturationError;
use fukurow_el_index::{index_ontology, IndexedOntology, Ontology, OwlIri};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Subsumers of every named class after saturation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaturationResult {
    /// Named subsumers per named class, the class itself included
    pub subsumers: HashMap<OwlIri, HashSet<OwlIri>>,
    pub unsatisfiable: HashSet<OwlIri>,
    pub statistics: SaturationStatistics,
}

impl SaturationResult {
    /// Check if class C1 is subsumed by class C2 (C1 ⊑ C2)
    pub fn is_subsumed_by(&self, subclass: &OwlIri, superclass: &OwlIri) -> bool {
        if self.unsatisfiable.contains(subclass) {
            return true;
        }
        self.subsumers
            .get(subclass)
            .is_some_and(|supers| supers.contains(superclass))
    }

    pub fn superclasses(&self, class: &OwlIri) -> Option<&HashSet<OwlIri>> {
        self.subsumers.get(class)
    }

    pub fn is_satisfiable(&self, class: &OwlIri) -> bool {
        !self.unsatisfiable.contains(class)
    }

    /// An ontology is consistent when owl:Thing is satisfiable
    pub fn is_consistent(&self) -> bool {
        self.is_satisfiable(&OwlIri::owl_thing())
    }
}

/// OWL EL reasoner
pub struct ElReasoner {
    config: SaturationConfig,
    interrupter: Interrupter,
}

impl ElReasoner {
    pub fn new() -> Self {
        Self::with_config(SaturationConfig::default())
    }

    pub fn with_config(config: SaturationConfig) -> Self {
        Self {
            config,
            interrupter: Interrupter::new(),
        }
    }

    pub fn config(&self) -> &SaturationConfig {
        &self.config
    }

    /// Handle for cancelling saturation from another thread
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    /// Index the ontology and saturate every named class; an interrupted run
    /// is an error since its closure is incomplete
    pub fn saturate(
        &self,
        ontology: &Ontology,
    ) -> Result<ClassExpressionSaturation, SaturationError> {
        let index: Arc<IndexedOntology> = Arc::new(index_ontology(ontology)?);
        if !index.skipped_axioms().is_empty() {
            warn!(
                skipped = index.skipped_axioms().len(),
                "Some axioms were left out of the index"
            );
        }

        let config = self.config.clone();
        let engine = ClassExpressionSaturation::with_interrupter(index, config, self.interrupter());
        engine.submit_all_classes()?;
        if engine.saturate()? == SaturationOutcome::Interrupted {
            warn!("Saturation was interrupted, results are incomplete");
            return Err(SaturationError::Interrupted);
        }
        Ok(engine)
    }

    /// Compute named subsumers and unsatisfiable classes
    pub fn classify(&self, ontology: &Ontology) -> Result<SaturationResult, SaturationError> {
        let engine = self.saturate(ontology)?;
        let index = engine.index();
        let mut result = SaturationResult {
            statistics: engine.statistics(),
            ..SaturationResult::default()
        };

        for root in index.named_classes() {
            let (Some(iri), Some(context)) = (index.class_iri(root), engine.context(root)) else {
                continue;
            };
            if context.is_inconsistent() {
                result.unsatisfiable.insert(iri.clone());
            }
            let supers = context
                .subsumers()
                .into_iter()
                .filter_map(|id| index.class_iri(id).cloned())
                .collect();
            result.subsumers.insert(iri.clone(), supers);
        }

        info!(
            classes = result.subsumers.len(),
            unsatisfiable = result.unsatisfiable.len(),
            "Classification finished"
        );
        Ok(result)
    }

    /// Check if ontology is consistent
    pub fn is_consistent(&self, ontology: &Ontology) -> Result<bool, SaturationError> {
        Ok(self.classify(ontology)?.is_consistent())
    }

    /// Check if class C1 is subsumed by class C2 (C1 ⊑ C2)
    pub fn is_subsumed_by(
        &self,
        ontology: &Ontology,
        subclass: &OwlIri,
        superclass: &OwlIri,
    ) -> Result<bool, SaturationError> {
        let result = self.classify(ontology)?;
        if !result.subsumers.contains_key(subclass) {
            return Err(SaturationError::UnknownClass(subclass.clone()));
        }
        Ok(result.is_subsumed_by(subclass, superclass))
    }
}

impl Default for ElReasoner {
    fn default() -> Self {
        Self::new()
    }
}
