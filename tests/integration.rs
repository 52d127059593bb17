// Integration tests for the Fukurow EL crates
// These tests go from an ontology document through indexing and saturation
// to the classification result

use anyhow::Result;
use fukurow_el::{
    saturate_with_timeout, ClassExpressionSaturation, ElReasoner, RunState, SaturationConfig,
    SaturationOutcome, SaturationStatistics,
};
use fukurow_el_index::{index_ontology, Axiom, ClassExpression, Ontology, OwlIri};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn iri(name: &str) -> OwlIri {
    OwlIri::new(format!("http://example.org/med#{}", name))
}

fn class(name: &str) -> ClassExpression {
    ClassExpression::Class(iri(name))
}

fn some(property: &str, filler: ClassExpression) -> ClassExpression {
    ClassExpression::ObjectSomeValuesFrom {
        property: iri(property),
        filler: Box::new(filler),
    }
}

/// A small anatomy and disorder ontology in the style of clinical terminologies
fn medical_ontology() -> Ontology {
    let mut ontology = Ontology::with_iri(OwlIri::new("http://example.org/med"));

    ontology.add_axiom(Axiom::TransitiveObjectProperty(iri("partOf")));
    ontology.add_axiom(Axiom::SubObjectPropertyChainOf(
        vec![iri("findingSite"), iri("partOf")],
        iri("findingSite"),
    ));
    ontology.add_axiom(Axiom::ObjectPropertyDomain(iri("findingSite"), class("ClinicalFinding")));

    ontology.add_axiom(Axiom::SubClassOf(class("Endocardium"), some("partOf", class("HeartWall"))));
    ontology.add_axiom(Axiom::SubClassOf(class("HeartWall"), some("partOf", class("Heart"))));
    ontology.add_axiom(Axiom::SubClassOf(class("Heart"), class("Organ")));
    ontology.add_axiom(Axiom::SubClassOf(class("Endocardium"), class("Tissue")));

    ontology.add_axiom(Axiom::EquivalentClasses(vec![
        class("Endocarditis"),
        ClassExpression::and([class("Inflammation"), some("findingSite", class("Endocardium"))]),
    ]));
    ontology.add_axiom(Axiom::EquivalentClasses(vec![
        class("HeartDisease"),
        ClassExpression::and([class("Disease"), some("findingSite", class("Heart"))]),
    ]));
    ontology.add_axiom(Axiom::SubClassOf(class("Inflammation"), class("Disease")));
    ontology.add_axiom(Axiom::DisjointClasses(vec![class("Tissue"), class("Disease")]));
    ontology.add_axiom(Axiom::SubClassOf(class("TissueDisease"), class("Tissue")));
    ontology.add_axiom(Axiom::SubClassOf(class("TissueDisease"), class("Disease")));

    ontology
}

#[test]
fn test_end_to_end_classification() -> Result<()> {
    init_tracing();
    let reasoner = ElReasoner::with_config(SaturationConfig::with_workers(4));

    let result = reasoner.classify(&medical_ontology())?;

    assert!(result.is_subsumed_by(&iri("Endocarditis"), &iri("HeartDisease")));
    assert!(result.is_subsumed_by(&iri("Endocarditis"), &iri("ClinicalFinding")));
    assert!(result.is_subsumed_by(&iri("Endocarditis"), &iri("Disease")));
    assert!(!result.is_subsumed_by(&iri("HeartDisease"), &iri("Endocarditis")));
    assert!(!result.is_satisfiable(&iri("TissueDisease")));
    assert!(result.is_satisfiable(&iri("Endocardium")));
    assert!(result.is_consistent());
    Ok(())
}

#[test]
fn test_ontology_survives_json_round_trip() -> Result<()> {
    init_tracing();
    let ontology = medical_ontology();

    let json = serde_json::to_string(&ontology)?;
    let parsed: Ontology = serde_json::from_str(&json)?;

    let original = ElReasoner::new().classify(&ontology)?;
    let reloaded = ElReasoner::new().classify(&parsed)?;
    assert_eq!(original.subsumers, reloaded.subsumers);
    assert_eq!(original.unsatisfiable, reloaded.unsatisfiable);
    Ok(())
}

#[test]
fn test_worker_counts_agree_on_the_medical_ontology() -> Result<()> {
    init_tracing();
    let ontology = medical_ontology();

    let single = ElReasoner::with_config(SaturationConfig::with_workers(1)).classify(&ontology)?;
    let pooled = ElReasoner::with_config(SaturationConfig::with_workers(8)).classify(&ontology)?;

    assert_eq!(single.subsumers, pooled.subsumers);
    assert_eq!(single.unsatisfiable, pooled.unsatisfiable);
    Ok(())
}

#[test]
fn test_configuration_from_json() -> Result<()> {
    init_tracing();
    let config = SaturationConfig::from_json_str(r#"{ "workers": 2, "idle_wait_ms": 1 }"#)?;
    let index = Arc::new(index_ontology(&medical_ontology())?);

    let engine = ClassExpressionSaturation::new(index, config);
    engine.submit_all_classes()?;

    assert_eq!(engine.saturate()?, SaturationOutcome::Complete);
    assert_eq!(engine.state(), RunState::Quiescent);
    assert!(engine.is_saturated());
    Ok(())
}

#[test]
fn test_statistics_report_is_serializable() -> Result<()> {
    init_tracing();
    let index = Arc::new(index_ontology(&medical_ontology())?);
    let engine = ClassExpressionSaturation::new(index, SaturationConfig::with_workers(2));
    engine.submit_all_classes()?;
    engine.saturate()?;

    let statistics = engine.statistics();
    let report: SaturationStatistics = serde_json::from_str(&statistics.to_json()?)?;

    assert_eq!(report, statistics);
    assert!(report.conclusions.total_produced() >= report.conclusions.total_unique());
    assert!(report.contexts_created > 0);
    Ok(())
}

#[tokio::test]
async fn test_saturation_from_async_code() -> Result<()> {
    init_tracing();
    let index = Arc::new(index_ontology(&medical_ontology())?);
    let engine = Arc::new(ClassExpressionSaturation::new(
        Arc::clone(&index),
        SaturationConfig::with_workers(4),
    ));
    engine.submit_all_classes()?;

    let outcome = saturate_with_timeout(Arc::clone(&engine), Duration::from_secs(30)).await?;
    assert_eq!(outcome, SaturationOutcome::Complete);

    let endocarditis = engine
        .context_by_iri(&iri("Endocarditis"))
        .ok_or_else(|| anyhow::anyhow!("no context for Endocarditis"))?;
    let heart_disease = index
        .class_id(&iri("HeartDisease"))
        .ok_or_else(|| anyhow::anyhow!("HeartDisease not indexed"))?;
    assert!(endocarditis.contains_subsumer(heart_disease));
    Ok(())
}
