//! # Class Expression Saturation
//!
//! Drives contexts to a fixed point with a pool of scoped worker threads.
//! A root is owned by at most one worker at a time: ownership is taken by
//! claiming it from the [`Scheduler`] and handed back on release, so the
//! premises of a context only ever see one writer.

use crate::conclusion::{Conclusion, ConclusionKind};
use crate::config::SaturationConfig;
use crate::context::{lock, Context, ContextSlots};
use crate::rules::{self, rules_for, RuleInput};
use crate::scheduler::{Claim, Interrupter, Scheduler};
use crate::statistics::SaturationStatistics;
use crate::SaturationError;
use fukurow_el_index::{ClassId, IndexedOntology, OwlIri};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, trace};

/// Lifecycle of a saturation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Roots are being submitted, no worker is running
    Seeding,
    Saturating,
    /// Every submitted root and everything reachable from it is saturated
    Quiescent,
    /// Stopped early; calling `saturate` again resumes
    Interrupted,
    /// A worker failed; the engine cannot be resumed
    Failed,
}

/// How a finished `saturate` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturationOutcome {
    Complete,
    Interrupted,
}

/// Concurrent saturation of class expressions over one indexed ontology
pub struct ClassExpressionSaturation {
    index: Arc<IndexedOntology>,
    config: SaturationConfig,
    contexts: ContextSlots,
    scheduler: Scheduler,
    interrupter: Interrupter,
    /// Set when a worker of the current run stopped because of the interrupter
    interrupt_observed: AtomicBool,
    approximate_contexts: AtomicU64,
    statistics: Mutex<SaturationStatistics>,
    state: Mutex<RunState>,
}

impl ClassExpressionSaturation {
    pub fn new(index: Arc<IndexedOntology>, config: SaturationConfig) -> Self {
        Self::with_interrupter(index, config, Interrupter::new())
    }

    /// Engine stopped by an interrupter shared with the caller
    pub fn with_interrupter(
        index: Arc<IndexedOntology>,
        config: SaturationConfig,
        interrupter: Interrupter,
    ) -> Self {
        let contexts = ContextSlots::new(index.class_count());
        let scheduler = Scheduler::new(config.idle_wait());
        Self {
            index,
            config,
            contexts,
            scheduler,
            interrupter,
            interrupt_observed: AtomicBool::new(false),
            approximate_contexts: AtomicU64::new(0),
            statistics: Mutex::new(SaturationStatistics::default()),
            state: Mutex::new(RunState::Seeding),
        }
    }

    pub fn with_default_config(index: Arc<IndexedOntology>) -> Self {
        Self::new(index, SaturationConfig::default())
    }

    pub fn index(&self) -> &IndexedOntology {
        &self.index
    }

    pub fn config(&self) -> &SaturationConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        *lock(&self.state)
    }

    fn set_state(&self, state: RunState) {
        *lock(&self.state) = state;
    }

    /// Shared handle that stops running and future `saturate` calls until cleared
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    /// Make sure `root` gets saturated by the next `saturate` call
    pub fn submit(&self, root: ClassId) -> Result<(), SaturationError> {
        if !self.index.contains_class(root) {
            return Err(SaturationError::UnknownRoot(root));
        }
        if self.state() == RunState::Failed {
            return Err(SaturationError::Poisoned);
        }

        let mut statistics = lock(&self.statistics);
        let (_, created) = self.ensure_context(root, &mut statistics)?;
        if created {
            self.approximate_contexts.fetch_add(1, Ordering::Relaxed);
            let mut state = lock(&self.state);
            if *state == RunState::Quiescent {
                *state = RunState::Seeding;
            }
            trace!(%root, "Submitted root");
        }
        Ok(())
    }

    pub fn submit_iri(&self, iri: &OwlIri) -> Result<ClassId, SaturationError> {
        let root = self
            .index
            .class_id(iri)
            .ok_or_else(|| SaturationError::UnknownClass(iri.clone()))?;
        self.submit(root)?;
        Ok(root)
    }

    /// Submit every named class, owl:Thing and owl:Nothing included
    pub fn submit_all_classes(&self) -> Result<usize, SaturationError> {
        let roots: Vec<ClassId> = self.index.named_classes().collect();
        for &root in &roots {
            self.submit(root)?;
        }
        debug!(roots = roots.len(), "Submitted all named classes");
        Ok(roots.len())
    }

    /// Run the worker pool until no context is active or the interrupter fires
    pub fn saturate(&self) -> Result<SaturationOutcome, SaturationError> {
        if self.state() == RunState::Failed {
            return Err(SaturationError::Poisoned);
        }
        self.set_state(RunState::Saturating);

        let workers = self.config.worker_count();
        let started = Instant::now();
        info!(workers, pending = self.scheduler.pending(), "Starting saturation");

        let mut run = SaturationStatistics {
            runs: 1,
            ..SaturationStatistics::default()
        };
        let mut failure = None;
        let mut interrupted = false;
        loop {
            self.interrupt_observed.store(false, Ordering::Relaxed);
            for result in self.run_pool(workers) {
                match result {
                    Ok(Ok(local)) => run.merge(&local),
                    Ok(Err(error)) => {
                        failure.get_or_insert(error);
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        failure.get_or_insert(SaturationError::WorkerPanicked(message));
                    }
                }
            }
            if failure.is_some() || self.scheduler.pending() == 0 {
                break;
            }
            if self.interrupt_observed.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }
            debug!(pending = self.scheduler.pending(), "Roots submitted after the pool went idle");
        }
        run.elapsed_ms = started.elapsed().as_millis() as u64;

        let totals = {
            let mut statistics = lock(&self.statistics);
            statistics.merge(&run);
            statistics.clone()
        };

        if let Some(failure) = failure {
            error!(error = %failure, "Saturation failed");
            self.set_state(RunState::Failed);
            return Err(failure);
        }
        if let Err(violation) = totals.check_invariants() {
            error!(%violation, "Saturation statistics are inconsistent");
            self.set_state(RunState::Failed);
            return Err(SaturationError::InvariantViolation(violation));
        }

        let outcome = if interrupted {
            self.set_state(RunState::Interrupted);
            SaturationOutcome::Interrupted
        } else {
            self.set_state(RunState::Quiescent);
            SaturationOutcome::Complete
        };

        debug!(
            contexts = run.contexts_created,
            produced = run.conclusions.total_produced(),
            unique = run.conclusions.total_unique(),
            rule_applications = run.rules.total(),
            "Run statistics"
        );
        info!(?outcome, elapsed_ms = run.elapsed_ms, "Saturation finished");
        Ok(outcome)
    }

    pub fn context(&self, root: ClassId) -> Option<&Context> {
        self.contexts.get(root)
    }

    pub fn context_by_iri(&self, iri: &OwlIri) -> Option<&Context> {
        self.index.class_id(iri).and_then(|root| self.context(root))
    }

    /// Every context created so far, in id order
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter()
    }

    /// True once every created context is inactive with an empty queue
    pub fn is_saturated(&self) -> bool {
        self.contexts().all(Context::is_saturated)
    }

    /// Totals over all finished runs
    pub fn statistics(&self) -> SaturationStatistics {
        lock(&self.statistics).clone()
    }

    /// Context count published by workers in batches; may lag behind while
    /// a run is in progress
    pub fn approximate_context_count(&self) -> u64 {
        self.approximate_contexts.load(Ordering::Relaxed)
    }

    fn ensure_context(
        &self,
        root: ClassId,
        statistics: &mut SaturationStatistics,
    ) -> Result<(&Context, bool), SaturationError> {
        let (context, created) = self
            .contexts
            .get_or_create(root)
            .ok_or(SaturationError::MissingNode { kind: "class", id: root.0 })?;
        if created {
            statistics.contexts_created += 1;
            statistics.conclusions.count_produced(ConclusionKind::ContextInitialization);
            if context.add_to_do(Conclusion::ContextInitialization) {
                self.scheduler.activate(root);
            }
        }
        Ok((context, created))
    }

    fn run_pool(&self, workers: usize) -> Vec<thread::Result<WorkerResult>> {
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| scope.spawn(move || self.run_worker(worker)))
                .collect();
            handles.into_iter().map(|handle| handle.join()).collect()
        })
    }

    fn run_worker(&self, id: usize) -> WorkerResult {
        let _guard = WorkerGuard(&self.scheduler);
        let mut worker = Worker::new(self);
        trace!(worker = id, "Worker started");

        loop {
            match self.scheduler.claim(&self.interrupter) {
                Claim::Context(root) => worker.run_claimed(root)?,
                Claim::Interrupted => {
                    self.interrupt_observed.store(true, Ordering::Relaxed);
                    break;
                }
                Claim::Quiescent | Claim::Aborted => break,
            }
        }

        worker.publish_contexts();
        trace!(worker = id, "Worker stopped");
        Ok(worker.statistics)
    }
}

impl std::fmt::Debug for ClassExpressionSaturation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassExpressionSaturation")
            .field("state", &self.state())
            .field("contexts", &self.approximate_context_count())
            .field("workers", &self.config.workers)
            .finish()
    }
}

type WorkerResult = Result<SaturationStatistics, SaturationError>;

/// Aborts the run when a worker unwinds
struct WorkerGuard<'a>(&'a Scheduler);

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

enum Drained {
    /// Queue empty and the context deactivated
    Idle,
    /// Work arrived while deactivating; the root goes back to the scheduler
    Reactivated,
    Interrupted,
}

struct Worker<'a> {
    engine: &'a ClassExpressionSaturation,
    buffer: Vec<(ClassId, Conclusion)>,
    statistics: SaturationStatistics,
    unpublished_contexts: u64,
}

impl<'a> Worker<'a> {
    fn new(engine: &'a ClassExpressionSaturation) -> Self {
        Self {
            engine,
            buffer: Vec::new(),
            statistics: SaturationStatistics::default(),
            unpublished_contexts: 0,
        }
    }

    /// Drain a claimed root and hand it back to the scheduler
    fn run_claimed(&mut self, root: ClassId) -> Result<(), SaturationError> {
        let engine = self.engine;
        let scheduler = &engine.scheduler;
        match self.drain(root) {
            Ok(Drained::Idle) => scheduler.release(),
            Ok(Drained::Reactivated) => scheduler.requeue(root),
            Ok(Drained::Interrupted) => {
                engine.interrupt_observed.store(true, Ordering::Relaxed);
                scheduler.requeue(root);
            }
            Err(error) => {
                scheduler.abort();
                scheduler.release();
                return Err(error);
            }
        }
        Ok(())
    }

    fn drain(&mut self, root: ClassId) -> Result<Drained, SaturationError> {
        let engine = self.engine;
        let context = engine
            .contexts
            .get(root)
            .ok_or(SaturationError::MissingNode { kind: "context", id: root.0 })?;

        loop {
            if engine.interrupter.is_interrupted() {
                return Ok(Drained::Interrupted);
            }
            let Some(conclusion) = context.take_to_do() else {
                break;
            };
            self.process(context, conclusion)?;
            self.flush()?;
        }

        if context.deactivate() {
            Ok(Drained::Reactivated)
        } else {
            Ok(Drained::Idle)
        }
    }

    /// Insert into the processed set and run the rules for new conclusions
    fn process(
        &mut self,
        context: &Context,
        conclusion: Conclusion,
    ) -> Result<(), SaturationError> {
        let engine = self.engine;
        let mut premises = context.premises();
        if !premises.insert(conclusion) {
            return Ok(());
        }

        let kind = conclusion.kind();
        self.statistics.conclusions.count_unique(kind);
        trace!(root = %context.root(), %conclusion, "Processing conclusion");

        let inconsistent = premises.inconsistent;
        let input = RuleInput {
            index: &engine.index,
            root: context.root(),
            premises: &premises,
        };
        for &rule in rules_for(kind) {
            if inconsistent && rule.skipped_when_inconsistent() {
                continue;
            }
            self.statistics.rules.count(rule);
            rules::apply(rule, &conclusion, &input, &mut self.buffer)?;
        }
        Ok(())
    }

    /// Deliver buffered conclusions; called with no premises lock held
    fn flush(&mut self) -> Result<(), SaturationError> {
        let mut produced = std::mem::take(&mut self.buffer);
        let result = produced
            .drain(..)
            .try_for_each(|(target, conclusion)| self.produce(target, conclusion));
        self.buffer = produced;
        result
    }

    fn produce(&mut self, target: ClassId, conclusion: Conclusion) -> Result<(), SaturationError> {
        let engine = self.engine;
        self.statistics.conclusions.count_produced(conclusion.kind());

        let (context, created) = engine.ensure_context(target, &mut self.statistics)?;
        if created {
            self.unpublished_contexts += 1;
            if self.unpublished_contexts >= engine.config.flush_interval() {
                self.publish_contexts();
            }
        }
        if context.add_to_do(conclusion) {
            engine.scheduler.activate(target);
        }
        Ok(())
    }

    fn publish_contexts(&mut self) {
        if self.unpublished_contexts > 0 {
            self.engine
                .approximate_contexts
                .fetch_add(self.unpublished_contexts, Ordering::Relaxed);
            self.unpublished_contexts = 0;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fukurow_el_index::{index_ontology, Axiom, ClassExpression, Ontology};

    fn iri(name: &str) -> OwlIri {
        OwlIri::new(format!("http://example.org/{}", name))
    }

    /// A0 ⊑ ∃r.A1, A1 ⊑ ∃r.A2, ... over a transitive r
    fn chain(length: usize) -> Arc<IndexedOntology> {
        let mut ontology = Ontology::new();
        ontology.add_axiom(Axiom::TransitiveObjectProperty(iri("r")));
        for i in 0..length {
            let filler = ClassExpression::Class(iri(&format!("A{}", i + 1)));
            ontology.add_axiom(Axiom::SubClassOf(
                ClassExpression::Class(iri(&format!("A{}", i))),
                ClassExpression::some("http://example.org/r", filler),
            ));
        }
        Arc::new(index_ontology(&ontology).unwrap())
    }

    fn engine(index: &Arc<IndexedOntology>) -> ClassExpressionSaturation {
        ClassExpressionSaturation::new(Arc::clone(index), SaturationConfig::with_workers(2))
    }

    #[test]
    fn test_rule_failure_poisons_the_engine() {
        let index = chain(3);
        let engine = engine(&index);
        let root = engine.submit_iri(&iri("A0")).unwrap();
        engine
            .context(root)
            .unwrap()
            .add_to_do(Conclusion::ComposedSubsumer(ClassId(9_999)));

        let result = engine.saturate();

        assert!(matches!(result, Err(SaturationError::MissingNode { id: 9_999, .. })));
        assert_eq!(engine.state(), RunState::Failed);
        assert!(matches!(engine.saturate(), Err(SaturationError::Poisoned)));
        assert!(matches!(engine.submit(root), Err(SaturationError::Poisoned)));
        assert_eq!(engine.statistics().runs, 1);
    }

    #[test]
    fn test_interruption_while_draining_requeues_the_root() {
        let index = chain(20);
        let engine = engine(&index);
        let root = engine.submit_iri(&iri("A0")).unwrap();

        assert_eq!(engine.scheduler.claim(&engine.interrupter), Claim::Context(root));
        let context = engine.context(root).unwrap();
        let mut worker = Worker::new(&engine);
        let first = context.take_to_do().unwrap();
        worker.process(context, first).unwrap();
        worker.flush().unwrap();

        engine.interrupter.interrupt();
        worker.run_claimed(root).unwrap();

        assert!(engine.interrupt_observed.load(Ordering::Relaxed));
        assert_eq!(engine.scheduler.pending(), 1);
        assert!(context.is_active());
        assert_eq!(context.processed_count(), 1);
        assert!(!context.is_saturated());
        lock(&engine.statistics).merge(&worker.statistics);

        assert_eq!(engine.saturate().unwrap(), SaturationOutcome::Interrupted);
        assert_eq!(engine.state(), RunState::Interrupted);

        engine.interrupter.clear();
        assert_eq!(engine.saturate().unwrap(), SaturationOutcome::Complete);

        let direct = engine_for_comparison(&index);
        assert_eq!(engine.contexts().count(), direct.contexts().count());
        for expected in direct.contexts() {
            let resumed = engine.context(expected.root()).unwrap();
            assert_eq!(resumed.processed(), expected.processed(), "{} differs", expected.root());
        }
    }

    fn engine_for_comparison(index: &Arc<IndexedOntology>) -> ClassExpressionSaturation {
        let direct = engine(index);
        direct.submit_iri(&iri("A0")).unwrap();
        assert_eq!(direct.saturate().unwrap(), SaturationOutcome::Complete);
        direct
    }

    #[test]
    fn test_submissions_during_a_run_are_not_reported_as_interrupted() {
        let index = chain(40);
        let engine = engine(&index);
        let roots: Vec<ClassId> = index.named_classes().collect();

        thread::scope(|scope| {
            let running = scope.spawn(|| engine.saturate());
            for &root in roots.iter().rev() {
                engine.submit(root).unwrap();
            }
            assert_eq!(running.join().unwrap().unwrap(), SaturationOutcome::Complete);
        });

        assert_eq!(engine.saturate().unwrap(), SaturationOutcome::Complete);
        assert_eq!(engine.state(), RunState::Quiescent);
        assert!(engine.is_saturated());
    }

    #[test]
    fn test_interrupt_with_no_work_left_is_complete() {
        let index = chain(2);
        let engine = engine(&index);
        engine.submit_iri(&iri("A0")).unwrap();
        assert_eq!(engine.saturate().unwrap(), SaturationOutcome::Complete);

        engine.interrupter().interrupt();

        assert_eq!(engine.saturate().unwrap(), SaturationOutcome::Complete);
        assert_eq!(engine.state(), RunState::Quiescent);
    }
}
