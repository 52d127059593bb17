//! Per-root saturation state
//!
//! A [`Context`] is created the first time its root is referenced and lives
//! until the engine is dropped. Any thread may append to its to-do queue; only
//! the worker that claimed the root from the scheduler inserts into its
//! premises.

use crate::conclusion::Conclusion;
use fukurow_el_index::{ClassId, DisjointnessId, PropertyId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Processed conclusions of one context, indexed the way the rules look them up
#[derive(Debug, Default)]
pub(crate) struct Premises {
    pub initialized: bool,
    pub sub_contexts: HashSet<PropertyId>,
    pub composed: HashSet<ClassId>,
    pub decomposed: HashSet<ClassId>,
    /// Union of `composed` and `decomposed`
    pub subsumers: HashSet<ClassId>,
    pub forward_links: HashMap<PropertyId, HashSet<ClassId>>,
    pub backward_links: HashMap<PropertyId, HashSet<ClassId>>,
    pub propagations: HashMap<PropertyId, HashSet<ClassId>>,
    pub disjoint_subsumers: HashMap<DisjointnessId, HashSet<ClassId>>,
    pub inconsistent: bool,
    pub size: usize,
}

impl Premises {
    /// Returns false when the conclusion was already processed
    pub fn insert(&mut self, conclusion: Conclusion) -> bool {
        let inserted = match conclusion {
            Conclusion::ContextInitialization => !std::mem::replace(&mut self.initialized, true),
            Conclusion::SubContextInitialization { sub_root } => self.sub_contexts.insert(sub_root),
            Conclusion::ComposedSubsumer(d) => {
                let inserted = self.composed.insert(d);
                if inserted {
                    self.subsumers.insert(d);
                }
                inserted
            }
            Conclusion::DecomposedSubsumer(d) => {
                let inserted = self.decomposed.insert(d);
                if inserted {
                    self.subsumers.insert(d);
                }
                inserted
            }
            Conclusion::ForwardLink { relation, target } => {
                self.forward_links.entry(relation).or_default().insert(target)
            }
            Conclusion::BackwardLink { relation, source } => {
                self.backward_links.entry(relation).or_default().insert(source)
            }
            Conclusion::Propagation { relation, carry } => {
                self.propagations.entry(relation).or_default().insert(carry)
            }
            Conclusion::DisjointSubsumer { axiom, member } => {
                self.disjoint_subsumers.entry(axiom).or_default().insert(member)
            }
            Conclusion::Contradiction => !std::mem::replace(&mut self.inconsistent, true),
        };
        if inserted {
            self.size += 1;
        }
        inserted
    }

    pub fn contains(&self, conclusion: &Conclusion) -> bool {
        match conclusion {
            Conclusion::ContextInitialization => self.initialized,
            Conclusion::SubContextInitialization { sub_root } => {
                self.sub_contexts.contains(sub_root)
            }
            Conclusion::ComposedSubsumer(d) => self.composed.contains(d),
            Conclusion::DecomposedSubsumer(d) => self.decomposed.contains(d),
            Conclusion::ForwardLink { relation, target } => {
                contains_in(&self.forward_links, relation, target)
            }
            Conclusion::BackwardLink { relation, source } => {
                contains_in(&self.backward_links, relation, source)
            }
            Conclusion::Propagation { relation, carry } => {
                contains_in(&self.propagations, relation, carry)
            }
            Conclusion::DisjointSubsumer { axiom, member } => {
                contains_in(&self.disjoint_subsumers, axiom, member)
            }
            Conclusion::Contradiction => self.inconsistent,
        }
    }

    fn snapshot(&self) -> Vec<Conclusion> {
        let mut processed = Vec::with_capacity(self.size);
        if self.initialized {
            processed.push(Conclusion::ContextInitialization);
        }
        processed.extend(
            self.sub_contexts
                .iter()
                .map(|&sub_root| Conclusion::SubContextInitialization { sub_root }),
        );
        processed.extend(self.composed.iter().map(|&d| Conclusion::ComposedSubsumer(d)));
        processed.extend(self.decomposed.iter().map(|&d| Conclusion::DecomposedSubsumer(d)));
        for (&relation, targets) in &self.forward_links {
            processed.extend(
                targets
                    .iter()
                    .map(|&target| Conclusion::ForwardLink { relation, target }),
            );
        }
        for (&relation, sources) in &self.backward_links {
            processed.extend(
                sources
                    .iter()
                    .map(|&source| Conclusion::BackwardLink { relation, source }),
            );
        }
        for (&relation, carries) in &self.propagations {
            processed.extend(
                carries
                    .iter()
                    .map(|&carry| Conclusion::Propagation { relation, carry }),
            );
        }
        for (&axiom, members) in &self.disjoint_subsumers {
            processed.extend(
                members
                    .iter()
                    .map(|&member| Conclusion::DisjointSubsumer { axiom, member }),
            );
        }
        if self.inconsistent {
            processed.push(Conclusion::Contradiction);
        }
        processed.sort();
        processed
    }
}

fn contains_in<K, V>(map: &HashMap<K, HashSet<V>>, key: &K, value: &V) -> bool
where
    K: std::hash::Hash + Eq,
    V: std::hash::Hash + Eq,
{
    map.get(key).is_some_and(|values| values.contains(value))
}

fn pairs(map: &HashMap<PropertyId, HashSet<ClassId>>) -> Vec<(PropertyId, ClassId)> {
    let mut pairs: Vec<_> = map
        .iter()
        .flat_map(|(&relation, ids)| ids.iter().map(move |&id| (relation, id)))
        .collect();
    pairs.sort();
    pairs
}

fn sorted(set: &HashSet<ClassId>) -> Vec<ClassId> {
    let mut ids: Vec<_> = set.iter().copied().collect();
    ids.sort();
    ids
}

/// Saturation state of one root class expression
#[derive(Debug)]
pub struct Context {
    root: ClassId,
    todo: Mutex<VecDeque<Conclusion>>,
    active: AtomicBool,
    premises: Mutex<Premises>,
}

impl Context {
    pub(crate) fn new(root: ClassId) -> Self {
        Self {
            root,
            todo: Mutex::new(VecDeque::new()),
            active: AtomicBool::new(false),
            premises: Mutex::new(Premises::default()),
        }
    }

    pub fn root(&self) -> ClassId {
        self.root
    }

    /// Queue a conclusion; true when this call activated the context and the
    /// caller has to hand the root to the scheduler
    pub(crate) fn add_to_do(&self, conclusion: Conclusion) -> bool {
        // the owner may hold the premises; the insert below is authoritative
        if let Ok(premises) = self.premises.try_lock() {
            if premises.contains(&conclusion) {
                return false;
            }
        }
        lock(&self.todo).push_back(conclusion);
        !self.active.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn take_to_do(&self) -> Option<Conclusion> {
        lock(&self.todo).pop_front()
    }

    /// Clear the activation flag. Returns true when a conclusion slipped in
    /// after the last empty [`Context::take_to_do`] and this call took the
    /// activation back.
    pub(crate) fn deactivate(&self) -> bool {
        self.active.store(false, Ordering::SeqCst);
        if lock(&self.todo).is_empty() {
            return false;
        }
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn premises(&self) -> MutexGuard<'_, Premises> {
        lock(&self.premises)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Inactive with nothing left to process
    pub fn is_saturated(&self) -> bool {
        !self.is_active() && lock(&self.todo).is_empty()
    }

    pub fn is_inconsistent(&self) -> bool {
        self.premises().inconsistent
    }

    /// All subsumers derived so far, sorted by id
    pub fn subsumers(&self) -> Vec<ClassId> {
        sorted(&self.premises().subsumers)
    }

    pub fn composed_subsumers(&self) -> Vec<ClassId> {
        sorted(&self.premises().composed)
    }

    pub fn decomposed_subsumers(&self) -> Vec<ClassId> {
        sorted(&self.premises().decomposed)
    }

    pub fn contains_subsumer(&self, class: ClassId) -> bool {
        self.premises().subsumers.contains(&class)
    }

    /// `(relation, target)` for every stored `root ⊑ ∃relation.target`
    pub fn forward_links(&self) -> Vec<(PropertyId, ClassId)> {
        pairs(&self.premises().forward_links)
    }

    /// `(relation, source)` for every `source ⊑ ∃relation.root`
    pub fn backward_links(&self) -> Vec<(PropertyId, ClassId)> {
        pairs(&self.premises().backward_links)
    }

    /// Sorted copy of the processed set
    pub fn processed(&self) -> Vec<Conclusion> {
        self.premises().snapshot()
    }

    pub fn processed_count(&self) -> usize {
        self.premises().size
    }
}

/// One lazily created context per class node
#[derive(Debug)]
pub(crate) struct ContextSlots {
    slots: Vec<OnceLock<Context>>,
}

impl ContextSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn get(&self, root: ClassId) -> Option<&Context> {
        self.slots.get(root.index()).and_then(OnceLock::get)
    }

    /// The context of `root` and whether this call created it. `None` for
    /// ids outside the index.
    pub fn get_or_create(&self, root: ClassId) -> Option<(&Context, bool)> {
        let slot = self.slots.get(root.index())?;
        let mut created = false;
        let context = slot.get_or_init(|| {
            created = true;
            Context::new(root)
        });
        Some((context, created))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.slots.iter().filter_map(OnceLock::get)
    }
}
