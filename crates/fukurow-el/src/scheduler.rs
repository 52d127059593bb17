//! Active-context queue shared by the worker pool

use crate::context::lock;
use fukurow_el_index::ClassId;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Cooperative cancellation flag, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct Interrupter(Arc<AtomicBool>);

impl Interrupter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of asking for work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    Context(ClassId),
    Quiescent,
    Interrupted,
    Aborted,
}

#[derive(Debug, Default)]
struct SchedulerState {
    queue: VecDeque<ClassId>,
    /// Roots currently owned by a worker
    claimed: usize,
    aborted: bool,
}

/// Queue of active roots plus the number of claimed ones, kept under one lock
/// so that quiescence is decided atomically
#[derive(Debug)]
pub(crate) struct Scheduler {
    state: Mutex<SchedulerState>,
    wakeup: Condvar,
    idle_wait: Duration,
}

impl Scheduler {
    pub fn new(idle_wait: Duration) -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            wakeup: Condvar::new(),
            idle_wait,
        }
    }

    /// Block until a root is available, the pool is quiescent, the run is
    /// interrupted or it was aborted
    pub fn claim(&self, interrupter: &Interrupter) -> Claim {
        let mut state = lock(&self.state);
        loop {
            if state.aborted {
                return Claim::Aborted;
            }
            if interrupter.is_interrupted() {
                return Claim::Interrupted;
            }
            if let Some(root) = state.queue.pop_front() {
                state.claimed += 1;
                return Claim::Context(root);
            }
            if state.claimed == 0 {
                self.wakeup.notify_all();
                return Claim::Quiescent;
            }
            let (guard, _) = self
                .wakeup
                .wait_timeout(state, self.idle_wait)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Hand a newly activated root to the pool
    pub fn activate(&self, root: ClassId) {
        lock(&self.state).queue.push_back(root);
        self.wakeup.notify_one();
    }

    /// Give up ownership of a claimed root
    pub fn release(&self) {
        let mut state = lock(&self.state);
        state.claimed = state.claimed.saturating_sub(1);
        if state.claimed == 0 && state.queue.is_empty() {
            self.wakeup.notify_all();
        }
    }

    /// Give up ownership and put the root back, it still has work
    pub fn requeue(&self, root: ClassId) {
        let mut state = lock(&self.state);
        state.claimed = state.claimed.saturating_sub(1);
        state.queue.push_back(root);
        self.wakeup.notify_one();
    }

    pub fn abort(&self) {
        lock(&self.state).aborted = true;
        self.wakeup.notify_all();
    }

    /// Roots waiting to be claimed
    pub fn pending(&self) -> usize {
        lock(&self.state).queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn scheduler() -> Scheduler {
        Scheduler::new(Duration::from_millis(5))
    }

    #[test]
    fn test_empty_scheduler_is_quiescent() {
        assert_eq!(scheduler().claim(&Interrupter::new()), Claim::Quiescent);
    }

    #[test]
    fn test_claims_follow_activation_order() {
        let scheduler = scheduler();
        let interrupter = Interrupter::new();
        scheduler.activate(ClassId(2));
        scheduler.activate(ClassId(1));

        assert_eq!(scheduler.claim(&interrupter), Claim::Context(ClassId(2)));
        assert_eq!(scheduler.claim(&interrupter), Claim::Context(ClassId(1)));
        scheduler.release();
        scheduler.release();
        assert_eq!(scheduler.claim(&interrupter), Claim::Quiescent);
    }

    #[test]
    fn test_idle_worker_waits_for_claimed_root() {
        let scheduler = Arc::new(scheduler());
        let interrupter = Interrupter::new();
        scheduler.activate(ClassId(0));
        assert_eq!(scheduler.claim(&interrupter), Claim::Context(ClassId(0)));

        let waiting = {
            let scheduler = Arc::clone(&scheduler);
            let interrupter = interrupter.clone();
            thread::spawn(move || scheduler.claim(&interrupter))
        };
        // the owner produces into another root, then lets go
        thread::sleep(Duration::from_millis(20));
        scheduler.activate(ClassId(1));
        scheduler.release();

        assert_eq!(waiting.join().unwrap(), Claim::Context(ClassId(1)));
    }

    #[test]
    fn test_interrupt_wins_over_pending_work() {
        let scheduler = scheduler();
        let interrupter = Interrupter::new();
        scheduler.activate(ClassId(0));
        interrupter.interrupt();

        assert_eq!(scheduler.claim(&interrupter), Claim::Interrupted);
        assert_eq!(scheduler.pending(), 1);

        interrupter.clear();
        assert_eq!(scheduler.claim(&interrupter), Claim::Context(ClassId(0)));
    }

    #[test]
    fn test_requeue_keeps_root_pending() {
        let scheduler = scheduler();
        let interrupter = Interrupter::new();
        scheduler.activate(ClassId(3));
        assert_eq!(scheduler.claim(&interrupter), Claim::Context(ClassId(3)));

        scheduler.requeue(ClassId(3));

        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.claim(&interrupter), Claim::Context(ClassId(3)));
    }

    #[test]
    fn test_abort_wakes_waiters() {
        let scheduler = Arc::new(scheduler());
        let interrupter = Interrupter::new();
        scheduler.activate(ClassId(0));
        scheduler.claim(&interrupter);

        let waiting = {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || scheduler.claim(&interrupter))
        };
        scheduler.abort();

        assert_eq!(waiting.join().unwrap(), Claim::Aborted);
        scheduler.activate(ClassId(1));
        assert_eq!(scheduler.claim(&Interrupter::new()), Claim::Aborted);
    }
}
