//! Lock handoff between the drive loop and requesting threads
//!
//! The drive loop holds the lock for its whole run. A requester announces
//! itself by bumping `pending` before it blocks on the lock; the loop notices
//! at its next checkpoint, parks on the condvar (releasing the lock), and the
//! requester does its work under the lock and wakes the loop when done.
//!
//! `pending` is a count so several requesters arriving together are all
//! served before the loop takes another step.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{RunSummary, RunnerError};

/// Everything the lock protects
#[derive(Debug)]
pub(crate) struct Core<S> {
    pub sim: S,
    /// Simulated seconds covered by the run so far
    pub sim_time: f64,
    pub steps: u64,
}

/// Why the drive loop left before its step budget ran out
#[derive(Debug)]
pub(crate) enum Halt {
    Stopped,
    Failed(RunnerError),
}

pub(crate) type Outcome = Result<RunSummary, RunnerError>;

pub(crate) struct Handoff<S> {
    core: Mutex<Core<S>>,
    wake: Condvar,
    pending: AtomicUsize,
    stop: AtomicBool,
    running: AtomicBool,
    outcome: Mutex<Option<Outcome>>,
}

impl<S> Handoff<S> {
    pub fn new(sim: S) -> Self {
        Self {
            core: Mutex::new(Core {
                sim,
                sim_time: 0.0,
                steps: 0,
            }),
            wake: Condvar::new(),
            pending: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            running: AtomicBool::new(false),
            outcome: Mutex::new(None),
        }
    }

    /// Run `f` with exclusive access, interrupting the loop at its next
    /// checkpoint if it is running
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut Core<S>) -> R) -> Result<R, RunnerError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let locked = self.core.lock();
        self.pending.fetch_sub(1, Ordering::SeqCst);

        let Ok(mut core) = locked else {
            self.wake.notify_all();
            return Err(RunnerError::Poisoned);
        };
        let result = f(&mut core);
        drop(core);
        self.wake.notify_all();
        Ok(result)
    }

    /// Raise the stop flag and hand the loop a wake-up
    pub fn request_stop(&self) -> Result<(), RunnerError> {
        self.with_exclusive(|_| self.stop.store(true, Ordering::SeqCst))
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Loop side: take the lock for the run
    pub fn acquire(&self) -> Result<MutexGuard<'_, Core<S>>, Halt> {
        self.core.lock().map_err(|_| Halt::Failed(RunnerError::Poisoned))
    }

    /// Loop side: yield to every pending requester, then bail out if one of
    /// them asked for a stop
    pub fn checkpoint<'a>(
        &'a self,
        guard: MutexGuard<'a, Core<S>>,
    ) -> Result<MutexGuard<'a, Core<S>>, Halt> {
        let guard = self
            .wake
            .wait_while(guard, |_| self.pending.load(Ordering::SeqCst) > 0)
            .map_err(|_| Halt::Failed(RunnerError::Poisoned))?;
        if self.stop_requested() {
            return Err(Halt::Stopped);
        }
        Ok(guard)
    }

    /// Loop side: sleep without holding the lock for up to `timeout`.
    ///
    /// Requesters get the lock straight away while the loop is parked; a
    /// stop request cuts the sleep short.
    pub fn park<'a>(
        &'a self,
        guard: MutexGuard<'a, Core<S>>,
        timeout: Duration,
    ) -> Result<MutexGuard<'a, Core<S>>, Halt> {
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, timeout, |_| {
                self.pending.load(Ordering::SeqCst) == 0 && !self.stop_requested()
            })
            .map_err(|_| Halt::Failed(RunnerError::Poisoned))?;
        Ok(guard)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Record how the run ended; the first record wins
    pub fn finish(&self, outcome: Outcome) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(outcome);
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_core(self) -> Result<Core<S>, RunnerError> {
        self.core.into_inner().map_err(|_| RunnerError::Poisoned)
    }
}

/// Clears the running flag when the drive thread exits, panics included
pub(crate) struct RunningFlag<'a, S>(pub &'a Handoff<S>);

impl<S> Drop for RunningFlag<'_, S> {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_exclusive_access_without_loop() {
        let handoff = Handoff::new(5u32);
        let doubled = handoff.with_exclusive(|core| {
            core.sim *= 2;
            core.sim
        });
        assert_eq!(doubled, Ok(10));
        assert_eq!(handoff.pending.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_checkpoint_yields_to_requester() {
        let handoff = Arc::new(Handoff::new(0u32));
        let looper = Arc::clone(&handoff);

        let worker = thread::spawn(move || -> Result<u32, String> {
            let mut guard = looper.acquire().map_err(|h| format!("{h:?}"))?;
            let started = Instant::now();
            // Spin on checkpoints until someone else has bumped the counter
            while guard.sim == 0 {
                guard = looper.checkpoint(guard).map_err(|h| format!("{h:?}"))?;
                if started.elapsed() > Duration::from_secs(10) {
                    return Err("requester never got in".into());
                }
                guard.steps += 1;
            }
            Ok(guard.sim)
        });

        thread::sleep(Duration::from_millis(20));
        handoff.with_exclusive(|core| core.sim = 7).unwrap();
        assert_eq!(worker.join().unwrap(), Ok(7));
    }

    #[test]
    fn test_stop_surfaces_at_checkpoint() {
        let handoff = Arc::new(Handoff::new(()));
        let looper = Arc::clone(&handoff);

        let worker = thread::spawn(move || {
            let Ok(mut guard) = looper.acquire() else {
                return false;
            };
            loop {
                match looper.checkpoint(guard) {
                    Ok(next) => guard = next,
                    Err(Halt::Stopped) => return true,
                    Err(Halt::Failed(_)) => return false,
                }
            }
        });

        thread::sleep(Duration::from_millis(10));
        handoff.request_stop().unwrap();
        assert!(worker.join().unwrap());
        assert!(handoff.stop_requested());
    }

    #[test]
    fn test_parked_loop_serves_requesters() {
        let handoff = Arc::new(Handoff::new(0u32));
        let looper = Arc::clone(&handoff);

        let worker = thread::spawn(move || {
            let started = Instant::now();
            let Ok(guard) = looper.acquire() else {
                return Duration::MAX;
            };
            let parked = looper.park(guard, Duration::from_secs(30));
            drop(parked);
            started.elapsed()
        });

        thread::sleep(Duration::from_millis(20));
        let asked = Instant::now();
        handoff.with_exclusive(|core| core.sim = 1).unwrap();
        assert!(asked.elapsed() < Duration::from_secs(10));

        // Only a stop ends the park early
        handoff.request_stop().unwrap();
        assert!(worker.join().unwrap() < Duration::from_secs(10));
    }

    #[test]
    fn test_first_outcome_wins() {
        let handoff = Handoff::new(());
        assert!(handoff.outcome().is_none());
        handoff.finish(Err(RunnerError::ThreadPanicked));
        handoff.finish(Err(RunnerError::Poisoned));
        assert_eq!(handoff.outcome(), Some(Err(RunnerError::ThreadPanicked)));
    }
}
