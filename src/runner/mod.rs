//! Background simulation runner
//!
//! Drives any [`Simulation`] on its own thread while other threads take
//! snapshots, inject input, or stop it. Requests never observe a half-done
//! step: the drive loop only lets go of the simulation at checkpoints
//! between steps (and while parked by the throttle).

mod handoff;
pub mod pacing;

pub use pacing::{Pacing, Throttle, clamp_step};

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;

use handoff::{Halt, Handoff, Outcome, RunningFlag};

/// Anything the runner can step, copy and feed input to
pub trait Simulation: Send + 'static {
    /// Owned copy of the state, sharing nothing with the live simulation
    type Snapshot: Send;
    type Error: std::error::Error + Send + 'static;

    /// Advance by `dt` simulated seconds. An error ends the run.
    fn step(&mut self, dt: f64) -> Result<(), Self::Error>;

    fn snapshot(&self) -> Self::Snapshot;

    /// Deliver an opaque external input
    fn apply_input(&mut self, key: &str, value: Value);
}

/// Runner errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunnerError {
    /// A runner can only be started once
    #[error("simulation runner already started")]
    AlreadyStarted,
    /// Requests need a started runner
    #[error("simulation runner not started")]
    NotStarted,
    /// The runner was stopped on request
    #[error("simulation runner was stopped")]
    Stopped,
    /// The simulation reported an error; its state is not trustworthy
    #[error("step {step} failed at t={sim_time}s: {message}")]
    StepFailed {
        step: u64,
        sim_time: f64,
        message: String,
    },
    /// A thread panicked while holding the simulation
    #[error("simulation lock poisoned")]
    Poisoned,
    #[error("simulation thread panicked")]
    ThreadPanicked,
    /// The drive thread could not be spawned
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(String),
    /// The drive thread has not let go of the simulation yet
    #[error("simulation thread still running")]
    StillRunning,
}

/// Lifecycle of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    /// Ran out of steps
    Completed,
    /// Stopped on request
    Stopped,
    /// A step failed or the thread panicked
    Failed,
}

/// How a run that did not fail came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunEnd {
    #[default]
    Completed,
    Stopped,
}

/// Totals for one run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub steps: u64,
    pub sim_time: f64,
    pub real_time: Duration,
    pub ended: RunEnd,
}

/// Owns a simulation and the thread that steps it.
///
/// Single use: `start` once, then make requests from any thread sharing a
/// reference. Dropping a running runner stops it and waits for the thread.
pub struct SimulationRunner<S: Simulation> {
    handoff: Arc<Handoff<S>>,
    pacing: Pacing,
    started: bool,
    thread: Option<JoinHandle<()>>,
}

impl<S: Simulation> SimulationRunner<S> {
    pub fn new(simulation: S, pacing: Pacing) -> Self {
        Self {
            handoff: Arc::new(Handoff::new(simulation)),
            pacing,
            started: false,
            thread: None,
        }
    }

    /// Spawn the drive thread
    pub fn start(&mut self) -> Result<(), RunnerError> {
        if self.started {
            return Err(RunnerError::AlreadyStarted);
        }
        self.started = true;
        self.handoff.set_running(true);

        let handoff = Arc::clone(&self.handoff);
        let pacing = self.pacing;
        let spawned = thread::Builder::new()
            .name("simulation".into())
            .spawn(move || {
                let _running = RunningFlag(&*handoff);
                let outcome = drive(&handoff, &pacing);
                match &outcome {
                    Ok(summary) => log::info!(
                        "Simulation {:?} after {} steps ({:.3}s simulated, {:.3}s real)",
                        summary.ended,
                        summary.steps,
                        summary.sim_time,
                        summary.real_time.as_secs_f64()
                    ),
                    Err(err) => log::error!("Simulation failed: {err}"),
                }
                handoff.finish(outcome);
            });

        match spawned {
            Ok(handle) => {
                log::info!("Simulation runner started: {:?}", self.pacing);
                self.thread = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.handoff.set_running(false);
                let err = RunnerError::Spawn(err.to_string());
                self.handoff.finish(Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Copy the simulation state between two steps
    pub fn snapshot(&self) -> Result<S::Snapshot, RunnerError> {
        self.ensure_live()?;
        self.handoff.with_exclusive(|core| core.sim.snapshot())
    }

    /// Hand an input to the simulation between two steps
    pub fn apply_input(&self, key: &str, value: Value) -> Result<(), RunnerError> {
        self.ensure_live()?;
        log::debug!("Delivering input '{key}'");
        self.handoff
            .with_exclusive(|core| core.sim.apply_input(key, value))
    }

    /// Run `f` on the live simulation between two steps, e.g. to add
    /// entities while the run goes on
    pub fn with_simulation<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, RunnerError> {
        self.ensure_live()?;
        self.handoff.with_exclusive(|core| f(&mut core.sim))
    }

    /// Ask the loop to end at its next checkpoint; returns without waiting
    pub fn stop(&self) -> Result<(), RunnerError> {
        if !self.started {
            return Err(RunnerError::NotStarted);
        }
        if !self.handoff.stop_requested() {
            log::info!("Stopping simulation runner");
        }
        self.handoff.request_stop()
    }

    /// Block until the drive thread exits and return how the run ended
    pub fn await_completion(&mut self) -> Result<RunSummary, RunnerError> {
        if !self.started {
            return Err(RunnerError::NotStarted);
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                self.handoff.finish(Err(RunnerError::ThreadPanicked));
            }
        }
        self.handoff
            .outcome()
            .unwrap_or(Err(RunnerError::ThreadPanicked))
    }

    pub fn stop_and_await(&mut self) -> Result<RunSummary, RunnerError> {
        self.stop()?;
        self.await_completion()
    }

    /// Non-blocking liveness check
    pub fn is_running(&self) -> bool {
        self.handoff.is_running()
    }

    pub fn state(&self) -> RunnerState {
        if !self.started {
            return RunnerState::Idle;
        }
        if self.is_running() {
            return RunnerState::Running;
        }
        match self.handoff.outcome() {
            Some(Ok(RunSummary {
                ended: RunEnd::Completed,
                ..
            })) => RunnerState::Completed,
            Some(Ok(RunSummary {
                ended: RunEnd::Stopped,
                ..
            })) => RunnerState::Stopped,
            _ => RunnerState::Failed,
        }
    }

    /// Simulated seconds covered so far
    pub fn elapsed_sim_time(&self) -> Result<f64, RunnerError> {
        self.handoff.with_exclusive(|core| core.sim_time)
    }

    pub fn steps_taken(&self) -> Result<u64, RunnerError> {
        self.handoff.with_exclusive(|core| core.steps)
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Take the simulation back once the thread is done (stopping it first
    /// if it is still going).
    ///
    /// A run that failed keeps its error: the state it left behind is not
    /// handed out.
    pub fn into_simulation(mut self) -> Result<S, RunnerError> {
        if self.thread.is_some() {
            self.stop()?;
        }
        if self.started {
            self.await_completion()?;
        }
        let handoff = Arc::clone(&self.handoff);
        drop(self);
        let handoff = Arc::try_unwrap(handoff).map_err(|_| RunnerError::StillRunning)?;
        Ok(handoff.into_core()?.sim)
    }

    fn ensure_live(&self) -> Result<(), RunnerError> {
        if !self.started {
            Err(RunnerError::NotStarted)
        } else if self.handoff.stop_requested() {
            Err(RunnerError::Stopped)
        } else {
            Ok(())
        }
    }
}

impl<S: Simulation> Drop for SimulationRunner<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = self.handoff.request_stop();
            let _ = handle.join();
        }
    }
}

/// Run the drive loop to its end and fold the halt reason into an outcome
fn drive<S: Simulation>(handoff: &Handoff<S>, pacing: &Pacing) -> Outcome {
    let started = Instant::now();
    let mut summary = RunSummary::default();
    let halt = drive_loop(handoff, pacing, started, &mut summary);
    summary.real_time = started.elapsed();
    match halt {
        Ok(()) => Ok(summary),
        Err(Halt::Stopped) => Ok(RunSummary {
            ended: RunEnd::Stopped,
            ..summary
        }),
        Err(Halt::Failed(err)) => Err(err),
    }
}

fn drive_loop<S: Simulation>(
    handoff: &Handoff<S>,
    pacing: &Pacing,
    started: Instant,
    summary: &mut RunSummary,
) -> Result<(), Halt> {
    let limit = pacing.step_limit();
    let throttle = pacing.throttle();
    let mut guard = handoff.acquire()?;
    let mut last = started;

    loop {
        guard = handoff.checkpoint(guard)?;
        if limit.is_some_and(|limit| summary.steps >= limit) {
            return Ok(());
        }

        let now = Instant::now();
        let dt = pacing.next_step(now - last);
        last = now;

        if let Err(err) = guard.sim.step(dt) {
            return Err(Halt::Failed(RunnerError::StepFailed {
                step: guard.steps + 1,
                sim_time: guard.sim_time,
                message: err.to_string(),
            }));
        }
        guard.sim_time += dt;
        guard.steps += 1;
        summary.steps = guard.steps;
        summary.sim_time = guard.sim_time;

        while let Some(wait) = throttle.delay(summary.sim_time, started.elapsed()) {
            guard = handoff.park(guard, wait)?;
            guard = handoff.checkpoint(guard)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Body, DirectionalGravity, PhysicsSystem};
    use glam::DVec3;
    use serde_json::json;

    #[derive(Debug, Error)]
    #[error("boom at step {0}")]
    struct Boom(u64);

    /// Counts steps and records inputs; optionally fails at a given step
    #[derive(Default)]
    struct Counter {
        steps: u64,
        time: f64,
        inputs: Vec<(String, Value)>,
        fail_at: Option<u64>,
    }

    impl Simulation for Counter {
        type Snapshot = (u64, f64, usize);
        type Error = Boom;

        fn step(&mut self, dt: f64) -> Result<(), Boom> {
            if self.fail_at == Some(self.steps + 1) {
                return Err(Boom(self.steps + 1));
            }
            self.steps += 1;
            self.time += dt;
            Ok(())
        }

        fn snapshot(&self) -> Self::Snapshot {
            (self.steps, self.time, self.inputs.len())
        }

        fn apply_input(&mut self, key: &str, value: Value) {
            self.inputs.push((key.to_string(), value));
        }
    }

    #[test]
    fn test_fixed_step_completion() {
        let mut runner = SimulationRunner::new(Counter::default(), Pacing::fixed(0.01, 100));
        assert_eq!(runner.state(), RunnerState::Idle);
        runner.start().unwrap();

        let summary = runner.await_completion().unwrap();
        assert_eq!(summary.steps, 100);
        assert!((summary.sim_time - 1.0).abs() < 1e-9);
        assert_eq!(summary.ended, RunEnd::Completed);
        assert_eq!(runner.state(), RunnerState::Completed);
        assert!(!runner.is_running());

        // The final state stays readable after natural completion
        let (steps, _, _) = runner.snapshot().unwrap();
        assert_eq!(steps, 100);
        assert_eq!(runner.steps_taken(), Ok(100));

        let counter = runner.into_simulation().unwrap();
        assert_eq!(counter.steps, 100);
    }

    #[test]
    fn test_start_twice() {
        let mut runner = SimulationRunner::new(Counter::default(), Pacing::fixed(0.01, 1));
        runner.start().unwrap();
        assert_eq!(runner.start(), Err(RunnerError::AlreadyStarted));
        runner.await_completion().unwrap();
    }

    #[test]
    fn test_requests_before_start() {
        let mut runner = SimulationRunner::new(Counter::default(), Pacing::fixed(0.01, 1));
        assert_eq!(runner.snapshot().unwrap_err(), RunnerError::NotStarted);
        assert_eq!(runner.apply_input("k", json!(1)), Err(RunnerError::NotStarted));
        assert_eq!(runner.stop(), Err(RunnerError::NotStarted));
        assert_eq!(runner.await_completion(), Err(RunnerError::NotStarted));
        assert!(!runner.is_running());
    }

    #[test]
    fn test_stop_unbounded_run() {
        let mut runner = SimulationRunner::new(Counter::default(), Pacing::real_time(1.0));
        runner.start().unwrap();
        assert!(runner.is_running());
        assert_eq!(runner.state(), RunnerState::Running);

        thread::sleep(Duration::from_millis(30));
        let summary = runner.stop_and_await().unwrap();
        assert_eq!(summary.ended, RunEnd::Stopped);
        assert!(summary.steps > 0);

        assert!(!runner.is_running());
        assert_eq!(runner.state(), RunnerState::Stopped);
        assert_eq!(runner.snapshot().unwrap_err(), RunnerError::Stopped);
        assert_eq!(runner.apply_input("k", json!(1)), Err(RunnerError::Stopped));
    }

    #[test]
    fn test_step_failure_is_reported() {
        let counter = Counter {
            fail_at: Some(5),
            ..Counter::default()
        };
        let mut runner = SimulationRunner::new(counter, Pacing::fixed(0.5, 100));
        runner.start().unwrap();

        match runner.await_completion() {
            Err(RunnerError::StepFailed {
                step,
                sim_time,
                message,
            }) => {
                assert_eq!(step, 5);
                assert!((sim_time - 2.0).abs() < 1e-12);
                assert!(message.contains("boom"));
            }
            other => panic!("expected a step failure, got {other:?}"),
        }
        assert_eq!(runner.state(), RunnerState::Failed);
        // Failure is sticky
        assert!(runner.await_completion().is_err());
    }

    #[test]
    fn test_inputs_are_delivered() {
        let mut runner = SimulationRunner::new(Counter::default(), Pacing::real_time(1.0));
        runner.start().unwrap();
        for i in 0..3 {
            runner.apply_input("nudge", json!(i)).unwrap();
        }
        let (_, _, inputs) = runner.snapshot().unwrap();
        assert_eq!(inputs, 3);

        runner.stop_and_await().unwrap();
        let counter = runner.into_simulation().unwrap();
        assert_eq!(counter.inputs[2], ("nudge".to_string(), json!(2)));
    }

    #[test]
    fn test_failed_run_keeps_its_error() {
        let counter = Counter {
            fail_at: Some(3),
            ..Counter::default()
        };
        let mut runner = SimulationRunner::new(counter, Pacing::fixed(0.1, 10));
        runner.start().unwrap();
        while runner.is_running() {
            thread::sleep(Duration::from_millis(1));
        }

        match runner.into_simulation() {
            Err(RunnerError::StepFailed { step, .. }) => assert_eq!(step, 3),
            Err(other) => panic!("expected a step failure, got {other:?}"),
            Ok(_) => panic!("failed run handed back its state"),
        }
    }

    #[test]
    fn test_entity_added_mid_run() {
        let mut system = PhysicsSystem::new(4);
        system
            .add_entity(Body::sphere(DVec3::ZERO, 1.0, DVec3::ZERO, 1.0, 1.0).unwrap().named("first"))
            .unwrap();
        let mut runner = SimulationRunner::new(system, Pacing::real_time(1.0));
        assert_eq!(
            runner.with_simulation(|sim| sim.len()).unwrap_err(),
            RunnerError::NotStarted
        );
        runner.start().unwrap();
        thread::sleep(Duration::from_millis(5));

        let late = Body::sphere(DVec3::new(10.0, 0.0, 0.0), 1.0, DVec3::ZERO, 1.0, 1.0)
            .unwrap()
            .named("late");
        runner.with_simulation(|sim| sim.add_entity(late)).unwrap().unwrap();

        let snapshot = runner.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.find("late").and_then(|e| e.position()),
            Some(DVec3::new(10.0, 0.0, 0.0))
        );

        runner.stop_and_await().unwrap();
        assert_eq!(
            runner.with_simulation(|sim| sim.len()).unwrap_err(),
            RunnerError::Stopped
        );
        assert_eq!(runner.into_simulation().unwrap().len(), 2);
    }

    #[test]
    fn test_throttle_holds_back_sim_time() {
        let pacing = Pacing::fixed(0.01, 20).with_throttle(Throttle::MinRealPerSim { real_per_sim: 1.0 });
        let mut runner = SimulationRunner::new(Counter::default(), pacing);
        runner.start().unwrap();
        let summary = runner.await_completion().unwrap();
        assert!(summary.real_time >= Duration::from_millis(200));
    }

    #[test]
    fn test_requests_served_during_throttle_wait() {
        // Would take over 16 minutes if left alone
        let pacing = Pacing::fixed(1.0, 1000).with_throttle(Throttle::MinRealPerSim { real_per_sim: 1.0 });
        let mut runner = SimulationRunner::new(Counter::default(), pacing);
        let started = Instant::now();
        runner.start().unwrap();
        thread::sleep(Duration::from_millis(20));

        let (steps, _, _) = runner.snapshot().unwrap();
        assert!(steps <= 2);
        let summary = runner.stop_and_await().unwrap();
        assert_eq!(summary.ended, RunEnd::Stopped);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_drop_stops_running_thread() {
        let mut runner = SimulationRunner::new(Counter::default(), Pacing::real_time(1.0));
        runner.start().unwrap();
        thread::sleep(Duration::from_millis(5));
        drop(runner);
    }

    #[test]
    fn test_snapshots_never_tear() {
        let g = -9.81;
        let y0 = 1000.0;
        let mut system = PhysicsSystem::new(4);
        system.add_entity(DirectionalGravity::new(DVec3::new(0.0, g, 0.0))).unwrap();
        system
            .add_entity(
                Body::sphere(DVec3::new(0.0, y0, 0.0), 1.0, DVec3::ZERO, 3.0, 1.0)
                    .unwrap()
                    .named("ball"),
            )
            .unwrap();

        let mut runner = SimulationRunner::new(system, Pacing::real_time(1.0));
        runner.start().unwrap();

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let snapshot = runner.snapshot().unwrap();
                        let ball = snapshot.find("ball").unwrap();
                        let t = snapshot.sim_time;
                        let y = ball.position().unwrap().y;
                        let expected_y = y0 + 0.5 * g * t * t;
                        assert!((y - expected_y).abs() < 1e-6, "y={y} expected {expected_y} at t={t}");
                        assert!((ball.velocity.y - g * t).abs() < 1e-6);
                        thread::sleep(Duration::from_micros(200));
                    }
                });
            }
        });

        let summary = runner.stop_and_await().unwrap();
        assert_eq!(summary.ended, RunEnd::Stopped);
    }

    #[test]
    fn test_physics_runs_to_completion() {
        let mut system = PhysicsSystem::new(4);
        system.add_entity(DirectionalGravity::new(DVec3::new(0.0, -5.0, 0.0))).unwrap();
        system
            .add_entity(
                Body::sphere(DVec3::new(0.0, 100.0, 0.0), 1.0, DVec3::ZERO, 2.0, 1.0)
                    .unwrap()
                    .named("ball"),
            )
            .unwrap();

        let mut runner = SimulationRunner::new(system, Pacing::fixed(0.1, 10));
        runner.start().unwrap();
        runner.await_completion().unwrap();

        let snapshot = runner.snapshot().unwrap();
        let ball = snapshot.find("ball").unwrap();
        assert!((ball.position().unwrap().y - 97.5).abs() < 1e-9);
        assert!((ball.velocity.y + 5.0).abs() < 1e-9);
        assert_eq!(snapshot.steps, 10);
    }
}
