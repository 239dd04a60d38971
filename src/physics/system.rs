//! The stepping system
//!
//! Owns every entity in three capacity-bounded groups and advances them one
//! discrete step at a time. Not internally synchronized.

use std::fmt;

use serde_json::Value;

use super::body::Body;
use super::entity::{DirectionalGravity, Entity, FreeEntity, Population};
use super::narrow::resolve_pair;
use super::snapshot::Snapshot;
use super::{PhysicsError, StepError};
use crate::consts::{DEFAULT_CAPACITY, RESTING_THRESHOLD};
use crate::runner::Simulation;
use crate::settings::EngineSettings;

/// Store partition an entity lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Shapeless entities acting on the population
    Free,
    /// Immovable bodies (infinite mass)
    Static,
    /// Finite-mass bodies
    Dynamic,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Group::Free => "free",
            Group::Static => "static",
            Group::Dynamic => "dynamic",
        })
    }
}

/// Where an added entity lives; stable until the next `reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub group: Group,
    pub index: usize,
}

pub struct PhysicsSystem {
    free: Vec<Box<dyn FreeEntity>>,
    statics: Vec<Body>,
    dynamics: Vec<Body>,
    /// Upper bound per group
    capacity: usize,
    resting_threshold: f64,
    total_run_time: f64,
    steps: u64,
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for PhysicsSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsSystem")
            .field("free", &self.free.len())
            .field("statics", &self.statics.len())
            .field("dynamics", &self.dynamics.len())
            .field("capacity", &self.capacity)
            .field("total_run_time", &self.total_run_time)
            .field("steps", &self.steps)
            .finish()
    }
}

impl PhysicsSystem {
    /// Empty system holding at most `capacity` entities per group
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity.min(64)),
            statics: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            dynamics: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            resting_threshold: RESTING_THRESHOLD,
            total_run_time: 0.0,
            steps: 0,
        }
    }

    /// Build from settings, adding a gravity field when one is configured
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, PhysicsError> {
        let mut system = Self::new(settings.capacity).with_resting_threshold(settings.resting_threshold);
        if let Some(acceleration) = settings.gravity {
            system.add_entity(DirectionalGravity::new(acceleration))?;
        }
        Ok(system)
    }

    pub fn with_resting_threshold(mut self, threshold: f64) -> Self {
        self.resting_threshold = threshold;
        self
    }

    /// Classify and append an entity.
    ///
    /// Fails when the target group is already at capacity; nothing is
    /// dropped silently.
    pub fn add_entity(&mut self, entity: impl Into<Entity>) -> Result<EntityKey, PhysicsError> {
        let entity = entity.into();
        let group = match &entity {
            Entity::Free(_) => Group::Free,
            Entity::Physical(body) if body.is_static() => Group::Static,
            Entity::Physical(_) => Group::Dynamic,
        };
        let index = self.group_len(group);
        if index >= self.capacity {
            return Err(PhysicsError::CapacityExceeded {
                group,
                capacity: self.capacity,
            });
        }
        match entity {
            Entity::Free(free) => self.free.push(free),
            Entity::Physical(body) if group == Group::Static => self.statics.push(body),
            Entity::Physical(body) => self.dynamics.push(body),
        }
        Ok(EntityKey { group, index })
    }

    /// Advance every entity by `dt` seconds.
    ///
    /// Act (free, static, dynamic), integrate (static, dynamic), then
    /// collide (static x dynamic, then dynamic pairs i < j). On error the
    /// step is abandoned half-applied and the counters are left alone.
    pub fn step(&mut self, dt: f64) -> Result<(), StepError> {
        let mut population = Population::new(&mut self.statics, &mut self.dynamics);
        for entity in &mut self.free {
            entity.act(dt, &mut population)?;
        }
        for body in self.statics.iter_mut().chain(self.dynamics.iter_mut()) {
            body.act(dt);
        }
        self.check_groups()?;

        for body in self.statics.iter_mut().chain(self.dynamics.iter_mut()) {
            body.integrate(dt);
        }

        let contacts = self.collide();
        if contacts > 0 {
            log::trace!("step {}: resolved {contacts} contacts", self.steps + 1);
        }

        self.check_finite()?;
        self.total_run_time += dt;
        self.steps += 1;
        Ok(())
    }

    fn collide(&mut self) -> usize {
        let threshold = self.resting_threshold;
        let mut contacts = 0;

        for wall in &mut self.statics {
            for body in &mut self.dynamics {
                contacts += resolve_pair(wall, body, threshold);
            }
        }

        for i in 0..self.dynamics.len() {
            let (head, tail) = self.dynamics.split_at_mut(i + 1);
            let first = &mut head[i];
            for second in tail {
                contacts += resolve_pair(first, second, threshold);
            }
        }
        contacts
    }

    /// Bodies swapped in through mutable access must keep their mass class
    fn check_groups(&self) -> Result<(), StepError> {
        let groups = [(Group::Static, &self.statics), (Group::Dynamic, &self.dynamics)];
        for (group, bodies) in groups {
            let misplaced = bodies
                .iter()
                .enumerate()
                .find(|(_, b)| b.is_static() != (group == Group::Static));
            if let Some((index, body)) = misplaced {
                return Err(StepError::Misplaced {
                    entity: label(body, group, index),
                    group,
                });
            }
        }
        Ok(())
    }

    fn check_finite(&self) -> Result<(), StepError> {
        let groups = [(Group::Static, &self.statics), (Group::Dynamic, &self.dynamics)];
        for (group, bodies) in groups {
            if let Some((index, body)) = bodies.iter().enumerate().find(|(_, b)| !b.is_finite()) {
                return Err(StepError::NonFinite {
                    entity: label(body, group, index),
                });
            }
        }
        Ok(())
    }

    /// Independent render copy of every entity: free, then static, then dynamic
    pub fn copy_state(&self) -> Snapshot {
        let entities = self
            .free
            .iter()
            .map(|entity| entity.render_copy())
            .chain(self.statics.iter().map(Body::render_copy))
            .chain(self.dynamics.iter().map(Body::render_copy))
            .collect();
        Snapshot {
            sim_time: self.total_run_time,
            steps: self.steps,
            entities,
        }
    }

    /// Drop every entity and zero the clocks; capacity is kept
    pub fn reset(&mut self) {
        log::info!(
            "Resetting physics system ({} free, {} static, {} dynamic)",
            self.free.len(),
            self.statics.len(),
            self.dynamics.len()
        );
        self.free.clear();
        self.statics.clear();
        self.dynamics.clear();
        self.total_run_time = 0.0;
        self.steps = 0;
    }

    /// Offer an input to every free entity; true if any handled it
    pub fn apply_input(&mut self, key: &str, value: &Value) -> bool {
        let mut handled = false;
        for entity in &mut self.free {
            handled |= entity.apply_input(key, value);
        }
        if !handled {
            log::warn!("No entity handled input '{key}'");
        }
        handled
    }

    pub fn body(&self, key: EntityKey) -> Option<&Body> {
        match key.group {
            Group::Free => None,
            Group::Static => self.statics.get(key.index),
            Group::Dynamic => self.dynamics.get(key.index),
        }
    }

    pub fn body_mut(&mut self, key: EntityKey) -> Option<&mut Body> {
        match key.group {
            Group::Free => None,
            Group::Static => self.statics.get_mut(key.index),
            Group::Dynamic => self.dynamics.get_mut(key.index),
        }
    }

    pub fn statics(&self) -> &[Body] {
        &self.statics
    }

    pub fn dynamics(&self) -> &[Body] {
        &self.dynamics
    }

    pub fn group_len(&self, group: Group) -> usize {
        match group {
            Group::Free => self.free.len(),
            Group::Static => self.statics.len(),
            Group::Dynamic => self.dynamics.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.free.len() + self.statics.len() + self.dynamics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn resting_threshold(&self) -> f64 {
        self.resting_threshold
    }

    /// Simulated seconds since construction or the last reset
    pub fn total_run_time(&self) -> f64 {
        self.total_run_time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

fn label(body: &Body, group: Group, index: usize) -> String {
    if body.name.is_empty() {
        format!("{group} #{index}")
    } else {
        body.name.clone()
    }
}

impl Simulation for PhysicsSystem {
    type Snapshot = Snapshot;
    type Error = StepError;

    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        PhysicsSystem::step(self, dt)
    }

    fn snapshot(&self) -> Snapshot {
        self.copy_state()
    }

    fn apply_input(&mut self, key: &str, value: Value) {
        PhysicsSystem::apply_input(self, key, &value);
    }
}
