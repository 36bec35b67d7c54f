use tracing::info;

use super::system::StarSystem;
use crate::config::ScenarioConfig;
use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Paused,
    Running,
}

// ---------------------------------------------------------------------------
// Simulation clock
// ---------------------------------------------------------------------------

/// Drives a frozen [`StarSystem`] in fixed ticks of `time_step` seconds.
/// `tick` only advances while running; `step` always does.
#[derive(Debug)]
pub struct Simulation {
    system: StarSystem,
    state: RunState,
    elapsed: u64,   // s of simulated time
    time_step: u64, // s per tick
    ticks: u64,
}

impl Simulation {
    /// Wrap `system`, computing its barycenters first if that has not been done.
    pub fn new(mut system: StarSystem) -> Result<Self> {
        if !system.is_frozen() {
            system.barycenters()?;
        }
        let time_step = system.config()?.time_step;
        Ok(Self {
            system,
            state: RunState::default(),
            elapsed: 0,
            time_step,
            ticks: 0,
        })
    }

    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self> {
        Self::new(StarSystem::from_scenario(scenario)?)
    }

    pub fn set_time_step(&mut self, dt: u64) -> Result<()> {
        if dt == 0 {
            return Err(SimError::InvalidArgument("time step must be at least 1 s".into()));
        }
        self.time_step = dt;
        Ok(())
    }

    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn start(&mut self) {
        self.set_state(RunState::Running);
    }

    pub fn pause(&mut self) {
        self.set_state(RunState::Paused);
    }

    pub fn resume(&mut self) {
        self.start();
    }

    pub fn toggle(&mut self) {
        match self.state {
            RunState::Paused => self.start(),
            RunState::Running => self.pause(),
        }
    }

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            info!(?state, elapsed = self.elapsed, "run state changed");
            self.state = state;
        }
    }

    /// Advance one tick if running. Returns whether time moved.
    pub fn tick(&mut self) -> Result<bool> {
        match self.state {
            RunState::Paused => Ok(false),
            RunState::Running => self.step().map(|()| true),
        }
    }

    /// Advance one tick regardless of the run state.
    pub fn step(&mut self) -> Result<()> {
        self.system.grav_interaction(self.time_step)?;
        self.elapsed += self.time_step;
        self.ticks += 1;
        Ok(())
    }

    /// `n` unconditional steps.
    pub fn run(&mut self, n: u64) -> Result<()> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Simulated seconds since the start.
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn system(&self) -> &StarSystem {
        &self.system
    }

    pub fn into_system(self) -> StarSystem {
        self.system
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
