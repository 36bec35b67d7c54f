pub mod body;
pub mod config;
pub mod error;
pub mod io;
pub mod orbital;
pub mod physics;
pub mod sim;
pub mod tree;

pub use body::{BodySpec, BodyType, KBody, MassSpec};
pub use config::{EngineConfig, ScenarioConfig};
pub use error::{Result, SimError};
pub use sim::{RunState, Simulation, StarSystem};
