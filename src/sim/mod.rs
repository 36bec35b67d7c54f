pub mod runner;
pub mod system;

pub use runner::{RunState, Simulation};
pub use system::StarSystem;
