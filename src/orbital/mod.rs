pub mod elements;
pub mod kepler;

pub use elements::KeplerianElements;
pub use kepler::{KeplerOrbit, TwoBody};
