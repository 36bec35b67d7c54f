pub mod gravity;

pub use gravity::{barycenter, G, AU, DAY, SOLAR_MASS};
