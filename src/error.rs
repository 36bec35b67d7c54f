//! Error types for the simulation core

use thiserror::Error;

use crate::body::BodyType;
use crate::tree::TreeError;

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by body construction, orbit solving and the scheduler.
///
/// None of these are recovered inside the core; they abort the current
/// operation (or tick) and surface to the caller.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Duplicate name: {name} is already registered for kind {kind}")]
    DuplicateName { kind: String, name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid hierarchy: a {child} cannot orbit a {parent}")]
    InvalidHierarchy { parent: BodyType, child: BodyType },

    #[error("Unknown body: {0}")]
    UnknownBody(String),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Collision: separation {distance:.3e} m is within contact distance {contact:.3e} m")]
    Collision { distance: f64, contact: f64 },

    #[error("Not bound: kinetic energy {kinetic:.3e} J >= potential energy {potential:.3e} J")]
    NotBound { kinetic: f64, potential: f64 },

    #[error("Precision error: Kepler step misses tolerance by {error:.3e} s at the minimal step")]
    Precision { error: f64 },

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("System is frozen: barycenters are already set")]
    Frozen,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
