pub mod entity;
pub mod kbody;
pub mod registry;

pub use entity::{Body, BodyInit, MassSpec};
pub use kbody::{BodySpec, BodyType, KBody, KBODY_KIND};
pub use registry::{name_key, NameRegistry};
