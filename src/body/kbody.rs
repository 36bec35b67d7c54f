use std::cmp::Reverse;
use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::entity::{Body, BodyInit, MassSpec};
use super::registry::name_key;
use crate::config::EngineConfig;
use crate::error::{Result, SimError};
use crate::orbital::KeplerOrbit;
use crate::tree::TreeValue;

/// Registry kind under which hierarchy bodies claim their names.
pub const KBODY_KIND: &str = "kbody";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Star,
    Planet,
    DwarfPlanet,
    MinorBody,
    Satellite,
}

impl BodyType {
    /// Whether a body of this type may orbit a `parent` of the given type.
    pub fn can_orbit(self, parent: BodyType) -> bool {
        match parent {
            BodyType::Star => self != BodyType::Satellite,
            BodyType::Planet | BodyType::DwarfPlanet | BodyType::MinorBody => {
                self == BodyType::Satellite
            }
            BodyType::Satellite => false,
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BodyType::Star => "star",
            BodyType::Planet => "planet",
            BodyType::DwarfPlanet => "dwarf planet",
            BodyType::MinorBody => "minor body",
            BodyType::Satellite => "satellite",
        };
        f.write_str(label)
    }
}

pub fn check_hierarchy(parent: BodyType, child: BodyType) -> Result<()> {
    if child.can_orbit(parent) {
        Ok(())
    } else {
        Err(SimError::InvalidHierarchy { parent, child })
    }
}

/// A child displaces its parent measurably when the pair's barycenter
/// offset from the parent's centre exceeds `limit` parent radii.
pub fn is_perturbator(parent: &Body, child: &Body, limit: f64) -> bool {
    let offset = (child.reduced_mass() / parent.reduced_mass())
        * (child.position() - parent.position()).norm();
    offset > limit * parent.radius()
}

// ---------------------------------------------------------------------------
// Loader record
// ---------------------------------------------------------------------------

/// Everything a loader supplies for one body.
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub init: BodyInit,
    pub body_type: BodyType,
    pub parent: Option<String>,
    pub id: Option<u32>,
    pub common_name: Option<String>,
    pub provisional_name: Option<String>,
}

impl BodySpec {
    pub fn new(name: impl Into<String>, body_type: BodyType, mass: MassSpec) -> Self {
        Self {
            init: BodyInit {
                name: name.into(),
                mass,
                radius: 0.0,
                position: Vector3::zeros(),
                velocity: Vector3::zeros(),
            },
            body_type,
            parent: None,
            id: None,
            common_name: None,
            provisional_name: None,
        }
    }

    pub fn radius(mut self, v: f64) -> Self { self.init.radius = v; self }
    pub fn position(mut self, v: Vector3<f64>) -> Self { self.init.position = v; self }
    pub fn velocity(mut self, v: Vector3<f64>) -> Self { self.init.velocity = v; self }
    pub fn parent(mut self, v: impl Into<String>) -> Self { self.parent = Some(v.into()); self }
    pub fn id(mut self, v: u32) -> Self { self.id = Some(v); self }

    pub fn common_name(mut self, v: impl Into<String>) -> Self {
        self.common_name = Some(v.into());
        self
    }

    pub fn provisional_name(mut self, v: impl Into<String>) -> Self {
        self.provisional_name = Some(v.into());
        self
    }
}

// ---------------------------------------------------------------------------
// KBody: a body placed in the hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct KBody {
    body: Body,
    body_type: BodyType,
    id: Option<u32>,
    common_name: Option<String>,
    provisional_name: Option<String>,
    parent: Option<String>,
    orbit: Option<KeplerOrbit>, // None for the root
    barycenter_pos: Vector3<f64>,
    barycenter_vel: Vector3<f64>,
    perturbator: bool,
}

impl KBody {
    /// Place `body` under `parent` (or as the root when `None`): checks the
    /// type pairing, classifies it and determines its orbit.
    pub(crate) fn new(
        body: Body,
        spec: &BodySpec,
        parent: Option<&KBody>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let (orbit, perturbator, parent_key) = match parent {
            None => {
                if spec.body_type != BodyType::Star {
                    return Err(SimError::InvalidArgument(format!(
                        "root body {} must be a star, not a {}",
                        body.name(),
                        spec.body_type
                    )));
                }
                (None, false, None)
            }
            Some(p) => {
                check_hierarchy(p.body_type, spec.body_type)?;
                let orbit = KeplerOrbit::determine(
                    &p.body,
                    &body,
                    config.gravitational_constant,
                    config.time_tolerance,
                )?;
                let perturbator = is_perturbator(&p.body, &body, config.barycenter_ratio_limit);
                (Some(orbit), perturbator, Some(p.key()))
            }
        };

        Ok(Self {
            barycenter_pos: *body.position(),
            barycenter_vel: *body.velocity(),
            body,
            body_type: spec.body_type,
            id: spec.id,
            common_name: spec.common_name.clone(),
            provisional_name: spec.provisional_name.clone(),
            parent: parent_key,
            orbit,
            perturbator,
        })
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn name(&self) -> &str {
        self.body.name()
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub fn provisional_name(&self) -> Option<&str> {
        self.provisional_name.as_deref()
    }

    /// Lookup key of the parent, `None` for the root.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn orbit(&self) -> Option<&KeplerOrbit> {
        self.orbit.as_ref()
    }

    pub fn is_perturbator(&self) -> bool {
        self.perturbator
    }

    pub fn barycenter(&self) -> (&Vector3<f64>, &Vector3<f64>) {
        (&self.barycenter_pos, &self.barycenter_vel)
    }

    /// Name for list displays: numbered minor bodies get their catalogue
    /// number in front, provisional designations go in parentheses.
    pub fn display_name(&self) -> String {
        let base = self.common_name.as_deref().unwrap_or(self.body.name());
        let mut label = match (self.body_type, self.id) {
            (BodyType::MinorBody | BodyType::DwarfPlanet, Some(id)) => format!("{id} {base}"),
            _ => base.to_string(),
        };
        if let Some(prov) = &self.provisional_name {
            label.push_str(&format!(" ({prov})"));
        }
        label
    }

    pub(crate) fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub(crate) fn orbit_mut(&mut self) -> Option<&mut KeplerOrbit> {
        self.orbit.as_mut()
    }

    pub(crate) fn set_orbit(&mut self, orbit: KeplerOrbit) {
        self.orbit = Some(orbit);
    }

    pub(crate) fn set_barycenter(&mut self, pos: Vector3<f64>, vel: Vector3<f64>) {
        self.barycenter_pos = pos;
        self.barycenter_vel = vel;
    }
}

impl TreeValue for KBody {
    type Key = String;
    type SortKey = Reverse<f64>;

    fn key(&self) -> String {
        name_key(self.body.name())
    }

    /// Heaviest first.
    fn sort_key(&self) -> Reverse<f64> {
        Reverse(self.body.mass())
    }
}
