//! Scenario files.
//!
//! A scenario is a TOML document with one `[engine]` table and a list of
//! `[[bodies]]`, root first and every parent before its children:
//!
//! ```toml
//! [engine]
//! barycenter_ratio_limit = 0.5
//! time_step = 3600            # s, optional
//!
//! [[bodies]]
//! name = "Sun"
//! type = "star"
//! mass = 1.98847e30           # kg (or reduced_mass, m^3/s^2)
//! radius = 6.957e8            # m
//!
//! [[bodies]]
//! name = "Earth"
//! type = "planet"
//! parent = "Sun"
//! mass = 5.9722e24
//! radius = 6.371e6
//! position = [1.496e11, 0.0, 0.0]
//! velocity = [0.0, 29780.0, 0.0]
//! ```

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::body::{BodySpec, BodyType, MassSpec};
use crate::error::{Result, SimError};
use crate::physics::gravity::G;

fn default_g() -> f64 {
    G
}

fn default_tolerance() -> f64 {
    1e-3
}

fn default_time_step() -> u64 {
    3_600
}

/// Engine-wide settings shared by every body in a system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Parent radii a barycenter may drift before the child counts as a perturbator.
    pub barycenter_ratio_limit: f64,
    #[serde(default = "default_g")]
    pub gravitational_constant: f64, // m^3/(kg s^2)
    #[serde(default = "default_tolerance")]
    pub time_tolerance: f64, // s, allowed error of a propagated time since periapsis
    #[serde(default = "default_time_step")]
    pub time_step: u64, // s, default tick length
}

impl EngineConfig {
    pub fn new(barycenter_ratio_limit: f64) -> Self {
        Self {
            barycenter_ratio_limit,
            gravitational_constant: default_g(),
            time_tolerance: default_tolerance(),
            time_step: default_time_step(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SimError::Configuration(format!("{name} must be positive and finite, got {v}")))
            }
        };
        positive("barycenter_ratio_limit", self.barycenter_ratio_limit)?;
        positive("gravitational_constant", self.gravitational_constant)?;
        positive("time_tolerance", self.time_tolerance)?;
        if self.time_step == 0 {
            return Err(SimError::Configuration("time_step must be at least 1 s".into()));
        }
        Ok(())
    }
}

/// One `[[bodies]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub body_type: BodyType,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub mass: Option<f64>, // kg
    #[serde(default)]
    pub reduced_mass: Option<f64>, // m^3/s^2
    #[serde(default)]
    pub radius: f64, // m
    #[serde(default)]
    pub position: [f64; 3], // m
    #[serde(default)]
    pub velocity: [f64; 3], // m/s
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub provisional_name: Option<String>,
}

impl BodyConfig {
    pub fn to_spec(&self) -> Result<BodySpec> {
        let mass = match (self.mass, self.reduced_mass) {
            (Some(m), None) => MassSpec::Mass(m),
            (None, Some(mu)) => MassSpec::ReducedMass(mu),
            _ => {
                return Err(SimError::InvalidArgument(format!(
                    "{}: give exactly one of mass or reduced_mass",
                    self.name
                )))
            }
        };
        let [px, py, pz] = self.position;
        let [vx, vy, vz] = self.velocity;
        let mut spec = BodySpec::new(self.name.clone(), self.body_type, mass)
            .radius(self.radius)
            .position(Vector3::new(px, py, pz))
            .velocity(Vector3::new(vx, vy, vz));
        spec.parent = self.parent.clone();
        spec.id = self.id;
        spec.common_name = self.common_name.clone();
        spec.provisional_name = self.provisional_name.clone();
        Ok(spec)
    }
}

/// Top-level scenario document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
}

impl ScenarioConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let scenario: ScenarioConfig = toml::from_str(text)?;
        scenario.engine.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
        [engine]
        barycenter_ratio_limit = 0.5

        [[bodies]]
        name = "Sun"
        type = "star"
        mass = 1.98847e30
        radius = 6.957e8

        [[bodies]]
        name = "Ceres"
        type = "minor_body"
        parent = "Sun"
        reduced_mass = 6.26e10
        position = [4.14e11, 0.0, 0.0]
        velocity = [0.0, 17900.0, 0.0]
        id = 1
    "#;

    #[test]
    fn parses_engine_defaults_and_bodies() {
        let sc = ScenarioConfig::from_toml_str(SMALL).unwrap();
        assert_eq!(sc.engine.time_step, 3_600);
        assert!((sc.engine.gravitational_constant - G).abs() < 1e-20);
        assert_eq!(sc.bodies.len(), 2);
        assert_eq!(sc.bodies[1].body_type, BodyType::MinorBody);

        let spec = sc.bodies[1].to_spec().unwrap();
        assert_eq!(spec.parent.as_deref(), Some("Sun"));
        assert_eq!(spec.init.mass, MassSpec::ReducedMass(6.26e10));
        assert_eq!(spec.id, Some(1));
        assert_eq!(spec.init.position.x, 4.14e11);
    }

    #[test]
    fn mass_must_be_given_exactly_once() {
        let mut body = ScenarioConfig::from_toml_str(SMALL).unwrap().bodies.remove(0);
        body.reduced_mass = Some(1.0);
        assert!(matches!(body.to_spec(), Err(SimError::InvalidArgument(_))));
        body.mass = None;
        body.reduced_mass = None;
        assert!(body.to_spec().is_err());
    }

    #[test]
    fn invalid_engine_is_rejected() {
        let text = "[engine]\nbarycenter_ratio_limit = -1.0\n";
        assert!(matches!(
            ScenarioConfig::from_toml_str(text),
            Err(SimError::Configuration(_))
        ));
        let text = "[engine]\nbarycenter_ratio_limit = 0.5\ntime_step = 0\n";
        assert!(ScenarioConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn unknown_keys_and_types_are_toml_errors() {
        let text = "[engine]\nbarycenter_ratio_limit = 0.5\nwarp = 9\n";
        assert!(matches!(ScenarioConfig::from_toml_str(text), Err(SimError::Toml(_))));
        let text = r#"
            [engine]
            barycenter_ratio_limit = 0.5
            [[bodies]]
            name = "X"
            type = "comet"
        "#;
        assert!(matches!(ScenarioConfig::from_toml_str(text), Err(SimError::Toml(_))));
    }
}
