use nalgebra::Vector3;

use super::registry::NameRegistry;
use crate::error::{Result, SimError};

/// Mass input: either the mass itself or the reduced mass `mu = G * m`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MassSpec {
    Mass(f64),        // kg
    ReducedMass(f64), // m^3/s^2
}

impl MassSpec {
    /// Returns `(mass, reduced_mass)` for gravitational constant `g`.
    pub fn resolve(self, g: f64) -> Result<(f64, f64)> {
        let (mass, mu) = match self {
            MassSpec::Mass(m) => (m, g * m),
            MassSpec::ReducedMass(mu) => (mu / g, mu),
        };
        if !(mass.is_finite() && mass > 0.0 && mu.is_finite() && mu > 0.0) {
            return Err(SimError::InvalidArgument(format!(
                "mass must be positive and finite, got {mass:e} kg"
            )));
        }
        Ok((mass, mu))
    }
}

/// Construction parameters of a [`Body`].
#[derive(Debug, Clone)]
pub struct BodyInit {
    pub name: String,
    pub mass: MassSpec,
    pub radius: f64,            // m
    pub position: Vector3<f64>, // m, common inertial frame
    pub velocity: Vector3<f64>, // m/s
}

/// A celestial object: fixed identity (name, mass, radius) and a state that
/// only the orbit solver and scheduler may change.
#[derive(Debug, Clone)]
pub struct Body {
    name: String,
    mass: f64,
    reduced_mass: f64,
    radius: f64,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
}

impl Body {
    /// Validate `init` and claim its name in `registry` under `kind`.
    pub fn new(registry: &mut NameRegistry, kind: &str, g: f64, init: &BodyInit) -> Result<Self> {
        if init.name.trim().is_empty() {
            return Err(SimError::InvalidArgument("body name must not be empty".into()));
        }
        let (mass, reduced_mass) = init.mass.resolve(g)?;
        if !(init.radius.is_finite() && init.radius >= 0.0) {
            return Err(SimError::InvalidArgument(format!(
                "radius of {} must be >= 0, got {}",
                init.name, init.radius
            )));
        }
        if !(all_finite(&init.position) && all_finite(&init.velocity)) {
            return Err(SimError::InvalidArgument(format!(
                "state of {} must be finite",
                init.name
            )));
        }
        registry.register(kind, &init.name)?;

        Ok(Self {
            name: init.name.clone(),
            mass,
            reduced_mass,
            radius: init.radius,
            position: init.position,
            velocity: init.velocity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn reduced_mass(&self) -> f64 {
        self.reduced_mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    pub fn velocity(&self) -> &Vector3<f64> {
        &self.velocity
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    pub(crate) fn set_state(&mut self, position: Vector3<f64>, velocity: Vector3<f64>) {
        self.position = position;
        self.velocity = velocity;
    }

    pub(crate) fn translate(&mut self, dpos: &Vector3<f64>, dvel: &Vector3<f64>) {
        self.position += dpos;
        self.velocity += dvel;
    }
}

fn all_finite(v: &Vector3<f64>) -> bool {
    v.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::G;

    fn init(name: &str, mass: MassSpec, radius: f64) -> BodyInit {
        BodyInit {
            name: name.into(),
            mass,
            radius,
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::zeros(),
        }
    }

    #[test]
    fn reduced_mass_derives_mass() {
        let mut reg = NameRegistry::new();
        let mu_earth = 3.986_004_418e14;
        let earth = init("Earth", MassSpec::ReducedMass(mu_earth), 6.371e6);
        let b = Body::new(&mut reg, "kbody", G, &earth).unwrap();
        assert!((b.mass() - 5.972e24).abs() / 5.972e24 < 1e-3, "mass {:e}", b.mass());
        assert_eq!(b.reduced_mass(), mu_earth);
    }

    #[test]
    fn mass_derives_reduced_mass() {
        let mut reg = NameRegistry::new();
        let b = Body::new(&mut reg, "kbody", G, &init("Rock", MassSpec::Mass(1.0e3), 1.0)).unwrap();
        assert!((b.reduced_mass() - G * 1.0e3).abs() < 1e-20);
        assert_eq!(b.position(), &Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rejects_non_positive_mass() {
        let mut reg = NameRegistry::new();
        for mass in [MassSpec::Mass(0.0), MassSpec::Mass(-5.0), MassSpec::ReducedMass(f64::NAN)] {
            let err = Body::new(&mut reg, "kbody", G, &init("Bad", mass, 1.0)).unwrap_err();
            assert!(matches!(err, SimError::InvalidArgument(_)), "{err}");
        }
        assert_eq!(reg.count("kbody"), 0, "Failed construction must not claim the name");
    }

    #[test]
    fn rejects_negative_radius() {
        let mut reg = NameRegistry::new();
        let bad = init("Bad", MassSpec::Mass(1.0), -1.0);
        let err = Body::new(&mut reg, "kbody", G, &bad).unwrap_err();
        assert!(matches!(err, SimError::InvalidArgument(_)));
    }

    #[test]
    fn duplicate_name_fails() {
        let mut reg = NameRegistry::new();
        Body::new(&mut reg, "kbody", G, &init("Io", MassSpec::Mass(1.0), 1.0)).unwrap();
        let again = init("Io", MassSpec::Mass(2.0), 1.0);
        let err = Body::new(&mut reg, "kbody", G, &again).unwrap_err();
        assert!(matches!(err, SimError::DuplicateName { .. }));
    }
}
