//! Two-body orbit of a secondary around a primary.
//!
//! An orbit is determined once from a relative state vector and then moved
//! forward in whole seconds. Each step applies a single linearised correction
//! to the eccentric anomaly and checks it against the intended time since
//! periapsis; a step that misses the tolerance is split in two and retried,
//! down to one second.

use std::f64::consts::{PI, TAU};

use nalgebra::{Rotation3, Vector3};
use tracing::{debug, trace};

use super::elements::{
    eccentric_from_true, perifocal_state, true_from_eccentric, wrap_angle, KeplerianElements,
    DEGENERATE_EPS,
};
use crate::body::Body;
use crate::error::{Result, SimError};
use crate::physics::gravity::energy_terms;

/// Masses and contact distance of a primary/secondary pair.
#[derive(Debug, Clone, Copy)]
pub struct TwoBody {
    pub primary_mass: f64,   // kg
    pub secondary_mass: f64, // kg
    pub contact: f64,        // m, sum of both radii
}

impl TwoBody {
    pub fn of(primary: &Body, secondary: &Body) -> Self {
        Self {
            primary_mass: primary.mass(),
            secondary_mass: secondary.mass(),
            contact: primary.radius() + secondary.radius(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeplerOrbit {
    elements: KeplerianElements,
    ecc_anom: f64,
    mean_anom: f64,
    time_since_periapsis: f64, // s
    mu: f64,                   // G (m1 + m2)
    contact: f64,
    tolerance: f64, // s
    rotation: Rotation3<f64>,
    pos: Vector3<f64>, // relative to primary
    vel: Vector3<f64>,
}

/// Angle mapped into `[-π, π)`.
fn wrap_signed(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

enum Step {
    Done(Vector3<f64>, Vector3<f64>),
    Miss(f64),
}

impl KeplerOrbit {
    /// Orbit of `secondary` around `primary` from their current states.
    pub fn determine(primary: &Body, secondary: &Body, g: f64, tolerance: f64) -> Result<Self> {
        Self::from_relative_state(
            secondary.position() - primary.position(),
            secondary.velocity() - primary.velocity(),
            TwoBody::of(primary, secondary),
            g,
            tolerance,
        )
    }

    /// Orbit from a relative state vector. Fails on overlap and on unbound
    /// (escape) trajectories.
    pub fn from_relative_state(
        rel_pos: Vector3<f64>,
        rel_vel: Vector3<f64>,
        pair: TwoBody,
        g: f64,
        tolerance: f64,
    ) -> Result<Self> {
        let r = rel_pos.norm();
        if r <= pair.contact {
            return Err(SimError::Collision { distance: r, contact: pair.contact });
        }
        let v = rel_vel.norm();
        let (kinetic, potential) = energy_terms(g, pair.primary_mass, pair.secondary_mass, r, v);
        if kinetic >= potential {
            return Err(SimError::NotBound { kinetic, potential });
        }

        let mu = g * (pair.primary_mass + pair.secondary_mass);
        let h = rel_pos.cross(&rel_vel);
        let (elements, ecc_anom) = if h.norm() <= DEGENERATE_EPS * r * v {
            KeplerianElements::radial_from_state_mu(&rel_pos, &rel_vel, mu)
        } else {
            let el = KeplerianElements::from_state_vector_mu(&rel_pos, &rel_vel, mu);
            (el, eccentric_from_true(el.ecc, el.true_anom))
        };

        let mean_anom = ecc_anom - elements.ecc * ecc_anom.sin();
        let mut orbit = KeplerOrbit {
            elements,
            ecc_anom,
            mean_anom,
            time_since_periapsis: (elements.sma.powi(3) / mu).sqrt() * mean_anom,
            mu,
            contact: pair.contact,
            tolerance,
            rotation: elements.rotation(),
            pos: Vector3::zeros(),
            vel: Vector3::zeros(),
        };
        let (pos, vel) = orbit.cartesian();
        orbit.pos = pos;
        orbit.vel = vel;

        debug!(
            sma = elements.sma,
            ecc = elements.ecc,
            inc = elements.inc,
            period = orbit.period(),
            "orbit determined"
        );
        Ok(orbit)
    }

    pub fn elements(&self) -> &KeplerianElements {
        &self.elements
    }

    pub fn eccentric_anomaly(&self) -> f64 {
        self.ecc_anom
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.mean_anom
    }

    pub fn time_since_periapsis(&self) -> f64 {
        self.time_since_periapsis
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Position relative to the primary (m).
    pub fn position(&self) -> &Vector3<f64> {
        &self.pos
    }

    /// Velocity relative to the primary (m/s).
    pub fn velocity(&self) -> &Vector3<f64> {
        &self.vel
    }

    pub fn period(&self) -> f64 {
        TAU * (self.elements.sma.powi(3) / self.mu).sqrt()
    }

    /// Advance the orbit by `dt` seconds and return the change of relative
    /// position and velocity.
    pub fn forward(&mut self, dt: u64) -> Result<(Vector3<f64>, Vector3<f64>)> {
        if dt == 0 {
            return Ok((Vector3::zeros(), Vector3::zeros()));
        }
        match self.step(dt)? {
            Step::Done(dpos, dvel) => Ok((dpos, dvel)),
            Step::Miss(error) if dt == 1 => Err(SimError::Precision { error }),
            Step::Miss(error) => {
                let second = dt / 2;
                let first = dt - second;
                trace!(dt, first, second, error, "splitting Kepler step");
                let (p1, v1) = self.forward(first)?;
                let (p2, v2) = self.forward(second)?;
                Ok((p1 + p2, v1 + v2))
            }
        }
    }

    /// One linearised step. State is only written when the step is accepted.
    fn step(&mut self, dt: u64) -> Result<Step> {
        let ecc = self.elements.ecc;
        let dt = dt as f64;
        let time_scale = (self.elements.sma.powi(3) / self.mu).sqrt();
        let target_mean = self.mean_anom + dt / time_scale;

        // Newton step from the current anomaly towards the target mean anomaly,
        // residual taken modulo whole revolutions
        let (sin_e, cos_e) = self.ecc_anom.sin_cos();
        let implied_mean = self.ecc_anom - ecc * sin_e;
        let ecc_anom =
            self.ecc_anom + wrap_signed(target_mean - implied_mean) / (1.0 - ecc * cos_e);

        // Time since periapsis implied by the new anomaly vs the intended one
        let miss = wrap_signed(ecc_anom - ecc * ecc_anom.sin() - target_mean);
        let error = (time_scale * miss).abs();
        if !(error <= self.tolerance) {
            return Ok(Step::Miss(error));
        }

        self.ecc_anom = wrap_angle(ecc_anom);
        self.mean_anom = wrap_angle(target_mean);
        self.time_since_periapsis = time_scale * self.mean_anom;
        self.elements.true_anom = true_from_eccentric(ecc, self.ecc_anom);

        let (pos, vel) = self.cartesian();
        let distance = pos.norm();
        if distance <= self.contact {
            return Err(SimError::Collision { distance, contact: self.contact });
        }
        let delta = (pos - self.pos, vel - self.vel);
        self.pos = pos;
        self.vel = vel;
        Ok(Step::Done(delta.0, delta.1))
    }

    fn cartesian(&self) -> (Vector3<f64>, Vector3<f64>) {
        let el = &self.elements;
        let (r, v) = perifocal_state(el.sma, el.ecc, self.ecc_anom, el.true_anom, self.mu);
        (self.rotation * r, self.rotation * v)
    }

    /// `n` points of the orbit ellipse relative to the primary, first point
    /// repeated at the end. Empty for `n < 2`.
    pub fn orbit_shape(&self, n: usize) -> Vec<Vector3<f64>> {
        if n < 2 {
            return Vec::new();
        }
        let a = self.elements.sma;
        let e = self.elements.ecc;
        let b = a * (1.0 - e * e).max(0.0).sqrt();
        let mut points: Vec<Vector3<f64>> = (0..n - 1)
            .map(|k| {
                let t = TAU * k as f64 / (n - 1) as f64;
                self.rotation * Vector3::new(a * (t.cos() - e), b * t.sin(), 0.0)
            })
            .collect();
        points.push(points[0]);
        points
    }
}
