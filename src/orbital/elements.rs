use std::f64::consts::{PI, TAU};

use nalgebra::{Rotation3, Vector3};

/// Relative size below which an angular momentum or node vector counts as zero.
pub const DEGENERATE_EPS: f64 = 1e-10;
/// Eccentricity below which an orbit is treated as circular.
pub const CIRCULAR_EPS: f64 = 1e-10;

/// Classical Keplerian orbital elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerianElements {
    pub sma: f64,       // semi-major axis, m
    pub ecc: f64,       // eccentricity (0 = circular, 1 = rectilinear)
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // longitude of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // true anomaly, rad
}

/// Map an angle into `[0, 2π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Eccentric anomaly from true anomaly (elliptic orbits), quadrant from `sin ν`.
pub fn eccentric_from_true(ecc: f64, true_anom: f64) -> f64 {
    let (sin_nu, cos_nu) = true_anom.sin_cos();
    let cos_e = ((ecc + cos_nu) / (1.0 + ecc * cos_nu)).clamp(-1.0, 1.0);
    let e = cos_e.acos();
    if sin_nu < 0.0 {
        TAU - e
    } else {
        e
    }
}

/// True anomaly from eccentric anomaly, in `[0, 2π)`. Gives π throughout a
/// rectilinear orbit.
pub fn true_from_eccentric(ecc: f64, ecc_anom: f64) -> f64 {
    let (s, c) = (ecc_anom / 2.0).sin_cos();
    let nu = 2.0 * ((1.0 + ecc).sqrt() * s).atan2((1.0 - ecc).max(0.0).sqrt() * c);
    wrap_angle(nu)
}

/// Position and velocity in the orbital plane (x towards periapsis).
///
/// Written in terms of the eccentric anomaly so that it stays finite for the
/// rectilinear case, where the semi-latus rectum vanishes.
pub fn perifocal_state(
    sma: f64,
    ecc: f64,
    ecc_anom: f64,
    true_anom: f64,
    mu: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let r = sma * (1.0 - ecc * ecc_anom.cos());
    let v_radial = (mu * sma).sqrt() * ecc * ecc_anom.sin() / r;
    let v_tangential = (mu * sma * (1.0 - ecc * ecc)).max(0.0).sqrt() / r;
    let (s, c) = true_anom.sin_cos();
    (
        Vector3::new(r * c, r * s, 0.0),
        Vector3::new(v_radial * c - v_tangential * s, v_radial * s + v_tangential * c, 0.0),
    )
}

impl KeplerianElements {
    /// Orbital plane → primary frame: node about the pole, inclination about
    /// the node line, periapsis argument about the orbit normal.
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), self.raan)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.inc)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.argp)
    }

    /// Convert elliptic elements to a relative state vector (position, velocity).
    pub fn to_state_vector_mu(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let ecc_anom = eccentric_from_true(self.ecc, self.true_anom);
        let (r, v) = perifocal_state(self.sma, self.ecc, ecc_anom, self.true_anom, mu);
        let rot = self.rotation();
        (rot * r, rot * v)
    }

    /// Convert a bound relative state with non-zero angular momentum to elements.
    pub fn from_state_vector_mu(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> Self {
        let r = pos.norm();
        let v = vel.norm();

        // Angular momentum
        let h = pos.cross(vel);
        let h_mag = h.norm();
        let h_hat = h / h_mag;

        // Inclination, already in [0, π] for retrograde orbits
        let inc = (h.z / h_mag).clamp(-1.0, 1.0).acos();

        // Ascending node, x axis by convention for equatorial orbits
        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();
        let (raan, node) = if n_mag > DEGENERATE_EPS * h_mag {
            let raan = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            (if n.y < 0.0 { TAU - raan } else { raan }, n / n_mag)
        } else {
            (0.0, Vector3::x())
        };

        // Eccentricity vector
        let e_vec = ((v * v - mu / r) * pos - pos.dot(vel) * vel) / mu;
        let ecc = e_vec.norm();

        let sma = h_mag * h_mag / mu / (1.0 - ecc * ecc);

        // Argument of latitude: angle node → position about the orbit normal
        let r_hat = pos / r;
        let arg_lat = wrap_angle(node.cross(&r_hat).dot(&h_hat).atan2(node.dot(&r_hat)));

        let (argp, true_anom) = if ecc > CIRCULAR_EPS {
            let p = h_mag * h_mag / mu;
            let nu = ((p / r - 1.0) / ecc).clamp(-1.0, 1.0).acos();
            let nu = if pos.dot(vel) < 0.0 { TAU - nu } else { nu };
            (wrap_angle(arg_lat - nu), nu)
        } else {
            (0.0, arg_lat)
        };

        KeplerianElements {
            sma,
            ecc,
            inc,
            raan,
            argp,
            true_anom,
        }
    }

    /// Elements of a rectilinear (zero angular momentum) orbit, plus its
    /// eccentric anomaly, which the fixed true anomaly cannot recover.
    ///
    /// ω = 3π/2 and ν = π, with i and Ω chosen so the rotated perifocal
    /// direction at ν lands on `pos`.
    pub fn radial_from_state_mu(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> (Self, f64) {
        let r = pos.norm();
        let r_hat = pos / r;

        let inc = r_hat.z.clamp(-1.0, 1.0).asin();
        let raan = if inc.cos() > DEGENERATE_EPS {
            wrap_angle((-r_hat.x).atan2(r_hat.y))
        } else {
            0.0
        };

        // Vis-viva
        let sma = 1.0 / (2.0 / r - vel.norm_squared() / mu);

        let ecc_anom = (1.0 - r / sma).clamp(-1.0, 1.0).acos();
        let ecc_anom = if pos.dot(vel) < 0.0 { TAU - ecc_anom } else { ecc_anom };

        let elements = KeplerianElements {
            sma,
            ecc: 1.0,
            inc,
            raan,
            argp: 1.5 * PI,
            true_anom: PI,
        };
        (elements, ecc_anom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::gravity::{AU, G, SOLAR_MASS};

    fn mu_sun() -> f64 {
        G * SOLAR_MASS
    }

    /// Circular orbit of the given radius and inclination, starting on the node.
    fn circular(radius: f64, inc: f64) -> KeplerianElements {
        KeplerianElements {
            sma: radius,
            ecc: 0.0,
            inc,
            raan: 0.0,
            argp: 0.0,
            true_anom: 0.0,
        }
    }

    fn assert_state_close(a: &(Vector3<f64>, Vector3<f64>), b: &(Vector3<f64>, Vector3<f64>)) {
        let dp = (a.0 - b.0).norm() / b.0.norm();
        let dv = (a.1 - b.1).norm() / b.1.norm().max(1e-9);
        assert!(dp < 1e-9, "position mismatch {dp:e}");
        assert!(dv < 1e-9, "velocity mismatch {dv:e}");
    }

    #[test]
    fn circular_roundtrip() {
        let orbit = circular(AU, 23.4_f64.to_radians());
        let mu = mu_sun();
        let (pos, vel) = orbit.to_state_vector_mu(mu);

        let recovered = KeplerianElements::from_state_vector_mu(&pos, &vel, mu);
        assert!((recovered.sma - orbit.sma).abs() / AU < 1e-9, "SMA mismatch");
        assert!(recovered.ecc < 1e-9, "Should be nearly circular");
        assert!((recovered.inc - orbit.inc).abs() < 1e-9, "Inclination mismatch");
    }

    #[test]
    fn circular_orbit_speed() {
        let mu = mu_sun();
        let (_, vel) = circular(AU, 0.0).to_state_vector_mu(mu);
        let expected = (mu / AU).sqrt();
        assert!((vel.norm() - expected).abs() < 1e-6, "Circular orbit speed mismatch");
    }

    #[test]
    fn earth_year() {
        let period = TAU * (circular(AU, 0.0).sma.powi(3) / mu_sun()).sqrt();
        let days = period / 86_400.0;
        assert!(days > 365.0 && days < 365.5, "Earth year should be ~365.25 d, got {days:.2}");
    }

    #[test]
    fn eccentric_inclined_roundtrip() {
        let mu = mu_sun();
        let el = KeplerianElements {
            sma: 2.5 * AU,
            ecc: 0.3,
            inc: 0.4,
            raan: 1.2,
            argp: 2.0,
            true_anom: 4.0,
        };
        let state = el.to_state_vector_mu(mu);
        let back = KeplerianElements::from_state_vector_mu(&state.0, &state.1, mu);
        assert!((back.ecc - el.ecc).abs() < 1e-9);
        assert!((back.raan - el.raan).abs() < 1e-9);
        assert!((back.argp - el.argp).abs() < 1e-9);
        assert!((back.true_anom - el.true_anom).abs() < 1e-9);
        assert_state_close(&back.to_state_vector_mu(mu), &state);
    }

    #[test]
    fn retrograde_inclination_exceeds_right_angle() {
        let mu = mu_sun();
        let pos = Vector3::new(AU, 0.0, 0.0);
        let vel = Vector3::new(0.0, -(mu / AU).sqrt(), 0.0);
        let el = KeplerianElements::from_state_vector_mu(&pos, &vel, mu);
        assert!((el.inc - PI).abs() < 1e-9, "inc {}", el.inc);
        assert_state_close(&el.to_state_vector_mu(mu), &(pos, vel));
    }

    #[test]
    fn radial_orbit_places_body_on_its_line() {
        let mu = mu_sun();
        let pos = Vector3::new(0.3 * AU, -0.4 * AU, 0.2 * AU);
        let vel = pos.normalize() * 5_000.0;
        let (el, ecc_anom) = KeplerianElements::radial_from_state_mu(&pos, &vel, mu);
        assert_eq!(el.ecc, 1.0);
        let (r, v) = perifocal_state(el.sma, el.ecc, ecc_anom, el.true_anom, mu);
        let rot = el.rotation();
        assert_state_close(&(rot * r, rot * v), &(pos, vel));
    }

    #[test]
    fn anomaly_conversions_invert() {
        for ecc in [0.0, 0.1, 0.7] {
            for nu in [0.1, 1.5, 3.0, 4.5, 6.0] {
                let e = eccentric_from_true(ecc, nu);
                assert!((true_from_eccentric(ecc, e) - nu).abs() < 1e-9, "ecc {ecc} nu {nu}");
            }
        }
        assert!((true_from_eccentric(1.0, 2.0) - PI).abs() < 1e-12);
    }
}
