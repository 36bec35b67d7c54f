use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Physical constants (SI)
// ---------------------------------------------------------------------------

pub const G: f64 = 6.674_30e-11; // gravitational constant, m^3/(kg s^2)
pub const AU: f64 = 1.495_978_707e11; // astronomical unit, m
pub const SOLAR_MASS: f64 = 1.988_47e30; // kg
pub const DAY: u64 = 86_400; // s

// ---------------------------------------------------------------------------
// Barycenter
// ---------------------------------------------------------------------------

/// Reduced-mass-weighted mean position and velocity.
///
/// Each item is `(mu, position, velocity)` with `mu = G * m`. Returns `None`
/// for an empty set or a non-positive total.
pub fn barycenter<'a, I>(members: I) -> Option<(Vector3<f64>, Vector3<f64>)>
where
    I: IntoIterator<Item = (f64, &'a Vector3<f64>, &'a Vector3<f64>)>,
{
    let mut total = 0.0;
    let mut pos = Vector3::zeros();
    let mut vel = Vector3::zeros();
    for (mu, p, v) in members {
        total += mu;
        pos += p * mu;
        vel += v * mu;
    }
    if total > 0.0 {
        Some((pos / total, vel / total))
    } else {
        None
    }
}

/// Gravitational energy terms of a two-body state: `(kinetic, potential)`
/// with kinetic `0.5 m2 v^2` and potential `G m1 m2 / r` (as a magnitude).
pub fn energy_terms(g: f64, m1: f64, m2: f64, r: f64, v: f64) -> (f64, f64) {
    (0.5 * m2 * v * v, g * m1 * m2 / r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barycenter_of_equal_pair_is_midpoint() {
        let p1 = Vector3::new(-1.0, 0.0, 0.0);
        let p2 = Vector3::new(3.0, 2.0, 0.0);
        let v1 = Vector3::new(0.0, 1.0, 0.0);
        let v2 = Vector3::new(0.0, -1.0, 0.0);
        let (p, v) = barycenter([(5.0, &p1, &v1), (5.0, &p2, &v2)]).unwrap();
        assert!((p - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
        assert!(v.norm() < 1e-12);
    }

    #[test]
    fn barycenter_leans_to_heavier_body() {
        let sun = Vector3::zeros();
        let jup = Vector3::new(7.78e11, 0.0, 0.0);
        let z = Vector3::zeros();
        let (p, _) = barycenter([(1.0, &sun, &z), (9.5e-4, &jup, &z)]).unwrap();
        // Sun-Jupiter barycenter sits just outside the solar surface (~7.4e8 m)
        assert!(p.x > 7.0e8 && p.x < 7.6e8, "got {:.3e}", p.x);
    }

    #[test]
    fn empty_set_has_no_barycenter() {
        assert!(barycenter(std::iter::empty::<(f64, &Vector3<f64>, &Vector3<f64>)>()).is_none());
    }

    #[test]
    fn circular_speed_is_bound() {
        let r = AU;
        let v = (G * SOLAR_MASS / r).sqrt();
        let (k, u) = energy_terms(G, SOLAR_MASS, 1.0, r, v);
        assert!((u / k - 2.0).abs() < 1e-12, "virial ratio should be 2");
    }
}
