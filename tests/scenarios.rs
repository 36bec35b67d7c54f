use kepler_sim::body::BodyType;
use kepler_sim::io::csv;
use kepler_sim::physics::{AU, DAY};
use kepler_sim::{ScenarioConfig, SimError, Simulation, StarSystem};

const SOL: &str = include_str!("../scenarios/sol.toml");

fn sol() -> ScenarioConfig {
    ScenarioConfig::from_toml_str(SOL).expect("bundled scenario parses")
}

#[test]
fn bundled_scenario_loads_in_hierarchy_order() {
    let system = StarSystem::from_scenario(&sol()).unwrap();
    assert_eq!(system.len(), 16);
    assert_eq!(system.root().unwrap().name(), "Sun");

    let first: Vec<&str> = system
        .tree()
        .children_of(&"sun".to_string())
        .unwrap()
        .map(|kb| kb.name())
        .collect();
    assert_eq!(first[0], "Jupiter", "heaviest planet first");
    assert_eq!(first.len(), 9);

    assert!(system.body("Jupiter").unwrap().is_perturbator());
    assert!(system.body("Moon").unwrap().is_perturbator());
    assert!(system.body("Charon").unwrap().is_perturbator());
    assert!(!system.body("Earth").unwrap().is_perturbator());
    assert!(!system.body("Io").unwrap().is_perturbator());

    let eris = system.body("eris").unwrap();
    assert_eq!(eris.body_type(), BodyType::DwarfPlanet);
    assert_eq!(eris.display_name(), "136199 Eris (2003 UB313)");
    let inc = eris.orbit().unwrap().elements().inc.to_degrees();
    assert!((inc - 44.04).abs() < 1e-6, "Eris inclination {inc:.4} deg");
}

#[test]
fn earth_orbit_from_bundled_state() {
    let system = StarSystem::from_scenario(&sol()).unwrap();
    let el = *system.body("Earth").unwrap().orbit().unwrap().elements();
    assert!(el.ecc < 1e-6, "e = {:e}", el.ecc);
    assert!((el.sma - AU).abs() / AU < 1e-6);
}

#[test]
fn a_simulated_month_keeps_moons_near_their_planets() {
    let mut sim = Simulation::from_scenario(&sol()).unwrap();
    sim.run(24 * 30).unwrap();
    assert_eq!(sim.elapsed(), 30 * DAY);

    let system = sim.system();
    let pairs = [
        ("Moon", "Earth", 3.844e8),
        ("Io", "Jupiter", 4.217e8),
        ("Charon", "Pluto", 1.9591e7),
    ];
    for (moon, planet, a) in pairs {
        let d = (system.body(moon).unwrap().body().position()
            - system.body(planet).unwrap().body().position())
        .norm();
        assert!((d - a).abs() / a < 0.05, "{moon}-{planet} separation {d:.3e} m");
    }

    let (bary, _) = system.barycenter("Sun").unwrap();
    let sun = system.body("Sun").unwrap().body().position();
    let (stored, _) = system.body("Sun").unwrap().barycenter();
    assert!((bary - stored).norm() < 1.0);
    assert!((bary - sun).norm() > 1.0e8, "Jupiter must displace the Sun");
}

#[test]
fn csv_dump_of_bundled_system() {
    let sim = Simulation::from_scenario(&sol()).unwrap();
    let mut buf = Vec::new();
    csv::write_header(&mut buf).unwrap();
    csv::write_states(&mut buf, sim.elapsed(), sim.system().bodies()).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 17);
    assert!(text.lines().any(|l| l.starts_with("0,Charon,satellite,")));
}

#[test]
fn unbound_body_is_rejected_with_its_name_free() {
    let text = r#"
        [engine]
        barycenter_ratio_limit = 0.5

        [[bodies]]
        name = "Sun"
        type = "star"
        mass = 1.98847e30
        radius = 6.957e8

        [[bodies]]
        name = "Oumuamua"
        type = "minor_body"
        parent = "Sun"
        mass = 4.0e9
        position = [1.495978707e11, 0.0, 0.0]
        velocity = [0.0, 60000.0, 0.0]
    "#;
    let scenario = ScenarioConfig::from_toml_str(text).unwrap();
    let err = StarSystem::from_scenario(&scenario).unwrap_err();
    assert!(matches!(err, SimError::NotBound { .. }), "{err}");
}

#[test]
fn scenario_file_round_trip_through_disk() {
    let path = std::env::temp_dir().join(format!("kepler-sim-{}.toml", std::process::id()));
    std::fs::write(&path, SOL).unwrap();
    let loaded = ScenarioConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, sol());

    let missing = ScenarioConfig::from_file(path.with_extension("nope"));
    assert!(matches!(missing, Err(SimError::Io(_))));
}
