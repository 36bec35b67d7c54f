use kepler_sim::physics::{AU, DAY};
use kepler_sim::{ScenarioConfig, Simulation};

fn main() {
    let scenario = ScenarioConfig::from_toml_str(include_str!("../scenarios/sol.toml"))
        .expect("Failed to parse bundled scenario");
    let mut sim = Simulation::from_scenario(&scenario).expect("Failed to load scenario");

    println!("Simulating {} bodies for one year ...", sim.system().len());
    sim.set_time_step(DAY).expect("Failed to set time step");
    sim.run(365).expect("Simulation failed");

    let system = sim.into_system();
    let sun = *system.root().expect("Scenario has a root").body().position();
    for kb in system.bodies() {
        let rel = kb.body().position() - sun;
        println!(
            "{:<26} r = {:>9.5} AU  v = {:>7.3} km/s",
            kb.display_name(),
            rel.norm() / AU,
            kb.body().speed() / 1000.0
        );
    }
}
