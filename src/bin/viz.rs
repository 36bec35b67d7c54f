use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use kepler_sim::physics::{AU, DAY};
use kepler_sim::{ScenarioConfig, Simulation};

const BUNDLED_SCENARIO: &str = include_str!("../../scenarios/sol.toml");
const PATH_SAMPLES: usize = 180;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let loaded = ScenarioConfig::from_toml_str(BUNDLED_SCENARIO)
        .and_then(|sc| Simulation::from_scenario(&sc));
    let sim = match loaded {
        Ok(sim) => sim,
        Err(e) => {
            tracing::error!(error = %e, "cannot load bundled scenario");
            std::process::exit(1);
        }
    };

    let app = SimViz { sim, ticks_per_frame: 6, error: None };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Kepler System Viewer", options, Box::new(|_| Ok(Box::new(app))))
}

struct SimViz {
    sim: Simulation,
    ticks_per_frame: u64,
    error: Option<String>,
}

impl SimViz {
    fn advance(&mut self) {
        for _ in 0..self.ticks_per_frame {
            match self.sim.tick() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    self.sim.pause();
                    self.error = Some(e.to_string());
                    break;
                }
            }
        }
    }
}

impl eframe::App for SimViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance();
        if self.sim.is_running() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label = if self.sim.is_running() { "Pause" } else { "Run" };
                if ui.button(label).clicked() {
                    self.sim.toggle();
                }
                if ui.button("Step").clicked() {
                    if let Err(e) = self.sim.step() {
                        self.error = Some(e.to_string());
                    }
                }
                ui.add(egui::Slider::new(&mut self.ticks_per_frame, 1..=96).text("ticks / frame"));
                ui.label(format!(
                    "t = {:.1} d  |  dt = {} s  |  bodies: {}",
                    self.sim.elapsed() as f64 / DAY as f64,
                    self.sim.time_step(),
                    self.sim.system().len(),
                ));
            });
            if let Some(err) = &self.error {
                ui.colored_label(egui::Color32::RED, err);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let system = self.sim.system();
            Plot::new("orbits")
                .data_aspect(1.0)
                .x_axis_label("x (AU)")
                .y_axis_label("y (AU)")
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    for kb in system.bodies() {
                        if let Ok(path) = system.orbit_path(kb.name(), PATH_SAMPLES) {
                            if !path.is_empty() {
                                let points: PlotPoints =
                                    path.iter().map(|p| [p.x / AU, p.y / AU]).collect();
                                plot_ui.line(Line::new(kb.display_name(), points).width(1.0));
                            }
                        }
                        let p = kb.body().position();
                        plot_ui.points(
                            Points::new(kb.display_name(), vec![[p.x / AU, p.y / AU]]).radius(3.0),
                        );
                    }
                });
        });
    }
}
