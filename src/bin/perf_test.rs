use eph_swarm::core::config::{ControllerKind, SimulationConfig};
use eph_swarm::scenario::ScenarioKind;
use eph_swarm::simulation::Simulator;
use std::time::Instant;

fn main() {
    let counts = [10, 50, 100, 250, 500, 1000];
    let ticks = 100;

    for controller in [ControllerKind::Sampling, ControllerKind::Gradient] {
        for count in counts {
            println!("\n=== {:?}: {} agents ===", controller, count);

            let mut config = SimulationConfig::default();
            config.agent.controller = controller;

            let setup_start = Instant::now();
            let mut sim = match Simulator::from_scenario(ScenarioKind::Swarm, config, count) {
                Ok(sim) => sim,
                Err(e) => {
                    eprintln!("Setup failed: {}", e);
                    return;
                }
            };
            println!("Setup time: {:?}", setup_start.elapsed());

            let tick_start = Instant::now();
            let stats = sim.run(ticks);
            let tick_time = tick_start.elapsed();

            println!("{} ticks: {:?}", ticks, tick_time);
            println!("Avg tick: {:?}", tick_time / ticks as u32);
            println!("Ticks/sec: {:.1}", ticks as f64 / tick_time.as_secs_f64());
            println!("Collisions: {}", stats.agent_collisions);
        }
    }
}
