pub mod environment;
pub mod simulator;
pub mod snapshot;
pub mod tick;

pub use environment::Environment;
pub use simulator::{RunStats, Simulator};
pub use snapshot::{AgentSnapshot, WorldSnapshot};
pub use tick::{run_simulation_tick, SimulationEvent};
