pub mod agent;
pub mod obstacle;

pub use agent::{Agent, AgentConfig};
pub use obstacle::{Contact, Obstacle};
