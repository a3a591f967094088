//! DRQN agent.
mod base;
mod config;
mod explorer;

pub use base::Drqn;
pub use config::DrqnConfig;
pub use explorer::{DrqnExplorer, EpsilonGreedy, Softmax};
