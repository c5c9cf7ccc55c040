//! Multi-agent cognitive runtime layered on top of the CPU (§4.7/§4.8).

pub mod agent;
pub mod reward;
pub mod scheduler;
pub mod stability;

pub use agent::{Agent, AgentState};
pub use reward::{RewardConfig, RewardEngine};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use stability::{StabilityConfig, StabilityMetrics, StabilityMonitor};
