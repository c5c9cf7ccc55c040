//! Intrinsic reward shaping and health accounting (§4.8).

use crate::cognitive::agent::{Agent, AgentState};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardConfig {
    pub max_reward: i64,
    pub min_reward: i64,
    pub decay_factor: f64,
    pub learning_rate_base: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            max_reward: 100,
            min_reward: -100,
            decay_factor: 0.95,
            learning_rate_base: 0.1,
        }
    }
}

pub struct RewardEngine {
    config: RewardConfig,
}

impl RewardEngine {
    pub fn new(config: RewardConfig) -> Self {
        RewardEngine { config }
    }

    /// Clamps `raw_signal` and folds a tenth of it into the agent's
    /// health score, terminating the agent if health bottoms out.
    /// Redundant with the scheduler's own `state == LEARNING` gate
    /// (§4.7 step 7), but the original guards here too, so this does.
    pub fn apply_reward(&self, agent: &mut Agent, raw_signal: i64) {
        if agent.state != AgentState::Learning {
            return;
        }

        let normalized = self.normalize(raw_signal);
        agent.health_score += normalized / 10;
        agent.health_score = agent.health_score.clamp(0, 100);
        if agent.health_score == 0 {
            agent.state = AgentState::Terminated;
        }
    }

    fn normalize(&self, raw: i64) -> i64 {
        raw.clamp(self.config.min_reward, self.config.max_reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_ignored_outside_learning_state() {
        let mut agent = Agent::new(1);
        agent.state = AgentState::Active;
        let engine = RewardEngine::new(RewardConfig::default());
        engine.apply_reward(&mut agent, -1000);
        assert_eq!(agent.health_score, 100);
    }

    #[test]
    fn large_negative_reward_terminates_agent() {
        let mut agent = Agent::new(1);
        agent.state = AgentState::Learning;
        agent.health_score = 5;
        let engine = RewardEngine::new(RewardConfig::default());
        engine.apply_reward(&mut agent, -1000);
        assert_eq!(agent.health_score, 0);
        assert_eq!(agent.state, AgentState::Terminated);
    }

    #[test]
    fn reward_is_clamped_before_scaling() {
        let mut agent = Agent::new(1);
        agent.state = AgentState::Learning;
        agent.health_score = 50;
        let engine = RewardEngine::new(RewardConfig::default());
        engine.apply_reward(&mut agent, 1_000_000);
        assert_eq!(agent.health_score, 60);
    }
}
