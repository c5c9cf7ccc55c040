//! Per-agent belief-page flux tracking (§4.8).

use std::collections::{HashMap, VecDeque};

use crate::cognitive::agent::Agent;
use crate::memory::{Memory, PAGE_SIZE};

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct StabilityConfig {
    pub window_size: usize,
    pub flux_threshold: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        StabilityConfig {
            window_size: 10,
            flux_threshold: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StabilityMetrics {
    pub flux: f64,
    pub converged: bool,
}

/// Tracks, per agent, a sliding window of normalized belief-page flux
/// and the previous snapshot needed to compute the next delta.
pub struct StabilityMonitor {
    config: StabilityConfig,
    flux_history: HashMap<u32, VecDeque<f64>>,
    last_belief_state: HashMap<u32, Vec<i64>>,
}

impl StabilityMonitor {
    pub fn new(config: StabilityConfig) -> Self {
        StabilityMonitor {
            config,
            flux_history: HashMap::new(),
            last_belief_state: HashMap::new(),
        }
    }

    /// Reads the agent's belief page and, if a prior snapshot exists,
    /// folds the normalized flux into the agent's sliding window.
    /// Mirrors `StabilityMonitor::CaptureState`'s choice to snapshot
    /// only `belief_page_start`, ignoring `belief_page_count`.
    pub fn capture_state(&mut self, agent: &Agent, mem: &mut Memory) {
        let page_id = agent.belief_page_start as i64;
        if !mem.is_page_allocated(page_id) {
            return;
        }

        let base = page_id * PAGE_SIZE;
        let mut current = Vec::with_capacity(PAGE_SIZE as usize);
        for i in 0..PAGE_SIZE {
            current.push(mem.read(base + i).to_int());
        }

        if let Some(previous) = self.last_belief_state.get(&agent.id) {
            let raw_flux: i64 = current
                .iter()
                .zip(previous.iter())
                .map(|(a, b)| (a - b).abs())
                .sum();
            let normalized = raw_flux as f64 / (PAGE_SIZE as f64 * 2.0);

            let history = self.flux_history.entry(agent.id).or_default();
            history.push_back(normalized);
            if history.len() > self.config.window_size {
                history.pop_front();
            }
        }

        self.last_belief_state.insert(agent.id, current);
    }

    pub fn analyze(&self, agent_id: u32) -> StabilityMetrics {
        let mut metrics = StabilityMetrics::default();
        if let Some(history) = self.flux_history.get(&agent_id) {
            if !history.is_empty() {
                metrics.flux = history.iter().sum::<f64>() / history.len() as f64;
            }
            metrics.converged = metrics.flux < self.config.flux_threshold;
        }
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::PERM_DEFAULT;
    use crate::trit::TritWord;

    #[test]
    fn stable_page_converges_after_window_fills() {
        let mut mem = Memory::new();
        mem.allocate_page(5, 9, PERM_DEFAULT);
        let mut agent = Agent::new(9);
        agent.belief_page_start = 5;

        let mut monitor = StabilityMonitor::new(StabilityConfig::default());
        for _ in 0..3 {
            monitor.capture_state(&agent, &mut mem);
        }
        let metrics = monitor.analyze(agent.id);
        assert!(metrics.converged);
    }

    #[test]
    fn churning_page_reports_nonzero_flux() {
        let mut mem = Memory::new();
        mem.set_context(9);
        mem.write(7 * PAGE_SIZE, TritWord::from_int(1));
        mem.set_context(0);
        let mut agent = Agent::new(9);
        agent.belief_page_start = 7;

        let mut monitor = StabilityMonitor::new(StabilityConfig::default());
        monitor.capture_state(&agent, &mut mem);
        mem.set_context(9);
        mem.write(7 * PAGE_SIZE, TritWord::from_int(200));
        mem.set_context(0);
        monitor.capture_state(&agent, &mut mem);

        let metrics = monitor.analyze(agent.id);
        assert!(metrics.flux > 0.0);
    }
}
