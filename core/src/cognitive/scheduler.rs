//! Round-robin cooperative multiplexing of agents onto a single CPU
//! (§4.7).

use crate::cognitive::agent::{Agent, AgentState};
use crate::cognitive::reward::{RewardConfig, RewardEngine};
use crate::cognitive::stability::{StabilityConfig, StabilityMonitor};
use crate::cpu::Cpu;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    pub cpu_cycles_per_tick: u64,
    pub max_agent_cycles: u64,
    /// If true, a trap during an agent's quantum moves it straight to
    /// TERMINATED instead of leaving state untouched (§9 open question:
    /// the source halts the CPU but never changes agent state).
    pub terminate_on_trap: bool,
    pub stability: StabilityConfig,
    pub reward: RewardConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            cpu_cycles_per_tick: 1000,
            max_agent_cycles: 100,
            terminate_on_trap: false,
            stability: StabilityConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

pub struct Scheduler<'c, 'm> {
    cpu: &'c mut Cpu<'m>,
    agents: Vec<Agent>,
    cognitive_tick_count: u64,
    stability: StabilityMonitor,
    reward: RewardEngine,
    config: SchedulerConfig,
}

impl<'c, 'm> Scheduler<'c, 'm> {
    pub fn new(cpu: &'c mut Cpu<'m>, config: SchedulerConfig) -> Self {
        Scheduler {
            cpu,
            agents: Vec::new(),
            cognitive_tick_count: 0,
            stability: StabilityMonitor::new(config.stability),
            reward: RewardEngine::new(config.reward),
            config,
        }
    }

    pub fn register_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    /// Order-preserving removal, matching the original's
    /// `std::remove_if`/`erase` idiom (`scheduler.cpp`).
    pub fn terminate_agent(&mut self, agent_id: u32) {
        self.agents.retain(|a| a.id != agent_id);
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn cognitive_tick_count(&self) -> u64 {
        self.cognitive_tick_count
    }

    /// Runs one cognitive tick: every ACTIVE or LEARNING agent, in
    /// registration order, gets one quantum. Returns the coarse
    /// simulated-time cost of the tick.
    pub fn tick(&mut self) -> u64 {
        for idx in 0..self.agents.len() {
            if matches!(self.agents[idx].state, AgentState::Active | AgentState::Learning) {
                self.execute(idx);
            }
        }
        self.cognitive_tick_count += 1;
        self.config.cpu_cycles_per_tick
    }

    fn execute(&mut self, idx: usize) {
        let system_pc = self.cpu.pc;
        let system_status = self.cpu.status;
        let system_regs = self.cpu.regs;

        self.cpu.pc = self.agents[idx].pc;
        self.cpu.status = self.agents[idx].status;
        self.cpu.regs = self.agents[idx].regs;
        self.cpu.halted = false;
        self.cpu.memory().set_context(self.agents[idx].id);

        let outcome = self.cpu.step(self.config.max_agent_cycles);

        self.agents[idx].pc = self.cpu.pc;
        self.agents[idx].status = self.cpu.status;
        self.agents[idx].regs = self.cpu.regs;
        self.agents[idx].last_tick = self.cognitive_tick_count;
        if self.config.terminate_on_trap && outcome.trap.is_some() {
            self.agents[idx].state = AgentState::Terminated;
        }

        self.cpu.memory().set_context(0);
        self.cpu.pc = system_pc;
        self.cpu.status = system_status;
        self.cpu.regs = system_regs;

        self.stability.capture_state(&self.agents[idx], self.cpu.memory());
        let metrics = self.stability.analyze(self.agents[idx].id);
        self.agents[idx].stability_index = (metrics.flux * 100.0) as i64;

        if self.agents[idx].state == AgentState::Learning {
            let raw_reward = if metrics.converged { 10 } else { -5 };
            self.reward.apply_reward(&mut self.agents[idx], raw_reward);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    #[test]
    fn idle_agents_are_skipped_and_registration_order_preserved() {
        let mut mem = Memory::new();
        let mut cpu = Cpu::new(&mut mem);
        let mut scheduler = Scheduler::new(&mut cpu, SchedulerConfig::default());

        let mut a = Agent::new(1);
        a.state = AgentState::Idle;
        let mut b = Agent::new(2);
        b.state = AgentState::Active;
        scheduler.register_agent(a);
        scheduler.register_agent(b);

        scheduler.tick();
        assert_eq!(scheduler.agents()[0].last_tick, 0);
        assert_eq!(scheduler.agents()[1].last_tick, 0);
        assert_eq!(scheduler.cognitive_tick_count(), 1);
    }

    #[test]
    fn terminate_agent_removes_it_without_disturbing_order() {
        let mut mem = Memory::new();
        let mut cpu = Cpu::new(&mut mem);
        let mut scheduler = Scheduler::new(&mut cpu, SchedulerConfig::default());
        scheduler.register_agent(Agent::new(1));
        scheduler.register_agent(Agent::new(2));
        scheduler.register_agent(Agent::new(3));

        scheduler.terminate_agent(2);
        let ids: Vec<u32> = scheduler.agents().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn system_context_is_restored_after_agent_quantum() {
        let mut mem = Memory::new();
        let mut cpu = Cpu::new(&mut mem);
        cpu.memory().set_context(0);
        let mut scheduler = Scheduler::new(&mut cpu, SchedulerConfig::default());
        let mut agent = Agent::new(5);
        agent.state = AgentState::Active;
        scheduler.register_agent(agent);

        scheduler.tick();
        assert_eq!(scheduler.cpu.memory().context(), 0);
    }
}
