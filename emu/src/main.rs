//! Entry point for the Helix9 emulator (helix-emu).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use helix9_core::cognitive::{Agent, AgentState, Scheduler, SchedulerConfig};
use helix9_core::cpu::Cpu;
use helix9_core::memory::Memory;
use helix9_core::trit::TritWord;

/// Runs a linked Helix9 executable.
#[derive(Parser)]
#[command(name = "helix-emu")]
struct Args {
    /// Executable file (.hx).
    exec: PathBuf,

    /// Maximum cycles to execute. Defaults to a generous bound.
    max_cycles: Option<u64>,

    /// Print a trace line for every executed instruction.
    #[arg(short = 't', long = "trace")]
    trace: bool,

    /// Run under the cognitive scheduler, reading agent definitions
    /// from a companion `.agents` roster file instead of executing the
    /// image as a single bare program.
    #[arg(long = "agents")]
    agents: Option<PathBuf>,

    /// Number of cognitive ticks to run when --agents is given.
    #[arg(long = "ticks", default_value_t = 30)]
    ticks: u64,
}

const DEFAULT_MAX_CYCLES: u64 = 100_000;

fn parse_agent_state(text: &str) -> AgentState {
    match text.to_ascii_uppercase().as_str() {
        "INIT" => AgentState::Init,
        "LEARNING" => AgentState::Learning,
        "CONVERGED" => AgentState::Converged,
        "IDLE" => AgentState::Idle,
        "TERMINATED" => AgentState::Terminated,
        _ => AgentState::Active,
    }
}

/// Parses the `.agents` roster format (§6 AMBIENT CLI behavior): one
/// line per agent, `id priority belief_page_start belief_page_count
/// input_page_start output_page_start entry_pc state`.
fn load_roster(path: &PathBuf) -> Result<Vec<Agent>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let mut agents = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 8 {
            return Err(format!(
                "{}:{}: expected 8 fields, found {}",
                path.display(),
                line_no + 1,
                fields.len()
            ));
        }
        let parse_field = |idx: usize| -> Result<i64, String> {
            fields[idx]
                .parse()
                .map_err(|_| format!("{}:{}: invalid integer '{}'", path.display(), line_no + 1, fields[idx]))
        };

        let mut agent = Agent::new(parse_field(0)? as u32);
        agent.priority = parse_field(1)? as u8;
        agent.belief_page_start = parse_field(2)? as u16;
        agent.belief_page_count = parse_field(3)? as u16;
        agent.input_page_start = parse_field(4)? as u16;
        agent.output_page_start = parse_field(5)? as u16;
        agent.pc = TritWord::from_int(parse_field(6)?);
        agent.state = parse_agent_state(fields[7]);
        agents.push(agent);
    }
    Ok(agents)
}

fn run_single(args: &Args, mem: &mut Memory) -> Result<(), String> {
    let mut cpu = Cpu::new(mem);
    cpu.trace = args.trace;
    let outcome = cpu.step(args.max_cycles.unwrap_or(DEFAULT_MAX_CYCLES));
    if let Some(trap) = outcome.trap {
        log::error!("halted on trap: {trap:?}");
    }
    println!(
        "cycles={} active={} energy={} flips={}",
        cpu.metrics.total_cycles, cpu.metrics.active_cycles, cpu.metrics.energy_proxy, cpu.metrics.trit_flips
    );
    Ok(())
}

fn run_agents(args: &Args, mem: &mut Memory, roster_path: &PathBuf) -> Result<(), String> {
    let roster = load_roster(roster_path)?;
    let mut cpu = Cpu::new(mem);
    cpu.trace = args.trace;
    let mut config = SchedulerConfig::default();
    config.max_agent_cycles = args.max_cycles.unwrap_or(config.max_agent_cycles);

    let mut scheduler = Scheduler::new(&mut cpu, config);
    for agent in roster {
        scheduler.register_agent(agent);
    }

    for _ in 0..args.ticks {
        scheduler.tick();
    }

    for agent in scheduler.agents() {
        println!(
            "agent {} state={:?} pc={} health={} stability={}",
            agent.id,
            agent.state,
            agent.pc.to_int(),
            agent.health_score,
            agent.stability_index
        );
    }
    Ok(())
}

fn run(args: Args) -> Result<(), String> {
    let mut mem = Memory::new();
    mem.load_executable(&args.exec)
        .map_err(|e| format!("loading {}: {e}", args.exec.display()))?;

    match &args.agents {
        Some(roster_path) => run_agents(&args, &mut mem, roster_path),
        None => run_single(&args, &mut mem),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
