//! End-to-end scenarios spanning assembler, linker, CPU, and scheduler.

use helix9_core::assembler::Assembler;
use helix9_core::cognitive::{Agent, AgentState, Scheduler, SchedulerConfig};
use helix9_core::cpu::Cpu;
use helix9_core::linker::Linker;
use helix9_core::memory::{Memory, PAGE_SIZE, PERM_DEFAULT};
use helix9_core::trit::TritWord;

fn assemble_and_link(source: &str) -> helix9_core::object::Executable {
    let obj = Assembler::new(source).assemble().expect("assemble");
    Linker::new().add_object(obj).link().expect("link")
}

fn load(exe: &helix9_core::object::Executable, mem: &mut Memory) {
    for section in &exe.sections {
        let mut addr = section.base_address;
        for word in &section.data {
            mem.write(addr, *word);
            addr += 1;
        }
    }
}

#[test]
fn assembler_linker_round_trip_emits_negative_one_pcr_immediate() {
    let source = ".section .text\nstart: ldi.w r1 5\njmp start\nhlt\n";
    let exe = assemble_and_link(source);
    let text = exe.sections.iter().find(|s| s.name == ".text").unwrap();
    assert_eq!(text.data[1].get_slice(0, 10), -1);
}

#[test]
fn cognitive_page_wrap_confines_load_to_page() {
    let source = "\
.section .text
ld.w r1 [r2 256]
hlt
";
    let exe = assemble_and_link(source);
    let mut mem = Memory::new();
    load(&exe, &mut mem);
    mem.write(0x3000, TritWord::from_int(77));

    let mut cpu = Cpu::new(&mut mem);
    cpu.status.set_trit(helix9_core::cpu::status_bit::COG, 1);
    cpu.regs[2] = TritWord::from_int(0x3000);
    cpu.step(10);

    assert_eq!(cpu.regs[1].to_int(), 77);
}

#[test]
fn scheduler_runs_agents_in_registration_order_and_keeps_them_close() {
    let source = "\
.section .text
ldi.w r1 0
ldi.w r2 1
loop: add.w r1 r1 r2
jmp loop
";
    let exe = assemble_and_link(source);
    let mut mem = Memory::new();
    load(&exe, &mut mem);

    let mut cpu = Cpu::new(&mut mem);
    let config = SchedulerConfig {
        max_agent_cycles: 10,
        ..SchedulerConfig::default()
    };
    let mut scheduler = Scheduler::new(&mut cpu, config);

    for id in [1u32, 2, 3] {
        let mut agent = Agent::new(id);
        agent.state = AgentState::Active;
        scheduler.register_agent(agent);
    }

    for _ in 0..30 {
        scheduler.tick();
    }

    let values: Vec<i64> = scheduler.agents().iter().map(|a| a.regs[1].to_int()).collect();
    for agent in scheduler.agents() {
        assert!(agent.last_tick >= 1);
    }
    let spread = values.iter().max().unwrap() - values.iter().min().unwrap();
    assert!(spread <= 5, "agents diverged too far: {values:?}");
}

#[test]
fn memory_isolation_blocks_cross_context_write() {
    let mut mem = Memory::new();
    mem.allocate_page(60, 200, helix9_core::memory::PERM_OWNER_READ);
    mem.set_context(100);
    mem.write(60 * PAGE_SIZE, TritWord::from_int(999));
    mem.set_context(0);
    assert_eq!(mem.read(60 * PAGE_SIZE).to_int(), 0);

    mem.allocate_page(50, 100, PERM_DEFAULT);
    mem.set_context(100);
    mem.write(50 * PAGE_SIZE, TritWord::from_int(42));
    assert_eq!(mem.read(50 * PAGE_SIZE).to_int(), 42);
}
