//! Paged protected memory: a flat system region plus sparse owner-tagged
//! cognitive pages (§4.2).

use std::collections::HashMap;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::trit::TritWord;

pub const PAGE_SIZE: i64 = 256;
pub const SYSTEM_REGION_END: i64 = 0x3000;
pub const COGNITIVE_REGION_END: i64 = 0x8000;
pub const SYSTEM_WORDS: usize = 12288;

pub const PERM_OWNER_READ: u8 = 0x01;
pub const PERM_OWNER_WRITE: u8 = 0x02;
pub const PERM_DEFAULT: u8 = PERM_OWNER_READ | PERM_OWNER_WRITE;

/// A 256-word block of cognitive memory owned by a single context.
#[derive(Clone)]
pub struct Page {
    pub words: Box<[TritWord; PAGE_SIZE as usize]>,
    pub owner: u32,
    pub permissions: u8,
}

impl Page {
    fn new(owner: u32, permissions: u8) -> Self {
        Page {
            words: Box::new([TritWord::ZERO; PAGE_SIZE as usize]),
            owner,
            permissions,
        }
    }

    fn is_all_zero(&self) -> bool {
        self.words.iter().all(|w| w.to_int() == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Read,
    Write,
    WriteProtected,
}

#[derive(Debug, Clone, Copy)]
pub struct AccessViolation {
    pub ctx: u32,
    pub page_id: i64,
    pub owner: u32,
    pub kind: ViolationKind,
}

const VIOLATION_LOG_CAPACITY: usize = 64;

/// Flat system region plus sparse cognitive pages, mediated by a
/// process-wide current-context id.
pub struct Memory {
    system: Vec<TritWord>,
    pages: HashMap<i64, Page>,
    current_context: u32,
    violations: VecDeque<AccessViolation>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            system: vec![TritWord::ZERO; SYSTEM_WORDS],
            pages: HashMap::new(),
            current_context: 0,
            violations: VecDeque::new(),
        }
    }

    pub fn set_context(&mut self, ctx: u32) {
        self.current_context = ctx;
    }

    pub fn context(&self) -> u32 {
        self.current_context
    }

    pub fn violations(&self) -> impl Iterator<Item = &AccessViolation> {
        self.violations.iter()
    }

    fn record_violation(&mut self, v: AccessViolation) {
        log::warn!(
            "access violation: ctx={} page={} owner={} kind={:?}",
            v.ctx,
            v.page_id,
            v.owner,
            v.kind
        );
        if self.violations.len() == VIOLATION_LOG_CAPACITY {
            self.violations.pop_front();
        }
        self.violations.push_back(v);
    }

    fn decode(addr: i64) -> (i64, usize) {
        (addr / PAGE_SIZE, (addr % PAGE_SIZE) as usize)
    }

    pub fn is_page_allocated(&self, page_id: i64) -> bool {
        self.pages.contains_key(&page_id)
    }

    pub fn allocate_page(&mut self, page_id: i64, owner: u32, perms: u8) {
        self.pages
            .entry(page_id)
            .or_insert_with(|| Page::new(owner, perms));
    }

    /// Deletes the page iff every word is zero, reclaiming memory.
    pub fn optimize_page(&mut self, page_id: i64) {
        if let Some(page) = self.pages.get(&page_id) {
            if page.is_all_zero() {
                self.pages.remove(&page_id);
            }
        }
    }

    pub fn read(&mut self, addr: i64) -> TritWord {
        if addr < 0 {
            return TritWord::ZERO;
        }
        if addr < SYSTEM_REGION_END {
            return self
                .system
                .get(addr as usize)
                .copied()
                .unwrap_or(TritWord::ZERO);
        }

        let (page_id, offset) = Self::decode(addr);
        let ctx = self.current_context;
        match self.pages.get(&page_id) {
            None => TritWord::ZERO,
            Some(page) => {
                if ctx != 0 && ctx != page.owner {
                    let owner = page.owner;
                    self.record_violation(AccessViolation {
                        ctx,
                        page_id,
                        owner,
                        kind: ViolationKind::Read,
                    });
                    return TritWord::ZERO;
                }
                page.words[offset]
            }
        }
    }

    pub fn write(&mut self, addr: i64, value: TritWord) {
        if addr < 0 {
            return;
        }
        if addr < SYSTEM_REGION_END {
            if let Some(slot) = self.system.get_mut(addr as usize) {
                *slot = value;
            }
            return;
        }

        let (page_id, offset) = Self::decode(addr);
        let ctx = self.current_context;

        if !self.pages.contains_key(&page_id) {
            if value.to_int() == 0 {
                // Sparse invariant: writing 0 to an unallocated page is a no-op.
                return;
            }
            self.allocate_page(page_id, ctx, PERM_DEFAULT);
        }

        let page = self.pages.get_mut(&page_id).expect("just allocated");
        let is_system = ctx == 0;
        let is_owner = ctx == page.owner;

        if !is_system && !is_owner {
            let owner = page.owner;
            self.record_violation(AccessViolation {
                ctx,
                page_id,
                owner,
                kind: ViolationKind::Write,
            });
            return;
        }
        if is_owner && page.permissions & PERM_OWNER_WRITE == 0 {
            let owner = page.owner;
            self.record_violation(AccessViolation {
                ctx,
                page_id,
                owner,
                kind: ViolationKind::WriteProtected,
            });
            return;
        }

        page.words[offset] = value;
    }

    /// Parses the executable text format of §6 and writes each section's
    /// words into memory at its base address.
    pub fn load_executable(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let mut lines = text.lines();

        let header = lines.next().ok_or_else(|| CoreError::Malformed {
            line: 1,
            detail: "empty executable file".into(),
        })?;
        let mut header_tokens = header.split_whitespace();
        if header_tokens.next() != Some("HX") {
            return Err(CoreError::Malformed {
                line: 1,
                detail: "expected HX header".into(),
            });
        }

        let mut line_no = 1usize;
        while let Some(line) = lines.next() {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let Some(tag) = tokens.next() else { continue };
            if tag != "SECTION" {
                continue;
            }
            let _name = tokens.next();
            let base: i64 = tokens
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| CoreError::Malformed {
                    line: line_no,
                    detail: "missing section base address".into(),
                })?;
            let _size = tokens.next();

            line_no += 1;
            let data_line = lines.next().ok_or_else(|| CoreError::Malformed {
                line: line_no,
                detail: "missing section data line".into(),
            })?;
            let mut addr = base;
            for tok in data_line.split_whitespace() {
                let value: i64 = tok.parse().map_err(|_| CoreError::Malformed {
                    line: line_no,
                    detail: format!("invalid word literal '{tok}'"),
                })?;
                self.write(addr, TritWord::from_int(value));
                addr += 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_region_round_trips() {
        let mut mem = Memory::new();
        mem.write(10, TritWord::from_int(42));
        assert_eq!(mem.read(10).to_int(), 42);
    }

    #[test]
    fn writing_zero_to_unallocated_page_is_noop() {
        let mut mem = Memory::new();
        mem.write(0x3000, TritWord::ZERO);
        assert!(!mem.is_page_allocated(0x3000 / PAGE_SIZE));
        assert_eq!(mem.read(0x3000).to_int(), 0);
    }

    #[test]
    fn permission_denied_write_leaves_page_unchanged() {
        let mut mem = Memory::new();
        mem.allocate_page(60, 200, PERM_OWNER_READ);
        mem.set_context(100);
        mem.write(60 * PAGE_SIZE, TritWord::from_int(999));
        mem.set_context(0);
        assert_eq!(mem.read(60 * PAGE_SIZE).to_int(), 0);
    }

    #[test]
    fn owner_can_read_and_write_own_page() {
        let mut mem = Memory::new();
        mem.set_context(100);
        mem.write(50 * PAGE_SIZE, TritWord::from_int(42));
        assert_eq!(mem.read(50 * PAGE_SIZE).to_int(), 42);
    }

    #[test]
    fn optimize_page_reclaims_all_zero_page() {
        let mut mem = Memory::new();
        mem.write(0x3000, TritWord::from_int(1));
        mem.write(0x3000, TritWord::ZERO);
        mem.optimize_page(0x3000 / PAGE_SIZE);
        assert!(!mem.is_page_allocated(0x3000 / PAGE_SIZE));
    }
}
