//! Relocatable object files and linked executables: the in-memory model
//! plus the line-oriented text codec of §6.

use std::fmt::Write as _;
use std::path::Path;
use std::{fs, io};

use crate::error::{CoreError, Result};
use crate::trit::TritWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Local,
    Global,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub section: String,
    pub offset: i64,
    pub scope: SymbolScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationType {
    Abs,
    Pcr,
}

#[derive(Debug, Clone)]
pub struct Relocation {
    pub section: String,
    pub offset: i64,
    pub symbol: String,
    pub kind: RelocationType,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub base_address: i64,
    pub data: Vec<TritWord>,
}

/// A relocatable unit produced by the assembler: sections plus the
/// symbol/relocation tables the linker consumes (§3/§6, "Object file").
#[derive(Debug, Clone, Default)]
pub struct ObjectFile {
    pub sections: Vec<Section>,
    pub symbols: Vec<Symbol>,
    pub relocations: Vec<Relocation>,
}

impl ObjectFile {
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        if let Some(idx) = self.sections.iter().position(|s| s.name == name) {
            return &mut self.sections[idx];
        }
        self.sections.push(Section {
            name: name.to_string(),
            base_address: 0,
            data: Vec::new(),
        });
        self.sections.last_mut().unwrap()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        writeln!(out, "HTX 1 {}", self.sections.len()).unwrap();
        for section in &self.sections {
            writeln!(
                out,
                "SECTION {} {} {}",
                section.name,
                section.base_address,
                section.data.len()
            )
            .unwrap();
            let words: Vec<String> = section.data.iter().map(|w| w.to_int().to_string()).collect();
            writeln!(out, "{}", words.join(" ")).unwrap();
        }
        writeln!(out, "SYMBOLS {}", self.symbols.len()).unwrap();
        for sym in &self.symbols {
            let scope = match sym.scope {
                SymbolScope::Local => "L",
                SymbolScope::Global => "G",
            };
            writeln!(out, "{} {} {} {}", sym.name, sym.section, sym.offset, scope).unwrap();
        }
        writeln!(out, "RELOCATIONS {}", self.relocations.len()).unwrap();
        for reloc in &self.relocations {
            let kind = match reloc.kind {
                RelocationType::Abs => "ABS",
                RelocationType::Pcr => "PCR",
            };
            writeln!(
                out,
                "{} {} {} {}",
                reloc.offset, reloc.symbol, kind, reloc.section
            )
            .unwrap();
        }
        out
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CoreError::Malformed {
                    line: 0,
                    detail: format!("object file not found: {}", path.display()),
                }
            } else {
                CoreError::Io(e)
            }
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut obj = ObjectFile::default();
        let mut lines = text.lines().enumerate().peekable();

        let (no, header) = lines.next().ok_or_else(|| CoreError::Malformed {
            line: 1,
            detail: "empty object file".into(),
        })?;
        let mut header_tokens = header.split_whitespace();
        if header_tokens.next() != Some("HTX") {
            return Err(CoreError::Malformed {
                line: no + 1,
                detail: "expected HTX header".into(),
            });
        }

        while let Some((no, line)) = lines.next() {
            let line_no = no + 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("SECTION") => {
                    let name = tokens.next().ok_or_else(|| CoreError::Malformed {
                        line: line_no,
                        detail: "missing section name".into(),
                    })?;
                    let base: i64 = tokens
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| CoreError::Malformed {
                            line: line_no,
                            detail: "missing section base address".into(),
                        })?;
                    let (data_line_no, data_line) =
                        lines.next().ok_or_else(|| CoreError::Malformed {
                            line: line_no,
                            detail: "missing section data line".into(),
                        })?;
                    let mut data = Vec::new();
                    for tok in data_line.split_whitespace() {
                        let v: i64 = tok.parse().map_err(|_| CoreError::Malformed {
                            line: data_line_no + 1,
                            detail: format!("invalid word literal '{tok}'"),
                        })?;
                        data.push(TritWord::from_int(v));
                    }
                    obj.sections.push(Section {
                        name: name.to_string(),
                        base_address: base,
                        data,
                    });
                }
                Some("SYMBOLS") => {
                    let count: usize = tokens
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| CoreError::Malformed {
                            line: line_no,
                            detail: "missing symbol count".into(),
                        })?;
                    for _ in 0..count {
                        let (sym_line_no, sym_line) =
                            lines.next().ok_or_else(|| CoreError::Malformed {
                                line: line_no,
                                detail: "truncated symbol table".into(),
                            })?;
                        let mut f = sym_line.split_whitespace();
                        let name = f.next().unwrap_or_default().to_string();
                        let section = f.next().unwrap_or_default().to_string();
                        let offset: i64 = f.next().and_then(|s| s.parse().ok()).ok_or_else(|| {
                            CoreError::Malformed {
                                line: sym_line_no + 1,
                                detail: "malformed symbol offset".into(),
                            }
                        })?;
                        let scope = match f.next() {
                            Some("G") => SymbolScope::Global,
                            _ => SymbolScope::Local,
                        };
                        obj.symbols.push(Symbol {
                            name,
                            section,
                            offset,
                            scope,
                        });
                    }
                }
                Some("RELOCATIONS") => {
                    let count: usize = tokens
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| CoreError::Malformed {
                            line: line_no,
                            detail: "missing relocation count".into(),
                        })?;
                    for _ in 0..count {
                        let (reloc_line_no, reloc_line) =
                            lines.next().ok_or_else(|| CoreError::Malformed {
                                line: line_no,
                                detail: "truncated relocation table".into(),
                            })?;
                        let mut f = reloc_line.split_whitespace();
                        let offset: i64 = f.next().and_then(|s| s.parse().ok()).ok_or_else(|| {
                            CoreError::Malformed {
                                line: reloc_line_no + 1,
                                detail: "malformed relocation offset".into(),
                            }
                        })?;
                        let symbol = f.next().unwrap_or_default().to_string();
                        let kind = match f.next() {
                            Some("PCR") => RelocationType::Pcr,
                            _ => RelocationType::Abs,
                        };
                        let section = f.next().unwrap_or_default().to_string();
                        obj.relocations.push(Relocation {
                            section,
                            offset,
                            symbol,
                            kind,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(obj)
    }
}

/// A fully linked program: final sections only, no symbols or
/// relocations (§3/§6, "Executable file").
#[derive(Debug, Clone, Default)]
pub struct Executable {
    pub sections: Vec<Section>,
}

impl Executable {
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        writeln!(out, "HX 1 {}", self.sections.len()).unwrap();
        for section in &self.sections {
            writeln!(
                out,
                "SECTION {} {} {}",
                section.name,
                section.base_address,
                section.data.len()
            )
            .unwrap();
            let words: Vec<String> = section.data.iter().map(|w| w.to_int().to_string()).collect();
            writeln!(out, "{}", words.join(" ")).unwrap();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_file_round_trips_through_text() {
        let mut obj = ObjectFile::default();
        let text_sec = obj.section_mut(".text");
        text_sec.data.push(TritWord::from_int(5));
        text_sec.data.push(TritWord::from_int(-3));
        obj.symbols.push(Symbol {
            name: "start".into(),
            section: ".text".into(),
            offset: 0,
            scope: SymbolScope::Global,
        });
        obj.relocations.push(Relocation {
            section: ".text".into(),
            offset: 1,
            symbol: "start".into(),
            kind: RelocationType::Pcr,
        });

        let text = obj.to_text();
        let parsed = ObjectFile::parse(&text).expect("parse");
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[0].data[0].to_int(), 5);
        assert_eq!(parsed.sections[0].data[1].to_int(), -3);
        assert_eq!(parsed.symbols[0].name, "start");
        assert_eq!(parsed.relocations[0].kind, RelocationType::Pcr);
    }

    #[test]
    fn executable_text_format_has_no_symbol_section() {
        let exe = Executable {
            sections: vec![Section {
                name: ".text".into(),
                base_address: 0,
                data: vec![TritWord::from_int(1)],
            }],
        };
        let text = exe.to_text();
        assert!(text.starts_with("HX 1 1"));
        assert!(!text.contains("SYMBOLS"));
    }
}
