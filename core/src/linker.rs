//! Merges object files into a single executable (§4.6): merge sections
//! by name, lay out `.text` then `.data` then any remaining sections,
//! resolve global/local symbols, and patch relocations.

use std::collections::HashMap;

use crate::error::LinkError;
use crate::object::{Executable, ObjectFile, RelocationType, Section, SymbolScope};

struct FileSectionOffset {
    file_index: usize,
    section_name: String,
    start_offset: i64,
}

/// Accumulates object files and links them in one pass, builder-style.
#[derive(Default)]
pub struct Linker {
    inputs: Vec<ObjectFile>,
}

impl Linker {
    pub fn new() -> Self {
        Linker { inputs: Vec::new() }
    }

    pub fn add_object(mut self, object: ObjectFile) -> Self {
        self.inputs.push(object);
        self
    }

    pub fn link(&self) -> Result<Executable, LinkError> {
        let mut merged: HashMap<String, Section> = HashMap::new();
        merged.insert(
            ".text".to_string(),
            Section {
                name: ".text".into(),
                base_address: 0,
                data: Vec::new(),
            },
        );
        merged.insert(
            ".data".to_string(),
            Section {
                name: ".data".into(),
                base_address: 0,
                data: Vec::new(),
            },
        );

        let mut file_offsets = Vec::new();
        for (file_index, file) in self.inputs.iter().enumerate() {
            for section in &file.sections {
                let out = merged.entry(section.name.clone()).or_insert_with(|| Section {
                    name: section.name.clone(),
                    base_address: 0,
                    data: Vec::new(),
                });
                let start_offset = out.data.len() as i64;
                file_offsets.push(FileSectionOffset {
                    file_index,
                    section_name: section.name.clone(),
                    start_offset,
                });
                out.data.extend(section.data.iter().copied());
            }
        }

        // Layout: .text first, then .data, then any other sections in
        // first-seen order — matching the original's fixed ordering plus
        // a fallback for sections it never anticipated.
        let mut order = vec![".text".to_string(), ".data".to_string()];
        for file in &self.inputs {
            for section in &file.sections {
                if !order.contains(&section.name) {
                    order.push(section.name.clone());
                }
            }
        }

        let mut base_addresses: HashMap<String, i64> = HashMap::new();
        let mut current_address = 0i64;
        for name in &order {
            let Some(section) = merged.get(name) else {
                continue;
            };
            base_addresses.insert(name.clone(), current_address);
            current_address += section.data.len() as i64;
        }

        let section_offset = |file_index: usize, section_name: &str| -> i64 {
            file_offsets
                .iter()
                .find(|fo| fo.file_index == file_index && fo.section_name == section_name)
                .map(|fo| fo.start_offset)
                .unwrap_or(0)
        };

        // Resolve global symbols.
        let mut global_symbols: HashMap<String, i64> = HashMap::new();
        for (file_index, file) in self.inputs.iter().enumerate() {
            for symbol in &file.symbols {
                if symbol.scope != SymbolScope::Global {
                    continue;
                }
                let section_base = *base_addresses.get(&symbol.section).unwrap_or(&0);
                let final_address =
                    section_base + section_offset(file_index, &symbol.section) + symbol.offset;
                if global_symbols.contains_key(&symbol.name) {
                    return Err(LinkError::DuplicateGlobal {
                        name: symbol.name.clone(),
                    });
                }
                global_symbols.insert(symbol.name.clone(), final_address);
            }
        }

        // Apply relocations.
        for (file_index, file) in self.inputs.iter().enumerate() {
            for reloc in &file.relocations {
                let target_address = if let Some(addr) = global_symbols.get(&reloc.symbol) {
                    *addr
                } else if let Some(symbol) = file.symbols.iter().find(|s| s.name == reloc.symbol) {
                    let section_base = *base_addresses.get(&symbol.section).unwrap_or(&0);
                    section_base + section_offset(file_index, &symbol.section) + symbol.offset
                } else {
                    return Err(LinkError::UnresolvedSymbol {
                        name: reloc.symbol.clone(),
                    });
                };

                let section_base = *base_addresses.get(&reloc.section).unwrap_or(&0);
                let patch_address =
                    section_base + section_offset(file_index, &reloc.section) + reloc.offset;

                let value = match reloc.kind {
                    RelocationType::Abs => target_address,
                    RelocationType::Pcr => target_address - (patch_address + 1),
                };

                let section = merged.get_mut(&reloc.section).unwrap();
                let slot = section_offset(file_index, &reloc.section) + reloc.offset;
                section.data[slot as usize].set_slice(0, 10, value);
            }
        }

        let mut output_sections = Vec::new();
        for name in &order {
            if let Some(mut section) = merged.remove(name) {
                if section.data.is_empty() && name != ".text" && name != ".data" {
                    continue;
                }
                section.base_address = *base_addresses.get(name).unwrap_or(&0);
                output_sections.push(section);
            }
        }

        Ok(Executable {
            sections: output_sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Relocation, Symbol};
    use crate::trit::TritWord;

    #[test]
    fn single_object_links_with_identity_layout() {
        let mut obj = ObjectFile::default();
        let text = obj.section_mut(".text");
        text.data.push(TritWord::from_int(1));
        text.data.push(TritWord::from_int(2));

        let exe = Linker::new().add_object(obj).link().expect("link");
        let text = exe.sections.iter().find(|s| s.name == ".text").unwrap();
        assert_eq!(text.base_address, 0);
        assert_eq!(text.data.len(), 2);
    }

    #[test]
    fn duplicate_global_symbol_is_rejected() {
        let mut a = ObjectFile::default();
        a.section_mut(".text").data.push(TritWord::ZERO);
        a.symbols.push(Symbol {
            name: "start".into(),
            section: ".text".into(),
            offset: 0,
            scope: SymbolScope::Global,
        });

        let mut b = ObjectFile::default();
        b.section_mut(".text").data.push(TritWord::ZERO);
        b.symbols.push(Symbol {
            name: "start".into(),
            section: ".text".into(),
            offset: 0,
            scope: SymbolScope::Global,
        });

        let err = Linker::new().add_object(a).add_object(b).link().unwrap_err();
        assert!(matches!(err, LinkError::DuplicateGlobal { .. }));
    }

    #[test]
    fn pcr_relocation_patches_relative_offset() {
        let mut obj = ObjectFile::default();
        let text = obj.section_mut(".text");
        // word 0: ldi r1 5 (irrelevant content)
        text.data.push(TritWord::ZERO);
        // word 1: jmp start (PCR reloc against word 1, target = word 0)
        text.data.push(TritWord::ZERO);
        obj.symbols.push(Symbol {
            name: "start".into(),
            section: ".text".into(),
            offset: 0,
            scope: SymbolScope::Local,
        });
        obj.relocations.push(Relocation {
            section: ".text".into(),
            offset: 1,
            symbol: "start".into(),
            kind: RelocationType::Pcr,
        });

        let exe = Linker::new().add_object(obj).link().expect("link");
        let text = exe.sections.iter().find(|s| s.name == ".text").unwrap();
        assert_eq!(text.data[1].get_slice(0, 10), -2);
    }

    #[test]
    fn unresolved_symbol_is_rejected() {
        let mut obj = ObjectFile::default();
        obj.section_mut(".text").data.push(TritWord::ZERO);
        obj.relocations.push(Relocation {
            section: ".text".into(),
            offset: 0,
            symbol: "missing".into(),
            kind: RelocationType::Abs,
        });

        let err = Linker::new().add_object(obj).link().unwrap_err();
        assert!(matches!(err, LinkError::UnresolvedSymbol { .. }));
    }
}
