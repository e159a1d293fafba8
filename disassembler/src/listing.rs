use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use rdt_script::format::instructions::describe;
use rdt_script::ScriptStream;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inst {
    address: usize,
    mnemonic: String,
    size: usize,
    bytes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    operands: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    index: usize,
    address: usize,
    insts: Vec<Inst>,
    /// Set when the sweep stopped on something it could not decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub struct Disassembler {
    stream: ScriptStream,
    entries: Vec<Entry>,
}

impl Disassembler {
    pub fn new(input: impl AsRef<Path>) -> Result<Self> {
        let input = input.as_ref();
        let blob = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        Self::from_blob(blob)
    }

    pub fn from_blob(blob: Vec<u8>) -> Result<Self> {
        let stream = ScriptStream::parse(blob)?;
        Ok(Self {
            stream,
            entries: Vec::new(),
        })
    }

    pub fn stream(&self) -> &ScriptStream {
        &self.stream
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Sweep every entry point up to the next entry (or the end of the blob).
    pub fn disassemble(&mut self) {
        let starts = self.stream.entries().to_vec();
        let mut bounds = starts.iter().copied().sorted().dedup().collect::<Vec<_>>();
        bounds.push(self.stream.len());

        self.entries = starts
            .iter()
            .enumerate()
            .map(|(index, &address)| {
                let end = bounds
                    .iter()
                    .copied()
                    .find(|&b| b > address)
                    .unwrap_or(self.stream.len());
                self.sweep(index, address, end)
            })
            .collect();
    }

    fn sweep(&self, index: usize, address: usize, end: usize) -> Entry {
        let mut insts = Vec::new();
        let mut error = None;

        for located in self.stream.instructions(address) {
            match located {
                Ok(located) if located.address < end => {
                    insts.push(Inst {
                        address: located.address,
                        mnemonic: located.opcode.to_string(),
                        size: located.opcode.size(),
                        bytes: located.raw.iter().map(|b| format!("{:02X}", b)).join(" "),
                        operands: describe(located.opcode, located.raw).unwrap_or_default(),
                    });
                }
                Ok(_) => break,
                Err(fault) => {
                    log::warn!("entry {}: {}", index, fault);
                    error = Some(fault.to_string());
                    break;
                }
            }
        }

        Entry {
            index,
            address,
            insts,
            error,
        }
    }

    pub fn write_insts(&self, writer: impl std::io::Write) -> Result<()> {
        serde_yaml::to_writer(writer, &self.entries)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdt_script::asm::ScriptBuilder;

    #[test]
    fn lists_each_entry_separately() -> Result<()> {
        let mut b = ScriptBuilder::new();
        b.entry().save(3, -2).evt_end();
        b.entry().cut_chg(1).evt_end();
        let mut disassembler = Disassembler::from_blob(b.build_scd()?)?;
        disassembler.disassemble();

        let entries = disassembler.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].address, 4);
        assert_eq!(
            entries[0].insts[0],
            Inst {
                address: 4,
                mnemonic: "save".to_string(),
                size: 4,
                bytes: "24 03 FE FF".to_string(),
                operands: vec!["var=3".to_string(), "value=-2".to_string()],
            }
        );
        assert_eq!(entries[0].insts.len(), 2);
        assert_eq!(entries[1].insts[0].mnemonic, "cut_chg");

        let mut yaml = Vec::new();
        disassembler.write_insts(&mut yaml)?;
        let back: Vec<Entry> = serde_yaml::from_slice(&yaml)?;
        assert_eq!(back, disassembler.entries);
        Ok(())
    }

    #[test]
    fn undecodable_bytes_end_the_sweep() -> Result<()> {
        let mut b = ScriptBuilder::new();
        b.nop().raw(&[0xf7]);
        let mut disassembler = Disassembler::from_blob(b.build_scd()?)?;
        disassembler.disassemble();

        let entry = &disassembler.entries()[0];
        assert_eq!(entry.insts.len(), 1);
        assert!(entry.error.as_deref().is_some_and(|e| e.contains("0xF7")));
        Ok(())
    }
}
