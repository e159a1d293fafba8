use anyhow::{bail, Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::error::ScriptFault;
use crate::format::opcode::Opcode;

/// One room script: raw bytecode plus the start address of every entry point.
///
/// Addresses are byte offsets from the start of the blob, the same space block lengths
/// are measured in. The stream is immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStream {
    data: Bytes,
    entries: Vec<usize>,
}

impl ScriptStream {
    /// Parse a blob that starts with its `u16` entry offset table.
    ///
    /// The first offset doubles as the table length, so `entry_count = first / 2`.
    pub fn parse(raw: impl Into<Bytes>) -> Result<Self> {
        let data: Bytes = raw.into();
        if data.len() < 2 {
            bail!("script blob is too short: {} bytes", data.len());
        }

        let table_len = LittleEndian::read_u16(&data[0..2]) as usize;
        if table_len == 0 || table_len % 2 != 0 {
            bail!("invalid entry table length: {}", table_len);
        }
        if table_len > data.len() {
            bail!("entry table ({} bytes) runs past the blob ({} bytes)", table_len, data.len());
        }

        let entries = data[..table_len]
            .chunks_exact(2)
            .map(|c| LittleEndian::read_u16(c) as usize)
            .collect::<Vec<_>>();

        Self::from_parts(data, entries).context("while parsing the entry table")
    }

    /// Build a stream from bytecode and an already known entry table.
    pub fn from_parts(data: impl Into<Bytes>, entries: Vec<usize>) -> Result<Self> {
        let data: Bytes = data.into();
        for (i, &entry) in entries.iter().enumerate() {
            if entry >= data.len() {
                bail!("entry {} points at 0x{:X}, past the end of the blob (0x{:X})", i, entry, data.len());
            }
        }
        Ok(Self { data, entries })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Start address of entry point `index`.
    pub fn entry(&self, index: usize) -> Result<usize, ScriptFault> {
        self.entries
            .get(index)
            .copied()
            .ok_or(ScriptFault::UnknownEntry { entry: index })
    }

    /// Decode the instruction at `pc`, returning its opcode and its full raw bytes
    /// (opcode byte included, exactly `opcode.size()` long).
    pub fn fetch(&self, pc: usize) -> Result<(Opcode, &[u8]), ScriptFault> {
        let len = self.data.len();
        let byte = *self.data.get(pc).ok_or(ScriptFault::PcOutOfRange { pc, len })?;
        let opcode = Opcode::decode(byte).ok_or(ScriptFault::UnknownOpcode { opcode: byte, pc })?;
        let raw = self
            .data
            .get(pc..pc + opcode.size())
            .ok_or(ScriptFault::TruncatedInstruction { opcode, pc, len })?;
        Ok((opcode, raw))
    }

    /// Linear sweep from `start`, one instruction at a time.
    pub fn instructions(&self, start: usize) -> Instructions<'_> {
        Instructions {
            stream: self,
            pc: start,
            failed: false,
        }
    }
}

/// A decoded instruction located in its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'a> {
    pub address: usize,
    pub opcode: Opcode,
    pub raw: &'a [u8],
}

/// Iterator returned by [`ScriptStream::instructions`].
///
/// Stops at the end of the blob, or after yielding the first decode fault.
pub struct Instructions<'a> {
    stream: &'a ScriptStream,
    pc: usize,
    failed: bool,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Located<'a>, ScriptFault>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pc >= self.stream.len() {
            return None;
        }

        match self.stream.fetch(self.pc) {
            Ok((opcode, raw)) => {
                let address = self.pc;
                self.pc += opcode.size();
                Some(Ok(Located { address, opcode, raw }))
            }
            Err(fault) => {
                self.failed = true;
                Some(Err(fault))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parse_entry_table() -> Result<()> {
        // two entries: 0x0004 and 0x0006
        let blob = vec![0x04, 0x00, 0x06, 0x00, 0x01, 0x00, 0x01, 0x00];
        let stream = ScriptStream::parse(blob)?;
        assert_eq!(stream.entries(), &[4, 6]);
        assert_eq!(stream.entry(1)?, 6);
        assert_eq!(stream.entry(2), Err(ScriptFault::UnknownEntry { entry: 2 }));
        Ok(())
    }

    #[test]
    fn parse_rejects_broken_tables() {
        assert!(ScriptStream::parse(vec![0x04]).is_err());
        assert!(ScriptStream::parse(vec![0x00, 0x00, 0x01]).is_err());
        assert!(ScriptStream::parse(vec![0x03, 0x00, 0x01]).is_err());
        assert!(ScriptStream::parse(vec![0x08, 0x00, 0x01, 0x00]).is_err());
        // entry past the end
        assert!(ScriptStream::parse(vec![0x02, 0x00]).is_err());
    }

    #[test]
    fn fetch_checks_bounds_and_table() {
        let stream = ScriptStream::from_parts(vec![0x00, 0x09, 0x0a, 0x03, 0x00, 0xff, 0x23, 0x00], vec![0])
            .expect("valid entries");

        let (op, raw) = stream.fetch(1).expect("sleep");
        assert_eq!(op, Opcode::Sleep);
        assert_eq!(raw, &[0x09, 0x0a, 0x03, 0x00]);

        // the sleeping instruction embedded in sleep
        let (op, raw) = stream.fetch(2).expect("sleeping");
        assert_eq!(op, Opcode::Sleeping);
        assert_eq!(raw.len(), 3);

        assert_eq!(stream.fetch(5), Err(ScriptFault::UnknownOpcode { opcode: 0xff, pc: 5 }));
        assert_eq!(
            stream.fetch(6),
            Err(ScriptFault::TruncatedInstruction { opcode: Opcode::Compare, pc: 6, len: 8 })
        );
        assert_eq!(stream.fetch(8), Err(ScriptFault::PcOutOfRange { pc: 8, len: 8 }));
    }

    #[test]
    fn sweep_advances_by_declared_size() {
        // nop, end_if, evt_end, cut_chg 3, if_start(len 1), end_if
        let code = vec![0x00, 0x08, 0x01, 0x00, 0x29, 0x03, 0x06, 0x00, 0x01, 0x00, 0x08];
        let stream = ScriptStream::from_parts(code, vec![0]).expect("valid entries");
        let sweep = stream
            .instructions(0)
            .collect::<Result<Vec<_>, _>>()
            .expect("clean sweep");
        let addrs = sweep.iter().map(|i| (i.address, i.opcode)).collect::<Vec<_>>();
        assert_eq!(
            addrs,
            vec![
                (0, Opcode::Nop),
                (1, Opcode::EndIf),
                (2, Opcode::EvtEnd),
                (4, Opcode::CutChg),
                (6, Opcode::IfStart),
                (10, Opcode::EndIf),
            ]
        );
        for inst in &sweep {
            let (op, raw) = stream.fetch(inst.address).expect("re-decode");
            assert_eq!(op, inst.opcode);
            assert_eq!(raw.len(), op.size());
        }
    }

    #[test]
    fn sweep_visits_every_opcode() {
        let mut code = Vec::new();
        for opcode in Opcode::iter() {
            code.push(opcode as u8);
            code.resize(code.len() + opcode.size() - 1, 0);
        }
        let stream = ScriptStream::from_parts(code, vec![0]).expect("valid entries");
        let sweep = stream
            .instructions(0)
            .collect::<Result<Vec<_>, _>>()
            .expect("clean sweep");

        assert_eq!(sweep.len(), Opcode::iter().count());
        let mut next = 0;
        for (inst, expected) in sweep.iter().zip(Opcode::iter()) {
            assert_eq!((inst.address, inst.opcode), (next, expected));
            let (op, raw) = stream.fetch(inst.address).expect("re-decode");
            assert_eq!(op, expected);
            assert_eq!(raw.len(), expected.size());
            next = inst.address + inst.opcode.size();
        }
        assert_eq!(next, stream.len());
    }

    #[test]
    fn sweep_stops_after_fault() {
        let stream = ScriptStream::from_parts(vec![0x00, 0xee, 0x00], vec![0]).expect("valid entries");
        let items = stream.instructions(0).collect::<Vec<_>>();
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }
}
