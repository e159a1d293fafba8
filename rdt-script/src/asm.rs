//! A small assembler for authoring room scripts in code.
//!
//! Block lengths of `if`/`else`, `for`, `switch` and `case` are patched in when the block is
//! closed, so scripts can be written top to bottom:
//!
//! ```
//! use rdt_script::asm::ScriptBuilder;
//!
//! let mut b = ScriptBuilder::new();
//! b.entry()
//!     .if_start()
//!     .compare(3, 0, 1)
//!     .save(4, 99)
//!     .end_if()
//!     .evt_end();
//! let stream = b.build().unwrap();
//! assert_eq!(stream.entry_count(), 1);
//! ```

use anyhow::{bail, Result};

use crate::format::opcode::Opcode;
use crate::format::stream::ScriptStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    If(usize),
    Else(usize),
    For(usize),
    Switch(usize),
    Case(usize),
    Default,
}

#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    code: Vec<u8>,
    entries: Vec<usize>,
    open: Vec<Open>,
    error: Option<String>,
}

fn put_u8(value: u8, buffer: &mut Vec<u8>) {
    buffer.push(value);
}

fn put_u16_le(value: u16, buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

fn put_i16_le(value: i16, buffer: &mut Vec<u8>) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the next entry point at the current address.
    pub fn entry(&mut self) -> &mut Self {
        self.entries.push(self.code.len());
        self
    }

    /// Emit `opcode` with `payload` after the opcode byte, zero padded to the opcode's size.
    pub fn instruction(&mut self, opcode: Opcode, payload: &[u8]) -> &mut Self {
        let size = opcode.size();
        if payload.len() + 1 > size {
            self.fail(format!(
                "{} takes {} payload bytes, got {}",
                opcode,
                size - 1,
                payload.len()
            ));
            return self;
        }
        put_u8(opcode as u8, &mut self.code);
        self.code.extend_from_slice(payload);
        self.code.resize(self.code.len() + size - 1 - payload.len(), 0);
        self
    }

    /// Append bytes verbatim.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.code.extend_from_slice(bytes);
        self
    }

    pub fn nop(&mut self) -> &mut Self {
        self.instruction(Opcode::Nop, &[])
    }

    pub fn evt_end(&mut self) -> &mut Self {
        self.instruction(Opcode::EvtEnd, &[])
    }

    pub fn evt_exec(&mut self, thread: u8, event: u8) -> &mut Self {
        self.instruction(Opcode::EvtExec, &[thread, Opcode::Gosub as u8, event])
    }

    pub fn if_start(&mut self) -> &mut Self {
        self.open.push(Open::If(self.code.len()));
        self.instruction(Opcode::IfStart, &[])
    }

    /// Close the if body and open the else body. An else block ends at `end_if()` without an
    /// `end_if` instruction of its own.
    pub fn else_start(&mut self) -> &mut Self {
        let Some(Open::If(at)) = self.open.pop() else {
            self.fail("else_start without an open if".to_string());
            return self;
        };
        let here = self.code.len();
        // the failed-condition path resumes just after the else header
        self.patch_u16(at + 2, here - at);
        self.open.push(Open::Else(here));
        self.instruction(Opcode::ElseStart, &[])
    }

    pub fn end_if(&mut self) -> &mut Self {
        match self.open.pop() {
            Some(Open::If(at)) => {
                self.instruction(Opcode::EndIf, &[]);
                let length = self.code.len() - (at + Opcode::IfStart.size());
                self.patch_u16(at + 2, length);
            }
            Some(Open::Else(at)) => {
                let length = self.code.len() - at;
                self.patch_u16(at + 2, length);
            }
            other => self.mismatch("end_if", other),
        }
        self
    }

    pub fn sleep(&mut self, ticks: u16) -> &mut Self {
        let mut payload = vec![Opcode::Sleeping as u8];
        put_u16_le(ticks, &mut payload);
        self.instruction(Opcode::Sleep, &payload)
    }

    pub fn for_loop(&mut self, count: u16) -> &mut Self {
        self.open.push(Open::For(self.code.len()));
        let mut payload = vec![0, 0, 0];
        put_u16_le(count, &mut payload);
        self.instruction(Opcode::For, &payload)
    }

    pub fn for_end(&mut self) -> &mut Self {
        match self.open.pop() {
            Some(Open::For(at)) => {
                self.instruction(Opcode::ForEnd, &[]);
                let length = self.code.len() - (at + Opcode::For.size());
                self.patch_u16(at + 2, length);
            }
            other => self.mismatch("for_end", other),
        }
        self
    }

    pub fn switch(&mut self, var_id: u8) -> &mut Self {
        self.open.push(Open::Switch(self.code.len()));
        self.instruction(Opcode::Switch, &[var_id])
    }

    pub fn case(&mut self, value: u16) -> &mut Self {
        self.close_arm();
        self.open.push(Open::Case(self.code.len()));
        let mut payload = vec![0, 0, 0];
        put_u16_le(value, &mut payload);
        self.instruction(Opcode::Case, &payload)
    }

    pub fn default_case(&mut self) -> &mut Self {
        self.close_arm();
        self.open.push(Open::Default);
        self.instruction(Opcode::Default, &[])
    }

    pub fn end_switch(&mut self) -> &mut Self {
        self.close_arm();
        match self.open.pop() {
            Some(Open::Switch(at)) => {
                self.instruction(Opcode::EndSwitch, &[]);
                let length = self.code.len() - (at + Opcode::Switch.size());
                self.patch_u16(at + 2, length);
            }
            other => self.mismatch("end_switch", other),
        }
        self
    }

    pub fn break_loop(&mut self) -> &mut Self {
        self.instruction(Opcode::Break, &[])
    }

    pub fn goto(&mut self, offset: i16) -> &mut Self {
        let mut payload = vec![0xff, 0xff, 0];
        put_i16_le(offset, &mut payload);
        self.instruction(Opcode::Goto, &payload)
    }

    pub fn gosub(&mut self, event: u8) -> &mut Self {
        self.instruction(Opcode::Gosub, &[event])
    }

    pub fn check(&mut self, bit_array: u8, bit: u8, value: u8) -> &mut Self {
        self.instruction(Opcode::Check, &[bit_array, bit, value])
    }

    pub fn set_bit(&mut self, bit_array: u8, bit: u8, operation: u8) -> &mut Self {
        self.instruction(Opcode::SetBit, &[bit_array, bit, operation])
    }

    pub fn compare(&mut self, var_id: u8, operation: u8, value: i16) -> &mut Self {
        let mut payload = vec![0, var_id, operation];
        put_i16_le(value, &mut payload);
        self.instruction(Opcode::Compare, &payload)
    }

    pub fn save(&mut self, var_id: u8, value: i16) -> &mut Self {
        let mut payload = vec![var_id];
        put_i16_le(value, &mut payload);
        self.instruction(Opcode::Save, &payload)
    }

    pub fn copy(&mut self, dest: u8, source: u8) -> &mut Self {
        self.instruction(Opcode::Copy, &[dest, source])
    }

    pub fn calc(&mut self, operation: u8, var_id: u8, value: i16) -> &mut Self {
        let mut payload = vec![0, operation, var_id];
        put_i16_le(value, &mut payload);
        self.instruction(Opcode::Calc, &payload)
    }

    pub fn calc2(&mut self, operation: u8, var_id: u8, source_var_id: u8) -> &mut Self {
        self.instruction(Opcode::Calc2, &[operation, var_id, source_var_id])
    }

    pub fn cut_chg(&mut self, camera: u8) -> &mut Self {
        self.instruction(Opcode::CutChg, &[camera])
    }

    pub fn work_set(&mut self, component: u8, index: u8) -> &mut Self {
        self.instruction(Opcode::WorkSet, &[component, index])
    }

    pub fn pos_set(&mut self, x: i16, y: i16, z: i16) -> &mut Self {
        let mut payload = vec![0];
        for v in [x, y, z] {
            put_i16_le(v, &mut payload);
        }
        self.instruction(Opcode::PosSet, &payload)
    }

    pub fn member_set(&mut self, member: u8, value: i16) -> &mut Self {
        let mut payload = vec![member];
        put_i16_le(value, &mut payload);
        self.instruction(Opcode::MemberSet, &payload)
    }

    pub fn sca_id_set(&mut self, id: u8, flag: u16) -> &mut Self {
        let mut payload = vec![id];
        put_u16_le(flag, &mut payload);
        self.instruction(Opcode::ScaIdSet, &payload)
    }

    /// Bytecode plus entry table, without the serialized table in front.
    pub fn build(&self) -> Result<ScriptStream> {
        self.check_closed()?;
        let entries = if self.entries.is_empty() { vec![0] } else { self.entries.clone() };
        ScriptStream::from_parts(self.code.clone(), entries)
    }

    /// A blob in the on-disk layout: `u16` entry table, then the bytecode.
    pub fn build_scd(&self) -> Result<Vec<u8>> {
        self.check_closed()?;
        let entries = if self.entries.is_empty() { vec![0] } else { self.entries.clone() };
        let table_len = entries.len() * 2;

        let mut blob = Vec::with_capacity(table_len + self.code.len());
        for entry in entries {
            let Ok(offset) = u16::try_from(entry + table_len) else {
                bail!("entry at 0x{:X} does not fit the u16 entry table", entry);
            };
            put_u16_le(offset, &mut blob);
        }
        blob.extend_from_slice(&self.code);
        Ok(blob)
    }

    fn check_closed(&self) -> Result<()> {
        if let Some(error) = &self.error {
            bail!("{}", error);
        }
        if let Some(open) = self.open.last() {
            bail!("unclosed block: {:?}", open);
        }
        Ok(())
    }

    /// Close the case or default arm on top of the stack, if any.
    fn close_arm(&mut self) {
        match self.open.last().copied() {
            Some(Open::Case(at)) => {
                self.open.pop();
                let length = self.code.len() - (at + Opcode::Case.size());
                self.patch_u16(at + 2, length);
            }
            Some(Open::Default) => {
                self.open.pop();
            }
            _ => {}
        }
    }

    fn patch_u16(&mut self, at: usize, value: usize) {
        let Ok(value) = u16::try_from(value) else {
            self.fail(format!("block at 0x{:X} is longer than 0xFFFF bytes", at));
            return;
        };
        if let Some(slot) = self.code.get_mut(at..at + 2) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
    }

    fn mismatch(&mut self, what: &str, found: Option<Open>) {
        self.fail(format!("{} does not close {:?}", what, found));
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn if_else_lengths() -> Result<()> {
        let mut b = ScriptBuilder::new();
        b.if_start().check(0, 0, 1).nop().else_start().nop().nop().end_if();
        let stream = b.build()?;

        // if body: check(4) + nop(1) + else header(4)
        assert_eq!(&stream.data()[0..4], &[0x06, 0x00, 0x09, 0x00]);
        // else block measured from its own header: header(4) + 2 nops
        assert_eq!(&stream.data()[9..13], &[0x07, 0x00, 0x06, 0x00]);
        assert_eq!(stream.len(), 15);
        Ok(())
    }

    #[test]
    fn switch_lengths() -> Result<()> {
        let mut b = ScriptBuilder::new();
        b.switch(7).case(1).nop().break_loop().default_case().nop().end_switch();
        let data = b.build()?.data().to_vec();

        // case(6) + nop + break(2) + default(2) + nop + end_switch(2)
        assert_eq!(&data[0..4], &[0x13, 0x07, 0x0e, 0x00]);
        assert_eq!(&data[4..10], &[0x14, 0x00, 0x03, 0x00, 0x01, 0x00]);
        Ok(())
    }

    #[test]
    fn scd_table_is_offset_by_its_own_size() -> Result<()> {
        let mut b = ScriptBuilder::new();
        b.entry().evt_end().entry().nop().evt_end();
        let blob = b.build_scd()?;
        assert_eq!(&blob[0..4], &[0x04, 0x00, 0x06, 0x00]);

        let stream = ScriptStream::parse(blob)?;
        assert_eq!(stream.entries(), &[4, 6]);
        Ok(())
    }

    #[test]
    fn unbalanced_blocks_are_rejected() {
        let mut b = ScriptBuilder::new();
        b.if_start().nop();
        assert!(b.build().is_err());

        let mut b = ScriptBuilder::new();
        b.for_loop(2).end_if();
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("end_if"));
    }
}
