use std::io::{self, Cursor};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use super::{skip, Payload};
use crate::format::opcode::Opcode;

/// `evt_exec`: start entry `event` on a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvtExec {
    /// Explicit thread index. Out of range means "first idle thread".
    pub thread: u8,
    pub ex_opcode: u8,
    pub event: u8,
}

impl EvtExec {
    pub fn encode(&self) -> [u8; 4] {
        [Opcode::EvtExec as u8, self.thread, self.ex_opcode, self.event]
    }
}

impl Payload for EvtExec {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            thread: cur.read_u8()?,
            ex_opcode: cur.read_u8()?,
            event: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("thread={}", self.thread), format!("event={}", self.event)]
    }
}

/// `if_start` / `else_start` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_length: u16,
}

impl Payload for Block {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            block_length: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("len={}", self.block_length)]
    }
}

/// `sleep`. Byte 1 is an embedded `sleeping` opcode, so `pc + 1` decodes as [`Sleeping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sleep {
    pub count: u16,
}

impl Payload for Sleep {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            count: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("ticks={}", self.count)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sleeping {
    pub count: u16,
}

impl Payload for Sleeping {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            count: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("ticks={}", self.count)]
    }
}

/// `for`: the block spans the body and its closing `for_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct For {
    pub block_length: u16,
    pub count: u16,
}

impl Payload for For {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            block_length: cur.read_u16::<LittleEndian>()?,
            count: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("len={}", self.block_length), format!("count={}", self.count)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub var_id: u8,
    pub block_length: u16,
}

impl Payload for Switch {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            var_id: cur.read_u8()?,
            block_length: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("var={}", self.var_id), format!("len={}", self.block_length)]
    }
}

/// `case`: `block_length` covers the case body, so the next arm is at `pc + 6 + block_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub block_length: u16,
    pub value: u16,
}

impl Payload for Case {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            block_length: cur.read_u16::<LittleEndian>()?,
            value: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("len={}", self.block_length), format!("value={}", self.value)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goto {
    pub if_else_counter: i8,
    pub loop_level: i8,
    pub offset: i16,
}

impl Payload for Goto {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let if_else_counter = cur.read_i8()?;
        let loop_level = cur.read_i8()?;
        skip(cur, 1)?;
        Ok(Self {
            if_else_counter,
            loop_level,
            offset: cur.read_i16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("if_counter={}", self.if_else_counter),
            format!("loop_level={}", self.loop_level),
            format!("offset={}", self.offset),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gosub {
    pub event: u8,
}

impl Payload for Gosub {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self { event: cur.read_u8()? })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("event={}", self.event)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goto_layout_skips_padding() {
        let goto = Goto::decode(&[0x17, 0xff, 0x02, 0x00, 0xf6, 0xff]).expect("goto");
        assert_eq!(
            goto,
            Goto {
                if_else_counter: -1,
                loop_level: 2,
                offset: -10
            }
        );
    }

    #[test]
    fn sleep_reads_count_after_embedded_opcode() {
        let raw = [0x09, 0x0a, 0x2c, 0x01];
        assert_eq!(Sleep::decode(&raw).expect("sleep").count, 300);
        assert_eq!(Sleeping::decode(&raw[1..]).expect("sleeping").count, 300);
    }

    #[test]
    fn evt_exec_encodes_what_it_decodes() {
        let raw = [0x04, 0xff, 0x00, 0x03];
        let exec = EvtExec::decode(&raw).expect("evt_exec");
        assert_eq!(exec.thread, 0xff);
        assert_eq!(exec.event, 3);
        assert_eq!(exec.encode(), raw);
    }
}
