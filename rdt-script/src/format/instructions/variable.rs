use std::io::{self, Cursor};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use super::{skip, Payload};
use crate::format::opcode::Opcode;

/// Mnemonic of a `compare` / `member_cmp` operator.
pub fn compare_symbol(operation: u8) -> &'static str {
    match operation {
        0 => "==",
        1 => ">",
        2 => ">=",
        3 => "<",
        4 => "<=",
        5 => "!=",
        6 => "&",
        _ => "?",
    }
}

/// Mnemonic of a `calc` / `calc2` operator.
pub fn calc_symbol(operation: u8) -> &'static str {
    match operation {
        0 => "+",
        1 => "-",
        2 => "*",
        3 => "/",
        4 => "%",
        5 => "|",
        6 => "&",
        7 => "^",
        8 => "~",
        9 => "<<",
        10 => ">>",
        11 => ">>>",
        _ => "?",
    }
}

/// Mnemonic of a `set_bit` operation.
pub fn bit_operation_name(operation: u8) -> &'static str {
    match operation {
        0 => "clear",
        1 => "set",
        7 => "flip",
        _ => "?",
    }
}

/// `check`: test one bit of a flag array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub bit_array: u8,
    pub bit: u8,
    pub value: u8,
}

impl Payload for Check {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            bit_array: cur.read_u8()?,
            bit: cur.read_u8()?,
            value: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("array={}", self.bit_array),
            format!("bit={}", self.bit),
            format!("value={}", self.value),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBit {
    pub bit_array: u8,
    pub bit: u8,
    pub operation: u8,
}

impl Payload for SetBit {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            bit_array: cur.read_u8()?,
            bit: cur.read_u8()?,
            operation: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("array={}", self.bit_array),
            format!("bit={}", self.bit),
            format!("op={}", bit_operation_name(self.operation)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compare {
    pub var_id: u8,
    pub operation: u8,
    pub value: i16,
}

impl Payload for Compare {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            var_id: cur.read_u8()?,
            operation: cur.read_u8()?,
            value: cur.read_i16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("var={}", self.var_id),
            format!("op={}", compare_symbol(self.operation)),
            format!("value={}", self.value),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Save {
    pub var_id: u8,
    pub value: i16,
}

impl Payload for Save {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            var_id: cur.read_u8()?,
            value: cur.read_i16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("var={}", self.var_id), format!("value={}", self.value)]
    }
}

/// `copy`: `dest = source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyVariable {
    pub dest: u8,
    pub source: u8,
}

impl Payload for CopyVariable {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            dest: cur.read_u8()?,
            source: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("dest={}", self.dest), format!("source={}", self.source)]
    }
}

/// `calc`: `var = var <op> value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calc {
    pub operation: u8,
    pub var_id: u8,
    pub value: i16,
}

impl Payload for Calc {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            operation: cur.read_u8()?,
            var_id: cur.read_u8()?,
            value: cur.read_i16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("var={}", self.var_id),
            format!("op={}", calc_symbol(self.operation)),
            format!("value={}", self.value),
        ]
    }
}

/// `calc2`: `var = var <op> source_var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calc2 {
    pub operation: u8,
    pub var_id: u8,
    pub source_var_id: u8,
}

impl Payload for Calc2 {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            operation: cur.read_u8()?,
            var_id: cur.read_u8()?,
            source_var_id: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("var={}", self.var_id),
            format!("op={}", calc_symbol(self.operation)),
            format!("source={}", self.source_var_id),
        ]
    }
}
