//! Fixed-layout payloads of the instructions the interpreter understands.
//!
//! Every payload is little-endian and starts right after the opcode byte.

pub mod aot;
pub mod control;
pub mod entity;
pub mod variable;

use std::io::{self, Cursor};

use byteorder::ReadBytesExt;

use crate::format::opcode::Opcode;

pub use aot::*;
pub use control::*;
pub use entity::*;
pub use variable::*;

/// A decodable instruction payload.
pub trait Payload: Sized {
    /// Read the payload. The cursor sits just past the opcode byte.
    fn read(opcode: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self>;

    /// Operands rendered for listings.
    fn operands(&self) -> Vec<String>;

    /// Decode a raw instruction, opcode byte included.
    fn decode(raw: &[u8]) -> io::Result<Self> {
        let mut cur = Cursor::new(raw);
        let byte = cur.read_u8()?;
        let opcode = Opcode::decode(byte)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("unknown opcode 0x{byte:02X}")))?;
        Self::read(opcode, &mut cur)
    }
}

pub(crate) fn skip(cur: &mut Cursor<&[u8]>, n: u64) -> io::Result<()> {
    let pos = cur.position() + n;
    if pos > cur.get_ref().len() as u64 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    cur.set_position(pos);
    Ok(())
}

type Listed = io::Result<(Vec<String>, usize)>;

fn listed<T: Payload>(opcode: Opcode, raw: &[u8]) -> Option<Listed> {
    let mut cur = Cursor::new(raw);
    let payload = skip(&mut cur, 1).and_then(|_| T::read(opcode, &mut cur));
    Some(payload.map(|p| (p.operands(), cur.position() as usize)))
}

/// Decoded operands of any instruction with a known payload layout.
///
/// `None` means the opcode has no decoder here (its bytes are still listed by callers),
/// or that `raw` is too short for it.
pub fn describe(opcode: Opcode, raw: &[u8]) -> Option<Vec<String>> {
    decode_operands(opcode, raw)?.ok().map(|(operands, _)| operands)
}

/// Operands of `raw` plus the number of bytes the payload reader consumed, opcode byte included.
///
/// `None` when the opcode has no decoder here.
pub fn decode_operands(opcode: Opcode, raw: &[u8]) -> Option<io::Result<(Vec<String>, usize)>> {
    match opcode {
        Opcode::EvtExec => listed::<EvtExec>(opcode, raw),
        Opcode::IfStart | Opcode::ElseStart => listed::<Block>(opcode, raw),
        Opcode::Sleep => listed::<Sleep>(opcode, raw),
        Opcode::Sleeping => listed::<Sleeping>(opcode, raw),
        Opcode::For => listed::<For>(opcode, raw),
        Opcode::Switch => listed::<Switch>(opcode, raw),
        Opcode::Case => listed::<Case>(opcode, raw),
        Opcode::Goto => listed::<Goto>(opcode, raw),
        Opcode::Gosub => listed::<Gosub>(opcode, raw),
        Opcode::Check => listed::<Check>(opcode, raw),
        Opcode::SetBit => listed::<SetBit>(opcode, raw),
        Opcode::Compare => listed::<Compare>(opcode, raw),
        Opcode::Save => listed::<Save>(opcode, raw),
        Opcode::Copy => listed::<CopyVariable>(opcode, raw),
        Opcode::Calc => listed::<Calc>(opcode, raw),
        Opcode::Calc2 => listed::<Calc2>(opcode, raw),
        Opcode::CutChg => listed::<CutChg>(opcode, raw),
        Opcode::WorkSet => listed::<WorkSetSelect>(opcode, raw),
        Opcode::PosSet => listed::<PosSet>(opcode, raw),
        Opcode::MemberSet => listed::<MemberSet>(opcode, raw),
        Opcode::MemberCmp => listed::<MemberCmp>(opcode, raw),
        Opcode::ScaIdSet => listed::<ScaIdSet>(opcode, raw),
        Opcode::ObjModelSet => listed::<ObjModelSet>(opcode, raw),
        Opcode::SceEsprOn => listed::<SceEsprOn>(opcode, raw),
        Opcode::SceEsprKill => listed::<SceEsprKill>(opcode, raw),
        Opcode::PlcMotion => listed::<PlcMotion>(opcode, raw),
        Opcode::PlcDest => listed::<PlcDest>(opcode, raw),
        Opcode::PlcNeck => listed::<PlcNeck>(opcode, raw),
        Opcode::SceEmSet => listed::<SceEmSet>(opcode, raw),
        Opcode::SceBgmControl => listed::<SceBgmControl>(opcode, raw),
        Opcode::AotSet | Opcode::AotSet4p => listed::<AotSet>(opcode, raw),
        Opcode::DoorAotSet | Opcode::DoorAotSet4p => listed::<DoorAotSet>(opcode, raw),
        Opcode::ItemAotSet | Opcode::ItemAotSet4p => listed::<ItemAotSet>(opcode, raw),
        Opcode::AotReset => listed::<AotReset>(opcode, raw),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_payload_consumes_its_declared_size() {
        let mut decoded = 0;
        for opcode in Opcode::iter() {
            let mut raw = vec![0u8; opcode.size()];
            raw[0] = opcode as u8;
            let Some(read) = decode_operands(opcode, &raw) else {
                continue;
            };
            let (_, consumed) = read.unwrap_or_else(|e| panic!("{opcode}: {e}"));
            assert_eq!(consumed, opcode.size(), "{opcode}");
            decoded += 1;
        }
        assert_eq!(decoded, 38);
    }

    #[test]
    fn describe_known_and_unknown() {
        assert_eq!(
            describe(Opcode::Compare, &[0x23, 0x00, 0x05, 0x03, 0xfe, 0xff]),
            Some(vec!["var=5".to_string(), "op=<".to_string(), "value=-2".to_string()])
        );
        assert_eq!(describe(Opcode::SeOn, &[0x36; 12]), None);
        // short buffer
        assert_eq!(describe(Opcode::Compare, &[0x23, 0x00]), None);
    }
}
