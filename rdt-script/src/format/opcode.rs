use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

/// Every opcode of the room script language.
///
/// The discriminant is the opcode byte. Mnemonics come from `Display`.
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Display, IntoStaticStr, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Opcode {
    Nop = 0x00,
    EvtEnd,
    EvtNext,
    EvtChain,
    EvtExec,
    EvtKill,
    IfStart,
    ElseStart,
    EndIf,
    Sleep,
    Sleeping,
    Wsleep,
    Wsleeping,
    For,
    ForEnd,
    While,
    WhileEnd,
    Do,
    DoEnd,
    Switch,
    Case,
    Default,
    EndSwitch,
    Goto,
    Gosub,
    GosubReturn,
    Break,
    For2,
    BreakPoint,
    WorkCopy,
    #[strum(serialize = "nop_1e")]
    Nop1E,
    #[strum(serialize = "nop_1f")]
    Nop1F,
    #[strum(serialize = "nop_20")]
    Nop20,
    Check = 0x21,
    SetBit,
    Compare,
    Save,
    Copy,
    Calc,
    Calc2,
    SceRnd,
    CutChg,
    CutOld,
    MessageOn,
    AotSet = 0x2c,
    ObjModelSet,
    WorkSet,
    SpeedSet,
    AddSpeed,
    AddAspeed,
    PosSet = 0x32,
    DirSet,
    MemberSet,
    MemberSet2,
    SeOn,
    ScaIdSet,
    FlrSet,
    DirCk,
    SceEsprOn = 0x3a,
    DoorAotSet,
    CutAuto,
    MemberCopy,
    MemberCmp,
    PlcMotion,
    PlcDest = 0x40,
    PlcNeck,
    PlcRet,
    PlcFlg,
    SceEmSet,
    ColChgSet,
    AotReset,
    AotOn,
    SuperSet,
    SuperReset,
    PlcGun,
    CutReplace,
    SceEsprKill = 0x4c,
    DoorModelSet,
    ItemAotSet,
    SceKeyCk,
    SceTrgCk = 0x50,
    SceBgmControl,
    SceEsprControl,
    SceFadeSet,
    SceEspr3dOn,
    MemberCalc,
    MemberCalc2,
    SceBgmtblSet,
    PlcRot,
    XaOn,
    WeaponChg,
    PlcCnt,
    SceShakeOn,
    MizuDivSet,
    KeepItemCk,
    XaVol,
    KageSet = 0x60,
    CutBeSet,
    SceItemLost,
    PlcGunEff,
    SceEsprOn2,
    SceEsprKill2,
    PlcStop,
    #[strum(serialize = "aot_set_4p")]
    AotSet4p = 0x67,
    #[strum(serialize = "door_aot_set_4p")]
    DoorAotSet4p,
    #[strum(serialize = "item_aot_set_4p")]
    ItemAotSet4p,
    LightPosSet,
    LightKidoSet,
    RbjReset,
    SceScrMove,
    PartsSet,
    MovieOn,
    SplcRet = 0x70,
    SplcSce,
    SuperOn,
    MirrorSet,
    SceFadeAdjust,
    SceEspr3dOn2,
    SceItemGet,
    SceLineStart,
    SceLineMain,
    SceLineEnd,
    ScePartsBomb,
    ScePartsDown,
    LightColorSet,
    LightPosSet2,
    LightKidoSet2,
    LightColorSet2,
    SeVol = 0x80,
    SceItemCmp,
    SceEsprTask,
    PlcHeal,
    StMapHint,
    SceEmPosCk,
    PoisonCk,
    PoisonClr,
    SceItemLost2,
    EvtNext2,
    VloopSet,
    OtaBeSet,
    LineBegin,
    LineMain,
    LineEnd = 0x8e,
}

/// Number of opcodes in the table (`0x00..=0x8e`).
pub const OPCODE_COUNT: usize = 0x8f;

/// Encoded size of each instruction, opcode byte included.
#[rustfmt::skip]
static INSTRUCTION_SIZE: [u8; OPCODE_COUNT] = [
    // 0x00
    1, 2, 1, 4, 4, 2, 4, 4, 1, 4, 3, 1, 1, 6, 2, 4,
    // 0x10
    2, 4, 2, 4, 6, 2, 2, 6, 2, 2, 2, 6, 1, 4, 1, 1,
    // 0x20
    1, 4, 4, 6, 4, 3, 6, 4, 1, 2, 1, 6, 20, 38, 3, 4,
    // 0x30
    1, 1, 8, 8, 4, 3, 12, 4, 3, 8, 16, 32, 2, 3, 6, 4,
    // 0x40
    8, 10, 1, 4, 22, 5, 10, 2, 16, 8, 2, 3, 5, 22, 22, 4,
    // 0x50
    4, 6, 6, 6, 22, 6, 4, 8, 4, 4, 2, 2, 3, 2, 2, 2,
    // 0x60
    14, 4, 2, 1, 16, 2, 1, 28, 40, 30, 6, 4, 1, 4, 6, 2,
    // 0x70
    1, 1, 16, 8, 4, 22, 3, 4, 6, 1, 16, 16, 6, 6, 6, 6,
    // 0x80
    2, 3, 3, 1, 2, 6, 1, 1, 3, 1, 6, 6, 8, 24, 24,
];

impl Opcode {
    /// Map an opcode byte to its opcode, `None` if the byte is outside the table.
    #[inline]
    pub fn decode(byte: u8) -> Option<Self> {
        Self::from_repr(byte)
    }

    /// Fixed encoded size of this instruction in bytes.
    #[inline]
    pub fn size(self) -> usize {
        INSTRUCTION_SIZE[self as usize] as usize
    }

    pub fn mnemonic(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn table_covers_every_byte_in_range() {
        for byte in 0..=u8::MAX {
            let op = Opcode::decode(byte);
            if (byte as usize) < OPCODE_COUNT {
                let op = op.unwrap_or_else(|| panic!("0x{byte:02x} missing"));
                assert_eq!(op as u8, byte);
            } else {
                assert!(op.is_none(), "0x{byte:02x} should be unknown");
            }
        }
        assert_eq!(Opcode::iter().count(), OPCODE_COUNT);
    }

    #[test]
    fn sizes_match_payload_layouts() {
        assert_eq!(Opcode::EvtEnd.size(), 2);
        assert_eq!(Opcode::EvtExec.size(), 4);
        assert_eq!(Opcode::IfStart.size(), 4);
        assert_eq!(Opcode::EndIf.size(), 1);
        assert_eq!(Opcode::Sleep.size(), 4);
        assert_eq!(Opcode::Sleeping.size(), 3);
        assert_eq!(Opcode::For.size(), 6);
        assert_eq!(Opcode::Case.size(), 6);
        assert_eq!(Opcode::Compare.size(), 6);
        assert_eq!(Opcode::AotSet.size(), 20);
        assert_eq!(Opcode::ObjModelSet.size(), 38);
        assert_eq!(Opcode::DoorAotSet.size(), 32);
        assert_eq!(Opcode::ItemAotSet.size(), 22);
        assert_eq!(Opcode::AotSet4p.size(), 28);
        assert_eq!(Opcode::DoorAotSet4p.size(), 40);
        assert_eq!(Opcode::ItemAotSet4p.size(), 30);
        assert_eq!(Opcode::LineEnd.size(), 24);
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::EvtEnd.to_string(), "evt_end");
        assert_eq!(Opcode::SceBgmControl.mnemonic(), "sce_bgm_control");
        assert_eq!(Opcode::AotSet4p.mnemonic(), "aot_set_4p");
        assert_eq!(Opcode::Nop1E.mnemonic(), "nop_1e");
    }
}
