use std::io::{self, Cursor};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use super::{skip, Payload};
use crate::format::opcode::Opcode;

fn read_i16x3(cur: &mut Cursor<&[u8]>) -> io::Result<[i16; 3]> {
    Ok([
        cur.read_i16::<LittleEndian>()?,
        cur.read_i16::<LittleEndian>()?,
        cur.read_i16::<LittleEndian>()?,
    ])
}

fn read_u16x3(cur: &mut Cursor<&[u8]>) -> io::Result<[u16; 3]> {
    Ok([
        cur.read_u16::<LittleEndian>()?,
        cur.read_u16::<LittleEndian>()?,
        cur.read_u16::<LittleEndian>()?,
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutChg {
    pub camera: u8,
}

impl Payload for CutChg {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self { camera: cur.read_u8()? })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("camera={}", self.camera)]
    }
}

/// `work_set`: selects the entity later member/position writes go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSetSelect {
    pub component: u8,
    pub index: u8,
}

impl Payload for WorkSetSelect {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            component: cur.read_u8()?,
            index: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("component={}", self.component), format!("index={}", self.index)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSet {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Payload for PosSet {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        let [x, y, z] = read_i16x3(cur)?;
        Ok(Self { x, y, z })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("x={}", self.x), format!("y={}", self.y), format!("z={}", self.z)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSet {
    pub member: u8,
    pub value: i16,
}

impl MemberSet {
    /// Member index holding the Y rotation.
    pub const ROTATION: u8 = 15;

    /// Rotation in degrees, from the 4096-per-turn fixed point unit.
    pub fn degrees(&self) -> f32 {
        (self.value as f32 / 4096.0) * 360.0
    }
}

impl Payload for MemberSet {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            member: cur.read_u8()?,
            value: cur.read_i16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("member={}", self.member), format!("value={}", self.value)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCmp {
    pub member: u8,
    pub operation: u8,
    pub value: i16,
}

impl Payload for MemberCmp {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            member: cur.read_u8()?,
            operation: cur.read_u8()?,
            value: cur.read_i16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("member={}", self.member),
            format!("op={}", super::compare_symbol(self.operation)),
            format!("value={}", self.value),
        ]
    }
}

/// `sca_id_set`: flag 0 removes collision entity `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaIdSet {
    pub id: u8,
    pub flag: u16,
}

impl Payload for ScaIdSet {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            id: cur.read_u8()?,
            flag: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("id={}", self.id), format!("flag={}", self.flag)]
    }
}

/// `obj_model_set`: places one room object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjModelSet {
    pub index: u8,
    pub id: u8,
    pub counter: u8,
    pub wait: u8,
    pub num: u8,
    pub floor: u8,
    pub flag0: u8,
    pub kind: u16,
    pub flag1: u16,
    pub attribute: i16,
    pub position: [i16; 3],
    pub direction: [i16; 3],
    pub offset: [i16; 3],
    pub dimensions: [u16; 3],
}

impl Payload for ObjModelSet {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            index: cur.read_u8()?,
            id: cur.read_u8()?,
            counter: cur.read_u8()?,
            wait: cur.read_u8()?,
            num: cur.read_u8()?,
            floor: cur.read_u8()?,
            flag0: cur.read_u8()?,
            kind: cur.read_u16::<LittleEndian>()?,
            flag1: cur.read_u16::<LittleEndian>()?,
            attribute: cur.read_i16::<LittleEndian>()?,
            position: read_i16x3(cur)?,
            direction: read_i16x3(cur)?,
            offset: read_i16x3(cur)?,
            dimensions: read_u16x3(cur)?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("index={}", self.index),
            format!("id={}", self.id),
            format!("position={:?}", self.position),
            format!("direction={:?}", self.direction),
        ]
    }
}

/// `sce_espr_on`: spawns a scripted effect sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceEsprOn {
    pub id: u8,
    pub kind: u8,
    pub work: u16,
    pub unknown: i16,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub dir_y: u16,
}

impl Payload for SceEsprOn {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        let id = cur.read_u8()?;
        let kind = cur.read_u8()?;
        let work = cur.read_u16::<LittleEndian>()?;
        let unknown = cur.read_i16::<LittleEndian>()?;
        let [x, y, z] = read_i16x3(cur)?;
        Ok(Self {
            id,
            kind,
            work,
            unknown,
            x,
            y,
            z,
            dir_y: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("id={}", self.id),
            format!("type={}", self.kind),
            format!("pos=[{}, {}, {}]", self.x, self.y, self.z),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceEsprKill {
    pub id: u8,
    pub kind: u8,
    pub work_kind: u8,
    pub work_no: i8,
}

impl Payload for SceEsprKill {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            id: cur.read_u8()?,
            kind: cur.read_u8()?,
            work_kind: cur.read_u8()?,
            work_no: cur.read_i8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("id={}", self.id), format!("type={}", self.kind)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlcMotion {
    pub action: u8,
    pub move_no: u8,
    pub flag: u8,
}

impl Payload for PlcMotion {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            action: cur.read_u8()?,
            move_no: cur.read_u8()?,
            flag: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("action={}", self.action), format!("move={}", self.move_no)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlcDest {
    pub action: u8,
    pub flag_no: u8,
    pub x: i16,
    pub z: i16,
}

impl Payload for PlcDest {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            action: cur.read_u8()?,
            flag_no: cur.read_u8()?,
            x: cur.read_i16::<LittleEndian>()?,
            z: cur.read_i16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("action={}", self.action), format!("x={}", self.x), format!("z={}", self.z)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlcNeck {
    pub operation: u8,
    pub target: [i16; 3],
    pub speed_x: i8,
    pub speed_z: i8,
}

impl Payload for PlcNeck {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            operation: cur.read_u8()?,
            target: read_i16x3(cur)?,
            speed_x: cur.read_i8()?,
            speed_z: cur.read_i8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("op={}", self.operation), format!("target={:?}", self.target)]
    }
}

/// `sce_em_set`: enemy spawn record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceEmSet {
    pub aot: u8,
    pub id: u8,
    pub kind: u16,
    pub floor: u8,
    pub sound_flag: u8,
    pub model_type: u8,
    pub em_set_flag: u8,
    pub position: [i16; 3],
    pub dir_y: u16,
    pub motion: u16,
    pub ctr_flag: u16,
}

impl Payload for SceEmSet {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        skip(cur, 1)?;
        Ok(Self {
            aot: cur.read_u8()?,
            id: cur.read_u8()?,
            kind: cur.read_u16::<LittleEndian>()?,
            floor: cur.read_u8()?,
            sound_flag: cur.read_u8()?,
            model_type: cur.read_u8()?,
            em_set_flag: cur.read_u8()?,
            position: read_i16x3(cur)?,
            dir_y: cur.read_u16::<LittleEndian>()?,
            motion: cur.read_u16::<LittleEndian>()?,
            ctr_flag: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("id={}", self.id),
            format!("type={}", self.kind),
            format!("position={:?}", self.position),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceBgmControl {
    pub id: u8,
    pub operation: u8,
    pub kind: u8,
    pub left_volume: u8,
    pub right_volume: u8,
}

impl Payload for SceBgmControl {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            id: cur.read_u8()?,
            operation: cur.read_u8()?,
            kind: cur.read_u8()?,
            left_volume: cur.read_u8()?,
            right_volume: cur.read_u8()?,
        })
    }

    fn operands(&self) -> Vec<String> {
        vec![format!("id={}", self.id), format!("op={}", self.operation)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_set_rotation_in_degrees() {
        let quarter = MemberSet::decode(&[0x34, 15, 0x00, 0x04]).expect("member_set");
        assert_eq!(quarter.member, MemberSet::ROTATION);
        assert_eq!(quarter.degrees(), 90.0);
    }

    #[test]
    fn obj_model_set_consumes_whole_payload() {
        let mut raw = vec![0u8; Opcode::ObjModelSet.size()];
        raw[0] = Opcode::ObjModelSet as u8;
        raw[1] = 7;
        // last dimension
        raw[36] = 0x10;
        let obj = ObjModelSet::decode(&raw).expect("obj_model_set");
        assert_eq!(obj.index, 7);
        assert_eq!(obj.dimensions, [0, 0, 0x10]);
    }

    #[test]
    fn fixed_layouts_fit_their_size() {
        let full = |op: Opcode| {
            let mut raw = vec![0u8; op.size()];
            raw[0] = op as u8;
            raw
        };
        assert!(SceEsprOn::decode(&full(Opcode::SceEsprOn)).is_ok());
        assert!(SceEmSet::decode(&full(Opcode::SceEmSet)).is_ok());
        assert!(PlcNeck::decode(&full(Opcode::PlcNeck)).is_ok());
        assert!(PlcDest::decode(&full(Opcode::PlcDest)).is_ok());
        assert!(SceBgmControl::decode(&full(Opcode::SceBgmControl)).is_ok());
        assert!(SceEsprKill::decode(&full(Opcode::SceEsprKill)).is_ok());
        assert!(PosSet::decode(&full(Opcode::PosSet)).is_ok());
        assert!(MemberCmp::decode(&full(Opcode::MemberCmp)).is_ok());
    }
}
