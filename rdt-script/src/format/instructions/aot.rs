//! Area-of-trigger (AOT) registrations: plain triggers, doors and item pickups.
//!
//! Each kind has a rectangle form and a four-point form (`*_4p`) sharing one payload type.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use super::Payload;
use crate::format::opcode::Opcode;

/// Scene type of an AOT that starts a script event when the player walks in.
pub const SCE_EVENT: u8 = 5;
pub const SCE_DOOR: u8 = 1;
pub const SCE_ITEM: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AotHeader {
    pub aot: u8,
    pub sce: u8,
    pub sat: u8,
    pub floor: u8,
    #[serde(rename = "super")]
    pub super_: u8,
}

impl AotHeader {
    fn read(cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            aot: cur.read_u8()?,
            sce: cur.read_u8()?,
            sat: cur.read_u8()?,
            floor: cur.read_u8()?,
            super_: cur.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AotZone {
    Rect { x: i16, z: i16, w: u16, d: u16 },
    Quad([[i16; 2]; 4]),
}

impl AotZone {
    fn read(opcode: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        if matches!(opcode, Opcode::AotSet4p | Opcode::DoorAotSet4p | Opcode::ItemAotSet4p) {
            let mut points = [[0i16; 2]; 4];
            for p in points.iter_mut() {
                p[0] = cur.read_i16::<LittleEndian>()?;
                p[1] = cur.read_i16::<LittleEndian>()?;
            }
            return Ok(AotZone::Quad(points));
        }

        Ok(AotZone::Rect {
            x: cur.read_i16::<LittleEndian>()?,
            z: cur.read_i16::<LittleEndian>()?,
            w: cur.read_u16::<LittleEndian>()?,
            d: cur.read_u16::<LittleEndian>()?,
        })
    }

    fn describe(&self) -> String {
        match self {
            AotZone::Rect { x, z, w, d } => format!("rect=[{x}, {z}, {w}, {d}]"),
            AotZone::Quad(points) => format!("quad={points:?}"),
        }
    }
}

/// `aot_set` / `aot_set_4p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AotSet {
    pub header: AotHeader,
    pub zone: AotZone,
    pub data: [u8; 6],
}

impl AotSet {
    /// The `evt_exec` instruction an event zone fires when the player enters it.
    ///
    /// `data[0]` is the thread, `data[3]` the event entry.
    pub fn event_trigger(&self) -> Option<[u8; 4]> {
        if self.header.sce != SCE_EVENT {
            return None;
        }
        Some([Opcode::EvtExec as u8, self.data[0], 0, self.data[3]])
    }
}

impl Payload for AotSet {
    fn read(opcode: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let header = AotHeader::read(cur)?;
        let zone = AotZone::read(opcode, cur)?;
        let mut data = [0u8; 6];
        cur.read_exact(&mut data)?;
        Ok(Self { header, zone, data })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("aot={}", self.header.aot),
            format!("sce={}", self.header.sce),
            self.zone.describe(),
            format!("data={:?}", self.data),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorDestination {
    pub position: [i16; 3],
    pub dir: i16,
    pub stage: u8,
    pub room: u8,
    pub camera: u8,
    pub floor: u8,
    pub texture: u8,
    pub door_type: u8,
    pub knock: u8,
    pub key_id: u8,
    pub key_type: u8,
    pub free: u8,
}

/// `door_aot_set` / `door_aot_set_4p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorAotSet {
    pub header: AotHeader,
    pub zone: AotZone,
    pub door: DoorDestination,
}

impl Payload for DoorAotSet {
    fn read(opcode: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let header = AotHeader::read(cur)?;
        let zone = AotZone::read(opcode, cur)?;
        let position = [
            cur.read_i16::<LittleEndian>()?,
            cur.read_i16::<LittleEndian>()?,
            cur.read_i16::<LittleEndian>()?,
        ];
        let door = DoorDestination {
            position,
            dir: cur.read_i16::<LittleEndian>()?,
            stage: cur.read_u8()?,
            room: cur.read_u8()?,
            camera: cur.read_u8()?,
            floor: cur.read_u8()?,
            texture: cur.read_u8()?,
            door_type: cur.read_u8()?,
            knock: cur.read_u8()?,
            key_id: cur.read_u8()?,
            key_type: cur.read_u8()?,
            free: cur.read_u8()?,
        };
        Ok(Self { header, zone, door })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("aot={}", self.header.aot),
            self.zone.describe(),
            format!("stage={}", self.door.stage),
            format!("room={:02X}", self.door.room),
            format!("camera={}", self.door.camera),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPickup {
    pub item_id: u16,
    pub amount: u16,
    pub flag: u16,
    pub md1: u8,
    pub action: u8,
}

/// `item_aot_set` / `item_aot_set_4p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAotSet {
    pub header: AotHeader,
    pub zone: AotZone,
    pub item: ItemPickup,
}

impl Payload for ItemAotSet {
    fn read(opcode: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let header = AotHeader::read(cur)?;
        let zone = AotZone::read(opcode, cur)?;
        let item = ItemPickup {
            item_id: cur.read_u16::<LittleEndian>()?,
            amount: cur.read_u16::<LittleEndian>()?,
            flag: cur.read_u16::<LittleEndian>()?,
            md1: cur.read_u8()?,
            action: cur.read_u8()?,
        };
        Ok(Self { header, zone, item })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("aot={}", self.header.aot),
            self.zone.describe(),
            format!("item={}", self.item.item_id),
            format!("amount={}", self.item.amount),
        ]
    }
}

/// `aot_reset`: rewrites the type and data of an already registered AOT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AotReset {
    pub aot: u8,
    pub sce: u8,
    pub sat: u8,
    pub data: [u8; 6],
}

impl Payload for AotReset {
    fn read(_: Opcode, cur: &mut Cursor<&[u8]>) -> io::Result<Self> {
        let aot = cur.read_u8()?;
        let sce = cur.read_u8()?;
        let sat = cur.read_u8()?;
        let mut data = [0u8; 6];
        cur.read_exact(&mut data)?;
        Ok(Self { aot, sce, sat, data })
    }

    fn operands(&self) -> Vec<String> {
        vec![
            format!("aot={}", self.aot),
            format!("sce={}", self.sce),
            format!("data={:?}", self.data),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_aot(opcode: Opcode) -> Vec<u8> {
        let mut raw = vec![0u8; opcode.size()];
        raw[0] = opcode as u8;
        raw[1] = 3; // aot id
        raw[2] = SCE_EVENT;
        let tail = opcode.size() - 6;
        raw[tail] = 0xff; // any thread
        raw[tail + 3] = 2; // event
        raw
    }

    #[test]
    fn rect_and_quad_forms() {
        let rect = AotSet::decode(&event_aot(Opcode::AotSet)).expect("aot_set");
        assert!(matches!(rect.zone, AotZone::Rect { .. }));
        let quad = AotSet::decode(&event_aot(Opcode::AotSet4p)).expect("aot_set_4p");
        assert!(matches!(quad.zone, AotZone::Quad(_)));
        assert_eq!(rect.data, quad.data);
    }

    #[test]
    fn event_zone_builds_trigger() {
        let aot = AotSet::decode(&event_aot(Opcode::AotSet)).expect("aot_set");
        assert_eq!(aot.event_trigger(), Some([0x04, 0xff, 0x00, 0x02]));

        let mut not_event = aot;
        not_event.header.sce = SCE_DOOR;
        assert_eq!(not_event.event_trigger(), None);
    }

    #[test]
    fn door_and_item_tails() {
        let mut raw = vec![0u8; Opcode::DoorAotSet.size()];
        raw[0] = Opcode::DoorAotSet as u8;
        raw[22] = 1; // stage
        raw[23] = 0x0a; // room
        let door = DoorAotSet::decode(&raw).expect("door");
        assert_eq!((door.door.stage, door.door.room), (1, 0x0a));

        let mut raw = vec![0u8; Opcode::ItemAotSet4p.size()];
        raw[0] = Opcode::ItemAotSet4p as u8;
        raw[22] = 0x2e; // item id
        raw[24] = 15; // amount
        let item = ItemAotSet::decode(&raw).expect("item");
        assert_eq!((item.item.item_id, item.item.amount), (0x2e, 15));
    }
}
