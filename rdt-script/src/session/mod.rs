//! An in-memory game session the interpreter can run against.
//!
//! Nothing here renders or simulates; it records what scripts asked for so a headless
//! runner (or a test) can inspect it afterwards.

pub mod flags;

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::format::instructions::{
    AotReset, AotSet, DoorAotSet, ItemAotSet, ObjModelSet, SceBgmControl, SceEmSet, SceEsprKill, SceEsprOn,
};
use crate::host::{GameState, RenderState};

pub use flags::FlagManager;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vec3,
    /// Degrees.
    pub rotation: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomSession {
    pub flags: FlagManager,
    pub variables: BTreeMap<u8, i32>,
    pub camera: u8,
    pub player: PlayerState,
    pub aots: Vec<AotSet>,
    pub doors: Vec<DoorAotSet>,
    pub items: Vec<ItemAotSet>,
    pub removed_collisions: Vec<u8>,
    pub sprites: Vec<SceEsprOn>,
    pub killed_sprites: Vec<SceEsprKill>,
    pub enemies: Vec<SceEmSet>,
    pub bgm: Vec<SceBgmControl>,
}

impl RoomSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything the previous room registered, its music requests included.
    /// Flags and variables survive.
    pub fn leave_room(&mut self) {
        self.aots.clear();
        self.doors.clear();
        self.items.clear();
        self.removed_collisions.clear();
        self.sprites.clear();
        self.killed_sprites.clear();
        self.enemies.clear();
        self.bgm.clear();
    }

    pub fn aot(&self, id: u8) -> Option<&AotSet> {
        self.aots.iter().rev().find(|a| a.header.aot == id)
    }

    /// The `evt_exec` instruction registered AOT `id` fires, if it is an event zone.
    pub fn event_trigger(&self, id: u8) -> Option<[u8; 4]> {
        self.aot(id).and_then(AotSet::event_trigger)
    }
}

impl GameState for RoomSession {
    fn bit(&self, array: u8, bit: u8) -> bool {
        self.flags.get_flag(array, bit)
    }

    fn set_bit(&mut self, array: u8, bit: u8, on: bool) {
        self.flags.set_flag(array, bit, on);
    }

    fn variable(&self, id: u8) -> i32 {
        self.variables.get(&id).copied().unwrap_or(0)
    }

    fn set_variable(&mut self, id: u8, value: i32) {
        self.variables.insert(id, value);
    }

    fn change_camera(&mut self, camera: u8) {
        self.camera = camera;
    }

    fn set_player_position(&mut self, position: Vec3) {
        self.player.position = position;
    }

    fn set_player_rotation(&mut self, degrees: f32) {
        self.player.rotation = degrees;
    }

    fn remove_collision_entity(&mut self, id: u8) {
        if !self.removed_collisions.contains(&id) {
            self.removed_collisions.push(id);
        }
    }

    fn register_aot(&mut self, aot: &AotSet) {
        self.aots.push(*aot);
    }

    fn register_door(&mut self, door: &DoorAotSet) {
        self.doors.push(*door);
    }

    fn register_item(&mut self, item: &ItemAotSet) {
        self.items.push(*item);
    }

    fn reset_aot(&mut self, reset: &AotReset) {
        for aot in self.aots.iter_mut().filter(|a| a.header.aot == reset.aot) {
            aot.header.sce = reset.sce;
            aot.header.sat = reset.sat;
            aot.data = reset.data;
        }
    }

    fn add_script_sprite(&mut self, sprite: &SceEsprOn) {
        self.sprites.push(*sprite);
    }

    fn spawn_enemy(&mut self, enemy: &SceEmSet) {
        self.enemies.push(*enemy);
    }

    fn kill_script_sprite(&mut self, kill: &SceEsprKill) {
        self.killed_sprites.push(*kill);
    }

    fn bgm_control(&mut self, bgm: &SceBgmControl) {
        self.bgm.push(*bgm);
    }
}

/// Render-side record: placed object models, their rotations and sprites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecorder {
    pub items: BTreeMap<u8, ObjModelSet>,
    pub rotations: BTreeMap<u8, f32>,
    pub sprites: Vec<SceEsprOn>,
}

impl RenderState for SceneRecorder {
    fn set_item_entity(&mut self, model: &ObjModelSet) {
        self.items.insert(model.index, *model);
    }

    fn set_model_rotation(&mut self, index: u8, degrees: f32) {
        if !self.items.contains_key(&index) {
            log::debug!("rotation set on unplaced model {}", index);
        }
        self.rotations.insert(index, degrees);
    }

    fn add_sprite(&mut self, sprite: &SceEsprOn) {
        self.sprites.push(*sprite);
    }
}
