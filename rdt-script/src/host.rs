//! What the interpreter needs from the game it runs in.
//!
//! Handlers only ever reach game and render state through these two traits.
//! The hooks with default bodies belong to instructions the interpreter decodes
//! but does not act on yet; a host that cares can override them.

use glam::Vec3;

use crate::format::instructions::{
    AotReset, AotSet, DoorAotSet, ItemAotSet, ObjModelSet, PlcDest, PlcMotion, PlcNeck, SceBgmControl, SceEmSet,
    SceEsprKill, SceEsprOn,
};

pub trait GameState {
    fn bit(&self, array: u8, bit: u8) -> bool;
    fn set_bit(&mut self, array: u8, bit: u8, on: bool);

    fn variable(&self, id: u8) -> i32;
    fn set_variable(&mut self, id: u8, value: i32);

    fn change_camera(&mut self, camera: u8);

    fn set_player_position(&mut self, position: Vec3);
    /// Rotation in degrees.
    fn set_player_rotation(&mut self, degrees: f32);

    fn remove_collision_entity(&mut self, id: u8);

    fn register_aot(&mut self, aot: &AotSet);
    fn register_door(&mut self, door: &DoorAotSet);
    fn register_item(&mut self, item: &ItemAotSet);
    fn reset_aot(&mut self, reset: &AotReset);

    fn add_script_sprite(&mut self, sprite: &SceEsprOn);

    fn player_motion(&mut self, _motion: &PlcMotion) {}
    fn player_destination(&mut self, _dest: &PlcDest) {}
    fn player_neck(&mut self, _neck: &PlcNeck) {}
    fn spawn_enemy(&mut self, _enemy: &SceEmSet) {}
    fn kill_script_sprite(&mut self, _kill: &SceEsprKill) {}
    fn bgm_control(&mut self, _bgm: &SceBgmControl) {}
}

pub trait RenderState {
    fn set_item_entity(&mut self, model: &ObjModelSet);
    /// Rotation of room object model `index`, in degrees.
    fn set_model_rotation(&mut self, index: u8, degrees: f32);
    fn add_sprite(&mut self, sprite: &SceEsprOn);
}
