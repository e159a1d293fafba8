//! Instructions that reach out to the game and render collaborators.

use glam::Vec3;

use crate::error::Result;
use crate::format::instructions::{
    AotReset, AotSet, CutChg, DoorAotSet, ItemAotSet, MemberCmp, MemberSet, ObjModelSet, PlcDest, PlcMotion, PlcNeck,
    PosSet, ScaIdSet, SceBgmControl, SceEmSet, SceEsprKill, SceEsprOn, WorkSetSelect,
};
use crate::trace;
use crate::vm::handlers::{ExecCtx, Flow};
use crate::vm::thread::{WorkSet, WorkTarget};

pub fn cut_chg(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let cut = ctx.decode::<CutChg>(raw)?;
    trace::host(format_args!("change_camera {}", cut.camera));
    ctx.game().change_camera(cut.camera);
    Ok(Flow::Continue)
}

pub fn aot_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let aot = ctx.decode::<AotSet>(raw)?;
    trace::host(format_args!("register_aot {:?}", aot));
    ctx.game().register_aot(&aot);
    Ok(Flow::Continue)
}

pub fn door_aot_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let door = ctx.decode::<DoorAotSet>(raw)?;
    trace::host(format_args!("register_door {:?}", door));
    ctx.game().register_door(&door);
    Ok(Flow::Continue)
}

pub fn item_aot_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let item = ctx.decode::<ItemAotSet>(raw)?;
    trace::host(format_args!("register_item {:?}", item));
    ctx.game().register_item(&item);
    Ok(Flow::Continue)
}

pub fn aot_reset(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let reset = ctx.decode::<AotReset>(raw)?;
    ctx.game().reset_aot(&reset);
    Ok(Flow::Continue)
}

pub fn obj_model_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let model = ctx.decode::<ObjModelSet>(raw)?;
    trace::host(format_args!("set_item_entity {}", model.index));
    ctx.render().set_item_entity(&model);
    Ok(Flow::Continue)
}

pub fn work_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let select = ctx.decode::<WorkSetSelect>(raw)?;
    ctx.thread_mut().set_work_set(WorkSet {
        component: select.component,
        index: select.index,
    });
    Ok(Flow::Continue)
}

/// Only the player can be moved so far.
pub fn pos_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let pos = ctx.decode::<PosSet>(raw)?;
    match ctx.thread().work_set().target() {
        WorkTarget::Player => {
            let position = Vec3::new(pos.x as f32, pos.y as f32, pos.z as f32);
            trace::host(format_args!("set_player_position {}", position));
            ctx.game().set_player_position(position);
        }
        other => trace::host(format_args!("pos_set on {:?} unsupported, ignored", other)),
    }
    Ok(Flow::Continue)
}

/// Only the rotation member of the player and of room objects is wired.
pub fn member_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let member = ctx.decode::<MemberSet>(raw)?;
    let target = ctx.thread().work_set().target();

    match (target, member.member) {
        (WorkTarget::Player, MemberSet::ROTATION) => ctx.game().set_player_rotation(member.degrees()),
        (WorkTarget::Object(index), MemberSet::ROTATION) => ctx.render().set_model_rotation(index, member.degrees()),
        (target, index) => trace::host(format_args!("member_set {} on {:?} unsupported, ignored", index, target)),
    }
    Ok(Flow::Continue)
}

/// Decoded only; member tests always pass.
pub fn member_cmp(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    ctx.decode::<MemberCmp>(raw)?;
    Ok(Flow::Continue)
}

pub fn sca_id_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let sca = ctx.decode::<ScaIdSet>(raw)?;
    if sca.flag == 0 {
        trace::host(format_args!("remove_collision_entity {}", sca.id));
        ctx.game().remove_collision_entity(sca.id);
    }
    Ok(Flow::Continue)
}

pub fn sce_espr_on(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let sprite = ctx.decode::<SceEsprOn>(raw)?;
    trace::host(format_args!("add_sprite {}", sprite.id));
    ctx.game().add_script_sprite(&sprite);
    ctx.render().add_sprite(&sprite);
    Ok(Flow::Continue)
}

pub fn sce_espr_kill(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let kill = ctx.decode::<SceEsprKill>(raw)?;
    ctx.game().kill_script_sprite(&kill);
    Ok(Flow::Continue)
}

pub fn plc_motion(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let motion = ctx.decode::<PlcMotion>(raw)?;
    ctx.game().player_motion(&motion);
    Ok(Flow::Continue)
}

pub fn plc_dest(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let dest = ctx.decode::<PlcDest>(raw)?;
    ctx.game().player_destination(&dest);
    Ok(Flow::Continue)
}

pub fn plc_neck(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let neck = ctx.decode::<PlcNeck>(raw)?;
    ctx.game().player_neck(&neck);
    Ok(Flow::Continue)
}

pub fn sce_em_set(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let enemy = ctx.decode::<SceEmSet>(raw)?;
    ctx.game().spawn_enemy(&enemy);
    Ok(Flow::Continue)
}

pub fn sce_bgm_control(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let bgm = ctx.decode::<SceBgmControl>(raw)?;
    ctx.game().bgm_control(&bgm);
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::opcode::Opcode;
    use crate::vm::handlers::testing::Rig;

    #[test]
    fn member_set_follows_work_set() -> Result<()> {
        let mut rig = Rig::new(vec![
            0x2e, 0x01, 0x00, // work_set player
            0x34, 15, 0x00, 0x08, // rotation 2048 -> 180 degrees
            0x2e, 0x04, 0x02, // work_set object 2
            0x34, 15, 0x00, 0x04, // rotation 1024 -> 90 degrees
            0x34, 3, 0x10, 0x00, // member 3: ignored
            0x2e, 0x03, 0x00, // work_set enemy
            0x34, 15, 0x00, 0x04, // ignored
        ]);
        for _ in 0..7 {
            assert_eq!(rig.step()?, Flow::Continue);
        }
        assert_eq!(rig.game.player.rotation, 180.0);
        assert_eq!(rig.render.rotations.get(&2), Some(&90.0));
        assert_eq!(rig.render.rotations.len(), 1);
        Ok(())
    }

    #[test]
    fn pos_set_moves_only_the_player() -> Result<()> {
        let mut rig = Rig::new(vec![
            0x32, 0x00, 0x10, 0x00, 0x00, 0x00, 0xf0, 0xff, // pos_set with no work set
            0x2e, 0x01, 0x00, // work_set player
            0x32, 0x00, 0x10, 0x00, 0x00, 0x00, 0xf0, 0xff, // pos_set (16, 0, -16)
        ]);
        rig.step()?;
        assert_eq!(rig.game.player.position, Vec3::ZERO);
        rig.step()?;
        rig.step()?;
        assert_eq!(rig.game.player.position, Vec3::new(16.0, 0.0, -16.0));
        Ok(())
    }

    #[test]
    fn sca_id_set_removes_on_flag_zero() -> Result<()> {
        let mut rig = Rig::new(vec![0x37, 0x05, 0x01, 0x00, 0x37, 0x06, 0x00, 0x00]);
        rig.step()?;
        rig.step()?;
        assert_eq!(rig.game.removed_collisions, vec![6]);
        Ok(())
    }

    #[test]
    fn sprite_goes_to_both_collaborators() -> Result<()> {
        let mut code = vec![0u8; Opcode::SceEsprOn.size()];
        code[0] = Opcode::SceEsprOn as u8;
        code[2] = 9;
        let mut rig = Rig::new(code);
        rig.step()?;
        assert_eq!(rig.game.sprites.len(), 1);
        assert_eq!(rig.render.sprites.len(), 1);
        assert_eq!(rig.render.sprites[0].id, 9);
        Ok(())
    }

    #[test]
    fn cut_chg_and_obj_model_set() -> Result<()> {
        let mut code = vec![0x29, 0x04];
        let mut model = vec![0u8; Opcode::ObjModelSet.size()];
        model[0] = Opcode::ObjModelSet as u8;
        model[1] = 3;
        code.extend(model);
        let mut rig = Rig::new(code);
        rig.step()?;
        rig.step()?;
        assert_eq!(rig.game.camera, 4);
        assert!(rig.render.items.contains_key(&3));
        Ok(())
    }
}
