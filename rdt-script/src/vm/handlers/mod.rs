//! Instruction handlers and the opcode -> handler table.

pub mod control;
pub mod scene;
pub mod state;

use crate::error::{Result, ScriptFault};
use crate::format::instructions::Payload;
use crate::format::opcode::{Opcode, OPCODE_COUNT};
use crate::format::stream::ScriptStream;
use crate::host::{GameState, RenderState};
use crate::vm::thread::ScriptThread;

/// What the dispatcher does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep executing linearly.
    Continue,
    /// Leave the innermost if block (a condition failed, or a block ended).
    Unwind,
    /// Stop this thread until the next tick.
    Halt,
}

impl Flow {
    pub fn from_condition(passed: bool) -> Self {
        if passed {
            Flow::Continue
        } else {
            Flow::Unwind
        }
    }
}

/// Everything a handler may touch while it runs.
pub struct ExecCtx<'a> {
    pub(crate) threads: &'a mut [ScriptThread],
    pub(crate) current: usize,
    pub(crate) stream: &'a ScriptStream,
    pub(crate) game: &'a mut dyn GameState,
    pub(crate) render: &'a mut dyn RenderState,
}

impl<'a> ExecCtx<'a> {
    pub fn new(
        threads: &'a mut [ScriptThread],
        current: usize,
        stream: &'a ScriptStream,
        game: &'a mut dyn GameState,
        render: &'a mut dyn RenderState,
    ) -> Self {
        Self {
            threads,
            current,
            stream,
            game,
            render,
        }
    }

    /// Index of the thread being dispatched.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn thread(&self) -> &ScriptThread {
        &self.threads[self.current]
    }

    pub fn thread_mut(&mut self) -> &mut ScriptThread {
        &mut self.threads[self.current]
    }

    pub fn threads_mut(&mut self) -> &mut [ScriptThread] {
        &mut *self.threads
    }

    pub fn stream(&self) -> &'a ScriptStream {
        self.stream
    }

    pub fn game(&mut self) -> &mut dyn GameState {
        &mut *self.game
    }

    pub fn render(&mut self) -> &mut dyn RenderState {
        &mut *self.render
    }

    pub fn pc(&self) -> usize {
        self.thread().pc()
    }

    /// Decode the payload of the instruction being executed.
    pub fn decode<T: Payload>(&self, raw: &[u8]) -> Result<T> {
        decode_at(raw, self.pc())
    }
}

/// Decode `raw`, reporting a short buffer as a truncated instruction at `pc`.
pub fn decode_at<T: Payload>(raw: &[u8], pc: usize) -> Result<T> {
    T::decode(raw).map_err(|_| match raw.first().copied().and_then(Opcode::decode) {
        Some(opcode) => ScriptFault::TruncatedInstruction {
            opcode,
            pc,
            len: raw.len(),
        },
        None => ScriptFault::UnknownOpcode {
            opcode: raw.first().copied().unwrap_or_default(),
            pc,
        },
    })
}

/// A handler: runs one instruction (`raw`, opcode byte included) against the context.
pub type Handler = fn(&mut ExecCtx<'_>, &[u8]) -> Result<Flow>;

fn pass_through(_: &mut ExecCtx<'_>, _: &[u8]) -> Result<Flow> {
    Ok(Flow::Continue)
}

/// Maps every opcode to its handler. Opcodes without one just fall through.
#[derive(Clone)]
pub struct HandlerTable {
    handlers: [Handler; OPCODE_COUNT],
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl HandlerTable {
    /// A table where every opcode is a no-op.
    pub fn empty() -> Self {
        Self {
            handlers: [pass_through as Handler; OPCODE_COUNT],
        }
    }

    pub fn standard() -> Self {
        let mut table = Self::empty();

        table.set(Opcode::EvtEnd, control::evt_end);
        table.set(Opcode::EvtExec, control::evt_exec);
        table.set(Opcode::IfStart, control::if_start);
        table.set(Opcode::ElseStart, control::else_start);
        table.set(Opcode::EndIf, control::end_if);
        table.set(Opcode::Sleep, control::sleep);
        table.set(Opcode::Sleeping, control::sleeping);
        table.set(Opcode::For, control::for_start);
        table.set(Opcode::ForEnd, control::for_end);
        table.set(Opcode::Switch, control::switch);
        table.set(Opcode::EndSwitch, control::end_switch);
        table.set(Opcode::Goto, control::goto);
        table.set(Opcode::Gosub, control::gosub);
        table.set(Opcode::Break, control::break_loop);

        table.set(Opcode::Check, state::check);
        table.set(Opcode::SetBit, state::set_bit);
        table.set(Opcode::Compare, state::compare);
        table.set(Opcode::Save, state::save);
        table.set(Opcode::Copy, state::copy);
        table.set(Opcode::Calc, state::calc);
        table.set(Opcode::Calc2, state::calc2);

        table.set(Opcode::CutChg, scene::cut_chg);
        table.set(Opcode::AotSet, scene::aot_set);
        table.set(Opcode::AotSet4p, scene::aot_set);
        table.set(Opcode::ObjModelSet, scene::obj_model_set);
        table.set(Opcode::WorkSet, scene::work_set);
        table.set(Opcode::PosSet, scene::pos_set);
        table.set(Opcode::MemberSet, scene::member_set);
        table.set(Opcode::ScaIdSet, scene::sca_id_set);
        table.set(Opcode::SceEsprOn, scene::sce_espr_on);
        table.set(Opcode::DoorAotSet, scene::door_aot_set);
        table.set(Opcode::DoorAotSet4p, scene::door_aot_set);
        table.set(Opcode::MemberCmp, scene::member_cmp);
        table.set(Opcode::PlcMotion, scene::plc_motion);
        table.set(Opcode::PlcDest, scene::plc_dest);
        table.set(Opcode::PlcNeck, scene::plc_neck);
        table.set(Opcode::SceEmSet, scene::sce_em_set);
        table.set(Opcode::AotReset, scene::aot_reset);
        table.set(Opcode::SceEsprKill, scene::sce_espr_kill);
        table.set(Opcode::ItemAotSet, scene::item_aot_set);
        table.set(Opcode::ItemAotSet4p, scene::item_aot_set);
        table.set(Opcode::SceBgmControl, scene::sce_bgm_control);

        table
    }

    pub fn set(&mut self, opcode: Opcode, handler: Handler) {
        self.handlers[opcode as usize] = handler;
    }

    pub fn get(&self, opcode: Opcode) -> Handler {
        self.handlers[opcode as usize]
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::session::{RoomSession, SceneRecorder};

    /// Owns everything an [`ExecCtx`] borrows, for driving single handlers.
    pub struct Rig {
        pub threads: Vec<ScriptThread>,
        pub stream: ScriptStream,
        pub game: RoomSession,
        pub render: SceneRecorder,
    }

    impl Rig {
        pub fn new(code: Vec<u8>) -> Self {
            let stream = ScriptStream::from_parts(code, vec![0]).expect("entry 0 in range");
            let mut threads = (0..4).map(ScriptThread::new).collect::<Vec<_>>();
            threads[0].activate(0);
            Self {
                threads,
                stream,
                game: RoomSession::default(),
                render: SceneRecorder::default(),
            }
        }

        /// Run the handler registered for the instruction at the current pc.
        pub fn step(&mut self) -> Result<Flow> {
            let pc = self.threads[0].pc();
            let (opcode, raw) = self.stream.fetch(pc)?;
            let handler = HandlerTable::standard().get(opcode);
            let mut ctx = ExecCtx::new(&mut self.threads, 0, &self.stream, &mut self.game, &mut self.render);
            ctx.thread_mut().clear_override();
            let flow = handler(&mut ctx, raw)?;
            if !ctx.thread().overridden() {
                ctx.thread_mut().advance(opcode.size());
            }
            Ok(flow)
        }
    }
}
