use crate::config::EngineConfig;
use crate::error::{Result, ScriptFault};
use crate::format::instructions::EvtExec;
use crate::format::opcode::Opcode;
use crate::format::stream::ScriptStream;
use crate::host::{GameState, RenderState};
use crate::trace;
use crate::vm::handlers::{control, decode_at, ExecCtx, Flow, Handler, HandlerTable};
use crate::vm::thread::ScriptThread;

pub const DEFAULT_THREAD_COUNT: usize = 20;
pub const DEFAULT_TICK_INTERVAL: f64 = 1.0 / 30.0;

/// Owns the script thread pool and runs it at a fixed tick rate.
pub struct ScriptEngine {
    threads: Vec<ScriptThread>,
    handlers: HandlerTable,
    accumulator: f64,
    tick_interval: f64,
    instruction_budget: Option<usize>,
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self {
            threads: (0..DEFAULT_THREAD_COUNT).map(ScriptThread::new).collect(),
            handlers: HandlerTable::standard(),
            accumulator: 0.0,
            tick_interval: DEFAULT_TICK_INTERVAL,
            instruction_budget: None,
        }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            threads: (0..config.thread_count).map(ScriptThread::new).collect(),
            handlers: HandlerTable::standard(),
            accumulator: 0.0,
            tick_interval: config.tick_interval(),
            instruction_budget: config.instruction_budget,
        }
    }

    /// Mark every thread idle. Control state is rebuilt when a thread is next activated.
    pub fn reset(&mut self) {
        for thread in self.threads.iter_mut() {
            thread.reset();
        }
    }

    pub fn threads(&self) -> &[ScriptThread] {
        &self.threads
    }

    pub fn thread(&self, index: usize) -> Result<&ScriptThread> {
        self.threads
            .get(index)
            .ok_or(ScriptFault::InvalidThread { thread: index })
    }

    pub fn accumulated_time(&self) -> f64 {
        self.accumulator
    }

    pub fn tick_interval(&self) -> f64 {
        self.tick_interval
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    pub fn register_handler(&mut self, opcode: Opcode, handler: Handler) {
        self.handlers.set(opcode, handler);
    }

    /// Schedule `thread` at entry point `entry` of `stream`.
    pub fn init_script(&mut self, stream: &ScriptStream, thread: usize, entry: usize) -> Result<()> {
        let pc = stream.entry(entry)?;
        let target = self
            .threads
            .get_mut(thread)
            .ok_or(ScriptFault::InvalidThread { thread })?;
        target.activate(pc);
        log::debug!("thread {} initialised at entry {} (0x{:X})", thread, entry, pc);
        Ok(())
    }

    /// Run one `evt_exec` instruction on behalf of the game, e.g. when the player walks into an event zone.
    ///
    /// Returns the thread that took the event. `raw` must be an `evt_exec` instruction.
    pub fn evt_exec(&mut self, raw: &[u8], stream: &ScriptStream) -> Result<usize> {
        if let Some(&opcode) = raw.first().filter(|&&b| b != Opcode::EvtExec as u8) {
            return Err(ScriptFault::UnknownOpcode { opcode, pc: 0 });
        }
        let exec = decode_at::<EvtExec>(raw, 0)?;
        control::schedule_event(&mut self.threads, &exec, stream)
    }

    /// Add `elapsed` seconds and run one pass over the pool once more than a tick has accumulated.
    ///
    /// Returns whether a pass ran.
    pub fn run_script(
        &mut self,
        stream: &ScriptStream,
        elapsed: f64,
        game: &mut dyn GameState,
        render: &mut dyn RenderState,
    ) -> Result<bool> {
        self.accumulator += elapsed;
        if self.accumulator <= self.tick_interval {
            return Ok(false);
        }
        self.accumulator = 0.0;
        self.run_pass(stream, game, render)?;
        Ok(true)
    }

    /// One dispatch pass over every running thread, in index order, ignoring the tick gate.
    pub fn run_pass(
        &mut self,
        stream: &ScriptStream,
        game: &mut dyn GameState,
        render: &mut dyn RenderState,
    ) -> Result<()> {
        for index in 0..self.threads.len() {
            if self.threads[index].is_running() {
                self.run_thread(index, stream, &mut *game, &mut *render)?;
            }
        }
        Ok(())
    }

    /// Reset the pool, run the init script once, then schedule the room script's two threads.
    pub fn load_room(
        &mut self,
        init: &ScriptStream,
        room: &ScriptStream,
        game: &mut dyn GameState,
        render: &mut dyn RenderState,
    ) -> Result<()> {
        self.reset();
        self.init_script(init, 0, 0)?;
        self.run_pass(init, game, render)?;

        self.init_script(room, 0, 0)?;
        if room.entry_count() > 1 {
            self.init_script(room, 1, 1)?;
        } else {
            log::debug!("room script has a single entry, event thread left idle");
        }
        Ok(())
    }

    fn run_thread(
        &mut self,
        index: usize,
        stream: &ScriptStream,
        game: &mut dyn GameState,
        render: &mut dyn RenderState,
    ) -> Result<()> {
        let mut ctx = ExecCtx::new(&mut self.threads, index, stream, game, render);
        let result = dispatch(&self.handlers, self.instruction_budget, &mut ctx);
        if let Err(fault) = &result {
            ctx.thread_mut().halt();
            log::error!("script thread {} halted: {}", index, fault);
        }
        result
    }
}

/// Run the context's thread until it yields for this tick.
///
/// The inner loop executes linearly until a handler asks to stop. A stop that is not a halt
/// leaves the innermost if block and carries on at its end, as long as a block is open.
fn dispatch(handlers: &HandlerTable, budget: Option<usize>, ctx: &mut ExecCtx<'_>) -> Result<()> {
    let mut executed = 0usize;

    loop {
        let flow = loop {
            let pc = ctx.pc();
            let (opcode, raw) = ctx.stream().fetch(pc)?;

            if let Some(budget) = budget {
                if executed >= budget {
                    return Err(ScriptFault::InstructionBudgetExceeded {
                        thread: ctx.current(),
                        budget,
                    });
                }
            }
            executed += 1;

            trace::vm(format_args!("thread {} 0x{:04X}: {}", ctx.current(), pc, opcode));

            ctx.thread_mut().clear_override();
            let flow = handlers.get(opcode)(ctx, raw)?;

            let thread = ctx.thread_mut();
            if !thread.overridden() {
                thread.advance(opcode.size());
            }
            thread.clear_override();

            if flow != Flow::Continue {
                break flow;
            }
        };

        let thread = ctx.thread_mut();
        if flow == Flow::Halt || thread.level().if_else_counter < 0 {
            return Ok(());
        }

        let resume = thread.pop_block()?;
        trace::flow(format_args!("thread {}: leave block, resume at 0x{:X}", thread.id(), resume));
        thread.set_pc(resume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfigBuilder;
    use crate::session::{RoomSession, SceneRecorder};

    fn stream(code: Vec<u8>) -> ScriptStream {
        ScriptStream::from_parts(code, vec![0]).expect("entry 0 in range")
    }

    #[test]
    fn config_sizes_the_pool() {
        let config = EngineConfigBuilder::new()
            .with_thread_count(3)
            .with_ticks_per_second(10.0)
            .get();
        let engine = ScriptEngine::with_config(&config);
        assert_eq!(engine.threads().len(), 3);
        assert_eq!(engine.tick_interval(), 0.1);
        assert_eq!(engine.thread(3).err(), Some(ScriptFault::InvalidThread { thread: 3 }));
    }

    #[test]
    fn init_script_rejects_bad_indices() {
        let mut engine = ScriptEngine::new();
        let s = stream(vec![0x01, 0x00]);
        assert_eq!(engine.init_script(&s, 20, 0), Err(ScriptFault::InvalidThread { thread: 20 }));
        assert_eq!(engine.init_script(&s, 0, 1), Err(ScriptFault::UnknownEntry { entry: 1 }));
        assert!(engine.threads().iter().all(|t| !t.is_running()));
    }

    #[test]
    fn evt_exec_only_takes_evt_exec_instructions() {
        let mut engine = ScriptEngine::new();
        let s = ScriptStream::from_parts(vec![0x01, 0x00, 0x01, 0x00], vec![0, 2]).expect("entries in range");

        assert_eq!(
            engine.evt_exec(&[0x00, 0x01, 0x00, 0x01], &s),
            Err(ScriptFault::UnknownOpcode { opcode: 0x00, pc: 0 })
        );
        assert!(engine.threads().iter().all(|t| !t.is_running()));

        assert_eq!(engine.evt_exec(&[0x04, 0x01, 0x00, 0x01], &s), Ok(1));
        assert_eq!(engine.thread(1).map(ScriptThread::pc), Ok(2));
    }

    #[test]
    fn evt_end_at_top_level_idles_the_thread() -> Result<()> {
        let mut engine = ScriptEngine::new();
        let s = stream(vec![0x00, 0x01, 0x00]);
        let (mut game, mut render) = (RoomSession::new(), SceneRecorder::default());

        engine.init_script(&s, 0, 0)?;
        engine.run_pass(&s, &mut game, &mut render)?;
        let thread = engine.thread(0)?;
        assert!(!thread.is_running());
        assert_eq!(thread.pc(), 3);
        Ok(())
    }

    #[test]
    fn unknown_opcode_halts_and_reports() -> Result<()> {
        let mut engine = ScriptEngine::new();
        let s = stream(vec![0x00, 0xf0]);
        let (mut game, mut render) = (RoomSession::new(), SceneRecorder::default());

        engine.init_script(&s, 0, 0)?;
        assert_eq!(
            engine.run_pass(&s, &mut game, &mut render),
            Err(ScriptFault::UnknownOpcode { opcode: 0xf0, pc: 1 })
        );
        assert!(!engine.thread(0)?.is_running());
        Ok(())
    }

    #[test]
    fn running_off_the_end_is_a_fault() -> Result<()> {
        let mut engine = ScriptEngine::new();
        let s = stream(vec![0x00, 0x00]);
        let (mut game, mut render) = (RoomSession::new(), SceneRecorder::default());

        engine.init_script(&s, 0, 0)?;
        assert_eq!(
            engine.run_pass(&s, &mut game, &mut render),
            Err(ScriptFault::PcOutOfRange { pc: 2, len: 2 })
        );
        Ok(())
    }

    #[test]
    fn budget_stops_runaway_threads() -> Result<()> {
        let config = EngineConfigBuilder::new().with_instruction_budget(4).get();
        let mut engine = ScriptEngine::with_config(&config);
        let s = stream(vec![0x00; 16]);
        let (mut game, mut render) = (RoomSession::new(), SceneRecorder::default());

        engine.init_script(&s, 2, 0)?;
        assert_eq!(
            engine.run_pass(&s, &mut game, &mut render),
            Err(ScriptFault::InstructionBudgetExceeded { thread: 2, budget: 4 })
        );
        assert_eq!(engine.thread(2)?.pc(), 4);
        Ok(())
    }

    #[test]
    fn registered_handler_replaces_the_standard_one() -> Result<()> {
        fn stop(_: &mut ExecCtx<'_>, _: &[u8]) -> Result<Flow> {
            Ok(Flow::Halt)
        }

        let mut engine = ScriptEngine::new();
        engine.register_handler(Opcode::Nop, stop);
        let s = stream(vec![0x00, 0x00, 0x01, 0x00]);
        let (mut game, mut render) = (RoomSession::new(), SceneRecorder::default());

        engine.init_script(&s, 0, 0)?;
        engine.run_pass(&s, &mut game, &mut render)?;
        assert!(engine.thread(0)?.is_running());
        assert_eq!(engine.thread(0)?.pc(), 1);
        Ok(())
    }
}
