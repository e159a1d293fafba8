use serde::Serialize;

use crate::error::{Result, ScriptFault};

/// Subroutine nesting depth a thread can reach.
pub const MAX_SUB_LEVELS: usize = 4;
/// Open if/else blocks per subroutine level.
pub const BLOCK_STACK_DEPTH: usize = 16;
/// Open loop, switch and sleep frames per subroutine level.
pub const MAX_LOOP_DEPTH: usize = 8;

/// One open `for`, `switch` or `sleep` frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopState {
    pub counter: i32,
    /// Where `break` and loop exit jump to.
    pub break_pc: usize,
    /// Start of the loop body.
    pub stack_value: usize,
    /// If/else depth to restore on `break`.
    pub level_if_counter: i32,
}

/// Control state of one subroutine level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelState {
    /// Open if/else blocks minus one. Negative means nothing is open.
    pub if_else_counter: i32,
    pub stack: [usize; BLOCK_STACK_DEPTH],
    /// Where the subroutine called from this level resumes.
    pub return_address: usize,
    /// Open loop frames minus one.
    pub loop_level: i32,
    pub loop_state: [LoopState; MAX_LOOP_DEPTH],
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            if_else_counter: -1,
            stack: [0; BLOCK_STACK_DEPTH],
            return_address: 0,
            loop_level: -1,
            loop_state: [LoopState::default(); MAX_LOOP_DEPTH],
        }
    }
}

impl LevelState {
    /// Back to the idle counters. Saved addresses are left as they are.
    pub fn reset_counters(&mut self) {
        self.if_else_counter = -1;
        self.loop_level = -1;
    }

    pub fn current_loop(&self) -> Option<&LoopState> {
        usize::try_from(self.loop_level).ok().and_then(|i| self.loop_state.get(i))
    }
}

/// What subsequent `pos_set` / `member_set` instructions address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkSet {
    pub component: u8,
    pub index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTarget {
    None,
    Player,
    Enemy(u8),
    Object(u8),
    Other(u8),
}

impl WorkSet {
    pub const PLAYER: u8 = 1;
    pub const ENEMY: u8 = 3;
    pub const OBJECT: u8 = 4;

    pub fn target(&self) -> WorkTarget {
        match self.component {
            0 => WorkTarget::None,
            Self::PLAYER => WorkTarget::Player,
            Self::ENEMY => WorkTarget::Enemy(self.index),
            Self::OBJECT => WorkTarget::Object(self.index),
            other => WorkTarget::Other(other),
        }
    }
}

/// One cooperative script thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptThread {
    id: usize,
    run_status: bool,
    pc: usize,
    sub_level: usize,
    stack_index: usize,
    work_set: WorkSet,
    #[serde(skip)]
    override_pc: bool,
    levels: [LevelState; MAX_SUB_LEVELS],
}

impl ScriptThread {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            run_status: false,
            pc: 0,
            sub_level: 0,
            stack_index: 0,
            work_set: WorkSet::default(),
            override_pc: false,
            levels: Default::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_running(&self) -> bool {
        self.run_status
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sub_level(&self) -> usize {
        self.sub_level
    }

    pub fn stack_index(&self) -> usize {
        self.stack_index
    }

    pub fn work_set(&self) -> WorkSet {
        self.work_set
    }

    pub fn set_work_set(&mut self, work_set: WorkSet) {
        self.work_set = work_set;
    }

    /// Control state of the current subroutine level.
    pub fn level(&self) -> &LevelState {
        &self.levels[self.sub_level]
    }

    pub fn level_mut(&mut self) -> &mut LevelState {
        &mut self.levels[self.sub_level]
    }

    pub fn level_at(&self, sub_level: usize) -> Option<&LevelState> {
        self.levels.get(sub_level)
    }

    /// Marks the thread idle. Control state is kept until the next activation.
    pub fn reset(&mut self) {
        self.run_status = false;
    }

    pub fn halt(&mut self) {
        self.run_status = false;
    }

    /// Schedule the thread at `pc` with fresh top-level control state.
    pub fn activate(&mut self, pc: usize) {
        self.run_status = true;
        self.sub_level = 0;
        self.stack_index = 0;
        self.levels[0].reset_counters();
        self.jump(pc);
    }

    /// Move to `pc` and suppress the automatic advance after the current handler.
    pub fn jump(&mut self, pc: usize) {
        self.pc = pc;
        self.override_pc = true;
    }

    pub(crate) fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    pub(crate) fn advance(&mut self, size: usize) {
        self.pc += size;
    }

    pub(crate) fn overridden(&self) -> bool {
        self.override_pc
    }

    pub(crate) fn clear_override(&mut self) {
        self.override_pc = false;
    }

    /// Open an if block that resumes at `resume_pc`.
    pub fn push_block(&mut self, resume_pc: usize) -> Result<()> {
        let pc = self.pc;
        let index = self.stack_index;
        let level = &mut self.levels[self.sub_level];
        let slot = level
            .stack
            .get_mut(index)
            .ok_or(ScriptFault::BlockStackOverflow { pc })?;
        *slot = resume_pc;
        level.if_else_counter += 1;
        self.stack_index += 1;
        Ok(())
    }

    /// Close the innermost if block, returning its resume address.
    pub fn pop_block(&mut self) -> Result<usize> {
        if self.stack_index == 0 {
            return Err(ScriptFault::EmptyBlockStack { pc: self.pc });
        }
        self.stack_index -= 1;
        let level = &mut self.levels[self.sub_level];
        level.if_else_counter -= 1;
        level
            .stack
            .get(self.stack_index)
            .copied()
            .ok_or(ScriptFault::EmptyBlockStack { pc: self.pc })
    }

    pub fn push_loop(&mut self, frame: LoopState) -> Result<()> {
        let pc = self.pc;
        let level = &mut self.levels[self.sub_level];
        let next = usize::try_from(level.loop_level + 1).map_err(|_| ScriptFault::LoopUnderflow { pc })?;
        let slot = level
            .loop_state
            .get_mut(next)
            .ok_or(ScriptFault::LoopOverflow { pc })?;
        *slot = frame;
        level.loop_level += 1;
        Ok(())
    }

    pub fn current_loop_mut(&mut self) -> Result<&mut LoopState> {
        let pc = self.pc;
        let level = &mut self.levels[self.sub_level];
        usize::try_from(level.loop_level)
            .ok()
            .and_then(|i| level.loop_state.get_mut(i))
            .ok_or(ScriptFault::LoopUnderflow { pc })
    }

    pub fn pop_loop(&mut self) -> Result<LoopState> {
        let frame = *self.current_loop_mut()?;
        self.level_mut().loop_level -= 1;
        Ok(frame)
    }

    /// Restore the block stack index of the current level from its if/else depth.
    pub(crate) fn sync_stack_index(&mut self) {
        self.stack_index = usize::try_from(self.level().if_else_counter + 1).unwrap_or(0);
    }

    /// Call into a subroutine at `target`, resuming at `return_pc` afterwards.
    pub fn enter_subroutine(&mut self, return_pc: usize, target: usize) -> Result<()> {
        if self.sub_level + 1 >= MAX_SUB_LEVELS {
            return Err(ScriptFault::SubLevelOverflow { pc: self.pc });
        }
        self.levels[self.sub_level].return_address = return_pc;
        self.levels[self.sub_level + 1].reset_counters();
        self.stack_index = 0;
        self.sub_level += 1;
        self.jump(target);
        Ok(())
    }

    /// Return to the calling level. `false` at the top level, where there is nothing to return to.
    pub fn leave_subroutine(&mut self) -> bool {
        if self.sub_level == 0 {
            return false;
        }
        self.sub_level -= 1;
        let resume = self.levels[self.sub_level].return_address;
        self.sync_stack_index();
        self.jump(resume);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_thread_is_idle() {
        let thread = ScriptThread::new(3);
        assert_eq!(thread.id(), 3);
        assert!(!thread.is_running());
        assert_eq!(thread.level().if_else_counter, -1);
        assert_eq!(thread.level().loop_level, -1);
        assert!(thread.level().current_loop().is_none());
    }

    #[test]
    fn block_push_pop_keeps_index_in_step_with_counter() -> Result<()> {
        let mut thread = ScriptThread::new(0);
        thread.activate(0x10);
        thread.push_block(0x20)?;
        thread.push_block(0x30)?;
        assert_eq!(thread.stack_index(), 2);
        assert_eq!(thread.level().if_else_counter, 1);

        assert_eq!(thread.pop_block()?, 0x30);
        assert_eq!(thread.pop_block()?, 0x20);
        assert_eq!(thread.level().if_else_counter, -1);
        assert_eq!(thread.pop_block(), Err(ScriptFault::EmptyBlockStack { pc: 0x10 }));
        Ok(())
    }

    #[test]
    fn block_stack_overflow_is_a_fault() {
        let mut thread = ScriptThread::new(0);
        for i in 0..BLOCK_STACK_DEPTH {
            thread.push_block(i).expect("room for block");
        }
        assert_eq!(thread.push_block(99), Err(ScriptFault::BlockStackOverflow { pc: 0 }));
    }

    #[test]
    fn loop_frames() -> Result<()> {
        let mut thread = ScriptThread::new(0);
        assert_eq!(thread.pop_loop(), Err(ScriptFault::LoopUnderflow { pc: 0 }));
        for i in 0..MAX_LOOP_DEPTH {
            thread.push_loop(LoopState { counter: i as i32, ..Default::default() })?;
        }
        assert!(matches!(thread.push_loop(LoopState::default()), Err(ScriptFault::LoopOverflow { .. })));
        thread.current_loop_mut()?.counter = 42;
        assert_eq!(thread.pop_loop()?.counter, 42);
        assert_eq!(thread.level().loop_level, MAX_LOOP_DEPTH as i32 - 2);
        Ok(())
    }

    #[test]
    fn subroutine_round_trip_restores_caller_state() -> Result<()> {
        let mut thread = ScriptThread::new(0);
        thread.activate(0x10);
        thread.push_block(0x40)?;

        thread.enter_subroutine(0x12, 0x80)?;
        assert_eq!(thread.sub_level(), 1);
        assert_eq!(thread.stack_index(), 0);
        assert_eq!(thread.pc(), 0x80);
        assert_eq!(thread.level().if_else_counter, -1);

        thread.push_block(0x90)?;
        thread.pop_block()?;
        assert!(thread.leave_subroutine());
        assert_eq!(thread.sub_level(), 0);
        assert_eq!(thread.pc(), 0x12);
        // caller still has one open block
        assert_eq!(thread.stack_index(), 1);
        assert!(!thread.leave_subroutine());
        Ok(())
    }

    #[test]
    fn nesting_limit() -> Result<()> {
        let mut thread = ScriptThread::new(0);
        for _ in 0..MAX_SUB_LEVELS - 1 {
            thread.enter_subroutine(0, 0)?;
        }
        assert_eq!(thread.enter_subroutine(0, 0), Err(ScriptFault::SubLevelOverflow { pc: 0 }));
        Ok(())
    }

    #[test]
    fn work_set_targets() {
        let ws = |component, index| WorkSet { component, index }.target();
        assert_eq!(ws(1, 9), WorkTarget::Player);
        assert_eq!(ws(3, 2), WorkTarget::Enemy(2));
        assert_eq!(ws(4, 5), WorkTarget::Object(5));
        assert_eq!(ws(0, 0), WorkTarget::None);
        assert_eq!(ws(2, 0), WorkTarget::Other(2));
    }
}
