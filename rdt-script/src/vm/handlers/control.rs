//! Control flow: events, if/else, loops, switch, sleep and subroutines.

use crate::error::{Result, ScriptFault};
use crate::format::instructions::{Block, Case, EvtExec, For, Gosub, Goto, Sleep, Switch};
use crate::format::opcode::Opcode;
use crate::format::stream::ScriptStream;
use crate::trace;
use crate::vm::handlers::{decode_at, ExecCtx, Flow};
use crate::vm::thread::{LoopState, ScriptThread};

/// Return from a subroutine, or stop the thread at the top level.
pub fn evt_end(ctx: &mut ExecCtx<'_>, _raw: &[u8]) -> Result<Flow> {
    let thread = ctx.thread_mut();
    if thread.leave_subroutine() {
        trace::flow(format_args!(
            "thread {}: return to 0x{:X} (level {})",
            thread.id(),
            thread.pc(),
            thread.sub_level()
        ));
        return Ok(Flow::Continue);
    }

    thread.halt();
    trace::flow(format_args!("thread {}: end", thread.id()));
    Ok(Flow::Halt)
}

pub fn evt_exec(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let exec = ctx.decode::<EvtExec>(raw)?;
    let stream = ctx.stream();
    schedule_event(ctx.threads_mut(), &exec, stream)?;
    Ok(Flow::Continue)
}

/// Start event entry `exec.event` on the requested thread, or on the first idle one.
///
/// With every thread busy the event takes over thread 0. Returns the thread that took the event.
pub fn schedule_event(threads: &mut [ScriptThread], exec: &EvtExec, stream: &ScriptStream) -> Result<usize> {
    let entry = stream.entry(exec.event as usize)?;

    let index = if (exec.thread as usize) < threads.len() {
        exec.thread as usize
    } else if let Some(idle) = threads.iter().position(|t| !t.is_running()) {
        idle
    } else {
        log::warn!("no idle script thread for event {}, preempting thread 0", exec.event);
        0
    };

    let thread = threads
        .get_mut(index)
        .ok_or(ScriptFault::InvalidThread { thread: index })?;
    thread.activate(entry);
    log::debug!("thread {} activated at 0x{:X} for event {}", index, entry, exec.event);
    Ok(index)
}

pub fn if_start(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let block = ctx.decode::<Block>(raw)?;
    let resume = ctx.pc() + Opcode::IfStart.size() + block.block_length as usize;
    ctx.thread_mut().push_block(resume)?;
    trace::flow(format_args!("thread {}: if, end at 0x{:X}", ctx.current(), resume));
    Ok(Flow::Continue)
}

/// Reached only when the if branch ran to completion, so the else body is skipped.
pub fn else_start(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let block = ctx.decode::<Block>(raw)?;
    let thread = ctx.thread_mut();
    thread.pop_block()?;
    let target = thread.pc() + block.block_length as usize;
    thread.jump(target);
    Ok(Flow::Continue)
}

pub fn end_if(ctx: &mut ExecCtx<'_>, _raw: &[u8]) -> Result<Flow> {
    ctx.thread_mut().pop_block()?;
    Ok(Flow::Continue)
}

/// Open a tick counter and step onto the `sleeping` opcode embedded at `pc + 1`.
pub fn sleep(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let sleep = ctx.decode::<Sleep>(raw)?;
    let thread = ctx.thread_mut();
    thread.push_loop(LoopState {
        counter: sleep.count as i32,
        ..Default::default()
    })?;
    let next = thread.pc() + 1;
    thread.jump(next);
    Ok(Flow::Continue)
}

/// Count one tick down. The thread stays on this instruction until the counter runs out.
pub fn sleeping(ctx: &mut ExecCtx<'_>, _raw: &[u8]) -> Result<Flow> {
    let thread = ctx.thread_mut();
    let pc = thread.pc();

    let frame = thread.current_loop_mut()?;
    frame.counter -= 1;
    if frame.counter <= 0 {
        thread.pop_loop()?;
        thread.jump(pc + Opcode::Sleeping.size());
    } else {
        thread.jump(pc);
    }
    Ok(Flow::Halt)
}

pub fn for_start(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let lp = ctx.decode::<For>(raw)?;
    let thread = ctx.thread_mut();
    let body = thread.pc() + Opcode::For.size();

    if lp.count == 0 {
        thread.jump(body + lp.block_length as usize);
        return Ok(Flow::Continue);
    }

    let level_if_counter = thread.level().if_else_counter;
    thread.push_loop(LoopState {
        counter: lp.count as i32,
        break_pc: body + lp.block_length as usize,
        stack_value: body,
        level_if_counter,
    })?;
    thread.jump(body);
    Ok(Flow::Continue)
}

pub fn for_end(ctx: &mut ExecCtx<'_>, _raw: &[u8]) -> Result<Flow> {
    let thread = ctx.thread_mut();
    let pc = thread.pc();

    let frame = thread.current_loop_mut()?;
    frame.counter -= 1;
    if frame.counter > 0 {
        let body = frame.stack_value;
        thread.jump(body);
        return Ok(Flow::Continue);
    }

    thread.pop_loop()?;
    thread.jump(pc + Opcode::ForEnd.size());
    Ok(Flow::Continue)
}

/// Open a switch frame, then scan the arms for the first that matches.
pub fn switch(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let sw = ctx.decode::<Switch>(raw)?;
    let stream = ctx.stream();
    let value = ctx.game().variable(sw.var_id);

    let thread = ctx.thread_mut();
    let first_arm = thread.pc() + Opcode::Switch.size();
    let level_if_counter = thread.level().if_else_counter;
    thread.push_loop(LoopState {
        counter: 0,
        break_pc: first_arm + sw.block_length as usize,
        stack_value: first_arm,
        level_if_counter,
    })?;

    let mut scan = first_arm;
    loop {
        let (opcode, arm) = stream.fetch(scan)?;
        match opcode {
            Opcode::Case => {
                let case = decode_at::<Case>(arm, scan)?;
                if case.value as i32 == value {
                    thread.jump(scan + opcode.size());
                    break;
                }
                scan += opcode.size() + case.block_length as usize;
            }
            Opcode::Default => {
                thread.jump(scan + opcode.size());
                break;
            }
            Opcode::EndSwitch => {
                thread.pop_loop()?;
                thread.jump(scan + opcode.size());
                break;
            }
            other => return Err(ScriptFault::UnexpectedSwitchOpcode { opcode: other, pc: scan }),
        }
    }

    trace::flow(format_args!(
        "thread {}: switch var {} = {} -> 0x{:X}",
        thread.id(),
        sw.var_id,
        value,
        thread.pc()
    ));
    Ok(Flow::Continue)
}

pub fn end_switch(ctx: &mut ExecCtx<'_>, _raw: &[u8]) -> Result<Flow> {
    ctx.thread_mut().pop_loop()?;
    Ok(Flow::Continue)
}

/// Decoded but not followed: jumping by its offset sends real scripts into endless loops.
pub fn goto(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let goto = ctx.decode::<Goto>(raw)?;
    trace::flow(format_args!("thread {}: goto {:+} ignored", ctx.current(), goto.offset));
    Ok(Flow::Continue)
}

pub fn gosub(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let call = ctx.decode::<Gosub>(raw)?;
    let target = ctx.stream().entry(call.event as usize)?;
    let thread = ctx.thread_mut();
    let return_pc = thread.pc() + Opcode::Gosub.size();
    thread.enter_subroutine(return_pc, target)?;
    trace::flow(format_args!(
        "thread {}: gosub {} at 0x{:X} (level {})",
        thread.id(),
        call.event,
        target,
        thread.sub_level()
    ));
    Ok(Flow::Continue)
}

/// Leave the innermost loop or switch, closing any if blocks opened inside it.
pub fn break_loop(ctx: &mut ExecCtx<'_>, _raw: &[u8]) -> Result<Flow> {
    let thread = ctx.thread_mut();
    let frame = thread.pop_loop()?;
    thread.level_mut().if_else_counter = frame.level_if_counter;
    thread.sync_stack_index();
    thread.jump(frame.break_pc);
    Ok(Flow::Continue)
}
