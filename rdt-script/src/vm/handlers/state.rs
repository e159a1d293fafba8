//! Bit flags and script variables.

use crate::error::{Result, ScriptFault};
use crate::format::instructions::{Calc, Calc2, Check, Compare, CopyVariable, Save, SetBit};
use crate::vm::handlers::{ExecCtx, Flow};

/// Relational test behind `compare`. An unknown operator passes.
pub fn compare_values(operation: u8, lhs: i32, rhs: i32) -> bool {
    match operation {
        0 => lhs == rhs,
        1 => lhs > rhs,
        2 => lhs >= rhs,
        3 => lhs < rhs,
        4 => lhs <= rhs,
        5 => lhs != rhs,
        6 => lhs & rhs != 0,
        _ => {
            log::warn!("compare: unknown operator {}, treated as true", operation);
            true
        }
    }
}

/// The twelve operators of `calc` and `calc2`.
///
/// Operators 10 and 11 are both an arithmetic shift right. Shift amounts wrap at 32.
pub fn calculate(operation: u8, lhs: i32, rhs: i32) -> Result<i32> {
    let shift = rhs.rem_euclid(32) as u32;
    let value = match operation {
        0 => lhs.wrapping_add(rhs),
        1 => lhs.wrapping_sub(rhs),
        2 => lhs.wrapping_mul(rhs),
        3 | 4 if rhs == 0 => return Err(ScriptFault::DivisionByZero { operation }),
        3 => lhs.wrapping_div(rhs),
        4 => lhs.wrapping_rem(rhs),
        5 => lhs | rhs,
        6 => lhs & rhs,
        7 => lhs ^ rhs,
        8 => !lhs,
        9 => lhs << shift,
        10 | 11 => lhs >> shift,
        _ => return Err(ScriptFault::InvalidCalcOperation { operation }),
    };
    Ok(value)
}

pub fn check(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let check = ctx.decode::<Check>(raw)?;
    let bit = u8::from(ctx.game().bit(check.bit_array, check.bit));
    Ok(Flow::from_condition(bit == check.value))
}

pub fn set_bit(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let op = ctx.decode::<SetBit>(raw)?;
    let game = ctx.game();
    let on = match op.operation {
        0 => false,
        1 => true,
        7 => !game.bit(op.bit_array, op.bit),
        operation => return Err(ScriptFault::InvalidBitOperation { operation }),
    };
    game.set_bit(op.bit_array, op.bit, on);
    Ok(Flow::Continue)
}

pub fn compare(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let cmp = ctx.decode::<Compare>(raw)?;
    let lhs = ctx.game().variable(cmp.var_id);
    Ok(Flow::from_condition(compare_values(cmp.operation, lhs, cmp.value as i32)))
}

pub fn save(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let save = ctx.decode::<Save>(raw)?;
    ctx.game().set_variable(save.var_id, save.value as i32);
    Ok(Flow::Continue)
}

pub fn copy(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let copy = ctx.decode::<CopyVariable>(raw)?;
    let game = ctx.game();
    let value = game.variable(copy.source);
    game.set_variable(copy.dest, value);
    Ok(Flow::Continue)
}

pub fn calc(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let calc = ctx.decode::<Calc>(raw)?;
    let game = ctx.game();
    let value = calculate(calc.operation, game.variable(calc.var_id), calc.value as i32)?;
    game.set_variable(calc.var_id, value);
    Ok(Flow::Continue)
}

pub fn calc2(ctx: &mut ExecCtx<'_>, raw: &[u8]) -> Result<Flow> {
    let calc = ctx.decode::<Calc2>(raw)?;
    let game = ctx.game();
    let value = calculate(
        calc.operation,
        game.variable(calc.var_id),
        game.variable(calc.source_var_id),
    )?;
    game.set_variable(calc.var_id, value);
    Ok(Flow::Continue)
}
