//! Interpreter for the bytecode that drives a room: its init script, its main loop and
//! its event handlers.
//!
//! A [`ScriptEngine`] owns a pool of cooperative script threads and runs them at a fixed
//! tick rate against a [`GameState`] and a [`RenderState`] supplied by the caller.

pub mod asm;
pub mod config;
pub mod error;
pub mod format;
pub mod host;
pub mod session;
pub mod trace;
pub mod vm;

pub use error::{Result, ScriptFault};
pub use format::{Opcode, ScriptStream};
pub use host::{GameState, RenderState};
pub use vm::ScriptEngine;
