pub mod engine;
pub mod handlers;
pub mod thread;

pub use engine::ScriptEngine;
pub use handlers::{ExecCtx, Flow, Handler, HandlerTable};
pub use thread::{LevelState, LoopState, ScriptThread, WorkSet, WorkTarget};
