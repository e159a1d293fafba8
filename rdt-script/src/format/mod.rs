pub mod instructions;
pub mod opcode;
pub mod stream;

pub use opcode::Opcode;
pub use stream::ScriptStream;
