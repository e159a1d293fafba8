use crate::format::opcode::Opcode;

/// Faults raised while decoding or executing a room script.
///
/// Level data is trusted, so every variant here means the script (or the decoder) is broken.
/// The engine halts the faulting thread and hands the fault back to the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptFault {
    #[error("unknown opcode: 0x{opcode:02X} at pc=0x{pc:X}")]
    UnknownOpcode { opcode: u8, pc: usize },

    #[error("truncated {opcode} at pc=0x{pc:X}, stream_len=0x{len:X}")]
    TruncatedInstruction { opcode: Opcode, pc: usize, len: usize },

    #[error("pc out of range: pc=0x{pc:X}, stream_len=0x{len:X}")]
    PcOutOfRange { pc: usize, len: usize },

    #[error("block stack is empty at pc=0x{pc:X}")]
    EmptyBlockStack { pc: usize },

    #[error("block stack overflow at pc=0x{pc:X}")]
    BlockStackOverflow { pc: usize },

    #[error("subroutine nesting overflow at pc=0x{pc:X}")]
    SubLevelOverflow { pc: usize },

    #[error("no open loop frame at pc=0x{pc:X}")]
    LoopUnderflow { pc: usize },

    #[error("loop nesting overflow at pc=0x{pc:X}")]
    LoopOverflow { pc: usize },

    #[error("switch scan hit {opcode} at pc=0x{pc:X}")]
    UnexpectedSwitchOpcode { opcode: Opcode, pc: usize },

    #[error("set_bit operation {operation} is invalid")]
    InvalidBitOperation { operation: u8 },

    #[error("calculator operation {operation} is invalid")]
    InvalidCalcOperation { operation: u8 },

    #[error("division by zero in calculator operation {operation}")]
    DivisionByZero { operation: u8 },

    #[error("entry point {entry} does not exist")]
    UnknownEntry { entry: usize },

    #[error("thread {thread} does not exist")]
    InvalidThread { thread: usize },

    #[error("thread {thread} exceeded its budget of {budget} instructions in one pass")]
    InstructionBudgetExceeded { thread: usize, budget: usize },
}

pub type Result<T> = std::result::Result<T, ScriptFault>;
