use std::env;
use std::fmt;
use std::sync::OnceLock;

/// Trace categories, enabled via environment variables.
///
/// Supported:
/// - RDT_TRACE="vm,flow,host" (comma/space separated; "all" enables all)
/// - RDT_TRACE_VM=1, RDT_TRACE_FLOW=1, RDT_TRACE_HOST=1
///
/// `vm` logs every dispatched instruction, `flow` block, loop and subroutine transitions,
/// `host` every call handed to the game or render collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceKind {
    Vm,
    Flow,
    Host,
}

const M_VM: u32 = 1 << 0;
const M_FLOW: u32 = 1 << 1;
const M_HOST: u32 = 1 << 2;

fn parse_bool_env(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => {
            let s = v.trim().to_ascii_lowercase();
            !(s.is_empty() || s == "0" || s == "false" || s == "no" || s == "off")
        }
        Err(_) => false,
    }
}

fn parse_mask_from_trace_list(s: &str) -> u32 {
    let mut mask = 0u32;
    for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        let t = raw.trim().to_ascii_lowercase();
        match t.as_str() {
            "all" => mask |= M_VM | M_FLOW | M_HOST,
            "vm" => mask |= M_VM,
            "flow" => mask |= M_FLOW,
            "host" => mask |= M_HOST,
            _ => {}
        }
    }
    mask
}

fn build_mask() -> u32 {
    let mut mask = 0u32;

    if let Ok(list) = env::var("RDT_TRACE") {
        mask |= parse_mask_from_trace_list(&list);
    }
    if parse_bool_env("RDT_TRACE_VM") {
        mask |= M_VM;
    }
    if parse_bool_env("RDT_TRACE_FLOW") {
        mask |= M_FLOW;
    }
    if parse_bool_env("RDT_TRACE_HOST") {
        mask |= M_HOST;
    }

    mask
}

fn mask() -> u32 {
    static MASK: OnceLock<u32> = OnceLock::new();
    *MASK.get_or_init(build_mask)
}

pub fn enabled(k: TraceKind) -> bool {
    let m = mask();
    match k {
        TraceKind::Vm => (m & M_VM) != 0,
        TraceKind::Flow => (m & M_FLOW) != 0,
        TraceKind::Host => (m & M_HOST) != 0,
    }
}

pub fn vm(args: fmt::Arguments) {
    if !enabled(TraceKind::Vm) {
        return;
    }
    log::info!("{}", args);
}

pub fn flow(args: fmt::Arguments) {
    if !enabled(TraceKind::Flow) {
        return;
    }
    log::info!("{}", args);
}

pub fn host(args: fmt::Arguments) {
    if !enabled(TraceKind::Host) {
        return;
    }
    log::info!("{}", args);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_list_parsing() {
        assert_eq!(parse_mask_from_trace_list("vm"), M_VM);
        assert_eq!(parse_mask_from_trace_list(" flow; HOST "), M_FLOW | M_HOST);
        assert_eq!(parse_mask_from_trace_list("all"), M_VM | M_FLOW | M_HOST);
        assert_eq!(parse_mask_from_trace_list("render,,"), 0);
    }
}
