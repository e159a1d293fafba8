use std::path::Path;

use anyhow::{Context, Result};
use rdt_script::config::EngineConfig;
use rdt_script::session::{RoomSession, SceneRecorder};
use rdt_script::vm::ScriptThread;
use rdt_script::{ScriptEngine, ScriptStream};
use serde::Serialize;

/// What a headless run leaves behind.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub ticks: usize,
    pub running: Vec<ScriptThread>,
    pub session: RoomSession,
    pub scene: SceneRecorder,
}

pub fn load_stream(path: impl AsRef<Path>) -> Result<ScriptStream> {
    let path = path.as_ref();
    let blob = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    ScriptStream::parse(blob).with_context(|| format!("loading script {}", path.display()))
}

/// Run `room` for `ticks` passes against a fresh session, after `init` when one is given.
pub fn run(config: &EngineConfig, init: Option<&ScriptStream>, room: &ScriptStream, ticks: usize) -> Result<RunReport> {
    let mut engine = ScriptEngine::with_config(config);
    let mut session = RoomSession::new();
    let mut scene = SceneRecorder::default();

    match init {
        Some(init) => engine.load_room(init, room, &mut session, &mut scene)?,
        None => {
            engine.init_script(room, 0, 0)?;
            if room.entry_count() > 1 {
                engine.init_script(room, 1, 1)?;
            }
        }
    }

    for tick in 0..ticks {
        engine
            .run_pass(room, &mut session, &mut scene)
            .with_context(|| format!("tick {}", tick))?;

        if !engine.threads().iter().any(ScriptThread::is_running) {
            log::info!("every script thread is idle after {} ticks", tick + 1);
            return Ok(report(&engine, tick + 1, session, scene));
        }
    }

    Ok(report(&engine, ticks, session, scene))
}

fn report(engine: &ScriptEngine, ticks: usize, session: RoomSession, scene: SceneRecorder) -> RunReport {
    RunReport {
        ticks,
        running: engine.threads().iter().filter(|t| t.is_running()).cloned().collect(),
        session,
        scene,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdt_script::asm::ScriptBuilder;

    #[test]
    fn stops_early_once_everything_is_idle() -> Result<()> {
        let mut b = ScriptBuilder::new();
        b.entry().sleep(2).cut_chg(4).evt_end();
        b.entry().save(1, 5).evt_end();
        let room = b.build()?;

        let report = run(&EngineConfig::default(), None, &room, 100)?;
        assert_eq!(report.ticks, 3);
        assert!(report.running.is_empty());
        assert_eq!(report.session.camera, 4);
        assert_eq!(report.session.variables.get(&1), Some(&5));

        let yaml = serde_yaml::to_string(&report)?;
        assert!(yaml.contains("camera: 4"));
        Ok(())
    }

    #[test]
    fn faults_carry_the_tick() {
        let mut b = ScriptBuilder::new();
        b.sleep(1).raw(&[0x08]);
        let room = b.build().expect("assembles");

        let err = run(&EngineConfig::default(), None, &room, 5).unwrap_err();
        assert_eq!(err.to_string(), "tick 1");
        assert!(format!("{:#}", err).contains("block stack is empty"));
    }
}
