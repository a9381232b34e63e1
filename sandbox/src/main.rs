//! Headless locomotion playground.
//!
//! Runs a RON scene (or the built-in playground) through the Rapier-backed world and logs what
//! the character does. `RUST_LOG=debug` shows every mode change.

mod scene;
mod simulation;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use locomotion::{PhysicsWorld, Vec3};
use log::info;

use crate::{scene::Scene, simulation::Simulation};

#[derive(Parser, Debug)]
#[command(name = "sandbox", version, about = "Step a locomotion scene headlessly")]
struct Opts {
    /// Scene file (.ron). Uses the built-in playground when omitted.
    scene: Option<PathBuf>,

    /// Override the number of ticks to run.
    #[arg(long)]
    ticks: Option<u32>,

    /// Log the character state every N ticks (0 disables).
    #[arg(long, default_value_t = 30)]
    log_every: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let scene = match &opts.scene {
        Some(path) => Scene::load(path)?,
        None => Scene::playground(),
    };
    let ticks = opts.ticks.unwrap_or(scene.ticks);
    let mut sim = Simulation::new(scene)?;
    info!("running {ticks} ticks at dt = {:.4}s", sim.dt());

    for _ in 0..ticks {
        if let Some(t) = sim.step() {
            info!("tick {:>4}: {} -> {}", sim.tick(), t.from, t.to);
        }

        if opts.log_every > 0 && sim.tick() % opts.log_every == 0 {
            let c = &sim.character;
            let p = sim.character_position().unwrap_or_else(Vec3::zeros);
            info!(
                "tick {:>4}: {:<9} pos ({:6.2}, {:6.2}, {:6.2}) speed {:5.2} submergence {:.2} jumps {}",
                sim.tick(),
                c.mode().to_string(),
                p.x,
                p.y,
                p.z,
                c.velocity().norm(),
                c.submergence(),
                c.jump_phase(),
            );
        }
    }

    for prop in &sim.props {
        if let Some(state) = sim.world.body(prop.id()) {
            let p = state.position();
            info!("prop {:?} ended at ({:.2}, {:.2}, {:.2})", prop.id(), p.x, p.y, p.z);
        }
    }
    Ok(())
}
