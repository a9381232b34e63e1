//! RON scene description for headless runs.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use locomotion::{
    BodyDef, BodyKind, CharacterInput, CharacterSettings, ColliderShapeDef, CubeGravity,
    CubeParams, GravityBodySettings, GravitySource, Layer, LayerMask, PlaneGravity, PlaneParams,
    SphereGravity, SphereParams, UniformGravity, Vec2, Vec3,
};
use serde::{Deserialize, Serialize};

pub const WATER: Layer = Layer::new(4);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GravityDef {
    Uniform([f32; 3]),
    Sphere(SphereParams),
    Cube(CubeParams),
    Plane(PlaneParams),
}

impl GravityDef {
    pub fn into_source(self) -> GravitySource {
        match self {
            GravityDef::Uniform(v) => UniformGravity::new(Vec3::from(v)).into(),
            GravityDef::Sphere(p) => SphereGravity::new(p).into(),
            GravityDef::Cube(p) => CubeGravity::new(p).into(),
            GravityDef::Plane(p) => PlaneGravity::new(p).into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharacterDef {
    /// Id of the body in [`Scene::bodies`] the character drives.
    pub body: u64,
    #[serde(default)]
    pub settings: CharacterSettings,
}

/// A dynamic body pulled by the gravity field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropDef {
    pub body: u64,
    #[serde(default)]
    pub settings: GravityBodySettings,
}

/// Kinematic body moved at a constant velocity, turning back every `reverse_every` ticks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoverDef {
    pub body: u64,
    pub velocity: [f32; 3],
    #[serde(default)]
    pub angular_velocity: [f32; 3],
    /// Zero never reverses.
    #[serde(default)]
    pub reverse_every: u32,
}

impl MoverDef {
    /// Velocity sign on `tick`.
    pub fn direction_at(&self, tick: u32) -> f32 {
        if self.reverse_every > 0 && (tick / self.reverse_every) % 2 == 1 {
            -1.0
        } else {
            1.0
        }
    }
}

/// Input held from tick `at` until the next step. `jump` fires on tick `at` only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStep {
    pub at: u32,
    pub movement: [f32; 2],
    pub dive: f32,
    pub climb: bool,
    pub jump: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f32,
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    pub gravity: Vec<GravityDef>,
    pub bodies: Vec<BodyDef>,
    pub character: CharacterDef,
    #[serde(default)]
    pub props: Vec<PropDef>,
    #[serde(default)]
    pub movers: Vec<MoverDef>,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
    /// Teleport the character back to its spawn pose when it falls below this height.
    #[serde(default)]
    pub respawn_below: Option<f32>,
}

fn default_tick_rate() -> f32 {
    60.0
}

fn default_ticks() -> u32 {
    600
}

impl Scene {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        Self::from_ron_str(&text).with_context(|| format!("parsing scene {}", path.display()))
    }

    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1.0)
    }

    /// Input the script holds on `tick`.
    pub fn input_at(&self, tick: u32) -> CharacterInput {
        let Some(step) = self.script.iter().rev().find(|s| s.at <= tick) else {
            return CharacterInput::default();
        };
        CharacterInput {
            movement: Vec2::from(step.movement),
            dive: step.dive,
            climb: step.climb,
            jump_pressed: step.jump && step.at == tick,
            input_space: None,
        }
    }

    /// Flat floor, a water pool, a platform drifting back and forth, one crate and a scripted walk.
    pub fn playground() -> Self {
        let floor = BodyDef::new(
            1,
            BodyKind::Fixed,
            [0.0, -0.5, 0.0],
            ColliderShapeDef::Cuboid { half_extents: [40.0, 0.5, 40.0] },
        );
        let pool = BodyDef::new(
            2,
            BodyKind::Fixed,
            [0.0, 1.0, 20.0],
            ColliderShapeDef::Cuboid { half_extents: [5.0, 1.0, 5.0] },
        )
        .with_layer(WATER)
        .as_sensor();
        let platform = BodyDef::new(
            3,
            BodyKind::Kinematic,
            [-8.0, 0.2, 0.0],
            ColliderShapeDef::Cuboid { half_extents: [2.0, 0.2, 2.0] },
        );
        let player = BodyDef::new(
            10,
            BodyKind::Dynamic,
            [0.0, 1.5, 0.0],
            ColliderShapeDef::CapsuleY { radius: 0.5, half_height: 0.5 },
        )
        .with_friction(0.0)
        .upright();
        let crate_box = BodyDef::new(
            20,
            BodyKind::Dynamic,
            [1.0, 3.0, 18.0],
            ColliderShapeDef::Cuboid { half_extents: [0.5; 3] },
        );

        let water_mask = LayerMask::from_layers(&[WATER]);
        let mut solid = LayerMask::all();
        solid.remove(WATER);

        Self {
            tick_rate: default_tick_rate(),
            ticks: default_ticks(),
            gravity: vec![GravityDef::Uniform([0.0, -9.81, 0.0])],
            bodies: vec![floor, pool, platform, player, crate_box],
            character: CharacterDef {
                body: 10,
                settings: CharacterSettings {
                    probe_mask: solid,
                    water_mask,
                    ..CharacterSettings::default()
                },
            },
            props: vec![PropDef {
                body: 20,
                settings: GravityBodySettings {
                    water_mask,
                    ..GravityBodySettings::default()
                },
            }],
            movers: vec![MoverDef {
                body: 3,
                velocity: [0.0, 0.0, 1.5],
                angular_velocity: [0.0; 3],
                reverse_every: 240,
            }],
            respawn_below: Some(-20.0),
            script: vec![
                ScriptStep { at: 30, movement: [0.0, 1.0], ..ScriptStep::default() },
                ScriptStep { at: 120, jump: true, movement: [0.0, 1.0], ..ScriptStep::default() },
                ScriptStep { at: 135, jump: true, movement: [0.0, 1.0], ..ScriptStep::default() },
                ScriptStep { at: 240, movement: [0.0, 1.0], dive: -1.0, ..ScriptStep::default() },
                ScriptStep { at: 420, ..ScriptStep::default() },
            ],
        }
    }
}
