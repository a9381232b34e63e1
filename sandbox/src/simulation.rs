use anyhow::{Result, bail};
use locomotion::{
    BodyId, Character, GravityBody, GravityField, Iso, ModeTransition, PhysicsWorld, RapierWorld,
    SourceId, Vec3,
};
use log::{debug, info};

use crate::scene::Scene;

/// Fixed-step loop tying the engine, the gravity field, one character and its props together.
pub struct Simulation {
    pub world: RapierWorld,
    pub field: GravityField,
    pub character: Character,
    pub props: Vec<GravityBody>,
    /// Times the character fell out of the scene and was put back.
    pub respawns: u32,
    scene: Scene,
    spawn: Iso,
    dt: f32,
    tick: u32,
}

impl Simulation {
    pub fn new(scene: Scene) -> Result<Self> {
        let world = RapierWorld::build(scene.bodies.clone());

        let character_id = BodyId(scene.character.body);
        let Some(spawn) = world.body(character_id).map(|b| b.pose) else {
            bail!("character body {} is not in the scene", scene.character.body);
        };
        for mover in &scene.movers {
            if world.handle(BodyId(mover.body)).is_none() {
                bail!("mover body {} is not in the scene", mover.body);
            }
        }

        let mut field = GravityField::new();
        for (i, def) in scene.gravity.iter().cloned().enumerate() {
            field.try_register(SourceId(i as u32), def.into_source())?;
        }

        let mut props = Vec::with_capacity(scene.props.len());
        for prop in &scene.props {
            if world.body(BodyId(prop.body)).is_none() {
                bail!("prop body {} is not in the scene", prop.body);
            }
            props.push(GravityBody::new(BodyId(prop.body), prop.settings.clone()));
        }

        let character = Character::new(character_id, scene.character.settings.clone());
        info!(
            "scene ready: {} bodies, {} gravity sources, {} props",
            world.bodies.len(),
            field.len(),
            props.len()
        );

        Ok(Self {
            world,
            field,
            character,
            props,
            respawns: 0,
            dt: scene.dt(),
            scene,
            spawn,
            tick: 0,
        })
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn character_position(&self) -> Option<Vec3> {
        self.world.body(self.character.id()).map(|b| b.position())
    }

    /// Advance one fixed step. Returns the character's mode change, if any.
    pub fn step(&mut self) -> Option<ModeTransition> {
        for mover in &self.scene.movers {
            let sign = mover.direction_at(self.tick);
            self.world.set_kinematic_velocity(
                BodyId(mover.body),
                Vec3::from(mover.velocity) * sign,
                Vec3::from(mover.angular_velocity) * sign,
            );
        }

        let id = self.character.id();
        self.character.set_input(self.scene.input_at(self.tick));
        self.character.add_contacts(&self.world.contacts_for(id));
        let water_mask = self.character.settings().water_mask;
        for water in self.world.trigger_overlaps(id, water_mask) {
            self.character.add_water_overlap(water);
        }

        let transition = self.character.tick(&mut self.world, &self.field, self.dt);

        for prop in &mut self.props {
            let in_water = !self
                .world
                .trigger_overlaps(prop.id(), prop.settings().water_mask)
                .is_empty();
            prop.tick(&mut self.world, &self.field, in_water, self.dt);
        }

        self.world.step(self.dt);
        self.tick += 1;
        self.respawn_fallen_character();

        if let Some(t) = transition {
            debug!("tick {}: {} -> {}", self.tick, t.from, t.to);
        }
        transition
    }

    fn respawn_fallen_character(&mut self) {
        let Some(floor) = self.scene.respawn_below else {
            return;
        };
        let id = self.character.id();
        if self.character_position().is_some_and(|p| p.y < floor) {
            self.world.set_position(id, self.spawn);
            self.world.set_linear_velocity(id, Vec3::zeros());
            self.respawns += 1;
            info!("tick {}: character fell below {floor}; respawned", self.tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locomotion::LocomotionMode;

    #[test]
    fn character_settles_on_the_floor() {
        let mut scene = Scene::playground();
        scene.script.clear();
        let mut sim = Simulation::new(scene).unwrap();

        for _ in 0..120 {
            sim.step();
        }
        assert_eq!(sim.character.mode(), LocomotionMode::Grounded);
        let y = sim.character_position().unwrap().y;
        assert!((y - 1.0).abs() < 0.1, "capsule center at {y}");
    }

    #[test]
    fn platform_drifts_and_carries_the_character() {
        let mut scene = Scene::playground();
        scene.script.clear();
        let player = scene.bodies.iter_mut().find(|b| b.id == 10).unwrap();
        player.translation = [-8.0, 1.45, 0.0];
        let mut sim = Simulation::new(scene).unwrap();

        for _ in 0..120 {
            sim.step();
        }
        let platform = sim.world.body(BodyId(3)).unwrap().position();
        assert!((platform.z - 3.0).abs() < 1.0e-3, "platform at {platform:?}");
        assert_eq!(sim.character.connected_body(), Some(BodyId(3)));
        let z = sim.character_position().unwrap().z;
        assert!(z > 1.5, "character left behind at z = {z}");

        // Second half of the period brings the platform back.
        for _ in 120..480 {
            sim.step();
        }
        let platform = sim.world.body(BodyId(3)).unwrap().position();
        assert!(platform.z.abs() < 1.0e-2, "platform at {platform:?}");
    }

    #[test]
    fn falling_out_of_the_scene_respawns() {
        let mut scene = Scene::playground();
        scene.script.clear();
        scene.bodies.retain(|b| b.id != 1);
        scene.respawn_below = Some(-2.0);
        let mut sim = Simulation::new(scene).unwrap();

        for _ in 0..60 {
            sim.step();
        }
        assert!(sim.respawns >= 1);
        assert!(sim.character_position().unwrap().y > -2.0);
    }

    #[test]
    fn missing_character_body_is_an_error() {
        let mut scene = Scene::playground();
        scene.character.body = 99;
        assert!(Simulation::new(scene).is_err());
    }

    #[test]
    fn gravity_sources_are_registered() {
        let scene = Scene::playground();
        let sim = Simulation::new(scene).unwrap();
        assert_eq!(sim.field.len(), 1);
        assert!(sim.field.contains(SourceId(0)));
    }
}
