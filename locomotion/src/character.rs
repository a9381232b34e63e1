/*!
Per-tick character locomotion.

[`Character`] owns one character's runtime state and runs the fixed-step pipeline:

1. sample gravity and the up axis at the character,
2. read the body velocity from the engine,
3. measure submergence and classify this tick's contacts,
4. resolve the locomotion mode (climb, swim, ground, snap, steep-as-ground, air),
5. follow the connected body,
6. apply water drag and steer toward the intent,
7. perform a buffered jump if one is possible,
8. apply the mode's residual force (grip, buoyancy, anti-slide or gravity),
9. write the velocity back and forget this tick's evidence.

Contacts and water overlaps are handed in between ticks with [`Character::add_contacts`] and
[`Character::add_water_overlap`]; they only influence the next [`Character::tick`].
*/

use log::{trace, warn};

use crate::{
    config::CharacterSettings,
    connection::ConnectedBodyTracker,
    constants::{ANTI_SLIDE_SPEED_SQ, GRIP_FORCE_REDUCTION, JUMP_GUARD_TICKS, JUMP_PHASE_RESET_TICKS},
    contact::{CollisionContact, ContactClassifier, SurfaceThresholds},
    gravity::GravityField,
    ground_snap::GroundSnapper,
    jump::{JumpArbiter, JumpBuffer, JumpContext},
    mode::{LocomotionMode, ModeMachine, ModeTransition},
    physics::{BodyId, PhysicsWorld},
    steering::{SteeringAxes, SteeringContext, SteeringProfile, steer, steer_dive},
    submergence::SubmergenceEvaluator,
    types::{Quat, Vec2, Vec3, clamp_unit},
};

/// Player or AI intent for the coming ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CharacterInput {
    /// x = right, y = forward. Clamped to unit length.
    pub movement: Vec2,
    /// Vertical intent while swimming, in `[-1, 1]`.
    pub dive: f32,
    pub climb: bool,
    /// Edge: true only on the frame the jump button went down.
    pub jump_pressed: bool,
    /// Orientation whose local +X/+Z define right/forward (camera yaw, usually).
    pub input_space: Option<Quat>,
}

impl CharacterInput {
    fn sanitized(self) -> Self {
        Self {
            movement: if self.movement.iter().all(|c| c.is_finite()) {
                clamp_unit(self.movement)
            } else {
                Vec2::zeros()
            },
            dive: if self.dive.is_nan() { 0.0 } else { self.dive.clamp(-1.0, 1.0) },
            ..self
        }
    }
}

pub struct Character {
    id: BodyId,
    settings: CharacterSettings,
    thresholds: SurfaceThresholds,
    snapper: GroundSnapper,
    water_probe: SubmergenceEvaluator,
    arbiter: JumpArbiter,
    jump_buffer: JumpBuffer,
    tracker: ConnectedBodyTracker,
    modes: ModeMachine,

    movement: Vec2,
    dive: f32,
    desires_climbing: bool,
    input_space: Option<Quat>,

    pending_contacts: Vec<CollisionContact>,
    pending_water: Vec<Option<BodyId>>,

    classifier: ContactClassifier,
    velocity: Vec3,
    gravity: Vec3,
    up_axis: Vec3,
    contact_normal: Vec3,
    ground_contact_count: u32,
    /// Submergence measured during the last tick.
    submergence: f32,
    steps_since_grounded: u32,
    steps_since_jumped: u32,
}

impl Character {
    /// Character driving the engine body `id`.
    pub fn new(id: BodyId, settings: CharacterSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            id,
            thresholds: settings.thresholds(),
            snapper: snapper_for(&settings),
            water_probe: water_probe_for(&settings),
            arbiter: JumpArbiter::new(settings.jump_height, settings.max_air_jumps),
            jump_buffer: JumpBuffer::new(settings.jump_buffer_ticks),
            settings,
            tracker: ConnectedBodyTracker::new(),
            modes: ModeMachine::new(LocomotionMode::Airborne),
            movement: Vec2::zeros(),
            dive: 0.0,
            desires_climbing: false,
            input_space: None,
            pending_contacts: Vec::new(),
            pending_water: Vec::new(),
            classifier: ContactClassifier::new(),
            velocity: Vec3::zeros(),
            gravity: Vec3::zeros(),
            up_axis: Vec3::y(),
            contact_normal: Vec3::y(),
            ground_contact_count: 0,
            submergence: 0.0,
            steps_since_grounded: 0,
            steps_since_jumped: 0,
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn settings(&self) -> &CharacterSettings {
        &self.settings
    }

    /// Replace the tuning between ticks. Jump budget and buffered requests are kept.
    pub fn set_settings(&mut self, settings: CharacterSettings) {
        let settings = settings.sanitized();
        self.thresholds = settings.thresholds();
        self.snapper = snapper_for(&settings);
        self.water_probe = water_probe_for(&settings);
        self.arbiter.jump_height = settings.jump_height;
        self.arbiter.max_air_jumps = settings.max_air_jumps;
        let pending = self.jump_buffer.is_pending();
        self.jump_buffer = JumpBuffer::new(settings.jump_buffer_ticks);
        if pending {
            self.jump_buffer.request();
        }
        self.settings = settings;
    }

    /// Feed intent. May be called any number of times between ticks; jump presses accumulate.
    ///
    /// While swimming, jump presses are dropped and the climb flag keeps its last value.
    pub fn set_input(&mut self, input: CharacterInput) {
        let input = input.sanitized();
        self.movement = input.movement;
        self.dive = input.dive;
        self.input_space = input.input_space;

        if self.is_swimming() {
            self.jump_buffer.clear();
        } else {
            if input.jump_pressed {
                self.jump_buffer.request();
            }
            self.desires_climbing = input.climb;
        }
    }

    /// Contacts touching the character since the last tick.
    pub fn add_contacts(&mut self, contacts: &[CollisionContact]) {
        self.pending_contacts.extend_from_slice(contacts);
    }

    /// A water trigger (on the water mask) overlapping the character since the last tick.
    pub fn add_water_overlap(&mut self, water_body: Option<BodyId>) {
        self.pending_water.push(water_body);
    }

    /// Keep the character airborne for the next ticks (launch pads, boost zones).
    pub fn prevent_ground_snapping(&mut self) {
        self.steps_since_jumped = 0;
    }

    pub fn mode(&self) -> LocomotionMode {
        self.modes.current()
    }

    pub fn is_grounded(&self) -> bool {
        self.mode() == LocomotionMode::Grounded
    }

    pub fn is_climbing(&self) -> bool {
        self.mode() == LocomotionMode::Climbing
    }

    pub fn is_swimming(&self) -> bool {
        self.mode() == LocomotionMode::Swimming
    }

    pub fn is_in_water(&self) -> bool {
        self.submergence > 0.0
    }

    pub fn submergence(&self) -> f32 {
        self.submergence
    }

    /// World up at the character, for camera alignment.
    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Velocity written to the engine by the last tick.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Surface normal steering happened on during the last tick (up when airborne).
    pub fn contact_normal(&self) -> Vec3 {
        self.contact_normal
    }

    pub fn jump_phase(&self) -> u32 {
        self.arbiter.phase()
    }

    pub fn jump_pending(&self) -> bool {
        self.jump_buffer.is_pending()
    }

    pub fn connected_body(&self) -> Option<BodyId> {
        self.tracker.previous()
    }

    pub fn steps_since_grounded(&self) -> u32 {
        self.steps_since_grounded
    }

    pub fn steps_since_jumped(&self) -> u32 {
        self.steps_since_jumped
    }

    /// Run one fixed step of `dt` seconds. Returns the mode change, if any.
    pub fn tick(
        &mut self,
        world: &mut impl PhysicsWorld,
        field: &GravityField,
        dt: f32,
    ) -> Option<ModeTransition> {
        let Some(body) = world.body(self.id) else {
            warn!("character body {:?} is gone; skipping tick", self.id);
            self.clear_tick_state();
            return None;
        };
        let position = body.position();

        let sample = field.sample_with_up_axis(position);
        self.gravity = sample.gravity;
        if let Some(up) = sample.up_axis {
            self.up_axis = up;
        }
        let up = self.up_axis;
        let input_axes = SteeringAxes::from_input_space(self.input_space, up);

        self.velocity = world.linear_velocity(self.id).unwrap_or_else(Vec3::zeros);

        let submergence = if self.pending_water.is_empty() {
            0.0
        } else {
            self.water_probe.evaluate(&*world, position, up, Some(self.id))
        };
        let swimming = submergence >= self.settings.swim_threshold;

        if !swimming {
            self.classifier.classify(
                &self.pending_contacts,
                up,
                &self.thresholds,
                self.desires_climbing,
            );
        }

        self.steps_since_grounded = self.steps_since_grounded.saturating_add(1);
        self.steps_since_jumped = self.steps_since_jumped.saturating_add(1);

        let (mode, candidate) = self.resolve_mode(&*world, position, up, swimming);
        if mode.is_supported() {
            self.steps_since_grounded = 0;
            if self.steps_since_jumped > JUMP_PHASE_RESET_TICKS {
                self.arbiter.reset_phase();
            }
        }

        let transition = self.modes.update(mode);
        if transition.is_some_and(|t| t.entered(LocomotionMode::Swimming)) {
            self.jump_buffer.clear();
        }

        let connection_velocity = self
            .tracker
            .update(&*world, candidate, position, body.mass, dt);

        if submergence > 0.0 {
            self.velocity *= (1.0 - self.settings.water_drag * submergence * dt).max(0.0);
        }

        let climbing = mode == LocomotionMode::Climbing;
        let grounded = self.ground_contact_count > 0;
        let profile = SteeringProfile::select(
            &self.settings,
            &SteeringContext {
                climbing,
                grounded,
                desires_climbing: self.desires_climbing,
                submergence,
            },
        );
        let axes = if climbing {
            SteeringAxes::climbing(self.contact_normal)
        } else {
            input_axes.on_plane(self.contact_normal)
        };
        steer(&mut self.velocity, connection_velocity, &axes, self.movement, &profile, dt);
        if swimming {
            steer_dive(&mut self.velocity, connection_velocity, up, self.dive, &profile, dt);
        }

        if self.jump_buffer.is_pending() {
            let ctx = JumpContext {
                grounded,
                on_steep: !self.classifier.steep.is_empty(),
                contact_normal: self.contact_normal,
                steep_normal: self.classifier.steep.normal().unwrap_or(up),
                up_axis: up,
                gravity: self.gravity,
                submergence,
                swim_threshold: self.settings.swim_threshold,
            };
            if self.arbiter.try_jump(&mut self.velocity, &ctx) {
                self.steps_since_jumped = 0;
                self.jump_buffer.clear();
            } else {
                self.jump_buffer.advance();
            }
        }

        self.apply_residual_force(mode, submergence, dt);

        world.set_linear_velocity(self.id, self.velocity);
        self.submergence = submergence;
        self.clear_tick_state();
        transition
    }

    /// Pick the mode by priority and set the contact normal and ground count it implies.
    /// Also returns the body the character should connect to.
    fn resolve_mode(
        &mut self,
        world: &impl PhysicsWorld,
        position: Vec3,
        up: Vec3,
        swimming: bool,
    ) -> (LocomotionMode, Option<BodyId>) {
        let c = &self.classifier;

        if !c.climb.is_empty() && self.steps_since_jumped > JUMP_GUARD_TICKS {
            let mut normal = c.climb.normal().unwrap_or(up);
            if c.climb.count > 1 && up.dot(&normal) >= self.thresholds.min_ground_dot {
                normal = c.climb_hug_normal().unwrap_or(normal);
            }
            self.ground_contact_count = 1;
            self.contact_normal = normal;
            return (LocomotionMode::Climbing, c.climb_candidate());
        }

        if swimming {
            self.ground_contact_count = 0;
            self.contact_normal = up;
            let water_body = self.pending_water.iter().flatten().min().copied();
            return (LocomotionMode::Swimming, water_body);
        }

        if let Some(normal) = c.ground.normal() {
            self.ground_contact_count = c.ground.count;
            self.contact_normal = normal;
            return (LocomotionMode::Grounded, c.support_candidate());
        }

        if let Some(snap) = self.snapper.try_snap(
            world,
            position,
            up,
            &mut self.velocity,
            self.steps_since_grounded,
            self.steps_since_jumped,
            &self.thresholds,
            Some(self.id),
        ) {
            self.ground_contact_count = 1;
            self.contact_normal = snap.normal;
            return (LocomotionMode::Grounded, snap.body);
        }

        let min_ground_dot = self.thresholds.min_ground_dot;
        if let Some(normal) = c.steep.normal().filter(|n| up.dot(n) >= min_ground_dot) {
            trace!("steep contacts form a crevice floor");
            self.ground_contact_count = 1;
            self.contact_normal = normal;
            return (LocomotionMode::Grounded, c.steep_candidate());
        }

        self.ground_contact_count = 0;
        self.contact_normal = up;
        (LocomotionMode::Airborne, c.support_candidate())
    }

    fn apply_residual_force(&mut self, mode: LocomotionMode, submergence: f32, dt: f32) {
        let gravity = self.gravity;
        let normal = self.contact_normal;
        let grounded = self.ground_contact_count > 0;
        let grip = self.settings.max_climb_acceleration * GRIP_FORCE_REDUCTION;

        if mode == LocomotionMode::Climbing {
            self.velocity -= normal * (grip * dt);
        } else if submergence > 0.0 {
            self.velocity += gravity * ((1.0 - self.settings.buoyancy * submergence) * dt);
        } else if grounded && self.velocity.norm_squared() < ANTI_SLIDE_SPEED_SQ {
            self.velocity += normal * (gravity.dot(&normal) * dt);
        } else if grounded && self.desires_climbing {
            self.velocity += (gravity - normal * grip) * dt;
        } else {
            self.velocity += gravity * dt;
        }
    }

    fn clear_tick_state(&mut self) {
        self.classifier.clear();
        self.pending_contacts.clear();
        self.pending_water.clear();
        self.tracker.end_tick();
        self.ground_contact_count = 0;
    }
}

fn snapper_for(settings: &CharacterSettings) -> GroundSnapper {
    GroundSnapper::new(
        settings.probe_distance,
        settings.max_snap_speed,
        settings.probe_mask,
    )
}

fn water_probe_for(settings: &CharacterSettings) -> SubmergenceEvaluator {
    SubmergenceEvaluator::new(
        settings.submerge_offset,
        settings.submerge_range,
        settings.water_mask,
    )
}
