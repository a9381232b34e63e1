pub mod character;
pub mod config;
pub mod connection;
pub mod constants;
pub mod contact;
pub mod error;
pub mod gravity;
pub mod ground_snap;
pub mod jump;
pub mod layers;
pub mod mode;
pub mod physics;
pub mod rapier;
pub mod rapier_world;
pub mod steering;
pub mod submergence;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use character::{Character, CharacterInput};
pub use config::{CharacterSettings, load_settings};
pub use connection::ConnectedBodyTracker;
pub use contact::{CollisionContact, ContactClassifier, SurfaceThresholds};
pub use error::{ConfigError, GravityError, LayerError};
pub use gravity::{
    CubeGravity, CubeParams, GravityBody, GravityBodySettings, GravityField, GravitySample,
    GravitySource, PlaneGravity, PlaneParams, SourceId, SphereGravity, SphereParams,
    UniformGravity,
};
pub use ground_snap::{GroundSnap, GroundSnapper};
pub use jump::{JumpArbiter, JumpBuffer, JumpContext, jump_speed};
pub use layers::{Layer, LayerMask};
pub use mode::{LocomotionMode, ModeTransition};
pub use physics::{BodyId, BodyState, PhysicsWorld, RayHit, RayQuery, TriggerInteraction};
pub use rapier::{BodyDef, BodyKind, ColliderShapeDef};
pub use rapier_world::RapierWorld;
pub use steering::{SteeringAxes, SteeringProfile};
pub use submergence::{SubmergenceEvaluator, WaterProbe};
pub use types::{Iso, Quat, Vec2, Vec3};
