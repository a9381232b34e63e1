//! Multi-source gravity.

mod body;
mod field;
mod source;

pub use body::{GravityBody, GravityBodySettings};
pub use field::{GravityField, GravitySample, SourceId};
pub use source::{
    CubeGravity, CubeParams, DEFAULT_STRENGTH, GravitySource, PlaneGravity, PlaneParams,
    SphereGravity, SphereParams, UniformGravity, nearest_face_axis,
};
