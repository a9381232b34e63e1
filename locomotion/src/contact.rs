//! Per-tick contact evidence.
//!
//! Contacts reported by the engine are bucketed into ground, steep and climbable sums. Buckets
//! are pure sums so feeding contacts in any order, in any number of batches, gives the same
//! result. Everything here is cleared at the end of every tick.

use std::cmp::Ordering;

use log::trace;

use crate::{
    constants::STEEP_CUTOFF_DOT,
    layers::{Layer, LayerMask},
    physics::BodyId,
    types::{Vec3, try_normalize},
};

/// A single contact reported by the engine for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionContact {
    /// Surface normal pointing from the touched surface toward the character.
    pub normal: Vec3,
    pub layer: Layer,
    /// Rigid body the touched collider belongs to, if any.
    pub body: Option<BodyId>,
}

impl CollisionContact {
    pub fn new(normal: Vec3, layer: Layer, body: Option<BodyId>) -> Self {
        Self {
            normal,
            layer,
            body,
        }
    }
}

/// Minimum upward dot products used to classify surfaces, derived from the configured angles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceThresholds {
    pub min_ground_dot: f32,
    pub min_stair_dot: f32,
    pub min_climb_dot: f32,
    pub stair_mask: LayerMask,
    pub climb_mask: LayerMask,
}

impl SurfaceThresholds {
    /// Ground threshold for a surface on `layer`; stairs accept steeper angles.
    #[inline]
    pub fn min_dot(&self, layer: Layer) -> f32 {
        if self.stair_mask.contains(layer) {
            self.min_stair_dot
        } else {
            self.min_ground_dot
        }
    }
}

/// Count and normal sum of one contact class.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContactBucket {
    pub count: u32,
    pub normal_sum: Vec3,
}

impl ContactBucket {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    fn push(&mut self, normal: Vec3) {
        self.count += 1;
        self.normal_sum += normal;
    }

    /// Normalized aggregate normal, if any contact was recorded.
    #[inline]
    pub fn normal(&self) -> Option<Vec3> {
        if self.count == 0 {
            None
        } else {
            try_normalize(self.normal_sum)
        }
    }
}

/// Body offered by a contact as a platform to inherit motion from.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    body: BodyId,
    up_dot: f32,
}

/// Keep the most supportive candidate (highest up dot); ties go to the lower body id.
fn prefer_supportive(current: Option<Candidate>, next: Candidate) -> Option<Candidate> {
    match current {
        Some(c) if c.up_dot > next.up_dot => Some(c),
        Some(c) if c.up_dot == next.up_dot && c.body <= next.body => Some(c),
        _ => Some(next),
    }
}

/// Total order on normals by up dot then components, used for order-independent picks.
fn compare_normals(a: (f32, Vec3), b: (f32, Vec3)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then(a.1.x.total_cmp(&b.1.x))
        .then(a.1.y.total_cmp(&b.1.y))
        .then(a.1.z.total_cmp(&b.1.z))
}

/// Accumulates this tick's contact evidence.
#[derive(Clone, Debug, Default)]
pub struct ContactClassifier {
    pub ground: ContactBucket,
    pub steep: ContactBucket,
    pub climb: ContactBucket,
    ground_candidate: Option<Candidate>,
    steep_candidate: Option<Candidate>,
    climb_candidate: Option<Candidate>,
    /// Most vertical climbable normal seen this tick, with its up dot.
    climb_hug: Option<(f32, Vec3)>,
}

impl ContactClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a batch of contacts. May be called any number of times per tick.
    pub fn classify(
        &mut self,
        contacts: &[CollisionContact],
        up_axis: Vec3,
        thresholds: &SurfaceThresholds,
        desires_climbing: bool,
    ) {
        for contact in contacts {
            self.classify_one(contact, up_axis, thresholds, desires_climbing);
        }
    }

    fn classify_one(
        &mut self,
        contact: &CollisionContact,
        up_axis: Vec3,
        thresholds: &SurfaceThresholds,
        desires_climbing: bool,
    ) {
        let Some(normal) = try_normalize(contact.normal) else {
            return;
        };
        let up_dot = up_axis.dot(&normal);

        if up_dot >= thresholds.min_dot(contact.layer) {
            self.ground.push(normal);
            if let Some(body) = contact.body {
                self.ground_candidate =
                    prefer_supportive(self.ground_candidate, Candidate { body, up_dot });
            }
            return;
        }

        if up_dot > STEEP_CUTOFF_DOT {
            self.steep.push(normal);
            if let Some(body) = contact.body {
                self.steep_candidate =
                    prefer_supportive(self.steep_candidate, Candidate { body, up_dot });
            }
        }

        if desires_climbing
            && up_dot >= thresholds.min_climb_dot
            && thresholds.climb_mask.contains(contact.layer)
        {
            self.climb.push(normal);

            let replace = self
                .climb_hug
                .is_none_or(|hug| compare_normals((up_dot, normal), hug) == Ordering::Less);
            if replace {
                self.climb_hug = Some((up_dot, normal));
                self.climb_candidate = contact.body.map(|body| Candidate { body, up_dot });
            }
        }
    }

    /// Single wall normal to hug when several climb contacts disagree.
    pub fn climb_hug_normal(&self) -> Option<Vec3> {
        self.climb_hug.map(|(_, n)| n)
    }

    /// Body offered by ground contacts, falling back to steep contacts.
    pub fn support_candidate(&self) -> Option<BodyId> {
        self.ground_candidate
            .or(self.steep_candidate)
            .map(|c| c.body)
    }

    pub fn steep_candidate(&self) -> Option<BodyId> {
        self.steep_candidate.map(|c| c.body)
    }

    pub fn climb_candidate(&self) -> Option<BodyId> {
        self.climb_candidate.map(|c| c.body)
    }

    /// Forget all evidence; called once at the end of every tick.
    pub fn clear(&mut self) {
        if !self.ground.is_empty() || !self.steep.is_empty() || !self.climb.is_empty() {
            trace!(
                "clearing contacts: ground={} steep={} climb={}",
                self.ground.count, self.steep.count, self.climb.count
            );
        }
        *self = Self::default();
    }
}
