//! Tracked-identity snapshots published by the tracker.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::BBox;

/// Allocate a new tracked-identity id.
///
/// Identity ids live in their own namespace, distinct from session ids.
pub fn new_identity_id() -> String {
    format!("trk-{}", Uuid::new_v4())
}

/// Externally visible state of one confirmed identity.
///
/// This is a projection of the tracker's internal record: only confirmed
/// identities are ever published, so confirmation is implied.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdentitySnapshot {
    /// Opaque unique id, assigned once at creation and never reused
    pub id: String,
    /// Latest matched box, normalized [0, 1]
    pub bbox: BBox,
    /// Latest detector confidence
    pub score: f32,
    /// Unix ms of the frame that created this identity
    pub first_seen: i64,
    /// Unix ms of the last successful match
    pub last_seen: i64,
    /// True only when the identity was matched in the published frame
    pub matched: bool,
}

/// Snapshot of the confirmed identity set for one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrackingView {
    /// Unix ms of the frame this view was published for
    pub frame_at: i64,
    /// Confirmed identities, in creation order
    pub identities: Vec<IdentitySnapshot>,
}

impl TrackingView {
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Whether an identity id is present in this view.
    pub fn contains(&self, id: &str) -> bool {
        self.identities.iter().any(|s| s.id == id)
    }

    /// Look up one identity by id.
    pub fn get(&self, id: &str) -> Option<&IdentitySnapshot> {
        self.identities.iter().find(|s| s.id == id)
    }

    /// Identity ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(|s| s.id.as_str())
    }
}
