//! Provider traits for the external vision collaborators.
//!
//! These traits give the engine a uniform interface over whatever detector,
//! camera and generative model the deployment actually runs, and let tests
//! substitute scripted fakes.

use async_trait::async_trait;

use vigil_models::Detection;

use crate::error::VisionResult;
use crate::types::{AnalyzeRequest, FrameImage, SubjectAttributes};

/// Object detection provider.
///
/// Produces one frame's worth of raw boxes per call; the tracker polls it
/// at its own fixed rate.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self) -> VisionResult<Vec<Detection>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Camera frame provider for the batched inference call.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> VisionResult<FrameImage>;
}

/// Generative attribute-inference provider.
///
/// Callers must not issue a second `analyze` while one is outstanding; the
/// analysis loop serializes around this.
#[async_trait]
pub trait AttributeEngine: Send + Sync {
    async fn analyze(&self, request: &AnalyzeRequest) -> VisionResult<Vec<SubjectAttributes>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
