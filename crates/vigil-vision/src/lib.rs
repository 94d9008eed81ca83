//! Boundaries to the external vision collaborators.
//!
//! This crate provides:
//! - Provider traits for the object detector, the camera frame source and
//!   the generative attribute engine
//! - An HTTP client for the local inference sidecar implementing all three
//! - Prompt construction and structured-output parsing

pub mod client;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod types;

pub use client::{SidecarClient, SidecarConfig};
pub use error::{VisionError, VisionResult};
pub use prompt::{build_attribute_prompt, parse_subjects};
pub use providers::{AttributeEngine, Detector, FrameSource};
pub use types::{AnalyzeRequest, FrameImage, IdentityRef, SubjectAttributes};
