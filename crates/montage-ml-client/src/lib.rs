//! Clients for the ML services behind montage assembly.
//!
//! The shot-detection service cuts a source video into raw shots; the
//! text-video matching service picks clips for each narration line. Both are
//! reached over HTTP and exposed through capability traits so callers can
//! substitute fakes.

pub mod client;
pub mod error;
pub mod types;

pub use client::{MatchingService, MlClient, MlClientConfig, ShotDetector};
pub use error::{MlError, MlResult};
pub use types::{
    DetectedShot, LineMatch, MatchRequest, MatchResponse, MatchedClip, ScriptLine,
    ShotDetectionRequest, ShotDetectionResponse,
};
