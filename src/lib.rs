//! # clipsight
//!
//! Preview sampling for remote videos: download a video under a size cap,
//! pick a handful of frames spread evenly across its timeline, and serve
//! their timestamps and the video's duration from an analysis endpoint.
//!
//! Decoding goes through FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate, frames are
//! encoded with [`image`], downloads use [`reqwest`], and the endpoint is an
//! [`axum`] router.
//!
//! ## Quick Start
//!
//! ### Sample a local file
//!
//! ```no_run
//! use clipsight::{SampleOptions, sampler};
//!
//! let output = tempfile::tempdir().unwrap();
//! let result = sampler::sample("input.mp4", output.path(), &SampleOptions::new()).unwrap();
//! println!("{:?} over {:.2}s", result.timestamps(), result.duration_seconds);
//! ```
//!
//! ### Run the whole pipeline
//!
//! ```no_run
//! use clipsight::{AnalysisRequest, Pipeline, ServiceOptions};
//!
//! # async fn example() -> Result<(), clipsight::ClipsightError> {
//! let pipeline = Pipeline::new(ServiceOptions::new());
//! let response = pipeline
//!     .analyze(&AnalysisRequest::new("https://example.com/clip.mp4"))
//!     .await?;
//! println!("{}", response.analysis.result);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! - **Fetch**: one streaming GET, rejected up front when the declared
//!   length is over the cap and cut off mid-stream when the received bytes
//!   pass it.
//! - **Sample**: one forward decode pass keeping every
//!   `max(1, total_frames / max_frames)`-th frame, scaled to 640×360 and
//!   written as quality-85 JPEGs.
//! - **Analyse**: a pluggable [`FrameAnalyzer`] turns the frames into a
//!   result string.
//! - **Clean up**: every file lives in a per-request [`RequestWorkspace`]
//!   that is removed on every exit path.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the build machine.

pub mod analysis;
pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod fetch;
pub mod media;
pub mod metadata;
pub mod pipeline;
pub mod sampler;
pub mod server;
pub mod validation;
pub mod workspace;

pub use analysis::{AnalysisContext, DEFAULT_ANALYSIS_TYPE, FrameAnalyzer, PlaceholderAnalyzer};
pub use configuration::{FetchOptions, SampleOptions, ServiceOptions};
pub use conversion::format_timestamp;
pub use error::ClipsightError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use fetch::{Fetcher, LocalMediaHandle, check_declared_size};
pub use media::MediaFile;
pub use metadata::{MediaMetadata, VideoMetadata};
pub use pipeline::{AnalysisReport, AnalysisRequest, AnalysisResponse, Pipeline};
pub use sampler::{FrameArtifact, FramePlan, FrameSampler, SampleResult};
pub use server::{ANALYZE_PATH, ApiError, ErrorResponse, router, serve};
pub use validation::ValidationReport;
pub use workspace::RequestWorkspace;
