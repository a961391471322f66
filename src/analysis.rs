//! Analysis of sampled frames.
//!
//! The service does not analyse video content yet. [`FrameAnalyzer`] is the
//! seam where that capability plugs in: it is called once per request, after
//! sampling and before cleanup, while the frame files still exist.
//! [`PlaceholderAnalyzer`] is the default and only echoes the request.

use crate::{error::ClipsightError, sampler::SampleResult};

/// Analysis category used when the request does not name one.
pub const DEFAULT_ANALYSIS_TYPE: &str = "general";

/// Everything an analyzer gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    /// Free-text prompt from the request, if any.
    pub prompt: Option<&'a str>,
    /// Requested analysis category.
    pub analysis_type: &'a str,
    /// Sampled frames and duration. Frame paths are readable for the
    /// duration of the call.
    pub sample: &'a SampleResult,
}

/// Produces the `result` text of an analysis response.
///
/// Runs on a blocking thread, so implementations may do synchronous I/O.
pub trait FrameAnalyzer: Send + Sync {
    /// Analyse the sampled frames.
    fn analyze(&self, context: &AnalysisContext<'_>) -> Result<String, ClipsightError>;
}

/// Echoes the analysis type and prompt back without inspecting the frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAnalyzer;

impl FrameAnalyzer for PlaceholderAnalyzer {
    fn analyze(&self, context: &AnalysisContext<'_>) -> Result<String, ClipsightError> {
        Ok(match context.prompt {
            Some(prompt) => format!("Analysis completed for {}: {prompt}", context.analysis_type),
            None => format!("Analysis completed for {}", context.analysis_type),
        })
    }
}
