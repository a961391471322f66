//! Request orchestration.
//!
//! [`Pipeline::analyze`] validates a request, downloads the video into a
//! fresh [`RequestWorkspace`], samples it on a blocking thread, hands the
//! frames to the configured [`FrameAnalyzer`], and assembles the response.
//! The workspace is closed whatever the outcome, so no file from the request
//! survives it.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    analysis::{AnalysisContext, DEFAULT_ANALYSIS_TYPE, FrameAnalyzer, PlaceholderAnalyzer},
    configuration::ServiceOptions,
    error::ClipsightError,
    fetch::Fetcher,
    sampler::{self, SampleResult},
    workspace::RequestWorkspace,
};

/// Body of an analysis request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// URL of the video to analyse. Required.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Free-text prompt for the analyzer.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Analysis category, `"general"` when absent.
    #[serde(default)]
    pub analysis_type: Option<String>,
}

impl AnalysisRequest {
    /// Create a request for `video_url` with no prompt and the default type.
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: Some(video_url.into()),
            ..Self::default()
        }
    }

    /// The video URL, trimmed, or a validation error when missing or blank.
    pub fn validated_url(&self) -> Result<&str, ClipsightError> {
        self.video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ClipsightError::Validation("Video URL is required".to_string()))
    }

    /// The requested analysis type, or the default.
    pub fn analysis_type(&self) -> &str {
        self.analysis_type
            .as_deref()
            .unwrap_or(DEFAULT_ANALYSIS_TYPE)
    }
}

/// Successful analysis response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    /// The analysis envelope.
    pub analysis: AnalysisReport,
}

/// Analysis result, frame references, timestamps and duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Text produced by the analyzer.
    pub result: String,
    /// File names of the encoded frames, in timeline order.
    pub frames: Vec<String>,
    /// Timestamps of the frames, `H:MM:SS[.ffffff]`.
    pub timestamps: Vec<String>,
    /// Duration of the video in seconds, two decimals.
    pub duration: f64,
}

impl AnalysisReport {
    fn new(result: String, sample: &SampleResult) -> Self {
        let frames = sample
            .frames
            .iter()
            .map(|frame| {
                frame
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| frame.path.display().to_string())
            })
            .collect();

        Self {
            result,
            frames,
            timestamps: sample.timestamps(),
            duration: sample.duration_seconds,
        }
    }
}

/// Download → sample → analyse, with guaranteed cleanup.
#[derive(Clone)]
pub struct Pipeline {
    options: ServiceOptions,
    fetcher: Fetcher,
    analyzer: Arc<dyn FrameAnalyzer>,
}

impl Pipeline {
    /// Create a pipeline using [`PlaceholderAnalyzer`].
    pub fn new(options: ServiceOptions) -> Self {
        let fetcher = Fetcher::new(options.fetch.clone());
        Self {
            options,
            fetcher,
            analyzer: Arc::new(PlaceholderAnalyzer),
        }
    }

    /// Replace the analyzer invoked on sampled frames.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn FrameAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// The options this pipeline was built with.
    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Run one analysis request end to end.
    ///
    /// Validation happens before any network or filesystem work. Every file
    /// created for the request is removed before this returns.
    ///
    /// Once the workspace exists the request runs on its own task. Dropping
    /// the returned future (a client disconnecting, say) does not stop it:
    /// the download, sampling and analysis run to completion and the
    /// workspace is closed after the last frame is written.
    ///
    /// # Errors
    ///
    /// [`ClipsightError::Validation`] for a missing URL; otherwise the first
    /// error raised by the download, sampling or analysis stage.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ClipsightError> {
        let url = request.validated_url()?.to_string();

        let workspace = RequestWorkspace::create(self.options.scratch_directory.as_deref())?;
        log::info!("Request {}: analysing {url}", workspace.id());

        let pipeline = self.clone();
        let request = request.clone();
        let task = tokio::spawn(async move {
            let outcome = pipeline.run(&request, &url, workspace.path()).await;
            match &outcome {
                Ok(response) => log::info!(
                    "Request {}: {} frame(s), duration {:.2}s",
                    workspace.id(),
                    response.analysis.frames.len(),
                    response.analysis.duration,
                ),
                Err(error) => log::error!("Request {} failed: {error}", workspace.id()),
            }

            workspace.close();
            outcome
        });

        task.await
            .map_err(|error| ClipsightError::TaskFailed(error.to_string()))?
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        url: &str,
        directory: &Path,
    ) -> Result<AnalysisResponse, ClipsightError> {
        let media = self.fetcher.download(url, directory).await?;

        let sample_options = self.options.sample.clone();
        let analyzer = Arc::clone(&self.analyzer);
        let output_directory = directory.to_path_buf();
        let prompt = request.prompt.clone();
        let analysis_type = request.analysis_type().to_string();

        let (result, sample) = tokio::task::spawn_blocking(move || {
            let sample = sampler::sample(&media.path, &output_directory, &sample_options)?;
            let result = analyzer.analyze(&AnalysisContext {
                prompt: prompt.as_deref(),
                analysis_type: &analysis_type,
                sample: &sample,
            })?;
            Ok::<_, ClipsightError>((result, sample))
        })
        .await
        .map_err(|error| ClipsightError::TaskFailed(error.to_string()))??;

        Ok(AnalysisResponse {
            analysis: AnalysisReport::new(result, &sample),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::sampler::FrameArtifact;

    #[test]
    fn missing_or_blank_url_is_a_validation_error() {
        for request in [
            AnalysisRequest::default(),
            AnalysisRequest::new(""),
            AnalysisRequest::new("   "),
        ] {
            let error = request.validated_url().unwrap_err();
            assert!(error.is_client_error());
            assert_eq!(error.to_string(), "Video URL is required");
        }
    }

    #[test]
    fn request_uses_camel_case_fields_and_defaults() {
        let request: AnalysisRequest = serde_json::from_str(
            r#"{"videoUrl": " https://example.com/a.mp4 ", "prompt": "describe"}"#,
        )
        .unwrap();
        assert_eq!(request.validated_url().unwrap(), "https://example.com/a.mp4");
        assert_eq!(request.prompt.as_deref(), Some("describe"));
        assert_eq!(request.analysis_type(), "general");
    }

    #[test]
    fn report_lists_frame_file_names_and_timestamps() {
        let sample = SampleResult {
            frames: vec![
                FrameArtifact {
                    path: PathBuf::from("/tmp/clipsight-x/frame_0.jpg"),
                    frame_index: 0,
                    timestamp: "0:00:00".to_string(),
                },
                FrameArtifact {
                    path: PathBuf::from("/tmp/clipsight-x/frame_1.jpg"),
                    frame_index: 180,
                    timestamp: "0:00:06".to_string(),
                },
            ],
            duration_seconds: 30.0,
        };

        let report = AnalysisReport::new("done".to_string(), &sample);
        assert_eq!(report.frames, ["frame_0.jpg", "frame_1.jpg"]);
        assert_eq!(report.timestamps, ["0:00:00", "0:00:06"]);
        assert_eq!(report.duration, 30.0);

        let json = serde_json::to_value(AnalysisResponse { analysis: report }).unwrap();
        assert_eq!(json["analysis"]["result"], "done");
        assert_eq!(json["analysis"]["frames"][1], "frame_1.jpg");
    }

    #[test]
    fn pipeline_keeps_its_options() {
        let options = ServiceOptions::new()
            .with_sample(crate::SampleOptions::new().with_max_frames(3))
            .with_scratch_directory("/var/tmp/clipsight");
        let pipeline = Pipeline::new(options.clone());

        assert_eq!(pipeline.options().sample, options.sample);
        assert_eq!(pipeline.options().fetch, options.fetch);
        assert_eq!(
            pipeline.options().scratch_directory.as_deref(),
            Some(Path::new("/var/tmp/clipsight"))
        );
    }

    #[tokio::test]
    async fn validation_failure_touches_no_files() {
        let scratch = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(ServiceOptions::new().with_scratch_directory(scratch.path()));

        let error = pipeline
            .analyze(&AnalysisRequest::default())
            .await
            .unwrap_err();

        assert!(error.is_client_error());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
