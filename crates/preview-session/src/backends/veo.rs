/// Veo API backend integration
///
/// Issues a long-running generation operation against the Generative
/// Language API, polls it to completion, downloads the clip, and stores it
/// under the output directory. Error bodies are surfaced verbatim so the
/// session's classifier can match the backend's wording.
use super::{BackendConfig, GenerationBackend};
use crate::media::{MediaResult, PlayableMedia, ServiceHandle};
use crate::request::{GenerationMode, RequestDescriptor};
use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Veo generation backend
pub struct VeoBackend {
    api_url: String,
    api_key: String,
    output_dir: PathBuf,
    poll_interval: Duration,
    timeout: Duration,
    client: reqwest::Client,
}

impl VeoBackend {
    /// Create new Veo backend
    pub fn new(config: BackendConfig) -> Result<Self> {
        let api_key = config.api_key.context("Veo backend requires api_key")?;
        let api_url = config
            .api_url
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());

        Ok(Self {
            api_url,
            api_key,
            output_dir: config.output_dir,
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(600)),
            client: reqwest::Client::new(),
        })
    }

    /// Submit the long-running generation operation
    async fn submit(&self, request: &RequestDescriptor) -> Result<String> {
        let body = build_operation_request(request)?;

        let response = self
            .client
            .post(format!(
                "{}/models/{}:predictLongRunning",
                self.api_url,
                request.model.id()
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Veo API error: {} - {}",
                response.status(),
                response.text().await?
            );
        }

        let operation: OperationRef = response.json().await?;
        Ok(operation.name)
    }

    /// Poll the operation until it resolves
    async fn poll(&self, operation_name: &str) -> Result<GeneratedVideo> {
        let started = Instant::now();
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(format!("{}/{}", self.api_url, operation_name))
                .header("x-goog-api-key", &self.api_key)
                .send()
                .await?;

            if !response.status().is_success() {
                anyhow::bail!(
                    "Failed to poll operation: {} - {}",
                    response.status(),
                    response.text().await?
                );
            }

            let operation: Operation = response.json().await?;
            if operation.done {
                if let Some(error) = operation.error {
                    anyhow::bail!("{}", error.message);
                }
                return operation
                    .response
                    .and_then(|r| r.generate_video_response)
                    .and_then(|r| r.generated_samples.into_iter().next())
                    .map(|sample| sample.video)
                    .context("operation finished without a generated video");
            }

            if started.elapsed() > self.timeout {
                anyhow::bail!(
                    "generation timed out after {}s",
                    self.timeout.as_secs()
                );
            }
        }
    }

    /// Download the finished clip
    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(uri)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Download failed: {}", response.status());
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl GenerationBackend for VeoBackend {
    fn name(&self) -> &str {
        "veo"
    }

    async fn generate(&self, request: &RequestDescriptor) -> Result<MediaResult> {
        let operation_name = self.submit(request).await?;
        log::debug!("veo: operation {operation_name} submitted");

        let video = self.poll(&operation_name).await?;
        let bytes = self.download(&video.uri).await?;

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.mp4", Uuid::new_v4()));
        std::fs::write(&path, &bytes).context("store downloaded clip")?;

        let location = path.to_string_lossy().into_owned();
        let playable = PlayableMedia::with_release_hook(location, |loc| {
            let _ = std::fs::remove_file(loc);
        });

        Ok(MediaResult::new(
            playable,
            bytes,
            ServiceHandle::new(video.uri),
        ))
    }
}

fn build_operation_request(request: &RequestDescriptor) -> Result<OperationRequest> {
    let video = match request.mode {
        GenerationMode::TextToVideo => None,
        GenerationMode::ExtendVideo => {
            let source = request
                .input_video
                .as_ref()
                .context("extend request is missing its source video")?;
            Some(VideoPayload {
                bytes_base64_encoded: base64::engine::general_purpose::STANDARD
                    .encode(source.data.as_slice()),
                mime_type: "video/mp4".to_string(),
                uri: Some(source.handle.as_str().to_string()),
            })
        }
    };

    Ok(OperationRequest {
        instances: vec![Instance {
            prompt: request.prompt.clone(),
            video,
        }],
        parameters: Parameters {
            aspect_ratio: request.aspect_ratio.as_str().to_string(),
            resolution: request.resolution.as_str().to_string(),
        },
    })
}

#[derive(Debug, Serialize)]
struct OperationRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoPayload {
    bytes_base64_encoded: String,
    mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    aspect_ratio: String,
    resolution: String,
}

#[derive(Debug, Deserialize)]
struct OperationRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[allow(dead_code)]
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResult>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: GeneratedVideo,
}

#[derive(Debug, Deserialize)]
struct GeneratedVideo {
    uri: String,
}
