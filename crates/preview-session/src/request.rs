/// Generation request model
///
/// Immutable descriptors for one preview-video request. A new descriptor is
/// built per request: retries reuse the prior descriptor unmodified, and
/// extensions derive a fresh descriptor from the prior one plus its result.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::media::{MediaResult, ServiceHandle};

/// Default continuation prompt offered when extending a finished clip.
pub const DEFAULT_EXTEND_PROMPT: &str =
    "Zoom out to reveal the entire tournament crowd cheering";

/// Veo model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeoModel {
    /// Fast preview-quality model
    VeoFast,
    /// Full-quality model
    Veo,
}

impl VeoModel {
    /// Backend model identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::VeoFast => "veo-3.0-fast-generate-001",
            Self::Veo => "veo-3.0-generate-001",
        }
    }
}

impl std::fmt::Display for VeoModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Output aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    Landscape,
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

/// Output resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    P720,
    P1080,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }

    /// Whether a clip at this tier can be extended. Only 720p supports it.
    pub fn supports_extension(self) -> bool {
        matches!(self, Self::P720)
    }
}

/// What kind of generation is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Fresh clip from a text prompt
    TextToVideo,
    /// Continuation of a previously generated clip
    ExtendVideo,
}

/// Still-image input (start/end frame, reference, or style image)
#[derive(Clone, PartialEq)]
pub struct ImageRef {
    pub data: Arc<Vec<u8>>,
    pub mime_type: String,
}

impl ImageRef {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data: Arc::new(data),
            mime_type: mime_type.into(),
        }
    }
}

impl std::fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRef")
            .field("bytes_len", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Source clip for an extension request: the prior result's bytes plus the
/// backend handle of the exact artifact to continue from.
#[derive(Clone, PartialEq)]
pub struct SourceVideo {
    pub data: Arc<Vec<u8>>,
    pub handle: ServiceHandle,
}

impl std::fmt::Debug for SourceVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceVideo")
            .field("bytes_len", &self.data.len())
            .field("handle", &self.handle)
            .finish()
    }
}

/// Immutable specification of one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub prompt: String,
    pub model: VeoModel,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub mode: GenerationMode,

    /// Clip being continued; present only for [`GenerationMode::ExtendVideo`].
    pub input_video: Option<SourceVideo>,

    pub start_frame: Option<ImageRef>,
    pub end_frame: Option<ImageRef>,
    pub reference_images: Vec<ImageRef>,
    pub style_image: Option<ImageRef>,
    pub is_looping: bool,
}

impl RequestDescriptor {
    /// Text-to-video request with the booking-preview defaults.
    pub fn text_to_video(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: VeoModel::VeoFast,
            aspect_ratio: AspectRatio::Landscape,
            resolution: Resolution::P720,
            mode: GenerationMode::TextToVideo,
            input_video: None,
            start_frame: None,
            end_frame: None,
            reference_images: Vec::new(),
            style_image: None,
            is_looping: false,
        }
    }

    /// With model
    pub fn with_model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }

    /// With aspect ratio
    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// With resolution
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// With a starting frame
    pub fn with_start_frame(mut self, frame: ImageRef) -> Self {
        self.start_frame = Some(frame);
        self
    }

    /// With an ending frame
    pub fn with_end_frame(mut self, frame: ImageRef) -> Self {
        self.end_frame = Some(frame);
        self
    }

    /// With reference images
    pub fn with_reference_images(mut self, images: Vec<ImageRef>) -> Self {
        self.reference_images = images;
        self
    }

    /// With a style image
    pub fn with_style_image(mut self, image: ImageRef) -> Self {
        self.style_image = Some(image);
        self
    }

    /// With looping output
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.is_looping = looping;
        self
    }

    /// Descriptor for extending `media`, which this request produced.
    ///
    /// Carries model and aspect ratio forward, forces the extend-eligible
    /// resolution, resets the prompt to the default continuation text, and
    /// clears every single-shot input: extension only operates on video
    /// continuation.
    pub fn derive_extension(&self, media: &MediaResult) -> RequestDescriptor {
        RequestDescriptor {
            prompt: DEFAULT_EXTEND_PROMPT.to_string(),
            model: self.model,
            aspect_ratio: self.aspect_ratio,
            resolution: Resolution::P720,
            mode: GenerationMode::ExtendVideo,
            input_video: Some(SourceVideo {
                data: media.bytes.clone(),
                handle: media.service_handle.clone(),
            }),
            start_frame: None,
            end_frame: None,
            reference_images: Vec::new(),
            style_image: None,
            is_looping: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::PlayableMedia;

    #[test]
    fn test_text_to_video_defaults() {
        let request = RequestDescriptor::text_to_video("an empty court at dawn");

        assert_eq!(request.mode, GenerationMode::TextToVideo);
        assert_eq!(request.model, VeoModel::VeoFast);
        assert_eq!(request.resolution, Resolution::P720);
        assert!(request.input_video.is_none());
        assert!(!request.is_looping);
    }

    #[test]
    fn test_extension_eligibility_is_720p_only() {
        assert!(Resolution::P720.supports_extension());
        assert!(!Resolution::P1080.supports_extension());
    }

    #[test]
    fn test_derive_extension_clears_single_shot_inputs() {
        let request = RequestDescriptor::text_to_video("a doubles match at golden hour")
            .with_model(VeoModel::Veo)
            .with_aspect_ratio(AspectRatio::Portrait)
            .with_start_frame(ImageRef::new(vec![1, 2], "image/png"))
            .with_style_image(ImageRef::new(vec![3], "image/jpeg"))
            .with_looping(true);
        let media = MediaResult::new(
            PlayableMedia::new("clip.mp4"),
            vec![9, 9, 9],
            ServiceHandle::new("op/42"),
        );

        let derived = request.derive_extension(&media);

        assert_eq!(derived.mode, GenerationMode::ExtendVideo);
        assert_eq!(derived.resolution, Resolution::P720);
        assert_eq!(derived.prompt, DEFAULT_EXTEND_PROMPT);
        assert_eq!(derived.model, VeoModel::Veo);
        assert_eq!(derived.aspect_ratio, AspectRatio::Portrait);

        let source = derived.input_video.expect("extension carries source video");
        assert_eq!(source.handle, ServiceHandle::new("op/42"));
        assert_eq!(*source.data, vec![9, 9, 9]);

        assert!(derived.start_frame.is_none());
        assert!(derived.end_frame.is_none());
        assert!(derived.reference_images.is_empty());
        assert!(derived.style_image.is_none());
        assert!(!derived.is_looping);
    }
}
