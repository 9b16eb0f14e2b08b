/// Preview-video generation session
///
/// Owns one outstanding AI video-generation request for a facility-booking
/// preview, classifies backend failures into user-facing categories, and
/// derives the parameters for retry and extend operations from the last
/// attempt. Form rendering and preset catalogs live outside this crate;
/// they talk to [`Session`] and re-render from its state.

pub mod backends;
pub mod classify;
pub mod credential;
pub mod media;
pub mod request;
pub mod session;

pub use backends::{BackendConfig, GenerationBackend, VeoBackend};
pub use classify::{Classification, DefaultClassifier, ErrorClassifier};
pub use credential::{CredentialGate, EnvKeyGate, StaticGate};
pub use media::{MediaResult, PlayableMedia, ServiceHandle};
pub use request::{
    AspectRatio, GenerationMode, ImageRef, RequestDescriptor, Resolution, SourceVideo, VeoModel,
    DEFAULT_EXTEND_PROMPT,
};
pub use session::{
    Session, SessionError, SessionEvent, SessionPhase, SessionSnapshot,
};
