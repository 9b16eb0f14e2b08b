/// Generation session state machine
///
/// Owns the single outstanding generation request: current state, the
/// descriptor that produced it, and the last successful result. Operations
/// are `start`, `retry`, `reset`, `edit_and_retry`, `prepare_extension`,
/// and `select_credential`. Every transition is emitted to subscribers;
/// the credential prompt is a second, independent output that never folds
/// into the state union.
use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::backends::GenerationBackend;
use crate::classify::{DefaultClassifier, ErrorClassifier};
use crate::credential::CredentialGate;
use crate::media::MediaResult;
use crate::request::RequestDescriptor;

/// Session operation errors. All of them leave the current state untouched.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a generation request is already running")]
    ReentrantStart,
    #[error("no usable API credential is configured")]
    CredentialMissing,
    #[error("no previous request to retry")]
    NothingToRetry,
    #[error("extension requires a completed 720p result")]
    ExtensionUnavailable,
    #[error("credential selection failed: {0}")]
    CredentialPrompt(String),
}

/// Current state of the session. `request` is always the descriptor that
/// produced the state and is the single source of truth for retry/extend
/// derivation.
#[derive(Debug)]
pub enum SessionState {
    Idle {
        /// Descriptor offered to the form as a starting point, from
        /// `edit_and_retry` or `prepare_extension`. Cleared on `start`.
        prefill: Option<RequestDescriptor>,
    },
    Loading {
        request: RequestDescriptor,
    },
    Success {
        request: RequestDescriptor,
        media: MediaResult,
    },
    Error {
        request: RequestDescriptor,
        message: String,
    },
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle { .. } => SessionPhase::Idle,
            Self::Loading { .. } => SessionPhase::Loading,
            Self::Success { .. } => SessionPhase::Success,
            Self::Error { .. } => SessionPhase::Error,
        }
    }
}

/// Which of the four views the UI should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Success,
    Error,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Cloneable view of the current state. The owning [`MediaResult`] never
/// leaves the machine; observers get its playable location.
#[derive(Debug, Clone)]
pub enum SessionSnapshot {
    Idle {
        prefill: Option<RequestDescriptor>,
    },
    Loading {
        request: RequestDescriptor,
    },
    Success {
        request: RequestDescriptor,
        playable: String,
    },
    Error {
        request: RequestDescriptor,
        message: String,
    },
}

/// Event delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The state machine moved to a new phase.
    Transition(SessionPhase),
    /// The user should be asked to select an API credential. Independent of
    /// the state: it fires both when a request never started and when a
    /// failure classified as a credential problem.
    CredentialPrompt,
}

struct Inner {
    state: SessionState,
    /// Attempt counter; a resolution applies only if the counter still
    /// matches the attempt that produced it.
    seq: u64,
    subscribers: Vec<Sender<SessionEvent>>,
}

/// The single active generation workflow instance.
///
/// Cheap to clone; clones share the same state. `start` spawns the backend
/// call on the ambient tokio runtime, so the state reads `Loading` before
/// the result resolves.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    inner: Arc<Mutex<Inner>>,
    backend: Arc<dyn GenerationBackend>,
    gate: Arc<dyn CredentialGate>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl Session {
    /// Create a session over a backend and credential gate, with the
    /// default failure classifier.
    pub fn new(backend: Arc<dyn GenerationBackend>, gate: Arc<dyn CredentialGate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Idle { prefill: None },
                seq: 0,
                subscribers: Vec::new(),
            })),
            backend,
            gate,
            classifier: Arc::new(DefaultClassifier),
        }
    }

    /// Swap in a different failure classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to transitions and credential prompts. Dropped receivers
    /// are pruned on the next emit.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.inner.lock().subscribers.push(tx);
        rx
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock().state.phase()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.inner.lock().state {
            SessionState::Idle { prefill } => SessionSnapshot::Idle {
                prefill: prefill.clone(),
            },
            SessionState::Loading { request } => SessionSnapshot::Loading {
                request: request.clone(),
            },
            SessionState::Success { request, media } => SessionSnapshot::Success {
                request: request.clone(),
                playable: media.playable.location().to_string(),
            },
            SessionState::Error { request, message } => SessionSnapshot::Error {
                request: request.clone(),
                message: message.clone(),
            },
        }
    }

    /// Start one generation attempt.
    ///
    /// Rejected while a request is in flight. Checks the credential gate
    /// first; a gate error counts as "no credential", which emits the
    /// prompt event instead of entering `Loading`.
    pub async fn start(&self, request: RequestDescriptor) -> Result<(), SessionError> {
        if self.phase() == SessionPhase::Loading {
            return Err(SessionError::ReentrantStart);
        }

        let has_credential = match self.gate.has_credential().await {
            Ok(answer) => answer,
            Err(err) => {
                log::warn!(
                    "session {}: credential check failed, assuming none selected: {err:#}",
                    self.id
                );
                false
            }
        };
        if !has_credential {
            Self::emit(&mut self.inner.lock(), SessionEvent::CredentialPrompt);
            return Err(SessionError::CredentialMissing);
        }

        let seq = {
            let mut inner = self.inner.lock();
            // Re-check under the lock: another clone may have started.
            if matches!(inner.state, SessionState::Loading { .. }) {
                return Err(SessionError::ReentrantStart);
            }
            inner.seq += 1;
            inner.state = SessionState::Loading {
                request: request.clone(),
            };
            Self::emit(&mut inner, SessionEvent::Transition(SessionPhase::Loading));
            inner.seq
        };
        log::debug!(
            "session {}: attempt {seq} started via {} ({:?})",
            self.id,
            self.backend.name(),
            request.mode
        );

        let session = self.clone();
        tokio::spawn(async move {
            let outcome = session.backend.generate(&request).await;
            session.resolve(seq, request, outcome);
        });
        Ok(())
    }

    /// Re-issue the last request, unmodified, from Success or Error.
    pub async fn retry(&self) -> Result<(), SessionError> {
        let request = {
            let inner = self.inner.lock();
            match &inner.state {
                SessionState::Success { request, .. } | SessionState::Error { request, .. } => {
                    request.clone()
                }
                _ => return Err(SessionError::NothingToRetry),
            }
        };
        self.start(request).await
    }

    /// Discard everything and return to a fresh Idle. Any held media is
    /// released; a still-pending resolution becomes stale.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.seq += 1;
        inner.state = SessionState::Idle { prefill: None };
        Self::emit(&mut inner, SessionEvent::Transition(SessionPhase::Idle));
    }

    /// From an error, go back to the form with the failed descriptor
    /// offered for editing. From any other state, behaves like [`reset`].
    ///
    /// [`reset`]: Session::reset
    pub fn edit_and_retry(&self) {
        let mut inner = self.inner.lock();
        inner.seq += 1;
        let prefill = match &inner.state {
            SessionState::Error { request, .. } => Some(request.clone()),
            _ => None,
        };
        inner.state = SessionState::Idle { prefill };
        Self::emit(&mut inner, SessionEvent::Transition(SessionPhase::Idle));
    }

    /// From a 720p success, derive the extension descriptor and return to
    /// the form with it prefilled. The held media is consumed: its bytes
    /// and service handle move into the descriptor, and its playable
    /// reference is released with the transition.
    pub fn prepare_extension(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        match &inner.state {
            SessionState::Success { request, .. } if request.resolution.supports_extension() => {}
            _ => return Err(SessionError::ExtensionUnavailable),
        }

        inner.seq += 1;
        let prior = std::mem::replace(&mut inner.state, SessionState::Idle { prefill: None });
        if let SessionState::Success { request, media } = prior {
            let derived = request.derive_extension(&media);
            inner.state = SessionState::Idle {
                prefill: Some(derived),
            };
            // `media` dropped here, releasing the playable with the transition.
        }
        Self::emit(&mut inner, SessionEvent::Transition(SessionPhase::Idle));
        Ok(())
    }

    /// Run the credential selection interaction; if the session sits in an
    /// error afterwards, re-issue the failed request automatically.
    pub async fn select_credential(&self) -> Result<(), SessionError> {
        self.gate
            .prompt_select()
            .await
            .map_err(|err| SessionError::CredentialPrompt(format!("{err:#}")))?;

        if self.phase() == SessionPhase::Error {
            self.retry().await
        } else {
            Ok(())
        }
    }

    /// Apply the outcome of attempt `seq`. Stale outcomes (the attempt
    /// counter moved on, or the state already left Loading) are discarded.
    fn resolve(&self, seq: u64, request: RequestDescriptor, outcome: Result<MediaResult>) {
        let mut inner = self.inner.lock();
        if inner.seq != seq || !matches!(inner.state, SessionState::Loading { .. }) {
            log::debug!("session {}: discarding stale resolution of attempt {seq}", self.id);
            return;
        }

        match outcome {
            Ok(media) => {
                inner.state = SessionState::Success { request, media };
                Self::emit(&mut inner, SessionEvent::Transition(SessionPhase::Success));
            }
            Err(err) => {
                let raw = format!("{err:#}");
                log::warn!("session {}: attempt {seq} failed: {raw}", self.id);
                let classified = self.classifier.classify(&raw);
                inner.state = SessionState::Error {
                    request,
                    message: classified.message,
                };
                Self::emit(&mut inner, SessionEvent::Transition(SessionPhase::Error));
                if classified.prompt_credential {
                    Self::emit(&mut inner, SessionEvent::CredentialPrompt);
                }
            }
        }
    }

    fn emit(inner: &mut Inner, event: SessionEvent) {
        inner
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
