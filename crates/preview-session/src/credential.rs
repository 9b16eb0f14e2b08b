/// Credential gate
///
/// Reports whether a usable API credential is configured and can open a
/// selection interaction. The session treats a failed check as "no
/// credential selected" and prompts rather than issuing a request that
/// cannot be authorized.
use anyhow::Result;
use async_trait::async_trait;

/// Credential availability and selection seam.
#[async_trait]
pub trait CredentialGate: Send + Sync {
    /// Whether a usable credential is currently configured.
    async fn has_credential(&self) -> Result<bool>;

    /// Open the credential selection interaction and wait for it to finish.
    async fn prompt_select(&self) -> Result<()>;
}

/// Gate backed by an API-key environment variable.
pub struct EnvKeyGate {
    var: String,
}

impl EnvKeyGate {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Gate over the conventional Gemini API key variable.
    pub fn gemini() -> Self {
        Self::new("GEMINI_API_KEY")
    }
}

#[async_trait]
impl CredentialGate for EnvKeyGate {
    async fn has_credential(&self) -> Result<bool> {
        Ok(std::env::var(&self.var)
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false))
    }

    async fn prompt_select(&self) -> Result<()> {
        anyhow::bail!(
            "credential is read from the {} environment variable and cannot be selected interactively",
            self.var
        )
    }
}

/// Fixed-answer gate for embedding contexts that manage credentials
/// themselves, and for tests.
pub struct StaticGate {
    available: bool,
}

impl StaticGate {
    pub fn available() -> Self {
        Self { available: true }
    }

    pub fn unavailable() -> Self {
        Self { available: false }
    }
}

#[async_trait]
impl CredentialGate for StaticGate {
    async fn has_credential(&self) -> Result<bool> {
        Ok(self.available)
    }

    async fn prompt_select(&self) -> Result<()> {
        Ok(())
    }
}
