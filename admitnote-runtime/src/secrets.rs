use anyhow::Context;

/// Where we store secrets in the OS keyring.
///
/// Constant so upgrades don't orphan secrets.
const SERVICE: &str = "admitnote";

pub const API_KEY_ENV: &str = "ADMITNOTE_API_KEY";

// Google API keys carry this prefix; others may work behind a proxy.
const GEMINI_KEY_PREFIX: &str = "AIza";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    GeminiApiKey,
}

impl SecretKey {
    fn user(self) -> &'static str {
        match self {
            SecretKey::GeminiApiKey => "gemini_api_key",
        }
    }

    fn entry(self) -> anyhow::Result<keyring::Entry> {
        keyring::Entry::new(SERVICE, self.user()).context("open keyring entry")
    }
}

/// Trims a pasted API key and rejects anything that cannot travel in an HTTP header.
pub fn normalize_api_key(raw: &str) -> anyhow::Result<String> {
    let key = raw.trim();
    anyhow::ensure!(!key.is_empty(), "API key is empty");
    anyhow::ensure!(
        key.chars().all(|c| c.is_ascii_graphic()),
        "API key contains spaces or non-ASCII characters"
    );
    if !key.starts_with(GEMINI_KEY_PREFIX) {
        log::warn!("API key does not look like a Google API key");
    }
    Ok(key.to_string())
}

/// Validates, then stores the Gemini key. Returns the stored form.
pub fn store_api_key(raw: &str) -> anyhow::Result<String> {
    let key = normalize_api_key(raw)?;
    set_secret(SecretKey::GeminiApiKey, &key)?;
    Ok(key)
}

pub fn set_secret(key: SecretKey, value: &str) -> anyhow::Result<()> {
    key.entry()?.set_password(value).context("set secret")
}

pub fn get_secret(key: SecretKey) -> anyhow::Result<Option<String>> {
    match key.entry()?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)).context("get secret"),
    }
}

/// Missing entries count as deleted.
pub fn delete_secret(key: SecretKey) -> anyhow::Result<()> {
    match key.entry()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)).context("delete secret"),
    }
}

/// Supplies the API key at the start of every call.
pub trait ApiKeySource: Send + Sync {
    fn api_key(&self) -> anyhow::Result<Option<String>>;
}

/// Environment override first, then the OS keyring.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringApiKey;

impl ApiKeySource for KeyringApiKey {
    fn api_key(&self) -> anyhow::Result<Option<String>> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        if let Some(v) = from_env.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            return Ok(Some(v.to_string()));
        }
        get_secret(SecretKey::GeminiApiKey)
    }
}

#[derive(Clone)]
pub struct StaticApiKey(pub Option<String>);

impl std::fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticApiKey").field(&"[REDACTED]").finish()
    }
}

impl ApiKeySource for StaticApiKey {
    fn api_key(&self) -> anyhow::Result<Option<String>> {
        Ok(self.0.clone())
    }
}
