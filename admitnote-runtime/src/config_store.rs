use admitnote_core::config::AppConfig;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<AppConfig> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: AppConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// First run has no file yet; that is not an error.
    pub fn load_or_default(&self) -> anyhow::Result<AppConfig> {
        if !self.path.exists() {
            log::debug!("no config at {}, using defaults", self.path.display());
            return Ok(AppConfig::default());
        }
        self.load()
    }

    /// Rejects settings that could never produce a request, then writes atomically.
    pub fn save(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        check(cfg)?;
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config directory: {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        write_synced(&tmp, &json).with_context(|| format!("write temp: {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("replace config: {}", self.path.display())));
        }
        Ok(())
    }

    pub fn update(&self, f: impl FnOnce(&mut AppConfig)) -> anyhow::Result<AppConfig> {
        let mut cfg = self.load_or_default()?;
        f(&mut cfg);
        self.save(&cfg)?;
        Ok(cfg)
    }
}

fn check(cfg: &AppConfig) -> anyhow::Result<()> {
    anyhow::ensure!(!cfg.model.trim().is_empty(), "model name is empty");
    let url = url::Url::parse(cfg.base_url.trim())
        .with_context(|| format!("invalid base url: {}", cfg.base_url))?;
    anyhow::ensure!(
        matches!(url.scheme(), "http" | "https"),
        "base url must be http or https: {}",
        cfg.base_url
    );
    anyhow::ensure!(cfg.retry.max_attempts >= 1, "retry.max_attempts must be at least 1");
    Ok(())
}

// The rename only publishes bytes that already reached the disk.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
