use std::path::PathBuf;

pub const APP_DIR: &str = "admitnote";
pub const CONFIG_FILE: &str = "config.json";

/// `<config dir>/admitnote/config.json`, falling back to the working directory
/// on platforms without a config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}
