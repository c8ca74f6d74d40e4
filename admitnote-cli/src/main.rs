use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use admitnote_core::types::{ClinicalData, Language, StatusKind};
use admitnote_engine::error::ParseError;
use admitnote_engine::orchestrator::ParseInput;
use admitnote_engine::traits::ParseObserver;
use admitnote_providers::image::{encode_inline_image, mime_type_for_path};
use admitnote_runtime::config_store::ConfigStore;
use admitnote_runtime::defaults::default_config_path;
use admitnote_runtime::runtime_engine::build_service_from_config;
use admitnote_runtime::secrets::{SecretKey, delete_secret, store_api_key};
use anyhow::Context;
use clap::{Parser, Subcommand};

/// Turn free-text clinical notes into structured admission-note fields.
#[derive(Debug, Parser)]
#[command(name = "admitnote", version, about)]
struct Cli {
    /// Path to the JSON settings file.
    #[arg(short, long, env = "ADMITNOTE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract admission-note fields and print them as JSON.
    Parse {
        /// Notes file, or `-` for stdin.
        #[arg(short, long)]
        notes: Option<String>,

        /// Photo or scan of the notes.
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Language for status and error messages (zh-TW, en-US).
        #[arg(short, long)]
        language: Option<Language>,

        #[arg(long)]
        skip_connectivity_check: bool,
    },

    /// Store the Gemini API key in the OS keyring. Reads stdin when omitted.
    SetKey { key: Option<String> },

    ClearKey,

    ShowConfig,

    SetModel { model: String },

    SetLanguage { language: Language },
}

/// Progress goes to stderr so stdout stays pure JSON.
struct StderrObserver;

impl ParseObserver for StderrObserver {
    fn on_status(&self, message: &str, kind: StatusKind) {
        let tag = match kind {
            StatusKind::Loading => "..",
            StatusKind::Success => "ok",
            StatusKind::Error => "!!",
        };
        eprintln!("[{tag}] {message}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // The observer already printed the localized message.
        Err(e) if e.downcast_ref::<ParseError>().is_some() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = ConfigStore::at_path(cli.config.unwrap_or_else(default_config_path));
    log::debug!("config file: {}", store.path().display());

    match cli.command {
        Command::Parse {
            notes,
            image,
            language,
            skip_connectivity_check,
        } => {
            let input = build_input(notes.as_deref(), image.as_deref())?;
            let service = build_service_from_config(store, skip_connectivity_check)?;

            let mut cfg = service.load_ai_config()?;
            if let Some(lang) = language {
                cfg.language = lang;
            }

            let data = service.parse_with_config(&cfg, &input, &StderrObserver).await?;
            println!("{}", render(&data)?);
        }
        Command::SetKey { key } => {
            let key = match key {
                Some(k) => k,
                None => read_stdin()?,
            };
            store_api_key(&key)?;
            store.update(|c| c.api_key_present = true)?;
            eprintln!("API key saved");
        }
        Command::ClearKey => {
            delete_secret(SecretKey::GeminiApiKey)?;
            store.update(|c| c.api_key_present = false)?;
            eprintln!("API key removed");
        }
        Command::ShowConfig => {
            let cfg = store.load_or_default()?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        Command::SetModel { model } => {
            store.update(|c| c.model = model.trim().to_string())?;
        }
        Command::SetLanguage { language } => {
            store.update(|c| c.language = language)?;
        }
    }

    Ok(())
}

fn build_input(notes: Option<&str>, image: Option<&Path>) -> anyhow::Result<ParseInput> {
    let text = match notes {
        Some("-") => read_stdin()?,
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("read notes: {path}"))?,
        None => String::new(),
    };

    let mut input = ParseInput::text(text);
    if let Some(path) = image {
        let mime = mime_type_for_path(path)
            .with_context(|| format!("unsupported image type: {}", path.display()))?;
        let bytes = std::fs::read(path).with_context(|| format!("read image: {}", path.display()))?;
        input = input.with_image(encode_inline_image(&bytes, mime));
    }
    Ok(input)
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read stdin")?;
    Ok(buf)
}

fn render(data: &ClinicalData) -> anyhow::Result<String> {
    serde_json::to_string_pretty(data).context("encode result")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parse_command() {
        let cli = Cli::try_parse_from([
            "admitnote",
            "--config",
            "/tmp/c.json",
            "parse",
            "--notes",
            "-",
            "--language",
            "en-US",
            "--skip-connectivity-check",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        match cli.command {
            Command::Parse {
                notes,
                image,
                language,
                skip_connectivity_check,
            } => {
                assert_eq!(notes.as_deref(), Some("-"));
                assert!(image.is_none());
                assert_eq!(language, Some(Language::EnglishUs));
                assert!(skip_connectivity_check);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_language() {
        assert!(Cli::try_parse_from(["admitnote", "set-language", "fr"]).is_err());
    }

    #[test]
    fn notes_file_and_image_become_input() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        let image = dir.path().join("scan.png");
        std::fs::write(&notes, "BP 150/90").unwrap();
        std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

        let input = build_input(notes.to_str(), Some(&image)).unwrap();
        assert_eq!(input.text, "BP 150/90");
        let img = input.image.unwrap();
        assert_eq!(img.mime_type, "image/png");
        assert_eq!(img.decoded_len(), 4);
    }

    #[test]
    fn unknown_image_extension_is_rejected() {
        let err = build_input(None, Some(Path::new("scan.tiff"))).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported image type"));
    }
}
