use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::core::config::{default_config_path, SkinConfig};
use crate::core::error::SkinResult;
use crate::core::outcome::{ExtractionStage, FetchOutcome, LookupOutcome, OutcomeKind};
use crate::core::state::{AppState, AvatarReport};

#[derive(Debug, Parser)]
#[command(name = "mcskin", version, about = "Resolve Minecraft skins and cache avatar images")]
pub struct Cli {
    /// Settings file (JSON). Defaults to the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-request HTTP timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Root directory for cached face and helm images.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a username or UUID to its skin URL.
    Resolve { identifier: String },
    /// Download a skin texture and write its face and helm images.
    Fetch {
        url: String,
        #[arg(long)]
        face: PathBuf,
        #[arg(long)]
        helm: PathBuf,
    },
    /// Resolve identifiers and cache their avatar images.
    Avatar {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
}

impl Cli {
    pub fn load_config(&self) -> SkinResult<SkinConfig> {
        let path = self.config.clone().unwrap_or_else(default_config_path);
        let mut config = SkinConfig::load(&path)?;
        if let Some(timeout_ms) = self.timeout_ms {
            config.http_timeout_ms = timeout_ms;
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        Ok(config)
    }
}

// ── Reports ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LookupInfo {
    pub identifier: String,
    pub outcome: OutcomeKind,
    pub skin_url: Option<String>,
    pub error: Option<String>,
}

impl LookupInfo {
    fn new(identifier: &str, outcome: &LookupOutcome) -> Self {
        Self {
            identifier: identifier.to_string(),
            outcome: outcome.kind(),
            skin_url: outcome.skin_url().map(str::to_string),
            error: outcome.error_message(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FetchInfo {
    pub outcome: OutcomeKind,
    pub stage: Option<ExtractionStage>,
    pub error: Option<String>,
    pub face_path: Option<String>,
    pub helm_path: Option<String>,
}

impl FetchInfo {
    fn new(outcome: &FetchOutcome, face: Option<&PathBuf>, helm: Option<&PathBuf>) -> Self {
        let ready = outcome.is_ready();
        let shown = |p: Option<&PathBuf>| {
            p.filter(|_| ready)
                .map(|p| p.to_string_lossy().to_string())
        };
        Self {
            outcome: outcome.kind(),
            stage: outcome.extraction_error().map(|(stage, _)| stage),
            error: outcome.error_message(),
            face_path: shown(face),
            helm_path: shown(helm),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvatarInfo {
    #[serde(flatten)]
    pub lookup: LookupInfo,
    pub fetch: Option<FetchInfo>,
}

impl From<&AvatarReport> for AvatarInfo {
    fn from(report: &AvatarReport) -> Self {
        Self {
            lookup: LookupInfo::new(&report.identifier, &report.lookup),
            fetch: report.fetch.as_ref().map(|fetch| {
                FetchInfo::new(fetch, report.face_path.as_ref(), report.helm_path.as_ref())
            }),
        }
    }
}

// ── Commands ────────────────────────────────────────────

/// Run one CLI command. Returns `true` when every outcome is usable.
pub async fn execute(state: &AppState, command: Command) -> SkinResult<bool> {
    match command {
        Command::Resolve { identifier } => {
            let outcome = state.resolver.resolve(&identifier).await;
            print_json(&LookupInfo::new(&identifier, &outcome))?;
            Ok(outcome.is_settled())
        }
        Command::Fetch { url, face, helm } => {
            let outcome = state.fetcher.fetch_and_extract(&url, &face, &helm).await;
            print_json(&FetchInfo::new(&outcome, Some(&face), Some(&helm)))?;
            Ok(outcome.is_ready())
        }
        Command::Avatar { identifiers } => {
            let reports = state.avatar_batch(identifiers).await;
            let ok = reports.iter().all(AvatarReport::is_ok);
            let infos: Vec<AvatarInfo> = reports.iter().map(AvatarInfo::from).collect();
            print_json(&infos)?;
            info!("{} avatars processed", infos.len());
            Ok(ok)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> SkinResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
