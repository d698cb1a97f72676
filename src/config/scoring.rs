// src/config/scoring.rs
use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scoring::ScoringConfig;

pub const ENV_SCORING_CONFIG_PATH: &str = "MINDFLOW_SCORING_CONFIG_PATH";
pub const DEFAULT_SCORING_CONFIG_PATH: &str = "config/scoring.toml";

/// Load scoring overrides from an explicit path. Supports TOML or JSON formats.
pub fn load_scoring_from(path: &Path) -> Result<ScoringConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading scoring config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_scoring(&content, ext.as_str())
        .with_context(|| format!("parsing scoring config {}", path.display()))?;
    if !cfg.is_valid() {
        bail!(
            "scoring config {} has negative/non-finite weights or context_score outside 0..=100",
            path.display()
        );
    }
    Ok(cfg)
}

/// Load scoring overrides using env var + fallbacks:
/// 1) $MINDFLOW_SCORING_CONFIG_PATH (must exist)
/// 2) config/scoring.toml
/// 3) config/scoring.json
/// 4) built-in defaults
pub fn load_scoring_default() -> Result<ScoringConfig> {
    if let Ok(p) = std::env::var(ENV_SCORING_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_scoring_from(&pb);
        }
        return Err(anyhow!("{ENV_SCORING_CONFIG_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from(DEFAULT_SCORING_CONFIG_PATH);
    if toml_p.exists() {
        return load_scoring_from(&toml_p);
    }
    let json_p = PathBuf::from("config/scoring.json");
    if json_p.exists() {
        return load_scoring_from(&json_p);
    }
    Ok(ScoringConfig::default())
}

fn parse_scoring(s: &str, hint_ext: &str) -> Result<ScoringConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    if let Ok(cfg) = toml::from_str::<ScoringConfig>(s) {
        return Ok(cfg);
    }
    serde_json::from_str(s).map_err(|_| anyhow!("unsupported scoring config format"))
}
