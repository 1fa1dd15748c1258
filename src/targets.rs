// src/targets.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "DOCWATCH_TARGETS_PATH";

/// One watched document. Identity is the `url`; `provider` and `title`
/// are display labels carried through to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub provider: String,
    pub url: String,
    pub title: String,
}

impl Target {
    pub fn new(provider: &str, url: &str, title: &str) -> Self {
        Self {
            provider: provider.to_string(),
            url: url.to_string(),
            title: title.to_string(),
        }
    }
}

/// Built-in watch list: the API reference landing pages of the major AI
/// providers.
pub fn default_targets() -> Vec<Target> {
    vec![
        Target::new(
            "OpenAI",
            "https://platform.openai.com/docs/api-reference/introduction",
            "OpenAI API Reference (Introduction)",
        ),
        Target::new(
            "Anthropic",
            "https://docs.anthropic.com/en/api/reference",
            "Anthropic API Reference",
        ),
        Target::new(
            "Google Gemini",
            "https://ai.google.dev/api/rest",
            "Google Gemini REST API",
        ),
        Target::new(
            "Cohere",
            "https://docs.cohere.com/reference/about",
            "Cohere API Reference Overview",
        ),
        Target::new(
            "Mistral",
            "https://docs.mistral.ai/api/",
            "Mistral API Reference",
        ),
        Target::new(
            "Azure OpenAI",
            "https://learn.microsoft.com/en-us/azure/ai-services/openai/reference",
            "Azure OpenAI REST API Reference",
        ),
        Target::new(
            "AWS Bedrock",
            "https://docs.aws.amazon.com/bedrock/latest/userguide/api-methods.html",
            "AWS Bedrock API Methods",
        ),
    ]
}

/// Load targets from an explicit path. Supports TOML or JSON formats.
pub fn load_targets_from(path: &Path) -> Result<Vec<Target>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading targets from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_targets(&content, ext.as_str())
}

/// Load targets using env var + fallbacks:
/// 1) $DOCWATCH_TARGETS_PATH
/// 2) config/targets.toml
/// 3) config/targets.json
/// 4) the built-in provider list
pub fn load_targets_default() -> Result<Vec<Target>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_targets_from(&pb);
        } else {
            return Err(anyhow!("DOCWATCH_TARGETS_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/targets.toml");
    if toml_p.exists() {
        return load_targets_from(&toml_p);
    }
    let json_p = PathBuf::from("config/targets.json");
    if json_p.exists() {
        return load_targets_from(&json_p);
    }
    Ok(default_targets())
}

fn parse_targets(s: &str, hint_ext: &str) -> Result<Vec<Target>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[targets]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return validate(v);
        }
    }
    // Try JSON array
    if let Ok(v) = parse_json(s) {
        return validate(v);
    }
    // Fallback: also try TOML if not attempted
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return validate(v);
        }
    }
    Err(anyhow!("unsupported targets format"))
}

fn parse_toml(s: &str) -> Result<Vec<Target>> {
    #[derive(serde::Deserialize)]
    struct TomlTargets {
        targets: Vec<Target>,
    }
    let v: TomlTargets = toml::from_str(s)?;
    Ok(v.targets)
}

fn parse_json(s: &str) -> Result<Vec<Target>> {
    let v: Vec<Target> = serde_json::from_str(s)?;
    Ok(v)
}

fn validate(items: Vec<Target>) -> Result<Vec<Target>> {
    for t in &items {
        if t.url.trim().is_empty() {
            return Err(anyhow!("target {:?} has an empty url", t.provider));
        }
    }
    Ok(items)
}
