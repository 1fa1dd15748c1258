//! Content fetching + text extraction for watched pages.
//!
//! The watch core only sees the [`PageFetcher`] trait; the HTTP
//! implementation retries transient failures with an escalating client
//! identity and strips markup unless the response is already plain text.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::time::Duration;

use crate::targets::Target;

/// Bot identity sent on the first attempt.
const BOT_USER_AGENT: &str = "DocsWatchBot/1.0 (+https://github.com/hiddenpath/docwatch)";
/// Browser identity used once the bot identity has been refused.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const RETRIES: u32 = 2;
const RETRY_SLEEP: Duration = Duration::from_secs(3);

/// Source of normalized page text. The orchestrator treats this as a black
/// box returning text or a descriptive error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, target: &Target) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }

    async fn get_page(&self, url: &str, user_agent: &str) -> Result<(String, Option<String>)> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        Ok((body, content_type))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, target: &Target) -> Result<String> {
        let mut last_err = None;
        for attempt in 0..=RETRIES {
            // Escalate to a browser identity once the bot one has failed.
            let ua = if attempt == 0 {
                BOT_USER_AGENT
            } else {
                BROWSER_USER_AGENT
            };
            match self.get_page(&target.url, ua).await {
                Ok((body, content_type)) => {
                    let text = if is_machine_readable(&target.url, content_type.as_deref()) {
                        normalize_lines(&body)
                    } else {
                        extract_text(&body)
                    };
                    return Ok(text);
                }
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        provider = %target.provider,
                        url = %target.url,
                        attempt,
                        "fetch attempt failed"
                    );
                    counter!("watch_fetch_retries_total").increment(1);
                    last_err = Some(e);
                    if attempt < RETRIES {
                        tokio::time::sleep(RETRY_SLEEP).await;
                    }
                }
            }
        }

        let err = last_err.unwrap_or_else(|| anyhow!("no fetch attempt made"));
        Err(err.context(format!(
            "failed to fetch {} after {} attempts",
            target.url,
            RETRIES + 1
        )))
    }
}

/// Plain or structured text responses skip markup stripping; only line
/// normalization applies.
pub fn is_machine_readable(url: &str, content_type: Option<&str>) -> bool {
    if let Some(ct) = content_type {
        let ct = ct.to_ascii_lowercase();
        if ct.starts_with("text/plain")
            || ct.starts_with("text/markdown")
            || ct.starts_with("application/json")
        {
            return true;
        }
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.ends_with(".txt") || path.ends_with(".md") || path.ends_with(".json")
}

/// Strip markup from an HTML document down to line-oriented text:
/// script/style/noscript bodies are dropped, remaining tags become line
/// breaks, entities are decoded, lines are trimmed and empties removed.
pub fn extract_text(html: &str) -> String {
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    let re_blocks = RE_BLOCKS.get_or_init(|| {
        Regex::new(
            r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>|<noscript\b[^>]*>.*?</noscript>",
        )
        .unwrap()
    });
    let without_blocks = re_blocks.replace_all(html, "");

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let without_tags = re_tags.replace_all(&without_blocks, "\n");

    let decoded = html_escape::decode_html_entities(&without_tags);
    normalize_lines(&decoded)
}

/// Trim every line and drop the empty ones.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
