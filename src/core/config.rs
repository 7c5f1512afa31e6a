use chrono::{DateTime, Duration, SecondsFormat, Utc};
use regex::Regex;
use std::env;
use std::sync::LazyLock;
use tracing::warn;

use super::models::RepoRef;
use crate::errors::DigestError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";
pub const DEFAULT_MODELS_ENDPOINT: &str = "https://models.github.ai/inference";
pub const DEFAULT_MODELS_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_INTRO: &str =
    "Hello there! This discussion is a digest of issues that will be updated.";
pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_LOOKBACK: &str = "24h";
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 1440;

/// The search query plus how far back summaries should look.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestQuery {
    pub query: String,
    pub lookback: Duration,
}

impl DigestQuery {
    /// Timeline events at or before this instant are not "recent".
    ///
    /// A lookback reaching past the earliest representable instant keeps
    /// every event.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub repository: RepoRef,
    pub query: DigestQuery,
    pub title: String,
    pub intro: String,
    pub comment: String,
    pub discussion_category: String,
    pub models_enabled: bool,
    pub github_token: String,
    pub models_token: String,
    pub api_url: String,
    pub graphql_url: String,
    pub models_endpoint: String,
    pub models_model: String,
    pub workflow_run_url: String,
}

impl AppConfig {
    /// Reads action inputs (`INPUT_*`) and the runner environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the repository or token is missing or malformed.
    pub fn from_env() -> Result<Self, DigestError> {
        Self::from_lookup(|key| env::var(key).ok(), Utc::now())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the repository or token is missing or malformed.
    pub fn from_lookup<F>(lookup: F, now: DateTime<Utc>) -> Result<Self, DigestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| lookup(&format!("INPUT_{}", name.to_uppercase()));

        let slug = with_default(input("repo"), lookup("GITHUB_REPOSITORY").unwrap_or_default());
        let repository = RepoRef::parse(&slug)?;

        let yesterday = (now - Duration::days(1)).to_rfc3339_opts(SecondsFormat::Millis, true);
        let query = with_default(
            input("query"),
            format!("repo:{repository} updated:>={yesterday}"),
        );
        let title = with_default(
            input("title"),
            format!("Issue Digest for {}", now.format("%Y-%m-%d")),
        );
        let intro = with_default(input("intro"), DEFAULT_INTRO);
        let comment = with_default(input("comment"), "");
        let discussion_category = with_default(input("discussionCategory"), DEFAULT_CATEGORY);
        let models_enabled = with_default(input("models"), "false") != "false";

        let raw_lookback = with_default(input("lookback"), DEFAULT_LOOKBACK);
        let lookback = parse_lookback(&raw_lookback).unwrap_or_else(|| {
            warn!(
                "Unparseable lookback '{}', using {} minutes",
                raw_lookback, DEFAULT_LOOKBACK_MINUTES
            );
            Duration::minutes(DEFAULT_LOOKBACK_MINUTES)
        });

        let github_token = lookup("GITHUB_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DigestError::ConfigError("GITHUB_TOKEN is not set".to_string()))?;
        let models_token = with_default(lookup("MODELS_TOKEN"), github_token.clone());

        let api_url = with_default(lookup("GITHUB_API_URL"), DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        let graphql_url = with_default(lookup("GITHUB_GRAPHQL_URL"), format!("{api_url}/graphql"));
        let server_url = with_default(lookup("GITHUB_SERVER_URL"), DEFAULT_SERVER_URL);
        let workflow_run_url = format!(
            "{}/{}/actions/runs/{}",
            server_url.trim_end_matches('/'),
            lookup("GITHUB_REPOSITORY").unwrap_or_else(|| repository.to_string()),
            lookup("GITHUB_RUN_ID").unwrap_or_default()
        );

        Ok(Self {
            repository,
            query: DigestQuery { query, lookback },
            title,
            intro,
            comment,
            discussion_category,
            models_enabled,
            github_token,
            models_token,
            api_url,
            graphql_url,
            models_endpoint: with_default(lookup("MODELS_ENDPOINT"), DEFAULT_MODELS_ENDPOINT),
            models_model: with_default(lookup("MODELS_MODEL"), DEFAULT_MODELS_MODEL),
            workflow_run_url,
        })
    }
}

/// Absent and empty inputs both fall back to the default.
#[must_use]
pub fn with_default(value: Option<String>, default: impl Into<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.into(),
    }
}

/// Parses durations such as `24h`, `90m`, `1h30m` or `7d`.
///
/// A bare number counts as minutes. Returns `None` for anything else, for
/// a zero duration, and for durations too large to subtract from a date.
#[must_use]
pub fn parse_lookback(raw: &str) -> Option<Duration> {
    static PART_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(mins|min|ms|m|secs|sec|s|hrs|hr|h|days|day|d|wks|wk|w)?")
            .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
    });

    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let mut consumed = 0;
    let mut total_ms = 0.0_f64;
    for caps in PART_RE.captures_iter(&compact) {
        let whole = caps.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();

        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit_ms = match caps
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .as_deref()
        {
            Some("ms") => 1.0,
            Some("s" | "sec" | "secs") => 1_000.0,
            None | Some("m" | "min" | "mins") => 60_000.0,
            Some("h" | "hr" | "hrs") => 3_600_000.0,
            Some("d" | "day" | "days") => 86_400_000.0,
            Some("w" | "wk" | "wks") => 604_800_000.0,
            Some(_) => return None,
        };
        total_ms += value * unit_ms;
    }

    #[allow(clippy::cast_precision_loss)]
    let max_ms = i64::MAX as f64;
    if consumed != compact.len() || !(1.0..max_ms).contains(&total_ms) {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    let lookback = Duration::try_milliseconds(total_ms.round() as i64)?;
    // Must stay subtractable from present-day timestamps.
    DateTime::<Utc>::UNIX_EPOCH.checked_sub_signed(lookback)?;
    Some(lookback)
}
