//! Pluggable URL shortener
//!
//! Best-effort enrichment with total failure tolerance: `shorten` never
//! fails the caller. A failing primary provider degrades to the configured
//! fallback provider, then to returning the input unchanged.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ShortenerConfig;

/// A single upstream shortening provider.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Provider {
    TinyUrl,
    IsGd,
    /// Endpoint template with `{url}` / `{key}` placeholders
    Custom { endpoint: String, api_key: String },
}

impl Provider {
    fn from_name(name: &str, config: &ShortenerConfig) -> Option<Provider> {
        match name {
            "tinyurl" => Some(Provider::TinyUrl),
            "isgd" => Some(Provider::IsGd),
            "custom" if !config.endpoint.is_empty() => Some(Provider::Custom {
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
            }),
            "custom" => {
                warn!("Shortener provider 'custom' selected but no endpoint configured");
                None
            }
            "none" | "" => None,
            other => {
                warn!("Unknown shortener provider '{}', treating as none", other);
                None
            }
        }
    }

    fn request_url(&self, long_url: &str) -> String {
        let encoded = urlencoding::encode(long_url);
        match self {
            Provider::TinyUrl => {
                format!("https://tinyurl.com/api-create.php?url={}", encoded)
            }
            Provider::IsGd => {
                format!("https://is.gd/create.php?format=simple&url={}", encoded)
            }
            Provider::Custom { endpoint, api_key } => endpoint
                .replace("{url}", &encoded)
                .replace("{key}", api_key),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Provider::TinyUrl => "tinyurl",
            Provider::IsGd => "isgd",
            Provider::Custom { .. } => "custom",
        }
    }
}

pub struct Shortener {
    providers: Vec<Provider>,
    client: reqwest::Client,
}

impl Shortener {
    pub fn from_config(config: &ShortenerConfig) -> Self {
        let mut providers = Vec::new();
        if let Some(provider) = Provider::from_name(&config.provider, config) {
            providers.push(provider);
        }
        if let Some(ref fallback) = config.fallback_provider {
            if let Some(provider) = Provider::from_name(fallback, config) {
                if !providers.contains(&provider) {
                    providers.push(provider);
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build shortener HTTP client");

        Shortener { providers, client }
    }

    /// Identity shortener, used when no provider is configured and in tests
    pub fn disabled() -> Self {
        Shortener {
            providers: Vec::new(),
            client: reqwest::Client::new(),
        }
    }

    /// Rewrite `long_url` through the provider chain.
    ///
    /// Always returns a usable URL: the first provider that answers with a
    /// URL-shaped body wins, otherwise the input is returned unchanged.
    pub async fn shorten(&self, long_url: &str) -> String {
        for provider in &self.providers {
            if let Some(short) = self.try_provider(provider, long_url).await {
                return short;
            }
        }
        long_url.to_string()
    }

    async fn try_provider(&self, provider: &Provider, long_url: &str) -> Option<String> {
        let request_url = provider.request_url(long_url);

        let response = match self.client.get(&request_url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Shortener '{}' request failed: {}", provider.name(), e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Shortener '{}' returned status {}",
                provider.name(),
                response.status()
            );
            return None;
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Shortener '{}' body read failed: {}", provider.name(), e);
                return None;
            }
        };

        let short = body.trim();
        if !looks_like_url(short) {
            warn!(
                "Shortener '{}' returned a non-URL body, ignoring",
                provider.name()
            );
            return None;
        }

        debug!("Shortener '{}': {} -> {}", provider.name(), long_url, short);
        Some(short.to_string())
    }
}

fn looks_like_url(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.contains(char::is_whitespace)
        && url::Url::parse(candidate)
            .map(|u| u.scheme() == "http" || u.scheme() == "https")
            .unwrap_or(false)
}
