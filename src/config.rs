use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::analysis::encoder::AnalysisEncoding;

pub const DEFAULT_CONFIRM_URL: &str = "https://api.tosspayments.com/v1/payments/confirm";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub audience: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub webhook_url: Option<String>,
    pub default_encoding: AnalysisEncoding,
    pub timeout: Duration,
    /// Attach a placeholder result to failed analyses.
    pub fallback_placeholder: bool,
    pub upload_max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub secret_key: Option<String>,
    pub client_key: Option<String>,
    pub confirm_url: String,
    pub timeout: Duration,
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub analysis: AnalysisConfig,
    pub payments: PaymentsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET must be set")?,
            audience: std::env::var("AUTH_JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".into()),
            issuer: non_empty_var("AUTH_JWT_ISSUER"),
        };

        let default_encoding = match non_empty_var("ANALYSIS_ENCODING") {
            Some(v) => v
                .parse::<AnalysisEncoding>()
                .map_err(|e| anyhow::anyhow!("ANALYSIS_ENCODING: {}", e))?,
            None => AnalysisEncoding::Multipart,
        };

        let analysis = AnalysisConfig {
            webhook_url: non_empty_var("ANALYSIS_WEBHOOK_URL"),
            default_encoding,
            timeout: Duration::from_secs(parsed_var("ANALYSIS_TIMEOUT_SECS").unwrap_or(60)),
            fallback_placeholder: std::env::var("ANALYSIS_FALLBACK_PLACEHOLDER")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            upload_max_bytes: parsed_var("UPLOAD_MAX_BYTES").unwrap_or(20 * 1024 * 1024),
        };

        let payments = PaymentsConfig {
            secret_key: non_empty_var("PAYMENTS_SECRET_KEY"),
            client_key: non_empty_var("PAYMENTS_CLIENT_KEY"),
            confirm_url: std::env::var("PAYMENTS_CONFIRM_URL")
                .unwrap_or_else(|_| DEFAULT_CONFIRM_URL.into()),
            timeout: Duration::from_secs(parsed_var("PAYMENTS_TIMEOUT_SECS").unwrap_or(30)),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into())
                .trim_end_matches('/')
                .to_string(),
        };

        Ok(Self {
            jwt,
            analysis,
            payments,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
