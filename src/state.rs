use std::sync::Arc;

use crate::analysis::{orchestrator::AnalysisOrchestrator, webhook::HttpWebhookClient};
use crate::config::AppConfig;
use crate::images::{preview::PreviewRegistry, session::UploadSessions};
use crate::payments::gateway::{HttpPaymentGateway, PaymentGateway};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub uploads: UploadSessions,
    pub analysis: AnalysisOrchestrator,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::from_config(config)
    }

    /// Wires the real HTTP collaborators from `config`. Nothing is contacted here.
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let webhook = Arc::new(HttpWebhookClient::new(config.analysis.timeout)?);
        let analysis = AnalysisOrchestrator::new(webhook, config.analysis.webhook_url.clone());

        let payments = Arc::new(HttpPaymentGateway::new(
            config.payments.confirm_url.clone(),
            config.payments.secret_key.clone(),
            config.payments.timeout,
        )?) as Arc<dyn PaymentGateway>;

        Ok(Self::from_parts(
            config,
            UploadSessions::new(PreviewRegistry::new()),
            analysis,
            payments,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        uploads: UploadSessions,
        analysis: AnalysisOrchestrator,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            config,
            uploads,
            analysis,
            payments,
        }
    }

    /// State with no external systems configured.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::analysis::encoder::AnalysisEncoding;
        use crate::config::{AnalysisConfig, JwtConfig, PaymentsConfig, DEFAULT_CONFIRM_URL};
        use std::time::Duration;

        let config = Arc::new(AppConfig {
            jwt: JwtConfig {
                secret: "test-secret".into(),
                audience: "authenticated".into(),
                issuer: None,
            },
            analysis: AnalysisConfig {
                webhook_url: None,
                default_encoding: AnalysisEncoding::Multipart,
                timeout: Duration::from_secs(5),
                fallback_placeholder: true,
                upload_max_bytes: 1024 * 1024,
            },
            payments: PaymentsConfig {
                secret_key: None,
                client_key: Some("test_ck_fake".into()),
                confirm_url: DEFAULT_CONFIRM_URL.into(),
                timeout: Duration::from_secs(5),
                public_base_url: "http://localhost:8080".into(),
            },
        });
        Self::from_config(config).expect("fake state")
    }
}
