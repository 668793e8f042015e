use async_trait::async_trait;
use error_stack::{Report, Result, ResultExt};
use reqwest::header;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{MailTransport, OutgoingEmail, SetupError, TransportError};
use crate::util::Sensitive;

/// Sends transactional emails through the Brevo HTTP API.
#[derive(Debug)]
pub struct BrevoTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Sensitive<String>,
}

impl BrevoTransport {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.brevo.com/v3";
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(api_key: Sensitive<String>, base_url: Option<&Url>) -> Result<Self, SetupError> {
        let base = base_url.map_or(Self::DEFAULT_BASE_URL, Url::as_str);
        let endpoint = Self::endpoint(base)?;

        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .change_context(SetupError)
            .attach_printable("could not build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn endpoint(base: &str) -> Result<Url, SetupError> {
        let endpoint = format!("{}/smtp/email", base.trim_end_matches('/'));
        Url::parse(&endpoint)
            .change_context(SetupError)
            .attach_printable_lazy(|| format!("invalid mail endpoint: {endpoint}"))
    }

    #[must_use]
    pub fn endpoint_url(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl MailTransport for BrevoTransport {
    fn name(&self) -> &'static str {
        "brevo"
    }

    #[tracing::instrument(skip_all, name = "mailer.brevo.send")]
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("api-key", self.api_key.as_str())
            .header(header::ACCEPT, "application/json")
            .json(email)
            .send()
            .await
            .map_err(|e| {
                Report::new(TransportError {
                    status: e.status().map(|v| v.as_u16()),
                    body: None,
                    message: e.to_string(),
                })
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text)
            .ok()
            .or_else(|| (!text.is_empty()).then(|| Value::String(text)));

        let message = body
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map_or_else(|| status.to_string(), str::to_string);

        Err(Report::new(TransportError {
            status: Some(status.as_u16()),
            body,
            message,
        }))
    }
}
