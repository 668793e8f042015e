use serde::{Deserialize, Deserializer};
use url::Url;

use crate::util::Sensitive;

/// Transactional email delivery settings. They are read once at
/// startup; a missing API key disables delivery until restart.
#[derive(Debug, Deserialize)]
pub struct Mailer {
    /// A blank key is treated as if it is not set.
    ///
    /// **Environment variables**:
    /// - `SHABDSETU_MAILER_API_KEY` or `BREVO_API_KEY`
    #[serde(default, deserialize_with = "deserialize_api_key")]
    pub api_key: Option<Sensitive<String>>,
    /// Alternate API base path, mostly useful for sandboxes.
    ///
    /// **Environment variables**:
    /// - `SHABDSETU_MAILER_API_BASE_URL` or `BREVO_API_BASE_URL`
    #[serde(default)]
    pub api_base_url: Option<Url>,
    /// **Environment variables**:
    /// - `SHABDSETU_MAILER_SENDER_EMAIL` or `BREVO_SENDER_EMAIL`
    #[serde(default = "Mailer::default_sender_email")]
    pub sender_email: String,
    /// **Environment variables**:
    /// - `SHABDSETU_MAILER_SENDER_NAME` or `BREVO_SENDER_NAME`
    #[serde(default = "Mailer::default_sender_name")]
    pub sender_name: String,
}

impl Mailer {
    pub const DEFAULT_SENDER_EMAIL: &'static str = "no-reply@shabdsetu.app";
    pub const DEFAULT_SENDER_NAME: &'static str = "ShabdSetu";

    fn default_sender_email() -> String {
        Self::DEFAULT_SENDER_EMAIL.to_string()
    }

    fn default_sender_name() -> String {
        Self::DEFAULT_SENDER_NAME.to_string()
    }

    pub(crate) fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.sender_email.contains('@') {
            problems.push("mailer.sender_email: Invalid sender e-mail address".to_string());
        }
        problems
    }
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<Option<Sensitive<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Sensitive<String>>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.as_str().trim().is_empty()))
}

impl Default for Mailer {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: None,
            sender_email: Self::default_sender_email(),
            sender_name: Self::default_sender_name(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Notifications {
    /// Emails users whenever someone starts following them. It only
    /// takes effect if the mailer has an API key.
    ///
    /// **Environment variables**:
    /// - `SHABDSETU_NOTIFICATIONS_FOLLOW_EMAIL`
    #[serde(default = "Notifications::default_follow_email")]
    pub follow_email: bool,
}

impl Notifications {
    const fn default_follow_email() -> bool {
        true
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            follow_email: Self::default_follow_email(),
        }
    }
}
