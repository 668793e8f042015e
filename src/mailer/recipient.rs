use error_stack::{Report, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Error;

/// A single addressee of an outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Recipient {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Recipient {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

pub(crate) const NO_RECIPIENT: &str = "No recipient specified for email delivery";
pub(crate) const INVALID_RECIPIENT: &str = "Invalid recipient format supplied to mailer";

/// Turns whatever the caller supplied as `to` into a list of recipients.
///
/// A bare address, an `{email, name?}` record or an array mixing both are
/// accepted. The order of the input is preserved.
pub fn normalize_recipients(input: &Value) -> Result<Vec<Recipient>, Error> {
    if is_absent(input) {
        return Err(Report::new(Error::InvalidRecipient(NO_RECIPIENT)));
    }

    let entries = match input {
        Value::Array(entries) if entries.is_empty() => {
            return Err(Report::new(Error::InvalidRecipient(NO_RECIPIENT)));
        }
        Value::Array(entries) => entries.as_slice(),
        entry => std::slice::from_ref(entry),
    };

    entries
        .iter()
        .map(|entry| {
            normalize_entry(entry).ok_or_else(|| {
                Report::new(Error::InvalidRecipient(INVALID_RECIPIENT))
                    .attach_printable(format!("entry: {entry}"))
            })
        })
        .collect()
}

fn is_absent(input: &Value) -> bool {
    match input {
        Value::Null | Value::Bool(false) => true,
        Value::String(value) => value.is_empty(),
        Value::Number(value) => value.as_f64() == Some(0.0),
        _ => false,
    }
}

fn normalize_entry(entry: &Value) -> Option<Recipient> {
    match entry {
        Value::String(email) if !email.is_empty() => Some(Recipient::new(email.as_str())),
        Value::Object(record) => {
            let email = record
                .get("email")
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())?;

            let name = record
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string);

            Some(Recipient {
                email: email.to_string(),
                name,
            })
        }
        _ => None,
    }
}
