use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::errors::{Result, WavefrontError};
use crate::resource::Entity;

/// Prefix alerts use to reference a target by id
pub const TARGET_PREFIX: &str = "target:";

/// Reference to the target with the given id, as used in alert target fields
pub fn target_ref(id: &str) -> String {
    format!("{TARGET_PREFIX}{id}")
}

/// How a target delivers notifications
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetMethod {
    #[default]
    Webhook,
    Email,
    Pagerduty,
}

/// Alert events a target is notified about
///
/// Values this client does not know decode as [`Trigger::Unknown`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    AlertOpened,
    AlertUpdated,
    AlertResolved,
    AlertMaintenance,
    AlertSnoozed,
    AlertNoData,
    AlertNoDataResolved,
    AlertNoDataMaintenance,
    AlertSeverityUpdate,
    AlertSeriesSeverityUpdate,
    AlertInvalid,
    AlertNoLongerInvalid,
    AlertTesting,
    AlertRetriggered,
    #[serde(other)]
    Unknown,
}

/// Wavefront alert target (a "notificant" in the API)
///
/// # Example
///
/// ```rust
/// use wavefront_api::{Target, Trigger};
///
/// let target = Target::webhook("test target", "https://hooks.slack.com/services/test/me")
///     .with_content_type("application/json")
///     .with_header("Testing", "true")
///     .with_trigger(Trigger::AlertOpened)
///     .with_trigger(Trigger::AlertResolved)
///     .with_template("{\"text\": \"{{{subject}}}\"}");
///
/// assert!(target.reference().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Target {
    /// Assigned by Wavefront on creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub method: TargetMethod,

    /// Webhook URL, email address or PagerDuty key
    pub recipient: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub email_subject: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,

    #[serde(rename = "customHttpHeaders", skip_serializing_if = "HashMap::is_empty")]
    pub custom_headers: HashMap<String, String>,

    pub triggers: Vec<Trigger>,

    /// Mustache template of the notification payload
    pub template: String,

    #[serde(rename = "isHtmlContent")]
    pub html_content: bool,

    #[serde(
        rename = "createdEpochMillis",
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing
    )]
    pub created: Option<DateTime<Utc>>,

    #[serde(
        rename = "updatedEpochMillis",
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing
    )]
    pub updated: Option<DateTime<Utc>>,
}

impl Target {
    fn new(title: &str, method: TargetMethod, recipient: &str) -> Self {
        Self {
            title: title.to_string(),
            method,
            recipient: recipient.to_string(),
            ..Default::default()
        }
    }

    /// Target posting to a webhook URL
    pub fn webhook(title: &str, url: &str) -> Self {
        Self::new(title, TargetMethod::Webhook, url)
    }

    /// Target sending email
    pub fn email(title: &str, address: &str) -> Self {
        Self::new(title, TargetMethod::Email, address)
    }

    /// Target raising PagerDuty incidents
    pub fn pagerduty(title: &str, service_key: &str) -> Self {
        Self::new(title, TargetMethod::Pagerduty, service_key)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Add an HTTP header sent with webhook notifications
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.custom_headers
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        if !self.triggers.contains(&trigger) {
            self.triggers.push(trigger);
        }
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    pub fn with_email_subject(mut self, subject: &str) -> Self {
        self.email_subject = subject.to_string();
        self
    }

    pub fn with_html_content(mut self, html: bool) -> Self {
        self.html_content = html;
        self
    }

    /// `target:<id>` reference for use in alerts, once the target is created
    pub fn reference(&self) -> Option<String> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(target_ref)
    }
}

impl Entity for Target {
    const KIND: &'static str = "target";
    const PATH: &'static str = "notificant";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(invalid("title must not be empty"));
        }
        if self.recipient.trim().is_empty() {
            return Err(invalid("recipient must not be empty"));
        }
        if self.triggers.is_empty() {
            return Err(invalid("at least one trigger is required"));
        }
        if self.template.trim().is_empty() {
            return Err(invalid("template must not be empty"));
        }

        if self.method == TargetMethod::Webhook {
            let url = Url::parse(&self.recipient)
                .map_err(|e| invalid(format!("webhook recipient {} is not a URL: {e}", self.recipient)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(format!(
                    "webhook recipient {} must use http or https",
                    self.recipient
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> WavefrontError {
    WavefrontError::validation(Target::KIND, message)
}
