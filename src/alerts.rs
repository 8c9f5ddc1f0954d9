use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::errors::{Result, WavefrontError};
use crate::resource::Entity;
use crate::targets::TARGET_PREFIX;

/// Alert severity levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Smoke,
    Warn,
    Severe,
}

impl Severity {
    /// Tier key used in the `conditions` and `targets` maps of threshold alerts
    pub fn key(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Smoke => "smoke",
            Severity::Warn => "warn",
            Severity::Severe => "severe",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Smoke => write!(f, "SMOKE"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Severe => write!(f, "SEVERE"),
        }
    }
}

/// Classic alerts have one condition; threshold alerts one per severity tier
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    #[default]
    Classic,
    Threshold,
}

/// Wavefront alert
///
/// # Example
///
/// ```rust
/// use wavefront_api::{Alert, AlertType, Severity};
///
/// let alert = Alert::threshold("My First Threshold Alert")
///     .with_threshold(Severity::Smoke, "ts(servers.cpu.usage) > 70")
///     .with_threshold(Severity::Warn, "ts(servers.cpu.usage) > 100")
///     .with_threshold_target(Severity::Smoke, "target:Xb6EBtUTTjCtFPWn")
///     .with_display_expression("ts(servers.cpu.usage)")
///     .with_tag("dc1");
///
/// assert_eq!(alert.alert_type, AlertType::Threshold);
/// assert_eq!(alert.severity_list, vec![Severity::Smoke, Severity::Warn]);
/// assert!(alert.id.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Alert {
    /// Assigned by Wavefront on creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    pub alert_type: AlertType,

    /// Classic only: comma separated emails or `target:<id>` references
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,

    /// Classic only
    #[serde(skip_serializing_if = "String::is_empty")]
    pub condition: String,

    /// Classic only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Threshold only: tier key to condition
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub conditions: HashMap<String, String>,

    /// Threshold only: tier key to `target:<id>` references
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub targets: HashMap<String, String>,

    /// Threshold only: tiers in use
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub severity_list: Vec<Severity>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_expression: String,

    /// Minutes the condition must hold before the alert fires
    pub minutes: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_after_minutes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_resend_frequency_minutes: Option<u32>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub additional_information: String,

    #[serde(with = "customer_tags", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Reported by Wavefront, e.g. `CHECKING` or `FIRING`
    #[serde(skip_serializing)]
    pub status: Vec<String>,

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

impl Alert {
    /// Create a classic alert with a single condition
    pub fn classic(name: &str, condition: &str, severity: Severity) -> Self {
        Self {
            name: name.to_string(),
            alert_type: AlertType::Classic,
            condition: condition.to_string(),
            severity: Some(severity),
            minutes: 1,
            ..Default::default()
        }
    }

    /// Create a threshold alert; add tiers with [`Alert::with_threshold`]
    pub fn threshold(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alert_type: AlertType::Threshold,
            minutes: 1,
            ..Default::default()
        }
    }

    /// Add a recipient to a classic alert
    ///
    /// Recipients are emails or `target:<id>` references.
    pub fn with_target(mut self, recipient: &str) -> Self {
        if self.target.is_empty() {
            self.target = recipient.to_string();
        } else {
            self.target = format!("{},{}", self.target, recipient);
        }
        self
    }

    /// Add a severity tier with its condition
    pub fn with_threshold(mut self, severity: Severity, condition: &str) -> Self {
        self.alert_type = AlertType::Threshold;
        self.conditions
            .insert(severity.key().to_string(), condition.to_string());
        if !self.severity_list.contains(&severity) {
            self.severity_list.push(severity);
        }
        self
    }

    /// Notify `target` (a `target:<id>` reference) when the tier fires
    pub fn with_threshold_target(mut self, severity: Severity, target: &str) -> Self {
        self.targets
            .insert(severity.key().to_string(), target.to_string());
        self
    }

    pub fn with_display_expression(mut self, expression: &str) -> Self {
        self.display_expression = expression.to_string();
        self
    }

    /// Minutes the condition must hold before the alert fires
    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    /// Minutes the condition must be false before the alert resolves
    pub fn with_resolve_after_minutes(mut self, minutes: u32) -> Self {
        self.resolve_after_minutes = Some(minutes);
        self
    }

    pub fn with_additional_information(mut self, information: &str) -> Self {
        self.additional_information = information.to_string();
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Recipients of a classic alert
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        split_list(&self.target)
    }

    fn validate_classic(&self) -> Result<()> {
        if self.condition.trim().is_empty() {
            return Err(invalid("classic alerts need a condition"));
        }
        if self.severity.is_none() {
            return Err(invalid("classic alerts need a severity"));
        }
        Ok(())
    }

    fn validate_threshold(&self) -> Result<()> {
        if self.conditions.is_empty() {
            return Err(invalid("threshold alerts need at least one condition"));
        }
        if self.severity_list.is_empty() {
            return Err(invalid("threshold alerts need a severity list"));
        }

        let tier_in_use = |tier: &str| self.severity_list.iter().any(|s| s.key() == tier);
        for (tier, condition) in &self.conditions {
            if !tier_in_use(tier) {
                return Err(invalid(format!(
                    "condition tier {tier} is not in the severity list"
                )));
            }
            if condition.trim().is_empty() {
                return Err(invalid(format!("condition for tier {tier} is empty")));
            }
        }

        for (tier, targets) in &self.targets {
            if !self.conditions.contains_key(tier) {
                return Err(invalid(format!("target tier {tier} has no condition")));
            }
            if let Some(target) = split_list(targets).find(|t| !t.starts_with(TARGET_PREFIX)) {
                return Err(invalid(format!(
                    "threshold alerts only accept alert targets, got {target}"
                )));
            }
        }
        Ok(())
    }
}

impl Entity for Alert {
    const KIND: &'static str = "alert";
    const PATH: &'static str = "alert";
    const TRASHABLE: bool = true;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.minutes == 0 {
            return Err(invalid("minutes must be greater than zero"));
        }

        match self.alert_type {
            AlertType::Classic => self.validate_classic(),
            AlertType::Threshold => self.validate_threshold(),
        }
    }
}

fn invalid(message: impl Into<String>) -> WavefrontError {
    WavefrontError::validation(Alert::KIND, message)
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Wavefront nests alert tags as `{"customerTags": [...]}`
mod customer_tags {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct TagsRef<'a> {
        #[serde(rename = "customerTags")]
        customer_tags: &'a [String],
    }

    #[derive(Deserialize)]
    struct Tags {
        #[serde(rename = "customerTags", default)]
        customer_tags: Vec<String>,
    }

    pub fn serialize<S: Serializer>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        TagsRef {
            customer_tags: tags,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Tags>::deserialize(deserializer)?
            .map(|tags| tags.customer_tags)
            .unwrap_or_default())
    }
}
