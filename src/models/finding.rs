use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Finding categories - the Critic echoes the Analyst's plural keys
///
/// Names outside the four known categories are kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FindingCategory {
    /// Statement acknowledging involvement
    Admission,
    /// Statements that conflict with each other
    Contradiction,
    /// Verifiable claim about whereabouts or actions
    Alibi,
    /// Evasion, topic changes, deceptive language
    SuspiciousIndicator,
    Other(String),
}

impl FindingCategory {
    pub fn as_str(&self) -> &str {
        match self {
            FindingCategory::Admission => "admission",
            FindingCategory::Contradiction => "contradiction",
            FindingCategory::Alibi => "alibi",
            FindingCategory::SuspiciousIndicator => "suspicious_indicator",
            FindingCategory::Other(name) => name,
        }
    }
}

impl From<String> for FindingCategory {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "admission" | "admissions" => FindingCategory::Admission,
            "contradiction" | "contradictions" => FindingCategory::Contradiction,
            "alibi" | "alibis" => FindingCategory::Alibi,
            "suspicious_indicator" | "suspicious_indicators" => {
                FindingCategory::SuspiciousIndicator
            }
            _ => FindingCategory::Other(name.trim().to_string()),
        }
    }
}

impl From<FindingCategory> for String {
    fn from(category: FindingCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field value that falls back to its default when it has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Critic's confidence in a verified finding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    #[default]
    #[serde(other)]
    Medium,
}

/// One unverified finding as returned by the Analyst
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftFinding {
    /// Free-text description
    #[serde(default)]
    pub finding: String,
    /// Turn citations such as `Q3`, `A4`
    #[serde(default)]
    pub references: Vec<String>,
}

/// Analyst output for one window. Missing keys decode as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystDraft {
    #[serde(default)]
    pub admissions: Vec<DraftFinding>,
    #[serde(default)]
    pub contradictions: Vec<DraftFinding>,
    #[serde(default)]
    pub alibis: Vec<DraftFinding>,
    #[serde(default)]
    pub suspicious_indicators: Vec<DraftFinding>,
}

impl AnalystDraft {
    /// Total draft findings across all categories
    pub fn finding_count(&self) -> usize {
        self.admissions.len()
            + self.contradictions.len()
            + self.alibis.len()
            + self.suspicious_indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finding_count() == 0
    }
}

/// A finding the Critic accepted, as it appears on the wire
///
/// Every field is optional on its own; the description may arrive under
/// `finding_ko`, `finding` or `description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CriticVerified {
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<FindingCategory>,
    #[serde(default, deserialize_with = "lenient")]
    pub finding_ko: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub finding: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub references: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Confidence,
}

impl CriticVerified {
    /// Entry given as bare text instead of an object
    pub fn from_text(text: String) -> Self {
        Self {
            finding: Some(text),
            ..Default::default()
        }
    }

    /// Description in order of preference: Korean, echoed draft text, generic
    pub fn resolved_description(&self) -> String {
        [&self.finding_ko, &self.finding, &self.description]
            .into_iter()
            .flatten()
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// A finding the Critic dropped, as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CriticRejected {
    #[serde(default, deserialize_with = "lenient")]
    pub original_finding: String,
    #[serde(default, deserialize_with = "lenient")]
    pub reason: String,
}

impl CriticRejected {
    /// Entry given as bare text: kept as the reason
    pub fn from_text(text: String) -> Self {
        Self {
            original_finding: String::new(),
            reason: text,
        }
    }
}

/// Critic output for one window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticVerdict {
    pub verified_findings: Vec<CriticVerified>,
    pub rejected_findings: Vec<CriticRejected>,
}

/// A verified finding carried through to the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    #[serde(rename = "finding")]
    pub description: String,
    pub references: Vec<String>,
    pub confidence: Confidence,
    /// Window that produced this finding
    pub window_index: usize,
}

impl Finding {
    pub fn from_verified(verified: CriticVerified, window_index: usize) -> Self {
        let description = verified.resolved_description();
        Self {
            category: verified
                .category
                .unwrap_or_else(|| FindingCategory::Other("uncategorized".to_string())),
            description,
            references: verified.references,
            confidence: verified.confidence,
            window_index,
        }
    }
}

/// A rejected finding, kept only for the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedFinding {
    pub original_finding: String,
    pub reason: String,
    pub window_index: usize,
}

impl RejectedFinding {
    pub fn from_rejected(rejected: CriticRejected, window_index: usize) -> Self {
        Self {
            original_finding: rejected.original_finding,
            reason: rejected.reason,
            window_index,
        }
    }
}
