use anyhow::anyhow;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder title for records whose extraction found no title.
pub const DEFAULT_TITLE: &str = "待完善职位";
/// Placeholder company for records whose extraction found no company.
pub const DEFAULT_COMPANY: &str = "未知企业";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Captured,
    Applied,
    Interview,
    Rejected,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Captured => "captured",
            JobStatus::Applied => "applied",
            JobStatus::Interview => "interview",
            JobStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "captured" => Ok(JobStatus::Captured),
            "applied" => Ok(JobStatus::Applied),
            "interview" => Ok(JobStatus::Interview),
            "rejected" => Ok(JobStatus::Rejected),
            other => Err(anyhow!(
                "Unknown status '{}'. Valid: captured, applied, interview, rejected",
                other
            )),
        }
    }
}

/// A captured job application. Fields serialize camelCase to match the
/// stored blob layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub url: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub date_captured: String,
    pub status: JobStatus,
}

impl JobRecord {
    /// Build a new record from an extraction result, filling every gap with
    /// its default. `url`, `date_captured` and `status` are always set here,
    /// never taken from extraction.
    pub fn from_extraction(url: &str, extracted: ExtractionResult) -> Self {
        Self {
            id: new_record_id(),
            title: extracted.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            company: extracted
                .company
                .unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            location: extracted.location.unwrap_or_default(),
            salary: extracted.salary.unwrap_or_default(),
            url: url.to_string(),
            description: extracted.description.unwrap_or_default(),
            requirements: extracted.requirements.unwrap_or_default(),
            date_captured: Utc::now().to_rfc3339(),
            status: JobStatus::Captured,
        }
    }
}

/// Partial, untrusted fields inferred by the extraction service. Every field
/// is optional; unknown fields in the service's JSON are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
}

/// Unique record id: millisecond timestamp plus a random base-36 suffix.
pub fn new_record_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("item_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_extraction_fills_every_default() {
        let record =
            JobRecord::from_extraction("https://example.com/job/1", ExtractionResult::default());
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.company, DEFAULT_COMPANY);
        assert_eq!(record.location, "");
        assert_eq!(record.salary, "");
        assert_eq!(record.description, "");
        assert!(record.requirements.is_empty());
        assert_eq!(record.url, "https://example.com/job/1");
        assert_eq!(record.status, JobStatus::Captured);
        assert!(!record.id.is_empty());
        assert!(!record.date_captured.is_empty());
    }

    #[test]
    fn test_extraction_fields_win_over_defaults() {
        let extracted = ExtractionResult {
            title: Some("Rust Engineer".to_string()),
            company: Some("Tencent (腾讯)".to_string()),
            location: Some("Shenzhen".to_string()),
            salary: Some("30k-50k".to_string()),
            description: Some("Build backend services".to_string()),
            requirements: Some(vec!["Rust".to_string(), "SQL".to_string()]),
        };
        let record = JobRecord::from_extraction("https://careers.tencent.com/x", extracted);
        assert_eq!(record.title, "Rust Engineer");
        assert_eq!(record.company, "Tencent (腾讯)");
        assert_eq!(record.location, "Shenzhen");
        assert_eq!(record.salary, "30k-50k");
        assert_eq!(record.requirements.len(), 2);
    }

    #[test]
    fn test_record_ids_are_distinct() {
        let a = new_record_id();
        let b = new_record_id();
        assert_ne!(a, b);
        assert!(a.starts_with("item_"));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for s in ["captured", "applied", "interview", "rejected"] {
            let status: JobStatus = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("archived".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = JobRecord::from_extraction("", ExtractionResult::default());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"dateCaptured\""));
        assert!(json.contains("\"status\":\"captured\""));
    }
}
