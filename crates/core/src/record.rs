//! Output record schema.
//!
//! Every record written to the dataset carries the full set of profile
//! fields. Unresolved fields hold the empty string, never `null` and never
//! absent, so consumers can rely on a fixed column set.

use std::ops::Index;

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Department slots, serialized as `department/0` and `department/1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Departments {
    #[serde(rename = "department/0", default)]
    first: String,
    #[serde(rename = "department/1", default)]
    second: String,
}

impl Departments {
    /// Number of addressable slots.
    pub const SLOTS: usize = 2;

    /// Fill slots in order from `values`; extra values are dropped.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut values = values.into_iter();
        Self { first: values.next().unwrap_or_default(), second: values.next().unwrap_or_default() }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.first),
            1 => Some(&self.second),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [self.first.as_str(), self.second.as_str()].into_iter()
    }
}

impl Index<usize> for Departments {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        match index {
            0 => &self.first,
            1 => &self.second,
            _ => panic!("department index {index} out of range (0..{})", Self::SLOTS),
        }
    }
}

/// The canonical extracted profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProfileRecord {
    // identity
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub person_id: String,

    // contact
    pub email: String,
    pub mobile_number: String,
    pub linkedin_profile: String,
    pub photo_url: String,

    // role
    pub job_title: String,
    pub headline: String,
    pub seniority: String,
    pub industry: String,
    #[serde(flatten)]
    pub department: Departments,

    // affiliation
    pub company_name: String,
    pub company_id: String,
    pub company_website: String,
    pub company_linkedin: String,
    pub company_size: String,
    pub company_phone_number: String,

    // geography
    pub city: String,
    pub state: String,
    pub country: String,
    pub company_city: String,
    pub company_state: String,
    pub company_country: String,

    // provenance
    pub url: String,
    pub scraped_at: String,
}

impl ProfileRecord {
    /// A record with every field at the sentinel except `url`.
    pub fn empty(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    /// Short human label for progress logs.
    pub fn summary(&self) -> String {
        let name = if self.full_name.is_empty() { "No name" } else { &self.full_name };
        let company = if self.company_name.is_empty() { "No company" } else { &self.company_name };
        format!("{name} at {company}")
    }
}

/// A profile-shaped record for a URL that could not be processed.
///
/// Serializes to exactly the `ProfileRecord` keys plus `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailureRecord {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    pub error: String,
}

impl FailureRecord {
    pub fn new(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self { profile: ProfileRecord::empty(url), error: error.into() }
    }
}

/// Outcome of processing one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ExtractionResult {
    // Failure first: untagged deserialization picks the first variant that fits
    // and every profile field has a default.
    Failure(FailureRecord),
    Profile(ProfileRecord),
}

impl ExtractionResult {
    pub fn url(&self) -> &str {
        match self {
            ExtractionResult::Profile(p) => &p.url,
            ExtractionResult::Failure(f) => &f.profile.url,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionResult::Failure(_))
    }

    pub fn profile(&self) -> &ProfileRecord {
        match self {
            ExtractionResult::Profile(p) => p,
            ExtractionResult::Failure(f) => &f.profile,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExtractionResult::Profile(_) => None,
            ExtractionResult::Failure(f) => Some(&f.error),
        }
    }
}

/// A dataset row: the record plus run metadata attached by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DatasetItem {
    #[serde(flatten)]
    pub record: ExtractionResult,
    /// 1-based batch number.
    pub batch: u64,
    #[serde(rename = "processedAt")]
    pub processed_at: String,
}

impl DatasetItem {
    pub fn new(record: ExtractionResult, batch: u64, processed_at: DateTime<Utc>) -> Self {
        Self { record, batch, processed_at: timestamp(&processed_at) }
    }
}

/// RFC 3339 timestamp with millisecond precision, UTC `Z` suffix.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
