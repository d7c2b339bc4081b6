//! Serializable response types for the command-line surface
//!
//! Every command prints one of these as JSON, so scripted callers get a
//! stable shape whether an operation succeeded or failed.

use serde::Serialize;

/// Outcome of an indexing control operation
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultResponse {
    pub fn ok() -> Self {
        Self {
            result: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(error.into()),
        }
    }
}

/// One search hit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    /// Site root URL
    pub site: String,
    pub site_name: String,
    /// Site-relative path of the page
    pub uri: String,
    pub title: String,
    /// Text fragment around the first query match, matches wrapped in <b>
    pub snippet: String,
    /// Relative score in (0, 1], 1 for the best page
    pub relevance: f64,
}

/// Search results (or the validation error that prevented them)
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<SearchItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn found(count: usize, data: Vec<SearchItem>) -> Self {
        Self {
            result: true,
            count: Some(count),
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            result: false,
            count: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate counters over every configured site
#[derive(Debug, Serialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: u64,
    pub lemmas: u64,
    pub indexing: bool,
}

/// Per-site counters and status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStatisticsItem {
    pub url: String,
    pub name: String,
    pub status: String,
    /// RFC 3339 timestamp of the last status change
    pub status_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pages: u64,
    pub lemmas: u64,
}

#[derive(Debug, Serialize)]
pub struct StatisticsData {
    pub total: TotalStatistics,
    pub detailed: Vec<DetailedStatisticsItem>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub result: bool,
    pub statistics: StatisticsData,
}
