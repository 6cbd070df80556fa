use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::HackerWithScans;
use crate::entities::scans;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HackerDto {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub badge_code: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub scans: Vec<ScanDto>,
}

impl From<HackerWithScans> for HackerDto {
    fn from((hacker, scans): HackerWithScans) -> Self {
        Self {
            name: hacker.name,
            email: hacker.email,
            phone: hacker.phone,
            badge_code: hacker.badge_code,
            updated_at: hacker.updated_at,
            scans: scans.into_iter().map(ScanDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScanDto {
    pub activity_name: String,
    pub activity_category: String,
    pub scanned_at: DateTime<Utc>,
}

impl From<scans::Model> for ScanDto {
    fn from(scan: scans::Model) -> Self {
        Self {
            activity_name: scan.activity_name,
            activity_category: scan.activity_category,
            scanned_at: scan.scanned_at,
        }
    }
}

/// The inserted scan row, badge code included.
#[derive(Debug, Serialize)]
pub struct ScanRowDto {
    pub badge_code: String,
    pub activity_name: String,
    pub activity_category: String,
    pub scanned_at: DateTime<Utc>,
}

impl From<scans::Model> for ScanRowDto {
    fn from(scan: scans::Model) -> Self {
        Self {
            badge_code: scan.badge_code,
            activity_name: scan.activity_name,
            activity_category: scan.activity_category,
            scanned_at: scan.scanned_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryFrequencyDto {
    pub activity_category: String,
    pub frequency: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHackerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub badge_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordScanRequest {
    pub activity_name: Option<String>,
    pub activity_category: Option<String>,
}

/// Bounds arrive as raw strings so an unparsable integer degrades to
/// "no bound" instead of a rejected request.
#[derive(Debug, Deserialize)]
pub struct ScanAggregationQuery {
    pub min_frequency: Option<String>,
    pub max_frequency: Option<String>,
    pub activity_category: Option<String>,
}
