use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::{
    ApiError, AppState, CategoryFrequencyDto, RecordScanRequest, ScanAggregationQuery, ScanRowDto,
};

pub async fn record_scan(
    State(state): State<Arc<AppState>>,
    Path(badge_code): Path<String>,
    Json(payload): Json<RecordScanRequest>,
) -> Result<Json<ScanRowDto>, ApiError> {
    let activity_name = payload
        .activity_name
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::missing_field("activity_name"))?;
    let activity_category = payload
        .activity_category
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::missing_field("activity_category"))?;

    let inserted = state
        .store
        .record_scan(&badge_code, activity_name, activity_category)
        .await?;

    match inserted {
        Some(scan) => Ok(Json(ScanRowDto::from(scan))),
        None => Err(ApiError::invalid_badge_code()),
    }
}

pub async fn aggregate_scans(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScanAggregationQuery>,
) -> Result<Json<Vec<CategoryFrequencyDto>>, ApiError> {
    let min_frequency = params.min_frequency.as_deref().and_then(|s| s.parse().ok());
    let max_frequency = params.max_frequency.as_deref().and_then(|s| s.parse().ok());

    let counts = state
        .store
        .aggregate_scans(
            params.activity_category.as_deref(),
            min_frequency,
            max_frequency,
        )
        .await?;

    Ok(Json(
        counts
            .into_iter()
            .map(|c| CategoryFrequencyDto {
                activity_category: c.activity_category,
                frequency: c.frequency,
            })
            .collect(),
    ))
}
