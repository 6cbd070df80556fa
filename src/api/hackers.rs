use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, AppState, HackerDto, UpdateHackerRequest};
use crate::db::HackerPatch;

pub async fn list_hackers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HackerDto>>, ApiError> {
    let hackers = state.store.list_hackers().await?;
    Ok(Json(hackers.into_iter().map(HackerDto::from).collect()))
}

pub async fn get_hacker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<HackerDto>, ApiError> {
    let hacker = state.store.get_hacker(id).await?;
    match hacker {
        Some(h) => Ok(Json(HackerDto::from(h))),
        None => Err(ApiError::hacker_not_found(id)),
    }
}

pub async fn update_hacker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateHackerRequest>,
) -> Result<Json<HackerDto>, ApiError> {
    let patch = HackerPatch {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        badge_code: payload.badge_code,
    };

    let updated = state.store.update_hacker(id, patch).await?;
    match updated {
        Some(h) => Ok(Json(HackerDto::from(h))),
        None => Err(ApiError::hacker_not_found(id)),
    }
}
