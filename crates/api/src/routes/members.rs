//! Read-only relationship listings.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::MemberId;
use domain::{FriendView, PendingApplication, RelationView};
use relation_store::Persistor;
use serde::Serialize;

use super::friends::{AppState, Success};
use crate::error::ApiError;
use crate::extract::Caller;

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<FriendView>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub requester_id: MemberId,
    pub status: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<PendingApplication> for ApplicationResponse {
    fn from(app: PendingApplication) -> Self {
        Self {
            requester_id: app.requester(),
            status: app.status().as_i32(),
            updated_at: app.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationsResponse {
    pub applications: Vec<ApplicationResponse>,
}

#[derive(Debug, Serialize)]
pub struct RelationResponse {
    pub relation: RelationView,
}

/// Members may only read their own listings.
fn ensure_self(caller: MemberId, member: MemberId) -> Result<(), ApiError> {
    if caller != member {
        return Err(ApiError::CallerMismatch(format!(
            "member {caller} cannot read listings of member {member}"
        )));
    }
    Ok(())
}

/// GET /members/{id}/friends
#[tracing::instrument(skip(state))]
pub async fn friends<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Path(id): Path<i64>,
) -> Result<Json<Success<FriendsResponse>>, ApiError> {
    let member = MemberId::new(id);
    ensure_self(caller, member)?;
    let friends = state.coordinator.friends(member).await?;
    Ok(Success::json(FriendsResponse { friends }))
}

/// GET /members/{id}/applications
#[tracing::instrument(skip(state))]
pub async fn applications<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Path(id): Path<i64>,
) -> Result<Json<Success<ApplicationsResponse>>, ApiError> {
    let member = MemberId::new(id);
    ensure_self(caller, member)?;
    let applications = state
        .coordinator
        .applications(member)
        .await?
        .into_iter()
        .map(ApplicationResponse::from)
        .collect();
    Ok(Success::json(ApplicationsResponse { applications }))
}

/// GET /members/{id}/relations/{other}
#[tracing::instrument(skip(state))]
pub async fn relation<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Path((id, other)): Path<(i64, i64)>,
) -> Result<Json<Success<RelationResponse>>, ApiError> {
    let member = MemberId::new(id);
    ensure_self(caller, member)?;
    let relation = state
        .coordinator
        .relation(member, MemberId::new(other))
        .await?;
    Ok(Success::json(RelationResponse { relation }))
}
