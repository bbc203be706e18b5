//! Relationship operation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::MemberId;
use domain::{
    AcceptFriend, ApplyFriend, BlockMember, DeleteFriend, MarkFriend, RejectFriend, ResultCode,
    UnblockMember,
};
use relation_store::{InMemoryCache, Persistor};
use saga::{ProfileSnapshot, RelationCoordinator};
use serde::Serialize;

use crate::error::ApiError;
use crate::extract::Caller;

/// Shared application state accessible from all handlers.
pub struct AppState<P> {
    pub coordinator: RelationCoordinator<P, InMemoryCache>,
}

// -- Response types --

/// Success envelope: `code` 0 plus the operation's payload fields.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub code: i32,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Success<T> {
    pub(crate) fn json(data: T) -> Json<Self> {
        Json(Self {
            code: ResultCode::Ok.as_i32(),
            data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct FriendIdResponse {
    pub friend_id: MemberId,
}

#[derive(Debug, Serialize)]
pub struct TargetIdResponse {
    pub target_id: MemberId,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub target_id: MemberId,
    pub profile: Option<ProfileSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct MarkResponse {
    pub friend_id: MemberId,
    pub tag: String,
}

// -- Handlers --

/// POST /friends/apply
#[tracing::instrument(skip(state))]
pub async fn apply<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Json(cmd): Json<ApplyFriend>,
) -> Result<Json<Success<Empty>>, ApiError> {
    state.coordinator.apply(caller, cmd).await?;
    Ok(Success::json(Empty {}))
}

/// POST /friends/accept
#[tracing::instrument(skip(state))]
pub async fn accept<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Json(cmd): Json<AcceptFriend>,
) -> Result<Json<Success<Empty>>, ApiError> {
    state.coordinator.accept(caller, cmd).await?;
    Ok(Success::json(Empty {}))
}

/// POST /friends/reject
#[tracing::instrument(skip(state))]
pub async fn reject<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Json(cmd): Json<RejectFriend>,
) -> Result<Json<Success<FriendIdResponse>>, ApiError> {
    let friend_id = state.coordinator.reject(caller, cmd).await?;
    Ok(Success::json(FriendIdResponse { friend_id }))
}

/// POST /friends/delete
#[tracing::instrument(skip(state))]
pub async fn delete<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Json(cmd): Json<DeleteFriend>,
) -> Result<Json<Success<FriendIdResponse>>, ApiError> {
    let friend_id = state.coordinator.delete(caller, cmd).await?;
    Ok(Success::json(FriendIdResponse { friend_id }))
}

/// POST /friends/block
#[tracing::instrument(skip(state))]
pub async fn block<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Json(cmd): Json<BlockMember>,
) -> Result<Json<Success<BlockResponse>>, ApiError> {
    let outcome = state.coordinator.block(caller, cmd).await?;
    Ok(Success::json(BlockResponse {
        target_id: outcome.target_id,
        profile: outcome.profile,
    }))
}

/// POST /friends/unblock
#[tracing::instrument(skip(state))]
pub async fn unblock<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Json(cmd): Json<UnblockMember>,
) -> Result<Json<Success<TargetIdResponse>>, ApiError> {
    let target_id = state.coordinator.unblock(caller, cmd).await?;
    Ok(Success::json(TargetIdResponse { target_id }))
}

/// POST /friends/mark
#[tracing::instrument(skip(state))]
pub async fn mark<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Caller(caller): Caller,
    Json(cmd): Json<MarkFriend>,
) -> Result<Json<Success<MarkResponse>>, ApiError> {
    let outcome = state.coordinator.mark(caller, cmd).await?;
    Ok(Success::json(MarkResponse {
        friend_id: outcome.friend_id,
        tag: outcome.tag,
    }))
}
