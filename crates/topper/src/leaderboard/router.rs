use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::clock::Clock;
use super::domain::{GiftId, ProfilePatch, Registration, UserId, ValidationError};
use super::ranking::LeaderboardScope;
use super::service::{LeaderboardError, LeaderboardService};
use super::store::UserStore;
use super::views::UserView;

type SharedService<S, C> = Arc<LeaderboardService<S, C>>;

#[derive(Debug, Deserialize)]
pub(crate) struct LikeRequest {
    pub(crate) target: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GiftRequest {
    pub(crate) receiver: UserId,
    pub(crate) gift_id: GiftId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopUpRequest {
    pub(crate) amount: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LeaderboardQuery {
    #[serde(default)]
    pub(crate) city: Option<String>,
}

/// Router exposing registration, profile, interaction, ranking, and sweep endpoints.
///
/// The `:user_id` segment on mutating routes is the actor already authenticated upstream.
pub fn leaderboard_router<S, C>(service: SharedService<S, C>) -> Router
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/api/v1/users", post(register_handler::<S, C>))
        .route("/api/v1/users/:user_id", get(profile_handler::<S, C>))
        .route(
            "/api/v1/users/:user_id/profile",
            patch(update_profile_handler::<S, C>),
        )
        .route(
            "/api/v1/users/:user_id/account",
            get(account_handler::<S, C>),
        )
        .route("/api/v1/users/:user_id/likes", post(like_handler::<S, C>))
        .route(
            "/api/v1/users/:user_id/likes/claim",
            post(claim_handler::<S, C>),
        )
        .route("/api/v1/users/:user_id/gifts", post(gift_handler::<S, C>))
        .route(
            "/api/v1/users/:user_id/balance",
            post(top_up_handler::<S, C>),
        )
        .route("/api/v1/leaderboard", get(leaderboard_handler::<S, C>))
        .route("/api/v1/cities/:city/podium", get(podium_handler::<S, C>))
        .route("/api/v1/gifts", get(gifts_handler::<S, C>))
        .route("/api/v1/sweeps", post(sweep_handler::<S, C>))
        .with_state(service)
}

pub(crate) async fn register_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Json(registration): Json<Registration>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    match service.register(registration) {
        Ok(record) => (
            StatusCode::CREATED,
            Json(UserView::from_user(&record.user)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn profile_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.profile(&UserId(user_id)))
}

pub(crate) async fn account_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.account(&UserId(user_id)))
}

pub(crate) async fn update_profile_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(user_id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.update_profile(&UserId(user_id), patch))
}

pub(crate) async fn like_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(user_id): Path<String>,
    Json(request): Json<LikeRequest>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.like(&UserId(user_id), &request.target))
}

pub(crate) async fn claim_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.claim_daily_bonus(&UserId(user_id)))
}

pub(crate) async fn gift_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(user_id): Path<String>,
    Json(request): Json<GiftRequest>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.send_gift(&UserId(user_id), &request.receiver, &request.gift_id))
}

pub(crate) async fn top_up_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(user_id): Path<String>,
    Json(request): Json<TopUpRequest>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.top_up(&UserId(user_id), request.amount))
}

pub(crate) async fn leaderboard_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Query(query): Query<LeaderboardQuery>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    let scope = match query.city.filter(|city| !city.trim().is_empty()) {
        Some(city) => LeaderboardScope::City(city),
        None => LeaderboardScope::Global,
    };

    match service.leaderboard(&scope) {
        Ok(entries) => Json(json!({ "scope": scope, "entries": entries })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn podium_handler<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(city): Path<String>,
) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.city_podium(&city))
}

pub(crate) async fn gifts_handler<S, C>(State(service): State<SharedService<S, C>>) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    Json(service.gifts()).into_response()
}

pub(crate) async fn sweep_handler<S, C>(State(service): State<SharedService<S, C>>) -> Response
where
    S: UserStore + 'static,
    C: Clock + 'static,
{
    respond(service.run_sweep())
}

fn respond<T: serde::Serialize>(result: Result<T, LeaderboardError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: LeaderboardError) -> Response {
    let status = match &err {
        LeaderboardError::Validation(ValidationError::LoginTaken(_)) => StatusCode::CONFLICT,
        LeaderboardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeaderboardError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        LeaderboardError::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
        LeaderboardError::ConcurrentUpdate(_) => StatusCode::CONFLICT,
        LeaderboardError::NotFound(_) => StatusCode::NOT_FOUND,
        LeaderboardError::Store(_) => {
            warn!(error = %err, "user store failure");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let mut payload = json!({
        "error": err.to_string(),
        "code": err.code(),
    });
    if let LeaderboardError::RateLimited(limit) = &err {
        payload["retry_at"] = json!(limit.retry_at());
    }

    (status, Json(payload)).into_response()
}
