// HTTP interface - routes, handlers and the response envelope

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::deadline::with_deadline;
use crate::infrastructure::middleware::{viewer_context_middleware, ApiJson, ApiPath, ApiQuery, Vc};
use crate::models::{DoctorProfile, ListQuery, Page, RecordId, ReviewSubmission};
use crate::services::{NewHospital, NewProfession};
use crate::votes::VoteIntent;

/// Envelope shared by every successful response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: &'static str,
    pub data: T,
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = ApiResponse {
        status: status.as_u16(),
        message: "success",
        data,
    };
    (status, Json(body)).into_response()
}

fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, data)
}

fn created_or_ok<T: Serialize>(created: bool, data: T) -> Response {
    respond(if created { StatusCode::CREATED } else { StatusCode::OK }, data)
}

#[derive(Debug, Deserialize)]
pub struct CommentQuery {
    pub doctor_id: RecordId,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub intent: VoteIntent,
}

#[derive(Debug, Serialize)]
struct Upserted<T> {
    #[serde(flatten)]
    record: T,
    created: bool,
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.server.cors_origin.as_deref());

    Router::new()
        .route("/health", get(health))
        .route("/doctors", get(rank_doctors).put(upsert_doctor_profile))
        .route("/doctors/self", get(doctor_by_self))
        .route("/doctors/{doctor_id}", get(doctor_detail))
        .route("/comments", get(list_comments).put(submit_review))
        .route("/comments/{comment_id}/vote", get(vote_of).put(apply_vote))
        .route("/comments/{comment_id}/votes", get(votes_for))
        .route("/professions", get(list_professions).post(create_profession))
        .route("/hospitals", get(list_hospitals).post(create_hospital))
        .layer(middleware::from_fn(viewer_context_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(Err(_)) => {
            warn!("CORS_ORIGIN is not a valid header value, allowing any origin");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}

async fn health(State(state): State<AppState>) -> AppResult<Response> {
    with_deadline(state.config.request_timeout(), "health", state.store.health_check()).await?;
    Ok(ok("healthy"))
}

// Doctors

async fn rank_doctors(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Response> {
    let page = query.page(state.config.ranking.default_page_size);
    let doctors = with_deadline(
        state.config.request_timeout(),
        "rank doctors",
        state.ranking.rank_doctors(&query.term, page),
    )
    .await?;
    Ok(ok(doctors))
}

async fn doctor_detail(
    State(state): State<AppState>,
    ApiPath(doctor_id): ApiPath<RecordId>,
) -> AppResult<Response> {
    let detail = with_deadline(
        state.config.request_timeout(),
        "doctor detail",
        state.ranking.doctor_detail(doctor_id),
    )
    .await?;
    Ok(ok(detail))
}

async fn doctor_by_self(State(state): State<AppState>, vc: Vc) -> AppResult<Response> {
    let view = with_deadline(
        state.config.request_timeout(),
        "own doctor profile",
        state.directory.doctor_by_self(&vc),
    )
    .await?;
    Ok(ok(view))
}

async fn upsert_doctor_profile(
    State(state): State<AppState>,
    vc: Vc,
    ApiJson(profile): ApiJson<DoctorProfile>,
) -> AppResult<Response> {
    let (view, created) = with_deadline(
        state.config.request_timeout(),
        "upsert doctor profile",
        state.directory.upsert_doctor_profile(&vc, profile),
    )
    .await?;
    Ok(created_or_ok(created, Upserted { record: view, created }))
}

// Comments and votes

async fn submit_review(
    State(state): State<AppState>,
    vc: Vc,
    ApiJson(submission): ApiJson<ReviewSubmission>,
) -> AppResult<Response> {
    let (comment, created) = with_deadline(
        state.config.request_timeout(),
        "submit review",
        state.reviews.submit_review(&vc, submission),
    )
    .await?;
    Ok(created_or_ok(created, Upserted { record: comment, created }))
}

async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentQuery>,
) -> AppResult<Response> {
    let page = Page::new(query.skip, query.limit, state.config.ranking.default_page_size);
    let comments = with_deadline(
        state.config.request_timeout(),
        "list comments",
        state.reviews.list_comments(query.doctor_id, page),
    )
    .await?;
    Ok(ok(comments))
}

async fn apply_vote(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(comment_id): ApiPath<RecordId>,
    ApiJson(request): ApiJson<VoteRequest>,
) -> AppResult<Response> {
    let receipt = with_deadline(
        state.config.request_timeout(),
        "apply vote",
        state.votes.apply_vote(&vc, comment_id, request.intent),
    )
    .await?;
    Ok(ok(receipt))
}

async fn vote_of(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(comment_id): ApiPath<RecordId>,
) -> AppResult<Response> {
    let voter_id = vc.require_user()?;
    let vote = with_deadline(
        state.config.request_timeout(),
        "vote lookup",
        state.votes.vote_of(comment_id, voter_id),
    )
    .await?;
    Ok(ok(vote))
}

async fn votes_for(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<RecordId>,
) -> AppResult<Response> {
    let tally = with_deadline(
        state.config.request_timeout(),
        "list votes",
        state.votes.votes_for(comment_id),
    )
    .await?;
    Ok(ok(tally))
}

// Reference data

async fn create_profession(
    State(state): State<AppState>,
    vc: Vc,
    ApiJson(input): ApiJson<NewProfession>,
) -> AppResult<Response> {
    let profession = with_deadline(
        state.config.request_timeout(),
        "create profession",
        state.directory.create_profession(&vc, input),
    )
    .await?;
    Ok(respond(StatusCode::CREATED, profession))
}

async fn list_professions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Response> {
    let page = query.page(state.config.ranking.default_page_size);
    let professions = with_deadline(
        state.config.request_timeout(),
        "list professions",
        state.directory.list_professions(&query.term, page),
    )
    .await?;
    Ok(ok(professions))
}

async fn create_hospital(
    State(state): State<AppState>,
    vc: Vc,
    ApiJson(input): ApiJson<NewHospital>,
) -> AppResult<Response> {
    let hospital = with_deadline(
        state.config.request_timeout(),
        "create hospital",
        state.directory.create_hospital(&vc, input),
    )
    .await?;
    Ok(respond(StatusCode::CREATED, hospital))
}

async fn list_hospitals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Response> {
    let page = query.page(state.config.ranking.default_page_size);
    let hospitals = with_deadline(
        state.config.request_timeout(),
        "list hospitals",
        state.directory.list_hospitals(&query.term, page),
    )
    .await?;
    Ok(ok(hospitals))
}
