// HTTP route handlers for the CodeJudge API

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use codejudge_common::progress::{DifficultyProgress, UserProfile};
use codejudge_common::session::{resolve_display_name, validate_display_name, User};
use codejudge_common::types::{Difficulty, Language, Problem, ProblemView, RunOutput};
use codejudge_judge::{EvaluationState, SubmitReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{AuthUser, MaybeUser};
use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProblemQuery {
    pub search: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub source_code: String,
    pub language: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub source_code: String,
    #[serde(default)]
    pub stdin: String,
    pub language: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayNameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub uid: String,
    pub display_name: String,
    pub accuracy: f64,
    pub difficulty: Vec<DifficultyProgress>,
    pub profile: UserProfile,
}

fn find_problem<'a>(state: &'a AppState, id: &str) -> Result<&'a Problem, ApiError> {
    state
        .catalog
        .get(id)
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
}

fn profile_response(state: &AppState, user: &User, profile: UserProfile) -> ProfileResponse {
    ProfileResponse {
        uid: user.uid.clone(),
        display_name: resolve_display_name(profile.display_name.as_deref(), &user.email),
        accuracy: profile.accuracy(),
        difficulty: profile.difficulty_breakdown(&state.catalog),
        profile,
    }
}

/// GET /health - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_handler() -> Result<impl IntoResponse, ApiError> {
    let body = metrics::render().map_err(ApiError::Metrics)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// GET /problems - Catalog listing, optionally filtered
pub async fn list_problems(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProblemQuery>,
) -> Result<Json<Vec<ProblemView>>, ApiError> {
    let difficulty = query
        .difficulty
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(str::parse::<Difficulty>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let problems = state
        .catalog
        .search(query.search.as_deref().unwrap_or_default())
        .into_iter()
        .filter(|p| difficulty.map_or(true, |d| p.difficulty == d))
        .map(ProblemView::from)
        .collect();

    Ok(Json(problems))
}

/// GET /problems/{id} - Problem detail without hidden test cases
pub async fn get_problem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProblemView>, ApiError> {
    let problem = find_problem(&state, &id)?;
    Ok(Json(ProblemView::from(problem)))
}

/// POST /problems/{id}/run - Evaluate the visible test cases
pub async fn run_problem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<EvaluationState>, ApiError> {
    let problem = find_problem(&state, &id)?;
    let service = state.service(payload.language);

    let result = service
        .run(user.as_ref(), problem, &payload.source_code, EvaluationState::idle())
        .await?;

    metrics::record_evaluation("run");
    metrics::record_outcomes(&result.outcomes);
    info!(
        problem_id = %id,
        passed = result.outcomes.iter().filter(|o| o.pass).count(),
        total = result.outcomes.len(),
        "Run finished"
    );

    Ok(Json(result))
}

/// POST /problems/{id}/submit - Score against every test case and update progress
pub async fn submit_problem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<SubmitReport>, ApiError> {
    let problem = find_problem(&state, &id)?;
    let service = state.service(payload.language);

    let report = service
        .submit(user.as_ref(), problem, &payload.source_code, EvaluationState::idle())
        .await?;

    metrics::record_evaluation("submit");
    if report.newly_solved {
        metrics::PROBLEMS_SOLVED_TOTAL.inc();
    }
    if let Some(score) = report.state.score {
        info!(
            problem_id = %id,
            correct = score.correct,
            total = score.total,
            newly_solved = report.newly_solved,
            "Submit finished"
        );
    }

    Ok(Json(report))
}

/// POST /execute - Free run with custom stdin
pub async fn execute(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<RunOutput>, ApiError> {
    let service = state.service(payload.language);
    let output = service
        .execute(user.as_ref(), &payload.source_code, &payload.stdin)
        .await?;

    metrics::record_evaluation("execute");
    Ok(Json(output))
}

/// GET /profile - Progress of the signed-in user
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.progress.profile(&user).await?;
    Ok(Json(profile_response(&state, &user, profile)))
}

/// PUT /profile/name - Change the display name
pub async fn set_display_name(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<DisplayNameRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let name = validate_display_name(&payload.name)?;
    let profile = state.progress.set_display_name(&user, &name).await?;
    info!(uid = %user.uid, "Display name updated");
    Ok(Json(profile_response(&state, &user, profile)))
}
