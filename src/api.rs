//! HTTP API endpoints.
//!
//! Every `/api` route runs behind [`participant_auth_middleware`]; admin
//! routes additionally check the participant's role.

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::auth::{participant_auth_middleware, CurrentParticipant};
use crate::error::GameResult;
use crate::protocol::*;
use crate::state::export::GameStateExport;
use crate::state::settings::SettingsUpdate;
use crate::state::AppState;
use crate::types::*;

/// Build the application router (without outer layers like tracing/CORS)
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/word", post(submit_word).delete(withdraw_word))
        .route("/vote", post(vote))
        .route("/me/password", put(change_password))
        .route("/admin/settings", get(get_settings).put(update_settings))
        .route(
            "/admin/participants",
            get(list_participants).post(create_participant),
        )
        .route("/admin/participants/{id}/points", put(set_points))
        .route("/admin/participants/{id}/reward", post(reward_point))
        .route("/admin/cooldowns", get(list_cooldowns))
        .route("/admin/state/export", get(export_state))
        .route("/admin/state/import", post(import_state))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            participant_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

pub async fn health() -> &'static str {
    "ok"
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentParticipant(me)): Extension<CurrentParticipant>,
) -> GameResult<Json<DashboardView>> {
    Ok(Json(state.dashboard(&me.id).await?))
}

/// POST /api/word
pub async fn submit_word(
    State(state): State<Arc<AppState>>,
    Extension(CurrentParticipant(me)): Extension<CurrentParticipant>,
    Json(request): Json<SubmitWordRequest>,
) -> GameResult<Json<ActionResponse<WordEntry>>> {
    let outcome = state.submit_word(&me.id, &request.word).await?;
    Ok(Json(ActionResponse::with_data(
        outcome.message(),
        outcome.entry().clone(),
    )))
}

/// DELETE /api/word
pub async fn withdraw_word(
    State(state): State<Arc<AppState>>,
    Extension(CurrentParticipant(me)): Extension<CurrentParticipant>,
) -> GameResult<Json<ActionResponse<()>>> {
    let message = match state.withdraw_word(&me.id).await? {
        Some(entry) => format!("Word '{}' withdrawn", entry.word),
        None => "You had no word today".to_string(),
    };
    Ok(Json(ActionResponse::message(message)))
}

/// POST /api/vote
pub async fn vote(
    State(state): State<Arc<AppState>>,
    Extension(CurrentParticipant(me)): Extension<CurrentParticipant>,
    Json(request): Json<VoteRequest>,
) -> GameResult<Json<ActionResponse<VoteResult>>> {
    let outcome = state.award_point(&me.id, &request.participant_id).await?;
    Ok(Json(ActionResponse::with_data(
        format!("Point awarded to {}", outcome.participant.username),
        VoteResult {
            participant: ParticipantInfo::from(&outcome.participant),
            cooldown: outcome.cooldown,
        },
    )))
}

/// PUT /api/me/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentParticipant(me)): Extension<CurrentParticipant>,
    Json(request): Json<ChangePasswordRequest>,
) -> GameResult<Json<ActionResponse<()>>> {
    state
        .change_password(&me.id, &request.current_password, &request.new_password)
        .await?;
    Ok(Json(ActionResponse::message("Password changed")))
}

/// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
) -> GameResult<Json<RoundConfiguration>> {
    current.require_admin("view settings")?;
    Ok(Json(state.round_config().await?))
}

/// PUT /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
    Json(update): Json<SettingsUpdate>,
) -> GameResult<Json<ActionResponse<RoundConfiguration>>> {
    current.require_admin("change settings")?;
    let config = state.update_settings(update).await?;
    Ok(Json(ActionResponse::with_data("Settings updated", config)))
}

/// GET /api/admin/participants
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
) -> GameResult<Json<Vec<ParticipantInfo>>> {
    current.require_admin("list participants")?;
    let list: Vec<ParticipantInfo> = state
        .list_participants()
        .await
        .iter()
        .map(ParticipantInfo::from)
        .collect();
    Ok(Json(list))
}

/// POST /api/admin/participants
pub async fn create_participant(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
    Json(request): Json<CreateParticipantRequest>,
) -> GameResult<Json<ActionResponse<ParticipantInfo>>> {
    current.require_admin("create participants")?;
    let participant = state
        .create_participant(&request.username, &request.password, request.role)
        .await?;
    Ok(Json(ActionResponse::with_data(
        format!("User '{}' created", participant.username),
        ParticipantInfo::from(&participant),
    )))
}

/// PUT /api/admin/participants/{id}/points
pub async fn set_points(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
    Path(id): Path<ParticipantId>,
    Json(request): Json<SetPointsRequest>,
) -> GameResult<Json<ActionResponse<ParticipantInfo>>> {
    current.require_admin("set points")?;
    let participant = state.set_points(&id, request.points).await?;
    Ok(Json(ActionResponse::with_data(
        format!(
            "Points of {} set to {}",
            participant.username, participant.points
        ),
        ParticipantInfo::from(&participant),
    )))
}

/// POST /api/admin/participants/{id}/reward
pub async fn reward_point(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
    Path(id): Path<ParticipantId>,
) -> GameResult<Json<ActionResponse<ParticipantInfo>>> {
    current.require_admin("reward points")?;
    let participant = state.reward_point(&id).await?;
    Ok(Json(ActionResponse::with_data(
        format!("Point awarded to {}", participant.username),
        ParticipantInfo::from(&participant),
    )))
}

/// GET /api/admin/cooldowns
pub async fn list_cooldowns(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
) -> GameResult<Json<Vec<CooldownEntry>>> {
    current.require_admin("view cooldowns")?;
    Ok(Json(state.active_cooldowns().await))
}

/// GET /api/admin/state/export
pub async fn export_state(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
) -> GameResult<Json<GameStateExport>> {
    current.require_admin("export state")?;
    Ok(Json(state.export_state().await))
}

/// POST /api/admin/state/import
///
/// Replaces all current state with the imported data.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentParticipant>,
    Json(export): Json<GameStateExport>,
) -> GameResult<Json<ActionResponse<()>>> {
    current.require_admin("import state")?;
    state.import_state(export).await?;
    Ok(Json(ActionResponse::message("State imported successfully")))
}
