//! `POST /process_video`: one trigger, one run.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use rf_core::RunId;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct RunCompleted {
    pub status: &'static str,
    pub run_id: RunId,
    pub video_id: String,
    pub url: Option<String>,
}

/// Start a run and answer once it finishes.
///
/// The run executes on its own task under a child of the shutdown token. If
/// the caller goes away, dropping this handler trips the drop guard and the
/// run is cancelled at its current stage.
pub async fn process_video(State(ctx): State<AppContext>) -> Result<Json<RunCompleted>, AppError> {
    let cancel = ctx.shutdown.child_token();
    let guard = cancel.clone().drop_guard();

    let orchestrator = ctx.orchestrator.clone();
    let handle = tokio::spawn(async move { orchestrator.run(cancel).await });

    let outcome = handle
        .await
        .map_err(|e| AppError::Internal(format!("run task failed: {e}")))?;
    guard.disarm();

    let report = outcome?;
    Ok(Json(RunCompleted {
        status: "completed",
        run_id: report.run_id,
        video_id: report.receipt.video_id,
        url: report.receipt.url,
    }))
}
