use std::sync::Arc;

use api_types::PodStatus;
use poem::handler;
use poem::http::StatusCode;
use poem::web::Data;
use poem::web::Json;
use poem::IntoResponse;
use poem::Response;

use super::errors::into_poem_error;
use crate::controller::WorkloadController;
use crate::controller::WorkloadOutcome;

fn confirmation(outcome: WorkloadOutcome) -> Response {
    let status = match outcome {
        WorkloadOutcome::Created => StatusCode::CREATED,
        WorkloadOutcome::Updated | WorkloadOutcome::Deleted => StatusCode::OK,
    };
    outcome.message().with_status(status).into_response()
}

/// List pods of the configured namespace as a JSON array
#[handler]
pub async fn list_pods(
    controller: Data<&Arc<WorkloadController>>,
) -> poem::Result<Json<Vec<PodStatus>>> {
    let pods = controller.list_pods().await.map_err(into_poem_error)?;
    Ok(Json(pods))
}

#[handler]
pub async fn create_workload(
    body: Vec<u8>,
    controller: Data<&Arc<WorkloadController>>,
) -> poem::Result<Response> {
    let outcome = controller.create(&body).await.map_err(into_poem_error)?;
    Ok(confirmation(outcome))
}

#[handler]
pub async fn update_workload(
    body: Vec<u8>,
    controller: Data<&Arc<WorkloadController>>,
) -> poem::Result<Response> {
    let outcome = controller.update(&body).await.map_err(into_poem_error)?;
    Ok(confirmation(outcome))
}

/// Delete the workload named by the manifest in the body.
#[handler]
pub async fn delete_workload(
    body: Vec<u8>,
    controller: Data<&Arc<WorkloadController>>,
) -> poem::Result<Response> {
    let outcome = controller.delete(&body).await.map_err(into_poem_error)?;
    Ok(confirmation(outcome))
}
