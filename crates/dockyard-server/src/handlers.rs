use crate::error::AppError;
use crate::forms::{CreateContainerForm, ResourcesForm, StopForm};
use crate::AppState;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::{Form, Json};
use dockyard_common::{
    ContainerCreationResult, ContainerResourceView, ContainerSummary, CreateContainerRequest,
    ResourceUpdateRequest, StopResult,
};
use tracing::{info, instrument};

/// POST /containers
#[instrument(skip_all)]
pub async fn create_container(
    State(state): State<AppState>,
    form: Result<Form<CreateContainerForm>, FormRejection>,
) -> Result<Json<ContainerCreationResult>, AppError> {
    let Form(form) = form?;
    let request = CreateContainerRequest::try_from(form)?;
    info!(
        ram = request.ram_bytes,
        cpu = request.cpu_cores,
        host_port = request.host_port,
        "Provisioning container"
    );

    let created = state.service.create(request).await?;
    info!(container_id = %created.container_id, ip_address = %created.ip_address, "Container provisioned");
    Ok(Json(created))
}

/// GET /containers
#[instrument(skip_all)]
pub async fn list_containers(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContainerSummary>>, AppError> {
    Ok(Json(state.service.list().await?))
}

/// GET /containers/:id/resources
#[instrument(skip(state))]
pub async fn get_container_resources(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContainerResourceView>, AppError> {
    Ok(Json(state.service.resources(&id).await?))
}

/// PUT /containers/:id/resources
#[instrument(skip(state, form))]
pub async fn update_container_resources(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<ResourcesForm>, FormRejection>,
) -> Result<Json<ContainerResourceView>, AppError> {
    let Form(form) = form?;
    let update = ResourceUpdateRequest::try_from(form)?;

    Ok(Json(state.service.update_resources(&id, update).await?))
}

/// POST /containers/stop
#[instrument(skip_all)]
pub async fn stop_container(
    State(state): State<AppState>,
    form: Result<Form<StopForm>, FormRejection>,
) -> Result<Json<StopResult>, AppError> {
    let Form(form) = form?;
    let id = form.into_container_id()?;
    info!(container_id = %id, "Received stop request");

    Ok(Json(state.service.stop(&id).await?))
}
