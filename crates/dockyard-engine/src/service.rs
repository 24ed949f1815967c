use crate::ports::{PortConflictChecker, PortReservations};
use dockyard_common::{
    ContainerCreationResult, ContainerEngine, ContainerResourceView, ContainerSummary,
    CreateContainerRequest, CreationSpec, DockyardError, PortBinding, ResourceLimits,
    ResourceUpdateRequest, Result, StopResult,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Image used when none is configured.
pub const DEFAULT_IMAGE: &str = "ombansod";

/// Request-level container operations on top of a [`ContainerEngine`].
#[derive(Clone)]
pub struct ContainerService {
    engine: Arc<dyn ContainerEngine>,
    checker: Arc<PortConflictChecker>,
    reservations: PortReservations,
    image: String,
}

impl ContainerService {
    pub fn new(engine: Arc<dyn ContainerEngine>, image: impl Into<String>) -> Self {
        Self {
            checker: Arc::new(PortConflictChecker::new(engine.clone())),
            engine,
            reservations: PortReservations::new(),
            image: image.into(),
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn reservations(&self) -> &PortReservations {
        &self.reservations
    }

    /// Creates and starts a container publishing `80/tcp` on the requested host port.
    ///
    /// Nothing is rolled back on failure: a container whose start fails is left
    /// behind in the created state.
    #[instrument(skip(self), fields(host_port = request.host_port))]
    pub async fn create(&self, request: CreateContainerRequest) -> Result<ContainerCreationResult> {
        let limits = ResourceLimits::try_from(&request)?;

        let _reservation = self
            .reservations
            .reserve(request.host_port)
            .ok_or(DockyardError::PortAllocated(request.host_port))?;

        if self.checker.is_allocated(request.host_port).await? {
            return Err(DockyardError::PortAllocated(request.host_port));
        }

        let spec = CreationSpec {
            image: self.image.clone(),
            limits,
            binding: PortBinding::http(request.host_port),
        };

        let container_id = self.engine.create_container(&spec).await?;
        info!(%container_id, "Container created");

        if let Err(e) = self.engine.start_container(&container_id).await {
            warn!(%container_id, error = %e, "Start failed; created container left in place");
            return Err(e);
        }
        info!(%container_id, "Container started");

        let details = self.engine.inspect_container(&container_id).await?;
        // Any attached network will do; the engine's map order is not stable.
        let ip_address = details
            .network_addresses
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(ContainerCreationResult {
            container_id,
            ip_address,
        })
    }

    #[instrument(skip(self))]
    pub async fn resources(&self, id: &str) -> Result<ContainerResourceView> {
        let details = self.engine.inspect_container(id).await?;
        Ok(ContainerResourceView::from(&details))
    }

    /// Applies new limits and returns whatever the engine reports afterwards.
    #[instrument(skip(self))]
    pub async fn update_resources(
        &self,
        id: &str,
        update: ResourceUpdateRequest,
    ) -> Result<ContainerResourceView> {
        let limits = ResourceLimits::try_from(&update)?;
        self.engine.update_resources(id, &limits).await?;
        info!(container_id = %id, memory = limits.memory, nano_cpus = limits.nano_cpus, "Container resources updated");

        self.resources(id).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ContainerSummary>> {
        let containers = self.engine.list_containers().await?;
        Ok(containers.into_iter().map(ContainerSummary::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn stop(&self, id: &str) -> Result<StopResult> {
        info!(container_id = %id, "Stopping container");
        self.engine.stop_container(id).await?;
        Ok(StopResult::stopped())
    }
}
