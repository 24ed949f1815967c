//! Form bodies as sent by the browser, and their validation.
//!
//! Fields are taken as raw strings so that a bad value produces our own
//! message instead of the extractor's deserialization error.

use dockyard_common::{CreateContainerRequest, DockyardError, ResourceUpdateRequest, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CreateContainerForm {
    pub ram: Option<String>,
    pub cpu: Option<String>,
    #[serde(rename = "hostPort")]
    pub host_port: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourcesForm {
    pub ram: Option<String>,
    pub cpu: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopForm {
    #[serde(rename = "containerID")]
    pub container_id: Option<String>,
}

fn positive(value: Option<&str>, message: &str) -> Result<i64> {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| DockyardError::InvalidInput(message.to_string()))
}

fn ram(value: Option<&str>) -> Result<i64> {
    positive(value, "Invalid input for RAM")
}

fn cpu(value: Option<&str>) -> Result<i64> {
    positive(value, "Invalid input for CPU")
}

fn host_port(value: Option<&str>) -> Result<u16> {
    value
        .and_then(|v| v.parse::<u16>().ok())
        .filter(|port| *port != 0)
        .ok_or_else(|| DockyardError::InvalidInput("Invalid input for host port".to_string()))
}

impl TryFrom<CreateContainerForm> for CreateContainerRequest {
    type Error = DockyardError;

    fn try_from(form: CreateContainerForm) -> Result<Self> {
        Ok(Self {
            ram_bytes: ram(form.ram.as_deref())?,
            cpu_cores: cpu(form.cpu.as_deref())?,
            host_port: host_port(form.host_port.as_deref())?,
        })
    }
}

impl TryFrom<ResourcesForm> for ResourceUpdateRequest {
    type Error = DockyardError;

    fn try_from(form: ResourcesForm) -> Result<Self> {
        Ok(Self {
            ram_bytes: ram(form.ram.as_deref())?,
            cpu_cores: cpu(form.cpu.as_deref())?,
        })
    }
}

impl StopForm {
    pub fn into_container_id(self) -> Result<String> {
        self.container_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| DockyardError::InvalidInput("Invalid input for container ID".to_string()))
    }
}
