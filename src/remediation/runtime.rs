//! Container runtime collaborator

use async_trait::async_trait;
use tokio::process::Command;

/// A running container as the runtime reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Container {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Command(String),

    #[error("Runtime call timed out after {0}s")]
    Timeout(u64),
}

/// Lookup-and-restart operations on workload containers
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn lookup(&self, container_id: &str) -> Result<ContainerHandle, RuntimeError>;

    async fn restart(&self, container: &ContainerHandle) -> Result<(), RuntimeError>;
}

/// Drives the local Docker engine through its CLI
#[derive(Debug, Clone)]
pub struct DockerCli {
    bin: String,
}

impl DockerCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run(&self, container_id: &str, args: &[&str]) -> Result<String, RuntimeError> {
        let output = Command::new(&self.bin)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RuntimeError::Command(format!("Failed to run {}: {}", self.bin, e)))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_not_found(&stderr) {
            Err(RuntimeError::NotFound(container_id.to_string()))
        } else {
            Err(RuntimeError::Command(stderr))
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn lookup(&self, container_id: &str) -> Result<ContainerHandle, RuntimeError> {
        let name = self
            .run(container_id, &inspect_args(container_id))
            .await?;

        Ok(ContainerHandle {
            id: container_id.to_string(),
            name: name.trim_start_matches('/').to_string(),
        })
    }

    async fn restart(&self, container: &ContainerHandle) -> Result<(), RuntimeError> {
        self.run(&container.id, &restart_args(&container.id)).await?;
        Ok(())
    }
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("No such container") || stderr.contains("No such object")
}

// `--` ends option parsing so an id can never be read as a flag.
fn inspect_args(container_id: &str) -> [&str; 7] {
    ["inspect", "--type", "container", "--format", "{{.Name}}", "--", container_id]
}

fn restart_args(container_id: &str) -> [&str; 3] {
    ["restart", "--", container_id]
}
