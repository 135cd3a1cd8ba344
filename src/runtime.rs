//! The slice of the Docker API the lifecycle controller depends on.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{CreateImageInfo, EndpointSettings, Network};
use bollard::network::{ConnectNetworkOptions, CreateNetworkOptions, ListNetworksOptions};
use bollard::Docker;
use futures_util::Stream;

/// Image-pull progress records as they stream from the daemon.
pub type PullStream = Pin<Box<dyn Stream<Item = Result<CreateImageInfo, DockerError>> + Send>>;

/// Raw log frames from a followed container.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogOutput, DockerError>> + Send>>;

/// Container-runtime operations the controller needs.
///
/// [`DockerRuntime`] is the production implementation; tests substitute a
/// scripted one.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Streams pull progress for `image` until the pull completes.
    fn pull_image(&self, image: &str) -> PullStream;

    /// Creates a container and returns its runtime-assigned id.
    async fn create_container(
        &self,
        name: &str,
        config: Config<String>,
    ) -> Result<String, DockerError>;

    /// Starts a created container.
    async fn start_container(&self, id: &str) -> Result<(), DockerError>;

    /// Streams combined stdout/stderr in follow mode until the container
    /// stops or the stream is closed.
    fn logs_stream(&self, id: &str) -> LogStream;

    /// Stops a running container, waiting up to `grace` before killing it.
    async fn stop_container(&self, id: &str, grace: Duration) -> Result<(), DockerError>;

    /// Removes a stopped container's storage.
    async fn remove_container(&self, id: &str) -> Result<(), DockerError>;

    /// Lists all networks known to the runtime.
    async fn list_networks(&self) -> Result<Vec<Network>, DockerError>;

    /// Creates a bridge network and returns its runtime id.
    async fn create_network(&self, name: &str) -> Result<String, DockerError>;

    /// Connects a container to a network, both by runtime id.
    async fn connect_network(&self, network_id: &str, container_id: &str)
        -> Result<(), DockerError>;

    /// Removes a network by runtime id.
    async fn remove_network(&self, id: &str) -> Result<(), DockerError>;
}

#[async_trait]
impl<T: ContainerRuntime + ?Sized> ContainerRuntime for Arc<T> {
    fn pull_image(&self, image: &str) -> PullStream {
        (**self).pull_image(image)
    }

    async fn create_container(
        &self,
        name: &str,
        config: Config<String>,
    ) -> Result<String, DockerError> {
        (**self).create_container(name, config).await
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        (**self).start_container(id).await
    }

    fn logs_stream(&self, id: &str) -> LogStream {
        (**self).logs_stream(id)
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<(), DockerError> {
        (**self).stop_container(id, grace).await
    }

    async fn remove_container(&self, id: &str) -> Result<(), DockerError> {
        (**self).remove_container(id).await
    }

    async fn list_networks(&self) -> Result<Vec<Network>, DockerError> {
        (**self).list_networks().await
    }

    async fn create_network(&self, name: &str) -> Result<String, DockerError> {
        (**self).create_network(name).await
    }

    async fn connect_network(
        &self,
        network_id: &str,
        container_id: &str,
    ) -> Result<(), DockerError> {
        (**self).connect_network(network_id, container_id).await
    }

    async fn remove_network(&self, id: &str) -> Result<(), DockerError> {
        (**self).remove_network(id).await
    }
}

/// [`ContainerRuntime`] backed by a local Docker daemon.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Wraps an already-connected client.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connects with the platform's default socket settings.
    pub fn from_defaults() -> Result<Self, DockerError> {
        Ok(Self::new(Docker::connect_with_socket_defaults()?))
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn pull_image(&self, image: &str) -> PullStream {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        Box::pin(self.docker.create_image(Some(options), None, None))
    }

    async fn create_container(
        &self,
        name: &str,
        config: Config<String>,
    ) -> Result<String, DockerError> {
        let options = CreateContainerOptions {
            name,
            ..Default::default()
        };
        let response = self.docker.create_container(Some(options), config).await?;
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
    }

    fn logs_stream(&self, id: &str) -> LogStream {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        Box::pin(self.docker.logs(id, Some(options)))
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<(), DockerError> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        self.docker.stop_container(id, Some(options)).await
    }

    async fn remove_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .remove_container(id, None::<RemoveContainerOptions>)
            .await
    }

    async fn list_networks(&self) -> Result<Vec<Network>, DockerError> {
        self.docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await
    }

    async fn create_network(&self, name: &str) -> Result<String, DockerError> {
        let options = CreateNetworkOptions {
            name: name.to_string(),
            driver: "bridge".to_string(),
            ..Default::default()
        };
        let response = self.docker.create_network(options).await?;
        Ok(response.id)
    }

    async fn connect_network(
        &self,
        network_id: &str,
        container_id: &str,
    ) -> Result<(), DockerError> {
        let options = ConnectNetworkOptions {
            container: container_id.to_string(),
            endpoint_config: EndpointSettings::default(),
        };
        self.docker.connect_network(network_id, options).await
    }

    async fn remove_network(&self, id: &str) -> Result<(), DockerError> {
        self.docker.remove_network(id).await
    }
}
