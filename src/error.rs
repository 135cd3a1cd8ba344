use bollard::errors::Error as DockerError;

/// Errors surfaced by container lifecycle operations.
///
/// Every variant carries the operation and the target name so the message is
/// actionable on its own; underlying Docker failures are kept as sources.
/// Nothing in this crate retries automatically.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Docker client could not be initialized.
    #[error("unable to create Docker client: {0}")]
    Connection(#[source] DockerError),

    /// Pulling an image failed partway through.
    #[error("unable to ensure image {image} exists: {source}")]
    Image {
        image: String,
        #[source]
        source: DockerError,
    },

    /// A create/start/stop/remove call failed for a specific container.
    #[error("unable to {op} container {name}: {source}")]
    Container {
        op: &'static str,
        name: String,
        #[source]
        source: DockerError,
    },

    /// The runtime's network list could not be fetched.
    #[error("unable to list networks: {0}")]
    ListNetworks(#[source] DockerError),

    /// Creating or removing a named network failed.
    #[error("unable to {op} network {name}: {source}")]
    Network {
        op: &'static str,
        name: String,
        #[source]
        source: DockerError,
    },

    /// Connecting a container to an existing network failed.
    #[error("unable to attach network {network} to container {container}: {source}")]
    NetworkAttach {
        network: String,
        container: String,
        #[source]
        source: DockerError,
    },

    /// Some requested network names matched no runtime network.
    #[error("unable to find networks {networks:?} to attach to container {container}")]
    NetworksNotFound {
        networks: Vec<String>,
        container: String,
    },

    /// A container with this name is already tracked as running.
    #[error("container {0} is already running")]
    DuplicateName(String),

    /// No running container is tracked under this name.
    #[error("container {0} is not running")]
    NotRunning(String),

    /// Failures collected by a bulk operation; every target was attempted.
    #[error("errors encountered when {context}: {}", join_messages(.errors))]
    Aggregate {
        context: &'static str,
        errors: Vec<Error>,
    },

    /// A container manifest could not be parsed.
    #[error("unable to parse container manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
