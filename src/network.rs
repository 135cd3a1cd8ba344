//! Attaching started containers to existing runtime networks.

use std::collections::HashMap;

use crate::container::RunningContainer;
use crate::error::Error;
use crate::runtime::ContainerRuntime;

/// Connects `container` to every runtime network named in its spec.
///
/// Requested names are reconciled against the runtime's live network list:
/// the first failed connect aborts the call, and any requested name that
/// matched no runtime network fails the call after the others were attached.
/// A nonexistent name is a caller error, not a reason to create the network
/// implicitly.
pub(crate) async fn attach_networks(
    runtime: &dyn ContainerRuntime,
    container: &RunningContainer,
) -> Result<(), Error> {
    let networks = runtime.list_networks().await.map_err(|err| {
        log::error!("Unable to list networks: {err}");
        Error::ListNetworks(err)
    })?;

    // track which requested names actually get attached
    let mut requested: HashMap<String, bool> = container
        .spec
        .networks
        .iter()
        .map(|name| (name.clone(), false))
        .collect();

    for network in &networks {
        let Some(name) = network.name.as_deref() else {
            continue;
        };
        let Some(attached) = requested.get_mut(name) else {
            continue;
        };
        let id = network.id.as_deref().unwrap_or(name);

        log::info!("Attaching network {name} to container {}", container.name());
        runtime
            .connect_network(id, &container.id)
            .await
            .map_err(|err| {
                log::error!(
                    "Unable to attach network {name} to container {}: {err}",
                    container.name()
                );
                Error::NetworkAttach {
                    network: name.to_string(),
                    container: container.name().to_string(),
                    source: err,
                }
            })?;
        *attached = true;
    }

    let mut not_found: Vec<String> = requested
        .into_iter()
        .filter(|(_, attached)| !attached)
        .map(|(name, _)| name)
        .collect();
    if !not_found.is_empty() {
        not_found.sort();
        log::error!(
            "Unable to find networks {not_found:?} to attach to container {}",
            container.name()
        );
        return Err(Error::NetworksNotFound {
            networks: not_found,
            container: container.name().to_string(),
        });
    }

    Ok(())
}
