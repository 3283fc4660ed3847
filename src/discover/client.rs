use std::collections::HashMap;

use k8s_openapi::apimachinery::pkg::{
    apis::meta::v1::{APIGroup, APIResource, APIResourceList, GroupVersionForDiscovery},
    version::Info,
};
use kube::Client;
use tracing::debug;

use super::DiscoveryGateway;
use crate::Result;

/// Discovery against a live API server.
///
/// Group-versions are fetched one at a time; any failed request aborts the listing.
#[derive(Clone)]
pub struct DiscoverClient {
    client: Client,
}

impl DiscoverClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The legacy core group followed by every named group the server serves.
    async fn server_groups(&self) -> Result<Vec<APIGroup>> {
        let core = self.client.list_core_api_versions().await?;
        let mut groups = Vec::new();
        if !core.versions.is_empty() {
            let versions = core
                .versions
                .iter()
                .map(|version| GroupVersionForDiscovery {
                    group_version: version.clone(),
                    version: version.clone(),
                })
                .collect::<Vec<_>>();
            groups.push(APIGroup {
                name: String::new(),
                preferred_version: versions.first().cloned(),
                versions,
                ..Default::default()
            });
        }
        groups.extend(self.client.list_api_groups().await?.groups);
        Ok(groups)
    }

    async fn group_version_resources(
        &self,
        group: &APIGroup,
        version: &GroupVersionForDiscovery,
    ) -> Result<APIResourceList> {
        let list = if group.name.is_empty() {
            self.client.list_core_api_resources(&version.version).await?
        } else {
            self.client
                .list_api_group_resources(&version.group_version)
                .await?
        };
        Ok(list)
    }
}

impl DiscoveryGateway for DiscoverClient {
    async fn server_version(&self) -> Result<Info> {
        let info = self.client.apiserver_version().await?;
        debug!("Server version: {}", info.git_version);
        Ok(info)
    }

    async fn server_preferred_resources(&self) -> Result<Vec<APIResourceList>> {
        let groups = self.server_groups().await?;
        let mut served = HashMap::new();
        for group in &groups {
            for version in &group.versions {
                let list = self.group_version_resources(group, version).await?;
                served.insert(version.group_version.clone(), list);
            }
        }
        debug!("Discovered {} group versions", served.len());
        Ok(select_preferred(&groups, &served))
    }
}

/// Picks one version per group-resource.
///
/// The server's preferred version wins; otherwise the first version (in the order the
/// group lists them) that serves the resource. Subresources such as `pods/log` are
/// dropped. One list is returned per group-version that contributed a resource.
pub fn select_preferred(
    groups: &[APIGroup],
    served: &HashMap<String, APIResourceList>,
) -> Vec<APIResourceList> {
    let mut lists = Vec::new();
    for group in groups {
        let preferred = group.preferred_version.as_ref().map(|v| v.version.as_str());
        // (version index, resource) in first-seen order, plus a by-name index into it.
        let mut chosen: Vec<(usize, &APIResource)> = Vec::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();

        for (idx, version) in group.versions.iter().enumerate() {
            let Some(list) = served.get(&version.group_version) else {
                continue;
            };
            for resource in &list.resources {
                if resource.name.contains('/') {
                    continue;
                }
                match by_name.get(resource.name.as_str()) {
                    Some(&at) if preferred == Some(version.version.as_str()) => {
                        chosen[at] = (idx, resource);
                    }
                    Some(_) => {}
                    None => {
                        by_name.insert(&resource.name, chosen.len());
                        chosen.push((idx, resource));
                    }
                }
            }
        }

        for (idx, version) in group.versions.iter().enumerate() {
            let resources = chosen
                .iter()
                .filter(|(at, _)| *at == idx)
                .map(|(_, resource)| (*resource).clone())
                .collect::<Vec<_>>();
            if !resources.is_empty() {
                lists.push(APIResourceList {
                    group_version: version.group_version.clone(),
                    resources,
                });
            }
        }
    }
    lists
}
