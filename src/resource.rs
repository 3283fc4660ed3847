use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use kube::core::GroupVersion;

/// One discoverable API resource kind, stamped with the group-version it was served under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceDescriptor {
    /// Plural resource name, e.g. `pods`.
    pub name: String,
    /// API group; empty for the core group.
    pub group: String,
    pub version: String,
    pub namespaced: bool,
    pub verbs: Vec<String>,
    pub categories: Vec<String>,
}

impl ResourceDescriptor {
    /// Builds a descriptor from a discovered resource.
    ///
    /// The group and version come from `gv` rather than from the resource itself,
    /// since discovery leaves the per-resource fields empty for the preferred version.
    pub fn from_api_resource(resource: &APIResource, gv: &GroupVersion) -> Self {
        Self {
            name: resource.name.clone(),
            group: gv.group.clone(),
            version: gv.version.clone(),
            namespaced: resource.namespaced,
            verbs: resource.verbs.clone(),
            categories: resource.categories.clone().unwrap_or_default(),
        }
    }

    /// `name` for the core group, `name.group` otherwise.
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.name, &self.group)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Joins a resource name with its API group, leaving core resources unqualified.
pub fn qualified_name(name: &str, group: &str) -> String {
    if group.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{group}")
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
    use kube::core::GroupVersion;

    use super::{ResourceDescriptor, qualified_name};

    #[test]
    fn core_resources_are_unqualified() {
        assert_eq!(qualified_name("pods", ""), "pods");
        assert_eq!(qualified_name("deployments", "apps"), "deployments.apps");
    }

    #[test]
    fn group_version_is_authoritative() {
        let resource = APIResource {
            name: "deployments".into(),
            group: Some("stale".into()),
            namespaced: true,
            verbs: vec!["get".into()],
            categories: Some(vec!["all".into()]),
            ..Default::default()
        };
        let descriptor =
            ResourceDescriptor::from_api_resource(&resource, &GroupVersion::gv("apps", "v1"));

        assert_eq!(descriptor.group, "apps");
        assert_eq!(descriptor.version, "v1");
        assert_eq!(descriptor.qualified_name(), "deployments.apps");
        assert!(descriptor.has_category("all"));
    }
}
