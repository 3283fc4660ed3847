use std::collections::BTreeSet;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::core::{GroupVersion, gvk::ParseGroupVersionError};
use tracing::debug;

use crate::resource::ResourceDescriptor;

/// User-supplied predicates for one invocation.
///
/// `group` and `namespaced` are `None` when the flag was not given at all.
/// `Some("")` and `Some(false)` are real filters: core group only, cluster-scoped only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub group: Option<String>,
    pub namespaced: Option<bool>,
    /// A resource must carry every one of these.
    pub categories: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = Some(namespaced);
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    /// Whether `resource` satisfies every active predicate.
    pub fn matches(&self, resource: &ResourceDescriptor) -> bool {
        if resource.verbs.is_empty() {
            return false;
        }
        if self.group.as_ref().is_some_and(|g| *g != resource.group) {
            return false;
        }
        if self.namespaced.is_some_and(|ns| ns != resource.namespaced) {
            return false;
        }
        self.categories.iter().all(|c| resource.has_category(c))
    }
}

/// Parses a discovery `groupVersion` string.
///
/// `v1` is the core group, `apps/v1` a named group; anything with more than one `/`
/// is rejected. An empty string (or a lone `/`) yields an empty group-version.
pub fn parse_group_version(gv: &str) -> Result<GroupVersion, ParseGroupVersionError> {
    if gv.is_empty() || gv == "/" {
        return Ok(GroupVersion::gv("", ""));
    }
    match gv.split('/').collect::<Vec<_>>().as_slice() {
        [version] => Ok(GroupVersion::gv("", version)),
        [group, version] => Ok(GroupVersion::gv(group, version)),
        _ => Err(ParseGroupVersionError(gv.into())),
    }
}

/// Flattens discovery responses into the resources that satisfy `criteria`.
///
/// Blocks whose group-version cannot be parsed are skipped with a diagnostic.
/// The output keeps discovery order; sorting is left to [`crate::sort`].
pub fn filter_resources(
    lists: &[APIResourceList],
    criteria: &FilterCriteria,
) -> Vec<ResourceDescriptor> {
    let mut resources = Vec::new();
    for list in lists {
        if list.resources.is_empty() {
            continue;
        }
        let gv = match parse_group_version(&list.group_version) {
            Ok(gv) => gv,
            Err(err) => {
                debug!(
                    "Ignoring invalid discovered resource {:?}: {err}",
                    list.group_version
                );
                continue;
            }
        };
        resources.extend(
            list.resources
                .iter()
                .map(|resource| ResourceDescriptor::from_api_resource(resource, &gv))
                .filter(|descriptor| criteria.matches(descriptor)),
        );
    }
    resources
}
