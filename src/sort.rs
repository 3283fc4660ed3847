use std::{cmp::Ordering, str::FromStr};

use crate::{Error, resource::ResourceDescriptor};

/// Column the table view is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// API group first, then resource name.
    #[default]
    Group,
    /// Resource name.
    Resource,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::Group),
            "resource" => Ok(Self::Resource),
            other => Err(Error::InvalidSortBy(other.to_string())),
        }
    }
}

impl SortKey {
    fn primary<'a>(&self, resource: &'a ResourceDescriptor) -> &'a str {
        match self {
            Self::Group => &resource.group,
            Self::Resource => &resource.name,
        }
    }

    /// Orders by the primary column, breaking ties by resource name.
    pub fn compare(&self, a: &ResourceDescriptor, b: &ResourceDescriptor) -> Ordering {
        self.primary(a)
            .cmp(self.primary(b))
            .then_with(|| a.name.cmp(&b.name))
    }
}

/// Stable sort of `resources` by `key`; fully equal entries keep their input order.
pub fn sort_resources(resources: &mut [ResourceDescriptor], key: SortKey) {
    resources.sort_by(|a, b| key.compare(a, b));
}
