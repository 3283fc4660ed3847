use std::collections::BTreeSet;

use crate::{Error, Result, resource::ResourceDescriptor};

/// Printed in place of the category list when the server defines none.
pub const NO_CATEGORIES_FOUND: &str = "No API categories found";

/// Every category carried by `resources`, deduplicated and sorted.
pub fn list_categories(resources: &[ResourceDescriptor]) -> Vec<String> {
    resources
        .iter()
        .flat_map(|r| r.categories.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Qualified names of the resources belonging to `category`, deduplicated and sorted.
///
/// # Errors
/// Returns [`Error::CategoryNotFound`] when no resource belongs to `category`.
pub fn list_category_members(
    resources: &[ResourceDescriptor],
    category: &str,
) -> Result<Vec<String>> {
    let members = resources
        .iter()
        .filter(|r| r.has_category(category))
        .map(ResourceDescriptor::qualified_name)
        .collect::<BTreeSet<_>>();

    if members.is_empty() {
        return Err(Error::CategoryNotFound(category.to_string()));
    }
    Ok(members.into_iter().collect())
}

/// Qualified names of all `resources`, deduplicated and sorted.
pub fn list_resource_names(resources: &[ResourceDescriptor]) -> Vec<String> {
    resources
        .iter()
        .map(ResourceDescriptor::qualified_name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
