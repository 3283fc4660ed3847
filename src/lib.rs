#![cfg_attr(not(doctest), doc = include_str!("../README.md"))]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::io::Write;

pub use clap_complete;
pub use k8s_openapi;
pub use kube;

pub mod category;
pub mod claputil;
pub use claputil::{api_group_value_completer, category_value_completer, context_value_completer};
pub mod cli;
pub mod discover;
pub mod error;
pub use error::{Error, Result};
pub mod filter;
pub mod output;
pub mod resource;
pub mod sort;

use category::list_category_members;
use filter::{FilterCriteria, filter_resources};
use kube::config::Kubeconfig;
use output::{OutputMode, Projection};
use sort::SortKey;
use tracing::debug;

use crate::discover::DiscoveryGateway;

/// Validated settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub criteria: FilterCriteria,
    pub output: OutputMode,
    pub sort_key: SortKey,
    pub show_header: bool,
    /// When set and non-empty, only the members of this category are printed.
    pub category: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            output: OutputMode::default(),
            sort_key: SortKey::default(),
            show_header: true,
            category: None,
        }
    }
}

/// Probes the server, lists its resources and writes the requested projection to `out`.
///
/// # Errors
/// Fails when the server is unreachable, discovery fails, a requested category has
/// no members, or the output cannot be written.
pub async fn run<G, W>(gateway: &G, options: &Options, out: &mut W) -> Result<()>
where
    G: DiscoveryGateway,
    W: Write,
{
    gateway.server_version().await?;

    let lists = gateway.server_preferred_resources().await?;
    let resources = filter_resources(&lists, &options.criteria);
    debug!("{} resources match the filters", resources.len());

    let projection = match options.category.as_deref().filter(|c| !c.is_empty()) {
        Some(name) => Projection::ResourceNames(list_category_members(&resources, name)?),
        None => Projection::build(
            resources,
            options.output,
            options.sort_key,
            options.show_header,
        ),
    };
    projection.render(out)
}

/// Detects the Kubernetes context based on the provided `context` argument.
///
/// Context determination follows this priority:
/// 1. Uses the context if explicitly specified.
/// 2. Uses the current context of the kubeconfig.
///
/// # Errors
/// Returns an error if no context is given and no current context is set in the kubeconfig.
pub fn determine_context(
    context: &Option<String>,
    kubeconfig: &Kubeconfig,
) -> anyhow::Result<String> {
    match context {
        Some(context) => Ok(context.to_string()),
        _ => Ok(kubeconfig
            .current_context
            .clone()
            .ok_or_else(|| anyhow::anyhow!("current_context is not set"))?),
    }
}

/// Resolves the API server URL of the cluster behind `context` (or the current context).
pub fn determine_cluster_server(
    context: &Option<String>,
    kubeconfig: &Kubeconfig,
) -> anyhow::Result<String> {
    let context = determine_context(context, kubeconfig)?;
    let cluster = kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == context)
        .and_then(|c| c.context.as_ref())
        .map(|c| c.cluster.clone())
        .ok_or_else(|| anyhow::anyhow!("context {context:?} not found in kubeconfig"))?;

    kubeconfig
        .clusters
        .iter()
        .find(|c| c.name == cluster)
        .and_then(|c| c.cluster.as_ref())
        .and_then(|c| c.server.clone())
        .ok_or_else(|| anyhow::anyhow!("cluster {cluster:?} has no server in kubeconfig"))
}
