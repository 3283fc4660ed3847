use std::{collections::BTreeSet, ffi::OsStr, path::PathBuf};

use clap::builder::StyledStr;
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::config::Kubeconfig;

pub use clap_complete::env::CompleteEnv;

use crate::{
    determine_cluster_server,
    discover::{discovery_cache_path, load_cached_groups},
    filter::{FilterCriteria, filter_resources},
};

/// Create an `ArgValueCompleter` that lists contexts from the active kubeconfig.
pub fn context_value_completer() -> ArgValueCompleter {
    ArgValueCompleter::new(|input: &OsStr| -> Vec<CompletionCandidate> {
        Kubeconfig::read()
            .map(|kubeconfig| context_candidates(&kubeconfig, input.to_string_lossy().trim()))
            .unwrap_or_default()
    })
}

/// Contexts starting with `prefix`, current context first.
///
/// The help text names the API server each context points at, which is also the
/// server its discovery cache is keyed by.
fn context_candidates(kubeconfig: &Kubeconfig, prefix: &str) -> Vec<CompletionCandidate> {
    let current = kubeconfig.current_context.as_deref();
    let mut contexts = kubeconfig
        .contexts
        .iter()
        .filter(|named| named.name.starts_with(prefix))
        .collect::<Vec<_>>();
    contexts.sort_by_key(|named| Some(named.name.as_str()) != current);

    contexts
        .into_iter()
        .map(|named| {
            let is_current = Some(named.name.as_str()) == current;
            let server = determine_cluster_server(&Some(named.name.clone()), kubeconfig)
                .unwrap_or_else(|_| String::from("<unknown>"));
            let help = if is_current {
                format!("[current] {server}")
            } else {
                server
            };
            CompletionCandidate::new(named.name.clone())
                .help(Some(StyledStr::from(help)))
                .display_order(is_current.then_some(0))
        })
        .collect()
}

/// Create an `ArgValueCompleter` that lists API groups seen by the last discovery.
///
/// Cache is the only source; no live API discovery is performed here.
/// The core group is offered as an empty value.
pub fn api_group_value_completer(cache_dir: Option<PathBuf>) -> ArgValueCompleter {
    ArgValueCompleter::new(move |input: &OsStr| -> Vec<CompletionCandidate> {
        let prefix = input.to_string_lossy().trim().to_string();
        cached_groups(cache_dir.as_ref())
            .into_iter()
            .flat_map(|groups| filter_resources(&groups, &FilterCriteria::default()))
            .map(|resource| resource.group)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|group| group.starts_with(&prefix))
            .map(CompletionCandidate::new)
            .collect()
    })
}

/// Create an `ArgValueCompleter` that lists API categories seen by the last discovery.
///
/// Cache is the only source; no live API discovery is performed here.
pub fn category_value_completer(cache_dir: Option<PathBuf>) -> ArgValueCompleter {
    ArgValueCompleter::new(move |input: &OsStr| -> Vec<CompletionCandidate> {
        let prefix = input.to_string_lossy().trim().to_string();
        cached_groups(cache_dir.as_ref())
            .into_iter()
            .flat_map(|groups| filter_resources(&groups, &FilterCriteria::default()))
            .flat_map(|resource| resource.categories)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|category| category.starts_with(&prefix))
            .map(CompletionCandidate::new)
            .collect()
    })
}

/// Discovery cache of the current kubeconfig context, regardless of its age.
///
/// Limitation: flags such as --context are not visible to completers.
/// See https://github.com/clap-rs/clap/issues/1910 for more details.
fn cached_groups(cache_dir: Option<&PathBuf>) -> Option<Vec<APIResourceList>> {
    let cache_dir = cache_dir?;
    let kubeconfig = Kubeconfig::read().ok()?;
    let server = determine_cluster_server(&None, &kubeconfig).ok()?;
    load_cached_groups(&discovery_cache_path(cache_dir, &server), None).ok()
}
