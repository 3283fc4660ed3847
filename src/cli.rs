use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use kube::{
    Config,
    config::{KubeConfigOptions, Kubeconfig},
};
use tracing::debug;

use crate::{
    Options, Result,
    claputil::{api_group_value_completer, category_value_completer, context_value_completer},
    discover::{default_cache_dir, discovery_cache_path},
    filter::FilterCriteria,
};

const CMD_NAME: &str = "kube-api-categories";
const PLUGIN_CMD_NAME: &str = "kubectl api-categories";

const EXAMPLES: &str = "\
Examples:
  # Print the supported API categories & resources
  %CMD%

  # Print the supported API categories & resources sorted by a column
  %CMD% --sort-by=resource

  # Print the supported namespaced categories & resources
  %CMD% --namespaced=true

  # Print the supported non-namespaced categories & resources
  %CMD% --namespaced=false

  # Print the supported API categories & resources with a specific APIGroup
  %CMD% --api-group=extensions

  # Print the supported API categories
  %CMD% --output=category

  # Print the supported API resources in a specific API category
  %CMD% --output=resource --categories=api-extensions";

/// Print the supported API resources and their categories on the server.
#[derive(Debug, Parser)]
#[command(name = "kube-api-categories", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Print only the resources that belong to this API category
    #[arg(value_name = "CATEGORY", add = category_value_completer(default_cache_dir()))]
    pub category: Option<String>,

    /// Limit to resources in the specified API group
    #[arg(long, value_name = "GROUP", add = api_group_value_completer(default_cache_dir()))]
    pub api_group: Option<String>,

    /// If true, only namespaced resources are returned; if false, only cluster-scoped ones
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub namespaced: Option<bool>,

    /// Limit to resources that belong to all of the specified categories
    #[arg(
        long,
        value_name = "CATEGORY",
        value_delimiter = ',',
        add = category_value_completer(default_cache_dir())
    )]
    pub categories: Vec<String>,

    /// Use the cached list of resources if available
    #[arg(long)]
    pub cached: bool,

    /// When using the default output format, don't print headers
    #[arg(long)]
    pub no_headers: bool,

    /// Output format. One of: category|resource
    #[arg(short, long, value_name = "FORMAT")]
    pub output: Option<String>,

    /// If non-empty, sort list of resources using specified field. One of: resource
    #[arg(long, value_name = "FIELD")]
    pub sort_by: Option<String>,

    /// Path to the kubeconfig file to use
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// The name of the kubeconfig context to use
    #[arg(long, add = context_value_completer())]
    pub context: Option<String>,

    /// The name of the kubeconfig cluster to use
    #[arg(long)]
    pub cluster: Option<String>,

    /// The name of the kubeconfig user to use
    #[arg(long)]
    pub user: Option<String>,

    /// Default cache directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Name the command presents itself under; `kubectl api-categories` when run as a plugin.
pub fn command_name() -> &'static str {
    let is_plugin = env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("kubectl-"))
        })
        .unwrap_or(false);
    if is_plugin { PLUGIN_CMD_NAME } else { CMD_NAME }
}

/// The clap command with usage examples rendered for `name`.
pub fn command_with_name(name: &'static str) -> clap::Command {
    Cli::command()
        .bin_name(name)
        .after_help(EXAMPLES.replace("%CMD%", name))
}

impl Cli {
    /// Parses the process arguments under the detected command name.
    pub fn parse_env() -> Self {
        let matches = command_with_name(command_name()).get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }

    /// Validates flag values and turns them into [`Options`].
    ///
    /// Nothing here touches the network, so bad values are reported before discovery.
    pub fn options(&self) -> Result<Options> {
        let output = self.output.as_deref().unwrap_or_default().parse()?;
        let sort_key = self.sort_by.as_deref().unwrap_or_default().parse()?;

        debug!("Flags.APIGroup: {:?}", self.api_group);
        debug!("Flags.Cached: {}", self.cached);
        debug!("Flags.Categories: {:?}", self.categories);
        debug!("Flags.Namespaced: {:?}", self.namespaced);
        debug!("Flags.NoHeaders: {}", self.no_headers);
        debug!("Flags.Output: {:?}", self.output);

        Ok(Options {
            criteria: FilterCriteria {
                group: self.api_group.clone(),
                namespaced: self.namespaced,
                categories: self.categories.iter().cloned().collect(),
            },
            output,
            sort_key,
            show_header: !self.no_headers,
            category: self.category.clone(),
        })
    }

    fn kubeconfig_options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
            ..Default::default()
        }
    }

    /// Builds the client configuration from `--kubeconfig`, `--context`, `--cluster` and `--user`,
    /// falling back to the in-cluster or default kubeconfig environment.
    pub async fn kube_config(&self) -> anyhow::Result<Config> {
        let options = self.kubeconfig_options();
        let config = match &self.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig at {path:?}"))?;
                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
            None if self.context.is_some() || self.cluster.is_some() || self.user.is_some() => {
                Config::from_kubeconfig(&options).await?
            }
            None => Config::infer().await?,
        };
        Ok(config)
    }

    /// Discovery cache file for the cluster `config` points at.
    pub fn cache_path(&self, config: &Config) -> Option<PathBuf> {
        let cache_dir = self.cache_dir.clone().or_else(default_cache_dir)?;
        Some(discovery_cache_path(
            &cache_dir,
            &config.cluster_url.to_string(),
        ))
    }
}
