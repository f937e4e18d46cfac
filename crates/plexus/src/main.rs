use clap::{Parser, Subcommand};
use plexus_core::{Node, Pod, ResourceVector};
use plexus_scheduler::{
    DiscoveryConfig, LifecycleBroadcaster, NodeAssessment, PluginCatalog, ScoreAggregator,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "plexus", about = "Extended-resource fit and scoring for Kubernetes nodes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a pod's requests fit a node's allocatable resources
    Fit {
        /// Path to the node manifest (YAML or JSON)
        #[arg(long)]
        node: PathBuf,
        /// Path to the pod manifest (YAML or JSON)
        #[arg(long)]
        pod: PathBuf,
    },
    /// Score a node for a pod's extended resources with the discovered plugins
    Assess {
        /// Path to the node manifest (YAML or JSON)
        #[arg(long)]
        node: PathBuf,
        /// Path to the pod manifest (YAML or JSON)
        #[arg(long)]
        pod: PathBuf,
        /// Path to the plugin discovery manifest
        #[arg(long, env = "PLEXUS_PLUGINS", default_value = "./plugins.yaml")]
        plugins: PathBuf,
    },
}

/// Result of `plexus fit`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FitReport {
    node: String,
    fits: bool,
    allocatable: ResourceVector,
    request: ResourceVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<ResourceVector>,
}

fn main() -> miette::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Fit { node, pod } => {
            let report = fit(&load(&node)?, &load(&pod)?)?;
            plexus_core::to_json_pretty(&report)?
        }
        Commands::Assess { node, pod, plugins } => {
            let config = DiscoveryConfig::from_file(&plugins)?;
            let assessment = assess(&load(&node)?, &load(&pod)?, &config)?;
            plexus_core::to_json_pretty(&assessment)?
        }
    };

    println!("{}", output);

    Ok(())
}

/// Compare a pod's total requests against a node's allocatable resources
fn fit(node: &Node, pod: &Pod) -> miette::Result<FitReport> {
    let node_name = node_name(node)?;
    let allocatable = ResourceVector::from_node_allocatable(node)?;
    let request = ResourceVector::from_pod_requests(pod)?;

    let fits = request.less_equal(&allocatable);
    let remaining = if fits {
        let mut remaining = allocatable.clone();
        remaining.subtract(&request)?;
        Some(remaining)
    } else {
        None
    };

    info!("Pod fits node {}: {}", node_name, fits);

    Ok(FitReport {
        node: node_name.to_string(),
        fits,
        allocatable,
        request,
        remaining,
    })
}

/// Discover plugins, announce the node to them, and score the pod's extended demand
fn assess(node: &Node, pod: &Pod, config: &DiscoveryConfig) -> miette::Result<NodeAssessment> {
    let node_name = node_name(node)?;

    let registry = Arc::new(PluginCatalog::builtin().discover(config));
    let broadcaster = LifecycleBroadcaster::new(registry.clone());

    let report = broadcaster.node_added(node);
    if !report.is_clean() {
        warn!(
            "Plugins {:?} failed to handle node {}",
            report.faulted, node_name
        );
    }

    let request = ResourceVector::from_pod_requests(pod)?;
    let assessment = ScoreAggregator::new(registry).assess_vector(node_name, &request);

    info!(
        "Node {} extended-resource score: {}",
        node_name, assessment.score
    );

    Ok(assessment)
}

fn node_name(node: &Node) -> miette::Result<&str> {
    node.metadata
        .name
        .as_deref()
        .ok_or_else(|| miette::miette!("Node manifest has no metadata.name"))
}

/// Load a k8s object from a YAML or JSON file
fn load<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> miette::Result<T> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read '{}': {}", path.display(), e))?;
    Ok(plexus_core::from_yaml(&data)?)
}
