//! BioFlow CLI Entry Point
//!
//! Runs a saved workflow against the execution backend.
//!
//! # Usage
//!
//! ```bash
//! # Execute a workflow against the local backend
//! bioflow screen.json
//!
//! # Preview the execution order without contacting the backend
//! bioflow screen.json --dry-run
//!
//! # Remote backend, credential from the environment, exports to disk
//! BIOFLOW_API_KEY=... bioflow screen.json \
//!     --backend https://bio.example.org/workflow --export-dir results/
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use log::{error, info};
use serde_json::Value;

use bioflow::execution::client::DEFAULT_BACKEND_URL;
use bioflow::execution::{BackendClient, Credential, DirectoryExporter, Engine};
use bioflow::monitoring::LogSink;
use bioflow::workflow::{load_workflow, Workflow};
use bioflow::{APP_NAME, VERSION};

/// Credential used when none is configured.
const DEFAULT_API_KEY: &str = "demo_key";

/// Command-line configuration.
#[derive(Parser, Debug)]
#[command(name = "bioflow", version, about = "Visual workflow execution engine")]
struct Cli {
    /// Path to workflow JSON file
    workflow: PathBuf,

    /// Base URL of the execution backend
    #[arg(long, env = "BIOFLOW_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend: String,

    /// Bearer credential sent with every node request
    #[arg(long, env = "BIOFLOW_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Per-request timeout in seconds (none unless given)
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory export nodes write their files to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print the execution order without running anything
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME.bold(), VERSION);
    println!("Visual Workflow Execution Engine");
    println!();
}

/// Prints the execution order and each node's declared inputs.
fn print_plan(workflow: &Workflow, plan: &[String]) {
    println!();
    for (i, node_id) in plan.iter().enumerate() {
        let Some(node) = workflow.get_node(node_id) else {
            continue;
        };
        println!("[DRY RUN] {}. {} ({})", i + 1, node.id.bold(), node.kind);
        println!("  Inputs: {}", Value::Object(node.parameters.clone()));
    }
    println!();
}

/// Main application entry point.
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    setup_logging(cli.verbose);
    print_banner();

    let workflow = load_workflow(&cli.workflow).map_err(|e| {
        error!("Failed to load workflow: {}", e);
        format!(
            "Could not load workflow from '{}': {}",
            cli.workflow.display(),
            e
        )
    })?;

    info!(
        "Workflow '{}' loaded: {} nodes, {} connections",
        workflow.name,
        workflow.nodes.len(),
        workflow.edges.len()
    );

    if cli.dry_run {
        info!("Mode: DRY RUN (backend will not be contacted)");
        let plan = Engine::plan(&workflow)?;
        print_plan(&workflow, &plan);
        return Ok(());
    }

    info!("Backend: {}", cli.backend);
    let mut client = BackendClient::new(cli.backend)?;
    if let Some(secs) = cli.timeout {
        info!("Request timeout: {}s", secs);
        client = client.with_timeout(Duration::from_secs(secs))?;
    }

    let mut engine = Engine::new(Arc::new(client), Arc::new(LogSink));
    if let Some(dir) = cli.export_dir {
        info!("Exports: {}", dir.display());
        engine.set_exporter(Arc::new(DirectoryExporter::new(dir)));
    }

    let result = engine.run(&workflow, &Credential::new(cli.api_key)).await;
    println!("{}", engine.timeline().gantt_chart());

    let summary = result?;
    println!(
        "{} ({} nodes in {:.2}s)",
        "Workflow completed successfully".green().bold(),
        summary.plan.len(),
        summary.duration.as_secs_f64()
    );

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
