//! `weave`: apiweave command-line interface.
//!
//! Reads a trace of captured HTTP exchanges and reports what the traffic
//! reveals about the API behind it:
//!
//! - **`analyze`** prints the full analysis (groups, graph, auth scheme).
//! - **`graph`** prints only the dependency graph.
//! - **`routes`** lists endpoint groups, or details one group.
//! - **`lint`** checks each exchange in a trace for capture problems.
//! - **`validate`** checks a dependency-graph document.
//!
//! Every subcommand reads JSON from a file path or from stdin (`-`). Exit
//! codes: 0 success, 1 lint or validation failure, 2 usage or input error.

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use apiweave::render::{render_graph, render_group, render_groups};
use apiweave::{
    parse_trace, validate_exchange, validate_graph, Analysis, AnalysisConfig, AnalysisSession,
    CapturedExchange, DependencyGraph,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// weave: reverse-engineer HTTP APIs from captured traffic
///
/// Groups captured calls into endpoints, infers body schemas, and infers
/// which calls feed values into which later calls.
#[derive(Parser)]
#[command(name = "weave", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    tuning: Tuning,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for the `WEAVE_*` environment variables.
#[derive(Args)]
struct Tuning {
    /// Share of a group's calls a query key must appear in to be required (0.0-1.0).
    #[arg(long, global = true, value_name = "RATIO")]
    required_query_ratio: Option<f64>,

    /// Array elements inferred per array during schema inference.
    #[arg(long, global = true, value_name = "N")]
    schema_array_sample: Option<usize>,

    /// JSON nesting walked when extracting dependency artifacts.
    #[arg(long, global = true, value_name = "N")]
    artifact_depth: Option<usize>,

    /// Keep static assets, third-party trackers, HTML page loads, and non-API calls.
    #[arg(long, global = true)]
    keep_noise: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse a trace and print the result.
    ///
    /// FILE holds a JSON array of exchanges, or an object with an
    /// `exchanges` array. Prints JSON unless --text is given.
    Analyze {
        /// Path to a trace file, or `-` for stdin.
        file: PathBuf,

        /// Print a plain-text summary instead of JSON.
        #[arg(long)]
        text: bool,
    },

    /// Print the dependency graph of a trace.
    Graph {
        /// Path to a trace file, or `-` for stdin.
        file: PathBuf,

        /// Print a plain-text view instead of JSON.
        #[arg(long)]
        text: bool,

        /// Only list the groups that must run before KEY, e.g. "GET /me".
        #[arg(long = "for", value_name = "KEY")]
        for_key: Option<String>,
    },

    /// List endpoint groups in execution order.
    ///
    /// With --group, print one group in detail along with JSON Schemas of
    /// its request and response bodies.
    Routes {
        /// Path to a trace file, or `-` for stdin.
        file: PathBuf,

        /// Group key to detail, e.g. "GET /users/{id}".
        #[arg(long, value_name = "KEY")]
        group: Option<String>,
    },

    /// Check every exchange in a trace for capture problems.
    ///
    /// Exits 0 if all exchanges are clean, 1 otherwise.
    Lint {
        /// Path to a trace file, or `-` for stdin.
        file: PathBuf,
    },

    /// Validate a dependency-graph document.
    ///
    /// Accepts a bare graph or a full `weave analyze` output. Exits 0 if the
    /// graph is consistent, 1 otherwise.
    Validate {
        /// Path to a JSON file, or `-` for stdin.
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apiweave=info,weave=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let analysis_config = cli.tuning.apply(config::from_env());

    match cli.command {
        Command::Analyze { file, text } => {
            let analysis = run(&file, analysis_config);
            if text {
                print_analysis_text(&analysis);
            } else {
                print_json(&analysis);
            }
        }

        Command::Graph {
            file,
            text,
            for_key,
        } => {
            let graph = run(&file, analysis_config).graph;
            match for_key {
                Some(key) => {
                    if graph.node(&key).is_none() {
                        fatal(&format!("no group {key:?} in this trace"));
                    }
                    for node in graph.upstream(&key) {
                        println!("{}", node.key);
                    }
                }
                None if text => print!("{}", render_graph(&graph)),
                None => print_json(&graph),
            }
        }

        Command::Routes { file, group } => {
            let analysis = run(&file, analysis_config);
            match group {
                Some(key) => {
                    let g = analysis
                        .group(&key)
                        .unwrap_or_else(|| fatal(&format!("no group {key:?} in this trace")));
                    print!("{}", render_group(g));
                    if let Some(schema) = &g.request_body_schema {
                        println!("\nRequest body schema:");
                        print_json(&schema.to_json_schema());
                    }
                    if let Some(schema) = &g.response_body_schema {
                        println!("\nResponse body schema:");
                        print_json(&schema.to_json_schema());
                    }
                }
                None => print!("{}", render_groups(&analysis.groups)),
            }
        }

        Command::Lint { file } => {
            let trace = read_trace(&file);
            let mut problems = 0usize;
            for (i, exchange) in trace.iter().enumerate() {
                if let Err(e) = validate_exchange(exchange) {
                    eprintln!("exchange {i} ({} {}): {e}", exchange.method, exchange.url);
                    problems += 1;
                }
            }
            if problems == 0 {
                println!("all {} exchanges valid", trace.len());
            } else {
                println!("{problems} of {} exchanges have problems", trace.len());
                process::exit(1);
            }
        }

        Command::Validate { file } => {
            let graph = parse_graph(&read_input(&file));
            match validate_graph(&graph) {
                Ok(()) => println!("valid"),
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

impl Tuning {
    /// Flags win over the environment.
    fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(ratio) = self.required_query_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                fatal(&format!(
                    "--required-query-ratio must be between 0.0 and 1.0, got {ratio}"
                ));
            }
            config.required_query_ratio = ratio;
        }
        if let Some(n) = self.schema_array_sample {
            config.schema_array_sample = n.max(1);
        }
        if let Some(n) = self.artifact_depth {
            config.artifact_max_depth = n;
        }
        if self.keep_noise {
            config.filter_noise = false;
        }
        config
    }
}

fn run(file: &PathBuf, config: AnalysisConfig) -> Analysis {
    let trace = read_trace(file);
    tracing::debug!(exchanges = trace.len(), "read trace");
    AnalysisSession::new(config).run(&trace)
}

fn print_analysis_text(analysis: &Analysis) {
    println!("Service: {}", analysis.service);
    if let Some(base) = &analysis.base_url {
        println!("Base URL: {base}");
    }
    println!("Auth: {}", analysis.auth_scheme);
    println!();
    print!("{}", render_groups(&analysis.groups));
    println!();
    print!("{}", render_graph(&analysis.graph));
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fatal(&format!("failed to serialise output: {e}")),
    }
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path)
            .unwrap_or_else(|e| fatal(&format!("failed to read {}: {}", path.display(), e)))
    }
}

fn read_trace(path: &PathBuf) -> Vec<CapturedExchange> {
    parse_trace(&read_input(path))
        .unwrap_or_else(|e| fatal(&format!("failed to parse trace: {}", e)))
}

/// Parse a graph document: a bare graph, or an analysis whose `graph` field
/// holds one.
fn parse_graph(json: &str) -> DependencyGraph {
    if let Ok(graph) = serde_json::from_str::<DependencyGraph>(json) {
        return graph;
    }
    match serde_json::from_str::<Analysis>(json) {
        Ok(analysis) => analysis.graph,
        Err(e) => fatal(&format!("failed to parse input as a dependency graph: {}", e)),
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("weave: {}", msg);
    process::exit(2);
}
