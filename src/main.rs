//! Infra Draft CLI
//!
//! Entry point for the `infra-draft` command-line tool.

use clap::{Parser, Subcommand};
use infra_draft::manifest::{build_all, Manifest, Plan};
use infra_draft::ResourceKind;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "infra-draft")]
#[command(about = "Layered infrastructure resource configuration", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every resource in a manifest and print the plan
    Plan {
        /// Path to the manifest file
        #[arg(long, short = 'm')]
        manifest: PathBuf,

        /// Write the plan to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Materialize each resource's handle with its logical id
        #[arg(long)]
        logical_ids: bool,
    },

    /// Validate a manifest without writing a plan
    Check {
        /// Path to the manifest file
        #[arg(long, short = 'm')]
        manifest: PathBuf,
    },

    /// List resource kinds and their fields
    Kinds {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Plan {
            manifest,
            output,
            logical_ids,
        } => {
            run_plan(&manifest, output.as_deref(), logical_ids);
        }
        Commands::Check { manifest } => {
            run_check(&manifest);
        }
        Commands::Kinds { json } => {
            run_kinds(json);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run_plan(manifest_path: &Path, output: Option<&Path>, logical_ids: bool) {
    let plan = match Plan::build(manifest_path, logical_ids) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = plan.write_to_file(path) {
                eprintln!("Error writing plan to {}: {}", path.display(), e);
                process::exit(1);
            }
            println!(
                "Wrote plan {} ({} resources) to {}",
                plan.plan_id,
                plan.resources.len(),
                path.display()
            );
        }
        None => match plan.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing plan: {}", e);
                process::exit(1);
            }
        },
    }
}

fn run_check(manifest_path: &Path) {
    let manifest = match Manifest::from_file(manifest_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error loading manifest: {}", e);
            process::exit(1);
        }
    };

    let registry = match build_all(&manifest) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Manifest error: {}", e);
            process::exit(1);
        }
    };

    println!("Manifest valid: {}", manifest_path.display());
    println!();
    println!("  Resources: {}", registry.len());
    for resource in registry.iter() {
        let deps = resource.depends_on();
        if deps.is_empty() {
            println!("    {} {} ({})", resource.kind(), resource.name(), resource.logical_id());
        } else {
            println!(
                "    {} {} ({}) -> {}",
                resource.kind(),
                resource.name(),
                resource.logical_id(),
                deps.join(", ")
            );
        }
    }
}

fn run_kinds(json: bool) {
    if json {
        let kinds: Vec<_> = ResourceKind::ALL
            .iter()
            .map(|kind| {
                let fields: Vec<_> = kind
                    .fields()
                    .iter()
                    .map(|f| {
                        json!({
                            "name": f.name,
                            "class": f.class.label(),
                            "default": f.class.default_value(),
                            "summary": f.summary,
                        })
                    })
                    .collect();
                json!({ "kind": kind.as_str(), "fields": fields })
            })
            .collect();

        match serde_json::to_string_pretty(&kinds) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error serializing kinds: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    for kind in ResourceKind::ALL {
        println!("{}", kind);
        println!("  name  required  Identity");
        for field in kind.fields() {
            match field.class.default_value() {
                Some(default) => println!(
                    "  {}  {} (default {})  {}",
                    field.name,
                    field.class.label(),
                    default,
                    field.summary
                ),
                None => println!("  {}  {}  {}", field.name, field.class.label(), field.summary),
            }
        }
    }
}
