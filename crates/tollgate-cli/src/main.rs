//! Tollgate CLI - inspect approval policies and resolve tool calls by hand.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use tollgate_config::{ApprovalSelection, DocumentFormat};
use tollgate_telemetry::{LogConfig, LogFormat};

mod commands;
mod operator;
mod theme;

use commands::{check, resolve};
use theme::Theme;

/// Tollgate - tool-call approval policies
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `info` or `warn,tollgate_approval=debug`
    #[arg(long, global = true, default_value = "warn", env = "TOLLGATE_LOG")]
    log_level: String,

    /// Log format: pretty, compact, json or full
    #[arg(long, global = true, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, validate and build a policy document
    Check {
        /// Path to the policy document (.yaml, .yml, .toml or .json)
        policy: PathBuf,

        /// Print the built chain as a document in this format
        #[arg(long)]
        render: Option<RenderFormat>,
    },

    /// Resolve one tool call against a policy
    Resolve {
        /// `human` or a path to a policy document
        #[arg(long, env = "TOLLGATE_APPROVAL", default_value = "human")]
        approval: ApprovalSelection,

        /// Tool function name
        function: String,

        /// Tool argument as name=value (repeatable, in order)
        #[arg(long = "arg", value_parser = resolve::parse_arg)]
        args: Vec<(String, Value)>,

        /// Assistant message that issued the call
        #[arg(long, default_value = "")]
        message: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RenderFormat {
    Yaml,
    Toml,
    Json,
}

impl From<RenderFormat> for DocumentFormat {
    fn from(format: RenderFormat) -> Self {
        match format {
            RenderFormat::Yaml => Self::Yaml,
            RenderFormat::Toml => Self::Toml,
            RenderFormat::Json => Self::Json,
        }
    }
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Check { policy, render } => {
            print!("{}", check::run(&policy, render.map(Into::into))?);
        },
        Commands::Resolve {
            approval,
            function,
            args,
            message,
        } => {
            let call = resolve::tool_call(&function, args);
            let decision = resolve::run(&approval, &call, &message).await?;
            println!("{}", resolve::describe(&call.signature(), &decision));
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::new(&cli.log_level).with_format(cli.log_format);
    if let Err(e) = tollgate_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = dispatch(cli.command).await {
        eprintln!("{}", Theme::error(&format!("{e:#}")));
        std::process::exit(1);
    }
}
