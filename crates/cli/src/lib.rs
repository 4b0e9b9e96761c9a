pub mod commands;

use clap::{Parser, Subcommand};
use salesdesk_core::ServiceKind;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "salesdesk",
    about = "Salesdesk operator CLI",
    long_about = "Inspect configuration, check readiness, list tools and run single tool calls \
                  against the configured CRM.",
    after_help = "Examples:\n  salesdesk doctor --json\n  salesdesk tools --service quote\n  \
                  salesdesk call getOpportunityInsights 7d3c2b1a-0f9e-4d8c-b7a6-5e4f3d2c1b0a"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, CRM settings and the tool registry")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the MCP tools, optionally for one service")]
    Tools {
        #[arg(long, help = "Only list tools of this service (lead|opportunity|quote)")]
        service: Option<ServiceKind>,
    },
    #[command(about = "Run one tool and print its JSON response")]
    Call {
        #[arg(help = "Tool name, e.g. getOpportunityInsights")]
        tool: String,
        #[arg(help = "The tool's single argument (company name or id)")]
        argument: String,
        #[arg(
            long,
            env = "SALESDESK_BEARER_TOKEN",
            hide_env_values = true,
            help = "Bearer token forwarded to the CRM"
        )]
        token: Option<String>,
    },
    #[command(about = "Run every tool against the demo CRM data with per-check timing details")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Tools { service } => commands::tools::run(service),
        Command::Call { tool, argument, token } => commands::call::run(&tool, &argument, token),
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
