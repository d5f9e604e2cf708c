pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "guardctl")]
#[command(about = "guardctl - inspect and exercise back-office page access rules")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List pages and the roles allowed on each")]
    Pages(commands::pages::PagesArgs),

    #[command(about = "Evaluate the access decision for a session and navigation")]
    Check(commands::check::CheckArgs),

    #[command(about = "Issue a development token for a role")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Pages(args) => commands::pages::handle(args, config, output_format),
        Commands::Check(args) => commands::check::handle(args, config, output_format),
        Commands::Token(args) => commands::token::handle(args, config, output_format),
    }
}
