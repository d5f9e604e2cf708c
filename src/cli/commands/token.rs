use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, Environment};
use crate::types::Role;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "Role to embed in the token")]
    pub role: Role,

    #[arg(long, default_value = "dev", help = "Display name")]
    pub name: String,

    #[arg(long, help = "Email address")]
    pub email: Option<String>,

    #[arg(long, help = "Subject id (random when omitted)")]
    pub sub: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to the configured expiry)")]
    pub hours: Option<u64>,
}

/// Sign a token for the requested identity; development and staging only
pub fn issue(args: TokenArgs, config: &AppConfig) -> anyhow::Result<(String, Claims)> {
    if config.environment == Environment::Production {
        anyhow::bail!("refusing to mint tokens in production");
    }

    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let sub = args.sub.unwrap_or_else(|| Uuid::new_v4().to_string());
    let claims = Claims::new(sub, args.name, args.email, args.role, hours)?;
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;
    Ok((token, claims))
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let (token, claims) = issue(args, config)?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "token issued",
            Some(json!({ "token": token, "claims": claims })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
