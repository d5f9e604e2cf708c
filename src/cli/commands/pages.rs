use clap::Args;
use serde_json::json;

use crate::access::{AccessRule, PermissionTable};
use crate::cli::utils::{output_success, output_table};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::types::Role;

#[derive(Args)]
pub struct PagesArgs {
    #[arg(long, help = "Only list pages this role may open")]
    pub role: Option<Role>,
}

pub fn describe_rule(rule: &AccessRule) -> String {
    match rule {
        AccessRule::AnyAuthenticated => "any authenticated user".to_string(),
        AccessRule::Roles(roles) => roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", "),
        AccessRule::Nobody => "nobody".to_string(),
    }
}

/// Every page in the table, or only those `role` may open
pub fn visible_pages(table: &PermissionTable, role: Option<Role>) -> Vec<(String, AccessRule)> {
    table
        .iter()
        .filter(|(_, rule)| role.map_or(true, |role| rule.permits(role)))
        .map(|(key, rule)| (key, rule.clone()))
        .collect()
}

pub fn handle(args: PagesArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let table = config.permission_table()?;
    let entries = visible_pages(&table, args.role);

    match output_format {
        OutputFormat::Json => {
            let pages: Vec<_> = entries
                .iter()
                .map(|(key, rule)| json!({ "page": key, "access": rule }))
                .collect();
            output_success(
                output_format,
                &format!("{} pages", pages.len()),
                Some(json!({
                    "unconfigured_policy": table.unconfigured_policy(),
                    "pages": pages,
                })),
            )
        }
        OutputFormat::Text => {
            let rows: Vec<(String, String)> = entries
                .iter()
                .map(|(key, rule)| (key.clone(), describe_rule(rule)))
                .collect();
            output_table(&rows);
            println!();
            println!("Unconfigured pages: {:?}", table.unconfigured_policy());
            Ok(())
        }
    }
}
