use anyhow::bail;
use clap::Args;
use serde_json::json;
use std::sync::Arc;

use crate::access::{AccessDecision, AccessGuard, RequiredAccess};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::history::NavigationHistory;
use crate::session::{Session, SessionUser};
use crate::types::{PageId, Role};

#[derive(Args)]
pub struct CheckArgs {
    #[arg(long, help = "Page key to look up, e.g. administracion.choferes")]
    pub page: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Explicit allowed roles instead of a page key")]
    pub roles: Option<Vec<Role>>,

    #[arg(long, help = "Role of the signed-in user; omit to model a role still loading")]
    pub role: Option<Role>,

    #[arg(long, help = "Evaluate as a signed-out visitor")]
    pub anonymous: bool,

    #[arg(long, help = "Evaluate before the session finished hydrating")]
    pub not_hydrated: bool,

    #[arg(long, help = "Path being navigated to")]
    pub path: String,

    #[arg(long = "visited", help = "Previously visited paths, oldest first (repeatable)")]
    pub visited: Vec<String>,
}

/// Decision plus the navigation it implies
#[derive(Debug)]
pub struct CheckOutcome {
    pub decision: AccessDecision,
    pub navigate_to: Option<String>,
    pub history: Vec<String>,
}

/// What the checked page requires: an explicit key or role set, else the page at `--path`
pub fn required_access(args: &CheckArgs) -> anyhow::Result<RequiredAccess> {
    Ok(match (&args.page, &args.roles) {
        (Some(page), None) => RequiredAccess::Key(page.clone()),
        (None, Some(roles)) => RequiredAccess::roles(roles.iter().copied()),
        (None, None) => match PageId::from_path(&args.path) {
            Some(page) => RequiredAccess::Page(page),
            None => bail!("no page known at {}; pass --page or --roles", args.path),
        },
        (Some(_), Some(_)) => bail!("--page and --roles are mutually exclusive"),
    })
}

pub fn evaluate(args: &CheckArgs, config: &AppConfig) -> anyhow::Result<CheckOutcome> {
    let access = required_access(args)?;

    let session = Session {
        user: (!args.anonymous).then(|| SessionUser {
            id: "cli".to_string(),
            name: "guardctl".to_string(),
            email: None,
            role: args.role,
        }),
        is_authenticated: !args.anonymous,
        has_hydrated: !args.not_hydrated,
    };

    // The host records the target before the guard runs
    let mut history = NavigationHistory::with_capacity(config.guard.history_capacity);
    for path in &args.visited {
        history.record(path.as_str());
    }
    history.record(args.path.as_str());

    let guard = AccessGuard::new(Arc::new(config.permission_table()?), config.guard_routes());
    let decision = guard.decide(&access, &session, &args.path, history.previous());
    let navigate_to = decision.redirect_target(guard.routes()).map(str::to_string);

    Ok(CheckOutcome {
        decision,
        navigate_to,
        history: history.entries().map(str::to_string).collect(),
    })
}

pub fn handle(args: CheckArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let outcome = evaluate(&args, config)?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "decision evaluated",
            Some(json!({
                "decision": outcome.decision,
                "navigate_to": outcome.navigate_to,
                "history": outcome.history,
            })),
        ),
        OutputFormat::Text => {
            let summary = match &outcome.decision {
                AccessDecision::Allow => "allow".to_string(),
                AccessDecision::Pending => "pending (nothing rendered)".to_string(),
                AccessDecision::RedirectToLogin => format!("redirect to login ({})", config.guard.login_path),
                AccessDecision::RedirectToPrevious(path) => format!("redirect back to {}", path),
                AccessDecision::RedirectToDefault(path) => format!("redirect to default {}", path),
            };
            println!("{} -> {}", args.path, summary);
            Ok(())
        }
    }
}
