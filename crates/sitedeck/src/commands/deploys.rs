//! Deploy command handlers.

use chrono::Utc;
use tabled::Tabled;

use sitedeck_core::{Console, CoreError, Deploy, DeployQuery, can_cancel};

use crate::cli::{DeploysArgs, DeploysCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeployRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Context")]
    context: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn deploy_row(deploy: &Deploy, color: bool) -> DeployRow {
    let message = deploy
        .error_message
        .as_deref()
        .or(deploy.title.as_deref())
        .or(deploy.commit_message.as_deref())
        .unwrap_or_default();
    DeployRow {
        id: deploy.id.clone(),
        status: output::state_cell(&deploy.state, color),
        branch: deploy.branch.clone().unwrap_or_default(),
        context: deploy.context.clone().unwrap_or_default(),
        created: output::relative_time(deploy.created_at, Utc::now()),
        message: truncate(message, 60),
    }
}

fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max {
        return line.to_owned();
    }
    let mut cut: String = line.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub async fn handle(
    console: &Console,
    args: DeploysArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        DeploysCommand::List {
            site_id,
            page,
            per_page,
            production,
            state,
            branch,
        } => {
            let query = DeployQuery {
                page,
                per_page,
                production: production.then_some(true),
                state,
                branch,
            };
            let deploys = console
                .get_site_deploys(&site_id, &query)
                .await
                .map_err(|e| util::or_not_found(e, "site", &site_id, "sites list"))?;
            let out = output::render_list(
                &global.output,
                &deploys,
                |d| deploy_row(d, color),
                |d| d.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DeploysCommand::Cancel {
            site_id,
            deploy_id,
            force,
        } => {
            if !force {
                let deploy = console
                    .get_deploy(&deploy_id)
                    .await
                    .map_err(|e| util::or_not_found(e, "deploy", &deploy_id, "deploys list"))?;
                if !can_cancel(&deploy.state) {
                    return Err(CliError::from(CoreError::DeployNotCancelable {
                        deploy_id: deploy_id.clone(),
                    })
                    .with_site(&site_id));
                }
            }
            console
                .cancel_deploy(&site_id, &deploy_id)
                .await
                .map_err(|e| CliError::from(e).with_site(&site_id))?;
            output::note(&format!("Deploy {deploy_id} canceled"), global.quiet);
            Ok(())
        }
    }
}
