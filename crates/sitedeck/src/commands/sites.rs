//! Site command handlers.

use std::fmt::Write as _;

use chrono::Utc;
use tabled::Tabled;

use sitedeck_core::{Console, Site, SiteQuery, SiteView};

use crate::cli::{GlobalOpts, SiteListArgs, SitesArgs, SitesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Last deploy")]
    status: String,
    #[tabled(rename = "When")]
    when: String,
}

fn site_row(view: &SiteView, color: bool) -> SiteRow {
    let site = &view.site;
    SiteRow {
        id: site.id.clone(),
        name: site.name.clone(),
        url: site.ssl_url.clone().or_else(|| site.url.clone()).unwrap_or_default(),
        status: view
            .last_deploy
            .as_ref()
            .map_or_else(|| "-".into(), |d| output::state_cell(&d.state, color)),
        when: output::relative_time(view.last_deploy_time, Utc::now()),
    }
}

fn site_detail(site: &Site) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:       {}", site.id);
    let _ = writeln!(out, "Name:     {}", site.name);
    if let Some(url) = site.ssl_url.as_ref().or(site.url.as_ref()) {
        let _ = writeln!(out, "URL:      {url}");
    }
    if let Some(ref state) = site.state {
        let _ = writeln!(out, "State:    {state}");
    }
    if let Some(ref account) = site.account_name {
        let _ = writeln!(out, "Account:  {account}");
    }
    if let Some(created) = site.created_at {
        let _ = writeln!(out, "Created:  {}", created.format("%Y-%m-%d %H:%M UTC"));
    }
    let _ = write!(
        out,
        "Updated:  {}",
        output::relative_time(site.updated_at, Utc::now())
    );
    out
}

fn site_query(args: &SiteListArgs) -> SiteQuery {
    SiteQuery {
        page: args.page,
        per_page: args.per_page,
        sort_by: args.sort.into(),
        order_by: args.order.into(),
        name: args.search.clone().filter(|s| !s.trim().is_empty()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: SitesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        SitesCommand::List(list) => {
            let page = console.list_sites(&site_query(&list)).await?;
            let out = output::render_list(
                &global.output,
                &page.sites,
                |v| site_row(v, color),
                |v| v.id().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            if page.has_more {
                output::note(
                    &format!("More sites available: --page {}", list.page + 1),
                    global.quiet,
                );
            }
            Ok(())
        }

        SitesCommand::Get { site_id } => {
            let site = console
                .get_site(&site_id)
                .await
                .map_err(|e| util::or_not_found(e, "site", &site_id, "sites list"))?;
            let out = output::render_single(&global.output, &site, site_detail, |s| s.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Create { name, env } => {
            let site = console.create_site(&name, &util::env_map(env)).await?;
            output::note(&format!("Site '{}' created", site.name), global.quiet);
            let out = output::render_single(&global.output, &site, site_detail, |s| s.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Delete { site_id } => {
            if !util::confirm(
                &format!("Delete site '{site_id}'? This cannot be undone."),
                global.yes,
                "sites delete",
            )? {
                return Ok(());
            }
            console
                .delete_site(&site_id)
                .await
                .map_err(|e| util::or_not_found(e, "site", &site_id, "sites list"))?;
            output::note(&format!("Site '{site_id}' deleted"), global.quiet);
            Ok(())
        }

        SitesCommand::Redeploy { site_id } => {
            let deploy = console
                .redeploy(&site_id)
                .await
                .map_err(|e| util::or_not_found(e, "site", &site_id, "sites list"))?;
            output::note(
                &format!("Build {} triggered for site '{site_id}'", deploy.id),
                global.quiet,
            );
            let out = output::render_single(
                &global.output,
                &deploy,
                |d| format!("{}  {}", d.id, output::state_cell(&d.state, color)),
                |d| d.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
