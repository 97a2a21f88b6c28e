//! Active-build command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::Utc;
use tabled::Tabled;

use sitedeck_core::{BoardSnapshot, Build, BuildPoller, Console};

use crate::cli::{BuildsArgs, BuildsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct BuildRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Deploy")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Cancel")]
    cancel: String,
}

fn build_row(build: &Build, color: bool) -> BuildRow {
    let deploy = &build.deploy;
    BuildRow {
        site: build.site_name.clone(),
        id: deploy.id.clone(),
        status: output::state_cell(&deploy.state, color),
        progress: output::progress_bar(build.progress),
        branch: deploy.branch.clone().unwrap_or_default(),
        started: output::relative_time(deploy.created_at, Utc::now()),
        cancel: if build.can_cancel() { "yes" } else { "" }.into(),
    }
}

fn render_builds(builds: &[Build], global: &GlobalOpts, color: bool) -> Result<String, CliError> {
    if builds.is_empty() && matches!(global.output, OutputFormat::Table) {
        return Ok("No builds in progress".into());
    }
    output::render_list(
        &global.output,
        builds,
        |b| build_row(b, color),
        |b| format!("{}\t{}", b.deploy.site_id, b.deploy.id),
    )
}

pub async fn handle(console: &Console, args: BuildsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        BuildsCommand::List => {
            let builds = console.list_active_builds().await?;
            let out = render_builds(&builds, global, color)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BuildsCommand::Watch { interval } => {
            watch(console, Duration::from_secs(interval), global, color).await
        }
    }
}

/// Poll in the background and redraw on every board update until Ctrl-C.
async fn watch(
    console: &Console,
    period: Duration,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let mut sub = console.subscribe_builds();
    let poller = BuildPoller::start_with_period(console.clone(), period);
    let redraw = matches!(global.output, OutputFormat::Table) && std::io::stdout().is_terminal();

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            snapshot = sub.changed() => {
                let Some(snapshot) = snapshot else { break Ok(()) };
                if let Err(e) = draw(&snapshot, global, color, redraw) {
                    break Err(e);
                }
            }
        }
    };

    poller.stop().await;
    result
}

fn draw(snapshot: &BoardSnapshot, global: &GlobalOpts, color: bool, redraw: bool) -> Result<(), CliError> {
    if let Some(ref error) = snapshot.error {
        output::note(&format!("refresh failed: {error}"), global.quiet);
        return Ok(());
    }
    let body = render_builds(&snapshot.builds, global, color)?;
    if redraw {
        // Clear the screen and home the cursor.
        print!("\x1b[2J\x1b[H");
        let stamp = snapshot
            .updated_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_default();
        output::print_output(&format!("Active builds (updated {stamp})\n{body}"), global.quiet);
    } else {
        output::print_output(&body, global.quiet);
    }
    Ok(())
}
