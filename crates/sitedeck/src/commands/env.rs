//! Environment variable command handlers.

use tabled::Tabled;

use sitedeck_core::Console;

use crate::cli::{EnvArgs, EnvCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EnvRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(console: &Console, args: EnvArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        EnvCommand::Get { site_id } => {
            let vars = console
                .get_env_vars(&site_id)
                .await
                .map_err(|e| util::or_not_found(e, "site", &site_id, "sites list"))?;
            let out = match global.output {
                OutputFormat::Table => {
                    let rows: Vec<EnvRow> = vars
                        .into_iter()
                        .map(|(key, value)| EnvRow { key, value })
                        .collect();
                    output::render_table(&rows)
                }
                OutputFormat::Plain => vars
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
                // Structured formats get the plain key/value map.
                _ => output::render_single(&global.output, &vars, |_| String::new(), |_| String::new())?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EnvCommand::Set {
            site_id,
            env,
            replace,
            redeploy,
        } => {
            let vars = util::env_map(env);
            let saved = if replace {
                console.set_env_vars(&site_id, &vars).await
            } else {
                console.merge_env_vars(&site_id, &vars).await
            };
            saved.map_err(|e| util::or_not_found(e, "site", &site_id, "sites list"))?;
            output::note(
                &format!("Environment variables saved for site '{site_id}'"),
                global.quiet,
            );
            if redeploy {
                let deploy = console.redeploy(&site_id).await?;
                output::note(&format!("Build {} triggered", deploy.id), global.quiet);
            }
            Ok(())
        }
    }
}
