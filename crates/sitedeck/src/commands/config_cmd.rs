//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::Password;
use secrecy::ExposeSecret;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Resolved settings of the active profile, token masked.
fn format_resolved(cfg: &Config, global: &GlobalOpts) -> Result<String, CliError> {
    let (name, profile) = config::active_profile(global, cfg)?;
    let mut resolved = config::profile_to_console_config(&profile, &name, &cfg.defaults)?;
    if let Some(ref url) = global.api_url {
        resolved.api_url = url.parse().map_err(|_| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL: {url}"),
        })?;
    }
    if global.account_slug.is_some() {
        resolved.account_slug.clone_from(&global.account_slug);
    }
    let has_token = global.token.is_some() || resolved.token.is_some();

    let template = &resolved.template;
    let mut out = String::new();
    let _ = writeln!(out, "profile       = \"{name}\"");
    let _ = writeln!(out, "api_url       = \"{}\"", resolved.api_url);
    let _ = writeln!(
        out,
        "account_slug  = {}",
        resolved
            .account_slug
            .as_deref()
            .map_or_else(|| "(unset)".into(), |s| format!("\"{s}\""))
    );
    let _ = writeln!(out, "token         = {}", if has_token { "\"****\"" } else { "(unset)" });
    let _ = writeln!(out, "timeout       = {}", resolved.timeout.as_secs());
    let _ = writeln!(out);
    let _ = writeln!(out, "[template]");
    let _ = writeln!(out, "repo          = \"{}\"", template.repo);
    let _ = writeln!(out, "branch        = \"{}\"", template.branch);
    let _ = writeln!(out, "cmd           = \"{}\"", template.cmd);
    let _ = writeln!(out, "dir           = \"{}\"", template.dir);
    let _ = writeln!(out, "build_image   = \"{}\"", template.build_image);
    if !template.required_env.is_empty() {
        let _ = writeln!(out, "required_env  = {:?}", template.required_env);
    }
    Ok(out.trim_end().to_owned())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    match args.command {
        ConfigCommand::Show => {
            output::print_output(&format_resolved(&cfg, global)?, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let active = config::active_profile_name(global, &cfg);
            let mut names: Vec<&String> = cfg.profiles.keys().collect();
            names.sort();
            let out = names
                .into_iter()
                .map(|n| if *n == active { format!("* {n}") } else { format!("  {n}") })
                .collect::<Vec<_>>()
                .join("\n");
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = cfg;
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::note(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken => {
            let name = config::active_profile_name(global, &cfg);
            let token = match global.token.clone() {
                Some(token) => secrecy::SecretString::from(token),
                None => Password::new()
                    .with_prompt(format!("API token for profile '{name}'"))
                    .interact()
                    .map(secrecy::SecretString::from)
                    .map_err(|e| CliError::Io(std::io::Error::other(e)))?,
            };
            if token.expose_secret().trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "token cannot be empty".into(),
                });
            }
            config::store_token(&name, token.expose_secret().trim())?;
            output::note(&format!("Token stored in the system keyring for profile '{name}'"), global.quiet);
            Ok(())
        }
    }
}
