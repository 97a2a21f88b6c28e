//! Shared helpers for command handlers.

use std::collections::BTreeMap;
use std::io::IsTerminal;

use sitedeck_core::CoreError;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, the operation is refused.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Turn a platform 404 into a `NotFound` pointing at the list command.
pub fn or_not_found(err: CoreError, resource: &str, identifier: &str, list_command: &str) -> CliError {
    match err {
        CoreError::Upstream { status: 404, .. } => CliError::NotFound {
            resource: resource.into(),
            identifier: identifier.into(),
            list_command: list_command.into(),
        },
        other => other.into(),
    }
}

/// Collect `--env KEY=VALUE` pairs. A repeated key keeps its last value.
pub fn env_map(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_404_becomes_not_found() {
        let err = or_not_found(
            CoreError::Upstream {
                status: 404,
                message: "Not Found".into(),
            },
            "site",
            "abc",
            "sites list",
        );
        assert!(matches!(err, CliError::NotFound { .. }));

        let err = or_not_found(
            CoreError::Upstream {
                status: 500,
                message: "boom".into(),
            },
            "site",
            "abc",
            "sites list",
        );
        assert!(matches!(err, CliError::Api { status: 500, .. }));
    }

    #[test]
    fn env_map_keeps_last_value() {
        let map = env_map(vec![
            ("A".into(), "1".into()),
            ("B".into(), String::new()),
            ("A".into(), "2".into()),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["A"], "2");
    }
}
