//! Error codes and exit status for symcheckctl

use symcheck_common::SymcheckError;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when a knowledge-graph lookup failed after all retries
pub const EXIT_RESOLUTION_FAILED: i32 = 69;

/// Exit code when the configuration file cannot be used
pub const EXIT_CONFIG_ERROR: i32 = 78;

/// Map an error chain to a process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<SymcheckError>() {
            return match e {
                SymcheckError::ResolutionFailed { .. } => EXIT_RESOLUTION_FAILED,
                SymcheckError::Config(_) | SymcheckError::Toml(_) => EXIT_CONFIG_ERROR,
                _ => EXIT_GENERAL_ERROR,
            };
        }
    }
    EXIT_GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_resolution_failure_code() {
        let err: anyhow::Error = Err::<(), _>(SymcheckError::ResolutionFailed {
            operation: "all_symptoms".to_string(),
            attempts: 3,
            last_error: "timeout".to_string(),
        })
        .context("Loading symptoms")
        .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_RESOLUTION_FAILED);
    }

    #[test]
    fn test_config_and_other_codes() {
        let config = anyhow::Error::new(SymcheckError::Config("bad".to_string()));
        assert_eq!(exit_code_for(&config), EXIT_CONFIG_ERROR);
        assert_eq!(exit_code_for(&anyhow::anyhow!("plain")), EXIT_GENERAL_ERROR);
    }
}
