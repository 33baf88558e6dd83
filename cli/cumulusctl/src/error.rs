//! Error handling and display for the CLI.

use colored::Colorize;
use cumulus_client::ApiError;
use thiserror::Error;

use crate::ssl::SslError;

/// CLI-specific errors. Remote errors surface as [`ApiError`]; both are
/// rendered by [`print_error`].
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad local input. Fatal to the current command.
    #[error("{0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl From<SslError> for CliError {
    fn from(err: SslError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Print an error in a user-friendly way.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(api_err) = err.downcast_ref::<ApiError>() {
        match api_err {
            ApiError::Unauthorized => {
                eprintln!(
                    "\n{}",
                    "Hint: Run `cumulus auth login` to authenticate.".yellow()
                );
            }
            ApiError::Remote { status, .. } if *status == 403 => {
                eprintln!(
                    "\n{}",
                    "Hint: You may not have permission for this operation.".yellow()
                );
            }
            ApiError::Network(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check your network connection and API endpoint.".yellow()
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssl_errors_become_validation_errors() {
        let err: CliError = SslError::KeyMismatch.into();
        assert!(matches!(err, CliError::Validation(_)));
        assert!(err.to_string().contains("does not match"));
    }
}
