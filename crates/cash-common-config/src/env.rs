//! Environment variable handling.

use std::env;
use std::path::Path;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    /// Directory holding `cash.yaml`.
    pub const CASH_CONFIG_PATH: &str = "CASH_CONFIG_PATH";
    /// Deployment profile selecting an extra `.env.<profile>` file.
    pub const CASH_ENV: &str = "CASH_ENV";
}

/// Environment access helpers.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Load `.env`, `.env.local` and `.env.<CASH_ENV>` when present.
    ///
    /// Missing files are skipped. A file that exists but cannot be read or
    /// parsed is an error. Variables already set in the process win over
    /// file entries.
    pub fn init() -> Result<Self, EnvError> {
        Self::init_in(Path::new("."))
    }

    /// Same as [`Environment::init`], resolving the files against `dir`.
    pub fn init_in(dir: &Path) -> Result<Self, EnvError> {
        load_optional(&dir.join(".env"))?;
        load_optional(&dir.join(".env.local"))?;

        if let Some(profile) = Self::get(vars::CASH_ENV) {
            load_optional(&dir.join(format!(".env.{}", profile)))?;
        }

        Ok(Self { _guard: () })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }
}

fn load_optional(path: &Path) -> Result<(), EnvError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cash_test_utils::temp_dir;

    #[test]
    fn test_init_loads_present_files_and_skips_missing() {
        let dir = temp_dir();
        std::fs::write(dir.path().join(".env"), "CASH_ENV_TEST_FROM_FILE=loaded\n").unwrap();

        Environment::init_in(dir.path()).unwrap();
        assert_eq!(Environment::get("CASH_ENV_TEST_FROM_FILE").as_deref(), Some("loaded"));
        assert_eq!(Environment::get("CASH_ENV_TEST_UNSET"), None);
        env::remove_var("CASH_ENV_TEST_FROM_FILE");

        let empty = temp_dir();
        assert!(Environment::init_in(empty.path()).is_ok());
    }

    #[test]
    fn test_init_reports_malformed_file() {
        let dir = temp_dir();
        std::fs::write(dir.path().join(".env.local"), "CASH_ENV_TEST_BROKEN='unterminated\n").unwrap();

        let result = Environment::init_in(dir.path());
        assert!(matches!(result, Err(EnvError::DotenvError(_))));
    }
}
