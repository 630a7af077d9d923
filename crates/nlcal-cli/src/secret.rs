//! Secret references in configuration values.
//!
//! - `env::VAR` reads `$VAR`
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the first line
//! - anything else is used verbatim

use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("environment variable `{0}` is not set")]
    MissingEnv(String),

    #[error("`pass show {path}` failed: {reason}")]
    Pass { path: String, reason: String },

    #[error("secret is empty")]
    Empty,
}

/// Expands a value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    let resolved = if let Some(var) = value.strip_prefix("env::") {
        std::env::var(var.trim()).map_err(|_| SecretError::MissingEnv(var.trim().to_string()))?
    } else if let Some(path) = value.strip_prefix("pass::") {
        from_pass(path.trim())?
    } else {
        value.to_string()
    };

    let resolved = resolved.trim().to_string();
    if resolved.is_empty() {
        return Err(SecretError::Empty);
    }
    Ok(resolved)
}

/// Whether `value` is a reference rather than a literal secret.
pub fn is_reference(value: &str) -> bool {
    value.starts_with("env::") || value.starts_with("pass::")
}

fn from_pass(path: &str) -> Result<String, SecretError> {
    let failed = |reason: String| SecretError::Pass {
        path: path.to_string(),
        reason,
    };

    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| failed(e.to_string()))?;
    if !output.status.success() {
        return Err(failed(format!(
            "{}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| failed("no output".to_string()))
}
