use thiserror::Error;

/// Prefix marking a configuration value as a reference to an environment variable.
pub const ENV_REF_PREFIX: &str = "env:";

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing
/// or empty.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

/// Resolves a configuration value that may point at an environment variable.
///
/// `"env:MT5_PASSWORD"` reads `MT5_PASSWORD`; any other value is returned as-is.
/// Surrounding whitespace in the variable name is ignored.
pub fn resolve_env_ref(value: &str) -> Result<String, MissingEnvVarError> {
    match value.strip_prefix(ENV_REF_PREFIX) {
        Some(name) => get_env_var(name.trim()),
        None => Ok(value.to_string()),
    }
}
