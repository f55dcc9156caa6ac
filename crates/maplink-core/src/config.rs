use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, with no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(invalid(var, "must be greater than zero".to_string())),
            n => Ok(n),
        }
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("MAPLINK_ENV", "development"))?;
    let bind_addr = parse_addr("MAPLINK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("MAPLINK_LOG_LEVEL", "info");

    let request_timeout_secs = parse_positive_u64("MAPLINK_REQUEST_TIMEOUT_SECS", "12")?;
    let bridge_max_redirects = parse_usize("MAPLINK_BRIDGE_MAX_REDIRECTS", "6")?;
    let manual_max_hops = parse_usize("MAPLINK_MANUAL_MAX_HOPS", "10")?;
    let accept_language = or_default("MAPLINK_ACCEPT_LANGUAGE", "fr-FR,fr;q=0.9,en;q=0.8");
    let extra_short_hosts = parse_host_list(&or_default("MAPLINK_EXTRA_SHORT_HOSTS", ""));

    let browser_enabled = parse_bool("MAPLINK_BROWSER_ENABLED", "true")?;
    let browser_executable = lookup("MAPLINK_BROWSER_EXECUTABLE")
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from);
    let browser_nav_timeout_ms = parse_positive_u64("MAPLINK_BROWSER_NAV_TIMEOUT_MS", "15000")?;
    let browser_idle_timeout_ms = parse_u64("MAPLINK_BROWSER_IDLE_TIMEOUT_MS", "5000")?;

    let expand_deadline_secs = parse_positive_u64("MAPLINK_EXPAND_DEADLINE_SECS", "90")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        request_timeout_secs,
        bridge_max_redirects,
        manual_max_hops,
        accept_language,
        extra_short_hosts,
        browser_enabled,
        browser_executable,
        browser_nav_timeout_ms,
        browser_idle_timeout_ms,
        expand_deadline_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MAPLINK_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Split a comma-separated host list, lowercasing and dropping blanks.
fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
