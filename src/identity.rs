//! Acting-user resolution for local storage.
//!
//! Submissions and profiles are kept per user. Rather than requiring `--as`
//! on every invocation, the user is resolved through a chain:
//!
//! 1. `--as <email>`: explicit per-command override
//! 2. `INTAKE_USER` env var: process/session level
//! 3. `user` in `~/.intake/config.toml`: global default
//!
//! Against the REST API the bearer token identifies the user instead.

use std::env;

use crate::config::Config;

/// Resolve the acting user, if any source names one.
pub fn resolve_user(explicit: Option<&str>, config: &Config) -> Option<String> {
    resolve_from(explicit, env::var("INTAKE_USER").ok(), config)
}

fn resolve_from(explicit: Option<&str>, from_env: Option<String>, config: &Config) -> Option<String> {
    // 1. Explicit --as flag.
    if let Some(user) = explicit {
        return Some(user.to_string());
    }

    // 2. INTAKE_USER environment variable.
    if let Some(user) = from_env
        && !user.is_empty()
    {
        return Some(user);
    }

    // 3. ~/.intake/config.toml.
    config.user.clone().filter(|s| !s.is_empty())
}
