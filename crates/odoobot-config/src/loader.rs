// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./odoobot.toml` > `~/.config/odoobot/odoobot.toml` > `/etc/odoobot/odoobot.toml`
//! with environment variable overrides via `ODOOBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::OdoobotConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/odoobot/odoobot.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "odoobot.toml";

/// Sections addressable through `ODOOBOT_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "anthropic",
    "mcp",
    "storage",
    "gateway",
    "retention",
    "chat",
    "defaults",
    "operator",
];

/// Path of the per-user config file, if a config dir exists.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("odoobot/odoobot.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/odoobot/odoobot.toml` (system-wide)
/// 3. `~/.config/odoobot/odoobot.toml` (user XDG config)
/// 4. `./odoobot.toml` (local directory)
/// 5. `ODOOBOT_*` environment variables
pub fn load_config() -> Result<OdoobotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OdoobotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OdoobotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OdoobotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OdoobotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(OdoobotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `ODOOBOT_GATEWAY_BEARER_TOKEN` to `gateway.bearer_token`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// key names keep their own underscores.
fn env_provider() -> Env {
    Env::prefixed("ODOOBOT_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("gateway_bearer_token"), "gateway.bearer_token");
        assert_eq!(map_env_key("anthropic_max_continuations"), "anthropic.max_continuations");
        assert_eq!(map_env_key("defaults_mcp_server_url"), "defaults.mcp_server_url");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_override_wins_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "odoobot.toml",
                r#"
[gateway]
port = 9000
"#,
            )?;
            jail.set_env("ODOOBOT_GATEWAY_PORT", "9100");
            jail.set_env("ODOOBOT_ANTHROPIC_API_VERSION", "2024-01-01");

            let config = load_config_from_path(Path::new("odoobot.toml"))?;
            assert_eq!(config.gateway.port, 9100);
            assert_eq!(config.anthropic.api_version, "2024-01-01");
            Ok(())
        });
    }
}
