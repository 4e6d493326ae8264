// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `odoobot config ...`, `odoobot mcp ...` and `odoobot cleanup`.

use std::io::IsTerminal;
use std::str::FromStr;

use colored::Colorize;
use odoobot_config::OdoobotConfig;
use odoobot_core::{ChatbotConfig, ClaudeModel, OdoobotError, StorageAdapter};
use serde::Serialize;

use crate::app::App;

/// Fields accepted by `odoobot config set`.
const SETTABLE_KEYS: &[&str] = &[
    "name",
    "api_key",
    "model",
    "temperature",
    "max_tokens",
    "timeout",
    "mcp_server_url",
    "daily_message_limit",
    "system_prompt_prefix",
    "odoo_url",
    "odoo_db",
    "odoo_username",
    "odoo_password",
];

/// A configuration as shown to operators, secrets masked.
#[derive(Debug, Serialize)]
struct ConfigView {
    id: i64,
    name: String,
    active: bool,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout_secs: u64,
    mcp_server_url: Option<String>,
    mcp_connected: bool,
    daily_message_limit: u32,
    system_prompt_prefix: Option<String>,
    odoo_url: Option<String>,
    odoo_db: Option<String>,
    odoo_username: Option<String>,
    odoo_password: Option<String>,
    last_test_date: Option<String>,
    last_test_result: Option<String>,
}

impl From<&ChatbotConfig> for ConfigView {
    fn from(c: &ChatbotConfig) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            active: c.active,
            api_key: c.api_key().map(mask_secret),
            model: c.model_name.to_string(),
            temperature: c.temperature,
            max_tokens: c.max_tokens,
            timeout_secs: c.timeout_secs,
            mcp_server_url: c.mcp_server_url.clone(),
            mcp_connected: c.mcp_connected,
            daily_message_limit: c.daily_message_limit,
            system_prompt_prefix: c.system_prompt_prefix.clone(),
            odoo_url: c.odoo_url.clone(),
            odoo_db: c.odoo_db.clone(),
            odoo_username: c.odoo_username.clone(),
            odoo_password: c.odoo_password.as_ref().map(|_| "********".to_string()),
            last_test_date: c.last_test_date.clone(),
            last_test_result: c.last_test_result.clone(),
        }
    }
}

/// Keep a recognizable prefix and the last four characters.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, OdoobotError> {
    value
        .trim()
        .parse()
        .map_err(|_| OdoobotError::Validation(format!("invalid value for {key}: {value:?}")))
}

/// Apply `key = value` to `config`. An empty value clears optional fields.
fn apply_setting(config: &mut ChatbotConfig, key: &str, value: &str) -> Result<(), OdoobotError> {
    match key {
        "name" => config.name = value.trim().to_string(),
        "api_key" => config.api_key = optional(value),
        "model" => {
            config.model_name = ClaudeModel::from_str(value.trim()).map_err(|_| {
                OdoobotError::Validation(format!("unknown model {value:?}"))
            })?;
        }
        "temperature" => config.temperature = parse(key, value)?,
        "max_tokens" => config.max_tokens = parse(key, value)?,
        "timeout" => config.timeout_secs = parse(key, value)?,
        "mcp_server_url" => {
            config.mcp_server_url = optional(value);
            // A different server has not been connected yet.
            config.mcp_connected = false;
        }
        "daily_message_limit" => config.daily_message_limit = parse(key, value)?,
        "system_prompt_prefix" => config.system_prompt_prefix = optional(value),
        "odoo_url" => config.odoo_url = optional(value),
        "odoo_db" => config.odoo_db = optional(value),
        "odoo_username" => config.odoo_username = optional(value),
        "odoo_password" => config.odoo_password = optional(value),
        unknown => {
            let hint = odoobot_config::diagnostic::suggest_key(unknown, SETTABLE_KEYS)
                .map(|s| format!(" (did you mean `{s}`?)"))
                .unwrap_or_default();
            return Err(OdoobotError::Validation(format!(
                "unknown setting `{unknown}`{hint}; valid settings: {}",
                SETTABLE_KEYS.join(", ")
            )));
        }
    }
    Ok(())
}

fn print_status(ok: bool, message: &str) {
    if std::io::stdout().is_terminal() {
        let mark = if ok { "✓".green() } else { "✗".red() };
        println!("{mark} {message}");
    } else {
        println!("[{}] {message}", if ok { "OK" } else { "FAIL" });
    }
}

fn print_config(view: &ConfigView) {
    let none = || "-".to_string();
    println!();
    println!("  configuration #{} {}", view.id, if view.active { "(active)" } else { "" });
    println!("  {}", "-".repeat(35));
    println!("    name:                 {}", view.name);
    println!("    api_key:              {}", view.api_key.clone().unwrap_or_else(none));
    println!("    model:                {}", view.model);
    println!("    temperature:          {}", view.temperature);
    println!("    max_tokens:           {}", view.max_tokens);
    println!("    timeout:              {}s", view.timeout_secs);
    println!("    mcp_server_url:       {}", view.mcp_server_url.clone().unwrap_or_else(none));
    println!("    mcp_connected:        {}", view.mcp_connected);
    println!("    daily_message_limit:  {}", view.daily_message_limit);
    println!(
        "    system_prompt_prefix: {}",
        view.system_prompt_prefix.clone().unwrap_or_else(none)
    );
    println!("    odoo_url:             {}", view.odoo_url.clone().unwrap_or_else(none));
    println!("    odoo_db:              {}", view.odoo_db.clone().unwrap_or_else(none));
    println!("    odoo_username:        {}", view.odoo_username.clone().unwrap_or_else(none));
    println!("    odoo_password:        {}", view.odoo_password.clone().unwrap_or_else(none));
    println!("    last_test_date:       {}", view.last_test_date.clone().unwrap_or_else(none));
    println!("    last_test_result:     {}", view.last_test_result.clone().unwrap_or_else(none));
    println!();
}

/// Run `op` against a freshly built app, closing storage either way.
macro_rules! with_app {
    ($config:expr, |$app:ident| $body:expr) => {{
        let $app = App::build($config).await?;
        let result: Result<(), OdoobotError> = async { $body }.await;
        $app.close().await?;
        result
    }};
}

pub async fn show_config(config: &OdoobotConfig, id: Option<i64>, json: bool) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        let view = ConfigView::from(&app.config_or_active(id).await?);
        if json {
            let text = serde_json::to_string_pretty(&view)
                .map_err(|e| OdoobotError::Internal(format!("failed to serialize output: {e}")))?;
            println!("{text}");
        } else {
            print_config(&view);
        }
        Ok(())
    })
}

pub async fn list_configs(config: &OdoobotConfig) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        // Seeds the first configuration on a fresh database.
        app.service.active_config().await?;
        for c in app.storage.list_configs().await? {
            println!(
                "{} {:>4}  {:<24}  {:<28}  mcp:{}",
                if c.active { "*" } else { " " },
                c.id,
                c.name,
                c.model_name.to_string(),
                if c.mcp_connected { "connected" } else { "off" }
            );
        }
        Ok(())
    })
}

pub async fn activate_config(config: &OdoobotConfig, id: i64) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        app.storage.activate_config(id).await?;
        print_status(true, &format!("configuration #{id} is now active"));
        Ok(())
    })
}

pub async fn set_config(
    config: &OdoobotConfig,
    id: Option<i64>,
    key: &str,
    value: &str,
) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        let mut record = app.config_or_active(id).await?;
        apply_setting(&mut record, key, value)?;
        app.storage.update_config(&record).await?;
        print_status(true, &format!("configuration #{}: {key} updated", record.id));
        Ok(())
    })
}

pub async fn test_config(config: &OdoobotConfig, id: Option<i64>) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        let record = app.config_or_active(id).await?;
        let test = app
            .service
            .test_connection(record.id, &config.operator.user_context())
            .await?;
        print_status(test.success, &test.result);
        if test.success {
            Ok(())
        } else {
            Err(OdoobotError::Internal("connection test failed".into()))
        }
    })
}

pub async fn mcp_connect(config: &OdoobotConfig, id: Option<i64>) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        let record = app.config_or_active(id).await?;
        let message = app.service.connect_mcp(record.id).await?;
        print_status(true, &message);
        Ok(())
    })
}

pub async fn mcp_disconnect(config: &OdoobotConfig, id: Option<i64>) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        let record = app.config_or_active(id).await?;
        app.service.disconnect_mcp(record.id).await?;
        print_status(true, "MCP server disconnected");
        Ok(())
    })
}

pub async fn cleanup(config: &OdoobotConfig) -> Result<(), OdoobotError> {
    with_app!(config, |app| {
        let report = app.service.cleanup().await?;
        print_status(
            true,
            &format!(
                "deleted {} message(s) and {} service call(s)",
                report.messages, report.service_calls
            ),
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use odoobot_config::model::DefaultsConfig;

    fn record() -> ChatbotConfig {
        DefaultsConfig::default().seed_config("2026-01-01T00:00:00.000Z")
    }

    #[test]
    fn masks_all_but_prefix_and_tail() {
        let masked = mask_secret("sk-ant-REDACTED");
        assert_eq!(masked, "sk-ant-...WXYZ");
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn sets_typed_fields() {
        let mut c = record();
        apply_setting(&mut c, "temperature", "0.2").unwrap();
        apply_setting(&mut c, "max_tokens", " 2048 ").unwrap();
        apply_setting(&mut c, "model", "claude-3-haiku-20240307").unwrap();
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.max_tokens, 2048);
        assert_eq!(c.model_name, ClaudeModel::from_str("claude-3-haiku-20240307").unwrap());
    }

    #[test]
    fn empty_value_clears_optional_field() {
        let mut c = record();
        apply_setting(&mut c, "odoo_db", "prod").unwrap();
        assert_eq!(c.odoo_db.as_deref(), Some("prod"));
        apply_setting(&mut c, "odoo_db", "  ").unwrap();
        assert!(c.odoo_db.is_none());
    }

    #[test]
    fn changing_server_resets_connection() {
        let mut c = record();
        c.mcp_connected = true;
        apply_setting(&mut c, "mcp_server_url", "http://localhost:8000").unwrap();
        assert!(!c.mcp_connected);
    }

    #[test]
    fn bad_values_are_validation_errors() {
        let mut c = record();
        assert!(matches!(
            apply_setting(&mut c, "max_tokens", "lots"),
            Err(OdoobotError::Validation(_))
        ));
        assert!(matches!(
            apply_setting(&mut c, "model", "gpt-4"),
            Err(OdoobotError::Validation(_))
        ));
    }

    #[test]
    fn unknown_key_suggests_nearest() {
        let mut c = record();
        let err = apply_setting(&mut c, "temprature", "0.5").unwrap_err();
        assert!(err.to_string().contains("did you mean `temperature`"), "got {err}");
    }

    #[test]
    fn view_hides_password() {
        let mut c = record();
        c.odoo_password = Some("hunter2".into());
        let json = serde_json::to_string(&ConfigView::from(&c)).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
