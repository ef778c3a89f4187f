//! Config command - show or change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use super::get_data_dir;
use crate::output::{create_table, success};
use ledger_core::config::{Config, SETTINGS_FILENAME};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting
    ///
    /// Keys: storage.mode, storage.apiBaseUrl, ai.model, ai.replyLanguage
    Set { key: String, value: String },
}

pub fn run(command: Option<ConfigCommands>) -> Result<()> {
    let data_dir = get_data_dir();
    let mut config = Config::load(&data_dir)?;

    match command.unwrap_or(ConfigCommands::Show { json: false }) {
        ConfigCommands::Show { json } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "storageMode": config.storage_mode.to_string(),
                        "apiBaseUrl": config.api_base_url,
                        "requestTimeoutSecs": config.request_timeout.as_secs(),
                        "aiModel": config.ai_model,
                        "aiConfigured": config.ai_api_key.is_some(),
                        "replyLanguage": config.reply_language,
                    }))?
                );
                return Ok(());
            }

            println!("{}", data_dir.join(SETTINGS_FILENAME).display().to_string().dimmed());
            let mut table = create_table();
            table.add_row(vec!["storage.mode".to_string(), config.storage_mode.to_string()]);
            table.add_row(vec!["storage.apiBaseUrl".to_string(), config.api_base_url.clone()]);
            table.add_row(vec![
                "storage.requestTimeoutSecs".to_string(),
                config.request_timeout.as_secs().to_string(),
            ]);
            table.add_row(vec!["ai.model".to_string(), config.ai_model.clone()]);
            table.add_row(vec![
                "ai.apiKey".to_string(),
                if config.ai_api_key.is_some() { "set" } else { "not set" }.to_string(),
            ]);
            table.add_row(vec![
                "ai.replyLanguage".to_string(),
                config.reply_language.clone().unwrap_or_else(|| "default".to_string()),
            ]);
            println!("{}", table);
        }
        ConfigCommands::Set { key, value } => {
            let value = value.trim().to_string();
            match key.as_str() {
                "storage.mode" => config.storage_mode = value.parse()?,
                "storage.apiBaseUrl" => {
                    if value.is_empty() {
                        anyhow::bail!("storage.apiBaseUrl cannot be empty");
                    }
                    config.api_base_url = value.trim_end_matches('/').to_string();
                }
                "ai.model" => {
                    if value.is_empty() {
                        anyhow::bail!("ai.model cannot be empty");
                    }
                    config.ai_model = value;
                }
                "ai.replyLanguage" => {
                    config.reply_language = Some(value).filter(|v| !v.is_empty());
                }
                other => anyhow::bail!(
                    "Unknown setting '{}'. Expected storage.mode, storage.apiBaseUrl, ai.model or ai.replyLanguage",
                    other
                ),
            }

            config.save(&data_dir)?;
            success(&format!("Updated {}", key));
        }
    }

    Ok(())
}
