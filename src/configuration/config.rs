#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::Credentials;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);
static CREDENTIALS: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

const CREDENTIALS_TABLE: &str = "credentials";

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiKey,
    ApiURL,
    AssistantID,
    ConfigFile,
    Greeting,
    PollInterval,
    PollMaxInterval,
    RequestTimeout,
    RunTimeout,
    Title,
    Username,
}

impl ConfigKey {
    /// Keys holding a duration in milliseconds.
    pub fn is_millis(&self) -> bool {
        return matches!(
            self,
            ConfigKey::PollInterval
                | ConfigKey::PollMaxInterval
                | ConfigKey::RequestTimeout
                | ConfigKey::RunTimeout
        );
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn get_millis(key: ConfigKey) -> Result<Duration> {
        let val = Config::get(key);
        match val.parse::<u64>() {
            Ok(millis) => return Ok(Duration::from_millis(millis)),
            Err(_) => bail!(format!(
                "Config key '{key}' must be a number of milliseconds, got '{val}'"
            )),
        }
    }

    pub fn credentials() -> Credentials {
        return CREDENTIALS
            .iter()
            .map(|entry| return (entry.key().to_string(), entry.value().to_string()))
            .collect();
    }

    pub fn set_credential(username: &str, password: &str) {
        CREDENTIALS.insert(username.to_string(), password.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(env::temp_dir)
            .join("muesli/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = path::PathBuf::from(env::var("HOME").unwrap_or_default())
            .join(".config/muesli/config.toml");

        let res = match key {
            ConfigKey::ApiKey => "",
            ConfigKey::ApiURL => "https://api.openai.com",
            ConfigKey::AssistantID => "",
            ConfigKey::Greeting => "Hi! I'm a virtual assistant. How can I help you?",
            ConfigKey::PollInterval => "1000",
            ConfigKey::PollMaxInterval => "8000",
            ConfigKey::RequestTimeout => "30000",
            ConfigKey::RunTimeout => "120000",
            ConfigKey::Title => "Chat with the virtual assistant",
            ConfigKey::Username => "",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }
        CREDENTIALS.clear();

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }
        Config::set(ConfigKey::ConfigFile, &config_file);

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if key == ConfigKey::ConfigFile {
                    continue;
                }

                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        Config::set(key, val_str);
                    } else {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}', expected a string or a number"
                        ));
                    }
                }
            }

            if let Some(item) = doc.get(CREDENTIALS_TABLE) {
                let table = match item.as_table_like() {
                    Some(table) => table,
                    None => bail!("config.toml key 'credentials' must be a table of username = \"password\""),
                };

                for (username, password) in table.iter() {
                    match password.as_str() {
                        Some(password) => Config::set_credential(username, password),
                        None => bail!(format!(
                            "config.toml has a non-string password for user '{username}'"
                        )),
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        for key in ConfigKey::iter().filter(|key| return key.is_millis()) {
            Config::get_millis(key)?;
        }
        if Config::get_millis(ConfigKey::PollInterval)?.is_zero() {
            bail!(format!(
                "Config key '{}' must be above 0 milliseconds",
                ConfigKey::PollInterval
            ));
        }

        tracing::debug!(
            api_url = Config::get(ConfigKey::ApiURL),
            assistant_id = Config::get(ConfigKey::AssistantID),
            poll_interval = Config::get(ConfigKey::PollInterval),
            poll_max_interval = Config::get(ConfigKey::PollMaxInterval),
            run_timeout = Config::get(ConfigKey::RunTimeout),
            credentials = CREDENTIALS.len(),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let mut entries = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>();

        entries.push(format!(
            "# Accepted logins for the login screen, as username = \"password\".\n[{CREDENTIALS_TABLE}]\n# alice = \"change-me\""
        ));

        return entries.join("\n\n");
    }
}
