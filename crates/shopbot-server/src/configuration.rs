use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment, File};
use serde::Deserialize;
use shopbot::{
    agent::DEFAULT_MAX_ROUNDS,
    context::{BusinessProfile, ContextSources},
    notifier::{PushoverCredentials, PUSHOVER_URL},
    providers::configs::{OpenAiProviderConfig, DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_TIMEOUT},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress {
                host: self.host.clone(),
                port: self.port,
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        let timeout = self.timeout();
        OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NotifierSettings {
    #[serde(default = "default_notifier_url")]
    pub url: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            url: default_notifier_url(),
            user: None,
            token: None,
        }
    }
}

impl NotifierSettings {
    /// Both values must be present, otherwise notifications are skipped
    pub fn credentials(&self) -> Option<PushoverCredentials> {
        match (&self.user, &self.token) {
            (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => {
                Some(PushoverCredentials {
                    user: user.clone(),
                    token: token.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Shop facts plus the documents the prompt is built from. Kept flat so that
/// numeric-looking values such as phone numbers still land in string fields.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusinessSettings {
    pub name: String,
    pub business_name: String,
    pub price_per_item: String,
    pub contact_whatsapp: String,
    pub contact_instagram: String,
    pub menu_path: PathBuf,
    pub profile_path: PathBuf,
    pub prompt_template: Option<PathBuf>,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        let profile = BusinessProfile::default();
        Self {
            name: profile.name,
            business_name: profile.business_name,
            price_per_item: profile.price_per_item,
            contact_whatsapp: profile.contact_whatsapp,
            contact_instagram: profile.contact_instagram,
            menu_path: PathBuf::from("me/menu.txt"),
            profile_path: PathBuf::from("me/profile.txt"),
            prompt_template: None,
        }
    }
}

impl BusinessSettings {
    pub fn profile(&self) -> BusinessProfile {
        BusinessProfile {
            name: self.name.clone(),
            business_name: self.business_name.clone(),
            price_per_item: self.price_per_item.clone(),
            contact_whatsapp: self.contact_whatsapp.clone(),
            contact_instagram: self.contact_instagram.clone(),
        }
    }

    pub fn sources(&self) -> ContextSources {
        ContextSources {
            menu_path: self.menu_path.clone(),
            profile_path: self.profile_path.clone(),
            template_path: self.prompt_template.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub business: BusinessSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Provider defaults
            .set_default("provider.host", default_provider_host())?
            .set_default("provider.model", default_model())?
            // Optional config file next to the binary's working directory
            .add_source(File::with_name("shopbot").required(false))
            // Layer on the environment variables. Values stay strings until a typed
            // field asks for a number, so phone numbers keep their leading zero.
            .add_source(
                Environment::with_prefix("SHOPBOT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Handle missing field errors specially
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                // Handle both NotFound and missing field message variants
                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    // Extract field name from error message "missing field `api_key`"
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .split('`')
                        .next()
                        .unwrap_or_default();
                    let env_var = to_env_var(&format!("provider.{}", field));
                    Err(ConfigError::MissingEnvVar { env_var })
                } else if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_provider_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_rounds() -> usize {
    DEFAULT_MAX_ROUNDS
}

fn default_notifier_url() -> String {
    PUSHOVER_URL.to_string()
}
