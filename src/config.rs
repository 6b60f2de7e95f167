use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Placeholder token shipped in sample env files; treated as unset.
const PLACEHOLDER_TOKEN: &str = "YOUR_BOT_TOKEN_HERE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub voices: VoicesConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

/// Outbound links shown in the /start menu
#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    #[serde(default = "default_updates_url")]
    pub updates_url: String,
    #[serde(default = "default_support_url")]
    pub support_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VoicesConfig {
    #[serde(default = "default_voice_dir")]
    pub directory: PathBuf,
    /// File extension without the leading dot
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// File sent when the message is exactly the trigger word
    #[serde(default = "default_designated_file")]
    pub designated_file: String,
    /// Pause between the "recording voice" action and the upload
    #[serde(default = "default_record_delay_ms")]
    pub record_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_health_host")]
    pub host: String,
    #[serde(default = "default_health_port")]
    pub port: u16,
}

fn default_updates_url() -> String {
    "https://t.me/WorkGlows".to_string()
}

fn default_support_url() -> String {
    "https://t.me/SoulMeetsHQ".to_string()
}

fn default_voice_dir() -> PathBuf {
    PathBuf::from("voices")
}

fn default_extension() -> String {
    "ogg".to_string()
}

fn default_trigger() -> String {
    "ben".to_string()
}

fn default_designated_file() -> String {
    "ben.ogg".to_string()
}

fn default_record_delay_ms() -> u64 {
    1000
}

fn default_health_host() -> String {
    "0.0.0.0".to_string()
}

fn default_health_port() -> u16 {
    8000
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            updates_url: default_updates_url(),
            support_url: default_support_url(),
        }
    }
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            directory: default_voice_dir(),
            extension: default_extension(),
            trigger: default_trigger(),
            designated_file: default_designated_file(),
            record_delay_ms: default_record_delay_ms(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            host: default_health_host(),
            port: default_health_port(),
        }
    }
}

impl Config {
    /// Load the TOML config at `path` (optional), then apply environment
    /// overrides from the process and a `.env` file if present.
    pub fn load(path: &Path) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(url) = lookup("UPDATES_URL") {
            self.links.updates_url = url;
        }
        if let Some(url) = lookup("SUPPORT_URL") {
            self.links.support_url = url;
        }
        if let Some(dir) = lookup("VOICE_DIR") {
            self.voices.directory = PathBuf::from(dir);
        }
        if let Some(port) = lookup("PORT") {
            self.health.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let token = self.telegram.bot_token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            bail!("Bot token is not set; provide BOT_TOKEN or [telegram] bot_token");
        }

        for (name, url) in [
            ("updates_url", &self.links.updates_url),
            ("support_url", &self.links.support_url),
        ] {
            reqwest::Url::parse(url).with_context(|| format!("Invalid {}: {}", name, url))?;
        }

        if self.voices.trigger.trim().is_empty() {
            bail!("Voice trigger word must not be empty");
        }

        Ok(())
    }

    /// Address the health listener binds to.
    pub fn health_addr(&self) -> String {
        format!("{}:{}", self.health.host, self.health.port)
    }
}
