//! Configuration management for reply-probe.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values
//!
//! The environment variable names (`BOT_TOKEN`, `BOTNAME`, `SCRIPT`,
//! `MIN_DELAY`, `MAX_DELAY`) are the bot's public deployment contract.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::script::ScriptSource;

/// Which half of the system this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotRole {
    /// Drives scripted sessions and measures reply latency.
    #[default]
    Responder,
    /// Issues test ids linking sessions across probe bots.
    Starter,
}

impl FromStr for BotRole {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "responder" => Ok(Self::Responder),
            "starter" => Ok(Self::Starter),
            other => Err(ConfigError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for BotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Responder => write!(f, "responder"),
            Self::Starter => write!(f, "starter"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bot identity and role.
    pub bot: BotSection,
    /// Prompt script and delivery timing.
    pub script: ScriptSection,
    /// Starter-role settings.
    pub starter: StarterSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Bot identity section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSection {
    /// Bot API access token. Required; there is no default.
    pub token: Option<String>,
    /// Display name used only in message text.
    pub display_name: String,
    /// Process role.
    pub role: BotRole,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            token: None,
            display_name: "TestBot".to_string(),
            role: BotRole::Responder,
        }
    }
}

/// Prompt script section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSection {
    /// Pipe-delimited list of prompts.
    pub text: String,
    /// Minimum inter-prompt delay in seconds.
    pub min_delay_secs: f64,
    /// Maximum inter-prompt delay in seconds.
    pub max_delay_secs: f64,
}

impl Default for ScriptSection {
    fn default() -> Self {
        Self {
            text: "Hey 😏|What are you doing right now?|Mmm okay… and what else?".to_string(),
            min_delay_secs: 5.0,
            max_delay_secs: 10.0,
        }
    }
}

/// Starter-role section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterSection {
    /// Peer probe bot handles (e.g. `@JamesTestBot`) listed in the
    /// new-test message.
    pub peer_bots: Vec<String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if !token.is_empty() {
                self.bot.token = Some(token);
            }
        }

        if let Ok(name) = std::env::var("BOTNAME") {
            if !name.is_empty() {
                self.bot.display_name = name;
            }
        }

        if let Ok(script) = std::env::var("SCRIPT") {
            self.script.text = script;
        }

        if let Ok(min) = std::env::var("MIN_DELAY") {
            if let Ok(min) = min.parse() {
                self.script.min_delay_secs = min;
            }
        }

        if let Ok(max) = std::env::var("MAX_DELAY") {
            if let Ok(max) = max.parse() {
                self.script.max_delay_secs = max;
            }
        }

        if let Ok(role) = std::env::var("BOT_ROLE") {
            if let Ok(role) = role.parse() {
                self.bot.role = role;
            }
        }

        if let Ok(peers) = std::env::var("PEER_BOTS") {
            self.starter.peer_bots = parse_peer_list(&peers);
        }

        if let Ok(level) = std::env::var("REPLY_PROBE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(ref token) = args.token {
            self.bot.token = Some(token.clone());
        }
        if let Some(ref name) = args.bot_name {
            self.bot.display_name = name.clone();
        }
        if let Some(ref script) = args.script {
            self.script.text = script.clone();
        }
        if let Some(min) = args.min_delay {
            self.script.min_delay_secs = min;
        }
        if let Some(max) = args.max_delay {
            self.script.max_delay_secs = max;
        }
        if let Some(ref role) = args.role {
            self.bot.role = role.parse()?;
        }
        if let Some(ref peers) = args.peer_bots {
            self.starter.peer_bots = parse_peer_list(peers);
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
        Ok(())
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args)?;

        Ok(config)
    }

    /// Check the invariants the rest of the program relies on.
    ///
    /// A missing token or an inverted delay range is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.bot.token {
            Some(ref token) if !token.is_empty() => {}
            _ => return Err(ConfigError::MissingToken),
        }

        let (min, max) = (self.script.min_delay_secs, self.script.max_delay_secs);
        if min < 0.0 || max < 0.0 || min > max {
            return Err(ConfigError::InvalidDelayRange(min, max));
        }

        Ok(())
    }

    /// Parse the configured script text.
    pub fn script_source(&self) -> ScriptSource {
        ScriptSource::parse(&self.script.text)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn parse_peer_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// No bot token was provided anywhere.
    MissingToken,
    /// Delay range is negative or inverted.
    InvalidDelayRange(f64, f64),
    /// Unrecognized bot role.
    InvalidRole(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::MissingToken => {
                write!(f, "missing bot token: set BOT_TOKEN or pass --token")
            }
            Self::InvalidDelayRange(min, max) => {
                write!(
                    f,
                    "invalid delay range: MIN_DELAY {} must be <= MAX_DELAY {} and both >= 0",
                    min, max
                )
            }
            Self::InvalidRole(role) => {
                write!(f, "invalid role '{}': expected responder or starter", role)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.bot.token.is_none());
        assert_eq!(config.bot.display_name, "TestBot");
        assert_eq!(config.bot.role, BotRole::Responder);
        assert_eq!(config.script.min_delay_secs, 5.0);
        assert_eq!(config.script.max_delay_secs, 10.0);
        assert_eq!(config.script_source().len(), 3);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "bot": {
                "token": "123:ABC",
                "display_name": "ProbeBot",
                "role": "starter"
            },
            "script": {
                "text": "A|B",
                "min_delay_secs": 1.0,
                "max_delay_secs": 2.0
            },
            "starter": {
                "peer_bots": ["@One", "@Two"]
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.bot.token.as_deref(), Some("123:ABC"));
        assert_eq!(config.bot.display_name, "ProbeBot");
        assert_eq!(config.bot.role, BotRole::Starter);
        assert_eq!(config.script_source().prompts(), &["A", "B"]);
        assert_eq!(config.starter.peer_bots.len(), 2);
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{
            "script": { "text": "Only|This" }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.script_source().prompts(), &["Only", "This"]);
        assert_eq!(config.bot.display_name, "TestBot"); // Default
        assert_eq!(config.script.min_delay_secs, 5.0); // Default
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            token: Some("tok".to_string()),
            bot_name: Some("Named".to_string()),
            script: Some("X|Y".to_string()),
            min_delay: Some(0.0),
            max_delay: Some(1.0),
            role: Some("starter".to_string()),
            peer_bots: Some("@A, @B,,".to_string()),
            ..Args::default()
        };

        config.apply_args(&args).unwrap();

        assert_eq!(config.bot.token.as_deref(), Some("tok"));
        assert_eq!(config.bot.display_name, "Named");
        assert_eq!(config.script.text, "X|Y");
        assert_eq!(config.script.min_delay_secs, 0.0);
        assert_eq!(config.script.max_delay_secs, 1.0);
        assert_eq!(config.bot.role, BotRole::Starter);
        assert_eq!(config.starter.peer_bots, vec!["@A", "@B"]);
    }

    #[test]
    fn test_apply_args_invalid_role() {
        let mut config = Config::default();
        let args = Args {
            role: Some("spectator".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            config.apply_args(&args),
            Err(ConfigError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_validate_requires_token() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingToken)));

        let mut config = Config::default();
        config.bot.token = Some(String::new());
        assert!(matches!(config.validate(), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut config = Config::default();
        config.bot.token = Some("tok".to_string());
        config.script.min_delay_secs = 10.0;
        config.script.max_delay_secs = 5.0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDelayRange(_, _))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_delays() {
        let mut config = Config::default();
        config.bot.token = Some("tok".to_string());
        config.script.min_delay_secs = -1.0;
        config.script.max_delay_secs = 5.0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_equal_delays() {
        let mut config = Config::default();
        config.bot.token = Some("tok".to_string());
        config.script.min_delay_secs = 0.0;
        config.script.max_delay_secs = 0.0;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("responder".parse::<BotRole>().unwrap(), BotRole::Responder);
        assert_eq!("STARTER".parse::<BotRole>().unwrap(), BotRole::Starter);
        assert!("other".parse::<BotRole>().is_err());
    }

    #[test]
    fn test_peer_list_parsing() {
        assert_eq!(
            parse_peer_list("@A, @B ,,@C"),
            vec!["@A", "@B", "@C"]
        );
        assert!(parse_peer_list("").is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"display_name\""));
        assert!(json.contains("\"min_delay_secs\""));
    }
}
