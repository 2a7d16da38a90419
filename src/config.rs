use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub admins: AdminConfig,
    #[serde(default)]
    pub shortener: ShortenerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resolver HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Private channel that mirrors archived content (e.g. -1001234567890)
    #[serde(default)]
    pub archive_channel_id: i64,
    /// Operations log channel; 0 disables log-channel notifications
    #[serde(default)]
    pub log_channel_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Public base for canonical share links, no trailing slash
    #[serde(default = "default_public_domain")]
    pub public_domain: String,
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "sqlite" (any sea-orm URL) or "file"
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_records_file")]
    pub records_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Seed allow-list, only applied when the admins file does not exist yet
    #[serde(default)]
    pub initial_ids: Vec<i64>,
    #[serde(default = "default_admins_file")]
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    /// "none", "tinyurl", "isgd" or "custom"
    #[serde(default = "default_shortener_provider")]
    pub provider: String,
    /// Secondary provider tried before giving up and returning the input
    #[serde(default)]
    pub fallback_provider: Option<String>,
    #[serde(default)]
    pub api_key: String,
    /// Endpoint template for the "custom" provider; `{url}` and `{key}`
    /// placeholders are substituted per request
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_shortener_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; empty/absent logs to stdout
    #[serde(default)]
    pub file: Option<String>,
    /// "plain" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub enable_rotation: bool,
    #[serde(default = "default_log_max_backups")]
    pub max_backups: u32,
}

// Default value functions
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_public_domain() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_code_length() -> usize {
    6
}

fn default_storage_backend() -> String {
    "sqlite".to_string()
}

fn default_database_url() -> String {
    "sqlite://vaultlink.db?mode=rwc".to_string()
}

fn default_records_file() -> String {
    "records.json".to_string()
}

fn default_admins_file() -> String {
    "admins.json".to_string()
}

fn default_shortener_provider() -> String {
    "none".to_string()
}

fn default_shortener_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

fn default_log_max_backups() -> u32 {
    7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            telegram: TelegramConfig::default(),
            links: LinkConfig::default(),
            storage: StorageConfig::default(),
            admins: AdminConfig::default(),
            shortener: ShortenerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            archive_channel_id: 0,
            log_channel_id: 0,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            public_domain: default_public_domain(),
            code_length: default_code_length(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            database_url: default_database_url(),
            records_file: default_records_file(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            initial_ids: Vec::new(),
            file: default_admins_file(),
        }
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            provider: default_shortener_provider(),
            fallback_provider: None,
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_shortener_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            format: default_log_format(),
            enable_rotation: false,
            max_backups: default_log_max_backups(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file with environment variable fallback
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    fn load_from_file() -> Self {
        let config_paths = [
            "config.toml",
            "vaultlink.toml",
            "config/config.toml",
            "/etc/vaultlink/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<Config>(&content) {
                        Ok(config) => {
                            debug!("Successfully loaded config from: {}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    fn override_with_env(&mut self) {
        // Server config
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT").or_else(|_| env::var("SERVER_PORT")) {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        // Telegram config
        if let Ok(token) = env::var("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(id) = env::var("ARCHIVE_CHANNEL_ID") {
            if let Ok(id) = id.parse() {
                self.telegram.archive_channel_id = id;
            }
        }
        if let Ok(id) = env::var("LOG_CHANNEL_ID") {
            if let Ok(id) = id.parse() {
                self.telegram.log_channel_id = id;
            }
        }

        // Link config
        if let Ok(domain) = env::var("DOMAIN") {
            self.links.public_domain = domain;
        }
        if let Ok(length) = env::var("CODE_LENGTH") {
            if let Ok(length) = length.parse() {
                self.links.code_length = length;
            }
        }

        // Storage config
        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Ok(database_url) = env::var("DATABASE_URL") {
            self.storage.database_url = database_url;
        }
        if let Ok(records_file) = env::var("RECORDS_FILE") {
            self.storage.records_file = records_file;
        }

        // Admin config
        if let Ok(ids) = env::var("ADMIN_IDS") {
            let parsed: Vec<i64> = ids
                .split(',')
                .filter_map(|part| part.trim().parse().ok())
                .collect();
            if !parsed.is_empty() {
                self.admins.initial_ids = parsed;
            }
        }
        if let Ok(file) = env::var("ADMINS_FILE") {
            self.admins.file = file;
        }

        // Shortener config
        if let Ok(provider) = env::var("SHORTENER_PROVIDER") {
            self.shortener.provider = provider;
        }
        if let Ok(fallback) = env::var("SHORTENER_FALLBACK_PROVIDER") {
            self.shortener.fallback_provider = Some(fallback);
        }
        if let Ok(api_key) = env::var("SHORTENER_API_KEY") {
            self.shortener.api_key = api_key;
        }
        if let Ok(endpoint) = env::var("SHORTENER_ENDPOINT") {
            self.shortener.endpoint = endpoint;
        }

        // Logging config
        if let Ok(log_level) = env::var("RUST_LOG") {
            self.logging.level = log_level;
        }
        if let Ok(log_file) = env::var("LOG_FILE") {
            self.logging.file = Some(log_file);
        }
    }

    /// Generate a sample TOML configuration file
    pub fn generate_sample_config() -> String {
        let sample_config = Config::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

// Global configuration instance
use std::sync::OnceLock;
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::load)
}

/// Initialize the global configuration
pub fn init_config() {
    CONFIG.get_or_init(Config::load);
}
