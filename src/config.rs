// src/config.rs - Configuration management with data hot reload support
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub dos: DosConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub hot_reload: HotReloadConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HotReloadConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive: u64,
}

/// Where the stock and sales tables come from.
///
/// A complete CSV pair takes precedence over the workbook.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub workbook_path: Option<PathBuf>,
    pub stock_csv: Option<PathBuf>,
    pub sales_csv: Option<PathBuf>,
    pub stock_sheet_keyword: String,
    pub sales_sheet_keyword: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DosConfig {
    pub window_days: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub max_request_size: usize,
    pub require_https: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            keep_alive: 30,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            workbook_path: Some(PathBuf::from("skg_data.xlsx")),
            stock_csv: None,
            sales_csv: None,
            stock_sheet_keyword: "stock".to_string(),
            sales_sheet_keyword: "sales".to_string(),
        }
    }
}

impl Default for DosConfig {
    fn default() -> Self {
        Self { window_days: crate::dos::DEFAULT_WINDOW_DAYS }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:8080".to_string(),
                "http://localhost:8080".to_string(),
            ],
            max_request_size: 1024 * 1024,
            require_https: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 2000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            dos: DosConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
            hot_reload: HotReloadConfig::default(),
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
        let path = Path::new(&config_file);
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", config_file))?;
        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", config_file))?
    } else {
        Config::default()
    };

    override_with_env(&mut config);

    config.validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

fn override_with_env(config: &mut Config) {
    if let Ok(host) = env::var("BIND_ADDRESS") {
        config.server.host = host;
    }
    if let Ok(port_str) = env::var("ANALYTICS_PORT") {
        if let Ok(port) = port_str.parse::<u16>() {
            config.server.port = port;
        }
    }
    if let Ok(workers_str) = env::var("ANALYTICS_WORKERS") {
        if let Ok(workers) = workers_str.parse::<usize>() {
            config.server.workers = Some(workers);
        }
    }
    if let Ok(path) = env::var("DATA_FILE") {
        config.data.workbook_path = Some(PathBuf::from(path));
    }
    if let (Ok(stock), Ok(sales)) = (env::var("STOCK_CSV"), env::var("SALES_CSV")) {
        config.data.workbook_path = None;
        config.data.stock_csv = Some(PathBuf::from(stock));
        config.data.sales_csv = Some(PathBuf::from(sales));
    }
    if let Ok(window_str) = env::var("DOS_WINDOW_DAYS") {
        if let Ok(window) = window_str.parse::<u32>() {
            config.dos.window_days = window;
        }
    }
    if let Ok(origins_str) = env::var("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(level) = env::var("RUST_LOG") {
        config.logging.level = level;
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.dos.window_days == 0 {
            return Err(anyhow::anyhow!("dos.window_days must be greater than zero"));
        }

        if self.data.workbook_path.is_none() {
            match (&self.data.stock_csv, &self.data.sales_csv) {
                (Some(_), Some(_)) => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "Either data.workbook_path or both data.stock_csv and data.sales_csv must be set"
                    ))
                }
            }
        }

        if self.data.stock_sheet_keyword.trim().is_empty() || self.data.sales_sheet_keyword.trim().is_empty() {
            return Err(anyhow::anyhow!("Sheet keywords cannot be empty"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        env::var("ANALYTICS_ENV").map(|v| v == "production").unwrap_or(false)
    }

    /// Files whose modification should trigger a data reload.
    pub fn watched_files(&self) -> Vec<PathBuf> {
        match (&self.data.stock_csv, &self.data.sales_csv, &self.data.workbook_path) {
            (Some(stock), Some(sales), _) => vec![stock.clone(), sales.clone()],
            (_, _, Some(path)) => vec![path.clone()],
            _ => Vec::new(),
        }
    }

    pub fn print_startup_info(&self) {
        log::info!("📊 Stock health analytics starting up...");
        log::info!("🌐 Server: {}:{}", self.server.host, self.server.port);
        log::info!("📁 Data: {:?}", self.watched_files());
        log::info!("📦 DOS window: {} days", self.dos.window_days);
        log::info!("📝 Logging: {} level", self.logging.level);
        log::info!("🔄 Hot Reload: {}", if self.hot_reload.enabled { "Enabled" } else { "Disabled" });

        if !self.is_production() {
            log::warn!("🚧 Running in development mode");
        }
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}
