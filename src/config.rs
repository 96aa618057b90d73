//! Configuration management
//!
//! TOML config in the platform config directory covering the server binding,
//! content file locations, and authentication settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Content file locations
    #[serde(default)]
    pub content: ContentConfig,
    /// JWT authentication settings
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// JSON catalog loaded once at startup
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// YAML manifest for the document library
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    /// Directory manifest item paths are resolved against
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("content/study-content.json")
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("content/manifest.yaml")
}

fn default_content_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            manifest_path: default_manifest_path(),
            content_root: default_content_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key (auto-generated and persisted if not set)
    pub jwt_secret: Option<String>,
    /// Access token expiration (minutes)
    #[serde(default = "default_token_expiry")]
    pub access_token_expiry_minutes: i64,
    /// Refresh token expiration (days)
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_days: i64,
    /// Maximum failed login attempts before lockout
    #[serde(default = "default_max_attempts")]
    pub max_login_attempts: u32,
    /// Lockout duration after failed attempts (minutes)
    #[serde(default = "default_lockout_duration")]
    pub lockout_duration_minutes: i64,
    /// Known users; progress is keyed by these usernames
    #[serde(default = "default_users")]
    pub users: Vec<UserEntry>,
}

/// One configured account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    /// Salted hash produced by `scholar config set-password`
    pub password_hash: String,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
}

fn default_token_expiry() -> i64 {
    60
}

fn default_refresh_expiry() -> i64 {
    7
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout_duration() -> i64 {
    30
}

fn default_roles() -> Vec<String> {
    vec!["LEARNER".to_string()]
}

fn default_users() -> Vec<UserEntry> {
    // Demo account. Replace via `config set-password`.
    vec![UserEntry {
        username: "learner".to_string(),
        password_hash: crate::server::auth::hash_password("springboot4"),
        roles: default_roles(),
    }]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_expiry_minutes: default_token_expiry(),
            refresh_token_expiry_days: default_refresh_expiry(),
            max_login_attempts: default_max_attempts(),
            lockout_duration_minutes: default_lockout_duration(),
            users: default_users(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating it with defaults on first run.
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Generate and persist a JWT secret if not already set
    pub fn ensure_jwt_secret(&mut self) -> Result<String> {
        if let Some(secret) = &self.auth.jwt_secret {
            return Ok(secret.clone());
        }

        let secret = crate::server::auth::generate_jwt_secret();
        self.auth.jwt_secret = Some(secret.clone());
        self.save()?;
        Ok(secret)
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "scholar", "scholar")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Server:");
    println!("  bind:          {}:{}", config.server.host, config.server.port);
    println!("  static dir:    {}", config.server.static_dir.display());
    println!("Content:");
    println!("  catalog:       {}", config.content.catalog_path.display());
    println!("  manifest:      {}", config.content.manifest_path.display());
    println!("  root:          {}", config.content.content_root.display());
    println!("Auth:");
    println!(
        "  JWT secret:    {}",
        if config.auth.jwt_secret.is_some() { "configured" } else { "not configured" }
    );
    println!("  token expiry:  {} min", config.auth.access_token_expiry_minutes);
    println!(
        "  users:         {}",
        config
            .auth
            .users
            .iter()
            .map(|u| u.username.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}

/// Generate a new JWT secret, invalidating all existing tokens
pub fn rotate_jwt_secret() -> Result<()> {
    let mut config = Config::load()?;
    let new_secret = crate::server::auth::generate_jwt_secret();
    config.auth.jwt_secret = Some(new_secret);
    config.save()?;
    println!("JWT secret rotated. All existing tokens are now invalid.");
    Ok(())
}

/// Set or update a user's password
pub fn set_password(username: &str, password: &str) -> Result<()> {
    let mut config = Config::load()?;
    let hash = crate::server::auth::hash_password(password);
    match config.auth.users.iter_mut().find(|u| u.username == username) {
        Some(user) => user.password_hash = hash,
        None => config.auth.users.push(UserEntry {
            username: username.to_string(),
            password_hash: hash,
            roles: default_roles(),
        }),
    }
    config.save()?;
    println!("Password updated for {}", username);
    Ok(())
}
