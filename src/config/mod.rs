use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub attendance: AttendanceApiConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Signs session tokens and CSRF tokens.
    pub secret_key: String,
    pub session_duration_hours: i64,
    pub remember_me_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttendanceApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl UploadConfig {
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("server.secure_cookies", false)?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections as i64)?
            .set_default("auth.secret_key", defaults.auth.secret_key)?
            .set_default("auth.session_duration_hours", defaults.auth.session_duration_hours)?
            .set_default("auth.remember_me_days", defaults.auth.remember_me_days)?
            .set_default("attendance.base_url", defaults.attendance.base_url)?
            .set_default("attendance.timeout_secs", defaults.attendance.timeout_secs as i64)?
            .set_default("uploads.dir", defaults.uploads.dir)?
            .set_default("uploads.max_bytes", defaults.uploads.max_bytes as i64)?
            .set_default("uploads.allowed_extensions", defaults.uploads.allowed_extensions)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with PORTAL__ prefix, double underscore separates levels)
            .add_source(
                Environment::with_prefix("PORTAL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("uploads.allowed_extensions")
                    .try_parsing(true),
            )

            // Flat variable names used by existing deployments win over everything else
            .set_override_option("auth.secret_key", std::env::var("SECRET_KEY").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URI").ok())?
            .set_override_option("attendance.base_url", std::env::var("BACKEND_API_URL").ok())?
            .set_override_option("uploads.dir", std::env::var("UPLOAD_FOLDER").ok())?
            .set_override_option(
                "uploads.max_bytes",
                std::env::var("MAX_CONTENT_LENGTH")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )?

            .build()?;

        config.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                secure_cookies: false,
            },
            database: DatabaseConfig {
                url: "sqlite://attendance.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                secret_key: "dev-secret-key-change-in-production".to_string(),
                session_duration_hours: 24,
                remember_me_days: 30,
            },
            attendance: AttendanceApiConfig {
                base_url: "http://localhost:5001/api".to_string(),
                timeout_secs: 5,
            },
            uploads: UploadConfig {
                dir: "uploads".to_string(),
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                allowed_extensions: ["pdf", "doc", "docx", "txt", "jpg", "jpeg", "png"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.uploads.max_bytes, 16 * 1024 * 1024);
        assert_eq!(settings.attendance.timeout_secs, 5);
        assert_eq!(settings.attendance.base_url, "http://localhost:5001/api");
        assert_eq!(settings.uploads.allowed_extensions.len(), 7);
    }

    #[test]
    fn extension_check_ignores_case() {
        let uploads = Settings::default().uploads;
        assert!(uploads.is_allowed_extension("PDF"));
        assert!(uploads.is_allowed_extension("jpeg"));
        assert!(!uploads.is_allowed_extension("exe"));
        assert!(!uploads.is_allowed_extension(""));
    }
}
