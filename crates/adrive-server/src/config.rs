use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request bodies above this size are rejected before reaching the core.
    pub max_upload_bytes: u64,
    /// HS256 secret for bearer tokens. Without one every request is
    /// anonymous.
    pub jwt_secret: Option<String>,
    /// Password hash for the `admin` account seeded into an empty user list.
    pub admin_password_hash: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    auth: AuthSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_max_upload_bytes")]
    max_upload_bytes: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct AuthSection {
    #[serde(default)]
    jwt_secret: Option<String>,
    #[serde(default)]
    admin_password_hash: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3133
}

fn default_max_upload_bytes() -> u64 {
    1_000_000 * MIB
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(Self {
                host: file_config.server.host,
                port: file_config.server.port,
                max_upload_bytes: file_config.server.max_upload_bytes,
                jwt_secret: non_empty(file_config.auth.jwt_secret),
                admin_password_hash: non_empty(file_config.auth.admin_password_hash),
            });
        }

        Ok(Self::from_env())
    }

    fn from_env() -> Self {
        let host = env::var("ADRIVE_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("ADRIVE_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let max_upload_bytes = env::var("ADRIVE_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or_else(default_max_upload_bytes);
        let jwt_secret = non_empty(env::var("ADRIVE_JWT_SECRET").ok());
        let admin_password_hash = non_empty(env::var("ADRIVE_ADMIN_PASSWORD_HASH").ok());

        Self {
            host,
            port,
            max_upload_bytes,
            jwt_secret,
            admin_password_hash,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("ADRIVE_SERVER_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("server.toml").exists() {
        Some("server.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(Some(parsed))
}
