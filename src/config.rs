use std::{env, path::PathBuf, time::Duration};

use secrecy::SecretString;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";
const DEFAULT_OPENAI_KEY: &str = "sk-dev-placeholder";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub mongo_max_pool_size: u32,
    pub mongo_min_pool_size: u32,
    pub mongo_connect_timeout_secs: u64,
    pub mongo_server_selection_timeout_secs: u64,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub openai_model: String,
    pub storage_bucket: String,
    pub storage_api_base: String,
    /// When set, knowledge documents live on the local filesystem instead of
    /// the remote storage service.
    pub storage_local_root: Option<PathBuf>,
    pub storage_access_token: Option<SecretString>,
    pub generation_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_source_chars: usize,
    pub max_upload_bytes: usize,
    pub link_retry_attempts: u32,
    pub reconcile_interval_secs: u64,
    pub pending_quiz_grace_secs: i64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env_or("MONGO_CONN_STRING", "mongodb://localhost:27017"),
            mongo_db_name: env_or("MONGO_DB_NAME", "docquiz-local"),
            mongo_max_pool_size: env_parse("MONGO_MAX_POOL_SIZE", 10),
            mongo_min_pool_size: env_parse("MONGO_MIN_POOL_SIZE", 2),
            mongo_connect_timeout_secs: env_parse("MONGO_CONNECT_TIMEOUT_SECS", 5),
            mongo_server_selection_timeout_secs: env_parse("MONGO_SERVER_SELECTION_TIMEOUT_SECS", 5),
            web_server_host: env_or("WEB_SERVER_HOST", "localhost"),
            web_server_port: env_parse("WEB_SERVER_PORT", 8080),
            jwt_secret: SecretString::from(env_or("JWT_SECRET", DEFAULT_JWT_SECRET)),
            jwt_expiration_hours: env_parse("JWT_EXPIRATION_HOURS", 24),
            openai_api_key: SecretString::from(env_or("OPENAI_API_KEY", DEFAULT_OPENAI_KEY)),
            openai_api_base: env_or("OPENAI_API_BASE", "https://api.openai.com/v1"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            storage_bucket: env_or("STORAGE_BUCKET", "docquiz-local.appspot.com"),
            storage_api_base: env_or(
                "STORAGE_API_BASE",
                "https://firebasestorage.googleapis.com",
            ),
            storage_local_root: env::var("STORAGE_LOCAL_ROOT").ok().map(PathBuf::from),
            storage_access_token: env::var("STORAGE_ACCESS_TOKEN").ok().map(SecretString::from),
            generation_timeout_secs: env_parse("GENERATION_TIMEOUT_SECS", 120),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 150),
            max_source_chars: env_parse("MAX_SOURCE_CHARS", 400_000),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            link_retry_attempts: env_parse("LINK_RETRY_ATTEMPTS", 3),
            reconcile_interval_secs: env_parse("RECONCILE_INTERVAL_SECS", 60),
            pending_quiz_grace_secs: env_parse("PENDING_QUIZ_GRACE_SECS", 300),
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if self.openai_api_key.expose_secret() == DEFAULT_OPENAI_KEY {
            panic!("FATAL: OPENAI_API_KEY is using default value! Set OPENAI_API_KEY environment variable.");
        }

        if self.request_timeout_secs < self.generation_timeout_secs {
            panic!(
                "FATAL: REQUEST_TIMEOUT_SECS ({}) must not be shorter than GENERATION_TIMEOUT_SECS ({}).",
                self.request_timeout_secs, self.generation_timeout_secs
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "docquiz-test".to_string(),
            mongo_max_pool_size: 4,
            mongo_min_pool_size: 1,
            mongo_connect_timeout_secs: 2,
            mongo_server_selection_timeout_secs: 2,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            openai_api_key: SecretString::from("sk-test".to_string()),
            openai_api_base: "http://127.0.0.1:9/v1".to_string(),
            openai_model: "gpt-test".to_string(),
            storage_bucket: "test-bucket".to_string(),
            storage_api_base: "http://127.0.0.1:9".to_string(),
            storage_local_root: None,
            storage_access_token: None,
            generation_timeout_secs: 5,
            request_timeout_secs: 10,
            max_source_chars: 10_000,
            max_upload_bytes: 1024 * 1024,
            link_retry_attempts: 3,
            reconcile_interval_secs: 60,
            pending_quiz_grace_secs: 0,
        }
    }
}
