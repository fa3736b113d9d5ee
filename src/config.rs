use dotenvy::dotenv;
use std::env;
use std::sync::{Arc, OnceLock};

/// ✅ Global Config stored in `OnceLock`
static CONFIG: OnceLock<Arc<Config>> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub auth_disabled: bool,
    pub bind_addr: String,
    /// Mail relay endpoint; outbound email is skipped entirely when unset.
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
    /// Login URL included in author approval emails.
    pub login_url: String,
}

impl Config {
    /// ✅ Load environment variables and set defaults
    pub fn from_env() -> Self {
        dotenv().ok(); // Load .env only once

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            auth_disabled: env::var("AUTH_DISABLED").unwrap_or_else(|_| "false".to_string())
                == "true",
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").ok().filter(|v| !v.is_empty()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@scholarhub.example".to_string()),
            login_url: env::var("LOGIN_URL")
                .unwrap_or_else(|_| "https://scholarhub.example/login".to_string()),
        }
    }

    /// ✅ Initialize the global config
    pub fn init() {
        CONFIG
            .set(Arc::new(Self::from_env()))
            .expect("Config already initialized");
    }

    /// ✅ Safe access to Config
    pub fn get() -> Arc<Config> {
        CONFIG.get().expect("Config not initialized").clone()
    }

    /// ✅ Check if authentication is disabled
    pub fn auth_disabled() -> bool {
        Config::get().auth_disabled
    }
}
