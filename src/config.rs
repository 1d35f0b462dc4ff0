// src/config.rs

use std::env;

/// Runtime configuration, read once at startup from the environment.
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub email_from: String,
    /// Public base URL of the frontend, used to build reset-password links.
    pub app_url: String,
    pub company_name: String,
    pub imagekit_public_key: Option<String>,
    pub imagekit_private_key: Option<String>,
    pub imagekit_url_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            mongo_uri: env::var("MONGO_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "assethub".to_string()),
            smtp_server: env::var("SMTP_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "AssetHub <no-reply@assethub.io>".to_string()),
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            company_name: env::var("COMPANY_NAME").unwrap_or_else(|_| "AssetHub".to_string()),
            imagekit_public_key: env::var("IMAGEKIT_PUBLIC_KEY").ok(),
            imagekit_private_key: env::var("IMAGEKIT_PRIVATE_KEY").ok(),
            imagekit_url_endpoint: env::var("IMAGEKIT_URL_ENDPOINT").ok(),
        }
    }
}
