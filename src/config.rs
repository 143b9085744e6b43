use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub profile_api_base_url: String,
    pub profile_api_token: Option<String>,
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            profile_api_base_url: std::env::var("PROFILE_API_BASE_URL")
                .map_err(|_| anyhow::anyhow!("PROFILE_API_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("PROFILE_API_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("PROFILE_API_BASE_URL must start with http:// or https://");
                    }
                    // The connector appends /users/{id}; keep the base clean
                    Ok(url.trim_end_matches('/').to_string())
                })?,
            profile_api_token: std::env::var("PROFILE_API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            webhook_secret: std::env::var("WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Profile API base URL: {}", config.profile_api_base_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.profile_api_token.is_none() {
            tracing::debug!("PROFILE_API_TOKEN not set; outbound requests are unauthenticated");
        }
        if config.webhook_secret.is_none() {
            tracing::warn!("WEBHOOK_SECRET not set; webhook token validation is disabled");
        }

        Ok(config)
    }
}
