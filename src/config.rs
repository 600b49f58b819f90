use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub port: u16,
    pub success_notice_secs: u64,
    pub handoff_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_url: std::env::var("NEIGHBORFIT_API_URL")
                .or_else(|_| std::env::var("API_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("NEIGHBORFIT_API_URL or API_URL environment variable required")
                })
                .and_then(|url| {
                    let url = url.trim().trim_end_matches('/').to_string();
                    if url.is_empty() {
                        anyhow::bail!("NEIGHBORFIT_API_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("NEIGHBORFIT_API_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            success_notice_secs: seconds_var("SUCCESS_NOTICE_SECS", 3)?,
            handoff_ttl_secs: seconds_var("HANDOFF_TTL_SECS", 1800)?,
            request_timeout_secs: seconds_var("REQUEST_TIMEOUT_SECS", 30)?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Places API URL: {}", config.api_url);
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!(
            "Notice {}s, hand-off TTL {}s, request timeout {}s",
            config.success_notice_secs,
            config.handoff_ttl_secs,
            config.request_timeout_secs
        );

        Ok(config)
    }
}

fn seconds_var(key: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(key) {
        Ok(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds", key))?;
            if secs == 0 {
                anyhow::bail!("{} must be greater than zero", key);
            }
            Ok(secs)
        }
        Err(_) => Ok(default),
    }
}
