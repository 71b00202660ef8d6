use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub site: SiteConfig,
    pub webhook: WebhookConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub max_concurrent_jobs: usize,
    /// Seconds to wait for a selector before giving up on a page.
    pub wait_timeout: u64,
    pub user_agent: String,
    pub chrome_path: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
}

/// Everything we rely on about the scraped site's markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    pub search_path: String,
    pub query_param: String,
    pub result_card_selector: String,
    pub price_selector: String,
    pub show_more_selector: String,
    pub unavailable_marker: String,
    pub currency_suffix: String,
    /// Every char in this string is stripped from price text.
    pub thousands_separators: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 10,
            wait_timeout: 10,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            chrome_path: None,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl ScraperConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://torob.com".to_string(),
            search_path: "/search/".to_string(),
            query_param: "query".to_string(),
            result_card_selector: "div.cards > div:nth-of-type(1) a".to_string(),
            price_selector: "div.price-credit-btn > div.price-credit > a.price".to_string(),
            show_more_selector: ".show-more-btn, .online-show-more-btn".to_string(),
            unavailable_marker: "ناموجود".to_string(),
            currency_suffix: "تومان".to_string(),
            thousands_separators: ",٬".to_string(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: "http://example.com/wp-json/custom/v1/update_product_prices".to_string(),
            request_timeout: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "torob_pricer=info,tower_http=info".to_string(),
            directory: None,
            file_prefix: "torob-pricer.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Layer built-in defaults, `<dir>/default`, `<dir>/<RUN_MODE>`, `<dir>/local`
    /// and `PRICER__*` environment variables, in that order.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let layer = |name: &str| {
            File::with_name(&config_dir.join(name).to_string_lossy()).required(false)
        };

        let s = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(layer("default"))
            .add_source(layer(&run_mode))
            .add_source(layer("local"))
            .add_source(Environment::with_prefix("PRICER").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.scraper.max_concurrent_jobs == 0 {
            return Err(ConfigError::Message("Scraper max_concurrent_jobs must be greater than 0".into()));
        }

        if self.scraper.wait_timeout == 0 {
            return Err(ConfigError::Message("Scraper wait_timeout must be greater than 0".into()));
        }

        if Url::parse(&self.site.base_url).is_err() {
            return Err(ConfigError::Message("Invalid site base_url format".into()));
        }

        let selectors = [
            ("result_card_selector", &self.site.result_card_selector),
            ("price_selector", &self.site.price_selector),
            ("show_more_selector", &self.site.show_more_selector),
        ];
        for (name, selector) in selectors {
            if selector.trim().is_empty() {
                return Err(ConfigError::Message(format!("Site {} must not be empty", name)));
            }
        }

        if self.site.unavailable_marker.is_empty() {
            return Err(ConfigError::Message("Site unavailable_marker must not be empty".into()));
        }

        if Url::parse(&self.webhook.url).is_err() {
            return Err(ConfigError::Message("Invalid webhook url format".into()));
        }

        if self.webhook.request_timeout == 0 {
            return Err(ConfigError::Message("Webhook request_timeout must be greater than 0".into()));
        }

        Ok(())
    }
}
