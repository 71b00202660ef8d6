use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::utils::error::ScrapeError;

/// The slice of browser behaviour the pipeline needs.
///
/// A session is opened per job and released when dropped, whichever way the
/// job ends.
pub trait BrowserSession: Send {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError>;

    /// Block until `selector` matches something in the rendered DOM.
    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Client-side click on the first element matching `selector`.
    /// Returns `false` when nothing matched.
    fn click(&self, selector: &str) -> Result<bool, ScrapeError>;

    fn current_markup(&self) -> Result<String, ScrapeError>;
}

pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

/// Launches a dedicated headless Chrome process for every session.
pub struct ChromeSessionFactory {
    config: ScraperConfig,
}

impl ChromeSessionFactory {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, ScrapeError> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .window_size(Some((self.config.window_width, self.config.window_height)))
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| ScrapeError::Launch(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &self.config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Ok(launch_options)
    }
}

impl SessionFactory for ChromeSessionFactory {
    fn open(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let browser = Browser::new(self.launch_options()?)
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::Launch(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&self.config.user_agent, None, None)
            .map_err(|e| ScrapeError::Browser(format!("Failed to set user agent: {}", e)))?;
        tab.set_default_timeout(self.config.wait_timeout());

        tracing::debug!("Launched headless browser session");
        Ok(Box::new(ChromeSession { tab, _browser: browser }))
    }
}

pub struct ChromeSession {
    // Field order matters: the tab is closed before the browser process goes away.
    tab: Arc<Tab>,
    _browser: Browser,
}

impl BrowserSession for ChromeSession {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| {
                tracing::debug!(selector, error = %e, "Selector wait failed");
                ScrapeError::SelectorTimeout {
                    selector: selector.to_string(),
                    timeout,
                }
            })
    }

    fn click(&self, selector: &str) -> Result<bool, ScrapeError> {
        let literal = serde_json::to_string(selector)
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        let js_code = format!(
            r#"
            (function() {{
                const el = document.querySelector({});
                if (!el) {{
                    return false;
                }}
                el.click();
                return true;
            }})()
            "#,
            literal
        );

        let result = self
            .tab
            .evaluate(&js_code, false)
            .map_err(|e| ScrapeError::Browser(format!("Click on '{}' failed: {}", selector, e)))?;

        Ok(matches!(result.value, Some(serde_json::Value::Bool(true))))
    }

    fn current_markup(&self) -> Result<String, ScrapeError> {
        self.tab
            .get_content()
            .map_err(|e| ScrapeError::Browser(format!("Failed to get page content: {}", e)))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // The browser process is killed when `Browser` drops right after this.
        if let Err(e) = self.tab.close(true) {
            tracing::debug!(error = %e, "Tab close failed during session teardown");
        }
    }
}
