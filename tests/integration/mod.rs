// Shared fixtures for the integration suite.
//
// A scripted site stands in for the browser: every URL maps to canned markup,
// and each opened session is counted so tests can assert that rejected
// requests never reach the scraper.

pub mod webhook_tests;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use torob_pricer::{
    config::{ScraperConfig, SiteConfig, WebhookConfig},
    listing::search_url,
    web::{create_router, AppState},
    AppConfig, BatchOrchestrator, BrowserSession, HttpWebhook, PricingService, ScrapeError,
    SessionFactory,
};

#[derive(Default)]
pub struct ScriptedSite {
    pages: HashMap<String, String>,
    /// Markup swapped in after the show-more control is clicked.
    expanded: HashMap<String, String>,
    opened: AtomicUsize,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product whose search leads to a listing with `prices`.
    pub fn with_product(mut self, name: &str, slug: &str, prices: &[&str]) -> Self {
        let search = search_url(&SiteConfig::default(), name).unwrap();
        let listing = format!("https://torob.com/p/{}/", slug);

        self.pages.insert(search.to_string(), search_page(&format!("/p/{}/", slug)));
        self.pages.insert(listing, listing_page(prices, false));
        self
    }

    /// Like `with_product`, but the first render only shows `visible` until
    /// the show-more button is clicked.
    pub fn with_collapsed_product(mut self, name: &str, slug: &str, visible: &[&str], all: &[&str]) -> Self {
        let search = search_url(&SiteConfig::default(), name).unwrap();
        let listing = format!("https://torob.com/p/{}/", slug);

        self.pages.insert(search.to_string(), search_page(&format!("/p/{}/", slug)));
        self.pages.insert(listing.clone(), listing_page(visible, true));
        self.expanded.insert(listing, listing_page(all, false));
        self
    }

    /// Register a product whose search page never renders any result card.
    pub fn with_empty_search(mut self, name: &str) -> Self {
        let search = search_url(&SiteConfig::default(), name).unwrap();
        self.pages.insert(search.to_string(), "<html><body><p>loading</p></body></html>".into());
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

pub fn search_page(href: &str) -> String {
    format!(
        r#"<html><body><div class="cards"><div><a href="{}">first</a></div><div><a href="/p/other/">second</a></div></div></body></html>"#,
        href
    )
}

pub fn listing_page(prices: &[&str], collapsed: bool) -> String {
    let rows: String = prices
        .iter()
        .map(|p| {
            format!(
                r#"<div class="price-credit-btn"><div class="price-credit"><a class="price">{}</a></div></div>"#,
                p
            )
        })
        .collect();
    let button = if collapsed { r#"<button class="show-more-btn">more</button>"# } else { "" };
    format!("<html><body>{}{}</body></html>", rows, button)
}

struct ScriptedSession {
    site: Arc<ScriptedSite>,
    current: Mutex<Option<(String, String)>>,
}

impl ScriptedSession {
    fn matches(markup: &str, selector: &str) -> bool {
        let Ok(selector) = scraper::Selector::parse(selector) else {
            return false;
        };
        scraper::Html::parse_document(markup).select(&selector).next().is_some()
    }
}

impl BrowserSession for ScriptedSession {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        let markup = self.site.pages.get(url).cloned().ok_or_else(|| ScrapeError::Navigation {
            url: url.to_string(),
            message: "404".to_string(),
        })?;
        *self.current.lock().unwrap() = Some((url.to_string(), markup));
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        if Self::matches(&self.current_markup()?, selector) {
            Ok(())
        } else {
            Err(ScrapeError::SelectorTimeout { selector: selector.to_string(), timeout })
        }
    }

    fn click(&self, selector: &str) -> Result<bool, ScrapeError> {
        let mut current = self.current.lock().unwrap();
        let Some((url, markup)) = current.as_mut() else {
            return Ok(false);
        };
        if !Self::matches(markup, selector) {
            return Ok(false);
        }
        if let Some(expanded) = self.site.expanded.get(url.as_str()) {
            *markup = expanded.clone();
        }
        Ok(true)
    }

    fn current_markup(&self) -> Result<String, ScrapeError> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, markup)| markup.clone())
            .ok_or_else(|| ScrapeError::Browser("blank tab".to_string()))
    }
}

/// Hands out sessions over a shared scripted site.
pub struct ScriptedFactory(pub Arc<ScriptedSite>);

impl SessionFactory for ScriptedFactory {
    fn open(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            site: Arc::clone(&self.0),
            current: Mutex::new(None),
        }))
    }
}

pub fn get_test_config(webhook_url: &str) -> AppConfig {
    AppConfig {
        scraper: ScraperConfig {
            max_concurrent_jobs: 2,
            wait_timeout: 1,
            ..ScraperConfig::default()
        },
        webhook: WebhookConfig {
            url: webhook_url.to_string(),
            request_timeout: 5,
        },
        ..AppConfig::default()
    }
}

pub fn create_test_service(site: &Arc<ScriptedSite>, config: &AppConfig) -> anyhow::Result<PricingService> {
    let orchestrator = BatchOrchestrator::new(
        Arc::new(ScriptedFactory(Arc::clone(site))),
        &config.scraper,
        config.site.clone(),
    );
    let webhook = HttpWebhook::new(&config.webhook)?;
    Ok(PricingService::new(orchestrator, Arc::new(webhook)))
}

pub fn create_test_app(site: &Arc<ScriptedSite>, webhook_url: &str) -> anyhow::Result<Router> {
    let config = get_test_config(webhook_url);
    let service = create_test_service(site, &config)?;
    Ok(create_router(AppState {
        service: Arc::new(service),
        config: Arc::new(config),
    }))
}

pub async fn make_request(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> anyhow::Result<Response> {
    let mut request = Request::builder().method(method).uri(uri);

    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json)
        }
        None => Body::empty(),
    };

    Ok(app.oneshot(request.body(body)?).await?)
}

pub async fn read_json(response: Response) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
