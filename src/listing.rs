use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use crate::browser::BrowserSession;
use crate::config::SiteConfig;
use crate::utils::error::ScrapeError;

/// Build the site search URL for a free-text product query.
pub fn search_url(site: &SiteConfig, query: &str) -> Result<Url, ScrapeError> {
    let mut url = site_url(site, &site.search_path)?;
    url.query_pairs_mut().append_pair(&site.query_param, query);
    Ok(url)
}

/// Search for `product_name` and leave `session` on the first result's detail page.
///
/// Always takes the first result card in document order.
pub fn resolve_listing(
    session: &dyn BrowserSession,
    site: &SiteConfig,
    product_name: &str,
    timeout: Duration,
) -> Result<Url, ScrapeError> {
    let search = search_url(site, product_name)?;
    tracing::debug!(url = %search, "Searching for product");

    session.navigate(search.as_str())?;
    session.wait_for_selector(&site.result_card_selector, timeout)?;

    let markup = session.current_markup()?;
    let href = first_result_link(&markup, &site.result_card_selector)?;
    let detail = site_url(site, &href)?;

    tracing::debug!(url = %detail, "Opening product listing");
    session.navigate(detail.as_str())?;
    Ok(detail)
}

/// `href` of the first element matching `card_selector`.
pub fn first_result_link(markup: &str, card_selector: &str) -> Result<String, ScrapeError> {
    let selector = Selector::parse(card_selector).map_err(|_| ScrapeError::InvalidSelector {
        selector: card_selector.to_string(),
    })?;

    let document = Html::parse_document(markup);
    document
        .select(&selector)
        .next()
        .and_then(|card| card.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::MissingLink {
            selector: card_selector.to_string(),
        })
}

fn site_url(site: &SiteConfig, path: &str) -> Result<Url, ScrapeError> {
    let invalid = |message: String| ScrapeError::InvalidUrl {
        url: path.to_string(),
        message,
    };
    let base = Url::parse(&site.base_url).map_err(|e| invalid(e.to_string()))?;
    base.join(path).map_err(|e| invalid(e.to_string()))
}
