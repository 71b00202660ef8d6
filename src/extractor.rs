use scraper::{Html, Selector};
use std::time::Duration;

use crate::browser::BrowserSession;
use crate::config::SiteConfig;
use crate::digits::normalize_digits;
use crate::utils::error::ScrapeError;

/// Expand the seller list on the loaded listing page and read every price from it.
///
/// An empty result is not an error here; the aggregator decides what that means.
pub fn extract_prices(
    session: &dyn BrowserSession,
    site: &SiteConfig,
    timeout: Duration,
) -> Result<Vec<u64>, ScrapeError> {
    if session.click(&site.show_more_selector)? {
        tracing::debug!("Expanded price list");
        session.wait_for_selector(&site.price_selector, timeout)?;
    }

    let markup = session.current_markup()?;
    parse_price_list(&markup, site)
}

/// Prices in document order, skipping entries marked unavailable.
pub fn parse_price_list(markup: &str, site: &SiteConfig) -> Result<Vec<u64>, ScrapeError> {
    let selector = Selector::parse(&site.price_selector).map_err(|_| ScrapeError::InvalidSelector {
        selector: site.price_selector.clone(),
    })?;

    let document = Html::parse_document(markup);
    let mut prices = Vec::new();

    for element in document.select(&selector) {
        let text = element.text().collect::<String>();
        if text.contains(&site.unavailable_marker) {
            continue;
        }
        prices.push(parse_price_text(&text, site)?);
    }

    Ok(prices)
}

/// Turn one scraped price label such as `"۱۲۵,۰۰۰ تومان"` into `125000`.
pub fn parse_price_text(text: &str, site: &SiteConfig) -> Result<u64, ScrapeError> {
    let stripped: String = text
        .replace(&site.currency_suffix, "")
        .chars()
        .filter(|c| !site.thousands_separators.contains(*c))
        .collect();

    normalize_digits(&stripped)
        .trim()
        .parse::<u64>()
        .map_err(|_| ScrapeError::PriceParse {
            text: text.trim().to_string(),
        })
}
