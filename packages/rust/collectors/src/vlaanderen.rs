//! vlaanderen.be publication collector.
//!
//! The portal lists annual reports at
//! `/publicaties?type.CONTAINS_ANY=jaarverslag&offset=N`. Each listing entry
//! links to a publication page whose first `<h1>` names the organisation and
//! which links to the report document.

use std::collections::HashSet;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use jaarverslag_shared::{
    CollectedPair, FetchOptions, JaarverslagError, Result, VlaanderenConfig,
};

use crate::SourceCollector;

/// User-Agent string for portal requests.
const USER_AGENT: &str = concat!("jaarverslag/", env!("CARGO_PKG_VERSION"));

/// Publication type filter on the listing pages.
const PUBLICATION_TYPE: &str = "jaarverslag";

/// Anchor used when a publication page has no `.pdf` link.
const FALLBACK_ANCHOR_INDEX: usize = 6;

/// Collects annual-report links from vlaanderen.be.
pub struct VlaanderenCollector {
    client: Client,
    base_url: Url,
    listing_pages: u32,
}

impl VlaanderenCollector {
    /// Create a collector for the configured portal.
    pub fn new(config: &VlaanderenConfig, opts: &FetchOptions) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            JaarverslagError::config(format!("invalid vlaanderen.base_url '{}': {e}", config.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(opts.max_redirects))
            .timeout(opts.timeout)
            .build()
            .map_err(|e| JaarverslagError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            listing_pages: config.listing_pages,
        })
    }

    /// URL of the listing page at `offset`.
    fn listing_url(&self, offset: u32) -> Result<Url> {
        let mut url = self
            .base_url
            .join("/publicaties")
            .map_err(|e| JaarverslagError::config(format!("cannot build listing url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("type.CONTAINS_ANY", PUBLICATION_TYPE)
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    async fn get_html(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| JaarverslagError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JaarverslagError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| JaarverslagError::Network(format!("{url}: body read failed: {e}")))
    }
}

impl SourceCollector for VlaanderenCollector {
    fn name(&self) -> &str {
        "vlaanderen"
    }

    /// Walk every listing page, then every publication it links to.
    ///
    /// A listing page failure aborts the collection; a failing publication
    /// page is skipped.
    #[instrument(skip_all, fields(base_url = %self.base_url, listing_pages = self.listing_pages))]
    async fn collect(&self) -> Result<Vec<CollectedPair>> {
        let mut pairs = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for offset in 0..self.listing_pages {
            let listing_url = self.listing_url(offset)?;
            let html = self.get_html(&listing_url).await?;
            let links = parse_listing(&html, &listing_url);
            debug!(offset, links = links.len(), "listing page parsed");

            for link in links {
                if !seen.insert(link.to_string()) {
                    continue;
                }

                match self.get_html(&link).await {
                    Ok(html) => match parse_publication(&html, &link) {
                        Some(pair) => {
                            debug!(name = %pair.organisation_name, url = %pair.url, "publication collected");
                            pairs.push(pair);
                        }
                        None => warn!(%link, "publication page has no name or document link"),
                    },
                    Err(e) => warn!(%link, error = %e, "publication page unavailable, skipping"),
                }
            }
        }

        info!(pairs = pairs.len(), "vlaanderen collection completed");
        Ok(pairs)
    }
}

// ---------------------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------------------

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Publication page links on a listing page, resolved against `page_url`.
pub fn parse_listing(html: &str, page_url: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let link_sel = selector("a.vl-spotlight__link-wrapper.vl-link[href]");

    doc.select(&link_sel)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| page_url.join(href.trim()).ok())
        .collect()
}

/// Organisation name and document link from a publication page.
///
/// The name is the first `<h1>`. The document is the first link whose path
/// ends in `.pdf`; pages without one fall back to the seventh anchor, which
/// is where the portal's layout puts the download button.
pub fn parse_publication(html: &str, page_url: &Url) -> Option<CollectedPair> {
    let doc = Html::parse_document(html);

    let h1_sel = selector("h1");
    let name = doc
        .select(&h1_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())?;

    let anchor_sel = selector("a");
    let anchors: Vec<_> = doc.select(&anchor_sel).collect();

    let pdf_link = anchors
        .iter()
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| page_url.join(href.trim()).ok())
        .find(|url| url.path().to_ascii_lowercase().ends_with(".pdf"));

    let document_url = match pdf_link {
        Some(url) => url,
        None => {
            let href = anchors.get(FALLBACK_ANCHOR_INDEX)?.value().attr("href")?;
            page_url.join(href.trim()).ok()?
        }
    };

    Some(CollectedPair::new(name, document_url.to_string()))
}
