use rw_core::{Error, PageFetcher, RawCandidate, Result, Source};
use scraper::Html;
use tracing::{debug, error};

pub mod admis;
pub mod saxo;

pub use admis::AdmisMonitor;
pub use saxo::SaxoMonitor;

/// Per-site listing rules. Implementations only parse; fetching is shared.
pub trait SiteMonitor: Send + Sync {
    fn source(&self) -> Source;

    /// Base that relative hrefs are resolved against.
    fn base_url(&self) -> &'static str;

    fn listing_url(&self) -> &'static str;

    /// Extracts candidate articles from the listing page.
    fn parse_listing(&self, document: &Html) -> Vec<RawCandidate>;
}

/// Enum that holds all monitor variants
#[derive(Debug, Clone)]
pub enum MonitorType {
    Admis(AdmisMonitor),
    Saxo(SaxoMonitor),
}

impl MonitorType {
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Admis => MonitorType::Admis(AdmisMonitor::new()),
            Source::Saxo => MonitorType::Saxo(SaxoMonitor::new()),
        }
    }

    fn inner(&self) -> &dyn SiteMonitor {
        match self {
            MonitorType::Admis(m) => m,
            MonitorType::Saxo(m) => m,
        }
    }

    pub fn source(&self) -> Source {
        self.inner().source()
    }

    pub fn listing_url(&self) -> &'static str {
        self.inner().listing_url()
    }

    pub fn parse_html(&self, html: &str) -> Vec<RawCandidate> {
        let document = Html::parse_document(html);
        self.inner().parse_listing(&document)
    }

    /// Absolute URL for a candidate, or `None` when the href is unusable.
    pub fn resolve_url(&self, candidate: &RawCandidate) -> Option<String> {
        utils::resolve_href(self.inner().base_url(), &candidate.href)
    }

    async fn try_fetch_listing(&self, pages: &dyn PageFetcher) -> Result<Vec<RawCandidate>> {
        let url = self.listing_url();
        let page = pages.get(url).await?;
        if !page.is_success() {
            return Err(Error::Fetch(format!("HTTP {} for {}", page.status, url)));
        }
        let candidates = self.parse_html(&page.text());
        debug!("{} candidates on {}", candidates.len(), url);
        Ok(candidates)
    }

    /// Fetches and parses the listing. Failures are logged and yield no candidates.
    pub async fn fetch_listing(&self, pages: &dyn PageFetcher) -> Vec<RawCandidate> {
        match self.try_fetch_listing(pages).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Failed to fetch {} listing: {}", self.source(), e);
                Vec::new()
            }
        }
    }
}

pub fn all_monitors() -> Vec<MonitorType> {
    Source::ALL.into_iter().map(MonitorType::for_source).collect()
}

/// All monitors, or the one named on the command line.
pub fn monitors_for(name: Option<&str>) -> Result<Vec<MonitorType>> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => Ok(all_monitors()),
        Some(name) => Source::from_cli_name(name)
            .map(|source| vec![MonitorType::for_source(source)])
            .ok_or_else(|| {
                let available: Vec<&str> = Source::ALL.iter().map(|s| s.cli_name()).collect();
                Error::Config(format!("Unknown monitor: {}. Available: {}", name, available.join(", ")))
            }),
    }
}

/// Common utilities for monitors
pub(crate) mod utils {
    use scraper::ElementRef;
    use url::Url;

    use crate::normalizer::collapse_whitespace;

    pub fn element_text(element: &ElementRef<'_>) -> String {
        collapse_whitespace(&element.text().collect::<String>())
    }

    pub fn resolve_href(base: &str, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let lowered = href.to_ascii_lowercase();
        if lowered.starts_with("javascript:") || lowered.starts_with("mailto:") {
            return None;
        }
        let base = Url::parse(base).ok()?;
        let mut url = base.join(href).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        url.set_fragment(None);
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rw_core::FetchedPage;

    struct FailingPages;

    #[async_trait]
    impl PageFetcher for FailingPages {
        async fn get(&self, url: &str) -> Result<FetchedPage> {
            Err(Error::Fetch(format!("timed out: {}", url)))
        }
    }

    struct StatusPages(u16);

    #[async_trait]
    impl PageFetcher for StatusPages {
        async fn get(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: self.0,
                content_type: None,
                body: b"<h3><a href=\"/x\">Title here</a></h3>".to_vec(),
            })
        }
    }

    #[test]
    fn test_resolve_href() {
        let base = "https://www.admis.com";
        assert_eq!(
            utils::resolve_href(base, "/market-information/a/").as_deref(),
            Some("https://www.admis.com/market-information/a/")
        );
        assert_eq!(
            utils::resolve_href(base, "https://other.example/b#top").as_deref(),
            Some("https://other.example/b")
        );
        assert_eq!(utils::resolve_href(base, "  ").as_deref(), None);
        assert_eq!(utils::resolve_href(base, "#section").as_deref(), None);
        assert_eq!(utils::resolve_href(base, "javascript:void(0)").as_deref(), None);
        assert_eq!(utils::resolve_href(base, "mailto:desk@admis.com").as_deref(), None);
        assert_eq!(utils::resolve_href(base, "ftp://files.example/x").as_deref(), None);
    }

    #[test]
    fn test_monitors_for() {
        assert_eq!(monitors_for(None).unwrap().len(), 2);
        assert_eq!(monitors_for(Some("")).unwrap().len(), 2);
        let saxo = monitors_for(Some("saxo")).unwrap();
        assert_eq!(saxo.len(), 1);
        assert_eq!(saxo[0].source(), Source::Saxo);
        assert!(matches!(monitors_for(Some("reuters")), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_listing() {
        for monitor in all_monitors() {
            assert!(monitor.fetch_listing(&FailingPages).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_error_status_yields_empty_listing() {
        let monitor = MonitorType::for_source(Source::Admis);
        assert!(monitor.fetch_listing(&StatusPages(503)).await.is_empty());
        assert_eq!(monitor.fetch_listing(&StatusPages(200)).await.len(), 1);
    }
}
