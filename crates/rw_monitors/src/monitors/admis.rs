use lazy_static::lazy_static;
use rw_core::{RawCandidate, Source};
use scraper::{ElementRef, Html, Selector};

use super::utils::element_text;
use super::SiteMonitor;

lazy_static! {
    static ref HEADING: Selector = Selector::parse("h3").expect("h3 selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("link selector");
}

/// ADMIS written commentary: each entry is an `h3` link followed by a date paragraph.
#[derive(Debug, Clone, Default)]
pub struct AdmisMonitor;

impl AdmisMonitor {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://www.admis.com";
    const LISTING_URL: &'static str = "https://www.admis.com/market-information/written-commentary/";

    /// Text of the first `p` after the heading, stopping at the next entry.
    fn date_after(heading: &ElementRef<'_>) -> String {
        for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
            match sibling.value().name() {
                "p" => return element_text(&sibling),
                "h3" => break,
                _ => continue,
            }
        }
        String::new()
    }
}

impl SiteMonitor for AdmisMonitor {
    fn source(&self) -> Source {
        Source::Admis
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn listing_url(&self) -> &'static str {
        Self::LISTING_URL
    }

    fn parse_listing(&self, document: &Html) -> Vec<RawCandidate> {
        let mut candidates = Vec::new();
        for heading in document.select(&HEADING) {
            let Some(link) = heading.select(&LINK).next() else {
                continue;
            };
            let title = element_text(&link);
            let href = link.value().attr("href").unwrap_or_default().trim().to_string();
            if title.is_empty() || href.is_empty() {
                continue;
            }
            candidates.push(RawCandidate {
                title,
                href,
                date_text: Self::date_after(&heading),
                source: self.source(),
            });
        }
        candidates
    }
}
