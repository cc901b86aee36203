use std::collections::HashSet;

use lazy_static::lazy_static;
use rw_core::{RawCandidate, Source};
use scraper::{Html, Selector};

use super::utils::element_text;
use super::SiteMonitor;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href]").expect("link selector");
}

/// Saxo insights: any link into the articles section with a real title.
#[derive(Debug, Clone, Default)]
pub struct SaxoMonitor;

impl SaxoMonitor {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://www.home.saxo";
    const LISTING_URL: &'static str = "https://www.home.saxo/insights";
    const ARTICLE_PATH: &'static str = "/content/articles/";
    const MIN_TITLE_CHARS: usize = 5;
}

impl SiteMonitor for SaxoMonitor {
    fn source(&self) -> Source {
        Source::Saxo
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn listing_url(&self) -> &'static str {
        Self::LISTING_URL
    }

    fn parse_listing(&self, document: &Html) -> Vec<RawCandidate> {
        let mut hrefs = HashSet::new();
        let mut candidates = Vec::new();
        for link in document.select(&LINK) {
            let href = link.value().attr("href").unwrap_or_default().trim();
            if !href.contains(Self::ARTICLE_PATH) {
                continue;
            }
            let title = element_text(&link);
            if title.chars().count() < Self::MIN_TITLE_CHARS {
                continue;
            }
            // Cards link the same article from the image and the headline.
            if !hrefs.insert(href.to_string()) {
                continue;
            }
            candidates.push(RawCandidate {
                title,
                href: href.to_string(),
                date_text: String::new(),
                source: self.source(),
            });
        }
        candidates
    }
}
