use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rw_core::notify::escape_html;
use rw_core::types::parse_date_text;
use rw_core::{
    ArticleId, ArticleRecord, ArticleRegistry, CallbackPayload, ChatId, ChatTransport, Error, InlineButton,
    PageFetcher, Result, SeenStore,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::logging::Logger;
use crate::monitors::MonitorType;
use crate::normalizer::TitleNormalizer;

pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Validates a retention window given in days.
pub fn retention_window(days: i64) -> Result<Duration> {
    if days <= 0 {
        return Err(Error::Config("--retention-days must be positive".to_string()));
    }
    Duration::try_days(days)
        .filter(|window| Utc::now().checked_sub_signed(*window).is_some())
        .ok_or_else(|| Error::Config(format!("--retention-days {} is out of range", days)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CycleState {
    Idle = 0,
    Scraping = 1,
    Diffing = 2,
    Notifying = 3,
}

impl CycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Scraping,
            2 => Self::Diffing,
            3 => Self::Notifying,
            _ => Self::Idle,
        }
    }
}

/// What one cycle did, summed over all monitors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub candidates: usize,
    pub new_articles: usize,
    pub notified: usize,
    pub failed: usize,
    pub evicted: usize,
    /// Set when another cycle was still running and nothing was done.
    pub skipped: bool,
}

struct MonitorSlot {
    monitor: MonitorType,
    seen: Arc<dyn SeenStore>,
}

pub struct MonitorManager {
    slots: Vec<MonitorSlot>,
    registry: Arc<dyn ArticleRegistry>,
    pages: Arc<dyn PageFetcher>,
    transport: Arc<dyn ChatTransport>,
    chat_id: ChatId,
    normalizer: TitleNormalizer,
    retention: Duration,
    state: AtomicU8,
    in_flight: Mutex<()>,
}

impl MonitorManager {
    pub fn new(
        registry: Arc<dyn ArticleRegistry>,
        pages: Arc<dyn PageFetcher>,
        transport: Arc<dyn ChatTransport>,
        chat_id: ChatId,
    ) -> Self {
        Self {
            slots: Vec::new(),
            registry,
            pages,
            transport,
            chat_id,
            normalizer: TitleNormalizer::new(),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
            state: AtomicU8::new(CycleState::Idle as u8),
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn add_monitor(&mut self, monitor: MonitorType, seen: Arc<dyn SeenStore>) {
        self.slots.push(MonitorSlot { monitor, seen });
    }

    pub fn monitor_count(&self) -> usize {
        self.slots.len()
    }

    pub fn state(&self) -> CycleState {
        CycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: CycleState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Runs every monitor once. Never fails: per-article and per-monitor
    /// errors are logged and counted in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("⏭️ Previous cycle still running, skipping this tick");
            return CycleReport {
                skipped: true,
                ..CycleReport::default()
            };
        };

        let now = Utc::now();
        let mut report = CycleReport::default();

        match self.registry.evict_older_than(self.retention, now).await {
            Ok(0) => {}
            Ok(evicted) => {
                info!("🧹 Evicted {} expired articles", evicted);
                report.evicted = evicted;
            }
            Err(e) => warn!("Failed to evict expired articles: {}", e),
        }

        for slot in &self.slots {
            self.run_monitor(slot, now, &mut report).await;
        }
        self.set_state(CycleState::Idle);

        info!(
            "✅ Cycle done: {} candidates, {} new, {} notified, {} failed",
            report.candidates, report.new_articles, report.notified, report.failed
        );
        report
    }

    async fn run_monitor(&self, slot: &MonitorSlot, now: DateTime<Utc>, report: &mut CycleReport) {
        let source = slot.monitor.source();
        let logger = Logger::new()
            .with_prefix(source.emoji().to_string())
            .with_prefix(format!("[{}]", source.name()));

        self.set_state(CycleState::Scraping);
        let candidates = slot.monitor.fetch_listing(self.pages.as_ref()).await;
        report.candidates += candidates.len();
        logger.debug(&format!("{} candidates", candidates.len()));

        self.set_state(CycleState::Diffing);
        let mut batch = HashSet::new();
        let mut fresh = Vec::new();
        for candidate in candidates {
            let Some(url) = slot.monitor.resolve_url(&candidate) else {
                logger.debug(&format!("Skipping unusable href {:?}", candidate.href));
                continue;
            };
            let id = ArticleId::derive(source, &url);
            if slot.seen.contains(&id).await || !batch.insert(id.clone()) {
                continue;
            }
            let mut record = ArticleRecord {
                title: self.normalizer.normalize(&candidate.title),
                url,
                published_at: parse_date_text(&candidate.date_text),
                date_text: candidate.date_text,
                source,
                discovered_at: now,
            };
            // A registered id keeps its first sighting so the retention clock never restarts.
            if let Ok(existing) = self.registry.resolve(&id).await {
                record.discovered_at = existing.discovered_at;
            }
            fresh.push((id, record));
        }
        report.new_articles += fresh.len();
        if fresh.is_empty() {
            logger.debug("Nothing new");
            return;
        }
        logger.info(&format!("🆕 {} new articles", fresh.len()));

        self.set_state(CycleState::Notifying);
        for (id, record) in fresh {
            match self.deliver(slot.seen.as_ref(), &id, &record).await {
                Ok(()) => {
                    report.notified += 1;
                    logger.info(&format!("📨 Sent: {}", record.title));
                }
                Err(e) => {
                    report.failed += 1;
                    logger.error(&format!("Failed to deliver {}: {}", record.url, e));
                }
            }
        }
    }

    /// Persists before sending, so a storage failure never leaves an alert
    /// whose button cannot be resolved.
    async fn deliver(&self, seen: &dyn SeenStore, id: &ArticleId, record: &ArticleRecord) -> Result<()> {
        self.registry.register(id, record).await?;
        seen.mark_seen(id).await?;
        let button = InlineButton::load_insights(&CallbackPayload::new(id.clone()));
        self.transport
            .send_message(self.chat_id, &format_alert(record), Some(&button))
            .await?;
        Ok(())
    }
}

pub fn format_alert(record: &ArticleRecord) -> String {
    format!(
        "📌 <b>New research from {}</b>\n\
         📅 {}\n\
         📰 Title: {}\n\
         🔗 <a href=\"{}\">Read the original</a>\n\n\
         ⬇️ Click below for a concise analysis:",
        escape_html(record.source.name()),
        escape_html(&record.display_date()),
        escape_html(&record.title),
        escape_html(&record.url),
    )
}
