use std::sync::Arc;
use std::time::Duration;

use rw_core::{ChatId, ChatTransport, Error, MessageId, Result};
use rw_monitors::{InsightsHandler, MonitorManager};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::telegram::{TelegramTransport, Update};

pub const START_REPLY: &str = "Bot is running. I will notify you of new research articles.";
pub const UNAUTHORIZED_REPLY: &str = "Unauthorized.";

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// What to do with one incoming update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start {
        chat_id: ChatId,
        authorized: bool,
    },
    /// Always answered; `target` is set only for the operator's presses.
    Callback {
        query_id: String,
        target: Option<(ChatId, MessageId, String)>,
    },
    Ignore,
}

fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|cmd| cmd == "/start" || cmd.starts_with("/start@"))
        .unwrap_or(false)
}

pub fn classify(update: &Update, admin_id: ChatId) -> Action {
    if let Some(query) = &update.callback_query {
        let target = match (&query.message, &query.data) {
            (Some(message), Some(data)) if query.from.id == admin_id => {
                Some((message.chat.id, message.message_id, data.clone()))
            }
            _ => None,
        };
        return Action::Callback {
            query_id: query.id.clone(),
            target,
        };
    }

    if let Some(message) = &update.message {
        if message.text.as_deref().map(is_start_command).unwrap_or(false) {
            let authorized = message.from.as_ref().map(|u| u.id == admin_id).unwrap_or(false);
            return Action::Start {
                chat_id: message.chat.id,
                authorized,
            };
        }
    }
    Action::Ignore
}

/// Acknowledges everything in `updates` on the next poll.
pub fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .fold(current, i64::max)
}

/// First offset to poll once the backlog up to `latest` is dropped.
pub fn resume_offset(latest: Option<i64>) -> i64 {
    latest.map(|id| id + 1).unwrap_or(0)
}

pub struct Bot {
    telegram: Arc<TelegramTransport>,
    insights: Arc<InsightsHandler>,
    admin_id: ChatId,
}

impl Bot {
    pub fn new(telegram: Arc<TelegramTransport>, insights: Arc<InsightsHandler>, admin_id: ChatId) -> Self {
        Self {
            telegram,
            insights,
            admin_id,
        }
    }

    /// Offset that skips presses queued while the bot was down.
    async fn starting_offset(&self) -> i64 {
        match self.telegram.latest_update_id().await {
            Ok(latest) => {
                if let Some(id) = latest {
                    info!("⏭️ Skipping updates up to {}", id);
                }
                resume_offset(latest)
            }
            Err(e) => {
                warn!("Could not skip pending updates: {}", e);
                0
            }
        }
    }

    /// Long-polls forever; transport errors are logged and retried.
    pub async fn poll(&self) {
        let mut offset = self.starting_offset().await;
        loop {
            match self.telegram.get_updates(offset).await {
                Ok(updates) => {
                    offset = next_offset(offset, &updates);
                    for update in updates {
                        self.dispatch(update).await;
                    }
                }
                Err(e) => {
                    warn!("Polling failed: {}", e);
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn dispatch(&self, update: Update) {
        match classify(&update, self.admin_id) {
            Action::Start { chat_id, authorized } => {
                let reply = if authorized { START_REPLY } else { UNAUTHORIZED_REPLY };
                if !authorized {
                    warn!("Rejected /start from chat {}", chat_id);
                }
                if let Err(e) = self.telegram.send_message(chat_id, reply, None).await {
                    error!("Failed to answer /start: {}", e);
                }
            }
            Action::Callback { query_id, target } => {
                if let Err(e) = self.telegram.answer_callback_query(&query_id).await {
                    warn!("Failed to answer callback {}: {}", query_id, e);
                }
                let Some((chat_id, message_id, data)) = target else {
                    debug!("Ignoring callback {} from a non-operator", query_id);
                    return;
                };
                // Summaries take seconds; polling continues meanwhile.
                let insights = self.insights.clone();
                tokio::spawn(async move {
                    if !insights.handle(chat_id, message_id, &data).await {
                        debug!("Ignoring callback payload {:?}", data);
                    }
                });
            }
            Action::Ignore => {}
        }
    }
}

/// Runs a cycle on every tick. Each tick awaits its cycle, so cycles never overlap.
pub async fn run_scheduler(manager: Arc<MonitorManager>, first_delay: Duration, every: Duration) {
    let mut ticker = interval_at(Instant::now() + first_delay, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let report = manager.run_cycle().await;
        debug!("Cycle report: {:?}", report);
    }
}

pub async fn run(bot: Bot, manager: Arc<MonitorManager>, first_delay: Duration, every: Duration) -> Result<()> {
    info!(
        "🚀 Watching {} sources every {}s (first check in {}s)",
        manager.monitor_count(),
        every.as_secs(),
        first_delay.as_secs()
    );
    tokio::select! {
        _ = bot.poll() => {}
        _ = run_scheduler(manager, first_delay, every) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(Error::Io)?;
            info!("🛑 Shutting down");
        }
    }
    Ok(())
}
