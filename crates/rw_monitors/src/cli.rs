use clap::{Args, Subcommand};
use rw_core::{ArticleId, PageFetcher, Result};
use rw_storage::Stores;

use crate::monitors::{all_monitors, monitors_for};
use crate::normalizer::TitleNormalizer;

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(subcommand)]
    pub command: MonitorCommands,
}

#[derive(Subcommand, Debug)]
pub enum MonitorCommands {
    /// List available monitors
    List,
    /// Fetch a listing and show what a cycle would notify, without marking anything
    Check {
        /// Monitor to check (e.g. admis); all when omitted
        source: Option<String>,
    },
}

pub async fn handle_command(args: MonitorArgs, pages: &dyn PageFetcher, stores: &Stores) -> Result<()> {
    match args.command {
        MonitorCommands::List => {
            println!("Available monitors:");
            for monitor in all_monitors() {
                let source = monitor.source();
                println!("  {} {:<6} {} ({})", source.emoji(), source.cli_name(), source.name(), monitor.listing_url());
            }
        }
        MonitorCommands::Check { source } => {
            let normalizer = TitleNormalizer::new();
            for monitor in monitors_for(source.as_deref())? {
                let source = monitor.source();
                let seen = stores.seen_for(source)?;
                let candidates = monitor.fetch_listing(pages).await;
                println!("{} {}: {} candidates", source.emoji(), source.name(), candidates.len());

                for candidate in candidates {
                    let Some(url) = monitor.resolve_url(&candidate) else {
                        println!("  ⚠️ unusable href {:?}", candidate.href);
                        continue;
                    };
                    let id = ArticleId::derive(source, &url);
                    let marker = if seen.contains(&id).await { "⏭️" } else { "🆕" };
                    let date = if candidate.date_text.is_empty() { "-" } else { candidate.date_text.as_str() };
                    println!("  {} {} [{}] {} - {}", marker, id, date, normalizer.normalize(&candidate.title), url);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rw_core::{Error, FetchedPage, Source};
    use rw_storage::{create_stores, StorageKind};

    struct Offline;

    #[async_trait]
    impl PageFetcher for Offline {
        async fn get(&self, url: &str) -> Result<FetchedPage> {
            Err(Error::Fetch(format!("offline: {}", url)))
        }
    }

    fn stores() -> Stores {
        create_stores(StorageKind::Memory, std::path::Path::new("."), &Source::ALL)
    }

    #[tokio::test]
    async fn test_list_and_check() {
        let stores = stores();
        let list = MonitorArgs { command: MonitorCommands::List };
        assert!(handle_command(list, &Offline, &stores).await.is_ok());

        let check = MonitorArgs {
            command: MonitorCommands::Check { source: Some("saxo".to_string()) },
        };
        assert!(handle_command(check, &Offline, &stores).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_unknown_source() {
        let check = MonitorArgs {
            command: MonitorCommands::Check { source: Some("bloomberg".to_string()) },
        };
        let result = handle_command(check, &Offline, &stores()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
