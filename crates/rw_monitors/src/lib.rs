pub mod cli;
pub mod insights;
pub mod logging;
pub mod manager;
pub mod monitors;
pub mod normalizer;

pub use cli::{handle_command, MonitorArgs, MonitorCommands};
pub use insights::InsightsHandler;
pub use manager::{format_alert, CycleReport, CycleState, MonitorManager};
pub use monitors::{all_monitors, monitors_for, MonitorType, SiteMonitor};
pub use normalizer::TitleNormalizer;

pub mod prelude {
    pub use super::monitors::{MonitorType, SiteMonitor};
    pub use super::{InsightsHandler, MonitorManager};
    pub use rw_core::{RawCandidate, Result, Error, Source};
}
