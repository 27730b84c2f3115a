pub mod supervisor;

pub use supervisor::{BotStatus, MonitorSupervisor, StartOutcome, StopOutcome};
