// # dnsup-core
//
// Core library for the dnsup dynamic DNS updater.
//
// ## Architecture Overview
//
// This library owns the update scheduling and execution engine:
// - **IpResolver**: Trait for asking an external service for the public IP
// - **RecordUpdater**: Trait for pushing an IP to the DNS update endpoint
// - **UpdateOperation**: Resolve-then-update as one logical action
// - **Scheduler**: Idle/Running state machine with a single-flight guard
// - **EventSink**: Timestamped log lines for every step and transition
// - **SettingsStore**: Load/save contract for the persisted settings
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Network clients live in their own crates
// 2. **Single Flight**: At most one update runs at a time per scheduler
// 3. **Failures Are Observations**: A failed cycle is logged, never fatal
// 4. **Library-First**: GUIs and daemons are callers, not participants

pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod interval;
pub mod operation;
pub mod scheduler;
pub mod settings;
pub mod traits;

// Re-export core types for convenience
pub use config::{DnsupConfig, EventConfig, ResolverConfig, UpdaterConfig};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use events::{ChannelSink, EventSink, LogEntry, MemorySink};
pub use interval::Interval;
pub use operation::{UpdateOperation, UpdateResult};
pub use scheduler::{RunOutcome, Scheduler, SchedulerState};
pub use settings::{FileSettingsStore, MemorySettingsStore, Settings};
pub use traits::{IpResolver, RecordUpdater, SettingsStore};
