//! Framework Hub client
//!
//! Resource clients that run each operation against the remote REST API
//! when it is reachable and against a local fallback store otherwise.
//!
//! ```text
//! caller -> BuildLogClient / GeneratedCodeClient / StatsClient
//!             |
//!             +-- BackendSelector (probe per call, per session, or never)
//!             |
//!             +-- Remote: RemoteApi (reqwest)
//!             +-- Local:  LocalStore (KeyValueStore: SQLite or memory)
//! ```
//!
//! The two stores are independent. Records written in one mode are not
//! visible in the other.

pub mod build_logs;
mod dual;
pub mod generated_code;
pub mod health;
pub mod hub;
pub mod jenkins;
pub mod remote;
pub mod selector;
pub mod stats;

pub use build_logs::BuildLogClient;
pub use generated_code::GeneratedCodeClient;
pub use health::HealthProber;
pub use hub::Hub;
pub use jenkins::{JenkinsClient, TriggerAck, TriggerWarning};
pub use remote::RemoteApi;
pub use selector::{BackendSelector, FixedSelector, Mode, PerCallSelector, SessionSelector};
pub use stats::StatsClient;
