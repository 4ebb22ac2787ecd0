//! Background host availability scanner.
//!
//! Periodically probes every configured target host and caches the results
//! so that callers read a snapshot instead of waiting on the network. Probes
//! run concurrently but capped, so a rack of dead hosts cannot pile up
//! hundreds of pending connections.
//!
//! Reachability and filesystem state are separate facts: a host that answers
//! the probe stays `accessible` even when its share or app root is missing.

pub mod probe;
pub mod scanner;

pub use probe::{Prober, TcpProber};
pub use scanner::{HostScanner, ScanConfig, ScanSnapshot};
