//! Rabin-Karp substring search over pluggable hash families.
//!
//! The engine hashes the pattern once, slides a window across the text and
//! only compares characters when the digests agree. Families with an
//! incremental form ([`rolling_hash::RollingStrategy`]) update the window
//! digest in O(1); the rest rehash every window.

pub mod hash;
pub mod report;
pub mod rolling_hash;
pub mod search;
pub mod sweep;
pub mod util;

pub use hash::{HashFamily, Method, ParseMethodError, Symbol};
pub use search::{SearchEngine, SearchOutcome, SearchStats};
pub use sweep::{sweep, Measurement, SweepConfig};
