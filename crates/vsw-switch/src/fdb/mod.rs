//! Forwarding database (MAC learning) for the virtual switch.
//!
//! Entries map a [`MacFingerprint`](vsw_types::MacFingerprint) to the port
//! that last presented it as a source address. Entries are created on first
//! observation and never aged out; they live as long as the switch.

mod table;
mod types;

pub use table::MacLearningTable;
pub use types::{FdbEntry, LearnOutcome};
