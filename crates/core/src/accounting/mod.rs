//! Accounting entries.
//!
//! - `entry` - Entry records and the 28-type catalogue
//! - `engine` - Engine entry point and request data
//! - `batch` - Per-call batch context with one handler per entry type

pub mod batch;
pub mod engine;
pub mod entry;
pub mod error;


pub use batch::EntryBatch;
pub use engine::{AccountingEntryEngine, EntryRequest};
pub use entry::{AccountingEntry, EntrySide, EntrySource, EntryType, SourceType, STATUS_AVAILABLE};
pub use error::EntryError;
