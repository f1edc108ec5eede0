//! Round export sinks.
//!
//! After clustering, every round hands its surviving population to a
//! [`Storage`]. Exports are keyed by round index; exporting the same round
//! twice replaces the earlier artifact.
//!
//! # Available backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`CsvStorage`] | One `mobo_iteration_<round>.csv` file per round in a directory (the default) |
//! | [`MemoryStorage`] | Clones of each round's population behind a read-write lock |
//!
//! # Implementing a custom backend
//!
//! ```
//! use mobo::population::Population;
//! use mobo::storage::Storage;
//!
//! /// Counts exported rows.
//! struct RowCounter(parking_lot::Mutex<usize>);
//!
//! impl Storage for RowCounter {
//!     fn export(&self, _round: usize, population: &Population) -> mobo::Result<()> {
//!         *self.0.lock() += population.len();
//!         Ok(())
//!     }
//! }
//! ```

mod csv;
mod memory;

pub use self::csv::CsvStorage;
pub use self::memory::MemoryStorage;
use crate::error::Result;
use crate::population::Population;

/// Receives the filtered, projected and clustered population of each round.
///
/// Implementations must be `Send + Sync` so an optimizer can be moved
/// across threads.
pub trait Storage: Send + Sync {
    /// Persists the population of `round`, replacing any earlier export of
    /// the same round.
    ///
    /// # Errors
    ///
    /// Any error aborts the run. Exports of earlier rounds are kept.
    fn export(&self, round: usize, population: &Population) -> Result<()>;
}
