//! File I/O for the protocol version store.
//!
//! This module handles:
//! - Saving the ledger with atomic writes
//! - Loading the ledger with format validation

mod load;
mod save;

pub use load::load_ledger;
pub use save::save_ledger;
