//! Edge adapters: batch CSV input and fee-ledger output.

pub mod csv;
