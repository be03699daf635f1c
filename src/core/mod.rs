//! Core module - Framework-agnostic ledger logic.
//! Every operation takes the acting user's id and scopes all reads and writes to it;
//! authentication happens before anything here is called.

pub mod account;
pub mod balance;
pub mod category;
pub mod report;
pub mod seed;
pub mod transaction;
pub mod user;
