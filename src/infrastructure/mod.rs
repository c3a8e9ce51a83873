//! Resources the server owns but does not strictly need.

pub mod database;
