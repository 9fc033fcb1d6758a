//! Shipping address domain module: one free-text address per user.

pub mod address;

pub use address::{Address, AddressText};
