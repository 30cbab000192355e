//! Core types and trait definitions for the Tabula file service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store backend and the server depend on it.

// `Send` bounds are spelled out on the futures returned by `store`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod file;
pub mod store;
pub mod user;

pub use error::{Error, Result};
