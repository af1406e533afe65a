//! Core types, the document store abstraction, and the application logic of
//! the Roll attendance tracker.
//!
//! No HTTP, database or terminal code lives here. Backends implement
//! [`store::DocumentStore`]; front ends drive a [`controller::Controller`].

pub mod access;
pub mod codec;
pub mod controller;
pub mod entry;
pub mod error;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
