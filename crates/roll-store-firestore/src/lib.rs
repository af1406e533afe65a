//! Firestore backend for Roll.
//!
//! Talks to the Firestore REST API (or its local emulator) with an API key.
//! Plain JSON document bodies are translated to and from Firestore's typed
//! value encoding in [`value`].

mod store;

pub mod error;
pub mod value;

pub use error::{Error, Result};
pub use store::{FirestoreConfig, FirestoreStore};
