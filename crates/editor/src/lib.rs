//! Montage Editor Client
//!
//! The only path from Montage to the external editor:
//! - **Backend contract:** [`EditorBackend`], one method per editing primitive
//! - **Atomic client:** [`AtomicClient`], validates arguments before dispatch
//!   and wraps backend failures with the operation that caused them
//! - **Reference editor:** [`InMemoryEditor`], a complete backend that keeps
//!   the project in memory (tests, offline sandboxes)
//!
//! Nothing here retries. Whether a retry is safe depends on what the caller
//! has already committed, so that decision stays with the caller.

pub mod backend;
pub mod client;
pub mod memory;

pub use backend::*;
pub use client::{AtomicClient, ClientConfig};
pub use memory::{Fault, InMemoryEditor};
