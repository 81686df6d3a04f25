// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters for external I/O: the entitlement server, identity storage and
//! fact collection.

mod facts;
mod identity;
mod uep;

use thiserror::Error;

pub use facts::{hostname, CompositeCollector, CustomCollector, FactsCollector, HostCollector};
pub use identity::{FileIdentityStore, IdentityStore};
pub use uep::{ConnectionOptions, ConsumerRequest, EntitlementServer, HttpEntitlementServer};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use facts::StaticFactsCollector;
#[cfg(any(test, feature = "test-support"))]
pub use identity::MemoryIdentityStore;
#[cfg(any(test, feature = "test-support"))]
pub use uep::{FakeEntitlementServer, RegisterCall};

/// Errors from adapter operations
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("facts collection failed: {0}")]
    Facts(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdapterError {
    /// Short kind label used when wrapping into a service fault.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Http(_) => "HttpError",
            AdapterError::Status { .. } => "ServerError",
            AdapterError::InvalidResponse(_) => "InvalidResponse",
            AdapterError::Facts(_) => "FactsError",
            AdapterError::Io(_) => "IoError",
            AdapterError::Json(_) => "JsonError",
        }
    }
}
