// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage layer for the subscription service

mod config;
mod facts_cache;

pub use config::{ConfigError, ConfigStore, Sections};
pub use facts_cache::{CachedFacts, FactsCache};
