// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! HolyScroll: a scrolling feed of quotes from spiritual figures
//!
//! This crate provides the backend API: figures and quotes stored in
//! Firestore, per-user follows, likes, saves and lists, and an endless
//! shuffled feed built from the quotes of followed figures.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Repository;
use services::SessionRegistry;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Repository>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn Repository>) -> Self {
        Self {
            sessions: SessionRegistry::new(Arc::clone(&db), config.session_idle_ttl),
            config,
            db,
        }
    }
}
