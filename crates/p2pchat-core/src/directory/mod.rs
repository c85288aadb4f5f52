//! Username directory (rendezvous service)
//!
//! ## Overview
//!
//! The directory translates a human-readable username into the peer id and
//! addresses a node registered under it. It is a single, volatile,
//! unauthenticated instance: every registration is trusted and the last one
//! for a username wins.
//!
//! ```text
//! ┌──────────────┐  POST /register   ┌──────────────────────┐
//! │  node alice  │ ────────────────► │  Directory            │
//! └──────────────┘                   │  └── Registry (RwLock)│
//! ┌──────────────┐  GET /lookup      │                      │
//! │  node bob    │ ────────────────► │                      │
//! └──────────────┘                   └──────────────────────┘
//! ```

mod client;
mod registry;
mod server;

pub use client::DirectoryClient;
pub use registry::Registry;
pub use server::{router, serve};

use serde::{Deserialize, Serialize};

/// Body of `POST /register`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub peer_id: String,
    #[serde(default)]
    pub addrs: Vec<String>,
}

/// Body of a successful `POST /register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub ok: bool,
}

/// Query of `GET /lookup`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQuery {
    pub username: Option<String>,
}

/// Body of a successful `GET /lookup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub peer_id: String,
    #[serde(default)]
    pub addrs: Vec<String>,
}
