//! Groundwork: server plumbing for long-running network programs.
//!
//! # Architecture Overview
//!
//! ```text
//!   ListenSpec ("tcp://host:port", "unix:///path")
//!        │
//!        ▼
//!   ┌────────────┐   bind    ┌──────────┐  accept   ┌──────────────┐
//!   │ Supervisor │──────────▶│ Listener │──────────▶│  run task    │
//!   │            │           └──────────┘           │ (FileServer) │
//!   │  signals   │──── Shutdown broadcast ─────────▶│              │
//!   └────────────┘                                  └──────────────┘
//!
//!   Helpers: base (hexdump, strings, paths, panic)  fs (listing, sorting, mime)
//!            imaging (pixel formats)  web (errors, JSON, routes, templates)
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;

// Helpers
pub mod base;
pub mod fs;
pub mod imaging;
pub mod web;

// Cross-cutting concerns
pub mod observability;
