//! # maintgate - Maintenance mode gate for web applications
//!
//! Decides, for every inbound request, whether the application is serving
//! normally or is in maintenance mode, and if so whether this particular
//! request may bypass the block.
//!
//! ## Features
//!
//! - **Per-request gate** - One call per request, returns allow or a 503 denial
//! - **Four bypass channels** - Config secret, record secret, IP/CIDR allow-list, bypass cookie
//! - **Fail-open** - Corrupted records and internal errors never lock out the site
//! - **Two backends** - Durable JSON file or a shared cache, with migration
//! - **Secure** - Secrets zeroed on drop and redacted from Debug output
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        maintgate                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: down, up, status, migrate, check, init     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Admin (Maintenance service)                                │
//! │    └── activate, deactivate, status, migrate, clear_all     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Gate                                                       │
//! │    ├── Operator-context exemption                           │
//! │    ├── Fail-open on corruption and panics                   │
//! │    └── EventSink (tracing by default)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Resolver ──► IpMatcher (ipnet)                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StateStore (StateBackend trait)                            │
//! │    ├── FileStore (atomic JSON file)                         │
//! │    └── CacheStore (MemoryCache or FileCache, optional TTL)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use maintgate::config::Config;
//! use maintgate::gate::{Gate, Verdict};
//! use maintgate::resolver::Evidence;
//! use maintgate::store::MemoryCache;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("/etc/maintgate/config.yaml")?;
//!     let gate = Gate::from_config(&config, Arc::new(MemoryCache::new()));
//!
//!     let evidence = Evidence::new("203.0.113.7").with_query("maintenance_secret=abc");
//!     match gate.check(&evidence) {
//!         Verdict::Allow(_) => { /* hand the request to the application */ }
//!         Verdict::Deny(denial) => {
//!             let (header, value) = denial.retry_after_header();
//!             println!("503 {} {}: {}", header, value, denial.message);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`admin`] - Activate/deactivate/status/migrate operations
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Typed library errors
//! - [`fs_abstraction`] - Mockable filesystem seam
//! - [`gate`] - Per-request maintenance gate
//! - [`ip_matcher`] - IP / CIDR allow-list matching
//! - [`record`] - Persisted maintenance record
//! - [`resolver`] - Bypass channel resolution
//! - [`store`] - File and cache storage backends
//! - [`utils`] - Common utility functions (tokens, formatting)
//! - [`validation`] - Operator input validation

pub mod admin;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs_abstraction;
pub mod gate;
pub mod ip_matcher;
pub mod record;
pub mod resolver;
pub mod store;
pub mod utils;
pub mod validation;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::GateError;
pub use gate::{Gate, Verdict};
