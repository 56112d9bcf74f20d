// Hygeia - Clinical Record Collection and Enrichment Adapter
// Copyright (c) 2025 Hygeia Contributors
// Licensed under the MIT License

//! # Hygeia
//!
//! Hygeia is an integration adapter for a legacy hospital information
//! system. It authenticates against the clinical backend with a multi-token
//! cookie session, collects one patient hospitalization record through a
//! sequence of dependent HTTP calls, and enriches that record from three
//! external reference sources: the backend itself, a government
//! classification registry, and an address-normalization service.
//!
//! ## Architecture
//!
//! Hygeia follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (enrichment pipeline, handbooks)
//! - [`adapters`] - External integrations (clinical backend, address
//!   service, registry downloads, shared HTTP execution)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hygeia::adapters::address::AddressNormalizer;
//! use hygeia::adapters::clinical::session::{FileCredentialStore, SessionManager};
//! use hygeia::adapters::http::HttpExecutor;
//! use hygeia::adapters::registry::RegistryClient;
//! use hygeia::config::HygeiaConfig;
//! use hygeia::core::handbooks::HandbookStore;
//! use hygeia::core::pipeline::{collect_record, EnrichmentContext};
//! use hygeia::domain::EventCriteria;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HygeiaConfig::from_file("hygeia.toml")?;
//!
//!     let http = HttpExecutor::new(
//!         config.clinical.timeout_seconds,
//!         config.clinical.tls_verify,
//!         config.clinical.retry.clone(),
//!     )?;
//!     let handbooks = HandbookStore::new();
//!     let registry = RegistryClient::new(config.registry.clone());
//!     let normalizer = AddressNormalizer::new(config.address.clone());
//!
//!     let session_manager = SessionManager::new(
//!         config.clinical.clone(),
//!         FileCredentialStore::new(&config.storage.credential_path),
//!     );
//!     let session = session_manager.ensure_valid_session(&http).await?;
//!
//!     let ctx = EnrichmentContext {
//!         http: &http,
//!         session: &session,
//!         clinical: &config.clinical,
//!         institution: &config.institution,
//!         handbooks: &handbooks,
//!         normalizer: &normalizer,
//!         registry: &registry,
//!         handbooks_dir: Path::new(&config.storage.handbooks_dir),
//!     };
//!
//!     let record = collect_record(&EventCriteria::for_card("2941"), &ctx).await?;
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with
//! [`domain::HygeiaError`]. Hard failures (authentication, malformed
//! mandatory responses, not-found) propagate; reference-lookup and
//! address-normalization misses are soft — logged, field left unset, the
//! record still delivered.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
