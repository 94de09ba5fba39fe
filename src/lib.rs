//! sharepoint-adapter: filesystem adapter for SharePoint document libraries
//!
//! Exposes a SharePoint site's document library through a generic,
//! path-based filesystem contract, backed by the Microsoft Graph API.
//!
//! # Architecture
//!
//! - **Filesystem contract**: the `FilesystemAdapter` trait and the
//!   attribute records it reports.
//! - **Connector**: authenticates, resolves site and drive once, and hands
//!   out the file and folder services bound to that drive.
//! - **Graph wrapper**: the HTTP client and services that perform the
//!   actual remote calls.
//! - **Adapter**: roots logical paths under a prefix and maps every
//!   contract operation onto the connector's services.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sharepoint_adapter::adapter::SharepointAdapter;
//! use sharepoint_adapter::config::Config;
//! use sharepoint_adapter::connector::SharepointConnector;
//! use sharepoint_adapter::filesystem::{FilesystemAdapter, Options};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file(&"sharepoint.yaml".into())?;
//! let connector = SharepointConnector::connect(&config.connector).await?;
//! let adapter = SharepointAdapter::new(Arc::new(connector), &config.prefix);
//!
//! adapter.write("/hello.txt", b"hello", &Options::new()).await?;
//! let contents = adapter.read("/hello.txt").await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod auth;
pub mod config;
pub mod connector;
pub mod env;
pub mod error;
pub mod filesystem;
pub mod graph;

pub use error::{Result, SharepointError};
