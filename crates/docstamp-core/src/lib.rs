//! DocStamp Core - Domain logic and workflow rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `StampingItem`, `AttachmentInfo`, `Identity`, `ReplacementProgress`
//! - **Use cases** - `AuthenticateUseCase`, `LoadPendingUseCase`, `DownloadAttachmentUseCase`, `ReplaceAttachmentUseCase`
//! - **Port definitions** - Traits for adapters: `IListStore`, `ISessionProvider`
//! - **Service façade** - [`service::StampService`], the surface callers drive
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod usecases;

pub use error::WorkflowError;
pub use service::{StampService, WorkflowSettings};
