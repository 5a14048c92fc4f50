//! Terraform Cloud workspace client for stackrun.
//!
//! Implements [`stackrun_core::WorkspaceApi`] against the Terraform Cloud
//! (and Terraform Enterprise) v2 JSON:API.

pub mod client;
pub mod error;
pub mod models;

pub use client::TfcClient;
pub use error::TfcError;
