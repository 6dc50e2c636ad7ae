//! CDN purge decisions for content-managed sites.
//!
//! A host reports content lifecycle events (pre-publish, post-write,
//! post-delete) to a [`purge::PurgeTrigger`], which classifies the change,
//! computes the live and stage URLs to invalidate, and submits them through a
//! [`application::ports::PurgeTransport`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod purge;
