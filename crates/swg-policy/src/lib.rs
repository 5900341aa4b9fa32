//! Zero Trust Policy Engine
//!
//! Per-user policy evaluation for the secure web gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     PolicyEngine                          │
//! │                                                           │
//! │  credential ──► IdentityVerifier ──► user ──┐             │
//! │                                             ▼             │
//! │  PolicyStore (ArcSwap<PolicySnapshot>) ─► PolicyBlock     │
//! │                                             │             │
//! │  device ──► DeviceTrust ──► posture ────────┤             │
//! │  domain, categories ────────────────────────┤             │
//! │                                             ▼             │
//! │                                      PolicyDecision       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `reload()` swaps the whole snapshot in one atomic store; an evaluation
//! that already loaded the previous snapshot finishes against it.

#![warn(missing_docs)]

pub mod document;
pub mod engine;
pub mod identity;
pub mod posture;
pub mod store;

pub use document::{PolicyBlock, PolicyDocument};
pub use engine::{PolicyDecision, PolicyEngine};
pub use identity::{IdentityResult, IdentityVerifier};
pub use posture::DeviceTrust;
pub use store::{PolicySnapshot, PolicyStore};
