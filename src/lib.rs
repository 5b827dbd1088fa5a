//! # filabel
//!
//! Labels GitHub pull requests according to the filenames they touch
//!
//! ## Features
//! - Glob rules mapping changed files to labels
//! - Reconciliation that never touches labels outside the rule set
//! - Sequential or concurrent processing of repositories, PRs, and pages
//! - Webhook endpoint with HMAC-SHA1 signature verification

pub mod config;
pub mod error;
pub mod github;
pub mod output;
pub mod page;
pub mod reconcile;
pub mod rules;
pub mod sync;
pub mod webhook;

pub use config::Reposlug;
pub use error::{Error, Result};
pub use github::{GitHubClient, PullState};
pub use reconcile::{reconcile, Reconciliation};
pub use rules::LabelRules;
pub use sync::{process_repositories, Context, Options, RepoReport};
