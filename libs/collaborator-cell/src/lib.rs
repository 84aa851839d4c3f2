// libs/collaborator-cell/src/lib.rs
//! # Collaborator Cell
//!
//! Lists the collaborators of the configured GitHub repository for the
//! dashboard's team card.
//!
//! ## API Endpoints
//!
//! - `GET /github-users` - First page (up to 100) of collaborators, in GitHub's order
//!
//! Each record always carries `login`, `avatar_url`, `html_url` and
//! `role_name`; values GitHub omits are returned as empty strings.
//!
//! ## Configuration
//!
//! - `GITHUB_OWNER` / `GITHUB_REPO` - Repository to list
//! - `GITHUB_API_URL` - API base URL (optional, defaults to api.github.com)
//!
//! The API token is read from the secret store at startup, never from the
//! environment.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{CollaboratorError, CollaboratorRecord};
pub use router::collaborator_routes;
pub use services::GitHubClient;
