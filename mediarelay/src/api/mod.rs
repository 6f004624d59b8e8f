//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request bodies
//!
//! # Routes
//!
//! - `GET /`: health check, empty 200
//! - `POST /`: relay a remote media URL into a guild folder, responding with the public URL

pub mod handlers;
pub mod models;
