//! Middleware module
//!
//! Contains the authentication gate and the signed API-key validator it uses.

pub mod api_key;
pub mod auth;
