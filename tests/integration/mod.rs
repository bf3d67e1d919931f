//! Integration tests for the Switchyard gateway
//!
//! Each test drives the real router against wiremock upstreams, covering
//! authentication, provider selection, OAuth shaping, dialect translation and
//! streaming sessions end to end.

mod auth;
mod control;
mod oauth_transport;
mod passthrough;
