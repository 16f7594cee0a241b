//! Data Transfer Objects
//!
//! Request and response payloads for the release-hosting API. The shapes
//! follow the GitHub Releases REST API.

pub mod release;
