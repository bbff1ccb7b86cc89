//! Shared data shapes exchanged between the CertiMate API and its clients.
//!
//! - `model`: templates, text boxes, CSV mappings, roster statistics and uploads.
//! - `jobs`: the certificate generation job record and its status machine.
//! - `requests` / `responses`: JSON payloads of the HTTP API.

pub mod jobs;
pub mod model;
pub mod requests;
pub mod responses;
