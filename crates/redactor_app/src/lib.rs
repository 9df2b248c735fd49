//! Web front-end for the redaction service: upload a text file, hand it to
//! the external pipeline through the ingest bucket, poll the output bucket
//! for the redacted counterpart, and serve it back as a download.
pub mod app;
pub mod config;
pub mod download;
pub mod logging;
pub mod routes;
mod views;
