//! Request ingestion pipeline: classify, budget, store, log, encode.

pub mod classifier;
pub mod ingest_service;
pub mod response_encoder;
pub mod upload_policy;
pub mod upload_store;
