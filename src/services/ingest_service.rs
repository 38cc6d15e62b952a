//! Drives one multipart request from the first part to the acknowledgment.
//!
//! Parts are consumed strictly in arrival order. Field bodies are read as
//! text and registered as request parameters; file bodies are streamed
//! through the size budget into the configured store. Any decode failure
//! aborts the whole request.

use crate::{
    errors::IngestError,
    models::{
        decision::UploadDecision,
        part::{IngestedPart, PartKind, PartMeta},
    },
    services::{
        classifier::classify,
        response_encoder::{JsonEscape, encode},
        upload_policy::{RequestBudget, UploadPolicy},
        upload_store::UploadStore,
    },
};
use axum::extract::{Multipart, multipart::Field};
use std::collections::HashMap;
use tracing::{debug, info};

/// First line of every ingestion log.
pub const LOG_HEADER: &str = "----Received by server----";

/// Human-readable record of one request: the header plus one line per part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionLog {
    lines: Vec<String>,
}

impl Default for IngestionLog {
    fn default() -> Self {
        Self {
            lines: vec![LOG_HEADER.to_string()],
        }
    }
}

impl IngestionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: &IngestedPart) {
        self.lines.push(part.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Every line, header included, terminated by `\n`.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

/// Request parameters with first-value-wins lookup.
#[derive(Debug, Default)]
struct FormParams {
    values: HashMap<String, String>,
}

impl FormParams {
    fn from_query(query: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (name, value) in query {
            params.insert(name, value);
        }
        params
    }

    fn insert(&mut self, name: String, value: String) {
        self.values.entry(name).or_insert(value);
    }

    fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Shared, immutable ingestion settings. Cheap to clone into router state.
#[derive(Debug, Clone)]
pub struct IngestService {
    pub policy: UploadPolicy,
    pub store: UploadStore,
    pub escape: JsonEscape,
}

impl IngestService {
    pub fn new(policy: UploadPolicy, store: UploadStore, escape: JsonEscape) -> Self {
        Self {
            policy,
            store,
            escape,
        }
    }

    /// Ingest every part and return the JSON acknowledgment body.
    pub async fn acknowledge(
        &self,
        query: Vec<(String, String)>,
        multipart: Multipart,
    ) -> Result<String, IngestError> {
        let log = self.ingest(query, multipart).await?;
        Ok(encode(&log.render(), self.escape))
    }

    /// Read all parts in order and build the log.
    pub async fn ingest(
        &self,
        query: Vec<(String, String)>,
        mut multipart: Multipart,
    ) -> Result<IngestionLog, IngestError> {
        let mut params = FormParams::from_query(query);
        let mut budget = self.policy.budget();
        let mut log = IngestionLog::new();

        while let Some(field) = multipart.next_field().await? {
            let meta = part_meta(&field);
            let part = match classify(&meta) {
                PartKind::Field { name } => {
                    let body = field.text().await?;
                    let value = match &name {
                        Some(name) => {
                            params.insert(name.clone(), body);
                            params.get(name).to_string()
                        }
                        None => body,
                    };
                    IngestedPart::Field { name, value }
                }
                PartKind::File {
                    name,
                    content_type,
                    file_name,
                } => {
                    let (size, decision) = self
                        .receive_file(field, &mut budget, file_name.as_deref())
                        .await?;
                    IngestedPart::File {
                        name,
                        content_type,
                        file_name,
                        size,
                        decision,
                    }
                }
            };
            debug!(part = %part, "ingested part");
            log.push(&part);
        }

        info!("{}", log.render().trim_end());
        Ok(log)
    }

    /// Stream one file part to the store, then apply the size policy.
    ///
    /// The body is always read to the end so the next part can be framed,
    /// but spooling stops once the part can no longer be accepted.
    async fn receive_file(
        &self,
        mut field: Field<'_>,
        budget: &mut RequestBudget,
        file_name: Option<&str>,
    ) -> Result<(u64, UploadDecision), IngestError> {
        let mut staging = self.store.stage().await?;
        let mut size: u64 = 0;

        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => {
                    staging.discard().await;
                    return Err(err.into());
                }
            };
            size += chunk.len() as u64;
            if budget.would_reject(size) {
                staging.abandon().await;
                continue;
            }
            staging.write(&chunk).await?;
        }

        let decision = budget.decide(size);
        match decision {
            UploadDecision::Persisted => {
                staging.commit(file_name).await?;
            }
            UploadDecision::Skipped | UploadDecision::Rejected => staging.discard().await,
        }
        Ok((size, decision))
    }
}

fn part_meta(field: &Field<'_>) -> PartMeta {
    PartMeta {
        name: field.name().map(str::to_string),
        content_type: field.content_type().map(str::to_string),
        file_name: field.file_name().map(str::to_string),
    }
}
