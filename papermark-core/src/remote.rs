//! Client for the remote question-bank service.
//!
//! The service stores a flat list of question/answer pairs per document.
//! Pulls are converted into synthetic single-question groups with a fixed
//! page layout; pushes upload the full export document. Concurrent calls are
//! neither deduplicated nor queued, and a failed call rolls nothing back.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::export::QuestionBank;
use crate::import::{BankDocument, ImportDocument, ImportItem, ImportQuestion};
use crate::model::{Rect, RelativeRect};
use crate::store::AnnotationStore;

/// Connection settings for the question-bank service.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub document_id: String,
    pub file_name: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://test.v1edu.com/js/a/interviewcompany/interviewCompanies"
                .to_string(),
            api_key: "tec-api-2025".to_string(),
            document_id: "1953384522108825600".to_string(),
            file_name: "default".to_string(),
        }
    }
}

/// Errors from the remote question-bank service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request failed with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected response payload: {0}")]
    Payload(String),
}

/// One stored question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePair {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Outcome of a pull or push, reported instead of raised.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub success: bool,
    pub message: String,
}

pub struct RemoteClient {
    config: RemoteConfig,
    client: Client,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Fetch the stored question/answer pairs.
    pub async fn fetch_questions(&self) -> Result<Vec<RemotePair>, RemoteError> {
        let url = format!("{}/tec-getQuestions", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("id", self.config.document_id.as_str()),
                ("fileName", self.config.file_name.as_str()),
            ])
            .header("X-API-Key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| RemoteError::Payload(e.to_string()))
    }

    /// Upload a question bank, replacing the stored document.
    pub async fn push_questions(&self, bank: &QuestionBank) -> Result<(), RemoteError> {
        let url = format!("{}/tec-updateQuestions", self.config.base_url);
        let file_name = format!("{}.pdf", self.config.file_name);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("id", self.config.document_id.as_str()),
                ("fileName", file_name.as_str()),
            ])
            .header("X-API-Key", &self.config.api_key)
            .json(bank)
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }

        Ok(())
    }

    /// Fetch, convert, and import into the store, replacing existing state.
    pub async fn import_from_remote(&self, store: &mut AnnotationStore) -> SyncReport {
        match self.fetch_questions().await {
            Ok(pairs) => {
                let document = remote_pairs_to_bank(&pairs);
                let report = store.import_document(&document, true);
                info!(pairs = pairs.len(), "imported remote question bank");
                SyncReport {
                    success: report.success,
                    message: format!("remote import: {}", report.message),
                }
            }
            Err(error) => {
                warn!(%error, "remote import failed");
                SyncReport {
                    success: false,
                    message: error.to_string(),
                }
            }
        }
    }

    /// Convert the store and upload it.
    pub async fn export_to_remote(&self, store: &AnnotationStore) -> SyncReport {
        let bank = store.to_question_bank();
        match self.push_questions(&bank).await {
            Ok(()) => {
                info!(questions = bank.total_questions, "uploaded question bank");
                SyncReport {
                    success: true,
                    message: format!(
                        "uploaded {} questions ({} annotations)",
                        bank.total_questions, bank.total_annotations
                    ),
                }
            }
            Err(error) => {
                warn!(%error, "remote export failed");
                SyncReport {
                    success: false,
                    message: error.to_string(),
                }
            }
        }
    }
}

/// Convert remote pairs into an importable question-bank document, one
/// synthetic group per pair.
///
/// The rectangle constants are arbitrary layout filler required by the
/// service contract. They are not derived from any page geometry and must
/// stay byte-compatible for round-tripping.
pub fn remote_pairs_to_bank(pairs: &[RemotePair]) -> ImportDocument {
    let questions = pairs
        .iter()
        .enumerate()
        .map(|(index, pair)| {
            let offset = index as f64;
            let group_id = format!("api_group_{}_{}", index, Uuid::new_v4().simple());
            ImportQuestion {
                id: Some(group_id.clone()),
                group_name: Some(format!("API导入题目_{}", index + 1)),
                questions: vec![ImportItem {
                    id: Some(format!("question_{group_id}")),
                    text: Some(pair.question.clone()),
                    page_number: Some(1),
                    rectangle: Some(Rect::new(50.0, 50.0 + offset * 100.0, 400.0, 30.0)),
                    relative_rectangle: Some(RelativeRect::new(
                        0.1,
                        0.1 + offset * 0.1,
                        0.8,
                        0.05,
                    )),
                    ..Default::default()
                }],
                answers: vec![ImportItem {
                    id: Some(format!("answer_{group_id}")),
                    text: Some(pair.answer.clone()),
                    page_number: Some(1),
                    rectangle: Some(Rect::new(50.0, 90.0 + offset * 100.0, 400.0, 30.0)),
                    relative_rectangle: Some(RelativeRect::new(
                        0.1,
                        0.15 + offset * 0.1,
                        0.8,
                        0.05,
                    )),
                    ..Default::default()
                }],
                ..Default::default()
            }
        })
        .collect();

    ImportDocument::QuestionBank(BankDocument { questions })
}
