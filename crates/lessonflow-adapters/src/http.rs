//! HTTP exam result sink.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use lessonflow_core::error::SubmissionError;
use lessonflow_core::traits::{ExamSubmission, ResultSink};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Posts each exam result as JSON to `{base_url}/exam-results`.
///
/// The submission id is sent as an `Idempotency-Key` header so the server
/// can drop duplicates of a retried result.
pub struct HttpResultSink {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpResultSink {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/exam-results", self.base_url)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

#[async_trait]
impl ResultSink for HttpResultSink {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, submission), fields(module = %submission.module_id, exam = %submission.exam_id))]
    async fn submit(&self, submission: &ExamSubmission) -> Result<(), SubmissionError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .header("Idempotency-Key", submission.submission_id.to_string())
            .json(submission);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SubmissionError::Timeout(self.timeout_secs)
            } else {
                SubmissionError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            tracing::debug!(status, "result sink refused submission");
            return Err(SubmissionError::Rejected { status, message });
        }

        tracing::info!(status, percentage = submission.percentage, "exam result submitted");
        Ok(())
    }
}
