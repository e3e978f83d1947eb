//! Backend question endpoints.

use async_trait::async_trait;
use flashprep_core::error::{FlashprepError, Result};
use flashprep_core::question::{Question, QuestionDraft, QuestionRepository, QuestionScope};
use serde::Serialize;
use serde_json::Value;

use crate::api_client::ApiClient;

pub const MY_QUESTIONS_PATH: &str = "/getMyQuestions";
pub const PUBLIC_QUESTIONS_PATH: &str = "/getPublicQuestions";
pub const CREATE_QUESTION_PATH: &str = "/createQuestion";
pub const GENERATE_AUDIO_PATH: &str = "/generateAudio";

fn update_path(id: &str) -> String {
    format!("/updateQuestion/{}", id)
}

fn delete_path(id: &str) -> String {
    format!("/deleteQuestion/{}", id)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAudioRequest<'a> {
    question_id: &'a str,
}

/// [`QuestionRepository`] backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpQuestionRepository {
    client: ApiClient,
}

impl HttpQuestionRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(FlashprepError::validation("question id is required"));
    }
    Ok(())
}

/// Decodes the `data.data` list envelope.
///
/// A missing level or a non-array payload decodes to an empty list; a
/// present array with malformed records is an error.
fn decode_list(body: &Value) -> Result<Vec<Question>> {
    match body.get("data").and_then(|d| d.get("data")) {
        Some(items @ Value::Array(_)) => Ok(serde_json::from_value(items.clone())?),
        _ => Ok(Vec::new()),
    }
}

/// Finds an echoed question record in `data.data`, `data`, or the top level.
fn decode_record(body: &Value) -> Option<Question> {
    let nested = body.get("data").and_then(|d| d.get("data"));
    let candidates = [nested, body.get("data"), Some(body)];
    candidates
        .into_iter()
        .flatten()
        .filter(|v| v.is_object())
        .find_map(|v| serde_json::from_value::<Question>(v.clone()).ok())
}

/// Reads the audio key from a generate-audio response.
fn decode_audio_key(body: &Value) -> Option<String> {
    let nested = body.get("data").and_then(|d| d.get("data"));
    [nested, body.get("data"), Some(body)]
        .into_iter()
        .flatten()
        .find_map(|v| v.get("audioKey").and_then(Value::as_str))
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl QuestionRepository for HttpQuestionRepository {
    async fn list(&self, scope: QuestionScope, token: Option<&str>) -> Result<Vec<Question>> {
        let path = match scope {
            QuestionScope::Mine => MY_QUESTIONS_PATH,
            QuestionScope::Public => PUBLIC_QUESTIONS_PATH,
        };
        let body = self.client.get(path, token).await?;
        let questions = decode_list(&body)?;
        tracing::debug!(
            "[HttpQuestionRepository] {:?} returned {} question(s)",
            scope,
            questions.len()
        );
        Ok(questions)
    }

    async fn create(&self, draft: &QuestionDraft, token: &str) -> Result<Option<Question>> {
        let body = self
            .client
            .post(CREATE_QUESTION_PATH, Some(draft), Some(token))
            .await?;
        Ok(decode_record(&body))
    }

    async fn update(
        &self,
        id: &str,
        draft: &QuestionDraft,
        token: &str,
    ) -> Result<Option<Question>> {
        require_id(id)?;
        let body = self
            .client
            .put(&update_path(id), Some(draft), Some(token))
            .await?;
        Ok(decode_record(&body).filter(|q| q.id == id))
    }

    async fn delete(&self, id: &str, token: &str) -> Result<()> {
        require_id(id)?;
        self.client.delete(&delete_path(id), Some(token)).await?;
        Ok(())
    }

    async fn generate_audio(&self, id: &str, token: &str) -> Result<String> {
        require_id(id)?;
        let body = self
            .client
            .post(
                GENERATE_AUDIO_PATH,
                Some(&GenerateAudioRequest { question_id: id }),
                Some(token),
            )
            .await?;
        Ok(decode_audio_key(&body).unwrap_or_else(|| {
            tracing::debug!(
                "[HttpQuestionRepository] no audioKey in response for {}, keying by id",
                id
            );
            id.to_string()
        }))
    }
}
