//! REST adapter over the recruiting-visit API.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::model::{
    CurrentUser, FacultyMember, FormDescriptor, FormId, FormVersion, ProfilePayload,
    SubmissionPayload, SubmissionRecord,
};

use super::{
    BackendError, FormSource, HeadshotFile, HeadshotUploader, ProfileService, Result,
    SetupSession, SubmissionSink, extract_message,
};

/// HTTP client for the API rooted at `base_url` (e.g. `https://host/api`).
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(String::from),
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "api request");
        let req = self.http.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.request(Method::GET, path).send().await?;
        decode(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl serde::Serialize) -> Result<T> {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        decode(resp).await
    }
}

/// Decode a successful response, or turn a failed one into an error.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        let bytes = resp.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }
    Err(failure(status, resp).await)
}

async fn failure(status: StatusCode, resp: Response) -> BackendError {
    if status == StatusCode::NOT_FOUND {
        return BackendError::NotFound;
    }
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    match extract_message(&body) {
        Some(message) => {
            debug!(%status, %message, "api request rejected");
            BackendError::Rejected { message }
        }
        None => {
            debug!(%status, "api request failed without a message");
            BackendError::Status(status)
        }
    }
}

/// List endpoints may or may not be paginated.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paged { results: items } => items,
        }
    }
}

#[async_trait]
impl FormSource for ApiClient {
    async fn fetch_form(&self, id: FormId) -> Result<FormDescriptor> {
        self.get(&format!("/forms/{id}/")).await
    }

    async fn fetch_submissions(&self, form: FormId) -> Result<Vec<SubmissionRecord>> {
        let listing: Listing<SubmissionRecord> =
            self.get(&format!("/form-submissions/?form={form}")).await?;
        Ok(listing.into_vec().into_iter().map(rekeyed).collect())
    }
}

#[async_trait]
impl SubmissionSink for ApiClient {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionRecord> {
        let record = self.post("/form-submissions/", payload).await?;
        Ok(rekeyed(record))
    }
}

/// The server re-keys answers to current field ids before returning them,
/// so its snapshot must not be applied a second time.
fn rekeyed(mut record: SubmissionRecord) -> SubmissionRecord {
    record.form_version = FormVersion::default();
    record
}

#[async_trait]
impl HeadshotUploader for ApiClient {
    async fn upload_headshot(&self, file: &HeadshotFile) -> Result<String> {
        #[derive(Deserialize)]
        struct Uploaded {
            url: Option<String>,
        }

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new().part("headshot", part);
        let resp = self
            .request(Method::POST, "/users/upload_headshot/")
            .multipart(form)
            .send()
            .await?;
        let uploaded: Uploaded = decode(resp).await?;
        uploaded
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BackendError::Invalid("Invalid response from server".into()))
    }
}

#[async_trait]
impl ProfileService for ApiClient {
    async fn list_faculty(&self) -> Result<Vec<FacultyMember>> {
        let listing: Listing<FacultyMember> = self
            .get("/users/?user_type=faculty&available_for_meetings=true")
            .await?;
        Ok(listing.into_vec())
    }

    async fn complete_setup(&self, profile: &ProfilePayload) -> Result<()> {
        let _: Value = self
            .post("/users/complete_candidate_setup/", profile)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SetupSession for ApiClient {
    async fn current_user(&self) -> Result<CurrentUser> {
        self.get("/users/me/").await
    }

    /// The server flips the flag itself when setup completes; re-read the
    /// user so a stale session is caught early.
    async fn complete_setup(&self) -> Result<()> {
        let user: CurrentUser = self.get("/users/me/").await?;
        if !user.has_completed_setup {
            debug!(user = %user.email, "server has not yet recorded completed setup");
        }
        Ok(())
    }
}
