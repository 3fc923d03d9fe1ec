use crate::config::ClientConfig;
use crate::errors::ApiError;
use crate::models::{Assignment, MessageResponse, PositionCountRequest, SelectedFile};
use reqwest::{
    Client, Response, Url,
    multipart::{Form, Part},
};
use tracing::debug;

pub const UPLOAD_PATH: &str = "/uploadfile/";
pub const POSITION_COUNT_PATH: &str = "/update_position_count/";
pub const ASSIGNMENT_PATH: &str = "/update_position/";
pub const BOARD_PATH: &str = "/";
pub const DATE_QUERY_KEY: &str = "date_str";
pub const UPLOAD_FIELD: &str = "file";

/// Typed client for the labor board backend.
#[derive(Clone)]
pub struct LaborBoardApi {
    http: Client,
    base_url: Url,
}

impl LaborBoardApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn upload_file(&self, file: SelectedFile) -> Result<MessageResponse, ApiError> {
        debug!(file = %file.name, bytes = file.bytes.len(), "uploading schedule file");
        let part = Part::bytes(file.bytes).file_name(file.name);
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH)?)
            .multipart(form)
            .send()
            .await?;
        read_message(response).await
    }

    pub async fn update_position_count(
        &self,
        request: &PositionCountRequest,
    ) -> Result<MessageResponse, ApiError> {
        let response = self
            .http
            .post(self.endpoint(POSITION_COUNT_PATH)?)
            .json(request)
            .send()
            .await?;
        read_message(response).await
    }

    pub async fn update_position(
        &self,
        assignment: &Assignment,
    ) -> Result<MessageResponse, ApiError> {
        let form = Form::new()
            .text("date", assignment.date.clone())
            .text("position", assignment.position.clone())
            .text("associate", assignment.associate.clone());

        let response = self
            .http
            .post(self.endpoint(ASSIGNMENT_PATH)?)
            .multipart(form)
            .send()
            .await?;
        read_message(response).await
    }

    /// Renders the board page, optionally for a given date.
    pub async fn fetch_board(&self, date: Option<&str>) -> Result<String, ApiError> {
        let mut request = self.http.get(self.endpoint(BOARD_PATH)?);
        if let Some(date) = date {
            request = request.query(&[(DATE_QUERY_KEY, date)]);
        }
        let html = request.send().await?.error_for_status()?.text().await?;
        Ok(html)
    }

    /// Root-relative location of the board for `date`, e.g. `/?date_str=2024-05-01`.
    pub fn board_location(&self, date: &str) -> String {
        let mut url = self.base_url.clone();
        url.set_path(BOARD_PATH);
        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut().append_pair(DATE_QUERY_KEY, date);
        format!("{}?{}", url.path(), url.query().unwrap_or_default())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(format!("{path}: {err}")))
    }
}

async fn read_message(response: Response) -> Result<MessageResponse, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;

    let parsed = match serde_json::from_slice::<MessageResponse>(&body) {
        Ok(message) => message,
        // Any JSON counts as an answer; only a non-JSON body is a decode failure.
        Err(source) => match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(_) => MessageResponse::new(""),
            Err(_) => return Err(ApiError::Decode { status, source }),
        },
    };

    if status.is_success() {
        return Ok(parsed);
    }

    // Framework-level errors (e.g. validation failures) carry JSON without `message`.
    let message = if parsed.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string()
    } else {
        parsed.message
    };
    Err(ApiError::rejected(status, message))
}
