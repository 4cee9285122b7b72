use std::future::Future;

use bytes::Bytes;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    oauth::TokenManager,
    query::FOLDER_MIME,
};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Drive caps `pageSize` at 1000; ask for the maximum to keep round trips down.
const PAGE_SIZE: &str = "1000";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,webContentLink)";
const FILE_FIELDS: &str = "id,name,mimeType,webContentLink";

/// Snapshot of a remote Drive object.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub web_content_link: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }
}

/// One page of a `files.list` result; no `nextPageToken` means the last page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFilesResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Follow `nextPageToken` links until the listing is exhausted, keeping files
/// in arrival order. One request at a time; Drive reports no total, so a huge
/// folder means a long walk.
pub(crate) async fn collect_pages<F, Fut>(
    first: DriveFilesResponse,
    mut fetch_next: F,
) -> Result<Vec<DriveFile>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<DriveFilesResponse>>,
{
    let mut page = first;
    let mut files = std::mem::take(&mut page.files);
    while let Some(token) = page.next_page_token.take() {
        page = fetch_next(token).await?;
        files.append(&mut page.files);
    }
    Ok(files)
}

/// How the client authenticates against the Drive API. The two modes also
/// construct different direct content URLs, so the distinction reaches into
/// page listings.
pub enum AuthMode {
    ApiKey(String),
    OAuth(TokenManager),
}

pub struct DriveClient {
    http: reqwest::Client,
    auth: AuthMode,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, auth: AuthMode) -> Self {
        Self { http, auth }
    }

    /// List every file matching `query`, walking all result pages.
    pub async fn list_files(&self, query: &str, order_by: Option<&str>) -> Result<Vec<DriveFile>> {
        let first = self.list_page(query, order_by, None).await?;
        collect_pages(first, |token| self.list_page(query, order_by, Some(token))).await
    }

    async fn list_page(
        &self,
        query: &str,
        order_by: Option<&str>,
        page_token: Option<String>,
    ) -> Result<DriveFilesResponse> {
        debug!("list files with query {query}");

        let mut params = vec![
            ("q".to_string(), query.to_string()),
            ("fields".to_string(), LIST_FIELDS.to_string()),
            ("pageSize".to_string(), PAGE_SIZE.to_string()),
        ];
        if let Some(order_by) = order_by {
            params.push(("orderBy".to_string(), order_by.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken".to_string(), token));
        }

        let response = self
            .authorize(self.http.get(format!("{DRIVE_API_BASE}/files")))
            .await?
            .query(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::RequestFailed(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Fetch a single file's metadata.
    pub async fn get_file(&self, file_id: &str) -> Result<DriveFile> {
        let response = self
            .authorize(self.http.get(format!("{DRIVE_API_BASE}/files/{file_id}")))
            .await?
            .query(&[("fields", FILE_FIELDS)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::RequestFailed(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Download a file's content, `alt=media`.
    pub async fn download(&self, file_id: &str) -> Result<Bytes> {
        info!("downloading file {file_id}");

        let response = self
            .authorize(self.http.get(format!("{DRIVE_API_BASE}/files/{file_id}")))
            .await?
            .query(&[("alt", "media")])
            .send()
            .await?;
        if !response.status().is_success() {
            warn!("download of {file_id} failed with status {}", response.status());
            return Err(Error::RequestFailed(response.status()));
        }

        Ok(response.bytes().await?)
    }

    /// Direct content URL for a file. API keys ride along as a query
    /// parameter; OAuth content goes through the googleusercontent host
    /// instead, which serves the original size for `=s0`.
    pub fn content_url(&self, file_id: &str) -> String {
        match &self.auth {
            AuthMode::ApiKey(key) => {
                format!("{DRIVE_API_BASE}/files/{file_id}?alt=media&key={key}")
            }
            AuthMode::OAuth(_) => format!("https://lh3.googleusercontent.com/d/{file_id}=s0"),
        }
    }

    async fn authorize(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match &self.auth {
            AuthMode::ApiKey(key) => Ok(request.query(&[("key", key.as_str())])),
            AuthMode::OAuth(manager) => {
                let token = manager.access_token().await?;
                Ok(request.bearer_auth(token))
            }
        }
    }
}
