use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Google Cloud API key is not set, fill it in the source preferences")]
    MissingApiKey,
    #[error("Google Drive folder URL is not set, fill it in the source preferences")]
    MissingFolderUrl,
    #[error("OAuth client ID is not set, fill it in the source preferences")]
    MissingClientId,
    #[error("not logged in to Google Drive, login first")]
    NotLoggedIn,
    #[error("login session expired, login again")]
    SessionExpired,
    #[error("device code expired before the login was approved, try again")]
    CodeExpired,
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("request failed with status {0}")]
    RequestFailed(StatusCode),
    #[error("archive contains no images")]
    EmptyArchive,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
