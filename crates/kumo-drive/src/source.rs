use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use kumo_lib::prelude::*;

use crate::{
    archive,
    client::{AuthMode, DriveClient, DriveFile},
    comicinfo,
    error::Error,
    oauth::TokenManager,
    query::Query,
    store::TokenStore,
    url::extract_folder_id,
};

pub static ID: i64 = 2;

const FOLDER_URL_PREF: &str = "Folder URL";
const API_KEY_PREF: &str = "Google Cloud API Key";
const CLIENT_ID_PREF: &str = "OAuth Client ID";

/// Source settings, read fresh on every operation.
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    pub folder_url: Option<String>,
}

enum Mode {
    ApiKey,
    OAuth(Arc<dyn TokenStore>),
}

/// Google Drive source: a configured root folder holds one subfolder per
/// series, each series holds chapter subfolders or CBZ archives, each chapter
/// folder holds page images.
pub struct DriveSource {
    http: reqwest::Client,
    mode: Mode,
    config: RwLock<SourceConfig>,
}

impl DriveSource {
    /// Source authenticating with a static Google Cloud API key.
    pub fn with_api_key(config: SourceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            mode: Mode::ApiKey,
            config: RwLock::new(config),
        }
    }

    /// Source authenticating through an OAuth device-flow login, with the
    /// session persisted in `store`.
    pub fn with_oauth(config: SourceConfig, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            mode: Mode::OAuth(store),
            config: RwLock::new(config),
        }
    }

    /// Token manager for driving login and logout. Only OAuth sources have
    /// one.
    pub fn token_manager(&self) -> Result<TokenManager, Error> {
        let config = self.config_snapshot()?;
        match &self.mode {
            Mode::OAuth(store) => {
                let client_id = config
                    .client_id
                    .filter(|id| !id.trim().is_empty())
                    .ok_or(Error::MissingClientId)?;
                Ok(TokenManager::new(client_id, store.clone()))
            }
            Mode::ApiKey => Err(Error::Other(anyhow::anyhow!(
                "API key sources have no login"
            ))),
        }
    }

    fn config_snapshot(&self) -> Result<SourceConfig, Error> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|_| Error::Other(anyhow::anyhow!("source preferences lock poisoned")))
    }

    fn client(&self, config: &SourceConfig) -> Result<DriveClient, Error> {
        let auth = match &self.mode {
            Mode::ApiKey => {
                let key = config
                    .api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or(Error::MissingApiKey)?;
                AuthMode::ApiKey(key)
            }
            Mode::OAuth(store) => {
                let client_id = config
                    .client_id
                    .clone()
                    .filter(|id| !id.trim().is_empty())
                    .ok_or(Error::MissingClientId)?;
                AuthMode::OAuth(TokenManager::new(client_id, store.clone()))
            }
        };

        Ok(DriveClient::new(self.http.clone(), auth))
    }

    fn root_folder(config: &SourceConfig) -> Result<String, Error> {
        let id = extract_folder_id(config.folder_url.as_deref().unwrap_or(""));
        if id.is_empty() {
            return Err(Error::MissingFolderUrl);
        }
        Ok(id)
    }
}

fn series_from_folder(file: DriveFile) -> MangaInfo {
    MangaInfo {
        source_id: ID,
        title: file.name,
        path: file.id,
        ..Default::default()
    }
}

/// A chapter is a subfolder or a zip/cbz file; anything else in the series
/// folder is ignored. Folders always qualify, whatever they are named.
fn is_chapter_candidate(file: &DriveFile) -> bool {
    if file.is_folder() {
        return true;
    }
    let name = file.name.to_lowercase();
    name.ends_with(".zip") || name.ends_with(".cbz")
}

fn chapter_title(name: &str) -> String {
    let lower = name.to_lowercase();
    for suffix in [".zip", ".cbz"] {
        if lower.ends_with(suffix) {
            return name[..name.len() - suffix.len()].to_string();
        }
    }
    name.to_string()
}

/// Chapter paths carry enough to reopen the chapter later: a bare folder ID,
/// or `fileId|mimeType|name` for archive chapters.
fn chapter_path(file: &DriveFile) -> String {
    if file.is_folder() {
        file.id.clone()
    } else {
        format!("{}|{}|{}", file.id, file.mime_type, file.name)
    }
}

enum ChapterPath {
    Folder(String),
    Archive { file_id: String, name: String },
}

fn parse_chapter_path(path: &str) -> ChapterPath {
    match path.split_once('|') {
        Some((file_id, rest)) => ChapterPath::Archive {
            file_id: file_id.to_string(),
            name: rest
                .split_once('|')
                .map(|(_, name)| name)
                .unwrap_or("")
                .to_string(),
        },
        None => ChapterPath::Folder(path.to_string()),
    }
}

/// Drive has no chapter ordinals; the listing arrives in descending name
/// order and numbers count down from the candidate count to 1.
fn chapters_from_files(files: Vec<DriveFile>) -> Vec<ChapterInfo> {
    let candidates: Vec<DriveFile> = files.into_iter().filter(is_chapter_candidate).collect();
    let count = candidates.len();

    candidates
        .into_iter()
        .enumerate()
        .map(|(index, file)| ChapterInfo {
            source_id: ID,
            title: chapter_title(&file.name),
            path: chapter_path(&file),
            number: (count - index) as f64,
            uploaded: 0,
        })
        .collect()
}

fn find_cover(files: &[DriveFile]) -> Option<&DriveFile> {
    files.iter().find(|file| {
        file.name.to_lowercase().starts_with("cover") && file.mime_type.starts_with("image/")
    })
}

fn page_files(files: Vec<DriveFile>) -> Vec<DriveFile> {
    let mut pages: Vec<DriveFile> = files
        .into_iter()
        .filter(|file| {
            file.mime_type.starts_with("image/") || file.mime_type.starts_with("video/")
        })
        .collect();
    pages.sort_by(|a, b| a.name.cmp(&b.name));
    pages
}

#[async_trait]
impl Extension for DriveSource {
    fn get_source_info(&self) -> SourceInfo {
        SourceInfo {
            id: ID,
            name: "Google Drive".to_string(),
            url: "https://drive.google.com".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            icon: "/icons/drive.png".to_string(),
            languages: Lang::All,
            nsfw: false,
        }
    }

    fn filter_list(&self) -> Vec<Input> {
        vec![Input::Text {
            name: FOLDER_URL_PREF.to_string(),
            state: None,
        }]
    }

    fn get_preferences(&self) -> Result<Vec<Input>> {
        let config = self.config_snapshot()?;
        let credential = match self.mode {
            Mode::ApiKey => Input::Text {
                name: API_KEY_PREF.to_string(),
                state: config.api_key,
            },
            Mode::OAuth(_) => Input::Text {
                name: CLIENT_ID_PREF.to_string(),
                state: config.client_id,
            },
        };

        Ok(vec![
            credential,
            Input::Text {
                name: FOLDER_URL_PREF.to_string(),
                state: config.folder_url,
            },
        ])
    }

    fn set_preferences(&self, preferences: Vec<Input>) -> Result<()> {
        let mut config = self
            .config
            .write()
            .map_err(|_| anyhow::anyhow!("source preferences lock poisoned"))?;

        for preference in preferences {
            if let Input::Text { name, state } = preference {
                match name.as_str() {
                    API_KEY_PREF => config.api_key = state,
                    CLIENT_ID_PREF => config.client_id = state,
                    FOLDER_URL_PREF => config.folder_url = state,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    async fn get_popular_manga(&self, page: i64) -> Result<Vec<MangaInfo>> {
        self.search_manga(page, None, None).await
    }

    async fn get_latest_manga(&self, _page: i64) -> Result<Vec<MangaInfo>> {
        Err(anyhow::anyhow!("latest updates are not supported"))
    }

    async fn search_manga(
        &self,
        page: i64,
        query: Option<String>,
        filters: Option<Vec<Input>>,
    ) -> Result<Vec<MangaInfo>> {
        let config = self.config_snapshot()?;
        let client = self.client(&config)?;

        let folder_override = filters
            .iter()
            .flatten()
            .find_map(|input| input.text_state(FOLDER_URL_PREF))
            .map(extract_folder_id)
            .filter(|id| !id.is_empty());
        let root = match folder_override {
            Some(id) => id,
            None => Self::root_folder(&config)?,
        };

        // Drive pagination is walked internally, so the whole listing arrives
        // as the first page.
        if page > 1 {
            return Ok(vec![]);
        }

        info!("listing series under folder {root}");

        let mut q = Query::children_of(&root).folders();
        if let Some(keyword) = query.filter(|keyword| !keyword.trim().is_empty()) {
            q = q.name_contains(keyword.trim());
        }

        let files = client.list_files(&q.build(), Some("name")).await?;
        Ok(files.into_iter().map(series_from_folder).collect())
    }

    async fn get_manga_detail(&self, path: String) -> Result<MangaInfo> {
        let config = self.config_snapshot()?;
        let client = self.client(&config)?;

        let folder = client.get_file(&path).await?;
        let children = client
            .list_files(&Query::children_of(&path).build(), Some("name"))
            .await?;

        let mut manga = MangaInfo {
            source_id: ID,
            title: folder.name,
            path,
            ..Default::default()
        };
        manga.cover_url = find_cover(&children).map(|file| client.content_url(&file.id));

        // Optional ComicInfo.xml sidecar; any failure here degrades to bare
        // folder metadata.
        let sidecar = children
            .iter()
            .find(|file| file.name.eq_ignore_ascii_case("comicinfo.xml"));
        if let Some(sidecar) = sidecar {
            match client.download(&sidecar.id).await {
                Ok(bytes) => {
                    let info = comicinfo::parse(&String::from_utf8_lossy(&bytes));
                    if let Some(series) = info.series {
                        manga.title = series;
                    }
                    if let Some(writer) = info.writer {
                        manga.author = vec![writer];
                    }
                    if let Some(penciller) = info.penciller {
                        manga.artist = vec![penciller];
                    }
                    if let Some(genre) = info.genre {
                        manga.genre = genre
                            .split(',')
                            .map(|entry| entry.trim().to_string())
                            .filter(|entry| !entry.is_empty())
                            .collect();
                    }
                    manga.description = info.summary;
                    manga.status = Some(info.status.as_str().to_string());
                }
                Err(e) => {
                    debug!("ComicInfo.xml fetch failed, skipping metadata: {e}");
                }
            }
        }

        Ok(manga)
    }

    async fn get_chapters(&self, path: String) -> Result<Vec<ChapterInfo>> {
        let config = self.config_snapshot()?;
        let client = self.client(&config)?;

        let q = Query::children_of(&path).chapter_candidates().build();
        let files = client.list_files(&q, Some("name desc")).await?;
        Ok(chapters_from_files(files))
    }

    async fn get_pages(&self, path: String) -> Result<Vec<String>> {
        let config = self.config_snapshot()?;
        let client = self.client(&config)?;

        match parse_chapter_path(&path) {
            ChapterPath::Archive { file_id, name } => {
                info!("unpacking archive chapter {name}");
                let bytes = client.download(&file_id).await?;
                Ok(archive::extract_pages(&bytes)?)
            }
            ChapterPath::Folder(folder_id) => {
                let q = Query::children_of(&folder_id).media().build();
                let files = client.list_files(&q, Some("name")).await?;
                Ok(page_files(files)
                    .into_iter()
                    .map(|file| client.content_url(&file.id))
                    .collect())
            }
        }
    }
}
