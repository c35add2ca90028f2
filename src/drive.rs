use std::fs::File;
use std::path::Path;

use google_drive3::api::File as RemoteFile;
use tracing::{debug, info, instrument};

use crate::config::DriveConfig;
use crate::model::{
    name_query, DriveError, DriveResult, RemoteItem, CREATE_FOLDER_FIELDS, FOLDER_MIME_TYPE,
    LIST_FIELDS, NOT_A_FOLDER_QUERY, UPLOAD_FIELDS,
};
use crate::remote::wrapper::DriveHubClient;
use crate::remote::{DriveApi, ListRequest};

/// Google Drive client. Each operation is one remote call, failures are returned as they come.
pub struct GoogleDrive<A = DriveHubClient> {
    api: A,
    page_size: i32,
}

impl GoogleDrive {
    /// Obtains a credential (reusing, refreshing or asking for one) and connects to Drive.
    pub async fn connect(config: &DriveConfig) -> DriveResult<Self> {
        let api = DriveHubClient::connect(config).await?;
        Ok(Self::with_api(api, config.page_size))
    }
}

impl<A: DriveApi> GoogleDrive<A> {
    pub fn with_api(api: A, page_size: i32) -> Self {
        Self { api, page_size }
    }

    /// The backend every request goes through.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Search files. Without a `query` folders are left out.
    ///
    /// Only the first page is fetched, at most `page_size` items.
    #[instrument(skip(self))]
    pub async fn list_files(&self, query: Option<&str>) -> DriveResult<Vec<RemoteItem>> {
        self.search(query.unwrap_or(NOT_A_FOLDER_QUERY)).await
    }

    /// Ids of everything named exactly `name`, in the order Drive returns them.
    #[instrument(skip(self))]
    pub async fn find_folder_by_name(&self, name: &str) -> DriveResult<Vec<String>> {
        let items = self.search(&name_query(name)).await?;
        Ok(items.into_iter().map(|item| item.id).collect())
    }

    /// Create a folder, under `parent_id` if given, else in the root of My Drive.
    #[instrument(skip(self))]
    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> DriveResult<String> {
        let metadata = RemoteFile {
            name: Some(name.to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: parent_id.map(|id| vec![id.to_string()]),
            ..Default::default()
        };
        let file = self.api.create(metadata, CREATE_FOLDER_FIELDS).await?;
        let id = file.id.ok_or(DriveError::MissingField("id"))?;
        info!("Folder created: {id}");
        Ok(id)
    }

    /// Upload the file at `path` as a new file named after its last path component.
    ///
    /// The content type is guessed from the extension, unknown ones are sent as
    /// `application/octet-stream`.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_file(
        &self,
        parent_id: Option<&str>,
        path: &Path,
    ) -> DriveResult<RemoteItem> {
        let name = path
            .file_name()
            .ok_or(DriveError::InvalidInput("path has no file name"))?
            .to_string_lossy()
            .into_owned();
        let content = File::open(path)?;
        if !content.metadata()?.is_file() {
            return Err(DriveError::InvalidInput("path is not a regular file"));
        }
        let metadata = RemoteFile {
            name: Some(name),
            parents: parent_id.map(|id| vec![id.to_string()]),
            ..Default::default()
        };
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();
        debug!(%mime_type, "uploading");
        let file = self
            .api
            .upload(metadata, content, mime_type, UPLOAD_FIELDS)
            .await?;
        let item = RemoteItem::try_from(file)?;
        info!("File ID: {}", item.id);
        Ok(item)
    }

    async fn search(&self, query: &str) -> DriveResult<Vec<RemoteItem>> {
        let request = ListRequest {
            query: query.to_string(),
            page_size: self.page_size,
            fields: LIST_FIELDS.to_string(),
        };
        debug!(?request, "searching");
        let list = self.api.list(request).await?;
        if list.next_page_token.is_some() {
            debug!("more results available, only the first page is returned");
        }
        list.files
            .unwrap_or_default()
            .into_iter()
            .map(RemoteItem::try_from)
            .collect()
    }
}
