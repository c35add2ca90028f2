use async_trait::async_trait;
use google_drive3::api::{File as RemoteFile, FileList};
use google_drive3::hyper::client::HttpConnector;
use google_drive3::hyper_rustls::HttpsConnector;
use google_drive3::DriveHub;
use mime::Mime;

use crate::model::DriveResult;

pub mod token_store;
pub mod wrapper;

pub type Hub = DriveHub<HttpsConnector<HttpConnector>>;

/// Parameters of a `files.list` search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub query: String,
    pub page_size: i32,
    pub fields: String,
}

/// The remote calls the client is built on. Each method is exactly one Drive request.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// `files.list`, first page only.
    async fn list(&self, request: ListRequest) -> DriveResult<FileList>;

    /// `files.create` with metadata only, no media body.
    async fn create(&self, metadata: RemoteFile, fields: &str) -> DriveResult<RemoteFile>;

    /// `files.create` with `content` sent as the media body.
    async fn upload(
        &self,
        metadata: RemoteFile,
        content: std::fs::File,
        mime_type: Mime,
        fields: &str,
    ) -> DriveResult<RemoteFile>;
}
