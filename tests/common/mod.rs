use std::collections::VecDeque;
use std::io::Read;
use std::sync::Mutex;

use async_trait::async_trait;
use gdrive_client::remote::{DriveApi, ListRequest};
use gdrive_client::DriveResult;
use google_drive3::api::{File as RemoteFile, FileList};
use mime::Mime;

/// What the client asked Drive to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(ListRequest),
    Create {
        name: Option<String>,
        mime_type: Option<String>,
        parents: Option<Vec<String>>,
        fields: String,
    },
    Upload {
        name: Option<String>,
        parents: Option<Vec<String>>,
        content: Vec<u8>,
        mime_type: String,
        fields: String,
    },
}

/// Records every request and answers with queued responses, or empty ones when nothing is queued.
#[derive(Default)]
pub struct MockDrive {
    calls: Mutex<Vec<Call>>,
    lists: Mutex<VecDeque<DriveResult<FileList>>>,
    files: Mutex<VecDeque<DriveResult<RemoteFile>>>,
}

impl MockDrive {
    pub fn with_list(self, list: DriveResult<FileList>) -> Self {
        self.lists.lock().unwrap().push_back(list);
        self
    }

    pub fn with_file(self, file: DriveResult<RemoteFile>) -> Self {
        self.files.lock().unwrap().push_back(file);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next_file(&self) -> DriveResult<RemoteFile> {
        self.files
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RemoteFile::default()))
    }
}

#[async_trait]
impl DriveApi for MockDrive {
    async fn list(&self, request: ListRequest) -> DriveResult<FileList> {
        self.calls.lock().unwrap().push(Call::List(request));
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FileList::default()))
    }

    async fn create(&self, metadata: RemoteFile, fields: &str) -> DriveResult<RemoteFile> {
        self.calls.lock().unwrap().push(Call::Create {
            name: metadata.name,
            mime_type: metadata.mime_type,
            parents: metadata.parents,
            fields: fields.to_string(),
        });
        self.next_file()
    }

    async fn upload(
        &self,
        metadata: RemoteFile,
        mut content: std::fs::File,
        mime_type: Mime,
        fields: &str,
    ) -> DriveResult<RemoteFile> {
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;
        self.calls.lock().unwrap().push(Call::Upload {
            name: metadata.name,
            parents: metadata.parents,
            content: bytes,
            mime_type: mime_type.to_string(),
            fields: fields.to_string(),
        });
        self.next_file()
    }
}

pub fn remote_file(id: &str, name: &str) -> RemoteFile {
    RemoteFile {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

pub fn file_list(files: Vec<RemoteFile>, next_page_token: Option<&str>) -> FileList {
    FileList {
        files: Some(files),
        next_page_token: next_page_token.map(ToString::to_string),
        ..Default::default()
    }
}
