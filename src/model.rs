use std::fmt;
use std::io;
use std::path::PathBuf;

use google_drive3::api::File as RemoteFile;
use google_drive3::oauth2;
use thiserror::Error;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Query used by [`crate::drive::GoogleDrive::list_files`] when none is given.
pub const NOT_A_FOLDER_QUERY: &str = "mimeType != 'application/vnd.google-apps.folder'";

pub const LIST_FIELDS: &str = "nextPageToken, files(id, name)";
pub const CREATE_FOLDER_FIELDS: &str = "id";
pub const UPLOAD_FIELDS: &str = "id,name,parents";

/// A file or folder owned by Drive, identified by its opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
}

impl TryFrom<RemoteFile> for RemoteItem {
    type Error = DriveError;

    fn try_from(file: RemoteFile) -> Result<Self, Self::Error> {
        Ok(RemoteItem {
            id: file.id.ok_or(DriveError::MissingField("id"))?,
            name: file.name.unwrap_or_default(),
            parents: file.parents.unwrap_or_default(),
        })
    }
}

impl fmt::Display for RemoteItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Builds the `name = '...'` search clause, escaping the value for the Drive query language.
#[must_use]
pub fn name_query(name: &str) -> String {
    format!("name = '{}'", escape_query_value(name))
}

#[must_use]
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub type DriveResult<T> = Result<T, DriveError>;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("google drive error: {source}")]
    GoogleDrive {
        #[from]
        source: google_drive3::Error,
    },

    #[error("authorization error: {source}")]
    Auth {
        #[from]
        source: oauth2::Error,
    },

    #[error("cannot read client secret from {}: {source}", path.display())]
    ClientSecret { path: PathBuf, source: io::Error },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("mime type error: {source}")]
    MimeType {
        #[from]
        source: mime::FromStrError,
    },

    #[error("field missing from drive response: {0}")]
    MissingField(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
