use std::path::PathBuf;

pub const DEFAULT_CLIENT_SECRET_FILE: &str = "credentials.json";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";
pub const DEFAULT_PAGE_SIZE: i32 = 10;

/// Where credentials live and how requests are shaped.
///
/// **`client_secret_path`** OAuth client secret as downloaded from
/// <https://console.cloud.google.com/apis/credentials>, read only
/// **`token_path`** persisted credential, read and written automatically
/// **`page_size`** max items returned by a search, only the first page is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    pub client_secret_path: PathBuf,
    pub token_path: PathBuf,
    pub page_size: i32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            client_secret_path: PathBuf::from(DEFAULT_CLIENT_SECRET_FILE),
            token_path: PathBuf::from(DEFAULT_TOKEN_FILE),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DriveConfig {
    #[must_use]
    pub fn with_client_secret_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_secret_path = path.into();
        self
    }

    #[must_use]
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }
}
