use std::io::Cursor;

use async_trait::async_trait;
use google_drive3::api::{File as RemoteFile, FileList, Scope};
use google_drive3::hyper::client::HttpConnector;
use google_drive3::hyper_rustls::HttpsConnector;
use google_drive3::{hyper, hyper_rustls, oauth2, DriveHub};
use mime::Mime;
use tracing::{debug, info, instrument};

use crate::config::DriveConfig;
use crate::model::{DriveError, DriveResult};
use crate::remote::token_store::TokenFileStorage;
use crate::remote::{DriveApi, Hub, ListRequest};

/// [`DriveApi`] backed by the generated Drive v3 client.
pub struct DriveHubClient {
    hub: Hub,
}

impl DriveHubClient {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }

    /// Authorizes against Drive and builds the client, see [`setup_api`].
    pub async fn connect(config: &DriveConfig) -> DriveResult<Self> {
        Ok(Self::new(setup_api(config).await?))
    }
}

#[async_trait]
impl DriveApi for DriveHubClient {
    #[instrument(skip(self))]
    async fn list(&self, request: ListRequest) -> DriveResult<FileList> {
        let (_, list) = self
            .hub
            .files()
            .list()
            .q(&request.query)
            .page_size(request.page_size)
            .param("fields", request.fields.as_str())
            .add_scope(Scope::Full)
            .doit()
            .await?;
        Ok(list)
    }

    #[instrument(skip(self))]
    async fn create(&self, metadata: RemoteFile, fields: &str) -> DriveResult<RemoteFile> {
        // files.create has no metadata only call, send an empty media body of the same type
        let mime_type = match metadata.mime_type.as_deref() {
            Some(mime_type) => mime_type.parse::<Mime>()?,
            None => mime::APPLICATION_OCTET_STREAM,
        };
        let (_, file) = self
            .hub
            .files()
            .create(metadata)
            .param("fields", fields)
            .add_scope(Scope::Full)
            .upload(Cursor::new(vec![]), mime_type)
            .await?;
        Ok(file)
    }

    #[instrument(skip(self, content))]
    async fn upload(
        &self,
        metadata: RemoteFile,
        content: std::fs::File,
        mime_type: Mime,
        fields: &str,
    ) -> DriveResult<RemoteFile> {
        let (_, file) = self
            .hub
            .files()
            .create(metadata)
            .param("fields", fields)
            .add_scope(Scope::Full)
            .upload(content, mime_type)
            .await?;
        Ok(file)
    }
}

/// Loads the client secret, makes sure a usable credential exists and builds the hub.
///
/// A stored credential is reused while valid and refreshed once expired if it has a
/// refresh token. Otherwise the installed app flow runs: the user is asked to open the
/// consent page and the redirect lands on a loopback server on an ephemeral port.
/// Whatever credential comes out of that is written to `config.token_path`.
pub async fn setup_api(config: &DriveConfig) -> DriveResult<Hub> {
    info!("Setting up API");

    let secret = oauth2::read_application_secret(&config.client_secret_path)
        .await
        .map_err(|source| DriveError::ClientSecret {
            path: config.client_secret_path.clone(),
            source,
        })?;
    let auth = oauth2::InstalledFlowAuthenticator::builder(
        secret,
        oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .with_storage(Box::new(TokenFileStorage::new(config.token_path.clone())))
    .build()
    .await?;

    // authorize now instead of on the first request
    auth.token(&[Scope::Full]).await?;
    debug!(token = %config.token_path.display(), "credential ready");

    let hub = DriveHub::new(https_client(), auth);
    info!("API setup done");

    Ok(hub)
}

fn https_client() -> hyper::Client<HttpsConnector<HttpConnector>> {
    hyper::Client::builder().build(
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build(),
    )
}
