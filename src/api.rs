// API client module: a small blocking HTTP client for the Mealie REST API.
// It authenticates once at construction and then decorates every request
// with the bearer token it received.

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::translate::MealieRecipe;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("authentication rejected (status {status}): {body}")]
    AuthRejected { status: u16, body: String },

    #[error("authentication response did not contain a token: {0}")]
    TokenResponse(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Username and password exchanged for a bearer token.
#[derive(Serialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize, Debug)]
struct ImageUrlRequest<'a> {
    url: &'a str,
}

/// Outcome of a request the server answered. HTTP error statuses land here
/// too; only transport failures become a `ClientError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub ok: bool,
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    fn read(res: Response) -> Result<Self, ClientError> {
        let status = res.status();
        let body = res.text()?;
        Ok(RemoteResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            body,
        })
    }

    /// The recipe slug from a `recipes/create` response. Mealie answers with
    /// a JSON string, so the surrounding quotes are dropped.
    pub fn slug(&self) -> &str {
        let mut chars = self.body.chars();
        chars.next();
        chars.next_back();
        chars.as_str()
    }
}

/// The three recipe operations the importer drives.
pub trait RecipeApi {
    fn create_recipe(&self, recipe: &MealieRecipe) -> Result<RemoteResponse, ClientError>;

    fn upload_image(
        &self,
        slug: &str,
        image: Vec<u8>,
        extension: &str,
    ) -> Result<RemoteResponse, ClientError>;

    fn request_image_fetch(&self, slug: &str, url: &str) -> Result<RemoteResponse, ClientError>;
}

/// Authenticated session against one Mealie server. Holds the pooled HTTP
/// client, the `/api/` base URL and the bearer token.
pub struct MealieClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl MealieClient {
    /// Exchange credentials for a token at `auth/token`. `server_url` is the
    /// Mealie root; `/api/` is appended here.
    pub fn login(server_url: &str, credentials: &Credentials) -> Result<Self, ClientError> {
        let base_url = api_base_url(server_url)?;
        let client = Client::builder().build()?;

        let res = client
            .post(join(&base_url, "auth/token")?)
            .form(credentials)
            .send()?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().unwrap_or_default();
            return Err(ClientError::AuthRejected { status, body });
        }
        let token: TokenResponse = res.json().map_err(ClientError::TokenResponse)?;

        Ok(MealieClient {
            client,
            base_url,
            token: token.access_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        join(&self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.token)
    }
}

impl RecipeApi for MealieClient {
    fn create_recipe(&self, recipe: &MealieRecipe) -> Result<RemoteResponse, ClientError> {
        let req = self.client.post(self.url("recipes/create")?).json(recipe);
        RemoteResponse::read(self.authorized(req).send()?)
    }

    fn upload_image(
        &self,
        slug: &str,
        image: Vec<u8>,
        extension: &str,
    ) -> Result<RemoteResponse, ClientError> {
        let part = multipart::Part::bytes(image)
            .file_name("image.jpg")
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("extension", extension.to_string());

        let req = self
            .client
            .put(self.url(&format!("recipes/{slug}/image"))?)
            .multipart(form);
        RemoteResponse::read(self.authorized(req).send()?)
    }

    fn request_image_fetch(&self, slug: &str, url: &str) -> Result<RemoteResponse, ClientError> {
        let req = self
            .client
            .post(self.url(&format!("recipes/{slug}/image"))?)
            .json(&ImageUrlRequest { url });
        RemoteResponse::read(self.authorized(req).send()?)
    }
}

fn api_base_url(server_url: &str) -> Result<Url, ClientError> {
    let raw = format!("{}/api/", server_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
        url: server_url.to_string(),
        reason: e.to_string(),
    })
}

fn join(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path).map_err(|e| ClientError::InvalidUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })
}
