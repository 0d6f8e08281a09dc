use derive_builder::Builder;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{AuthType, AuthUrl, ClientId, ClientSecret, TokenResponse, TokenUrl};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub mod metrics;
pub mod pipeline;
pub mod profile;
pub mod render;
pub mod template;

pub use metrics::{Level, Metrics, MetricsOptions, SkillLevel};
pub use pipeline::{build_card, write_card, CardJob, ProfileSource};
pub use profile::{CursusId, CursusUser, ProjectStatus, ProjectUser, Skill, UserProfile};
pub use render::{Card, CardConfig, CardConfigBuilder, Palette};
pub use template::{Template, TemplateError};

pub const API_URL: &str = "https://api.intra.42.fr";

#[derive(Debug, Builder)]
#[builder(setter(into))]
/// Intra Api Config
pub struct IntraApiConfig<'a> {
  /// Application UID
  ///
  /// **Required**
  client_id: Cow<'a, str>,
  /// Application secret
  ///
  /// **Required**
  client_secret: Cow<'a, str>,
  #[builder(default = "Cow::Borrowed(API_URL)")]
  /// Base url of the api, without a trailing slash
  ///
  /// **Optional**
  api_url: Cow<'a, str>,
  #[builder(default)]
  /// User Agent Extra
  ///
  /// **Optional**
  user_agent_extra: Cow<'a, str>,
  #[builder(default)]
  /// Custom headers
  ///
  /// **Optional**
  custom_headers: HeaderMap,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type TokenRequestError =
  oauth2::RequestTokenError<oauth2::reqwest::Error<reqwest::Error>, BasicErrorResponse>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntraApiError {
  error: String,
  #[serde(default, alias = "message")]
  error_description: String,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing environment variable {0}")]
  MissingVariable(&'static str),
  #[error(transparent)]
  ConfigBuilderError(#[from] IntraApiConfigBuilderError),
  #[error(transparent)]
  ReqwestError(#[from] reqwest::Error),
  #[error(transparent)]
  ReqwestInvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
  #[error(transparent)]
  UrlParseError(#[from] url::ParseError),
  #[error("token exchange failed: {0}")]
  TokenError(#[from] TokenRequestError),
  #[error("{status}: {error}: {error_description}")]
  IntraApiError {
    status: StatusCode,
    error: String,
    error_description: String,
  },
  #[error("unexpected response status {0}")]
  UnexpectedStatus(StatusCode),
  #[error("cursus {cursus_id} not found in the profile of {login}")]
  CursusNotFound { cursus_id: CursusId, login: String },
  #[error(transparent)]
  TemplateError(#[from] TemplateError),
  #[error("failed to read template {path}: {source}")]
  TemplateRead { path: PathBuf, source: io::Error },
  #[error("failed to write {path}: {source}")]
  Write { path: PathBuf, source: io::Error },
}

/// Coarse classification of an [`Error`], one per exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Configuration,
  Transport,
  NotFound,
  File,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::MissingVariable(_) | Self::ConfigBuilderError(_) | Self::UrlParseError(_) => {
        ErrorKind::Configuration
      }
      Self::ReqwestError(_)
      | Self::ReqwestInvalidHeaderValue(_)
      | Self::TokenError(_)
      | Self::IntraApiError { .. }
      | Self::UnexpectedStatus(_) => ErrorKind::Transport,
      Self::CursusNotFound { .. } => ErrorKind::NotFound,
      Self::TemplateError(_) | Self::TemplateRead { .. } | Self::Write { .. } => ErrorKind::File,
    }
  }

  pub fn exit_code(&self) -> u8 {
    match self.kind() {
      ErrorKind::Configuration => 2,
      ErrorKind::Transport => 3,
      ErrorKind::NotFound => 4,
      ErrorKind::File => 5,
    }
  }
}

#[derive(Debug)]
pub struct IntraApi {
  client: Client,
  api_url: String,
}

impl IntraApi {
  /// Exchanges the application credentials for a token, then builds a client
  /// that sends it on every request.
  pub async fn authenticate(config: IntraApiConfig<'_>) -> Result<Self> {
    let access_token = request_token(&config).await?;

    tracing::info!(api_url = %config.api_url, "authenticated with the intra api");

    Self::with_access_token(config, &access_token)
  }

  pub fn with_access_token(
    IntraApiConfig {
      api_url,
      user_agent_extra,
      custom_headers,
      ..
    }: IntraApiConfig<'_>,
    access_token: &str,
  ) -> Result<Self> {
    let mut headers = custom_headers;
    let user_agent = format!(
      "{}/{}{user_agent_extra}",
      env!("CARGO_PKG_NAME"),
      env!("CARGO_PKG_VERSION")
    );
    let authorization = format!("Bearer {access_token}");
    let mut authorization = HeaderValue::from_str(&authorization)?;

    authorization.set_sensitive(true);

    headers.insert(AUTHORIZATION, authorization);

    let client = ClientBuilder::new()
      .user_agent(user_agent)
      .default_headers(headers)
      .redirect(Policy::none())
      .build()?;

    Ok(Self {
      client,
      api_url: api_url.trim_end_matches('/').to_owned(),
    })
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    self.client.request(method, url)
  }

  fn get(&self, url: Url) -> RequestBuilder {
    self.request(Method::GET, url)
  }

  pub async fn get_user(&self, login: &str) -> Result<UserProfile> {
    let mut url = api_url(&self.api_url, "/v2/users")?;

    url
      .path_segments_mut()
      .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
      .push(login);

    let response = self.get(url).send().await?;
    let profile: UserProfile = json(response).await?;

    tracing::info!(login = %profile.login, cursus = profile.cursus_users.len(), "fetched user");

    Ok(profile)
  }
}

async fn request_token(config: &IntraApiConfig<'_>) -> Result<String> {
  let api_url = config.api_url.trim_end_matches('/');
  let client = BasicClient::new(
    ClientId::new(config.client_id.to_string()),
    Some(ClientSecret::new(config.client_secret.to_string())),
    AuthUrl::new(format!("{api_url}/oauth/authorize"))?,
    Some(TokenUrl::new(format!("{api_url}/oauth/token"))?),
  )
  .set_auth_type(AuthType::RequestBody);

  let token = client
    .exchange_client_credentials()
    .request_async(async_http_client)
    .await?;

  Ok(token.access_token().secret().clone())
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
  let status = response.status();

  if status.is_client_error() || status.is_server_error() {
    let body = response.text().await?;

    return Err(match serde_json::from_str::<IntraApiError>(&body) {
      Ok(error) => Error::IntraApiError {
        status,
        error: error.error,
        error_description: error.error_description,
      },
      Err(_) => Error::UnexpectedStatus(status),
    });
  }

  response.json().await.map_err(Into::into)
}

pub(crate) fn api_url(base: &str, endpoint: &str) -> Result<Url> {
  format!("{base}{endpoint}").parse().map_err(Into::into)
}

#[cfg(test)]
mod tests {
  use crate::{api_url, CursusId, Error, ErrorKind, IntraApiConfigBuilder, API_URL};
  use std::path::PathBuf;

  #[test]
  fn test() {
    let builder = IntraApiConfigBuilder::create_empty()
      .client_id("uid")
      .client_secret("secret")
      .build();

    assert!(builder.is_ok());

    if let Ok(config) = builder {
      assert_eq!(config.client_id, "uid");
      assert_eq!(config.client_secret, "secret");
      assert_eq!(config.api_url, API_URL);
      assert_eq!(config.user_agent_extra, "");
    }
  }

  #[test]
  fn missing_secret_fails_to_build() {
    let builder = IntraApiConfigBuilder::default().client_id("uid").build();

    assert!(builder.is_err());
  }

  #[test]
  fn joins_endpoint() {
    let url = api_url(API_URL, "/v2/users").unwrap();

    assert_eq!(url.as_str(), "https://api.intra.42.fr/v2/users");
  }

  #[test]
  fn exit_codes_are_distinct_per_kind() {
    let missing = Error::MissingVariable("API_UID");
    let not_found = Error::CursusNotFound {
      cursus_id: CursusId::MAIN,
      login: "norminet".into(),
    };
    let write = Error::Write {
      path: PathBuf::from("progress.svg"),
      source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
    };
    let status = Error::UnexpectedStatus(reqwest::StatusCode::BAD_GATEWAY);

    assert_eq!(missing.kind(), ErrorKind::Configuration);
    assert_eq!(not_found.kind(), ErrorKind::NotFound);
    assert_eq!(write.kind(), ErrorKind::File);
    assert_eq!(status.kind(), ErrorKind::Transport);

    let codes = [
      missing.exit_code(),
      status.exit_code(),
      not_found.exit_code(),
      write.exit_code(),
    ];

    assert_eq!(codes, [2, 3, 4, 5]);
    assert_eq!(
      not_found.to_string(),
      "cursus 21 not found in the profile of norminet"
    );
  }
}
