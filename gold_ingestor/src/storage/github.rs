use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::{debug, instrument};

use crate::config::StorageConfig;
use crate::providers::{ClientBuildSnafu, ClientInitError, InvalidHeaderSnafu, MissingEnvVarSnafu};
use crate::storage::{
    ApiSnafu, Blob, BlobStore, ConflictSnafu, DecodeSnafu, ReqwestSnafu, StoreError, Version,
};

const API_BASE: &str = "https://api.github.com";

/// Blob store on top of the GitHub contents API.
///
/// Each key is a file under `directory` in `owner/repo`; the file's git sha is
/// the version token, so GitHub itself rejects stale writes.
#[derive(Debug)]
pub struct GithubStore {
    client: Client,
    contents_url: String,
    branch: Option<String>,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

impl GithubStore {
    /// Creates a store, reading the token from the variable named by `cfg.token_env`.
    pub fn from_env(cfg: &StorageConfig) -> Result<Self, ClientInitError> {
        let token = SecretString::from(get_env_var(&cfg.token_env).context(MissingEnvVarSnafu)?);
        Self::new(cfg, token)
    }

    /// Creates a store with an explicit token.
    pub fn new(cfg: &StorageConfig, token: SecretString) -> Result<Self, ClientInitError> {
        let mut auth = header::HeaderValue::from_str(&format!("token {}", token.expose_secret()))
            .context(InvalidHeaderSnafu)?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        let client = Client::builder()
            .user_agent(concat!("gold-ingestor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        let directory = cfg.directory.trim_matches('/');
        let contents_url = if directory.is_empty() {
            format!("{API_BASE}/repos/{}/{}/contents", cfg.owner, cfg.repo)
        } else {
            format!("{API_BASE}/repos/{}/{}/contents/{directory}", cfg.owner, cfg.repo)
        };

        Ok(Self {
            client,
            contents_url,
            branch: cfg.branch.clone(),
        })
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{key}", self.contents_url)
    }
}

#[async_trait]
impl BlobStore for GithubStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Blob>, StoreError> {
        let mut request = self.client.get(self.url(key));
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }
        let response = request.send().await.context(ReqwestSnafu)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("blob does not exist yet");
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return ApiSnafu {
                key,
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body: ContentsResponse = response.json().await.context(ReqwestSnafu)?;
        let packed: String = body.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| {
                DecodeSnafu {
                    key,
                    message: e.to_string(),
                }
                .build()
            })?;
        let content = String::from_utf8(bytes)
            .map_err(|e| {
                DecodeSnafu {
                    key,
                    message: e.to_string(),
                }
                .build()
            })?;

        Ok(Some(Blob {
            content,
            version: Version(body.sha),
        }))
    }

    #[instrument(skip(self, content))]
    async fn put(
        &self,
        key: &str,
        content: &str,
        expected: Option<&Version>,
        message: &str,
    ) -> Result<Version, StoreError> {
        let body = PutRequest {
            message,
            content: STANDARD.encode(content),
            sha: expected.map(|v| v.0.as_str()),
            branch: self.branch.as_deref(),
        };
        let response = self
            .client
            .put(self.url(key))
            .json(&body)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if status.is_success() {
            let put: PutResponse = response.json().await.context(ReqwestSnafu)?;
            return Ok(Version(put.content.sha));
        }

        let text = response.text().await.unwrap_or_default();
        if is_conflict(status, &text) {
            return ConflictSnafu { key }.fail();
        }
        ApiSnafu {
            key,
            status: status.as_u16(),
            message: text,
        }
        .fail()
    }
}

/// 409 is a sha mismatch; 422 mentioning `sha` is a create over an existing
/// file (or an update of a deleted one).
fn is_conflict(status: StatusCode, body: &str) -> bool {
    status == StatusCode::CONFLICT
        || (status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("sha"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ClientInitError;
    use serial_test::serial;

    #[test]
    #[serial]
    fn token_comes_from_configured_variable() {
        let cfg = StorageConfig {
            token_env: "GOLD_INGESTOR_TEST_TOKEN".into(),
            ..StorageConfig::default()
        };
        // SAFETY: serialized; no other thread reads this variable.
        unsafe {
            std::env::remove_var("GOLD_INGESTOR_TEST_TOKEN");
        }
        assert!(matches!(
            GithubStore::from_env(&cfg),
            Err(ClientInitError::MissingEnvVar { .. })
        ));
        unsafe {
            std::env::set_var("GOLD_INGESTOR_TEST_TOKEN", "ghp_x\n");
        }
        assert!(GithubStore::from_env(&cfg).is_ok());
        unsafe {
            std::env::remove_var("GOLD_INGESTOR_TEST_TOKEN");
        }
    }

    #[test]
    fn conflict_statuses() {
        assert!(is_conflict(StatusCode::CONFLICT, ""));
        assert!(is_conflict(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#
        ));
        assert!(!is_conflict(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"path is invalid"}"#));
        assert!(!is_conflict(StatusCode::FORBIDDEN, "sha"));
    }

    #[test]
    fn contents_url_layout() {
        let cfg = StorageConfig {
            owner: "someone".into(),
            repo: "gold-data".into(),
            directory: "/database/".into(),
            ..StorageConfig::default()
        };
        let store = GithubStore::new(&cfg, SecretString::from("t0ken")).unwrap();
        assert_eq!(
            store.url("2025-06-10.csv"),
            "https://api.github.com/repos/someone/gold-data/contents/database/2025-06-10.csv"
        );
    }

    #[test]
    fn put_body_omits_missing_sha() {
        let body = PutRequest {
            message: "m",
            content: STANDARD.encode("price18,date\n"),
            sha: None,
            branch: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"message": "m", "content": "cHJpY2UxOCxkYXRlCg=="}));
    }
}
