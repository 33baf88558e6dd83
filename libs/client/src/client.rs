//! HTTP client for API communication.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::types::{
    Activity, AddDomainRequest, Domain, Environment, Identity, ListResponse, Project,
};

/// API client for communicating with the Cumulus platform.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for `base_url`, optionally authenticated
    /// with a bearer token.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::Unauthorized)?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        self.handle_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "DELETE");
        let response = self.client.delete(self.url(path)).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error(response).await
        }
    }

    /// Handle a successful or error response.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if response.status().is_success() {
            response.json().await.map_err(ApiError::Decode)
        } else {
            self.handle_error(response).await
        }
    }

    /// Handle an error response.
    async fn handle_error<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();

        let error_body: ApiErrorResponse =
            response.json().await.unwrap_or_else(|_| ApiErrorResponse {
                code: "unknown".to_string(),
                message: "Unknown error".to_string(),
            });

        if status == 401 {
            return Err(ApiError::Unauthorized);
        }

        Err(ApiError::Remote {
            status,
            code: error_body.code,
            message: error_body.message,
        })
    }

    // ── Projects ────────────────────────────────────────────────────────

    pub async fn project(&self, project: &str) -> Result<Project, ApiError> {
        self.get(&format!("/v1/projects/{project}")).await
    }

    // ── Environments ────────────────────────────────────────────────────

    /// Fetch the current environment snapshot for a project.
    pub async fn environments(&self, project: &str) -> Result<Vec<Environment>, ApiError> {
        let response: ListResponse<Environment> = self
            .get(&format!("/v1/projects/{project}/environments"))
            .await?;
        Ok(response.items)
    }

    /// Refresh a single environment.
    pub async fn environment(&self, project: &str, env: &str) -> Result<Environment, ApiError> {
        self.get(&format!("/v1/projects/{project}/environments/{env}"))
            .await
    }

    /// Deactivate an environment. Returns the activity tracking the
    /// deactivation.
    pub async fn deactivate_environment(
        &self,
        project: &str,
        env: &str,
    ) -> Result<Activity, ApiError> {
        self.post(
            &format!("/v1/projects/{project}/environments/{env}/deactivate"),
            &serde_json::json!({}),
        )
        .await
    }

    /// Delete an environment's underlying branch. The environment must be
    /// inactive; deleting an active environment is rejected server-side.
    pub async fn delete_environment(&self, project: &str, env: &str) -> Result<(), ApiError> {
        self.delete(&format!("/v1/projects/{project}/environments/{env}"))
            .await
    }

    /// Start a backup of an environment.
    pub async fn backup_environment(
        &self,
        project: &str,
        env: &str,
    ) -> Result<Activity, ApiError> {
        self.post(
            &format!("/v1/projects/{project}/environments/{env}/backup"),
            &serde_json::json!({}),
        )
        .await
    }

    /// Synchronize code and/or data from an environment's parent.
    pub async fn synchronize_environment(
        &self,
        project: &str,
        env: &str,
        code: bool,
        data: bool,
    ) -> Result<Activity, ApiError> {
        self.post(
            &format!("/v1/projects/{project}/environments/{env}/synchronize"),
            &SynchronizeRequest {
                synchronize_code: code,
                synchronize_data: data,
            },
        )
        .await
    }

    // ── Activities ──────────────────────────────────────────────────────

    /// List activities for an environment, newest first. A `limit` of 0
    /// means no limit; `type_filter` restricts to one activity type.
    pub async fn environment_activities(
        &self,
        project: &str,
        env: &str,
        limit: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<Activity>, ApiError> {
        let mut path = format!("/v1/projects/{project}/environments/{env}/activities");
        let mut sep = '?';
        if limit > 0 {
            path.push_str(&format!("{sep}limit={limit}"));
            sep = '&';
        }
        if let Some(activity_type) = type_filter {
            path.push_str(&format!("{sep}type={activity_type}"));
        }

        let response: ListResponse<Activity> = self.get(&path).await?;
        Ok(response.items)
    }

    /// Fetch the current state of one activity.
    pub async fn activity(&self, project: &str, activity: &str) -> Result<Activity, ApiError> {
        self.get(&format!("/v1/projects/{project}/activities/{activity}"))
            .await
    }

    /// Restore the backup recorded by a completed `environment.backup`
    /// activity. Returns the activity tracking the restoration.
    pub async fn restore_backup(
        &self,
        project: &str,
        activity: &str,
    ) -> Result<Activity, ApiError> {
        self.post(
            &format!("/v1/projects/{project}/activities/{activity}/restore"),
            &serde_json::json!({}),
        )
        .await
    }

    // ── Domains ─────────────────────────────────────────────────────────

    pub async fn domains(&self, project: &str) -> Result<Vec<Domain>, ApiError> {
        let response: ListResponse<Domain> =
            self.get(&format!("/v1/projects/{project}/domains")).await?;
        Ok(response.items)
    }

    /// Add a domain to a project. Creation is synchronous; the validated
    /// SSL bundle, if any, is submitted inline.
    pub async fn add_domain(
        &self,
        project: &str,
        request: &AddDomainRequest,
    ) -> Result<Domain, ApiError> {
        self.post(&format!("/v1/projects/{project}/domains"), request)
            .await
    }

    // ── Auth ────────────────────────────────────────────────────────────

    pub async fn whoami(&self) -> Result<Identity, ApiError> {
        self.get("/v1/auth/whoami").await
    }
}

/// Synchronize request body.
#[derive(Debug, Serialize)]
struct SynchronizeRequest {
    synchronize_code: bool,
    synchronize_data: bool,
}

/// API error response structure.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: String,
    message: String,
}
