//! HTTP client for the e-signature service (reqwest-based).
//!
//! Provides an `EsignClient` that discovers the org's API access point,
//! authenticates every request with the integration key, retries
//! transient failures, and expands bulk listings through a
//! concurrency-limited per-record detail fetch.

use crate::auth::{ApiVersion, IntegrationKey};
use crate::error::{EsignError, EsignResult};
use crate::models::{
    ACTIVE_STATUS, CreateGroupRequest, CreateGroupResponse, CreatedUser, EsignUser, GroupId,
    GroupInfo, GroupListing, GroupMembership, NewUser, Role, StateChange, UserDetailPayload,
    UserGroups, UserId, UserListing, UserUpdate,
};
use crate::retry::RetryPolicy;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of concurrent per-user detail fetches.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Configuration for [`EsignClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service host. A bare hostname is reached over https; a full
    /// `http(s)://` URL is used as given.
    pub host: String,
    /// Integration credential.
    pub integration_key: IntegrationKey,
    /// Admin account email, excluded from bulk user fetches.
    pub admin_email: String,
    /// API version, selecting the auth header shape.
    pub api_version: ApiVersion,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Maximum concurrent detail fetches.
    pub concurrency_limit: usize,
    /// Optional pause after each detail fetch, for targets that throttle
    /// aggressively. `None` disables pacing.
    pub throttle_delay: Option<Duration>,
}

impl ClientConfig {
    /// Configuration with default tuning for the given identity fields.
    pub fn new(
        host: impl Into<String>,
        integration_key: IntegrationKey,
        admin_email: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            integration_key,
            admin_email: admin_email.into(),
            api_version: ApiVersion::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            throttle_delay: None,
        }
    }
}

#[derive(Debug)]
struct ClientInner {
    config: ClientConfig,
    http: Client,
    /// Discovered API base URL, resolved once on first use.
    api_url: RwLock<Option<String>>,
}

/// HTTP client for one e-signature org.
///
/// Cloning is cheap; clones share the underlying connection pool and the
/// discovered access point.
#[derive(Debug, Clone)]
pub struct EsignClient {
    inner: Arc<ClientInner>,
}

impl EsignClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> EsignResult<Self> {
        if config.host.trim().is_empty() {
            return Err(EsignError::invalid_config("host must not be empty"));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent("inksync-client/1.0")
            .build()
            .map_err(|e| EsignError::invalid_config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(config: ClientConfig, http: Client) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                http,
                api_url: RwLock::new(None),
            }),
        }
    }

    // ── Discovery ─────────────────────────────────────────────────────

    /// Validate the integration key and discover the org's API access
    /// point.
    ///
    /// A non-200 response or a payload without the access-point field
    /// means the credential or host is wrong, which is a configuration
    /// failure. Discovery is therefore never routed through the retry
    /// policy.
    async fn discover_base_uri(&self) -> EsignResult<String> {
        let version = self.inner.config.api_version;
        let endpoint = format!("api/rest/{version}/");
        let url = format!(
            "{}/{endpoint}{}",
            self.host_url(),
            version.base_uri_path()
        );
        debug!("esign GET {}", url);
        let response = self.authed(self.inner.http.get(&url)).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(EsignError::invalid_config(format!(
                "base URI discovery returned {status}, is the integration key valid?"
            )));
        }
        let body = response.text().await?;
        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| EsignError::parse(format!("failed to parse base URI response: {e}")))?;
        let access_point = payload
            .get(version.access_point_field())
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                EsignError::invalid_config(format!(
                    "base URI response is missing '{}'",
                    version.access_point_field()
                ))
            })?;
        let api_url = format!("{access_point}{endpoint}");
        debug!(api_url = %api_url, "resolved API access point");
        Ok(api_url)
    }

    /// The API base URL, discovering and memoizing it on first use.
    async fn api_url(&self) -> EsignResult<String> {
        {
            let cached = self.inner.api_url.read().await;
            if let Some(url) = cached.as_ref() {
                return Ok(url.clone());
            }
        }
        let resolved = self.discover_base_uri().await?;
        let mut cached = self.inner.api_url.write().await;
        let url = cached.get_or_insert(resolved);
        Ok(url.clone())
    }

    fn host_url(&self) -> String {
        let host = self.inner.config.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    // ── User Operations ───────────────────────────────────────────────

    /// List every user and expand each through a per-id detail fetch
    /// (GET users, then GET users/{id} under the concurrency limit).
    ///
    /// Inactive accounts and the configured admin account are dropped.
    /// Records are keyed by lowercased email. One failing detail fetch is
    /// logged and excluded without aborting the rest; the listing call
    /// itself failing aborts the whole operation.
    pub async fn get_users(&self) -> EsignResult<HashMap<String, EsignUser>> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}users");
        info!("listing e-signature users");
        let listing: UserListing = self
            .inner
            .config
            .retry
            .execute("get_users", || self.get_json(&url))
            .await?;

        let semaphore = Arc::new(Semaphore::new(self.inner.config.concurrency_limit.max(1)));
        let mut tasks: JoinSet<(UserId, EsignResult<Option<EsignUser>>)> = JoinSet::new();
        for stub in listing.user_info_list {
            let client = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => client.fetch_user_detail(&stub.user_id).await,
                    Err(_) => Err(EsignError::network("detail fetch gate closed")),
                };
                (stub.user_id, result)
            });
        }

        let mut users = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Some(user)))) => {
                    users.insert(user.email.to_lowercase(), user);
                }
                Ok((_, Ok(None))) => {}
                Ok((user_id, Err(e))) => {
                    warn!(user_id = %user_id, error = %e, "skipping user after failed detail fetch");
                }
                Err(e) => {
                    warn!(error = %e, "detail fetch task did not complete");
                }
            }
        }
        info!(count = users.len(), "expanded user details");
        Ok(users)
    }

    /// Fetch one user's detail record (GET users/{id}), retried and
    /// paced by the optional throttle delay.
    ///
    /// Returns `Ok(None)` for records the sync pipeline must not see:
    /// inactive accounts and the admin account itself.
    async fn fetch_user_detail(&self, user_id: &UserId) -> EsignResult<Option<EsignUser>> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}users/{user_id}");
        let payload: UserDetailPayload = self
            .inner
            .config
            .retry
            .execute("get_user", || self.get_json(&url))
            .await?;
        if let Some(delay) = self.inner.config.throttle_delay {
            tokio::time::sleep(delay).await;
        }

        if payload.user_status != ACTIVE_STATUS {
            debug!(user_id = %user_id, status = %payload.user_status, "skipping inactive user");
            return Ok(None);
        }
        if payload
            .email
            .eq_ignore_ascii_case(&self.inner.config.admin_email)
        {
            debug!(user_id = %user_id, "skipping admin account");
            return Ok(None);
        }

        let roles = match payload.roles {
            Some(roles) if !roles.is_empty() => roles,
            _ => vec![Role::normal_user()],
        };
        Ok(Some(EsignUser {
            user_id: user_id.clone(),
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            user_status: payload.user_status,
            group_id: payload.group_id,
            roles,
        }))
    }

    /// Fetch group memberships for the given users (GET
    /// users/{id}/groups), under the same concurrency limit as the
    /// detail fetch.
    ///
    /// A failing membership fetch is logged and the user omitted from
    /// the result.
    pub async fn get_user_groups(
        &self,
        user_ids: &[UserId],
    ) -> EsignResult<HashMap<UserId, Vec<GroupMembership>>> {
        let api_url = self.api_url().await?;
        let semaphore = Arc::new(Semaphore::new(self.inner.config.concurrency_limit.max(1)));
        let mut tasks: JoinSet<(UserId, EsignResult<UserGroups>)> = JoinSet::new();
        for user_id in user_ids {
            let client = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let user_id = user_id.clone();
            let url = format!("{api_url}users/{user_id}/groups");
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        client
                            .inner
                            .config
                            .retry
                            .execute("get_user_groups", || client.get_json(&url))
                            .await
                    }
                    Err(_) => Err(EsignError::network("membership fetch gate closed")),
                };
                (user_id, result)
            });
        }

        let mut memberships = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((user_id, Ok(payload))) => {
                    memberships.insert(user_id, payload.group_info_list);
                }
                Ok((user_id, Err(e))) => {
                    warn!(user_id = %user_id, error = %e, "skipping memberships after failed fetch");
                }
                Err(e) => {
                    warn!(error = %e, "membership fetch task did not complete");
                }
            }
        }
        Ok(memberships)
    }

    /// Create a user (POST users), returning the assigned id.
    pub async fn insert_user(&self, user: &NewUser) -> EsignResult<UserId> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}users");
        info!(email = %user.email, "creating e-signature user");
        let created: CreatedUser = self
            .inner
            .config
            .retry
            .execute("insert_user", || self.post_json(&url, user))
            .await?;
        Ok(created.user_id)
    }

    /// Replace a user's profile and roles (PUT users/{id}).
    pub async fn update_user(&self, user_id: &UserId, update: &UserUpdate) -> EsignResult<()> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}users/{user_id}");
        info!(user_id = %user_id, "updating e-signature user");
        self.inner
            .config
            .retry
            .execute("update_user", || self.put_ok(&url, update))
            .await
    }

    /// Replace a user's group memberships (PUT users/{id}/groups).
    pub async fn update_user_groups(
        &self,
        user_id: &UserId,
        groups: &[GroupId],
    ) -> EsignResult<()> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}users/{user_id}/groups");
        let body = UserGroups {
            group_info_list: groups
                .iter()
                .cloned()
                .map(|group_id| GroupMembership {
                    group_id,
                    group_name: None,
                })
                .collect(),
        };
        info!(user_id = %user_id, "updating e-signature user groups");
        self.inner
            .config
            .retry
            .execute("update_user_groups", || self.put_ok(&url, &body))
            .await
    }

    /// Deactivate a user (PUT users/{id}/state).
    pub async fn deactivate_user(&self, user_id: &UserId) -> EsignResult<()> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}users/{user_id}/state");
        let body = StateChange::inactive();
        info!(user_id = %user_id, "deactivating e-signature user");
        self.inner
            .config
            .retry
            .execute("deactivate_user", || self.put_ok(&url, &body))
            .await
    }

    // ── Group Operations ──────────────────────────────────────────────

    /// List every group in the org (GET groups).
    pub async fn get_groups(&self) -> EsignResult<Vec<GroupInfo>> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}groups");
        info!("listing e-signature groups");
        let listing: GroupListing = self
            .inner
            .config
            .retry
            .execute("get_groups", || self.get_json(&url))
            .await?;
        Ok(listing.group_info_list)
    }

    /// Create a group (POST groups), returning the assigned id.
    pub async fn create_group(&self, name: &str) -> EsignResult<GroupId> {
        let api_url = self.api_url().await?;
        let url = format!("{api_url}groups");
        let body = CreateGroupRequest {
            group_name: name.to_string(),
        };
        info!(group = name, "creating e-signature group");
        let created: CreateGroupResponse = self
            .inner
            .config
            .retry
            .execute("create_group", || self.post_json(&url, &body))
            .await?;
        Ok(created.group_id)
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        self.inner
            .config
            .integration_key
            .apply(self.inner.config.api_version, builder)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> EsignResult<T> {
        debug!("esign GET {}", url);
        let builder = self.authed(self.inner.http.get(url));
        let response = builder
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> EsignResult<T> {
        debug!("esign POST {}", url);
        let builder = self.authed(self.inner.http.post(url));
        let response = builder
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn put_ok<B: Serialize>(&self, url: &str, body: &B) -> EsignResult<()> {
        debug!("esign PUT {}", url);
        let builder = self.authed(self.inner.http.put(url));
        let response = builder
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> EsignResult<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| EsignError::parse(format!("failed to parse response: {e}")))
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: Response) -> EsignResult<T> {
        let status = response.status();
        let headers = format!("{:?}", response.headers());

        // Retry-After is reported for diagnostics; the retry policy keeps
        // its own deterministic schedule.
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(retry_after_secs = ?retry_after, "rate limited by the service");
            return Err(EsignError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if status.is_server_error() {
            return Err(EsignError::Server {
                status: status.as_u16(),
                detail: if body.is_empty() {
                    format!("headers: {headers}")
                } else {
                    body
                },
            });
        }

        let reason = status.canonical_reason().unwrap_or("unknown");
        error!(status = status.as_u16(), reason, headers = %headers, "request rejected by the service");
        Err(EsignError::Rejected {
            status: status.as_u16(),
            reason: reason.to_string(),
            headers,
        })
    }
}
