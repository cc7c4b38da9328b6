use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use shared_types::{
    ApiResponse, AssignLeadRequest, Branch, CreateBranchRequest, CreateLeadRequest,
    CreateTaskRequest, CreateUserRequest, DeleteRequest, Lead, LeadHistoryResponse, LeadRoute,
    ListQuery, LoginRequest, LoginResponse, Paginated, Task, UpdateBranchRequest,
    UpdateLeadRequest, UpdateLeadStatusRequest, UpdateTaskRequest, UpdateUserRequest, User,
};
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::{SessionProvider, StoredSession};

/// Typed client for the CRM JSON API. The bearer token comes from the
/// injected [`SessionProvider`]; a 401 clears it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

/// Source of lead pages for a lead board.
#[async_trait]
pub trait LeadFetcher: Send + Sync {
    async fn fetch_leads(
        &self,
        route: LeadRoute,
        query: &ListQuery,
    ) -> Result<Paginated<Lead>, ClientError>;
}

pub fn lead_list_path(route: LeadRoute) -> &'static str {
    match route {
        LeadRoute::Leads | LeadRoute::LeadsAdmin => "/lead/getAll/en",
        LeadRoute::BranchLeads => "/lead/branch/en",
        LeadRoute::SalesManagerLeads => "/sales/en",
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionProvider>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<dyn SessionProvider> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.session.token().ok_or(ClientError::SessionExpired)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    /// Sends the request and unwraps the `{success, message, data}` envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let envelope: Option<ApiResponse<IgnoredAny>> = serde_json::from_slice(&body).ok();
            let requires_auth = envelope
                .as_ref()
                .and_then(|e| e.requires_auth)
                .unwrap_or(false);
            let message = envelope.map(|e| e.message).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

            if status == StatusCode::UNAUTHORIZED || requires_auth {
                if let Err(e) = self.session.clear() {
                    tracing::warn!("Failed to clear expired session: {}", e);
                }
                return Err(ClientError::SessionExpired);
            }

            tracing::debug!("API call failed with {}: {}", status, message);
            return Err(ClientError::from_status(status.as_u16(), message));
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: envelope.message,
            });
        }

        match envelope.data {
            Some(data) => Ok(data),
            // `data: null` is how unit results arrive
            None => serde_json::from_value(serde_json::Value::Null)
                .map_err(|_| ClientError::Decode("Response did not include data".to_string())),
        }
    }

    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ClientError> {
        self.send(self.authorized(Method::GET, path)?.query(query))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.authorized(Method::POST, path)?.json(body))
            .await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.authorized(Method::PATCH, path)?.json(body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let login: LoginResponse = self
            .send(self.request(Method::POST, "/auth/login/en").json(&body))
            .await?;

        self.session
            .store(StoredSession::from(&login))
            .map_err(|e| ClientError::Decode(format!("Could not save session: {e}")))?;

        tracing::info!("Logged in as {}", login.user.email);
        Ok(login)
    }

    /// Revokes the session on the server and forgets it locally either way.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result: Result<(), ClientError> = self.post("/auth/logout/en", &()).await;
        if let Err(e) = self.session.clear() {
            tracing::warn!("Failed to clear session: {}", e);
        }
        match result {
            Err(ClientError::SessionExpired) => Ok(()),
            other => other,
        }
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        self.send(self.authorized(Method::GET, "/auth/me/en")?).await
    }

    pub async fn leads(&self, route: LeadRoute, query: &ListQuery) -> Result<Paginated<Lead>, ClientError> {
        self.get(lead_list_path(route), query).await
    }

    pub async fn create_lead(&self, request: &CreateLeadRequest) -> Result<Lead, ClientError> {
        self.post("/lead/create/en", request).await
    }

    pub async fn update_lead(&self, request: &UpdateLeadRequest) -> Result<Lead, ClientError> {
        self.patch("/lead/update/en", request).await
    }

    pub async fn update_status(&self, request: &UpdateLeadStatusRequest) -> Result<Lead, ClientError> {
        self.patch("/lead/updateStatus/en", request).await
    }

    pub async fn assign_to_agent(&self, lead_id: i64, agent_id: i64) -> Result<Lead, ClientError> {
        self.patch("/lead/assignToAgent/en", &AssignLeadRequest { lead_id, agent_id })
            .await
    }

    pub async fn delete_lead(&self, id: i64) -> Result<(), ClientError> {
        self.patch("/lead/delete/en", &DeleteRequest { id }).await
    }

    pub async fn lead_history(&self, lead_id: i64) -> Result<LeadHistoryResponse, ClientError> {
        self.get("/lead/history/en", &[("leadId", lead_id)]).await
    }

    pub async fn branches(&self, query: &ListQuery) -> Result<Paginated<Branch>, ClientError> {
        self.get("/branch/getAll/en", query).await
    }

    pub async fn create_branch(&self, request: &CreateBranchRequest) -> Result<Branch, ClientError> {
        self.post("/branch/create/en", request).await
    }

    pub async fn update_branch(&self, request: &UpdateBranchRequest) -> Result<Branch, ClientError> {
        self.patch("/branch/update/en", request).await
    }

    pub async fn delete_branch(&self, id: i64) -> Result<(), ClientError> {
        self.patch("/branch/delete/en", &DeleteRequest { id }).await
    }

    pub async fn users(&self, query: &ListQuery) -> Result<Paginated<User>, ClientError> {
        self.get("/user/getAll/en", query).await
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, ClientError> {
        self.post("/user/create/en", request).await
    }

    pub async fn update_user(&self, request: &UpdateUserRequest) -> Result<User, ClientError> {
        self.patch("/user/update/en", request).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        self.patch("/user/delete/en", &DeleteRequest { id }).await
    }

    pub async fn tasks(&self, query: &ListQuery) -> Result<Paginated<Task>, ClientError> {
        self.get("/task/getAll/en", query).await
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ClientError> {
        self.post("/task/create/en", request).await
    }

    pub async fn update_task(&self, request: &UpdateTaskRequest) -> Result<Task, ClientError> {
        self.patch("/task/update/en", request).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
        self.patch("/task/delete/en", &DeleteRequest { id }).await
    }
}

#[async_trait]
impl LeadFetcher for ApiClient {
    async fn fetch_leads(
        &self,
        route: LeadRoute,
        query: &ListQuery,
    ) -> Result<Paginated<Lead>, ClientError> {
        self.leads(route, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;

    fn client(session: MemorySession) -> ApiClient {
        ApiClient::new(
            &ClientConfig {
                base_url: "http://127.0.0.1:9/api/".to_string(),
                timeout_secs: 1,
            },
            Arc::new(session),
        )
        .unwrap()
    }

    #[test]
    fn test_route_endpoints() {
        assert_eq!(lead_list_path(LeadRoute::Leads), "/lead/getAll/en");
        assert_eq!(lead_list_path(LeadRoute::LeadsAdmin), "/lead/getAll/en");
        assert_eq!(lead_list_path(LeadRoute::BranchLeads), "/lead/branch/en");
        assert_eq!(lead_list_path(LeadRoute::SalesManagerLeads), "/sales/en");
    }

    #[tokio::test]
    async fn test_missing_session_fails_before_sending() {
        let client = client(MemorySession::default());
        let err = client
            .leads(LeadRoute::Leads, &ListQuery::default())
            .await
            .unwrap_err();
        assert!(err.requires_auth());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_network_error() {
        let client = client(MemorySession::new(Some(StoredSession {
            token: "tok".to_string(),
            expires_at: i64::MAX,
            user: None,
        })));
        let err = client
            .leads(LeadRoute::Leads, &ListQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network(_)), "{err:?}");
    }
}
