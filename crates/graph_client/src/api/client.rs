//! Client handle for the remote To Do API
//!
//! Constructed once per successful authentication from a bearer token;
//! the session engine owns it and the sync engine only borrows it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;

use todo_core::TaskStatus;

use crate::api::models::{CollectionEnvelope, TodoListRecord, TodoTaskRecord};
use crate::client_trait::TodoApi;
use crate::error::{GraphError, Result};
use crate::http::build_retry_client;

const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

pub struct GraphClient {
    client: Arc<ClientWithMiddleware>,
    access_token: String,
    base_url: String,
}

impl GraphClient {
    /// Build a client handle from an access token, regardless of whether
    /// the token came from the broker or was pushed by the native host.
    pub fn from_token(access_token: impl Into<String>) -> Self {
        Self {
            client: Arc::new(build_retry_client()),
            access_token: access_token.into(),
            base_url: DEFAULT_GRAPH_BASE.to_string(),
        }
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Option<&[(&str, &str)]>,
    ) -> Result<Vec<T>> {
        let mut request = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token));
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraphError::Status(status));
        }
        let envelope = response.json::<CollectionEnvelope<T>>().await?;
        Ok(envelope.value)
    }
}

#[async_trait]
impl TodoApi for GraphClient {
    /// Fetch all task lists, preferring the selective field projection.
    /// If the service rejects the projection the request is retried once
    /// unfiltered; this fallback is unconditional.
    async fn list_task_lists(&self) -> Result<Vec<TodoListRecord>> {
        let url = format!("{}/me/todo/lists", self.base_url);
        match self
            .get_collection(&url, Some(&[("$select", "id,displayName")]))
            .await
        {
            Ok(lists) => Ok(lists),
            Err(err) => {
                warn!("selective lists request failed, retrying unfiltered: {err}");
                self.get_collection(&url, None).await
            }
        }
    }

    async fn list_tasks(&self, list_id: &str) -> Result<Vec<TodoTaskRecord>> {
        let url = format!("{}/me/todo/lists/{}/tasks", self.base_url, list_id);
        self.get_collection(&url, None).await
    }

    async fn set_task_status(
        &self,
        list_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<()> {
        let url = format!(
            "{}/me/todo/lists/{}/tasks/{}",
            self.base_url, list_id, task_id
        );
        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;

        let status_code = response.status();
        if !status_code.is_success() {
            return Err(GraphError::Status(status_code));
        }
        Ok(())
    }
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .field("token_set", &!self.access_token.is_empty())
            .finish()
    }
}
