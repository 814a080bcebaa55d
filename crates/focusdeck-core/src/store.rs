//! Async HTTP client for the Vikunja-style task store.
//!
//! Thin wrapper over the store's REST API: bearer auth, page-at-a-time
//! task listing, and the small set of write operations the CLI exposes.
//! Transport failures and 5xx responses are retried a fixed number of
//! times; every other error status is returned to the caller as-is.

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::Settings;
use crate::error::StoreError;
use crate::model::{Comment, Project, Task};

const PER_PAGE: usize = 100;
const MAX_ATTEMPTS: usize = 3;

/// Partial update for a task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<crate::model::EnergyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.done.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.energy.is_none()
            && self.estimated_minutes.is_none()
    }
}

/// Fields for creating a task.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<crate::model::EnergyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
}

/// HTTP client for the task store API.
pub struct TaskStore {
    http: Client,
    base: Url,
    token: String,
}

impl TaskStore {
    /// Create a client for the given endpoint.
    pub fn new(base_url: &str, token: &str) -> Result<Self, StoreError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|_| StoreError::InvalidBaseUrl(base_url.to_string()))?;
        Ok(Self {
            http: Client::new(),
            base,
            token: token.to_string(),
        })
    }

    /// Create a client from loaded settings, requiring a token.
    pub fn from_settings(settings: &Settings) -> Result<Self, StoreError> {
        if settings.store.token.is_empty() {
            return Err(StoreError::MissingToken);
        }
        Self::new(&settings.store.url, &settings.store.token)
    }

    /// All tasks, optionally narrowed by a store filter expression.
    /// Follows pagination until a short page.
    pub async fn all_tasks(&self, filter: Option<&str>) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = Vec::new();
        let mut page = 1usize;

        loop {
            let mut query = vec![
                ("per_page".to_string(), PER_PAGE.to_string()),
                ("page".to_string(), page.to_string()),
            ];
            if let Some(filter) = filter {
                query.push(("filter".to_string(), filter.to_string()));
            }

            let batch: Vec<Task> = self
                .request(Method::GET, "api/v1/tasks/all", &query, None::<&()>)
                .await?;
            let short_page = batch.len() < PER_PAGE;
            tasks.extend(batch);
            if short_page {
                break;
            }
            page += 1;
        }

        debug!(count = tasks.len(), "fetched tasks from store");
        Ok(tasks)
    }

    /// All incomplete tasks.
    pub async fn incomplete_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.all_tasks(Some("done = false")).await
    }

    /// A single task by id.
    pub async fn task(&self, task_id: i64) -> Result<Task, StoreError> {
        self.request(Method::GET, &format!("api/v1/tasks/{task_id}"), &[], None::<&()>)
            .await
    }

    /// All projects.
    pub async fn projects(&self) -> Result<Vec<Project>, StoreError> {
        self.request(Method::GET, "api/v1/projects", &[], None::<&()>)
            .await
    }

    /// A single project by id.
    pub async fn project(&self, project_id: i64) -> Result<Project, StoreError> {
        self.request(
            Method::GET,
            &format!("api/v1/projects/{project_id}"),
            &[],
            None::<&()>,
        )
        .await
    }

    /// Create a task in a project.
    pub async fn create_task(&self, task: &NewTask) -> Result<Task, StoreError> {
        self.request(
            Method::PUT,
            &format!("api/v1/projects/{}/tasks", task.project_id),
            &[],
            Some(task),
        )
        .await
    }

    /// Apply a partial update to a task.
    pub async fn update_task(&self, task_id: i64, patch: &TaskPatch) -> Result<Task, StoreError> {
        self.request(
            Method::POST,
            &format!("api/v1/tasks/{task_id}"),
            &[],
            Some(patch),
        )
        .await
    }

    /// Comments on a task.
    pub async fn comments(&self, task_id: i64) -> Result<Vec<Comment>, StoreError> {
        self.request(
            Method::GET,
            &format!("api/v1/tasks/{task_id}/comments"),
            &[],
            None::<&()>,
        )
        .await
    }

    /// Add a comment to a task.
    pub async fn add_comment(&self, task_id: i64, comment: &str) -> Result<Comment, StoreError> {
        let body = serde_json::json!({ "comment": comment });
        self.request(
            Method::PUT,
            &format!("api/v1/tasks/{task_id}/comments"),
            &[],
            Some(&body),
        )
        .await
    }

    /// One request with retries on transport errors and 5xx responses.
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<T, StoreError> {
        let url = self
            .base
            .join(path)
            .map_err(|_| StoreError::InvalidBaseUrl(path.to_string()))?;

        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            let mut req = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&self.token)
                .query(query);
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<T>()
                            .await
                            .map_err(|e| StoreError::Decode(e.to_string()));
                    }
                    let message = resp.text().await.unwrap_or_default();
                    if status.is_server_error() {
                        warn!(%status, attempt, "store server error, retrying");
                        last_error = format!("HTTP {status}: {message}");
                        continue;
                    }
                    return Err(StoreError::Http {
                        status: status.as_u16(),
                        message: truncate(&message),
                    });
                }
                Err(err) => {
                    warn!(%err, attempt, "store request error, retrying");
                    last_error = err.to_string();
                    continue;
                }
            }
        }

        Err(StoreError::ExhaustedRetries {
            attempts: MAX_ATTEMPTS,
            message: last_error,
        })
    }
}

fn truncate(message: &str) -> String {
    const LIMIT: usize = 200;
    if message.chars().count() > LIMIT {
        let cut: String = message.chars().take(LIMIT).collect();
        format!("{cut}...")
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_for(server: &mockito::ServerGuard) -> TaskStore {
        TaskStore::new(&server.url(), "test-token").unwrap()
    }

    #[tokio::test]
    async fn fetches_tasks_with_bearer_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tasks/all")
            .match_header("authorization", "Bearer test-token")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_body(r#"[{"id": 1, "title": "a", "project_id": 2}]"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let tasks = store.all_tasks(None).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn paginates_until_short_page() {
        let mut server = mockito::Server::new_async().await;
        let full_page: Vec<serde_json::Value> = (0..100)
            .map(|i| serde_json::json!({"id": i, "title": "t", "project_id": 1}))
            .collect();
        let page1 = server
            .mock("GET", "/api/v1/tasks/all")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_body(serde_json::to_string(&full_page).unwrap())
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/api/v1/tasks/all")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_body(r#"[{"id": 100, "title": "t", "project_id": 1}]"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let tasks = store.all_tasks(None).await.unwrap();
        assert_eq!(tasks.len(), 101);
        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/api/v1/projects")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let store = store_for(&server);
        let err = store.projects().await.unwrap_err();
        match err {
            StoreError::ExhaustedRetries { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tasks/9")
            .with_status(404)
            .with_body("task not found")
            .expect(1)
            .create_async()
            .await;

        let store = store_for(&server);
        let err = store.task(9).await.unwrap_err();
        match err {
            StoreError::Http { status, .. } => assert_eq!(status, 404),
            other => panic!("expected Http error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_sends_only_set_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/tasks/5")
            .match_body(mockito::Matcher::JsonString(r#"{"done": true}"#.into()))
            .with_body(r#"{"id": 5, "title": "t", "done": true, "project_id": 1}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let patch = TaskPatch {
            done: Some(true),
            ..TaskPatch::default()
        };
        let task = store.update_task(5, &patch).await.unwrap();
        assert!(task.done);
        mock.assert_async().await;
    }

    #[test]
    fn missing_token_is_rejected() {
        let settings = Settings::default();
        assert!(matches!(
            TaskStore::from_settings(&settings),
            Err(StoreError::MissingToken)
        ));
    }
}
