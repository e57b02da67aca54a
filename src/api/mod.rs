//! HTTP gateway to the task-board REST API.

pub mod types;

use std::path::PathBuf;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::board::reorder::MovePatch;
use crate::board::{Board, BoardSummary, Column, Tag, Task, TaskDraft, UserLite, UserProfile};
use crate::session::Session;
use types::{
    BoardView, Credentials, NewBoard, NewColumn, NewTask, ProfileUpdate, RegisterResponse,
    Registration, TokenResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not authorized: session expired or invalid")]
    Unauthorized,
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid API url {0:?}")]
    InvalidUrl(String),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("could not read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Body of a rejected request, when the server sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an avatar. The server may send a path relative to
    /// its own origin.
    pub fn avatar_url(&self, avatar: &str) -> String {
        if avatar.starts_with("http") {
            return avatar.to_string();
        }
        let origin = self.base_url.origin().ascii_serialization();
        format!("{origin}/{}", avatar.trim_start_matches('/'))
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let response = self
            .send(self.http.post(self.url("auth/")?).json(credentials), None)
            .await?;
        let body: TokenResponse = decode(response).await?;
        Ok(Session::new(body.token))
    }

    /// Returns the server's confirmation message.
    pub async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        let response = self
            .send(self.http.post(self.url("register/")?).json(registration), None)
            .await?;
        let body: RegisterResponse = decode(response).await?;
        Ok(body.message)
    }

    pub async fn list_boards(&self, session: &Session) -> Result<Vec<BoardSummary>, ApiError> {
        self.get_json("boards/", session).await
    }

    pub async fn get_board(&self, session: &Session, board_id: u64) -> Result<Board, ApiError> {
        self.get_json(&format!("boards/{board_id}/"), session).await
    }

    pub async fn create_board(&self, session: &Session, board: &NewBoard) -> Result<Board, ApiError> {
        self.post_json("boards/", session, board).await
    }

    pub async fn delete_board(&self, session: &Session, board_id: u64) -> Result<(), ApiError> {
        self.delete(&format!("boards/{board_id}/"), session).await
    }

    pub async fn list_tags(&self, session: &Session) -> Result<Vec<Tag>, ApiError> {
        self.get_json("tags/", session).await
    }

    pub async fn list_users(&self, session: &Session) -> Result<Vec<UserLite>, ApiError> {
        self.get_json("users/", session).await
    }

    pub async fn create_column(&self, session: &Session, column: &NewColumn) -> Result<Column, ApiError> {
        self.post_json("columns/", session, column).await
    }

    pub async fn create_task(&self, session: &Session, task: &NewTask) -> Result<Task, ApiError> {
        self.post_json("tasks/", session, task).await
    }

    /// Partial update. `fields` is any serializable subset of task fields.
    pub async fn patch_task<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        task_id: u64,
        fields: &T,
    ) -> Result<Task, ApiError> {
        let url = self.url(&format!("tasks/{task_id}/"))?;
        let response = self.send(self.http.patch(url).json(fields), Some(session)).await?;
        decode(response).await
    }

    /// Persist a reorder.
    pub async fn move_task(&self, session: &Session, patch: &MovePatch) -> Result<Task, ApiError> {
        self.patch_task(session, patch.task_id, patch).await
    }

    pub async fn edit_task(&self, session: &Session, task_id: u64, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.patch_task(session, task_id, draft).await
    }

    pub async fn delete_task(&self, session: &Session, task_id: u64) -> Result<(), ApiError> {
        self.delete(&format!("tasks/{task_id}/"), session).await
    }

    pub async fn get_profile(&self, session: &Session) -> Result<UserProfile, ApiError> {
        self.get_json("profile/", session).await
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let mut form = Form::new()
            .text("first_name", update.first_name.clone())
            .text("last_name", update.last_name.clone())
            .text("email", update.email.clone())
            .text("position", update.position.clone());
        if let Some(path) = &update.avatar {
            let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
                path: path.clone(),
                source,
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "avatar".to_string());
            form = form.part("avatar", Part::bytes(bytes).file_name(file_name));
        }
        let url = self.url("profile/")?;
        let response = self.send(self.http.patch(url).multipart(form), Some(session)).await?;
        decode(response).await
    }

    /// Board, tags and users, fetched concurrently. Fails if any one fails.
    pub async fn load_board_view(&self, session: &Session, board_id: u64) -> Result<BoardView, ApiError> {
        let (board, tags, users) = tokio::try_join!(
            self.get_board(session, board_id),
            self.list_tags(session),
            self.list_users(session),
        )?;
        Ok(BoardView { board, tags, users })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::InvalidUrl(format!("{}{path}", self.base_url)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, session: &Session) -> Result<T, ApiError> {
        let response = self.send(self.http.get(self.url(path)?), Some(session)).await?;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.http.post(self.url(path)?).json(body), Some(session))
            .await?;
        decode(response).await
    }

    async fn delete(&self, path: &str, session: &Session) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(path)?), Some(session)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder, session: Option<&Session>) -> Result<Response, ApiError> {
        let request = match session {
            Some(session) => request.header(AUTHORIZATION, format!("Token {}", session.token())),
            None => request,
        };
        let response = request.header(ACCEPT, "application/json").send().await?;

        let status = response.status();
        debug!(url = %response.url(), %status, "api response");
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status { status, body })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Trim whitespace and make sure the base URL ends with exactly one `/`, so
/// relative paths join under it.
pub fn normalize_base_url(endpoint: &str) -> Result<Url, ApiError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ApiError::InvalidUrl(endpoint.to_string()));
    }
    Url::parse(&format!("{trimmed}/")).map_err(|_| ApiError::InvalidUrl(endpoint.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::board::Priority;

    fn session() -> Session {
        Session::new("test-token")
    }

    fn board_json(id: u64) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Launch",
            "description": "",
            "columns": [
                {"id": 10, "title": "Todo", "order": 0, "tasks": [
                    {"id": 1, "title": "Write", "priority": "low", "order": 0, "tags": []}
                ]},
                {"id": 11, "title": "Done", "order": 1, "tasks": []}
            ]
        })
    }

    async fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri()).unwrap()
    }

    // --- normalize_base_url ---

    #[test]
    fn test_normalize_base_url_single_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/api").unwrap().as_str(),
            "http://localhost:8000/api/"
        );
        assert_eq!(
            normalize_base_url("  http://localhost:8000/api//  ").unwrap().as_str(),
            "http://localhost:8000/api/"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_garbage() {
        assert!(matches!(normalize_base_url("   "), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(normalize_base_url("not a url"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_avatar_url_resolution() {
        let client = ApiClient::new("http://localhost:8000/api/").unwrap();
        assert_eq!(
            client.avatar_url("/media/avatars/me.png"),
            "http://localhost:8000/media/avatars/me.png"
        );
        assert_eq!(
            client.avatar_url("media/me.png"),
            "http://localhost:8000/media/me.png"
        );
        assert_eq!(client.avatar_url("https://cdn.example/me.png"), "https://cdn.example/me.png");
    }

    // --- requests ---

    #[tokio::test]
    async fn test_login_returns_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/"))
            .and(body_json(json!({"username": "mia", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
            .expect(1)
            .mount(&server)
            .await;

        let creds = Credentials {
            username: "mia".into(),
            password: "pw".into(),
        };
        let session = client(&server).await.login(&creds).await.unwrap();
        assert_eq!(session.token(), "abc");
    }

    #[tokio::test]
    async fn test_login_rejection_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"non_field_errors": ["Unable to log in."]})),
            )
            .mount(&server)
            .await;

        let creds = Credentials {
            username: "mia".into(),
            password: "bad".into(),
        };
        let err = client(&server).await.login(&creds).await.unwrap_err();
        assert_eq!(types::login_error_message(err.body()), "Unable to log in.");
    }

    #[tokio::test]
    async fn test_list_boards_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards/"))
            .and(header("authorization", "Token test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Launch", "description": "Q3", "owner_username": "mia"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let boards = client(&server).await.list_boards(&session()).await.unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].owner_username.as_deref(), Some("mia"));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_variant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})))
            .mount(&server)
            .await;

        let err = client(&server).await.list_boards(&session()).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/tasks/5/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server).await.delete_task(&session(), 5).await.unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_task_sends_null_for_empty_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 77, "title": "New", "priority": "medium", "order": 0, "tags": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let task = NewTask {
            column: 10,
            draft: TaskDraft {
                title: "New".into(),
                ..Default::default()
            },
            order: 0,
        };
        let created = client(&server).await.create_task(&session(), &task).await.unwrap();
        assert_eq!(created.id, 77);

        let requests = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let fields = sent.as_object().unwrap();
        assert!(fields.contains_key("assigned_to"));
        assert!(sent["assigned_to"].is_null());
        assert!(sent["due_date"].is_null());
        assert_eq!(sent["column"], 10);
    }

    #[tokio::test]
    async fn test_move_task_patches_column_and_order() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/tasks/3/"))
            .and(body_json(json!({"column": 11, "order": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3, "title": "Move me", "order": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let patch = MovePatch {
            task_id: 3,
            column: 11,
            order: 0,
        };
        let task = client(&server).await.move_task(&session(), &patch).await.unwrap();
        assert_eq!(task.id, 3);
    }

    #[tokio::test]
    async fn test_edit_task_sends_draft() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/tasks/3/"))
            .and(body_string_contains("\"priority\":\"high\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3, "title": "Edited", "priority": "high"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let draft = TaskDraft {
            title: "Edited".into(),
            priority: Priority::High,
            ..Default::default()
        };
        let task = client(&server).await.edit_task(&session(), 3, &draft).await.unwrap();
        assert_eq!(task.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_load_board_view_joins_all_three() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards/4/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board_json(4)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tags/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "bug", "color": "red"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "username": "mia", "first_name": "Mia", "last_name": "Lee"}
            ])))
            .mount(&server)
            .await;

        let view = client(&server).await.load_board_view(&session(), 4).await.unwrap();
        assert_eq!(view.board.id, 4);
        assert_eq!(view.board.columns.len(), 2);
        assert_eq!(view.board.columns[0].tasks[0].priority, Priority::Low);
        assert_eq!(view.tags.len(), 1);
        assert_eq!(view.users[0].display_name(), "Mia Lee");
    }

    #[tokio::test]
    async fn test_load_board_view_fails_if_any_request_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards/4/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board_json(4)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tags/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(client(&server).await.load_board_view(&session(), 4).await.is_err());
    }

    #[tokio::test]
    async fn test_create_column_and_board() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/columns/"))
            .and(body_json(json!({"board": 4, "title": "Review", "order": 2})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 12, "title": "Review", "order": 2
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/boards/"))
            .and(body_json(json!({"name": "Ops", "description": ""})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "name": "Ops"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server).await;
        let column = api
            .create_column(
                &session(),
                &NewColumn {
                    board: 4,
                    title: "Review".into(),
                    order: 2,
                },
            )
            .await
            .unwrap();
        assert!(column.tasks.is_empty());
        let board = api
            .create_board(
                &session(),
                &NewBoard {
                    name: "Ops".into(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(board.id, 9);
    }

    #[tokio::test]
    async fn test_update_profile_uploads_avatar() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/profile/"))
            .and(body_string_contains("name=\"avatar\"; filename=\"me.png\""))
            .and(body_string_contains("Engineer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7, "username": "mia", "position": "Engineer", "avatar": "/media/me.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let avatar = dir.path().join("me.png");
        std::fs::write(&avatar, b"fake image").unwrap();
        let update = ProfileUpdate {
            position: "Engineer".into(),
            avatar: Some(avatar),
            ..Default::default()
        };
        let profile = client(&server).await.update_profile(&session(), &update).await.unwrap();
        assert_eq!(profile.avatar.as_deref(), Some("/media/me.png"));
    }

    #[tokio::test]
    async fn test_update_profile_missing_avatar_file() {
        let server = MockServer::start().await;
        let update = ProfileUpdate {
            avatar: Some(PathBuf::from("/definitely/not/here.png")),
            ..Default::default()
        };
        let err = client(&server).await.update_profile(&session(), &update).await.unwrap_err();
        assert!(matches!(err, ApiError::File { .. }));
    }
}
