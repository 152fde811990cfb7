//! To Do API client against a mocked service

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use graph_client::{GraphClient, TodoApi};
use todo_core::TaskStatus;

fn client_for(server: &MockServer) -> GraphClient {
    GraphClient::from_token("bearer-token").with_base_url(server.uri())
}

#[tokio::test]
async fn lists_are_fetched_with_field_projection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/todo/lists"))
        .and(query_param("$select", "id,displayName"))
        .and(header("Authorization", "Bearer bearer-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                {"id": "list-1", "displayName": "Tasks"},
                {"id": "list-2", "displayName": "Groceries"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lists = client_for(&server).list_task_lists().await.unwrap();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[0].display_name, "Tasks");
}

#[tokio::test]
async fn rejected_projection_falls_back_to_unfiltered_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/todo/lists"))
        .and(query_param("$select", "id,displayName"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": {"code": "invalidRequest"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/todo/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [{"id": "list-1", "displayName": "Tasks", "wellknownListName": "defaultList"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lists = client_for(&server).list_task_lists().await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].id, "list-1");
}

#[tokio::test]
async fn tasks_decode_remote_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/todo/lists/list-1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [{
                "id": "task-1",
                "title": "Finish report",
                "status": "inProgress",
                "importance": "high",
                "dueDateTime": {"dateTime": "2026-08-10T00:00:00.0000000", "timeZone": "UTC"}
            }]
        })))
        .mount(&server)
        .await;

    let tasks = client_for(&server).list_tasks("list-1").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::InProgress);
    assert!(tasks[0].due_date_time.is_some());
}

#[tokio::test]
async fn status_patch_sends_wire_status() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/me/todo/lists/list-1/tasks/task-1"))
        .and(body_json(serde_json::json!({"status": "completed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "task-1", "status": "completed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .set_task_status("list-1", "task-1", TaskStatus::Completed)
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_patch_surfaces_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/me/todo/lists/list-1/tasks/task-1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .set_task_status("list-1", "task-1", TaskStatus::NotStarted)
        .await;
    assert!(result.is_err());
}
