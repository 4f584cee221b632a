//! Defines the endpoint for creating a new chore.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    chore::{ChoreForm, ChoreState, create_chore},
    db::lock_connection,
    json::ApiJson,
    user::get_or_create_user,
};

/// A route handler for creating a new chore, responds with the created chore.
pub async fn create_chore_endpoint(
    State(state): State<ChoreState>,
    ApiJson(form): ApiJson<ChoreForm>,
) -> Response {
    let result = form.into_new_chore().and_then(|new_chore| {
        let connection = lock_connection(&state.db_connection)?;
        let now = OffsetDateTime::now_utc();
        let user = get_or_create_user(&state.default_user, now, &connection)?;

        create_chore(user.id, new_chore, now, &connection)
    });

    match result {
        Ok(chore) => {
            tracing::info!("Created chore {} \"{}\"", chore.id, chore.name);
            Json(chore).into_response()
        }
        Err(error) => error.into_json_response("Failed to create chore"),
    }
}

#[cfg(test)]
mod create_chore_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        chore::{create_chore_endpoint, get_active_chores},
        endpoints,
        test_utils::{get_test_state, must_get_default_user},
    };

    fn get_test_server() -> (TestServer, crate::AppState) {
        let state = get_test_state();
        let app = Router::new()
            .route(endpoints::CHORES, post(create_chore_endpoint))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
        )
    }

    #[tokio::test]
    async fn can_create_chore() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::CHORES)
            .json(&json!({
                "name": "Feed the dog",
                "description": "Twice a day",
                "amount": "2.50",
                "icon": "dog"
            }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "Feed the dog");
        assert_eq!(body["description"], "Twice a day");
        assert_eq!(body["amount"], "2.50");
        assert_eq!(body["icon"], "dog");
        assert_eq!(body["isActive"], true);

        let connection = state.db_connection.lock().unwrap();
        let user = must_get_default_user(&state, &connection);
        let chores = get_active_chores(user.id, &connection).unwrap();
        assert_eq!(chores.len(), 1);
        assert_eq!(body["id"], chores[0].id);
    }

    #[tokio::test]
    async fn icon_defaults_to_broom() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::CHORES)
            .json(&json!({ "name": "Sweep", "amount": 1 }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["icon"], "broom");
        assert_eq!(body["amount"], "1.00");
        assert_eq!(body["description"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn rejects_invalid_amount() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::CHORES)
            .json(&json!({ "name": "Sweep", "amount": "-1" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Invalid chore data");
        assert_eq!(body["errors"][0]["field"], "amount");
        assert_eq!(
            body["errors"][0]["message"],
            "Amount must be a positive number"
        );
    }

    #[tokio::test]
    async fn rejects_missing_name() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::CHORES)
            .json(&json!({ "amount": "1.00" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errors"][0]["field"], "name");
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::CHORES)
            .bytes("{not json".into())
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body")
        );
    }
}
