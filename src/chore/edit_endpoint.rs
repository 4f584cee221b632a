//! Defines the endpoint for editing a chore.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    chore::{ChoreForm, ChoreId, ChoreState, update_chore},
    db::lock_connection,
    json::ApiJson,
    user::get_or_create_user,
};

/// A route handler for changing some of a chore's fields, responds with the updated chore.
pub async fn update_chore_endpoint(
    Path(chore_id): Path<ChoreId>,
    State(state): State<ChoreState>,
    ApiJson(form): ApiJson<ChoreForm>,
) -> Response {
    let result = form.into_update().and_then(|update| {
        let connection = lock_connection(&state.db_connection)?;
        let user = get_or_create_user(&state.default_user, OffsetDateTime::now_utc(), &connection)?;

        update_chore(user.id, chore_id, update, &connection)
    });

    match result {
        Ok(chore) => Json(chore).into_response(),
        Err(error) => error.into_json_response("Failed to update chore"),
    }
}

#[cfg(test)]
mod update_chore_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::patch};
    use axum_test::TestServer;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::OffsetDateTime;

    use crate::{
        AppState, Chore, ChoreIcon, Money, NewChore,
        chore::{create_chore, update_chore_endpoint},
        endpoints::{self, format_endpoint},
        test_utils::{get_test_state, must_get_default_user},
    };

    fn get_test_server_with_chore() -> (TestServer, AppState, Chore) {
        let state = get_test_state();
        let chore = {
            let connection = state.db_connection.lock().unwrap();
            let user = must_get_default_user(&state, &connection);
            create_chore(
                user.id,
                NewChore {
                    name: "Sweep".to_owned(),
                    description: Some("Kitchen".to_owned()),
                    amount: Money::new(dec!(2)),
                    icon: ChoreIcon::Broom,
                },
                OffsetDateTime::now_utc(),
                &connection,
            )
            .unwrap()
        };
        let app = Router::new()
            .route(endpoints::CHORE, patch(update_chore_endpoint))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
            chore,
        )
    }

    #[tokio::test]
    async fn updates_given_fields() {
        let (server, _, chore) = get_test_server_with_chore();

        let response = server
            .patch(&format_endpoint(endpoints::CHORE, chore.id))
            .json(&json!({ "amount": "3.75", "icon": "vacuum" }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "Sweep");
        assert_eq!(body["description"], "Kitchen");
        assert_eq!(body["amount"], "3.75");
        assert_eq!(body["icon"], "vacuum");
    }

    #[tokio::test]
    async fn rejects_empty_name() {
        let (server, _, chore) = get_test_server_with_chore();

        let response = server
            .patch(&format_endpoint(endpoints::CHORE, chore.id))
            .json(&json!({ "name": "  " }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Invalid chore data");
    }

    #[tokio::test]
    async fn missing_chore_returns_not_found() {
        let (server, _, chore) = get_test_server_with_chore();

        let response = server
            .patch(&format_endpoint(endpoints::CHORE, chore.id + 100))
            .json(&json!({ "name": "Dust" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Chore not found");
    }
}
