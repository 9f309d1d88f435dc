use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{auth::extractors::AuthUser, state::AppState};

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: Option<String>,
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.id,
        email: user.email,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        app::build_app, auth::extractors::test_tokens, state::AppState, test_support::spawn_server,
    };
    use serde_json::Value;
    use time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn me_returns_verified_caller() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let token = test_tokens::sign(
            &state.config.jwt.secret,
            &state.config.jwt.audience,
            user_id,
            Duration::minutes(5),
        );
        let base = spawn_server(build_app(state)).await;
        let client = reqwest::Client::new();

        let res = client
            .get(format!("{}/api/v1/me", base))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["id"], user_id.to_string());
        assert_eq!(body["email"], "eater@example.com");

        let res = client.get(format!("{}/api/v1/me", base)).send().await.unwrap();
        assert_eq!(res.status(), 401);
        assert_eq!(res.text().await.unwrap(), "Missing Authorization header");
    }

    #[tokio::test]
    async fn me_rejects_token_signed_with_other_secret() {
        let state = AppState::fake();
        let token = test_tokens::sign("not-the-secret", "authenticated", Uuid::new_v4(), Duration::minutes(5));
        let base = spawn_server(build_app(state)).await;

        let res = reqwest::Client::new()
            .get(format!("{}/api/v1/me", base))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);
    }
}
