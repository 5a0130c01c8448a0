use std::sync::Arc;

use api::{AppState, Stores, notify::RecordingNotifier, routes::create_router};
use auth::jwt::{JwtConfig, JwtService};
use client::{ApiClient, AuthContext, AuthState, ClientError, models::NewCollection};

async fn serve() -> ApiClient {
    let state = AppState::new(
        Stores::memory(),
        JwtService::new(JwtConfig {
            secret: "client-tests".to_string(),
            token_expiry: 3600,
        }),
        Arc::new(RecordingNotifier::new()),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    ApiClient::new(format!("http://{}", address)).unwrap()
}

#[tokio::test]
async fn register_resolves_the_context() {
    let api = serve().await;
    let mut context = AuthContext::new();

    let session = api
        .register(&mut context, "Nimal", "nimal@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(session.qr_code, Some(format!("User:{}", session.id)));
    assert_eq!(context.user().map(|u| u.id), Some(session.id));
}

#[tokio::test]
async fn citizen_records_a_collection() {
    let api = serve().await;
    let mut context = AuthContext::new();
    let session = api
        .register(&mut context, "Nimal", "nimal@example.com", "password123")
        .await
        .unwrap();

    let created = api
        .create_collection(
            &context,
            &NewCollection {
                location: "Colombo".to_string(),
                waste_type: "organic".to_string(),
                quantity: 5.0,
                collection_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.status, "pending");

    let mine = api.user_collections(&context, session.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, created.id);
}

#[tokio::test]
async fn forged_token_leaves_the_context_anonymous() {
    let api = serve().await;
    let mut context = AuthContext::with_token("not-a-real-token");

    api.refresh(&mut context).await.unwrap();

    assert_eq!(context.state(), &AuthState::Anonymous);
    assert!(context.token().is_none());
}

#[tokio::test]
async fn server_errors_carry_status_and_message() {
    let api = serve().await;
    let mut context = AuthContext::new();
    api.register(&mut context, "Nimal", "nimal@example.com", "password123")
        .await
        .unwrap();

    let err = api
        .add_credits(&context, uuid::Uuid::new_v4(), 10)
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status.as_u16(), 403);
            assert!(!message.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn logout_signs_out() {
    let api = serve().await;
    let mut context = AuthContext::new();
    api.register(&mut context, "Nimal", "nimal@example.com", "password123")
        .await
        .unwrap();

    api.logout(&mut context);

    assert_eq!(context.state(), &AuthState::Anonymous);
    assert!(matches!(
        api.recycling_credits(&context).await,
        Err(ClientError::NotSignedIn)
    ));
}
