//! Full-stack tests over a real listener and Postgres. Skipped when
//! `DATABASE_URL` is unset or `SKIP_DB_TESTS` is set.

use std::net::SocketAddr;

use axum::Router;
use migration::MigratorTrait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use configs::AppConfig;
use server::routes::{self, auth::ServerState};
use service::user_service::{self, AdminUserUpdate};

struct TestApp {
    base_url: String,
    db: sea_orm::DatabaseConnection,
}

impl TestApp {
    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }
}

async fn start_server() -> anyhow::Result<Option<TestApp>> {
    let _ = dotenvy::dotenv();
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing or SKIP_DB_TESTS set; skipping e2e test");
        return Ok(None);
    }
    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {}", e);
    }

    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    let state = ServerState::new(db.clone(), &cfg);
    let app: Router = routes::build_router(state, CorsLayer::very_permissive());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok(Some(TestApp { base_url: format!("http://{}", addr), db }))
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().expect("reqwest client")
}

/// Register and log in; the returned client carries the auth cookie.
async fn signed_in(app: &TestApp, email: &str) -> anyhow::Result<(reqwest::Client, Value)> {
    let c = client();
    let res = c
        .post(app.url("/api/auth/register"))
        .json(&json!({ "email": email, "name": "Tester", "password": "S3curePass!" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = c
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "S3curePass!" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("set-cookie").is_some());
    Ok((c, res.json().await?))
}

#[tokio::test]
async fn e2e_register_login_me_and_logout() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let email = format!("user_{}@example.com", Uuid::new_v4());
    let (c, login) = signed_in(&app, &email).await?;
    assert_eq!(login["user"]["role"], "user");

    let me: Value = c.get(app.url("/api/auth/me")).send().await?.json().await?;
    assert_eq!(me["email"], email);

    let res = c.put(app.url("/api/auth/me")).json(&json!({ "name": "Renamed" })).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["name"], "Renamed");

    // duplicate registration
    let res = client()
        .post(app.url("/api/auth/register"))
        .json(&json!({ "email": email, "name": "Again", "password": "S3curePass!" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = c.post(app.url("/api/auth/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = c.get(app.url("/api/auth/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn e2e_admin_catalogue_and_reviews() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let admin_email = format!("admin_{}@example.com", Uuid::new_v4());
    let (_, login) = signed_in(&app, &admin_email).await?;
    let admin_id: Uuid = login["user"]["id"].as_str().unwrap_or_default().parse()?;
    user_service::admin_update_user(&app.db, admin_id, AdminUserUpdate { role: Some("admin".into()), ..Default::default() }).await?;
    // role lives in the token, so sign in again
    let admin = client();
    let res = admin
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": admin_email, "password": "S3curePass!" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let marker = Uuid::new_v4().simple().to_string();
    let res = admin
        .post(app.url("/api/categories"))
        .json(&json!({ "name": format!("Landing Pages {marker}") }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: Value = res.json().await?;
    assert!(category["slug"].as_str().unwrap_or_default().starts_with("landing-pages-"));

    let res = admin
        .post(app.url("/api/templates"))
        .json(&json!({
            "title": format!("Starter {marker}"),
            "description": "A clean starter",
            "price_cents": 4900,
            "currency": "usd",
            "category_id": category["id"],
            "published": true
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let template: Value = res.json().await?;
    assert_eq!(template["currency"], "USD");
    let template_id = template["id"].as_str().unwrap_or_default().to_string();
    let slug = template["slug"].as_str().unwrap_or_default().to_string();

    // a regular user reviews it once
    let (reviewer, _) = signed_in(&app, &format!("rev_{}@example.com", Uuid::new_v4())).await?;
    let reviews_url = app.url(&format!("/api/templates/{template_id}/reviews"));
    let res = reviewer.post(&reviews_url).json(&json!({ "rating": 4, "comment": "Nice" })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = reviewer.post(&reviews_url).json(&json!({ "rating": 5 })).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let detail: Value = client().get(app.url(&format!("/api/templates/{slug}"))).send().await?.json().await?;
    assert_eq!(detail["review_count"], 1);
    assert_eq!(detail["average_rating"], 4.0);

    let listed: Value = client()
        .get(app.url(&format!("/api/templates?search={marker}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed["total"], 1);

    let res = reviewer.get(app.url("/api/users")).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = admin.get(app.url("/api/users?limit=5")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["limit"], 5);
    Ok(())
}

#[tokio::test]
async fn e2e_contact_and_newsletter() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let c = client();
    let res = c
        .post(app.url("/api/contact"))
        .json(&json!({ "name": "Jane", "email": "jane@example.com", "subject": "Hello", "message": "Question about licensing" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(res.json::<Value>().await?["id"].is_string());

    let email = format!("news_{}@example.com", Uuid::new_v4());
    for _ in 0..2 {
        let res = c.post(app.url("/api/newsletter/subscribe")).json(&json!({ "email": email })).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = c.post(app.url("/api/newsletter/unsubscribe")).json(&json!({ "email": email })).send().await?;
    assert_eq!(res.json::<Value>().await?["status"], "unsubscribed");
    let res = c
        .post(app.url("/api/newsletter/unsubscribe"))
        .json(&json!({ "email": format!("ghost_{}@example.com", Uuid::new_v4()) }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
