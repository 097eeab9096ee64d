#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use wayfarer::db::connector::MongoConnector;
use wayfarer::routes::build_router;
use wayfarer::state::AppState;

/// Holds a running MongoDB container and the router wired to it.
///
/// The container is kept alive for as long as this struct lives. When
/// dropped, it is stopped and cleaned up automatically.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub mongo_uri: String,
    pub connector: Arc<MongoConnector>,
    pub state: AppState,
    pub router: Router,
}

impl TestEnv {
    /// Spin up MongoDB and build the full application router against it.
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");

        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);

        let database = format!("wayfarer_test_{}", uuid::Uuid::new_v4().simple());
        let connector = Arc::new(MongoConnector::new(mongo_uri.clone(), database));
        let state = AppState::new(connector.clone());
        state
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");

        let router = build_router(state.clone());

        Self {
            _mongo: mongo_container,
            mongo_uri,
            connector,
            state,
            router,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Helper: create a destination via the API.
    pub async fn create_destination(
        &self,
        server: &axum_test::TestServer,
        body: serde_json::Value,
    ) -> axum_test::TestResponse {
        server.post("/api/destinations").json(&body).await
    }
}

pub fn destination(name: &str, region: &str, price: f64) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "country": "Testland",
        "region": region,
        "description": format!("{name} is a lovely place to visit."),
        "startingPrice": price,
    })
}

pub fn package(title: &str, category: &str, price: f64) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "destination": "Testland",
        "duration": "5 Days / 4 Nights",
        "price": price,
        "description": format!("{title} itinerary."),
        "difficulty": "Moderate",
        "category": category,
    })
}

pub fn post(slug: &str, category: &str, published_at: &str) -> serde_json::Value {
    serde_json::json!({
        "title": format!("Post {slug}"),
        "slug": slug,
        "excerpt": "A short excerpt.",
        "content": "Some words about travelling.",
        "author": { "name": "Test Author" },
        "category": category,
        "publishedAt": published_at,
    })
}
