//! End-to-end tests driving the router in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use shelf_api::{build_router, ApiConfig, AppState, Cache};
use shelf_core::{Book, Category, NewBook, SENTINEL_USERNAME};
use shelf_db::{Database, DbConfig};
use tower::ServiceExt;

const PASSWORD: &str = "str0ng-Passw0rd";

struct TestApp {
    router: Router,
    db: Database,
}

impl TestApp {
    async fn new() -> Self {
        TestApp::with_config(ApiConfig {
            page_cache_ttl_secs: 0,
            jwt_secret: "test-secret".to_string(),
            ..ApiConfig::default()
        })
        .await
    }

    async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(config, db.clone(), Cache::memory()).unwrap();
        TestApp {
            router: build_router(state),
            db,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    /// Registers a user and returns their access token.
    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register/",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["access"].as_str().unwrap().to_string()
    }

    async fn category(&self, slug: &str) -> Category {
        self.db
            .categories()
            .insert(&Category {
                slug: slug.to_string(),
                title: slug.to_uppercase(),
            })
            .await
            .unwrap()
    }

    async fn book(&self, title: &str, category: &Category) -> Book {
        self.db
            .books()
            .insert(&NewBook {
                title: title.to_string(),
                author: "test_author".to_string(),
                category_slug: category.slug.clone(),
                description: Some("test_description".to_string()),
                cover_img: None,
            })
            .await
            .unwrap()
    }

    async fn post_review(&self, token: &str, book_id: i64, rating: i64) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/books/reviews/",
            Some(token),
            Some(json!({ "book": book_id, "rating": rating, "comment": "test" })),
        )
        .await
    }

    async fn rating_of(&self, book_id: i64) -> i64 {
        self.db.books().get(book_id).await.unwrap().unwrap().rating
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn register_issues_tokens_and_rejects_duplicates() {
    let app = TestApp::new().await;
    app.register("test_user").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register/",
            None,
            Some(json!({ "username": "test_user", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["username"][0], "Already exists!");
}

#[tokio::test]
async fn register_rejects_bad_input() {
    let app = TestApp::new().await;

    for (username, password, field) in [
        ("reader", "12345678", "password"),
        ("reader", "short", "password"),
        ("reader", "secret123", "password"),
        ("no spaces allowed", PASSWORD, "username"),
    ] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register/",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{username}/{password}");
        assert!(body["fields"].get(field).is_some(), "{body}");
    }

    let (status, _) = app
        .send(Method::POST, "/api/auth/register/", None, Some(json!({ "username": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_sentinel_name() {
    let app = TestApp::new().await;

    for username in [SENTINEL_USERNAME, "Deleted"] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register/",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{username}");
        assert_eq!(body["fields"]["username"][0], "This username is reserved.");
    }
    assert!(!app.db.users().exists(SENTINEL_USERNAME).await.unwrap());
}

#[tokio::test]
async fn token_pair_and_refresh() {
    let app = TestApp::new().await;
    app.register("reader").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/token/",
            None,
            Some(json!({ "username": "reader", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "No active account found with the given credentials");

    let (status, pair) = app
        .send(
            Method::POST,
            "/api/auth/token/",
            None,
            Some(json!({ "username": "reader", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/token/refresh/",
            None,
            Some(json!({ "refresh": pair["refresh"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());

    // An access token is not a refresh token
    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/token/refresh/",
            None,
            Some(json!({ "refresh": pair["access"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_account_hands_reviews_to_sentinel() {
    let app = TestApp::new().await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;
    let token = app.register("remove_usr").await;

    let (status, review) = app.post_review(&token, book.id, 4).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.send(Method::DELETE, "/api/auth/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let kept = app
        .db
        .reviews()
        .get(review["id"].as_i64().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.author_name, SENTINEL_USERNAME);
    assert_eq!(app.rating_of(book.id).await, 4);

    // The token's user is gone
    let (status, _) = app.send(Method::DELETE, "/api/auth/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // and can no longer touch the review it wrote
    let uri = format!("/api/books/reviews/{}/", review["id"]);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.rating_of(book.id).await, 4);

    // The sentinel can't log in
    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/token/",
            None,
            Some(json!({ "username": SENTINEL_USERNAME, "password": "!" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn book_list_filters_and_paginates() {
    let app = TestApp::new().await;
    let fantasy = app.category("fantasy").await;
    let poetry = app.category("poetry").await;
    app.book("test_book", &fantasy).await;
    app.book("Leaves of Grass", &poetry).await;

    let (status, body) = app.get("/api/books/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(body["next"].is_null());
    assert!(body["previous"].is_null());

    let (_, body) = app.get("/api/books/?category=fantasy").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["category"]["title"], "FANTASY");

    let (_, body) = app.get("/api/books/?search=tes").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "test_book");

    let (status, body) = app.get("/api/books/?category=sci%21").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["category"].is_array());

    let (status, body) = app.get("/api/books/?page=2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Invalid page.");

    let (status, _) = app.get("/api/books/?page=last").await;
    assert_eq!(status, StatusCode::OK);

    // Search ignores case beyond ASCII: "дюна" finds "Дюна"
    app.book("Дюна", &fantasy).await;
    let (_, body) = app.get("/api/books/?search=%D0%B4%D1%8E%D0%BD%D0%B0").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Дюна");
}

#[tokio::test]
async fn book_list_links_keep_filters() {
    let app = TestApp::with_config(ApiConfig {
        page_cache_ttl_secs: 0,
        page_size: 1,
        ..ApiConfig::default()
    })
    .await;
    let category = app.category("misc").await;
    for title in ["Book one", "Book two", "Book three"] {
        app.book(title, &category).await;
    }

    let (_, body) = app.get("/api/books/?search=book&page=2").await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], "/api/books/?search=book&page=3");
    assert_eq!(body["previous"], "/api/books/?search=book");
}

#[tokio::test]
async fn book_list_is_cached() {
    let app = TestApp::with_config(ApiConfig {
        page_cache_ttl_secs: 60,
        ..ApiConfig::default()
    })
    .await;
    let category = app.category("misc").await;
    app.book("First", &category).await;

    let (_, before) = app.get("/api/books/").await;
    app.book("Second", &category).await;
    let (_, after) = app.get("/api/books/").await;

    assert_eq!(before, after);
    assert_eq!(after["count"], 1);

    // Different query, different entry
    let (_, fresh) = app.get("/api/books/?page=1").await;
    assert_eq!(fresh["count"], 2);
}

#[tokio::test]
async fn book_detail_and_categories() {
    let app = TestApp::new().await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;

    let (status, body) = app.get(&format!("/api/books/{}/", book.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "test_book");
    assert_eq!(body["reviews_count"], 0);
    assert_eq!(body["rating"], 1);

    let (status, _) = app.get("/api/books/999/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/books/not-a-number/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/categories/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "slug": "test_cat", "title": "TEST_CAT" }]));
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn review_creation_updates_rating() {
    let app = TestApp::new().await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;
    let first = app.register("first").await;
    let second = app.register("second").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/books/reviews/",
            None,
            Some(json!({ "book": book.id, "rating": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, review) = app.post_review(&first, book.id, 5).await;
    assert_eq!(status, StatusCode::CREATED, "{review}");
    assert_eq!(review["author_name"], "first");
    assert!(review.get("user_id").is_none());
    assert_eq!(app.rating_of(book.id).await, 5);

    app.post_review(&second, book.id, 2).await;
    assert_eq!(app.rating_of(book.id).await, 3);

    let (_, detail) = app.get(&format!("/api/books/{}/", book.id)).await;
    assert_eq!(detail["reviews_count"], 2);
}

#[tokio::test]
async fn review_creation_validates_input() {
    let app = TestApp::new().await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;
    let token = app.register("reader").await;

    let (status, body) = app.post_review(&token, book.id, 6).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["rating"].is_array());

    let (status, body) = app.post_review(&token, book.id + 100, 3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["book"].is_array());

    assert_eq!(app.rating_of(book.id).await, 1);
}

#[tokio::test]
async fn review_deletion_is_author_only() {
    let app = TestApp::new().await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;
    let author = app.register("author").await;
    let other = app.register("other").await;

    app.post_review(&author, book.id, 2).await;
    let (_, review) = app.post_review(&author, book.id, 4).await;
    let uri = format!("/api/books/reviews/{}/", review["id"]);
    assert_eq!(app.rating_of(book.id).await, 3);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.rating_of(book.id).await, 2);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_list_includes_reaction_counts() {
    let app = TestApp::new().await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;
    let author = app.register("author").await;
    let fan = app.register("fan").await;

    let (_, review) = app.post_review(&author, book.id, 4).await;
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/books/react/reviews/{}/", review["id"]),
            Some(&fan),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get(&format!("/api/books/{}/reviews/", book.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(
        body["results"][0]["reactions"],
        json!([{ "reaction": "LIKE", "count": 1 }])
    );

    let (status, _) = app.get("/api/books/999/reviews/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_creation_is_throttled() {
    let app = TestApp::with_config(ApiConfig {
        page_cache_ttl_secs: 0,
        review_throttle_rate: "1/hour".to_string(),
        ..ApiConfig::default()
    })
    .await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;
    let token = app.register("reader").await;

    let (status, _) = app.post_review(&token, book.id, 3).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post_review(&token, book.id, 3).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "throttled");
}

// =============================================================================
// Reactions
// =============================================================================

#[tokio::test]
async fn reaction_lifecycle() {
    let app = TestApp::new().await;
    let category = app.category("test_cat").await;
    let book = app.book("test_book", &category).await;
    let author = app.register("author").await;
    let fan = app.register("react_user").await;

    let (_, review) = app.post_review(&author, book.id, 4).await;
    let uri = format!("/api/books/react/reviews/{}/", review["id"]);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&fan), Some(json!({ "reaction": "LIKE" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = app
        .send(Method::POST, &uri, Some(&fan), Some(json!({ "reaction": "DIS" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["reaction"], "DIS");

    let (status, body) = app
        .send(Method::POST, &uri, Some(&fan), Some(json!({ "reaction": "LIKE" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Already exists! Try update");

    let (status, updated) = app
        .send(Method::PATCH, &uri, Some(&fan), Some(json!({ "reaction": "LIKE" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["reaction"], "LIKE");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Review reaction not found");
}

#[tokio::test]
async fn reaction_on_missing_review() {
    let app = TestApp::new().await;
    let token = app.register("reader").await;

    let (status, _) = app
        .send(Method::POST, "/api/books/react/reviews/404/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::POST, "/api/books/react/reviews/404/", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}
