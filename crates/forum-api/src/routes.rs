use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_session;
use crate::{comments, moderation, notifications, posts, roles, votes};

/// Every API route. Everything except sign-up, sign-in and `/health` sits
/// behind the session gate.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/signin", post(auth::sign_in))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/auth/signout", get(auth::sign_out))
        .route("/api/auth/me", get(auth::me))
        .route("/api/post/create", post(posts::create_post))
        .route("/api/post/edit", put(posts::edit_post))
        .route("/api/post/delete/{id}", delete(posts::delete_post))
        .route("/api/post/rate", post(votes::rate_post))
        .route("/api/comment/create", post(comments::create_comment))
        .route("/api/comment/edit", put(comments::edit_comment))
        .route("/api/comment/delete/{id}", delete(comments::delete_comment))
        .route("/api/comment/rate", post(votes::rate_comment))
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/delete", delete(notifications::clear_notifications))
        // Role requests
        .route("/api/request", get(roles::get_role_request))
        .route("/api/request/add", post(roles::create_role_request))
        .route("/api/request/delete", delete(roles::delete_role_request))
        // Moderator
        .route("/api/moderator/post/delete/{id}", delete(posts::moderator_delete_post))
        .route("/api/moderator/posts/unapproved", get(moderation::unapproved_posts))
        .route("/api/moderator/post/approve/{id}", put(moderation::approve_post))
        .route("/api/moderator/post/ban/{id}", post(moderation::ban_post))
        .route("/api/moderator/report/post/create", post(moderation::create_report))
        .route("/api/moderator/report/post/delete/{id}", delete(moderation::delete_report))
        .route("/api/moderator/reports", get(moderation::my_reports))
        // Admin
        .route("/api/admin/post/delete/{id}", delete(posts::admin_delete_post))
        .route("/api/admin/comment/delete/{id}", delete(comments::admin_delete_comment))
        .route("/api/admin/requests", get(roles::list_role_requests))
        .route("/api/admin/request/dismiss/{id}", delete(roles::dismiss_role_request))
        .route("/api/admin/request/accept/{id}", put(roles::accept_role_request))
        .route("/api/admin/moderators", get(roles::list_moderators))
        .route("/api/admin/demote/moderator/{id}", put(roles::demote_moderator))
        .route("/api/admin/post/reports", get(moderation::all_reports))
        .route("/api/admin/post/report/dismiss/{id}", delete(moderation::dismiss_report))
        .route("/api/admin/post/report/accept/{id}", put(moderation::accept_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use forum_types::models::{PostState, Role};

    use super::*;
    use crate::auth::AppStateInner;
    use crate::test_support::db;

    const ADMIN_TOKEN: &str = "let-me-in";

    struct Reply {
        status: StatusCode,
        cookie: Option<String>,
        body: Value,
    }

    fn app() -> (Router, AppState) {
        let state = Arc::new(AppStateInner::new(db(), Some(ADMIN_TOKEN.into())));
        (router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, cookie, body }
    }

    async fn sign_up(app: &Router, username: &str, admin_token: Option<&str>) -> Value {
        let mut body = json!({
            "username": username,
            "password": "correct-horse",
            "email": format!("{}@example.com", username),
        });
        if let Some(token) = admin_token {
            body["adminAuthToken"] = json!(token);
        }
        let reply = send(app, Method::POST, "/api/auth/signup", None, Some(body)).await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["data"].clone()
    }

    /// Signs in and returns the `name=value` pair to send back as a cookie.
    async fn sign_in(app: &Router, username: &str) -> String {
        let body = json!({ "username": username, "password": "correct-horse" });
        let reply = send(app, Method::POST, "/api/auth/signin", None, Some(body)).await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        let cookie = reply.cookie.expect("sign-in sets a cookie");
        cookie.split(';').next().unwrap().to_string()
    }

    /// Bodiless request; only the status matters.
    async fn status(app: &Router, method: Method, uri: &str, cookie: &str) -> StatusCode {
        send(app, method, uri, Some(cookie), None).await.status
    }

    async fn create_post(app: &Router, cookie: &str, title: &str) -> i64 {
        let body = json!({ "title": title, "content": "body" });
        let reply = send(app, Method::POST, "/api/post/create", Some(cookie), Some(body)).await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _) = app();
        let reply = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_cookie_is_forbidden() {
        let (app, _) = app();
        let reply = send(&app, Method::GET, "/api/auth/me", None, None).await;

        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body["status"], json!(false));
        assert_eq!(reply.body["code"], json!(403));
        assert_eq!(reply.body["message"], json!("session not found, user not authorized"));
    }

    #[tokio::test]
    async fn unknown_cookie_is_forbidden() {
        let (app, _) = app();
        let reply = send(&app, Method::GET, "/api/auth/me", Some("forum_session=nope"), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body["message"], json!("session not valid, user not authorized"));
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let (app, _) = app();
        let profile = sign_up(&app, "alice", None).await;
        assert_eq!(profile["role"], json!(Role::User.as_i32()));
        assert!(profile.get("password").is_none());

        let cookie = sign_in(&app, "alice").await;
        assert!(cookie.starts_with("forum_session="));

        let me = send(&app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body["data"]["username"], json!("alice"));

        // A second sign-in while the session is live is refused.
        let body = json!({ "username": "alice", "password": "correct-horse" });
        let again = send(&app, Method::POST, "/api/auth/signin", None, Some(body)).await;
        assert_eq!(again.status, StatusCode::CONFLICT);
        assert_eq!(again.body["message"], json!("user already authorized"));

        let out = send(&app, Method::GET, "/api/auth/signout", Some(&cookie), None).await;
        assert_eq!(out.status, StatusCode::OK);
        assert!(out.cookie.unwrap().contains("Max-Age=0"));

        let me = send(&app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(me.status, StatusCode::FORBIDDEN);

        // Signed out, so signing in works again.
        sign_in(&app, "alice").await;
    }

    #[tokio::test]
    async fn sign_up_and_sign_in_failures() {
        let (app, _) = app();
        sign_up(&app, "alice", None).await;

        let duplicate = json!({
            "username": "alice",
            "password": "correct-horse",
            "email": "other@example.com",
        });
        let reply = send(&app, Method::POST, "/api/auth/signup", None, Some(duplicate)).await;
        assert_eq!(reply.status, StatusCode::CONFLICT);

        let short = json!({ "username": "bob", "password": "short", "email": "bob@example.com" });
        let reply = send(&app, Method::POST, "/api/auth/signup", None, Some(short)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let wrong = json!({ "username": "alice", "password": "wrong-horse" });
        let reply = send(&app, Method::POST, "/api/auth/signin", None, Some(wrong)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let unknown = json!({ "username": "nobody", "password": "correct-horse" });
        let reply = send(&app, Method::POST, "/api/auth/signin", None, Some(unknown)).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);

        let malformed = json!({ "username": "alice" });
        let reply = send(&app, Method::POST, "/api/auth/signin", None, Some(malformed)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["status"], json!(false));
    }

    #[tokio::test]
    async fn admin_token_elevates_sign_up() {
        let (app, _) = app();
        let profile = sign_up(&app, "root", Some(ADMIN_TOKEN)).await;
        assert_eq!(profile["role"], json!(Role::Admin.as_i32()));
    }

    #[tokio::test]
    async fn vote_toggle_over_http() {
        let (app, _) = app();
        sign_up(&app, "author", None).await;
        sign_up(&app, "voter", None).await;
        let author = sign_in(&app, "author").await;
        let voter = sign_in(&app, "voter").await;

        let post = send(
            &app,
            Method::POST,
            "/api/post/create",
            Some(&author),
            Some(json!({ "title": "Hello", "content": "World" })),
        )
        .await;
        assert_eq!(post.status, StatusCode::CREATED);
        let post_id = post.body["data"]["id"].as_i64().unwrap();

        let vote = json!({ "id": post_id, "reaction": 1 });
        let first = send(&app, Method::POST, "/api/post/rate", Some(&voter), Some(vote.clone()))
            .await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body["message"], json!("post has been rated"));
        assert_eq!(first.body["data"], json!({ "rating": 1, "userRating": 1 }));

        let inbox = send(&app, Method::GET, "/api/notifications", Some(&author), None).await;
        assert_eq!(inbox.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(inbox.body["data"][0]["reaction"], json!(1));

        let second = send(&app, Method::POST, "/api/post/rate", Some(&voter), Some(vote)).await;
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(second.body["message"], json!("rate cancelled due to re-voting"));

        let inbox = send(&app, Method::GET, "/api/notifications", Some(&author), None).await;
        assert!(inbox.body["data"].as_array().unwrap().is_empty());

        let invalid = json!({ "id": post_id, "reaction": 0 });
        let reply = send(&app, Method::POST, "/api/post/rate", Some(&voter), Some(invalid)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let missing = json!({ "id": post_id + 100, "reaction": 1 });
        let reply =
            send(&app, Method::POST, "/api/comment/rate", Some(&voter), Some(missing)).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn comments_and_ownership() {
        let (app, _) = app();
        let author = sign_up(&app, "author", None).await;
        let reader = sign_up(&app, "reader", None).await;
        let author_cookie = sign_in(&app, "author").await;
        let reader_cookie = sign_in(&app, "reader").await;

        let post = send(
            &app,
            Method::POST,
            "/api/post/create",
            Some(&author_cookie),
            Some(json!({ "title": "t", "content": "c" })),
        )
        .await;
        let post_id = post.body["data"]["id"].as_i64().unwrap();

        let comment = send(
            &app,
            Method::POST,
            "/api/comment/create",
            Some(&reader_cookie),
            Some(json!({ "postId": post_id, "content": "first" })),
        )
        .await;
        assert_eq!(comment.status, StatusCode::CREATED);
        let comment_id = comment.body["data"]["id"].as_i64().unwrap();

        let inbox = send(&app, Method::GET, "/api/notifications", Some(&author_cookie), None).await;
        assert_eq!(inbox.body["data"][0]["commentId"], json!(comment_id));

        // Claiming someone else's authorship is refused.
        let forged = json!({ "id": comment_id, "authorId": author["id"], "content": "edited" });
        let edit_uri = "/api/comment/edit";
        let reply = send(&app, Method::PUT, edit_uri, Some(&author_cookie), Some(forged)).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let edit = json!({ "id": comment_id, "authorId": reader["id"], "content": "edited" });
        let reply = send(&app, Method::PUT, edit_uri, Some(&reader_cookie), Some(edit)).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["content"], json!("edited"));

        let uri = format!("/api/comment/delete/{}", comment_id);
        let reply = send(&app, Method::DELETE, &uri, Some(&author_cookie), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        let reply = send(&app, Method::DELETE, &uri, Some(&reader_cookie), None).await;
        assert_eq!(reply.status, StatusCode::OK);

        let inbox = send(&app, Method::GET, "/api/notifications", Some(&author_cookie), None).await;
        assert!(inbox.body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn post_deletion_needs_author_or_moderator() {
        let (app, _) = app();
        sign_up(&app, "author", None).await;
        sign_up(&app, "reader", None).await;
        sign_up(&app, "root", Some(ADMIN_TOKEN)).await;
        let author = sign_in(&app, "author").await;
        let reader = sign_in(&app, "reader").await;
        let admin = sign_in(&app, "root").await;

        let mut ids = Vec::new();
        for _ in 0..2 {
            let post = send(
                &app,
                Method::POST,
                "/api/post/create",
                Some(&author),
                Some(json!({ "title": "t", "content": "c" })),
            )
            .await;
            ids.push(post.body["data"]["id"].as_i64().unwrap());
        }

        let uri = format!("/api/post/delete/{}", ids[0]);
        assert_eq!(status(&app, Method::DELETE, &uri, &reader).await, StatusCode::FORBIDDEN);
        assert_eq!(status(&app, Method::DELETE, &uri, &author).await, StatusCode::OK);
        assert_eq!(status(&app, Method::DELETE, &uri, &author).await, StatusCode::NOT_FOUND);

        let uri = format!("/api/moderator/post/delete/{}", ids[1]);
        let reply = send(&app, Method::DELETE, &uri, Some(&reader), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body["message"], json!("insufficient role"));
        assert_eq!(status(&app, Method::DELETE, &uri, &admin).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn clearing_notifications() {
        let (app, _) = app();
        sign_up(&app, "author", None).await;
        sign_up(&app, "reader", None).await;
        let author = sign_in(&app, "author").await;
        let reader = sign_in(&app, "reader").await;

        let post = send(
            &app,
            Method::POST,
            "/api/post/create",
            Some(&author),
            Some(json!({ "title": "t", "content": "c" })),
        )
        .await;
        let post_id = post.body["data"]["id"].as_i64().unwrap();
        let vote = json!({ "id": post_id, "reaction": -1 });
        send(&app, Method::POST, "/api/post/rate", Some(&reader), Some(vote)).await;

        let clear = "/api/notifications/delete";
        assert_eq!(status(&app, Method::DELETE, clear, &author).await, StatusCode::OK);
        let inbox = send(&app, Method::GET, "/api/notifications", Some(&author), None).await;
        assert_eq!(inbox.body["message"], json!("all notifications"));
        assert!(inbox.body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn post_edit_is_author_only() {
        let (app, _) = app();
        let author = sign_up(&app, "author", None).await;
        sign_up(&app, "reader", None).await;
        let author_cookie = sign_in(&app, "author").await;
        let reader_cookie = sign_in(&app, "reader").await;
        let post_id = create_post(&app, &author_cookie, "draft").await;

        let edit_uri = "/api/post/edit";
        let body = |id: i64, title: &str| {
            json!({ "id": id, "authorId": author["id"], "title": title, "content": "y" })
        };

        let forged = body(post_id, "x");
        let reply = send(&app, Method::PUT, edit_uri, Some(&reader_cookie), Some(forged)).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let edit = body(post_id, "final");
        let reply = send(&app, Method::PUT, edit_uri, Some(&author_cookie), Some(edit)).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], json!("post has been edited"));
        assert_eq!(reply.body["data"]["title"], json!("final"));
        assert_eq!(reply.body["data"]["state"], json!("pending"));
        assert!(reply.body["data"]["editedAt"].as_i64().unwrap() > 0);

        let missing = body(post_id + 1, "x");
        let reply = send(&app, Method::PUT, edit_uri, Some(&author_cookie), Some(missing)).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn role_request_lifecycle() {
        let (app, _) = app();
        let alice = sign_up(&app, "alice", None).await;
        sign_up(&app, "bob", None).await;
        sign_up(&app, "root", Some(ADMIN_TOKEN)).await;
        let alice_cookie = sign_in(&app, "alice").await;
        let bob = sign_in(&app, "bob").await;
        let admin = sign_in(&app, "root").await;

        let (own, add, withdraw) = ("/api/request", "/api/request/add", "/api/request/delete");
        assert_eq!(status(&app, Method::GET, own, &alice_cookie).await, StatusCode::NOT_FOUND);
        assert_eq!(status(&app, Method::POST, add, &alice_cookie).await, StatusCode::CREATED);
        assert_eq!(status(&app, Method::POST, add, &alice_cookie).await, StatusCode::CONFLICT);
        assert_eq!(status(&app, Method::POST, add, &admin).await, StatusCode::CONFLICT);

        // A request can be withdrawn before review.
        assert_eq!(status(&app, Method::POST, add, &bob).await, StatusCode::CREATED);
        assert_eq!(status(&app, Method::DELETE, withdraw, &bob).await, StatusCode::OK);
        assert_eq!(status(&app, Method::DELETE, withdraw, &bob).await, StatusCode::NOT_FOUND);

        let mine = send(&app, Method::GET, own, Some(&alice_cookie), None).await;
        assert_eq!(mine.body["data"]["userId"], alice["id"]);
        let request_id = mine.body["data"]["id"].as_i64().unwrap();

        let queue = "/api/admin/requests";
        assert_eq!(status(&app, Method::GET, queue, &alice_cookie).await, StatusCode::FORBIDDEN);
        let listed = send(&app, Method::GET, queue, Some(&admin), None).await;
        assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed.body["data"][0]["user"]["username"], json!("alice"));

        let accept = format!("/api/admin/request/accept/{}", request_id);
        assert_eq!(status(&app, Method::PUT, &accept, &alice_cookie).await, StatusCode::FORBIDDEN);
        let reply = send(&app, Method::PUT, &accept, Some(&admin), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], json!("role request has been accepted"));
        assert_eq!(status(&app, Method::PUT, &accept, &admin).await, StatusCode::NOT_FOUND);

        let me = send(&app, Method::GET, "/api/auth/me", Some(&alice_cookie), None).await;
        assert_eq!(me.body["data"]["role"], json!(Role::Moderator.as_i32()));

        let moderators = send(&app, Method::GET, "/api/admin/moderators", Some(&admin), None).await;
        assert_eq!(moderators.body["data"][0]["id"], alice["id"]);

        let demote = format!("/api/admin/demote/moderator/{}", alice["id"]);
        assert_eq!(status(&app, Method::PUT, &demote, &admin).await, StatusCode::OK);
        assert_eq!(status(&app, Method::PUT, &demote, &admin).await, StatusCode::NOT_FOUND);
        let me = send(&app, Method::GET, "/api/auth/me", Some(&alice_cookie), None).await;
        assert_eq!(me.body["data"]["role"], json!(Role::User.as_i32()));
    }

    #[tokio::test]
    async fn dismissed_role_request_is_gone() {
        let (app, _) = app();
        sign_up(&app, "alice", None).await;
        sign_up(&app, "root", Some(ADMIN_TOKEN)).await;
        let alice = sign_in(&app, "alice").await;
        let admin = sign_in(&app, "root").await;

        send(&app, Method::POST, "/api/request/add", Some(&alice), None).await;
        let mine = send(&app, Method::GET, "/api/request", Some(&alice), None).await;
        let uri = format!("/api/admin/request/dismiss/{}", mine.body["data"]["id"]);

        assert_eq!(status(&app, Method::DELETE, &uri, &admin).await, StatusCode::OK);
        assert_eq!(status(&app, Method::DELETE, &uri, &admin).await, StatusCode::NOT_FOUND);
        assert_eq!(status(&app, Method::GET, "/api/request", &alice).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_review_and_reports() {
        let (app, state) = app();
        sign_up(&app, "author", None).await;
        let moderator = sign_up(&app, "moderator", None).await;
        let other = sign_up(&app, "other", None).await;
        sign_up(&app, "root", Some(ADMIN_TOKEN)).await;
        for profile in [&moderator, &other] {
            let id = profile["id"].as_i64().unwrap();
            let promoted = state.db.change_role(id, Role::User.as_i32(), Role::Moderator.as_i32());
            assert!(promoted.unwrap());
        }
        let author = sign_in(&app, "author").await;
        let moderator = sign_in(&app, "moderator").await;
        let other = sign_in(&app, "other").await;
        let admin = sign_in(&app, "root").await;

        let good = create_post(&app, &author, "good").await;
        let bad = create_post(&app, &author, "bad").await;

        let queue = "/api/moderator/posts/unapproved";
        assert_eq!(status(&app, Method::GET, queue, &author).await, StatusCode::FORBIDDEN);
        let pending = send(&app, Method::GET, queue, Some(&moderator), None).await;
        assert_eq!(pending.body["data"].as_array().unwrap().len(), 2);

        let approve = format!("/api/moderator/post/approve/{}", good);
        assert_eq!(status(&app, Method::PUT, &approve, &moderator).await, StatusCode::OK);
        let ban = format!("/api/moderator/post/ban/{}", bad);
        let blank = json!({ "reason": " " });
        let reply = send(&app, Method::POST, &ban, Some(&moderator), Some(blank)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        let reason = json!({ "reason": "spam" });
        let reply = send(&app, Method::POST, &ban, Some(&moderator), Some(reason)).await;
        assert_eq!(reply.body["message"], json!("post has been banned"));

        let pending = send(&app, Method::GET, queue, Some(&moderator), None).await;
        assert!(pending.body["data"].as_array().unwrap().is_empty());
        let banned = state.db.get_post(bad).unwrap().unwrap();
        assert_eq!(banned.state, PostState::Banned.as_i32());
        assert_eq!(banned.ban_reason, "spam");

        let create = "/api/moderator/report/post/create";
        let report = json!({ "postId": bad });
        let reply = send(&app, Method::POST, create, Some(&author), Some(report.clone())).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        let reply = send(&app, Method::POST, create, Some(&moderator), Some(report.clone())).await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let reply = send(&app, Method::POST, create, Some(&moderator), Some(report.clone())).await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        let report = json!({ "postId": good });
        let reply = send(&app, Method::POST, create, Some(&other), Some(report)).await;
        assert_eq!(reply.status, StatusCode::CREATED);

        let mine = send(&app, Method::GET, "/api/moderator/reports", Some(&moderator), None).await;
        assert_eq!(mine.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(mine.body["data"][0]["postTitle"], json!("bad"));
        let bad_report = mine.body["data"][0]["id"].as_i64().unwrap();

        let theirs = send(&app, Method::GET, "/api/moderator/reports", Some(&other), None).await;
        let good_report = theirs.body["data"][0]["id"].as_i64().unwrap();
        let uri = format!("/api/moderator/report/post/delete/{}", good_report);
        assert_eq!(status(&app, Method::DELETE, &uri, &moderator).await, StatusCode::FORBIDDEN);

        let reports = "/api/admin/post/reports";
        assert_eq!(status(&app, Method::GET, reports, &moderator).await, StatusCode::FORBIDDEN);
        let all = send(&app, Method::GET, reports, Some(&admin), None).await;
        assert_eq!(all.body["data"].as_array().unwrap().len(), 2);

        let dismiss = format!("/api/admin/post/report/dismiss/{}", good_report);
        assert_eq!(status(&app, Method::DELETE, &dismiss, &admin).await, StatusCode::OK);
        assert!(state.db.get_post(good).unwrap().is_some());

        let accept = format!("/api/admin/post/report/accept/{}", bad_report);
        assert_eq!(status(&app, Method::PUT, &accept, &moderator).await, StatusCode::FORBIDDEN);
        let reply = send(&app, Method::PUT, &accept, Some(&admin), None).await;
        assert_eq!(reply.body["message"], json!("post report has been accepted"));
        assert!(state.db.get_post(bad).unwrap().is_none());
        let all = send(&app, Method::GET, reports, Some(&admin), None).await;
        assert!(all.body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_deletes_are_admin_only() {
        let (app, _) = app();
        sign_up(&app, "author", None).await;
        sign_up(&app, "root", Some(ADMIN_TOKEN)).await;
        let author = sign_in(&app, "author").await;
        let admin = sign_in(&app, "root").await;
        let post_id = create_post(&app, &author, "t").await;

        let body = json!({ "postId": post_id, "content": "hi" });
        let comment =
            send(&app, Method::POST, "/api/comment/create", Some(&author), Some(body)).await;
        let comment_id = comment.body["data"]["id"].as_i64().unwrap();

        let uri = format!("/api/admin/comment/delete/{}", comment_id);
        assert_eq!(status(&app, Method::DELETE, &uri, &author).await, StatusCode::FORBIDDEN);
        assert_eq!(status(&app, Method::DELETE, &uri, &admin).await, StatusCode::OK);
        assert_eq!(status(&app, Method::DELETE, &uri, &admin).await, StatusCode::NOT_FOUND);

        let uri = format!("/api/admin/post/delete/{}", post_id);
        assert_eq!(status(&app, Method::DELETE, &uri, &author).await, StatusCode::FORBIDDEN);
        assert_eq!(status(&app, Method::DELETE, &uri, &admin).await, StatusCode::OK);
    }
}
