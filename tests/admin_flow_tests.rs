//! End-to-end flows: login, admin pages, team management, public listings.

mod common;

use chrono::Duration;
use serde_json::{json, Value};

use common::{client, cookie, seed_session, seed_user, set_cookie_headers, start_in_memory};
use sitedesk::actions::{ContentItem, ContentKind, ContentRepo};
use sitedesk::identity::{ensure_bootstrap_admin, Role, UserStore};

fn session_token_from(resp: &reqwest::Response) -> Option<String> {
    set_cookie_headers(resp).iter().find_map(|c| {
        let (nv, _) = c.split_once(';')?;
        let (name, value) = nv.split_once('=')?;
        (name == "session_token" && !value.is_empty()).then(|| value.to_string())
    })
}

#[tokio::test]
async fn login_then_browse_then_logout() {
    let (server, store) = start_in_memory().await;
    ensure_bootstrap_admin(store.as_ref(), "root@site.test", "hunter2").await.unwrap();

    let resp = client().post(server.url("/api/auth/login"))
        .json(&json!({"email": "Root@Site.test", "password": "hunter2"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let token = session_token_from(&resp).expect("session cookie set");
    assert!(set_cookie_headers(&resp)[0].contains("HttpOnly"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "SUPER_ADMIN");
    assert!(body["user"].get("password_hash").is_none());

    let resp = client().get(server.url("/admin")).header("Cookie", cookie(&token)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["nav"].as_array().unwrap().len(), 7);
    assert_eq!(page["summary"]["team_members"], 1);
    assert_eq!(page["can_delete"], true);

    let resp = client().post(server.url("/api/auth/logout")).header("Cookie", cookie(&token)).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client().get(server.url("/admin")).header("Cookie", cookie(&token)).send().await.unwrap();
    assert_eq!(resp.status(), 303);
}

#[tokio::test]
async fn bad_credentials_set_no_cookie() {
    let (server, store) = start_in_memory().await;
    ensure_bootstrap_admin(store.as_ref(), "root@site.test", "hunter2").await.unwrap();

    let resp = client().post(server.url("/api/auth/login"))
        .json(&json!({"email": "root@site.test", "password": "wrong"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 401);
    assert!(set_cookie_headers(&resp).is_empty());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
    assert_eq!(store.session_count(), 0);

    let resp = client().post(server.url("/api/auth/login")).json(&json!({"email": "root@site.test"})).send().await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unreadable_login_bodies_are_json_user_errors() {
    let (server, store) = start_in_memory().await;
    let cases = [
        ("application/json", r#"{"email": 5}"#),
        ("application/json", "not json"),
        ("text/plain", "{}"),
    ];
    for (content_type, body) in cases {
        let resp = client().post(server.url("/api/auth/login"))
            .header("Content-Type", content_type)
            .body(body)
            .send().await.unwrap();
        assert_eq!(resp.status(), 400, "{content_type} {body}");
        assert!(set_cookie_headers(&resp).is_empty());
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "invalid_payload");
        assert!(err["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
    assert_eq!(store.session_count(), 0);
}

#[tokio::test]
async fn editor_dashboard_hides_admin_sections() {
    let (server, store) = start_in_memory().await;
    let editor = seed_user(&store, "editor@site.test", Role::Editor).await;
    seed_session(&store, "ed", &editor.id, Duration::hours(1)).await;

    let page: Value = client().get(server.url("/admin")).header("Cookie", cookie("ed")).send().await.unwrap().json().await.unwrap();
    let paths: Vec<&str> = page["nav"].as_array().unwrap().iter().map(|e| e["path"].as_str().unwrap()).collect();
    assert!(paths.contains(&"/admin/blog"));
    assert!(!paths.contains(&"/admin/inbox"));
    assert!(!paths.contains(&"/admin/team"));
    assert_eq!(page["can_delete"], false);
}

#[tokio::test]
async fn edit_and_delete_content() {
    let (server, store) = start_in_memory().await;
    let admin = seed_user(&store, "admin@site.test", Role::Admin).await;
    seed_session(&store, "adm", &admin.id, Duration::hours(1)).await;
    let post = ContentItem::new(ContentKind::BlogPost, "Hello", "first post", true);
    store.insert_item(&post).await.unwrap();

    let resp = client().get(server.url(&format!("/admin/blog/{}/edit", post.id))).header("Cookie", cookie("adm")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["item"]["title"], "Hello");
    assert_eq!(page["item"]["kind"], "blog_post");

    // Same id under another section is not found
    let resp = client().get(server.url(&format!("/admin/projects/{}/edit", post.id))).header("Cookie", cookie("adm")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client().delete(server.url(&format!("/admin/blog/{}", post.id))).header("Cookie", cookie("adm")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = client().delete(server.url(&format!("/admin/blog/{}", post.id))).header("Cookie", cookie("adm")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn super_admin_changes_team_roles() {
    let (server, store) = start_in_memory().await;
    let root = seed_user(&store, "root@site.test", Role::SuperAdmin).await;
    seed_session(&store, "root", &root.id, Duration::hours(1)).await;
    let member = seed_user(&store, "member@site.test", Role::Editor).await;
    seed_session(&store, "member", &member.id, Duration::hours(1)).await;

    let resp = client().get(server.url("/admin/inbox")).header("Cookie", cookie("member")).send().await.unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client().put(server.url(&format!("/admin/team/{}/role", member.id)))
        .header("Cookie", cookie("root"))
        .json(&json!({"role": "ADMIN"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["member"]["role"], "ADMIN");

    // The member's existing session picks up the new role
    let resp = client().get(server.url("/admin/inbox")).header("Cookie", cookie("member")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let team: Value = client().get(server.url("/admin/team")).header("Cookie", cookie("root")).send().await.unwrap().json().await.unwrap();
    let emails: Vec<&str> = team["members"].as_array().unwrap().iter().map(|m| m["email"].as_str().unwrap()).collect();
    assert_eq!(emails, vec!["member@site.test", "root@site.test"]);

    let resp = client().put(server.url("/admin/team/nobody/role"))
        .header("Cookie", cookie("root"))
        .json(&json!({"role": "ADMIN"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client().put(server.url(&format!("/admin/team/{}/role", member.id)))
        .header("Cookie", cookie("root"))
        .json(&json!({"role": "OWNER"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(store.get_user(&member.id).await.unwrap().unwrap().role, Role::Admin);

    // Sole SUPER_ADMIN demoting themselves
    let resp = client().put(server.url(&format!("/admin/team/{}/role", root.id)))
        .header("Cookie", cookie("root"))
        .json(&json!({"role": "EDITOR"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "last_super_admin");
    assert_eq!(store.get_user(&root.id).await.unwrap().unwrap().role, Role::SuperAdmin);
}

#[tokio::test]
async fn team_role_body_is_not_parsed_for_unauthorized_callers() {
    let (server, store) = start_in_memory().await;
    let admin = seed_user(&store, "admin@site.test", Role::Admin).await;
    seed_session(&store, "adm", &admin.id, Duration::hours(1)).await;

    let resp = client().put(server.url(&format!("/admin/team/{}/role", admin.id)))
        .header("Cookie", cookie("adm"))
        .body("not json")
        .send().await.unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client().put(server.url(&format!("/admin/team/{}/role", admin.id)))
        .body("not json")
        .send().await.unwrap();
    assert_eq!(resp.status(), 303);
}

#[tokio::test]
async fn public_listings_show_only_published_items() {
    let (server, store) = start_in_memory().await;
    store.insert_item(&ContentItem::new(ContentKind::Service, "Branding", "logos", true)).await.unwrap();
    store.insert_item(&ContentItem::new(ContentKind::Service, "Secret", "unlaunched", false)).await.unwrap();

    let resp = client().get(server.url("/api/public/services")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Branding");

    let body: Value = client().get(server.url("/api/public/blog")).send().await.unwrap().json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());
}
