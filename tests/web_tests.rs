mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use common::{spawn, PASSWORD};

fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn anonymous_pages_redirect_to_login() {
    let app = spawn().await;

    let response = app.server.get("/fields/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/?next=/fields/");

    let response = app.server.get("/activities/?status=completed").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/accounts/login/?next=/activities/%3Fstatus%3Dcompleted"
    );

    app.server.get("/").await.assert_status_ok();
    app.server.get("/accounts/login/").await.assert_status_ok();
}

#[tokio::test]
async fn signup_then_login_reaches_dashboard() {
    let app = spawn().await;

    let response = app
        .server
        .post("/registration/")
        .form(&[
            ("username", "farmer_a"),
            ("email", "farmer_a@test.com"),
            ("farm_name", "Green Acres"),
            ("phone_number", "0700000000"),
            ("password", PASSWORD),
            ("password_confirm", PASSWORD),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/");

    app.login_page_session("farmer_a").await;
    let dashboard = app.server.get("/").await;
    dashboard.assert_status_ok();
    assert!(dashboard.text().contains("Welcome back, farmer_a"));

    let profile = app.server.get("/profiles/").await;
    profile.assert_status_ok();
    assert!(profile.text().contains("Verified Farmer"));
}

#[tokio::test]
async fn signup_form_reports_mismatched_passwords() {
    let app = spawn().await;

    let response = app
        .server
        .post("/registration/")
        .form(&[
            ("username", "farmer_a"),
            ("email", "farmer_a@test.com"),
            ("password", PASSWORD),
            ("password_confirm", "something-else"),
        ])
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.text().contains("The two password fields didn&#x27;t match."));
}

#[tokio::test]
async fn bad_login_rerenders_form() {
    let app = spawn().await;
    app.register("farmer_a", json!({})).await;

    let response = app
        .server
        .post("/accounts/login/")
        .form(&[("username", "farmer_a"), ("password", "wrong-password")])
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response
        .text()
        .contains("Unable to log in with provided credentials."));
}

#[tokio::test]
async fn field_form_validates_then_redirects() {
    let app = spawn().await;
    app.register("farmer_a", json!({})).await;
    app.login_page_session("farmer_a").await;

    let rejected = app
        .server
        .post("/fields/add/")
        .form(&[("name", "Alpha"), ("size_in_hectares", "five")])
        .await;
    rejected.assert_status(StatusCode::BAD_REQUEST);
    assert!(rejected.text().contains("Enter a number."));

    let created = app
        .server
        .post("/fields/add/")
        .form(&[("name", "Alpha"), ("size_in_hectares", "4.5"), ("soil_type", "Clay")])
        .await;
    created.assert_status(StatusCode::SEE_OTHER);
    let detail_url = location(&created);
    assert!(detail_url.starts_with("/fields/"));

    let detail = app.server.get(&detail_url).await;
    detail.assert_status_ok();
    assert!(detail.text().contains("Clay"));

    let listing = app.server.get("/fields/").await;
    assert!(listing.text().contains("Alpha"));
}

#[tokio::test]
async fn another_farmers_records_are_not_found() {
    let app = spawn().await;
    let owner = app.farmer("farmer_b").await;
    let field_id = app.create_field(&owner, "Beta").await;

    app.register("farmer_a", json!({})).await;
    app.login_page_session("farmer_a").await;

    let missing = app.server.get(&format!("/fields/{field_id}/")).await;
    missing.assert_status(StatusCode::NOT_FOUND);
    let page = missing.text();
    assert!(page.contains("Field not found"), "{page}");
    assert!(page.contains("farmer_a"), "error page keeps the signed-in nav");

    let listing = app.server.get("/fields/").await;
    listing.assert_status_ok();
    assert!(!listing.text().contains("Beta"));

    let crop_form = app
        .server
        .post("/crops/add/")
        .form(&[
            ("name", "Maize"),
            ("category", "Cereal"),
            ("fields", field_id.to_string().as_str()),
            ("status", "planted"),
        ])
        .await;
    crop_form.assert_status(StatusCode::BAD_REQUEST);
    assert!(crop_form.text().contains("do not own"));
}

#[tokio::test]
async fn review_modal_appears_for_established_accounts() {
    let app = spawn().await;
    app.register("farmer_a", json!({})).await;
    app.login_page_session("farmer_a").await;

    let fresh = app.server.get("/").await;
    assert!(!fresh.text().contains("id=\"review-modal\""));

    app.set_date_joined("farmer_a", Utc::now().naive_utc() - Duration::days(45))
        .await;
    let established = app.server.get("/").await;
    assert!(established.text().contains("id=\"review-modal\""));

    let submitted = app
        .server
        .post("/reviews/submit/")
        .form(&[("rating", "4"), ("content", "Works well for my farm")])
        .await;
    submitted.assert_status(StatusCode::SEE_OTHER);

    let after = app.server.get("/").await;
    assert!(!after.text().contains("id=\"review-modal\""));
}

#[tokio::test]
async fn only_authors_can_edit_posts() {
    let app = spawn().await;
    let author = app.farmer("farmer_b").await;
    let post: Value = app
        .post(
            &author,
            "/api/posts/",
            json!({"title": "Seed swap", "content": "Saturday at the co-op."}),
        )
        .await
        .json();
    let post_id = post["id"].as_i64().unwrap();

    app.register("farmer_a", json!({})).await;
    app.login_page_session("farmer_a").await;

    let thread = app.server.get(&format!("/post/{post_id}/")).await;
    thread.assert_status_ok();
    assert!(thread.text().contains("Seed swap"));

    app.server
        .get(&format!("/post/{post_id}/edit/"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let liked = app.server.post(&format!("/post/{post_id}/like/")).await;
    liked.assert_status(StatusCode::SEE_OTHER);

    let commented = app
        .server
        .post(&format!("/post/{post_id}/comment/"))
        .form(&[("content", "Count me in")])
        .await;
    commented.assert_status(StatusCode::SEE_OTHER);

    let thread = app.server.get(&format!("/post/{post_id}/")).await;
    let body = thread.text();
    assert!(body.contains("Count me in"));
    assert!(body.contains("Unlike"));
}
