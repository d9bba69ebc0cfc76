mod common;

use axum::http::{header, HeaderValue, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use common::spawn;

#[tokio::test]
async fn health_endpoint_responds() {
    let app = spawn().await;
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn signup_assigns_verification_group() {
    let app = spawn().await;

    let verified = app
        .register(
            "farmer_a",
            json!({"farm_name": "Green Acres", "phone_number": "0700000000"}),
        )
        .await;
    assert_eq!(verified["verification_status"], "verified");
    assert_eq!(verified["group"], "Verified Farmer");

    let partial = app
        .register("farmer_b", json!({"farm_name": "Dry Hills"}))
        .await;
    assert_eq!(partial["verification_status"], "unverified");
    assert_eq!(partial["group"], "Unverified User");
    assert!(partial.get("password").is_none());
}

#[tokio::test]
async fn signup_rejects_duplicates_and_weak_passwords() {
    let app = spawn().await;
    app.register("farmer_a", json!({})).await;

    let response = app
        .server
        .post("/api/farmers/")
        .json(&json!({
            "username": "farmer_a",
            "email": "farmer_a@test.com",
            "password": "12345678",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Validation failed");
    assert!(body["fields"]["username"].is_array());
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn token_login_accepts_email_and_rejects_bad_password() {
    let app = spawn().await;
    app.register("farmer_a", json!({})).await;

    let by_email = app.token("farmer_a@test.com").await;
    let by_username = app.token("farmer_a").await;
    assert_eq!(by_email, by_username);

    let response = app
        .server
        .post("/api-token-auth/")
        .json(&json!({"username": "farmer_a", "password": "wrong-password"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["fields"]["non_field_errors"][0],
        "Unable to log in with provided credentials."
    );
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = spawn().await;

    app.server
        .get("/api/fields/")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/fields/")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Token not-a-real-token"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_farmer_list_is_empty_and_own_list_has_one_row() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;
    app.register("farmer_b", json!({})).await;

    let anonymous: Value = app.server.get("/api/farmers/").await.json();
    assert_eq!(anonymous, json!([]));

    let own: Value = app.get(&auth, "/api/farmers/").await.json();
    assert_eq!(own.as_array().unwrap().len(), 1);
    assert_eq!(own[0]["username"], "farmer_a");
}

#[tokio::test]
async fn fields_are_isolated_between_farmers() {
    let app = spawn().await;
    let farmer_a = app.farmer("farmer_a").await;
    let farmer_b = app.farmer("farmer_b").await;

    let field_a = app.create_field(&farmer_a, "Alpha").await;
    app.create_field(&farmer_b, "Beta").await;

    let listed: Value = app.get(&farmer_a, "/api/fields/").await.json();
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha"]);

    app.get(&farmer_b, &format!("/api/fields/{field_a}/"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete(&format!("/api/fields/{field_a}/"))
        .add_header(header::AUTHORIZATION, farmer_b.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn field_size_must_be_positive() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;

    let response = app
        .post(
            &auth,
            "/api/fields/",
            json!({"name": "Alpha", "size_in_hectares": 0}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["fields"]["size_in_hectares"].is_array());
}

#[tokio::test]
async fn crop_cannot_target_another_farmers_field() {
    let app = spawn().await;
    let farmer_a = app.farmer("farmer_a").await;
    let farmer_b = app.farmer("farmer_b").await;
    let field_a = app.create_field(&farmer_a, "Alpha").await;

    let response = app
        .post(
            &farmer_b,
            "/api/crops/",
            json!({"name": "Maize", "category": "Cereal", "fields": field_a}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["fields"]["fields"][0]
        .as_str()
        .unwrap()
        .contains("do not own"));

    let response = app
        .post(
            &farmer_a,
            "/api/crops/",
            json!({"name": "Maize", "category": "Cereal", "fields": field_a, "planted_on": "2025-03-01"}),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let crop: Value = response.json();
    assert_eq!(crop["fields"], "Alpha");
    assert_eq!(crop["status"], "planted");
}

#[tokio::test]
async fn weather_rejects_foreign_field() {
    let app = spawn().await;
    let farmer_a = app.farmer("farmer_a").await;
    let farmer_b = app.farmer("farmer_b").await;
    let field_a = app.create_field(&farmer_a, "Alpha").await;

    let response = app
        .post(
            &farmer_b,
            "/api/weather/",
            json!({
                "recorded_at": "2025-12-29T10:00:00Z",
                "field": field_a,
                "location": "North",
                "temperature": 21.5,
                "humidity": 60,
            }),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["fields"]["field"].is_array());
}

#[tokio::test]
async fn weather_list_is_paginated_newest_first() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;

    for hour in 0..27 {
        let response = app
            .post(
                &auth,
                "/api/weather/",
                json!({
                    "recorded_at": format!("2025-12-29T{:02}:00:00", hour % 24),
                    "location": format!("Station {hour}"),
                    "temperature": 20.0,
                    "humidity": 55.0,
                }),
            )
            .await;
        // Repeated timestamps are fine without a field.
        response.assert_status(StatusCode::CREATED);
    }

    let first: Value = app.get(&auth, "/api/weather/").await.json();
    assert_eq!(first["count"], 27);
    assert_eq!(first["results"].as_array().unwrap().len(), 25);
    assert_eq!(first["next_page"], 2);
    assert_eq!(first["results"][0]["recorded_at"], "2025-12-29T23:00:00");

    let second: Value = app.get(&auth, "/api/weather/?page=2").await.json();
    assert_eq!(second["results"].as_array().unwrap().len(), 2);
    assert!(second["next_page"].is_null());
}

#[tokio::test]
async fn activity_search_and_status_filter() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;

    for (title, status) in [
        ("Harvesting Task", "scheduled"),
        ("Irrigation", "completed"),
        ("Harvest planning", "completed"),
    ] {
        app.post(
            &auth,
            "/api/activities/",
            json!({"title": title, "scheduled_date": "2026-01-10", "status": status}),
        )
        .await
        .assert_status(StatusCode::CREATED);
    }

    let found: Value = app.get(&auth, "/api/activities/?search=Harvest").await.json();
    assert_eq!(found.as_array().unwrap().len(), 2);

    let completed: Value = app
        .get(&auth, "/api/activities/?status=completed")
        .await
        .json();
    assert_eq!(completed.as_array().unwrap().len(), 2);

    let all: Value = app.get(&auth, "/api/activities/?status=all").await.json();
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn activity_crop_must_be_owned() {
    let app = spawn().await;
    let farmer_a = app.farmer("farmer_a").await;
    let farmer_b = app.farmer("farmer_b").await;
    let field_a = app.create_field(&farmer_a, "Alpha").await;
    let crop: Value = app
        .post(
            &farmer_a,
            "/api/crops/",
            json!({"name": "Maize", "category": "Cereal", "fields": field_a}),
        )
        .await
        .json();

    let response = app
        .post(
            &farmer_b,
            "/api/activities/",
            json!({"title": "Spraying", "scheduled_date": "2026-01-10", "crop": crop["id"]}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["fields"]["crop"].is_array());
}

#[tokio::test]
async fn secure_route_accepts_geojson() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;

    let response = app
        .post(
            &auth,
            "/api/secure-routes/",
            json!({
                "route_name": "Market road",
                "route_path_geojson": {"type": "LineString", "coordinates": [[36.8, -1.28], [36.9, -1.3]]},
                "security_status": "yellow",
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["route_path_geojson"]["type"], "LineString");

    let response = app
        .post(
            &auth,
            "/api/secure-routes/",
            json!({
                "route_name": "Broken",
                "route_path_geojson": {"coordinates": []},
                "security_status": "green",
            }),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn review_eligibility_follows_account_age_and_last_review() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;

    let young: Value = app.get(&auth, "/api/reviews/eligibility/").await.json();
    assert_eq!(young["show_review_modal"], false);

    let now = Utc::now().naive_utc();
    app.set_date_joined("farmer_a", now - Duration::days(40)).await;
    let old: Value = app.get(&auth, "/api/reviews/eligibility/").await.json();
    assert_eq!(old["show_review_modal"], true);

    app.post(
        &auth,
        "/api/reviews/",
        json!({"content": "Great tool", "rating": 5}),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let reviewed: Value = app.get(&auth, "/api/reviews/eligibility/").await.json();
    assert_eq!(reviewed["show_review_modal"], false);
}

#[tokio::test]
async fn review_rating_is_bounded() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;

    let response = app
        .post(&auth, "/api/reviews/", json!({"content": "Too good", "rating": 6}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["fields"]["rating"].is_array());
}

#[tokio::test]
async fn posts_are_shared_but_only_authors_edit() {
    let app = spawn().await;
    let farmer_a = app.farmer("farmer_a").await;
    let farmer_b = app.farmer("farmer_b").await;

    let post: Value = app
        .post(
            &farmer_a,
            "/api/posts/",
            json!({"title": "Rain is coming", "content": "Cover the seedlings."}),
        )
        .await
        .json();
    let post_id = post["id"].as_i64().unwrap();

    let seen: Value = app.get(&farmer_b, &format!("/api/posts/{post_id}/")).await.json();
    assert_eq!(seen["author_name"], "farmer_a");

    app.server
        .patch(&format!("/api/posts/{post_id}/"))
        .add_header(header::AUTHORIZATION, farmer_b.clone())
        .json(&json!({"title": "Hijacked"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let liked: Value = app
        .post(&farmer_b, &format!("/api/posts/{post_id}/like/"), json!({}))
        .await
        .json();
    assert_eq!(liked, json!({"liked": true, "likes": 1}));
    let unliked: Value = app
        .post(&farmer_b, &format!("/api/posts/{post_id}/like/"), json!({}))
        .await
        .json();
    assert_eq!(unliked, json!({"liked": false, "likes": 0}));

    let comment = app
        .post(
            &farmer_b,
            &format!("/api/posts/{post_id}/comments/"),
            json!({"content": "Thanks!"}),
        )
        .await;
    comment.assert_status(StatusCode::CREATED);
    let comment_id = comment.json::<Value>()["id"].as_i64().unwrap();

    app.server
        .delete(&format!("/api/posts/{post_id}/comments/{comment_id}/"))
        .add_header(header::AUTHORIZATION, farmer_a.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

async fn create_activity(app: &common::TestApp, auth: &HeaderValue, body: Value) -> Value {
    let response = app.post(auth, "/api/activities/", body).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn activity_field_must_be_owned() {
    let app = spawn().await;
    let farmer_a = app.farmer("farmer_a").await;
    let farmer_b = app.farmer("farmer_b").await;
    let field_a = app.create_field(&farmer_a, "Alpha").await;

    let response = app
        .post(
            &farmer_b,
            "/api/activities/",
            json!({"title": "Ploughing", "scheduled_date": "2026-01-10", "field": field_a}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["fields"]["field"][0], "This field does not belong to you.");
}

#[tokio::test]
async fn weather_rejects_duplicate_field_timestamp() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;
    let field_id = app.create_field(&auth, "Alpha").await;
    let record = json!({
        "recorded_at": "2025-12-29T10:00:00",
        "field": field_id,
        "location": "North",
        "temperature": 21.5,
        "humidity": 60,
    });

    app.post(&auth, "/api/weather/", record.clone())
        .await
        .assert_status(StatusCode::CREATED);

    let response = app.post(&auth, "/api/weather/", record).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["fields"]["non_field_errors"][0],
        "The fields field, recorded_at must make a unique set."
    );
}

#[tokio::test]
async fn profile_update_keeps_verification_status() {
    let app = spawn().await;
    let farmer = app.register("farmer_a", json!({})).await;
    let token = app.token("farmer_a").await;
    let auth = HeaderValue::from_str(&format!("Token {token}")).unwrap();
    assert_eq!(farmer["group"], "Unverified User");

    let response = app
        .patch(
            &auth,
            &format!("/api/farmers/{}/", farmer["id"]),
            json!({"farm_name": "Green Acres", "phone_number": "0700000000"}),
        )
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["farm_name"], "Green Acres");
    assert_eq!(updated["verification_status"], "unverified");
    assert_eq!(updated["group"], "Unverified User");
}

#[tokio::test]
async fn updates_cannot_move_records_to_a_foreign_field() {
    let app = spawn().await;
    let farmer_a = app.farmer("farmer_a").await;
    let farmer_b = app.farmer("farmer_b").await;
    let field_a = app.create_field(&farmer_a, "Alpha").await;
    let field_b = app.create_field(&farmer_b, "Beta").await;

    let crop: Value = app
        .post(
            &farmer_a,
            "/api/crops/",
            json!({"name": "Maize", "category": "Cereal", "fields": field_a}),
        )
        .await
        .json();
    let response = app
        .put(
            &farmer_a,
            &format!("/api/crops/{}/", crop["id"]),
            json!({"name": "Maize", "category": "Cereal", "fields": field_b}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["fields"].is_array());

    let activity = create_activity(
        &app,
        &farmer_a,
        json!({"title": "Ploughing", "scheduled_date": "2026-01-10", "field": field_a}),
    )
    .await;
    let response = app
        .patch(
            &farmer_a,
            &format!("/api/activities/{}/", activity["id"]),
            json!({"field": field_b}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["fields"]["field"][0],
        "This field does not belong to you."
    );

    let record: Value = app
        .post(
            &farmer_a,
            "/api/weather/",
            json!({
                "recorded_at": "2025-12-29T10:00:00",
                "field": field_a,
                "location": "North",
                "temperature": 21.5,
                "humidity": 60,
            }),
        )
        .await
        .json();
    let response = app
        .patch(
            &farmer_a,
            &format!("/api/weather/{}/", record["id"]),
            json!({"field": field_b}),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["field"].is_array());

    // Nothing moved.
    let crop: Value = app
        .get(&farmer_a, &format!("/api/crops/{}/", crop["id"]))
        .await
        .json();
    assert_eq!(crop["fields"], "Alpha");
}

#[tokio::test]
async fn patch_null_clears_optional_references() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;
    let field_id = app.create_field(&auth, "Alpha").await;
    let activity = create_activity(
        &app,
        &auth,
        json!({
            "title": "Ploughing",
            "scheduled_date": "2026-01-10",
            "estimated_harvest_date": "2026-04-10",
            "field": field_id,
        }),
    )
    .await;
    assert_eq!(activity["field_name"], "Alpha");

    let path = format!("/api/activities/{}/", activity["id"]);
    let response = app.patch(&auth, &path, json!({"field": null})).await;
    response.assert_status_ok();
    let cleared: Value = response.json();
    assert!(cleared["field"].is_null());
    assert!(cleared["field_name"].is_null());
    assert_eq!(cleared["estimated_harvest_date"], "2026-04-10");

    // An absent key leaves the stored value alone.
    let response = app.patch(&auth, &path, json!({"title": "Tilling"})).await;
    response.assert_status_ok();
    let renamed: Value = response.json();
    assert_eq!(renamed["title"], "Tilling");
    assert_eq!(renamed["estimated_harvest_date"], "2026-04-10");

    let response = app
        .patch(&auth, &path, json!({"estimated_harvest_date": null}))
        .await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["estimated_harvest_date"].is_null());
}

#[tokio::test]
async fn malformed_query_and_path_get_json_errors() {
    let app = spawn().await;
    let auth = app.farmer("farmer_a").await;

    let response = app.get(&auth, "/api/weather/?page=abc").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    let response = app.get(&auth, "/api/fields/abc/").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.json::<Value>()["error"].is_string());
}

#[test]
fn farmer_delete_recounts_cascaded_totals() {
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            let app = spawn().await;
            let auth = app.farmer("farmer_a").await;
            let field_id = app.create_field(&auth, "Alpha").await;
            app.post(
                &auth,
                "/api/crops/",
                json!({"name": "Maize", "category": "Cereal", "fields": field_id}),
            )
            .await
            .assert_status(StatusCode::CREATED);

            let farmer: Value = app.get(&auth, "/api/farmers/").await.json();
            app.server
                .delete(&format!("/api/farmers/{}/", farmer[0]["id"]))
                .add_header(header::AUTHORIZATION, auth.clone())
                .await
                .assert_status(StatusCode::NO_CONTENT);
        })
    });

    let rendered = handle.render();
    assert!(rendered.contains("agri_fields_total 0"), "{rendered}");
    assert!(rendered.contains("agri_crops_total 0"), "{rendered}");
}
