//! API integration tests against the in-memory backend

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use common::{token_for, TestApp};
use equipment_rental_server::models::Role;

fn days_from_now(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");

    let (status, body) = app.send(Method::GET, "/api/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn missing_or_bad_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/equipment", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthenticated");

    let (status, _) = app
        .send(Method::GET, "/api/equipment", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn equipment_uses_camel_case_and_decimal_strings() {
    let app = TestApp::new();
    let admin = app.customer("root", Role::Admin).await;
    let token = token_for(&admin);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/equipment",
            Some(&token),
            Some(json!({
                "name": "Telehandler",
                "description": "4t reach",
                "category": "HeavyMachinery",
                "rentalPrice": 320.5,
                "imageUrl": "https://img.example.com/th.png"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isAvailable"], true);
    assert_eq!(body["condition"], "New");
    assert_eq!(body["rentalPrice"], "320.5");
    assert_eq!(body["imageUrl"], "https://img.example.com/th.png");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/equipment",
            Some(&token),
            Some(json!({
                "name": "",
                "description": "",
                "category": "Safety",
                "rentalPrice": "-1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn users_cannot_manage_inventory_or_see_rented_list() {
    let app = TestApp::new();
    let user = app.customer("uma", Role::User).await;
    let token = token_for(&user);
    let equipment = app.equipment("Van").await;

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/equipment/{}", equipment.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");

    let (status, _) = app
        .send(Method::GET, "/api/equipment/rented", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::GET, "/api/equipment/available", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn signup_then_me() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/customer",
            None,
            Some(json!({
                "name": "Nora",
                "email": "nora@example.com",
                "username": "nora",
                "password": "hunter22"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "User");
    assert!(body.get("password").is_none());

    let (status, _) = app
        .send(
            Method::POST,
            "/api/customer",
            None,
            Some(json!({ "name": "Nora 2", "username": "NORA", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/customer",
            None,
            Some(json!({ "name": "Mallory", "username": "mallory", "password": "pw1234", "role": "Admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let nora = app
        .repository
        .customers
        .get_by_username("nora")
        .await
        .unwrap()
        .unwrap();
    let (status, body) = app
        .send(Method::GET, "/api/auth/me", Some(&token_for(&nora)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "nora");

    let (status, body) = app
        .send(
            Method::GET,
            "/api/customer/username/NORA",
            Some(&token_for(&nora)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], nora.id);
}

#[tokio::test]
async fn issue_return_round_trip() {
    let app = TestApp::new();
    let customer = app.customer("carl", Role::User).await;
    let other = app.customer("cindy", Role::User).await;
    let token = token_for(&customer);
    let e1 = app.equipment("Excavator").await;
    let e2 = app.equipment("Dumper").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&token),
            Some(json!({
                "equipmentId": e1.id,
                "customerId": customer.id,
                "dueDate": days_from_now(7),
                "notes": "site 4"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rental"]["status"], "Active");
    let rental_id = body["rental"]["id"].as_i64().unwrap();

    let (_, equipment) = app
        .send(Method::GET, &format!("/api/equipment/{}", e1.id), Some(&token), None)
        .await;
    assert_eq!(equipment["isAvailable"], false);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&token_for(&other)),
            Some(json!({
                "equipmentId": e1.id,
                "customerId": other.id,
                "dueDate": days_from_now(7)
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "equipment is not available");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&token),
            Some(json!({
                "equipmentId": e2.id,
                "customerId": customer.id,
                "dueDate": days_from_now(7)
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "customer already has an active rental");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/customer/{}/active-rental", customer.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], rental_id);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/return",
            Some(&token),
            Some(json!({
                "rentalId": rental_id,
                "conditionOnReturn": "Fair",
                "notes": "bucket tooth missing"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rental"]["status"], "Completed");
    assert_eq!(body["rental"]["conditionOnReturn"], "Fair");
    assert_eq!(body["rental"]["notes"], "bucket tooth missing");

    let tables = app.store.snapshot().await;
    assert!(tables.equipment[&e1.id].is_available);

    let (_, body) = app
        .send(
            Method::GET,
            &format!("/api/customer/{}/active-rental", customer.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn bad_request_bodies_are_bad_values() {
    let app = TestApp::new();
    let admin = app.customer("root", Role::Admin).await;
    let customer = app.customer("erin", Role::User).await;
    let token = token_for(&customer);
    let equipment = app.equipment("Compactor").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&token),
            Some(json!({ "equipmentId": equipment.id, "customerId": customer.id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert_eq!(body["code"], 6);
    assert!(body["message"].as_str().unwrap().contains("dueDate"));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&token),
            Some(json!({
                "equipmentId": equipment.id,
                "customerId": customer.id,
                "dueDate": "next tuesday"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&token),
            Some(json!({
                "equipmentId": equipment.id,
                "customerId": customer.id,
                "dueDate": "2030-01-10",
                "notes": "weekend job"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["rental"]["dueDate"]
        .as_str()
        .unwrap()
        .starts_with("2030-01-10T00:00:00"));
    let rental_id = body["rental"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/rental/{}", rental_id),
            Some(&token_for(&admin)),
            Some(json!({ "newDueDate": "2030-01-20" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rental"]["dueDate"]
        .as_str()
        .unwrap()
        .starts_with("2030-01-20T00:00:00"));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/return",
            Some(&token),
            Some(json!({ "rentalId": rental_id, "conditionOnReturn": "Broken" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/equipment",
            Some(&token_for(&admin)),
            Some(json!({ "name": "Drill" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    // A return without notes clears the notes written at issue time.
    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/return",
            Some(&token),
            Some(json!({ "rentalId": rental_id, "conditionOnReturn": "Good" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rental"]["notes"], Value::Null);
}

#[tokio::test]
async fn extend_and_cancel_are_admin_operations() {
    let app = TestApp::new();
    let admin = app.customer("boss", Role::Admin).await;
    let customer = app.customer("dora", Role::User).await;
    let admin_token = token_for(&admin);
    let user_token = token_for(&customer);
    let equipment = app.equipment("Loader").await;

    let (_, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&admin_token),
            Some(json!({
                "equipmentId": equipment.id,
                "customerId": customer.id,
                "dueDate": days_from_now(5)
            })),
        )
        .await;
    let rental_id = body["rental"]["id"].as_i64().unwrap();
    let due: DateTime<Utc> = body["rental"]["dueDate"].as_str().unwrap().parse().unwrap();
    let uri = format!("/api/rental/{}", rental_id);

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&user_token),
            Some(json!({ "newDueDate": (due + Duration::days(1)).to_rfc3339() })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin_token),
            Some(json!({ "newDueDate": (due - Duration::days(1)).to_rfc3339() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "new due date must be after current due date");

    let later = due + Duration::days(1);
    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin_token),
            Some(json!({ "newDueDate": later.to_rfc3339() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let stored: DateTime<Utc> = body["rental"]["dueDate"].as_str().unwrap().parse().unwrap();
    assert_eq!(stored, later);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Rental cancelled successfully");

    let (status, _) = app.send(Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let tables = app.store.snapshot().await;
    assert!(tables.equipment[&equipment.id].is_available);
}

#[tokio::test]
async fn overdue_listing_is_admin_only() {
    let app = TestApp::new();
    let admin = app.customer("admin", Role::Admin).await;
    let customer = app.customer("late", Role::User).await;
    let equipment = app.equipment("Generator").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/rental/issue",
            Some(&token_for(&admin)),
            Some(json!({
                "equipmentId": equipment.id,
                "customerId": customer.id,
                "dueDate": days_from_now(-2)
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rental"]["status"], "Overdue");

    let (status, _) = app
        .send(Method::GET, "/api/rental/overdue", Some(&token_for(&customer)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::GET, "/api/rental/overdue", Some(&token_for(&admin)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "Overdue");

    let (_, body) = app
        .send(Method::GET, "/api/rental", Some(&token_for(&customer)), None)
        .await;
    assert_eq!(body[0]["status"], "Overdue");
}

#[tokio::test]
async fn customer_with_open_rental_cannot_be_deleted() {
    let app = TestApp::new();
    let admin = app.customer("admin", Role::Admin).await;
    let customer = app.customer("holder", Role::User).await;
    let equipment = app.equipment("Skid steer").await;
    let token = token_for(&admin);

    app.send(
        Method::POST,
        "/api/rental/issue",
        Some(&token),
        Some(json!({
            "equipmentId": equipment.id,
            "customerId": customer.id,
            "dueDate": days_from_now(3)
        })),
    )
    .await;

    let uri = format!("/api/customer/{}", customer.id);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::DELETE, "/api/customer/9999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/rental/issue"].is_object());
}
