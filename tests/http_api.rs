mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use branch_payroll::{
    auth::generate_token,
    config::Config,
    models::{Employee, UserRole},
    routes::app,
    state::AppState,
    store::MemoryStore,
};
use common::employee;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    store: MemoryStore,
    employee: Employee,
}

async fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let employee = employee(Uuid::new_v4(), dec!(500.00), dec!(50.00));
    store.insert_employee(employee.clone()).await;

    let config = Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: SECRET.to_string(),
    };
    let state = AppState::new(Arc::new(store.clone()), config);

    TestApp {
        router: app(state),
        store,
        employee,
    }
}

fn token(role: UserRole, branch_id: Option<Uuid>) -> String {
    generate_token(Uuid::new_v4(), role, branch_id, SECRET, 1).unwrap()
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn full_month_through_the_api() {
    let t = test_app().await;
    let admin = token(UserRole::Admin, None);
    let id = t.employee.id;

    for (kind, amount, day) in [("BONUS", "100.00", "05"), ("DEDUCTION", "30.00", "12")] {
        let (status, body) = send(
            &t.router,
            "POST",
            "/api/v1/payroll/adjustments",
            Some(&admin),
            Some(json!({
                "employeeId": id,
                "type": kind,
                "amount": amount,
                "date": format!("2025-01-{day}"),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["type"], kind);
        assert_eq!(body["status"], "PENDING");
        assert!(body.get("transaction").is_none());
    }

    let (status, body) = send(
        &t.router,
        "POST",
        "/api/v1/payroll/adjustments",
        Some(&admin),
        Some(json!({
            "employeeId": id,
            "type": "ADVANCE",
            "amount": "20.00",
            "date": "2025-01-20",
            "description": "bus fare",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["amount"], "20.00");
    assert_eq!(body["transaction"]["type"], "EXPENSE");
    assert_eq!(body["transaction"]["paymentMethod"], "CASH");
    assert_eq!(body["transaction"]["category"], "employee salaries");

    let (status, body) = send(
        &t.router,
        "GET",
        &format!("/api/v1/payroll/employee/{id}/salary-details?month=2025-01"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["employee"]["id"], id.to_string());
    assert_eq!(body["salaryMonth"], "2025-01");
    assert_eq!(body["baseSalary"], "500.00");
    assert_eq!(body["allowance"], "50.00");
    assert_eq!(body["grossSalary"], "550.00");
    assert_eq!(body["pendingAdjustments"].as_array().unwrap().len(), 3);
    assert_eq!(body["summary"]["totalBonuses"], "100.00");
    assert_eq!(body["summary"]["totalDeductions"], "30.00");
    assert_eq!(body["summary"]["totalAdvances"], "20.00");
    assert_eq!(body["summary"]["netSalary"], "600.00");
    assert_eq!(body["alreadyPaid"], false);
    assert!(body.get("salaryPayment").is_none());

    let pay = json!({
        "employeeId": id,
        "salaryMonth": "2025-01",
        "paymentDate": "2025-02-01",
        "paymentMethod": "BANK_TRANSFER",
        "notes": "January payroll",
    });
    let (status, body) = send(
        &t.router,
        "POST",
        "/api/v1/payroll/pay-salary",
        Some(&admin),
        Some(pay.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["netSalary"], "600.00");
    assert_eq!(body["salaryMonth"], "2025-01");
    assert_eq!(body["paymentDate"], "2025-02-01");

    let (status, body) = send(
        &t.router,
        "POST",
        "/api/v1/payroll/pay-salary",
        Some(&admin),
        Some(pay),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"]["kind"], "ALREADY_PAID");

    let (status, body) = send(
        &t.router,
        "POST",
        "/api/v1/payroll/adjustments",
        Some(&admin),
        Some(json!({
            "employeeId": id,
            "type": "ADVANCE",
            "amount": "200.00",
            "date": "2025-01-15",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"]["kind"], "ALREADY_PAID");

    let (status, body) = send(
        &t.router,
        "GET",
        &format!("/api/v1/payroll/employee/{id}/salary-details?month=2025-01"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alreadyPaid"], true);
    assert_eq!(body["salaryPayment"]["netSalary"], "600.00");

    let (status, body) = send(
        &t.router,
        "GET",
        &format!("/api/v1/payroll/employee/{id}/salary-payments"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &t.router,
        "GET",
        &format!("/api/v1/payroll/employee/{id}/adjustments?status=PROCESSED"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    assert_eq!(t.store.transactions().await.len(), 2);
}

#[tokio::test]
async fn requests_without_a_valid_token_are_unauthorized() {
    let t = test_app().await;
    let uri = format!(
        "/api/v1/payroll/employee/{}/salary-details?month=2025-01",
        t.employee.id
    );

    let (status, _) = send(&t.router, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&t.router, "GET", &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "INVALID_TOKEN");

    let forged = generate_token(Uuid::new_v4(), UserRole::Admin, None, "other-secret", 1).unwrap();
    let (status, _) = send(&t.router, "GET", &uri, Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unscoped_accountant = token(UserRole::Accountant, None);
    let (status, _) = send(&t.router, "GET", &uri, Some(&unscoped_accountant), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn accountant_of_another_branch_is_forbidden() {
    let t = test_app().await;
    let outsider = token(UserRole::Accountant, Some(Uuid::new_v4()));
    let insider = token(UserRole::Accountant, Some(t.employee.branch_id));
    let uri = format!(
        "/api/v1/payroll/employee/{}/salary-details?month=2025-01",
        t.employee.id
    );

    let (status, body) = send(&t.router, "GET", &uri, Some(&outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "FORBIDDEN");

    let (status, body) = send(
        &t.router,
        "POST",
        "/api/v1/payroll/adjustments",
        Some(&outsider),
        Some(json!({
            "employeeId": t.employee.id,
            "type": "BONUS",
            "amount": "10.00",
            "date": "2025-01-05",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, _) = send(&t.router, "GET", &uri, Some(&insider), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_employee_is_not_found() {
    let t = test_app().await;
    let admin = token(UserRole::Manager, None);

    let (status, body) = send(
        &t.router,
        "GET",
        &format!(
            "/api/v1/payroll/employee/{}/salary-details?month=2025-01",
            Uuid::new_v4()
        ),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_input_is_a_validation_error() {
    let t = test_app().await;
    let admin = token(UserRole::Admin, None);
    let id = t.employee.id;

    let bad_bodies = [
        json!({ "employeeId": id, "type": "TIP", "amount": "10.00", "date": "2025-01-05" }),
        json!({ "employeeId": id, "type": "BONUS", "amount": "0", "date": "2025-01-05" }),
        json!({ "employeeId": id, "type": "BONUS", "amount": "abc", "date": "2025-01-05" }),
        json!({ "employeeId": id, "type": "BONUS", "amount": "10.00", "date": "2025-13-05" }),
        json!({ "type": "BONUS", "amount": "10.00", "date": "2025-01-05" }),
    ];
    for body in bad_bodies {
        let (status, response) = send(
            &t.router,
            "POST",
            "/api/v1/payroll/adjustments",
            Some(&admin),
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {response}");
        assert_eq!(response["error"]["kind"], "VALIDATION");
    }

    let (status, body) = send(
        &t.router,
        "GET",
        &format!("/api/v1/payroll/employee/{id}/salary-details?month=2025-1"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "VALIDATION");

    let (status, _) = send(
        &t.router,
        "GET",
        &format!("/api/v1/payroll/employee/{id}/salary-details"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &t.router,
        "POST",
        "/api/v1/payroll/pay-salary",
        Some(&admin),
        Some(json!({
            "employeeId": id,
            "salaryMonth": "2025-01",
            "paymentDate": "2025-02-01",
            "paymentMethod": "CARD",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "VALIDATION");

    assert!(t.store.adjustments().await.is_empty());
    assert!(t.store.salary_payments().await.is_empty());
}

#[tokio::test]
async fn health_reports_the_store() {
    let t = test_app().await;
    let (status, body) = send(&t.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
