//! End-to-end flows against a real PostgreSQL database.
//! Skipped unless `TEST_DATABASE_URL` is set; every test uses fresh, unique accounts.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use crowdfund::error::PaymentError;
use crowdfund::migration::DEFAULT_CATEGORIES;
use crowdfund::payment::{ChargeReceipt, ChargeRequest, PaymentGateway, SimulatedPaymentGateway};
use crowdfund::repository::{CampaignRepository, CategoryRepository, UserRepository};
use crowdfund::{apply_migrations, build_router, AppState, Settings};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct Harness {
    app: Router,
    pool: PgPool,
}

async fn harness() -> Option<Harness> {
    harness_with(Arc::new(SimulatedPaymentGateway)).await
}

async fn harness_with(gateway: Arc<dyn PaymentGateway>) -> Option<Harness> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return None;
        }
    };
    let settings = Settings::from_lookup(|k| match k {
        "DATABASE_URL" => Some(url.clone()),
        "JWT_SECRET" => Some("flow-tests-secret-0123456789".into()),
        _ => None,
    })
    .unwrap();
    let pool = crowdfund::store::connect(&settings).await.unwrap();
    apply_migrations(&pool).await.unwrap();
    CategoryRepository::new(&pool).seed_defaults(DEFAULT_CATEGORIES).await.unwrap();
    let state = AppState::new(pool.clone(), settings, gateway);
    Some(Harness {
        app: build_router(state).unwrap(),
        pool,
    })
}

impl Harness {
    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let req = build_request(method, uri, token, body);
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Register a fresh account and return (user id, token).
    async fn register(&self, name: &str) -> (String, String) {
        let email = format!("{}-{}@example.com", name, Uuid::new_v4().simple());
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"email": email, "password": "a long password", "displayName": name})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(&self) -> String {
        let email = format!("admin-{}@example.com", Uuid::new_v4().simple());
        let hash = crowdfund::auth::hash_password_blocking("admin password".into()).await.unwrap();
        assert!(UserRepository::new(&self.pool).ensure_admin(&email, &hash).await.unwrap());
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": "admin password"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn first_category(&self) -> i64 {
        let (status, body) = self.call(Method::GET, "/api/categories", None, None).await;
        assert_eq!(status, StatusCode::OK);
        body["data"][0]["id"].as_i64().unwrap()
    }

    async fn create_campaign(&self, token: &str, title: &str, goal: &str) -> String {
        let category = self.first_category().await;
        self.create_campaign_in(token, title, goal, category).await
    }

    async fn create_campaign_in(&self, token: &str, title: &str, goal: &str, category: i64) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/campaigns",
                Some(token),
                Some(json!({
                    "title": title,
                    "description": "Funding a small but useful project",
                    "goalAmount": goal,
                    "categoryId": category,
                    "endsAt": "2099-12-31T00:00:00Z"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn amount_raised(&self, campaign_id: &str) -> f64 {
        let (status, body) = self
            .call(Method::GET, &format!("/api/campaigns/{}", campaign_id), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["amountRaised"].as_str().unwrap().parse().unwrap()
    }
}

fn build_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send on a separate task so the caller can hold database locks meanwhile.
fn spawn_call(
    app: &Router,
    method: Method,
    uri: String,
    token: String,
    body: Option<Value>,
) -> tokio::task::JoinHandle<StatusCode> {
    let app = app.clone();
    tokio::spawn(async move {
        let req = build_request(method, &uri, Some(&token), body);
        app.oneshot(req).await.unwrap().status()
    })
}

/// Gateway that can never be reached.
struct UnreachableGateway;

#[async_trait]
impl PaymentGateway for UnreachableGateway {
    async fn charge(&self, _request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        Err(PaymentError::Unavailable(
            "error sending request for url (http://10.9.8.7:9000/charges)".into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unreachable"
    }
}

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect()
}

fn pledge_body(campaign_id: &str, amount: &str, token: &str) -> Value {
    json!({"campaignId": campaign_id, "amount": amount, "paymentToken": token})
}

#[tokio::test]
async fn pledge_charges_and_updates_totals() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let (backer_id, backer) = h.register("backer").await;
    let campaign = h.create_campaign(&owner, "Community solar lamps", "100.00").await;

    let (status, body) = h
        .call(Method::POST, "/api/pledges", Some(&backer), Some(pledge_body(&campaign, "25.50", "tok_visa")))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["pledge"]["backerId"], backer_id.as_str());
    assert_eq!(body["data"]["payment"]["status"], "succeeded");
    assert!(body["data"]["payment"]["gatewayReference"].as_str().unwrap().starts_with("sim_"));
    assert_eq!(h.amount_raised(&campaign).await, 25.5);

    let pledge_id = body["data"]["pledge"]["id"].as_str().unwrap().to_string();
    let (status, _) = h
        .call(Method::GET, &format!("/api/pledges/{}", pledge_id), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, stranger) = h.register("stranger").await;
    let (status, _) = h
        .call(Method::GET, &format!("/api/pledges/{}", pledge_id), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = h.call(Method::GET, "/api/users/me/pledges", Some(&backer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalCount"], 1);

    let uri = format!("/api/campaigns/{}/pledges", campaign);
    let (status, _) = h.call(Method::GET, &uri, Some(&backer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = h.call(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["backerName"], "backer");
}

#[tokio::test]
async fn declined_charge_leaves_nothing_behind() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let (_, backer) = h.register("backer").await;
    let campaign = h.create_campaign(&owner, "Neighbourhood tool library", "300.00").await;

    let (status, body) = h
        .call(
            Method::POST,
            "/api/pledges",
            Some(&backer),
            Some(pledge_body(&campaign, "40.00", "tok_decline_insufficient_funds")),
        )
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "payment_declined");
    assert_eq!(h.amount_raised(&campaign).await, 0.0);

    let (pledges,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pledges WHERE campaign_id = $1::uuid")
        .bind(&campaign)
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(pledges, 0);
}

#[tokio::test]
async fn pledge_rules() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let (_, backer) = h.register("backer").await;
    let campaign = h.create_campaign(&owner, "Retro arcade restoration", "1000.00").await;

    let (status, _) = h
        .call(Method::POST, "/api/pledges", Some(&owner), Some(pledge_body(&campaign, "10", "tok_visa")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = Uuid::new_v4().to_string();
    let (status, _) = h
        .call(Method::POST, "/api/pledges", Some(&backer), Some(pledge_body(&missing, "10", "tok_visa")))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    sqlx::query("UPDATE campaigns SET ends_at = NOW() - INTERVAL '1 day' WHERE id = $1::uuid")
        .bind(&campaign)
        .execute(&h.pool)
        .await
        .unwrap();
    let (status, _) = h
        .call(Method::POST, "/api/pledges", Some(&backer), Some(pledge_body(&campaign, "10", "tok_visa")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert!(CampaignRepository::new(&h.pool).close_expired().await.unwrap() >= 1);
    let (_, body) = h.call(Method::GET, &format!("/api/campaigns/{}", campaign), None, None).await;
    assert_eq!(body["data"]["status"], "closed");
}

#[tokio::test]
async fn reviews_search_and_ownership() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let (_, backer) = h.register("backer").await;
    let marker = format!("Zephyr{}", Uuid::new_v4().simple());
    let campaign = h.create_campaign(&owner, &format!("{} kite festival", marker), "250.00").await;

    let reviews_uri = format!("/api/campaigns/{}/reviews", campaign);
    let review = json!({"rating": 5, "comment": "Lovely idea"});
    let (status, _) = h.call(Method::POST, &reviews_uri, Some(&owner), Some(review.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = h.call(Method::POST, &reviews_uri, Some(&backer), Some(review.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let review_id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = h.call(Method::POST, &reviews_uri, Some(&backer), Some(review)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h
        .call(Method::PUT, &format!("/api/reviews/{}", review_id), Some(&owner), Some(json!({"rating": 1})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = h
        .call(Method::PUT, &format!("/api/reviews/{}", review_id), Some(&backer), Some(json!({"rating": 4})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], 4);

    let (_, body) = h.call(Method::GET, &format!("/api/campaigns/{}", campaign), None, None).await;
    assert_eq!(body["data"]["reviewCount"], 1);

    let (status, body) = h
        .call(Method::GET, &format!("/api/search?q={}", marker.to_lowercase()), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["campaigns"][0]["id"], campaign.as_str());
    assert_eq!(body["meta"]["totalCount"], 1);

    let (status, _) = h
        .call(Method::PUT, &format!("/api/campaigns/{}", campaign), Some(&backer), Some(json!({"title": "Hijacked"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_cannot_delete_funded_campaign_but_admin_can() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let (_, backer) = h.register("backer").await;
    let campaign = h.create_campaign(&owner, "Open-source telescope", "500.00").await;
    let (status, _) = h
        .call(Method::POST, "/api/pledges", Some(&backer), Some(pledge_body(&campaign, "60", "tok_visa")))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/campaigns/{}", campaign);
    let (status, _) = h.call(Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let admin = h.admin_token().await;
    let (status, body) = h.call(Method::GET, "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["totalPledges"].as_i64().unwrap() >= 1);
    assert!(body["data"]["topCampaigns"].as_array().unwrap().len() <= 5);

    let (status, _) = h.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_email_and_bad_login() {
    let Some(h) = harness().await else { return };
    let email = format!("dup-{}@example.com", Uuid::new_v4().simple());
    let body = json!({"email": email, "password": "a long password", "displayName": "Dup"});
    let (status, _) = h.call(Method::POST, "/api/auth/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let upper = json!({"email": email.to_uppercase(), "password": "a long password", "displayName": "Dup"});
    let (status, _) = h.call(Method::POST, "/api/auth/register", None, Some(upper)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h
        .call(Method::POST, "/api/auth/login", None, Some(json!({"email": email, "password": "wrong password"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn numeric_amounts_are_accepted_end_to_end() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let (_, backer) = h.register("backer").await;
    let campaign = h.create_campaign(&owner, "Library reading nook", "80.00").await;

    let (status, body) = h
        .call(
            Method::POST,
            "/api/pledges",
            Some(&backer),
            Some(json!({"campaignId": campaign, "amount": 12.34, "paymentToken": "tok_visa"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["pledge"]["amount"], "12.34");
    assert_eq!(h.amount_raised(&campaign).await, 12.34);

    let (status, body) = h
        .call(Method::PUT, &format!("/api/campaigns/{}", campaign), Some(&owner), Some(json!({"goalAmount": 10.5})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    let (status, body) = h
        .call(Method::PUT, &format!("/api/campaigns/{}", campaign), Some(&owner), Some(json!({"goalAmount": 99.99})))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["goalAmount"], "99.99");
}

#[tokio::test]
async fn unreachable_gateway_is_502_and_rolls_back() {
    let Some(h) = harness_with(Arc::new(UnreachableGateway)).await else { return };
    let (_, owner) = h.register("owner").await;
    let (_, backer) = h.register("backer").await;
    let campaign = h.create_campaign(&owner, "Seed bank for the allotment", "120.00").await;

    let (status, body) = h
        .call(Method::POST, "/api/pledges", Some(&backer), Some(pledge_body(&campaign, "30.00", "tok_visa")))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "payment_gateway_error");
    assert!(!body["error"]["message"].as_str().unwrap().contains("10.9.8.7"));
    assert_eq!(h.amount_raised(&campaign).await, 0.0);

    let (pledges,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pledges WHERE campaign_id = $1::uuid")
        .bind(&campaign)
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(pledges, 0);
}

#[tokio::test]
async fn campaign_listing_filters_sorts_and_pages() {
    let Some(h) = harness().await else { return };
    let admin = h.admin_token().await;
    let (status, body) = h
        .call(
            Method::POST,
            "/api/categories",
            Some(&admin),
            Some(json!({"name": format!("Listing {}", Uuid::new_v4().simple())})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let category = body["data"]["id"].as_i64().unwrap();

    let (_, owner) = h.register("owner").await;
    let (_, backer) = h.register("backer").await;
    let marker = format!("Quokka{}", Uuid::new_v4().simple());
    let small = h.create_campaign_in(&owner, &format!("{} small", marker), "100.00", category).await;
    let medium = h.create_campaign_in(&owner, &format!("{} medium", marker), "200.00", category).await;
    let large = h.create_campaign_in(&owner, &format!("{} large", marker), "400.00", category).await;
    // progress: small 50%, medium 75%, large 12.5%
    for (campaign, amount) in [(&small, "50"), (&medium, "150"), (&large, "50")] {
        let (status, body) = h
            .call(Method::POST, "/api/pledges", Some(&backer), Some(pledge_body(campaign, amount, "tok_visa")))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let base = format!("/api/campaigns?categoryId={}", category);

    let (status, body) = h.call(Method::GET, &format!("{}&pageSize=2&page=1", base), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 2);
    assert_eq!(body["meta"]["totalCount"], 3);
    assert_eq!(body["meta"]["totalPages"], 2);
    let first_page = ids(&body);
    let (_, body) = h.call(Method::GET, &format!("{}&pageSize=2&page=2", base), None, None).await;
    assert_eq!(body["meta"]["count"], 1);
    let second_page = ids(&body);
    assert!(!first_page.contains(&second_page[0]));
    let (_, body) = h.call(Method::GET, &format!("{}&pageSize=2&page=9", base), None, None).await;
    assert_eq!(body["meta"]["count"], 0);
    assert_eq!(body["meta"]["totalCount"], 3);

    let (_, body) = h.call(Method::GET, &format!("{}&pageSize=1000", base), None, None).await;
    assert_eq!(body["meta"]["pageSize"], 100);

    let (_, body) = h.call(Method::GET, &format!("{}&minGoal=150&maxGoal=300", base), None, None).await;
    assert_eq!(ids(&body), vec![medium.clone()]);

    let (_, body) = h
        .call(Method::GET, &format!("/api/campaigns?search={}%20LARGE", marker.to_lowercase()), None, None)
        .await;
    assert_eq!(ids(&body), vec![large.clone()]);

    let (_, body) = h.call(Method::GET, &format!("{}&sortBy=progress&sortOrder=desc", base), None, None).await;
    assert_eq!(ids(&body), vec![medium.clone(), small.clone(), large.clone()]);
    assert_eq!(body["data"][0]["progress"].as_str().unwrap().parse::<f64>().unwrap(), 75.0);

    let (_, body) = h.call(Method::GET, &format!("{}&sortBy=goalAmount&sortOrder=asc", base), None, None).await;
    assert_eq!(ids(&body), vec![small.clone(), medium.clone(), large.clone()]);

    let uri = format!("/api/categories/{}", category);
    let (status, body) = h.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    for campaign in [&small, &medium, &large] {
        let (status, _) = h
            .call(Method::DELETE, &format!("/api/campaigns/{}", campaign), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (status, _) = h.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn owner_delete_waits_for_a_pledge_in_flight() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let (backer_id, _) = h.register("backer").await;
    let campaign = h.create_campaign(&owner, "Bike repair co-op", "150.00").await;

    // An uncommitted pledge holds a key-share lock on the campaign row.
    let mut tx = h.pool.begin().await.unwrap();
    sqlx::query("INSERT INTO pledges (id, campaign_id, backer_id, amount) VALUES ($1, $2::uuid, $3::uuid, 10)")
        .bind(Uuid::new_v4())
        .bind(&campaign)
        .bind(&backer_id)
        .execute(&mut *tx)
        .await
        .unwrap();

    let delete = spawn_call(&h.app, Method::DELETE, format!("/api/campaigns/{}", campaign), owner.clone(), None);
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(!delete.is_finished());
    tx.commit().await.unwrap();

    assert_eq!(delete.await.unwrap(), StatusCode::CONFLICT);
    let (status, _) = h.call(Method::GET, &format!("/api/campaigns/{}", campaign), None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn goal_update_rechecks_amount_raised_under_the_row_lock() {
    let Some(h) = harness().await else { return };
    let (_, owner) = h.register("owner").await;
    let campaign = h.create_campaign(&owner, "Harbour clean-up boat", "1000.00").await;

    let mut tx = h.pool.begin().await.unwrap();
    sqlx::query("UPDATE campaigns SET amount_raised = 500 WHERE id = $1::uuid")
        .bind(&campaign)
        .execute(&mut *tx)
        .await
        .unwrap();

    let update = spawn_call(
        &h.app,
        Method::PUT,
        format!("/api/campaigns/{}", campaign),
        owner.clone(),
        Some(json!({"goalAmount": "100.00"})),
    );
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    tx.commit().await.unwrap();

    assert_eq!(update.await.unwrap(), StatusCode::UNPROCESSABLE_ENTITY);
    let (_, body) = h.call(Method::GET, &format!("/api/campaigns/{}", campaign), None, None).await;
    assert_eq!(body["data"]["goalAmount"], "1000.00");
}
