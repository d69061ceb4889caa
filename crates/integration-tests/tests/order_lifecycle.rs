//! Live order lifecycle tests spanning both servers.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`snl migrate`, `snl seed settings`)
//! - The storefront and admin servers running with the same
//!   `TELEGRAM_BOT_TOKEN`
//! - `TEST_ADMIN_TELEGRAM_ID` of a user added with `snl staff add -r admin`
//!
//! Run with: cargo test -p snacklane-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use snacklane_integration_tests::{
    admin_base_url, auth_header, bot_token, random_telegram_id, storefront_base_url,
};

/// Both APIs, signed in as the test admin and one fresh client.
struct Shop {
    http: Client,
    storefront: String,
    admin: String,
    admin_auth: String,
    client_auth: String,
}

impl Shop {
    fn new() -> Self {
        let admin_id = std::env::var("TEST_ADMIN_TELEGRAM_ID")
            .expect("TEST_ADMIN_TELEGRAM_ID not set")
            .parse()
            .expect("TEST_ADMIN_TELEGRAM_ID must be a number");
        let token = bot_token();
        Self {
            http: Client::new(),
            storefront: storefront_base_url(),
            admin: admin_base_url(),
            admin_auth: auth_header(admin_id, "test_admin", &token),
            client_auth: auth_header(random_telegram_id(), "lifecycle_shop", &token),
        }
    }

    async fn admin_send(&self, request: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let resp = request
            .header("Authorization", &self.admin_auth)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn client_send(&self, request: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let resp = request
            .header("Authorization", &self.client_auth)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Register the client and return its id, still pending.
    ///
    /// Waits out the registration rate limit when tests run in parallel.
    async fn register(&self) -> i64 {
        loop {
            let (status, body) = self
                .client_send(
                    self.http
                        .post(format!("{}/api/auth/register", self.storefront))
                        .json(&json!({
                            "company_name": "ТОО Жизненный цикл",
                            "address": "Алматы, ул. Тестовая 5",
                            "phone": "+77015550000",
                        })),
                )
                .await;
            if status == StatusCode::TOO_MANY_REQUESTS {
                tokio::time::sleep(std::time::Duration::from_secs(6)).await;
                continue;
            }
            assert_eq!(status, StatusCode::CREATED, "register: {body}");
            return body["client"]["id"].as_i64().unwrap();
        }
    }

    async fn approve(&self, client_id: i64) -> Value {
        let (status, body) = self
            .admin_send(
                self.http
                    .post(format!("{}/api/admin/clients/{client_id}/approve", self.admin)),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "approve: {body}");
        body
    }

    async fn client_row(&self, client_id: i64) -> Value {
        let (status, body) = self
            .admin_send(
                self.http
                    .get(format!("{}/api/admin/clients/{client_id}", self.admin)),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    /// A fresh category with one product priced at 1 000 ₸.
    async fn product(&self, stock: i32) -> i64 {
        let name = format!("Тест {}", random_telegram_id());
        let (status, category) = self
            .admin_send(
                self.http
                    .post(format!("{}/api/admin/categories", self.admin))
                    .json(&json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "category: {category}");

        let (status, product) = self
            .admin_send(
                self.http
                    .post(format!("{}/api/admin/products", self.admin))
                    .json(&json!({
                        "name": format!("{name} чипсы"),
                        "category_id": category["id"],
                        "price": 1000,
                        "stock": stock,
                    })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "product: {product}");
        product["id"].as_i64().unwrap()
    }

    async fn stock(&self, product_id: i64) -> i64 {
        let (_, product) = self
            .admin_send(
                self.http
                    .get(format!("{}/api/admin/products/{product_id}", self.admin)),
            )
            .await;
        product["stock"].as_i64().unwrap()
    }

    async fn place(&self, body: Value) -> (StatusCode, Value) {
        self.client_send(
            self.http
                .post(format!("{}/api/orders", self.storefront))
                .json(&body),
        )
        .await
    }

    async fn set_status(&self, order_id: i64, status: &str) -> (StatusCode, Value) {
        self.admin_send(
            self.http
                .put(format!("{}/api/admin/orders/{order_id}/status", self.admin))
                .json(&json!({ "status": status })),
        )
        .await
    }

    async fn bonus_history(&self) -> Value {
        let (status, body) = self
            .client_send(self.http.get(format!("{}/api/bonuses", self.storefront)))
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

fn amount(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and an admin user"]
async fn test_cancellation_restores_stock_bonus_and_debt() {
    let shop = Shop::new();
    let product_id = shop.product(100).await;
    let client_id = shop.register().await;
    shop.approve(client_id).await;

    let before = shop.client_row(client_id).await;
    let balance_before = amount(&before["bonus_balance"]);
    let debt_before = amount(&before["debt"]);
    assert!(balance_before >= Decimal::from(1000));

    let (status, order) = shop
        .place(json!({
            "items": [{ "product_id": product_id, "quantity": 20 }],
            "bonus_to_use": 1000,
        }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "order: {order}");
    let order_id = order["id"].as_i64().unwrap();
    assert_eq!(amount(&order["bonus_used"]), Decimal::from(1000));

    assert_eq!(shop.stock(product_id).await, 80);
    let placed = shop.client_row(client_id).await;
    assert_eq!(
        amount(&placed["bonus_balance"]),
        balance_before - Decimal::from(1000)
    );
    assert_eq!(
        amount(&placed["debt"]),
        debt_before + amount(&order["final_total"])
    );

    let (status, cancelled) = shop.set_status(order_id, "cancelled").await;
    assert_eq!(status, StatusCode::OK, "cancel: {cancelled}");
    assert_eq!(cancelled["status"], json!("cancelled"));

    assert_eq!(shop.stock(product_id).await, 100);
    let after = shop.client_row(client_id).await;
    assert_eq!(amount(&after["bonus_balance"]), balance_before);
    assert_eq!(amount(&after["debt"]), debt_before);

    let history = shop.bonus_history().await;
    let refund = history["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["kind"] == json!("refund") && t["order_id"] == json!(order_id))
        .expect("refund entry for the cancelled order");
    assert_eq!(amount(&refund["amount"]), Decimal::from(1000));

    // A cancelled order stays cancelled
    let (status, _) = shop.set_status(order_id, "cancelled").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and an admin user"]
async fn test_debt_floors_at_zero_after_payment_and_cancel() {
    let shop = Shop::new();
    let product_id = shop.product(50).await;
    let client_id = shop.register().await;
    shop.approve(client_id).await;

    let (status, order) = shop
        .place(json!({ "items": [{ "product_id": product_id, "quantity": 15 }] }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "order: {order}");

    let (status, paid) = shop
        .admin_send(
            shop.http
                .post(format!("{}/api/admin/clients/{client_id}/payments", shop.admin))
                .json(&json!({ "amount": amount(&order["final_total"]).to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "payment: {paid}");
    assert_eq!(amount(&paid["debt"]), Decimal::ZERO);

    let (status, _) = shop
        .set_status(order["id"].as_i64().unwrap(), "cancelled")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        amount(&shop.client_row(client_id).await["debt"]),
        Decimal::ZERO
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and an admin user"]
async fn test_delivery_credits_expiring_bonus() {
    let shop = Shop::new();
    let product_id = shop.product(100).await;
    let client_id = shop.register().await;
    shop.approve(client_id).await;
    let balance_before = amount(&shop.client_row(client_id).await["bonus_balance"]);

    let (status, order) = shop
        .place(json!({ "items": [{ "product_id": product_id, "quantity": 20 }] }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "order: {order}");
    let order_id = order["id"].as_i64().unwrap();

    let (status, delivered) = shop.set_status(order_id, "delivered").await;
    assert_eq!(status, StatusCode::OK, "deliver: {delivered}");
    assert!(!delivered["delivered_at"].is_null());

    let history = shop.bonus_history().await;
    let earned = history["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["kind"] == json!("earn") && t["order_id"] == json!(order_id))
        .expect("earn entry for the delivered order");
    assert!(amount(&earned["amount"]) > Decimal::ZERO);
    assert!(!earned["expires_at"].is_null());

    assert_eq!(
        amount(&shop.client_row(client_id).await["bonus_balance"]),
        balance_before + amount(&earned["amount"])
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and an admin user"]
async fn test_cart_order_skips_deactivated_products() {
    let shop = Shop::new();
    let kept = shop.product(100).await;
    let dropped = shop.product(100).await;
    let client_id = shop.register().await;
    shop.approve(client_id).await;

    for product_id in [kept, dropped] {
        let (status, body) = shop
            .client_send(
                shop.http
                    .post(format!("{}/api/cart", shop.storefront))
                    .json(&json!({ "product_id": product_id, "quantity": 20 })),
            )
            .await;
        assert!(status.is_success(), "cart add: {body}");
    }

    let resp = shop
        .http
        .delete(format!("{}/api/admin/products/{dropped}", shop.admin))
        .header("Authorization", &shop.admin_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, order) = shop.place(json!({})).await;
    assert_eq!(status, StatusCode::CREATED, "order from cart: {order}");
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"], json!(kept));
    assert_eq!(shop.stock(dropped).await, 100);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and an admin user"]
async fn test_unblocking_unapproved_client_keeps_it_pending() {
    let shop = Shop::new();
    let client_id = shop.register().await;

    let (status, blocked) = shop
        .admin_send(
            shop.http
                .post(format!("{}/api/admin/clients/{client_id}/block", shop.admin)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blocked["status"], json!("blocked"));

    let (status, unblocked) = shop
        .admin_send(
            shop.http
                .post(format!("{}/api/admin/clients/{client_id}/unblock", shop.admin)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unblocked["status"], json!("pending"));
    assert!(unblocked["approved_at"].is_null());

    let approved = shop.approve(client_id).await;
    assert_eq!(approved["status"], json!("active"));
    assert!(!approved["approved_at"].is_null());
    assert!(amount(&approved["bonus_balance"]) > Decimal::ZERO);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and an admin user"]
async fn test_cancel_races_new_order_without_server_error() {
    let shop = Shop::new();
    let product_id = shop.product(1000).await;
    let client_id = shop.register().await;
    shop.approve(client_id).await;

    let line = json!({ "items": [{ "product_id": product_id, "quantity": 15 }] });
    let (status, first) = shop.place(line.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "order: {first}");
    let mut open_order = first["id"].as_i64().unwrap();

    for _ in 0..5 {
        let ((placed_status, placed), (cancel_status, cancelled)) = tokio::join!(
            shop.place(line.clone()),
            shop.set_status(open_order, "cancelled"),
        );
        assert_eq!(placed_status, StatusCode::CREATED, "order: {placed}");
        assert_eq!(cancel_status, StatusCode::OK, "cancel: {cancelled}");
        open_order = placed["id"].as_i64().unwrap();
    }

    let (status, _) = shop.set_status(open_order, "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shop.stock(product_id).await, 1000);
    assert_eq!(
        amount(&shop.client_row(client_id).await["debt"]),
        Decimal::ZERO
    );
}
