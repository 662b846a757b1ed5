use crate::config::runtime::{CheckoutConfig, ServerConfig, SharedConfig, StripeConfig};
use crate::server::build_router;
use crate::state::AppState;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use mercato_core::entities::products::ProductSnapshot;
use mercato_core::notify::{Notifier, NotifyError, OrderConfirmation};
use mercato_core::providers::{ProviderError, SessionSource};
use mercato_core::store::{MemoryOrderStore, MemoryProductStore, OrderStore};
use mercato_sdk::objects::CheckoutSession;
use mercato_sdk::signature::{SIGNATURE_HEADER, sign_payload};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tower::ServiceExt;

const SECRET: &[u8] = b"whsec_test_secret";
const IDENTITY_HEADER: &str = "x-authenticated-user";
const ITEMS: &str = r#"[{"productId":"p1","quantity":2},{"productId":"p2","quantity":1}]"#;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<OrderConfirmation>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn order_confirmed(&self, c: OrderConfirmation) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(c);
        Ok(())
    }
}

/// Provider stand-in serving a fixed set of sessions.
#[derive(Default)]
struct FakeSessions {
    sessions: HashMap<String, CheckoutSession>,
    unavailable: bool,
}

#[async_trait]
impl SessionSource for FakeSessions {
    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSession>, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(self.sessions.get(session_id).cloned())
    }
}

struct Harness {
    router: Router,
    orders: Arc<MemoryOrderStore>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(orders: MemoryOrderStore, sessions: Option<FakeSessions>) -> Harness {
    let orders = Arc::new(orders);
    let products = Arc::new(MemoryProductStore::with_products([
        ProductSnapshot {
            product_id: "p1".to_string(),
            name: "Mug".to_string(),
            price: Decimal::new(1200, 2),
            image: None,
        },
        ProductSnapshot {
            product_id: "p2".to_string(),
            name: "Poster".to_string(),
            price: Decimal::new(2550, 2),
            image: None,
        },
    ]));
    let notifier = Arc::new(RecordingNotifier::default());
    let config = SharedConfig {
        server: Arc::new(RwLock::new(ServerConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
            identity_header: IDENTITY_HEADER.to_string(),
        })),
        stripe: Arc::new(RwLock::new(StripeConfig {
            webhook_secret: SECRET.into(),
            secret_key: None,
            api_base: url::Url::parse("http://localhost:12111").unwrap(),
            tolerance_secs: 300,
        })),
        checkout: Arc::new(RwLock::new(CheckoutConfig {
            wait_timeout: Duration::from_millis(300),
            poll_interval: Duration::from_millis(20),
        })),
    };
    let sessions = sessions.map(|s| Arc::new(s) as Arc<dyn SessionSource>);
    let state = AppState::new(
        orders.clone(),
        products,
        notifier.clone(),
        sessions,
        config,
    );
    Harness {
        router: build_router(state),
        orders,
        notifier,
    }
}

fn session_json(id: &str, payment_status: &str, items: &str) -> Value {
    json!({
        "id": id,
        "object": "checkout.session",
        "payment_status": payment_status,
        "metadata": {"items": items, "userId": "user_1"},
        "customer_details": {"email": "ada@example.com", "name": "Ada"},
        "amount_total": 4950,
        "currency": "usd"
    })
}

fn checkout_session(id: &str, payment_status: &str) -> CheckoutSession {
    serde_json::from_value(session_json(id, payment_status, ITEMS)).unwrap()
}

fn event_body(event_type: &str, session: Value) -> String {
    json!({
        "id": "evt_1",
        "object": "event",
        "type": event_type,
        "created": 1_700_000_000,
        "data": {"object": session}
    })
    .to_string()
}

fn webhook_request(body: String) -> Request<Body> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let header = sign_payload(body.as_bytes(), SECRET, now);
    Request::post("/webhooks/stripe")
        .header(SIGNATURE_HEADER, header)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn success_request(session_id: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(format!("/checkout/success?session_id={session_id}"));
    if let Some(user) = user {
        builder = builder.header(IDENTITY_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let h = harness(MemoryOrderStore::new(), None);
    let (status, body) = send(
        &h.router,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_webhook_creates_order_once() {
    let h = harness(MemoryOrderStore::new(), None);
    let body = event_body(
        "checkout.session.completed",
        session_json("cs_1", "paid", ITEMS),
    );

    let (status, first) = send(&h.router, webhook_request(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["received"], true);
    assert_eq!(first["created"], true);

    // Provider retries deliver the same event again.
    let (status, second) = send(&h.router, webhook_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(second["order_id"], first["order_id"]);

    let order = h.orders.find_by_session_id("cs_1").await.unwrap().unwrap();
    assert_eq!(order.total_amount, Decimal::new(4950, 2));
    assert_eq!(order.user_id.as_deref(), Some("user_1"));
    assert_eq!(h.orders.len().await, 1);
    assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_async_success_creates_order() {
    let h = harness(MemoryOrderStore::new(), None);
    let (status, _) = send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.completed",
            session_json("cs_async", "unpaid", ITEMS),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.orders.is_empty().await);

    let (status, body) = send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.async_payment_succeeded",
            session_json("cs_async", "paid", ITEMS),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);
    assert_eq!(h.orders.count_for_session("cs_async").await, 1);
}

#[tokio::test]
async fn test_webhook_ignores_other_events() {
    let h = harness(MemoryOrderStore::new(), None);
    for event_type in [
        "checkout.session.expired",
        "checkout.session.async_payment_failed",
        "invoice.paid",
    ] {
        let (status, body) = send(
            &h.router,
            webhook_request(event_body(event_type, session_json("cs_x", "unpaid", ITEMS))),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{event_type}");
        assert_eq!(body, json!({"received": true}));
    }
    assert!(h.orders.is_empty().await);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signatures() {
    let h = harness(MemoryOrderStore::new(), None);
    let body = event_body(
        "checkout.session.completed",
        session_json("cs_1", "paid", ITEMS),
    );

    let missing = Request::post("/webhooks/stripe")
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(&h.router, missing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let forged = Request::post("/webhooks/stripe")
        .header(
            SIGNATURE_HEADER,
            sign_payload(body.as_bytes(), b"wrong_secret", now),
        )
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(&h.router, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stale = Request::post("/webhooks/stripe")
        .header(
            SIGNATURE_HEADER,
            sign_payload(body.as_bytes(), SECRET, now - 3600),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&h.router, stale).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(h.orders.is_empty().await);
}

#[tokio::test]
async fn test_webhook_invalid_session_data_is_bad_request() {
    let h = harness(MemoryOrderStore::new(), None);
    let (status, _) = send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.completed",
            session_json("cs_bad", "paid", "not json"),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.completed",
            json!({"unexpected": true}),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.orders.is_empty().await);
}

#[tokio::test]
async fn test_success_requires_caller() {
    let h = harness(MemoryOrderStore::new(), None);
    let (status, _) = send(&h.router, success_request("cs_1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_success_returns_existing_order() {
    let h = harness(MemoryOrderStore::new(), None);
    send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.completed",
            session_json("cs_1", "paid", ITEMS),
        )),
    )
    .await;

    let (status, body) = send(&h.router, success_request("cs_1", Some("user_1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["created"], false);
    assert_eq!(body["order"]["payment_session_id"], "cs_1");
    assert_eq!(body["order"]["status"], "processing");
    assert_eq!(body["order"]["payment_status"], "paid");
}

#[tokio::test]
async fn test_success_rejects_other_users_order() {
    let h = harness(MemoryOrderStore::new(), None);
    send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.completed",
            session_json("cs_1", "paid", ITEMS),
        )),
    )
    .await;

    let (status, _) = send(&h.router, success_request("cs_1", Some("intruder"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_success_creates_order_from_paid_provider_session() {
    let sessions = FakeSessions {
        sessions: HashMap::from([("cs_1".to_string(), checkout_session("cs_1", "paid"))]),
        unavailable: false,
    };
    let h = harness(MemoryOrderStore::new(), Some(sessions));

    let (status, body) = send(&h.router, success_request("cs_1", Some("user_1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["created"], true);
    assert_eq!(body["order"]["total_amount"], "49.50");
    assert_eq!(h.orders.count_for_session("cs_1").await, 1);
}

#[tokio::test]
async fn test_success_unknown_provider_session_is_not_found() {
    let h = harness(MemoryOrderStore::new(), Some(FakeSessions::default()));
    let (status, _) = send(&h.router, success_request("cs_nope", Some("user_1"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_success_unpaid_session_waits_then_reports_processing() {
    let sessions = FakeSessions {
        sessions: HashMap::from([("cs_1".to_string(), checkout_session("cs_1", "unpaid"))]),
        unavailable: false,
    };
    let h = harness(MemoryOrderStore::new(), Some(sessions));

    let started = std::time::Instant::now();
    let (status, body) = send(&h.router, success_request("cs_1", Some("user_1"))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "processing");
    assert!(body["order"].is_null());
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(h.orders.is_empty().await);
}

#[tokio::test]
async fn test_success_provider_outage_falls_back_to_waiting() {
    let sessions = FakeSessions {
        sessions: HashMap::new(),
        unavailable: true,
    };
    let h = harness(MemoryOrderStore::new(), Some(sessions));
    let (status, body) = send(&h.router, success_request("cs_1", Some("user_1"))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "processing");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_success_picks_up_webhook_order_while_waiting() {
    let h = harness(MemoryOrderStore::new(), None);

    let waiting = {
        let router = h.router.clone();
        tokio::spawn(async move { send(&router, success_request("cs_1", Some("user_1"))).await })
    };
    tokio::time::sleep(Duration::from_millis(60)).await;
    let (status, ack) = send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.completed",
            session_json("cs_1", "paid", ITEMS),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = waiting.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["created"], false);
    assert_eq!(body["order"]["order_id"], ack["order_id"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_webhook_and_success_race_on_one_session() {
    let sessions = FakeSessions {
        sessions: HashMap::from([(
            "sess_123".to_string(),
            checkout_session("sess_123", "paid"),
        )]),
        unavailable: false,
    };
    let h = harness(
        MemoryOrderStore::new().with_insert_delay(Duration::from_millis(15)),
        Some(sessions),
    );

    let webhook = {
        let router = h.router.clone();
        tokio::spawn(async move {
            send(
                &router,
                webhook_request(event_body(
                    "checkout.session.completed",
                    session_json("sess_123", "paid", ITEMS),
                )),
            )
            .await
        })
    };
    tokio::time::sleep(Duration::from_millis(2)).await;
    let success = {
        let router = h.router.clone();
        tokio::spawn(async move { send(&router, success_request("sess_123", Some("user_1"))).await })
    };

    let (webhook_status, ack) = webhook.await.unwrap();
    let (success_status, confirmation) = success.await.unwrap();

    assert_eq!(webhook_status, StatusCode::OK);
    assert_eq!(success_status, StatusCode::OK);
    assert_eq!(confirmation["order"]["order_id"], ack["order_id"]);
    assert_ne!(ack["created"], confirmation["created"]);
    assert_eq!(confirmation["order"]["total_amount"], "49.50");
    assert_eq!(h.orders.count_for_session("sess_123").await, 1);
    assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_by_session_lookup() {
    let h = harness(MemoryOrderStore::new(), None);
    let lookup = |user: &str| {
        Request::get("/orders/session/cs_1")
            .header(IDENTITY_HEADER, user)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&h.router, lookup("user_1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &h.router,
        webhook_request(event_body(
            "checkout.session.completed",
            session_json("cs_1", "paid", ITEMS),
        )),
    )
    .await;

    let (status, body) = send(&h.router, lookup("user_1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_session_id"], "cs_1");
    assert_eq!(body["line_items"].as_array().unwrap().len(), 2);

    let (status, _) = send(&h.router, lookup("user_2")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
