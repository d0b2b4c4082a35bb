// HTTP renderer and webhook transport against mock servers

use common::config::{NotificationServiceConfig, RenderConfig};
use common::errors::{NotifyError, RenderError};
use common::models::{EndpointSpec, JitterConfig, NotificationConfig};
use common::notifier::{MakerWebhookTransport, Notifier, WebhookTransport};
use common::renderer::{HttpPageRenderer, PageRenderer};
use common::scheduler::WatchEngine;
use common::throttle::SystemClock;
use std::sync::Arc;
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_V1: &str = r#"<html><body><h1>Shop</h1><span id="price">$4.99</span></body></html>"#;
const PAGE_V2: &str = r#"<html><body><h1>Shop</h1><span id="price">$5.49</span></body></html>"#;

fn render_config() -> RenderConfig {
    RenderConfig {
        timeout_seconds: 5,
        ..Default::default()
    }
}

fn service_config(server: &MockServer) -> NotificationServiceConfig {
    NotificationServiceConfig {
        service_base_url: server.uri(),
        timeout_seconds: 5,
    }
}

fn notification_config() -> NotificationConfig {
    NotificationConfig {
        service_key: "secret".to_string(),
        event_name: "page_changed".to_string(),
        payload_field: "value1".to_string(),
        cooldown_seconds: 10,
    }
}

#[tokio::test]
async fn test_renderer_extracts_selected_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_V1))
        .expect(1)
        .mount(&server)
        .await;

    let renderer = HttpPageRenderer::new(&render_config()).unwrap();
    let text = renderer
        .render(&format!("{}/shop", server.uri()), "#price")
        .await
        .unwrap();

    assert_eq!(text, "499");
    server.verify().await;
}

#[tokio::test]
async fn test_renderer_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let renderer = HttpPageRenderer::new(&render_config()).unwrap();
    let err = renderer
        .render(&format!("{}/down", server.uri()), "body")
        .await
        .unwrap_err();

    assert!(matches!(err, RenderError::Status(503)));
}

#[tokio::test]
async fn test_renderer_fails_when_selector_matches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_V1))
        .mount(&server)
        .await;

    let renderer = HttpPageRenderer::new(&render_config()).unwrap();
    let err = renderer
        .render(&format!("{}/shop", server.uri()), "#stock")
        .await
        .unwrap_err();

    assert!(matches!(err, RenderError::NoMatch(_)));
}

#[tokio::test]
async fn test_transport_posts_identifier_as_form_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trigger/page_changed/with/key/secret"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("value1=https%3A%2F%2Fa.example%2F"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = MakerWebhookTransport::new(&service_config(&server)).unwrap();
    transport
        .send(&notification_config(), "https://a.example/")
        .await
        .unwrap();

    server.verify().await;
}

#[tokio::test]
async fn test_transport_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let transport = MakerWebhookTransport::new(&service_config(&server)).unwrap();
    let err = transport
        .send(&notification_config(), "https://a.example/")
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::Rejected { status: 401, ref body } if body == "bad key"));
}

#[tokio::test]
async fn test_page_change_triggers_one_webhook() {
    let pages = MockServer::start().await;
    // Baseline and first cycle see v1, later requests see v2
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_V1))
        .up_to_n_times(2)
        .mount(&pages)
        .await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_V2))
        .mount(&pages)
        .await;

    let hooks = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trigger/page_changed/with/key/secret"))
        .and(body_string_contains("value1=http"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&hooks)
        .await;

    let url = format!("{}/shop", pages.uri());
    let renderer = Arc::new(HttpPageRenderer::new(&render_config()).unwrap());
    let transport = Arc::new(MakerWebhookTransport::new(&service_config(&hooks)).unwrap());
    let notifier = Notifier::new(notification_config(), transport, Arc::new(SystemClock));

    let mut engine = WatchEngine::new(
        vec![EndpointSpec::new(url.clone(), "#price")],
        JitterConfig::new(1, 0),
        renderer,
    )
    .with_notifier(notifier);

    assert_eq!(engine.prime().await, 1);
    let quiet = engine.run_cycle().await;
    assert!(quiet.changes.is_empty());

    let changed = engine.run_cycle().await;
    assert_eq!(changed.dispatched, vec![url.clone()]);
    assert_eq!(engine.snapshot().get(&url), Some("549"));

    engine.flush_notifications().await;
    hooks.verify().await;
}
