//! End-to-end session scenarios against a mocked admin API.

use admin_client_lib::adapters::{HttpAuthBackend, InMemorySessionStore, TracingNotifier};
use admin_client_lib::config::Config;
use admin_client_lib::review::DecisionForm;
use admin_client_lib::web::{AppState, GuardDecision, Navigation};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use kyc_session_core::domain::{Decision, Location, LoginCredentials};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn token_expiring_in(seconds: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + seconds;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "jdoe", "exp": exp }).to_string());
    format!("{header}.{payload}.signature")
}

fn admin_json() -> Value {
    json!({
        "username": "jdoe",
        "email": "jdoe@bank.test",
        "full_name": "Jane Doe",
        "bank_name": "First Test Bank",
        "role": "admin"
    })
}

fn app(server: &MockServer) -> AppState {
    let config = Config {
        api_base_url: server.uri(),
        ..Config::default()
    };
    let backend = Arc::new(HttpAuthBackend::new(
        reqwest::Client::new(),
        server.uri(),
        Duration::from_secs(5),
    ));
    AppState::with_adapters(
        config,
        Arc::new(InMemorySessionStore::new()),
        backend,
        Arc::new(TracingNotifier),
    )
    .unwrap()
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": token, "admin": admin_json() }
        })))
        .mount(server)
        .await;
}

async fn mount_validation(server: &MockServer, success: bool) {
    Mock::given(method("GET"))
        .and(path("/api/admin/validate-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": success })))
        .mount(server)
        .await;
}

/// Polls until the router shows `expected` or two seconds pass.
async fn settled_at(state: &AppState, expected: &Location) -> bool {
    for _ in 0..100 {
        if &state.router.current() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

fn store_session(state: &AppState, token: &str) {
    let admin = serde_json::from_value(admin_json()).unwrap();
    state.facade.tokens().set_token(token).unwrap();
    state.facade.tokens().set_admin(&admin).unwrap();
}

#[tokio::test]
async fn login_with_a_day_long_token_gives_a_valid_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let token = token_expiring_in(86_400);
    mount_login(&server, &token).await;
    let state = app(&server);

    let outcome = state
        .facade
        .login(&LoginCredentials {
            username: "jdoe".to_string(),
            password: "hunter22".to_string(),
        })
        .await;

    assert!(outcome.success);
    assert_eq!(state.facade.tokens().get_token(), Some(token));
    assert_eq!(state.facade.tokens().get_admin().unwrap().full_name, "Jane Doe");
    assert!(state.facade.is_valid_session());
    state.shutdown().await;
}

#[tokio::test]
async fn token_expired_a_second_ago_is_cleared() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let state = app(&server);
    store_session(&state, &token_expiring_in(-1));

    assert!(!state.facade.is_valid_session());
    assert_eq!(state.facade.tokens().get_token(), None);
    assert_eq!(state.facade.tokens().get_admin(), None);
    state.shutdown().await;
}

#[tokio::test]
async fn dashboard_without_a_token_redirects_to_login_with_from() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let state = app(&server);

    let decision = state
        .router
        .protected_route()
        .check(&Location::new("/dashboard"))
        .await;
    assert_eq!(
        decision,
        GuardDecision::Redirect {
            to: Location::with_from("/login", Location::new("/dashboard"))
        }
    );

    let navigation = state.router.navigate(Location::new("/dashboard")).await;
    assert_eq!(
        navigation,
        Navigation::Rendered {
            location: Location::with_from("/login", Location::new("/dashboard")),
            redirects: 1,
        }
    );
    state.shutdown().await;
}

#[tokio::test]
async fn backend_rejection_clears_the_store_and_redirects() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    mount_validation(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let state = app(&server);
    store_session(&state, &token_expiring_in(86_400));

    let decision = state
        .router
        .protected_route()
        .check(&Location::new("/dashboard"))
        .await;

    assert_eq!(
        decision,
        GuardDecision::Redirect {
            to: Location::with_from("/login", Location::new("/dashboard"))
        }
    );
    assert_eq!(state.facade.tokens().get_token(), None);
    assert_eq!(state.facade.tokens().get_admin(), None);
    state.shutdown().await;
}

#[tokio::test]
async fn confirmed_session_renders_the_dashboard() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    mount_validation(&server, true).await;
    let state = app(&server);
    store_session(&state, &token_expiring_in(86_400));

    let navigation = state.router.navigate(Location::new("/dashboard")).await;
    assert_eq!(
        navigation,
        Navigation::Rendered {
            location: Location::new("/dashboard"),
            redirects: 0,
        }
    );
    state.shutdown().await;
}

#[tokio::test]
async fn auth_guard_sends_signed_in_admins_onward() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    mount_validation(&server, true).await;
    let state = app(&server);
    let guard = state.router.auth_guard();

    let anonymous = guard.evaluate(&Location::new("/login"));
    assert_eq!(anonymous, GuardDecision::Render);

    store_session(&state, &token_expiring_in(86_400));
    assert_eq!(
        guard.evaluate(&Location::new("/login")),
        GuardDecision::Redirect {
            to: Location::new("/dashboard")
        }
    );
    assert_eq!(
        guard.evaluate(&Location::with_from("/login", Location::new("/dashboard/history"))),
        GuardDecision::Redirect {
            to: Location::new("/dashboard/history")
        }
    );
    state.shutdown().await;
}

#[tokio::test]
async fn api_calls_carry_the_bearer_and_a_401_ends_the_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let token = token_expiring_in(86_400);
    Mock::given(method("GET"))
        .and(path("/api/files/pending-decisions"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/my-uploads"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let state = app(&server);
    store_session(&state, &token);
    let mut events = state.facade.subscribe();

    let pending: Value = state.api.get_json("/api/files/pending-decisions").await.unwrap();
    assert_eq!(pending["success"], true);

    let failure = state
        .api
        .get_json::<Value>("/api/files/my-uploads")
        .await
        .unwrap_err();
    assert_eq!(failure.status, Some(401));
    assert_eq!(failure.message, "Session expired - please login again");
    assert_eq!(state.facade.tokens().get_token(), None);
    assert!(matches!(
        events.recv().await.unwrap(),
        kyc_session_core::domain::SessionEvent::SessionExpired { .. }
    ));
    state.shutdown().await;
}

#[tokio::test]
async fn expired_session_on_the_dashboard_sends_the_admin_to_login() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    mount_validation(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/api/files/my-uploads"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let state = app(&server);
    store_session(&state, &token_expiring_in(86_400));

    let navigation = state.router.navigate(Location::new("/dashboard")).await;
    assert!(matches!(navigation, Navigation::Rendered { redirects: 0, .. }));

    let _ = state.api.get_json::<Value>("/api/files/my-uploads").await;

    let expected = Location::with_from("/login", Location::new("/dashboard"));
    assert!(settled_at(&state, &expected).await, "router is at {:?}", state.router.current());
    state.shutdown().await;
}

#[tokio::test]
async fn session_events_leave_the_login_page_alone() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let state = app(&server);
    let on_login = Location::with_from("/login", Location::new("/dashboard/history"));

    let navigation = state.router.navigate(on_login.clone()).await;
    assert_eq!(
        navigation,
        Navigation::Rendered {
            location: on_login.clone(),
            redirects: 0
        }
    );

    state.facade.expire_session("Session expired - please login again").await;
    state.facade.logout().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(state.router.current(), on_login);
    state.shutdown().await;
}

#[tokio::test]
async fn session_end_during_a_navigation_does_not_interrupt_it() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/validate-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let state = app(&server);
    store_session(&state, &token_expiring_in(86_400));

    let facade = state.facade.clone();
    let expire = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        facade.expire_session("Session expired - please login again").await;
    });

    // A listener redirect would start a newer navigation and supersede this one.
    let navigation = state.router.navigate(Location::new("/dashboard")).await;
    expire.await.unwrap();

    assert_eq!(
        navigation,
        Navigation::Rendered {
            location: Location::with_from("/login", Location::new("/dashboard")),
            redirects: 1,
        }
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        state.router.current(),
        Location::with_from("/login", Location::new("/dashboard"))
    );
    state.shutdown().await;
}

#[tokio::test]
async fn decisions_are_posted_with_feedback() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let token = token_expiring_in(86_400);
    Mock::given(method("POST"))
        .and(path("/api/files/decision/CUST-7"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .and(body_json(json!({
            "mlResultId": "91",
            "decision": "REJECTED",
            "feedback": "address does not match the utility bill"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "decision_id": 5 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let state = app(&server);
    store_session(&state, &token);

    let mut form = DecisionForm::new(
        "CUST-7",
        Decision::Rejected,
        " address does not match the utility bill ",
    );
    form.ml_result_id = Some("91".to_string());
    let recorded = state.api.submit_decision(&form).await.unwrap();

    assert_eq!(recorded["decision_id"], 5);
    state.shutdown().await;
}

#[tokio::test]
async fn decision_without_feedback_never_reaches_the_backend() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let state = app(&server);
    store_session(&state, &token_expiring_in(86_400));

    let failure = state
        .api
        .submit_decision(&DecisionForm::new("CUST-7", Decision::Approved, "   "))
        .await
        .unwrap_err();

    assert_eq!(failure.status, None);
    assert_eq!(failure.message, "Feedback is required for all decisions");
    state.shutdown().await;
}

#[tokio::test]
async fn pending_and_past_decisions_are_listed() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files/pending-decisions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "pending_decisions": [{ "id": 91, "customer_id": "CUST-7" }] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/my-decisions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "No decisions yet"
        })))
        .mount(&server)
        .await;
    let state = app(&server);
    store_session(&state, &token_expiring_in(86_400));

    let pending = state.api.pending_decisions().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["customer_id"], "CUST-7");

    let failure = state.api.my_decisions().await.unwrap_err();
    assert_eq!(failure.message, "No decisions yet");
    state.shutdown().await;
}
