use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::client::{ClientError, EdupromptClient};
use shared::conversation::{ConversationStore, GREETING, StructuredContext};
use shared::models::{ChecklistKey, Role};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

#[derive(Debug, Clone)]
struct MockReply {
    status: StatusCode,
    body: Value,
}

#[derive(Debug, Clone, Default)]
struct BackendState {
    dialog_replies: Arc<Mutex<VecDeque<MockReply>>>,
    instruction_replies: Arc<Mutex<VecDeque<MockReply>>>,
    seen_dialog_bodies: Arc<Mutex<Vec<Value>>>,
    seen_instruction_bodies: Arc<Mutex<Vec<Value>>>,
    dialog_delay: Option<Duration>,
}

impl BackendState {
    fn new(dialog: Vec<MockReply>, instruction: Vec<MockReply>) -> Self {
        Self {
            dialog_replies: Arc::new(Mutex::new(VecDeque::from(dialog))),
            instruction_replies: Arc::new(Mutex::new(VecDeque::from(instruction))),
            ..Self::default()
        }
    }
}

#[tokio::test]
async fn first_message_injects_context_and_applies_envelope() {
    let state = BackendState::new(
        vec![ok(envelope_body(
            "Welche Rolle soll die KI übernehmen?",
            [true, true, false, false, false],
        ))],
        Vec::new(),
    );
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::new(&base_url).expect("client should build");
    let mut store = ConversationStore::new();
    store.set_context(StructuredContext {
        klassenstufe: Some("5".to_string()),
        fach: Some("Mathematik".to_string()),
        ..StructuredContext::default()
    });

    let envelope = client
        .send_message(&mut store, "Bruchrechnen üben", None)
        .await
        .expect("dialog turn should succeed")
        .expect("message was not blank");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(envelope.reply, "Welche Rolle soll die KI übernehmen?");
    assert_eq!(store.turns().len(), 4);
    assert_eq!(store.turns()[3].role, Role::Assistant);
    assert!(store.checklist().get(ChecklistKey::Thema));
    assert!(store.checklist().get(ChecklistKey::Zielgruppe));
    assert_eq!(store.checked_count(), 2);

    let bodies = state.seen_dialog_bodies.lock().await.clone();
    let messages = bodies[0]["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["content"], GREETING);
    assert!(
        messages[1]["content"]
            .as_str()
            .is_some_and(|content| content.contains("- Klassenstufe: 5"))
    );
    assert_eq!(messages[2]["content"], "Bruchrechnen üben");
}

#[tokio::test]
async fn blank_message_sends_nothing() {
    let state = BackendState::new(Vec::new(), Vec::new());
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::new(&base_url).expect("client should build");
    let mut store = ConversationStore::new();
    let outcome = client
        .send_message(&mut store, "   ", None)
        .await
        .expect("blank message is not an error");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(outcome.is_none());
    assert_eq!(store.turns().len(), 1);
    assert!(state.seen_dialog_bodies.lock().await.is_empty());
}

#[tokio::test]
async fn server_error_keeps_user_turn_and_surfaces_message() {
    let state = BackendState::new(
        vec![MockReply {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: json!({ "error": "Fehler von der OpenAI API." }),
        }],
        Vec::new(),
    );
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::new(&base_url).expect("client should build");
    let mut store = ConversationStore::new();
    let err = client
        .send_message(&mut store, "Bruchrechnen", None)
        .await
        .expect_err("429 should surface");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(
        matches!(
            err,
            ClientError::Api { status: 429, ref message } if message == "Fehler von der OpenAI API."
        ),
        "{err:?}"
    );
    assert_eq!(store.turns().len(), 2);
    assert_eq!(store.turns()[1].role, Role::User);
    assert_eq!(store.checked_count(), 0);
}

#[tokio::test]
async fn generate_is_refused_until_enough_items_are_checked() {
    let state = BackendState::new(Vec::new(), Vec::new());
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::new(&base_url).expect("client should build");
    let mut store = ConversationStore::new();
    let err = client
        .generate(&mut store)
        .await
        .expect_err("generation should be locked");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(
        err,
        ClientError::GenerationNotReady {
            checked: 0,
            required: 4
        }
    ));
    assert!(state.seen_instruction_bodies.lock().await.is_empty());
}

#[tokio::test]
async fn generate_sends_stored_history_and_stores_result() {
    let state = BackendState::new(
        vec![ok(envelope_body(
            "Alle wichtigen Punkte sind abgedeckt. Sollen wir jetzt die Instruktion generieren?",
            [true, true, true, true, false],
        ))],
        vec![ok(json!({ "result": "Du bist ein geduldiger Mathe-Tutor." }))],
    );
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::new(&base_url).expect("client should build");
    let mut store = ConversationStore::new();
    client
        .send_message(&mut store, "Tutor für Bruchrechnen, Klasse 5, Liste", None)
        .await
        .expect("dialog turn should succeed");
    store.set_context(StructuredContext {
        dauer: Some("45 Minuten".to_string()),
        ..StructuredContext::default()
    });

    let result = client
        .generate(&mut store)
        .await
        .expect("generation should succeed");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert_eq!(result, "Du bist ein geduldiger Mathe-Tutor.");
    assert_eq!(
        store.generation_result(),
        Some("Du bist ein geduldiger Mathe-Tutor.")
    );

    let bodies = state.seen_instruction_bodies.lock().await.clone();
    let chat = bodies[0]["chat"].as_array().expect("chat array");
    assert_eq!(chat.len(), 3, "context set after the dialog started stays out");
    assert!(chat.iter().all(|turn| {
        turn["content"]
            .as_str()
            .is_some_and(|content| !content.contains("Dauer der Aktivität"))
    }));
}

#[tokio::test]
async fn empty_reply_is_an_error_and_adds_no_assistant_turn() {
    let state = BackendState::new(
        vec![ok(envelope_body("", [true, false, false, false, false]))],
        Vec::new(),
    );
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::new(&base_url).expect("client should build");
    let mut store = ConversationStore::new();
    let err = client
        .send_message(&mut store, "Bruchrechnen", None)
        .await
        .expect_err("empty reply is unusable");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(err, ClientError::InvalidResponse(_)), "{err:?}");
    assert_eq!(store.turns().len(), 2);
    assert_eq!(store.turns()[1].role, Role::User);
    assert_eq!(store.checked_count(), 0);
}

#[tokio::test]
async fn client_timeout_surfaces_as_transport_error() {
    let state = BackendState {
        dialog_delay: Some(Duration::from_millis(500)),
        ..BackendState::new(
            vec![ok(envelope_body("Zu spät?", [false; 5]))],
            Vec::new(),
        )
    };
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::with_timeout(&base_url, Some(Duration::from_millis(50)))
        .expect("client should build");
    let mut store = ConversationStore::new();
    let err = client
        .send_message(&mut store, "Hallo", None)
        .await
        .expect_err("slow backend should time out");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(err, ClientError::Transport(_)), "{err:?}");
    assert_eq!(store.turns().len(), 2);
}

#[tokio::test]
async fn empty_generation_result_is_reported() {
    let state = BackendState::new(
        vec![ok(envelope_body("Fertig?", [true, true, true, true, true]))],
        vec![ok(json!({ "result": "" }))],
    );
    let (base_url, shutdown_tx, server_task) = spawn_backend(state.clone()).await;

    let client = EdupromptClient::new(&base_url).expect("client should build");
    let mut store = ConversationStore::new();
    client
        .send_message(&mut store, "Alles", None)
        .await
        .expect("dialog turn should succeed");
    let err = client
        .generate(&mut store)
        .await
        .expect_err("empty result is unusable");

    shutdown_tx.send(()).expect("shutdown signal should send");
    server_task.await.expect("server task should join");

    assert!(matches!(err, ClientError::EmptyResult));
    assert_eq!(store.generation_result(), None);
}

fn ok(body: Value) -> MockReply {
    MockReply {
        status: StatusCode::OK,
        body,
    }
}

fn envelope_body(reply: &str, flags: [bool; 5]) -> Value {
    json!({
        "reply": reply,
        "checklist": {
            "thema": flags[0],
            "zielgruppe": flags[1],
            "rolleKi": flags[2],
            "ausgabeformat": flags[3],
            "lerneffekt": flags[4]
        }
    })
}

async fn spawn_backend(
    state: BackendState,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/api/dialog-turn", post(dialog_turn_handler))
        .route("/api/generate-instruction", post(generate_instruction_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener
        .local_addr()
        .expect("listener address should resolve");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });

        server.await.expect("test server should run");
    });

    (format!("http://{local_addr}/api"), shutdown_tx, server_task)
}

async fn dialog_turn_handler(
    State(state): State<BackendState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen_dialog_bodies.lock().await.push(payload);
    if let Some(delay) = state.dialog_delay {
        tokio::time::sleep(delay).await;
    }
    next_reply(&state.dialog_replies).await
}

async fn generate_instruction_handler(
    State(state): State<BackendState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen_instruction_bodies.lock().await.push(payload);
    next_reply(&state.instruction_replies).await
}

async fn next_reply(replies: &Mutex<VecDeque<MockReply>>) -> (StatusCode, Json<Value>) {
    let reply = replies.lock().await.pop_front().unwrap_or(MockReply {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: json!({ "error": "exhausted test replies" }),
    });

    (reply.status, Json(reply.body))
}
