//! The real-time streaming channel: one logical socket per client (§6).
//! A client that has not sent `authenticate` only receives broadcasts for
//! courses it explicitly subscribes to; the personal topic requires
//! authentication.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use registration_domain::event::Envelope;

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all_fields = "camelCase")]
enum ClientCommand {
    #[serde(rename = "authenticate")]
    Authenticate { student_id: Uuid },
    #[serde(rename = "subscribe:course")]
    SubscribeCourse { course_id: String },
    #[serde(rename = "unsubscribe:course")]
    UnsubscribeCourse { course_id: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
enum ServerEvent {
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "authenticated")]
    Authenticated,
    #[serde(rename = "subscribed:course")]
    SubscribedCourse { course_id: String },
    #[serde(rename = "course:update")]
    CourseUpdate { envelope: Envelope },
    #[serde(rename = "course:classroomState")]
    CourseClassroomState {
        state: registration_domain::ClassroomState,
    },
    #[serde(rename = "personal:update")]
    PersonalUpdate { envelope: Envelope },
    #[serde(rename = "error")]
    Error { message: String },
}

pub async fn upgrade(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

struct CourseSubscription {
    bus_id: Uuid,
    forwarder: JoinHandle<()>,
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(DEFAULT_OUTBOUND_CAPACITY);
    let (mut sink, mut stream) = socket.split();

    let sender_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    send(&out_tx, &ServerEvent::Connected).await;

    let mut student_id: Option<Uuid> = None;
    let mut student_subscription: Option<(Uuid, JoinHandle<()>)> = None;
    let mut course_subscriptions: HashMap<String, CourseSubscription> = HashMap::new();

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        match serde_json::from_str::<ClientCommand>(&text) {
            Ok(ClientCommand::Authenticate { student_id: id }) => {
                let previous_student_id = student_id.replace(id);
                if let Some((bus_id, handle)) = student_subscription.take() {
                    if let Some(previous_id) = previous_student_id {
                        state
                            .orchestrator
                            .event_bus()
                            .unsubscribe(&format!("student:{previous_id}"), bus_id);
                    }
                    handle.abort();
                }
                let topic = format!("student:{id}");
                let (bus_id, mut rx) = state.orchestrator.event_bus().subscribe(&topic);
                let forward_tx = out_tx.clone();
                let handle = tokio::spawn(async move {
                    while let Some(envelope) = rx.recv().await {
                        if send(&forward_tx, &ServerEvent::PersonalUpdate { envelope }).await.is_err() {
                            break;
                        }
                    }
                });
                student_subscription = Some((bus_id, handle));
                send(&out_tx, &ServerEvent::Authenticated).await;
            }
            Ok(ClientCommand::SubscribeCourse { course_id }) => {
                subscribe_course(&state, &out_tx, &mut course_subscriptions, course_id).await;
            }
            Ok(ClientCommand::UnsubscribeCourse { course_id }) => {
                if let Some(sub) = course_subscriptions.remove(&course_id) {
                    state
                        .orchestrator
                        .event_bus()
                        .unsubscribe(&format!("course:{course_id}"), sub.bus_id);
                    sub.forwarder.abort();
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "unrecognized websocket command");
                send(
                    &out_tx,
                    &ServerEvent::Error {
                        message: "unrecognized command".to_string(),
                    },
                )
                .await;
            }
        }
    }

    tracing::info!(student_id = ?student_id, "websocket connection closed");
    for (course_id, sub) in course_subscriptions {
        state
            .orchestrator
            .event_bus()
            .unsubscribe(&format!("course:{course_id}"), sub.bus_id);
        sub.forwarder.abort();
    }
    if let Some((bus_id, handle)) = student_subscription {
        if let Some(id) = student_id {
            state
                .orchestrator
                .event_bus()
                .unsubscribe(&format!("student:{id}"), bus_id);
        }
        handle.abort();
    }
    sender_task.abort();
}

async fn subscribe_course(
    state: &Arc<AppState>,
    out_tx: &mpsc::Sender<Message>,
    course_subscriptions: &mut HashMap<String, CourseSubscription>,
    course_id: String,
) {
    if course_subscriptions.contains_key(&course_id) {
        return;
    }

    let topic = format!("course:{course_id}");
    let (bus_id, mut rx) = state.orchestrator.event_bus().subscribe(&topic);
    let forward_tx = out_tx.clone();
    let handle = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            if send(&forward_tx, &ServerEvent::CourseUpdate { envelope }).await.is_err() {
                break;
            }
        }
    });
    course_subscriptions.insert(course_id.clone(), CourseSubscription { bus_id, forwarder: handle });

    send(
        out_tx,
        &ServerEvent::SubscribedCourse {
            course_id: course_id.clone(),
        },
    )
    .await;

    match state.orchestrator.get_classroom_state(&course_id).await {
        Ok(state_snapshot) => {
            send(out_tx, &ServerEvent::CourseClassroomState { state: state_snapshot }).await;
        }
        Err(err) => {
            tracing::warn!(course_id = %course_id, error = %err, "failed to build initial classroom snapshot");
        }
    }
}

async fn send(tx: &mpsc::Sender<Message>, event: &ServerEvent) -> Result<(), ()> {
    let text = serde_json::to_string(event).expect("ServerEvent always serializes");
    tx.send(Message::Text(text.into())).await.map_err(|_| ())
}

const DEFAULT_OUTBOUND_CAPACITY: usize = 128;
