//! Test doubles shared by the module tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Timeouts;
use crate::platform::{MessageRef, Transport};
use crate::render::RenderedView;

pub fn test_timeouts() -> Timeouts {
    Timeouts {
        sentiment: Duration::from_millis(500),
        lookup: Duration::from_millis(300),
    }
}

/// Serve `app` on an ephemeral local port and return its `/api` base URL.
pub async fn spawn_upstream(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Ack,
    Send,
    Edit,
    Delete,
    Photo,
}

/// A successful transport call, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Ack(String),
    Send { message_id: i32, text: String },
    Edit { message_id: i32, text: String },
    Delete(i32),
    Photo(String),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    visible: BTreeMap<i32, RenderedView>,
    next_id: i32,
    failures: HashMap<Primitive, usize>,
}

/// In-memory chat: records calls, tracks which bot messages are on screen,
/// and fails primitives on request.
#[derive(Default)]
pub struct RecordingTransport {
    state: Mutex<State>,
}

impl RecordingTransport {
    /// Fail the next `times` calls of `primitive`.
    pub fn fail(&self, primitive: Primitive, times: usize) {
        *self
            .state
            .lock()
            .unwrap()
            .failures
            .entry(primitive)
            .or_default() += times;
    }

    /// Put a message on screen as if the bot had sent it earlier.
    pub fn seed_message(&self, chat_id: i64, text: &str) -> MessageRef {
        let mut state = self.state.lock().unwrap();
        let message_id = allocate_id(&mut state);
        state
            .visible
            .insert(message_id, RenderedView::text_only(text));
        MessageRef {
            chat_id,
            message_id,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Messages currently on screen, oldest first.
    pub fn visible(&self) -> Vec<RenderedView> {
        self.state.lock().unwrap().visible.values().cloned().collect()
    }

    fn check(&self, primitive: Primitive) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.failures.get_mut(&primitive) {
            if *remaining > 0 {
                *remaining -= 1;
                anyhow::bail!("injected {:?} failure", primitive);
            }
        }
        Ok(())
    }
}

fn allocate_id(state: &mut State) -> i32 {
    state.next_id += 1;
    100 + state.next_id
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn acknowledge(&self, callback_id: &str) -> Result<()> {
        self.check(Primitive::Ack)?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Ack(callback_id.to_string()));
        Ok(())
    }

    async fn send(&self, chat_id: i64, view: &RenderedView) -> Result<MessageRef> {
        self.check(Primitive::Send)?;
        let mut state = self.state.lock().unwrap();
        let message_id = allocate_id(&mut state);
        state.visible.insert(message_id, view.clone());
        state.calls.push(Call::Send {
            message_id,
            text: view.text.clone(),
        });
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }

    async fn edit(&self, message: MessageRef, view: &RenderedView) -> Result<()> {
        self.check(Primitive::Edit)?;
        let mut state = self.state.lock().unwrap();
        match state.visible.get_mut(&message.message_id) {
            Some(existing) => *existing = view.clone(),
            None => anyhow::bail!("message to edit not found"),
        }
        state.calls.push(Call::Edit {
            message_id: message.message_id,
            text: view.text.clone(),
        });
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<()> {
        self.check(Primitive::Delete)?;
        let mut state = self.state.lock().unwrap();
        if state.visible.remove(&message.message_id).is_none() {
            anyhow::bail!("message to delete not found");
        }
        state.calls.push(Call::Delete(message.message_id));
        Ok(())
    }

    async fn send_photo(&self, _chat_id: i64, url: &str) -> Result<()> {
        self.check(Primitive::Photo)?;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Photo(url.to_string()));
        Ok(())
    }
}
