//! Per-interaction orchestration.
//!
//! Every event walks `Received → Acknowledged → Pending → Resolved`. Button
//! presses are acknowledged before any other I/O; a failed acknowledgement is
//! logged and the interaction carries on. Intents that need the backend get a
//! pending indicator, their result or error is always sent as a new message,
//! and the indicator is retired last. Menu intents skip `Pending` and edit the
//! originating message in place when there is one.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::backend::BackendGateway;
use crate::error::ErrorKind;
use crate::pending::PendingIndicator;
use crate::platform::{InboundEvent, MessageRef, Transport};
use crate::render::{self, RenderedView};
use crate::router::{self, Intent, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Acknowledged,
    Pending,
    Resolved,
}

/// What happened to one inbound event.
#[derive(Debug)]
pub struct Interaction {
    pub id: Uuid,
    pub intent: Option<Intent>,
    pub stage: Stage,
    /// The error reported to the user, if any.
    pub error: Option<ErrorKind>,
    /// Whether the final view reached the chat.
    pub delivered: bool,
}

impl Interaction {
    /// Note the outcome of the final render. A render failure replaces any
    /// error recorded earlier, since that error never reached the user.
    fn record(&mut self, delivery: Result<MessageRef, ErrorKind>) {
        match delivery {
            Ok(_) => self.delivered = true,
            Err(e) => {
                if let Some(earlier) = self.error.replace(e) {
                    debug!("Undelivered error view for: {}", earlier);
                }
            }
        }
    }
}

/// Where a view should land.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Edit(MessageRef),
    New(i64),
}

impl Placement {
    fn chat_id(self) -> i64 {
        match self {
            Placement::Edit(message) => message.chat_id,
            Placement::New(chat_id) => chat_id,
        }
    }
}

pub struct Controller {
    transport: Arc<dyn Transport>,
    gateway: BackendGateway,
}

impl Controller {
    pub fn new(transport: Arc<dyn Transport>, gateway: BackendGateway) -> Self {
        Self { transport, gateway }
    }

    pub async fn handle(&self, event: InboundEvent) -> Interaction {
        let id = Uuid::new_v4();
        let span = info_span!("interaction", %id, kind = event.kind());
        self.run(id, event).instrument(span).await
    }

    async fn run(&self, id: Uuid, event: InboundEvent) -> Interaction {
        let mut interaction = Interaction {
            id,
            intent: None,
            stage: Stage::Received,
            error: None,
            delivered: false,
        };

        info!(
            "Event from user {:?} in chat {}",
            event.user_id(),
            event.chat_id()
        );

        if let InboundEvent::ButtonPress { callback_id, .. } = &event {
            if let Err(e) = self.transport.acknowledge(callback_id).await {
                warn!("Failed to acknowledge button press: {:#}", e);
            }
        }
        interaction.stage = Stage::Acknowledged;

        let placement = match &event {
            InboundEvent::ButtonPress { origin, .. } => Placement::Edit(*origin),
            _ => Placement::New(event.chat_id()),
        };

        match router::route(&event) {
            Route::NoMatch => {
                debug!("No handler for event, dropping");
                return interaction;
            }
            Route::Invalid(bad) => {
                info!("Bad request: {}", bad);
                let err = ErrorKind::from(bad);
                let view = render::render_error(&err, None);
                interaction.error = Some(err);
                interaction.record(self.deliver(placement, &view).await);
            }
            Route::Dispatch(intent) => {
                info!("Dispatching {:?}", intent);
                interaction.intent = Some(intent.clone());
                match render::render_static(&intent) {
                    Some(view) => {
                        interaction.record(self.deliver(placement, &view).await);
                    }
                    None => self.resolve_upstream(&mut interaction, &intent, placement).await,
                }
            }
        }

        interaction.stage = Stage::Resolved;
        interaction
    }

    async fn resolve_upstream(
        &self,
        interaction: &mut Interaction,
        intent: &Intent,
        placement: Placement,
    ) {
        let Some((kind, project)) = intent.lookup() else {
            warn!("{:?} has neither a static view nor a backend lookup", intent);
            return;
        };
        let chat_id = placement.chat_id();

        let pending = self.show_pending(intent, placement).await;
        if pending.message().is_none() {
            debug!("Continuing without a pending indicator");
        }
        interaction.stage = Stage::Pending;

        let (view, media_url) = match self.gateway.fetch(kind, project).await {
            Ok(result) => {
                info!("Fetched {} for '{}'", kind, project);
                (
                    render::render_result(&result),
                    result.media_url().map(str::to_string),
                )
            }
            Err(err) => {
                warn!("{} lookup for '{}' failed: {}", kind, project, err);
                let view = render::render_error(&err, Some(intent));
                interaction.error = Some(err);
                (view, None)
            }
        };

        interaction.record(self.deliver(Placement::New(chat_id), &view).await);

        if let Some(url) = media_url {
            if let Err(e) = self.transport.send_photo(chat_id, &url).await {
                warn!("Failed to send top tweet media: {:#}", e);
            }
        }

        pending.retire().await;
    }

    /// Show the pending indicator. A button's own message becomes the
    /// indicator; otherwise a new message is sent. Failing both, the
    /// interaction goes on without one.
    async fn show_pending(&self, intent: &Intent, placement: Placement) -> PendingIndicator {
        let message = match render::pending_view(intent) {
            None => None,
            Some(view) => match placement {
                Placement::Edit(origin) => match self.transport.edit(origin, &view).await {
                    Ok(()) => Some(origin),
                    Err(e) => {
                        debug!("Could not turn message into pending indicator: {:#}", e);
                        self.send_pending(origin.chat_id, &view).await
                    }
                },
                Placement::New(chat_id) => self.send_pending(chat_id, &view).await,
            },
        };
        PendingIndicator::new(Arc::clone(&self.transport), message)
    }

    async fn send_pending(&self, chat_id: i64, view: &RenderedView) -> Option<MessageRef> {
        match self.transport.send(chat_id, view).await {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Failed to show pending indicator: {:#}", e);
                None
            }
        }
    }

    /// Render a final view. A rejected render is retried once as a new message.
    async fn deliver(
        &self,
        placement: Placement,
        view: &RenderedView,
    ) -> Result<MessageRef, ErrorKind> {
        let first = match placement {
            Placement::Edit(origin) => self.transport.edit(origin, view).await.map(|()| origin),
            Placement::New(chat_id) => self.transport.send(chat_id, view).await,
        };

        let err = match first {
            Ok(message) => return Ok(message),
            Err(e) => e,
        };
        warn!("Render rejected, retrying as a new message: {:#}", err);

        self.transport
            .send(placement.chat_id(), view)
            .await
            .map_err(|e| {
                error!("Render failed after retry: {:#}", e);
                ErrorKind::RenderFailure(e.to_string())
            })
    }
}
