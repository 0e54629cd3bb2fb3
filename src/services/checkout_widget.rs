//! Embeddable checkout widget capability.
//!
//! The orchestrator never talks to a global widget object: it is handed a
//! [`CheckoutWidget`], calls `initiate` with the widget configuration plus the
//! attempt's event callbacks, and then `render`s the returned handle into a
//! target. [`HostedCheckoutWidget`] is the production implementation, where
//! the real widget runs in the operator's browser and reports back through
//! the checkout events endpoint.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::{
    error::{ApiError, Result},
    models::checkout::{
        CheckoutEvent, CheckoutEventKind, TopUpAttempt, WidgetConfig, WidgetMount,
    },
};

pub trait CheckoutWidget: Send + Sync {
    fn initiate(&self, config: WidgetConfig, events: WidgetEvents)
        -> Result<Box<dyn WidgetHandle>>;

    /// Drops whatever the widget still holds for an attempt that settled
    /// without a widget-reported event
    fn unregister(&self, attempt_id: Uuid);
}

pub trait WidgetHandle: Send {
    fn render(&mut self, target: &str) -> Result<WidgetMount>;
}

/// Event delivered to the attempt that owns the widget, with a reply slot for
/// the settled attempt
pub struct WidgetSignal {
    pub event: CheckoutEvent,
    pub reply: oneshot::Sender<Result<TopUpAttempt>>,
}

/// The three widget callbacks, bound to a single top-up attempt
#[derive(Clone)]
pub struct WidgetEvents {
    attempt_id: Uuid,
    sender: mpsc::Sender<WidgetSignal>,
}

impl WidgetEvents {
    pub fn new(attempt_id: Uuid, sender: mpsc::Sender<WidgetSignal>) -> Self {
        Self { attempt_id, sender }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub async fn on_completed(&self, payload: serde_json::Value) -> Result<TopUpAttempt> {
        self.emit(CheckoutEvent::new(CheckoutEventKind::Completed, payload))
            .await
    }

    pub async fn on_cancelled(&self, payload: serde_json::Value) -> Result<TopUpAttempt> {
        self.emit(CheckoutEvent::new(CheckoutEventKind::Cancelled, payload))
            .await
    }

    pub async fn on_expired(&self, payload: serde_json::Value) -> Result<TopUpAttempt> {
        self.emit(CheckoutEvent::new(CheckoutEventKind::Expired, payload))
            .await
    }

    /// Delivers an event and waits for the attempt to settle it.
    ///
    /// Only the first event of an attempt is processed; later ones are
    /// rejected with a conflict.
    pub async fn emit(&self, event: CheckoutEvent) -> Result<TopUpAttempt> {
        let (reply, settled) = oneshot::channel();

        self.sender
            .send(WidgetSignal { event, reply })
            .await
            .map_err(|_| self.closed())?;

        settled.await.map_err(|_| self.closed())?
    }

    fn closed(&self) -> ApiError {
        ApiError::Conflict(format!(
            "Checkout attempt {} is no longer accepting widget events",
            self.attempt_id
        ))
    }
}

type CallbackRegistry = Arc<Mutex<HashMap<Uuid, WidgetEvents>>>;

/// Browser-hosted widget.
///
/// Rendering publishes the widget mount for the front end and keeps the
/// attempt's callbacks until the browser reports an event.
#[derive(Default)]
pub struct HostedCheckoutWidget {
    callbacks: CallbackRegistry,
}

impl HostedCheckoutWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a browser-reported event to the attempt's callbacks
    pub async fn dispatch(&self, attempt_id: Uuid, event: CheckoutEvent) -> Result<TopUpAttempt> {
        let events = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&attempt_id)
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "No active checkout widget for attempt {}",
                    attempt_id
                ))
            })?;

        events.emit(event).await
    }

    pub fn active_count(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl CheckoutWidget for HostedCheckoutWidget {
    fn initiate(
        &self,
        config: WidgetConfig,
        events: WidgetEvents,
    ) -> Result<Box<dyn WidgetHandle>> {
        if config.checkout_id.is_empty() {
            return Err(ApiError::Widget(
                "Cannot initiate checkout widget without a checkout id".to_string(),
            ));
        }

        Ok(Box::new(HostedWidgetHandle {
            config,
            events: Some(events),
            callbacks: self.callbacks.clone(),
        }))
    }

    fn unregister(&self, attempt_id: Uuid) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&attempt_id);
    }
}

struct HostedWidgetHandle {
    config: WidgetConfig,
    events: Option<WidgetEvents>,
    callbacks: CallbackRegistry,
}

impl WidgetHandle for HostedWidgetHandle {
    fn render(&mut self, target: &str) -> Result<WidgetMount> {
        let events = self.events.take().ok_or_else(|| {
            ApiError::Widget(format!(
                "Checkout {} is already rendered",
                self.config.checkout_id
            ))
        })?;

        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(events.attempt_id(), events);

        Ok(WidgetMount {
            config: self.config.clone(),
            target: target.to_string(),
        })
    }
}
