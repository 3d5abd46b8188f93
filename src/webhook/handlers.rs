//! The handler dispatch surface: one optional async callback per event
//! category.
//!
//! Handlers are capability-style slots, not a lookup table: each category
//! is a named field, so "no handler registered" is an `Option` the compiler
//! sees. An empty set is valid; the generic mirror sync runs either way.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::events::{EventCategory, EventPayload};

/// Error type handlers may return. It is logged and never surfaces to the
/// gateway.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send>>;

/// A caller-supplied callback for one event category.
pub type EventHandler = Arc<dyn Fn(EventPayload) -> HandlerFuture + Send + Sync>;

fn slot<F, Fut>(f: F) -> EventHandler
where
    F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(move |payload| Box::pin(f(payload)))
}

/// Optional callbacks, one per category. Build with the `on_*` methods:
///
/// ```ignore
/// let hooks = WebhookHandlers::new()
///     .on_payment_confirmed(|payload| async move {
///         grant_access(&payload).await?;
///         Ok(())
///     });
/// ```
#[derive(Clone, Default)]
pub struct WebhookHandlers {
    payment_created: Option<EventHandler>,
    payment_due_soon: Option<EventHandler>,
    payment_due_today: Option<EventHandler>,
    payment_overdue: Option<EventHandler>,
    payment_confirmed: Option<EventHandler>,
    payment_refunded: Option<EventHandler>,
    payment_chargeback: Option<EventHandler>,
    subscription_created: Option<EventHandler>,
    subscription_renewed: Option<EventHandler>,
    subscription_canceled: Option<EventHandler>,
    unhandled: Option<EventHandler>,
}

impl WebhookHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_payment_created<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.payment_created = Some(slot(f));
        self
    }

    pub fn on_payment_due_soon<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.payment_due_soon = Some(slot(f));
        self
    }

    pub fn on_payment_due_today<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.payment_due_today = Some(slot(f));
        self
    }

    pub fn on_payment_overdue<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.payment_overdue = Some(slot(f));
        self
    }

    pub fn on_payment_confirmed<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.payment_confirmed = Some(slot(f));
        self
    }

    pub fn on_payment_refunded<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.payment_refunded = Some(slot(f));
        self
    }

    pub fn on_payment_chargeback<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.payment_chargeback = Some(slot(f));
        self
    }

    pub fn on_subscription_created<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscription_created = Some(slot(f));
        self
    }

    pub fn on_subscription_renewed<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscription_renewed = Some(slot(f));
        self
    }

    pub fn on_subscription_canceled<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscription_canceled = Some(slot(f));
        self
    }

    pub fn on_unhandled<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.unhandled = Some(slot(f));
        self
    }

    /// The slot registered for a category, if any.
    pub fn handler_for(&self, category: EventCategory) -> Option<&EventHandler> {
        match category {
            EventCategory::PaymentCreated => self.payment_created.as_ref(),
            EventCategory::PaymentDueSoon => self.payment_due_soon.as_ref(),
            EventCategory::PaymentDueToday => self.payment_due_today.as_ref(),
            EventCategory::PaymentOverdue => self.payment_overdue.as_ref(),
            EventCategory::PaymentConfirmed => self.payment_confirmed.as_ref(),
            EventCategory::PaymentRefunded => self.payment_refunded.as_ref(),
            EventCategory::PaymentChargeback => self.payment_chargeback.as_ref(),
            EventCategory::SubscriptionCreated => self.subscription_created.as_ref(),
            EventCategory::SubscriptionRenewed => self.subscription_renewed.as_ref(),
            EventCategory::SubscriptionCanceled => self.subscription_canceled.as_ref(),
            EventCategory::Unhandled => self.unhandled.as_ref(),
        }
    }
}

impl std::fmt::Debug for WebhookHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<&str> = [
            ("payment_created", self.payment_created.is_some()),
            ("payment_due_soon", self.payment_due_soon.is_some()),
            ("payment_due_today", self.payment_due_today.is_some()),
            ("payment_overdue", self.payment_overdue.is_some()),
            ("payment_confirmed", self.payment_confirmed.is_some()),
            ("payment_refunded", self.payment_refunded.is_some()),
            ("payment_chargeback", self.payment_chargeback.is_some()),
            ("subscription_created", self.subscription_created.is_some()),
            ("subscription_renewed", self.subscription_renewed.is_some()),
            ("subscription_canceled", self.subscription_canceled.is_some()),
            ("unhandled", self.unhandled.is_some()),
        ]
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| *name)
        .collect();
        f.debug_struct("WebhookHandlers")
            .field("registered", &registered)
            .finish()
    }
}
