use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    DepositDecidedEvent,
    EventHandler,
    EventProducer,
    Handler,
    LocalOrderDecidedEvent,
    OrderCompletedEvent,
    OrderRefundedEvent,
    PurchaseQueuedEvent,
};

/// The producer ends of every hook, handed to the APIs that emit events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_completed_producer: Vec<EventProducer<OrderCompletedEvent>>,
    pub order_refunded_producer: Vec<EventProducer<OrderRefundedEvent>>,
    pub purchase_queued_producer: Vec<EventProducer<PurchaseQueuedEvent>>,
    pub local_order_decided_producer: Vec<EventProducer<LocalOrderDecidedEvent>>,
    pub deposit_decided_producer: Vec<EventProducer<DepositDecidedEvent>>,
}

pub struct EventHandlers {
    pub on_order_completed: Option<EventHandler<OrderCompletedEvent>>,
    pub on_order_refunded: Option<EventHandler<OrderRefundedEvent>>,
    pub on_purchase_queued: Option<EventHandler<PurchaseQueuedEvent>>,
    pub on_local_order_decided: Option<EventHandler<LocalOrderDecidedEvent>>,
    pub on_deposit_decided: Option<EventHandler<DepositDecidedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_completed: hooks.on_order_completed.map(|f| EventHandler::new(buffer_size, f)),
            on_order_refunded: hooks.on_order_refunded.map(|f| EventHandler::new(buffer_size, f)),
            on_purchase_queued: hooks.on_purchase_queued.map(|f| EventHandler::new(buffer_size, f)),
            on_local_order_decided: hooks.on_local_order_decided.map(|f| EventHandler::new(buffer_size, f)),
            on_deposit_decided: hooks.on_deposit_decided.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_completed {
            result.order_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_refunded {
            result.order_refunded_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_purchase_queued {
            result.purchase_queued_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_local_order_decided {
            result.local_order_decided_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_deposit_decided {
            result.deposit_decided_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_completed {
            tokio::spawn(async move { handler.start_handler().await });
        }
        if let Some(handler) = self.on_order_refunded {
            tokio::spawn(async move { handler.start_handler().await });
        }
        if let Some(handler) = self.on_purchase_queued {
            tokio::spawn(async move { handler.start_handler().await });
        }
        if let Some(handler) = self.on_local_order_decided {
            tokio::spawn(async move { handler.start_handler().await });
        }
        if let Some(handler) = self.on_deposit_decided {
            tokio::spawn(async move { handler.start_handler().await });
        }
    }
}

type HookFn<E> = Option<Handler<E>>;

/// Builder for the notification hooks the chat layer wants to install.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_completed: HookFn<OrderCompletedEvent>,
    pub on_order_refunded: HookFn<OrderRefundedEvent>,
    pub on_purchase_queued: HookFn<PurchaseQueuedEvent>,
    pub on_local_order_decided: HookFn<LocalOrderDecidedEvent>,
    pub on_deposit_decided: HookFn<DepositDecidedEvent>,
}

impl EventHooks {
    pub fn on_order_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_completed = Some(Arc::new(f));
        self
    }

    pub fn on_order_refunded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderRefundedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_refunded = Some(Arc::new(f));
        self
    }

    pub fn on_purchase_queued<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PurchaseQueuedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_purchase_queued = Some(Arc::new(f));
        self
    }

    pub fn on_local_order_decided<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(LocalOrderDecidedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_local_order_decided = Some(Arc::new(f));
        self
    }

    pub fn on_deposit_decided<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DepositDecidedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_deposit_decided = Some(Arc::new(f));
        self
    }
}
