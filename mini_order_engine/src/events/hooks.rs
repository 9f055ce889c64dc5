use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    MembershipUpdatedEvent,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    VerificationCodeIssuedEvent,
};

type BoxedHookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The publishing ends of every configured hook. Cheap to clone; the APIs each hold a copy.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub membership_updated_producer: Vec<EventProducer<MembershipUpdatedEvent>>,
    pub verification_code_producer: Vec<EventProducer<VerificationCodeIssuedEvent>>,
}

fn publish<E: Clone + Send + Sync>(producers: &[EventProducer<E>], event: E) {
    for producer in producers {
        producer.publish_event(event.clone());
    }
}

impl EventProducers {
    pub fn publish_order_created(&self, event: OrderCreatedEvent) {
        publish(&self.order_created_producer, event);
    }

    pub fn publish_order_status_changed(&self, event: OrderStatusChangedEvent) {
        publish(&self.order_status_changed_producer, event);
    }

    pub fn publish_membership_updated(&self, event: MembershipUpdatedEvent) {
        publish(&self.membership_updated_producer, event);
    }

    pub fn publish_verification_code(&self, event: VerificationCodeIssuedEvent) {
        publish(&self.verification_code_producer, event);
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_membership_updated: Option<EventHandler<MembershipUpdatedEvent>>,
    pub on_verification_code: Option<EventHandler<VerificationCodeIssuedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_created: hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f)),
            on_order_status_changed: hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f)),
            on_membership_updated: hooks.on_membership_updated.map(|f| EventHandler::new(buffer_size, f)),
            on_verification_code: hooks.on_verification_code.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_membership_updated {
            result.membership_updated_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_verification_code {
            result.verification_code_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for every configured handler. Each one ends once all of its producers have been dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_membership_updated {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_verification_code {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_membership_updated: Option<Handler<MembershipUpdatedEvent>>,
    pub on_verification_code: Option<Handler<VerificationCodeIssuedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_membership_updated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MembershipUpdatedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_membership_updated = Some(Arc::new(f));
        self
    }

    pub fn on_verification_code<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(VerificationCodeIssuedEvent) -> BoxedHookFuture) + Send + Sync + 'static {
        self.on_verification_code = Some(Arc::new(f));
        self
    }
}
