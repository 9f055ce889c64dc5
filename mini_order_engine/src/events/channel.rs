//! Simple stateless pub-sub event handler
//!
//! Components of the engine publish events (an order was created, a membership was resolved, ...) and hooks subscribe
//! to them. The handlers are stateless: all they receive is the event itself. They may be async, and each event is
//! handled on its own task.
//!
//! Publishing never blocks the caller and never fails. If the buffer is full or the handler has gone away, the event is
//! dropped and the loss is logged. Notifications are best-effort.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::{mpsc, mpsc::error::TrySendError, Notify};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for in-flight handlers to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Without this, the channel would never close and the loop below would never end.
        drop(self.sender);
        let in_flight = Arc::new(AtomicI64::new(0));
        let all_done = Arc::new(Notify::new());
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            in_flight.fetch_add(1, Ordering::SeqCst);
            let in_flight = Arc::clone(&in_flight);
            let all_done = Arc::clone(&all_done);
            tokio::spawn(async move {
                (handler)(ev).await;
                if in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                    all_done.notify_one();
                }
                trace!("📬️ Event handled");
            });
        }
        while in_flight.load(Ordering::SeqCst) > 0 {
            debug!("📬️ Waiting for {} jobs to complete", in_flight.load(Ordering::SeqCst));
            all_done.notified().await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub fn publish_event(&self, event: E) {
        match self.sender.try_send(event) {
            Ok(()) => {},
            Err(TrySendError::Full(_)) => warn!("📬️ Event buffer is full. The event has been dropped"),
            Err(TrySendError::Closed(_)) => error!("📬️ Event handler has shut down. The event has been dropped"),
        }
    }
}
