use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Membership, MembershipStatus, Order, OrderDetail, OrderStatusType};

/// A message for a single user. How it reaches them (websocket, push, email) is up to the hook that receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: i64,
    pub message: String,
}

impl Notification {
    pub fn new<S: Into<String>>(user_id: i64, message: S) -> Self {
        Self { user_id, message: message.into() }
    }

    /// The name of the delivery channel (room) for this notification's recipient.
    pub fn channel(&self) -> String {
        user_channel(self.user_id)
    }
}

pub fn user_channel(user_id: i64) -> String {
    format!("user_{user_id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCreatedEvent {
    pub order: OrderDetail,
}

impl OrderCreatedEvent {
    pub fn new(order: OrderDetail) -> Self {
        Self { order }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        let order = &self.order;
        vec![Notification::new(
            order.store_owner_id,
            format!("New order {} from {} for {}", order.order.id, order.buyer_name, order.order.total_price),
        )]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType) -> Self {
        Self { order, old_status }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        vec![Notification::new(
            self.order.buyer_id,
            format!("Your order {} status has been updated to {}", self.order.id, self.order.status),
        )]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipUpdatedEvent {
    pub membership: Membership,
    pub store_owner_id: i64,
}

impl MembershipUpdatedEvent {
    pub fn new(membership: Membership, store_owner_id: i64) -> Self {
        Self { membership, store_owner_id }
    }

    /// One notification for the requester and one for the store owner.
    pub fn notifications(&self) -> Vec<Notification> {
        let m = &self.membership;
        let (requester, owner) = match m.status {
            MembershipStatus::Accepted => ("accepted", format!("User {} has joined your store", m.user_id)),
            MembershipStatus::Rejected => ("rejected", format!("User {} has been rejected from your store", m.user_id)),
            MembershipStatus::Pending => return Vec::new(),
        };
        vec![
            Notification::new(m.user_id, format!("Your request to join store {} was {requester}", m.store_id)),
            Notification::new(self.store_owner_id, owner),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPurpose {
    Registration,
    PasswordReset,
}

impl Display for VerificationPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationPurpose::Registration => f.write_str("registration"),
            VerificationPurpose::PasswordReset => f.write_str("password reset"),
        }
    }
}

/// Emitted when a verification code is issued. The hook is responsible for delivering the code to the address.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCodeIssuedEvent {
    pub email: String,
    pub code: String,
    pub purpose: VerificationPurpose,
}

impl std::fmt::Debug for VerificationCodeIssuedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationCodeIssuedEvent")
            .field("email", &self.email)
            .field("code", &"******")
            .field("purpose", &self.purpose)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    MembershipUpdated(MembershipUpdatedEvent),
}

impl EventType {
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            EventType::OrderCreated(ev) => ev.notifications(),
            EventType::OrderStatusChanged(ev) => ev.notifications(),
            EventType::MembershipUpdated(ev) => ev.notifications(),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::Cents;

    fn membership(status: MembershipStatus) -> Membership {
        Membership { id: 1, user_id: 7, store_id: 3, status, created_at: Utc::now(), updated_at: Utc::now() }
    }

    #[test]
    fn membership_notifications() {
        let ev = MembershipUpdatedEvent::new(membership(MembershipStatus::Accepted), 2);
        let n = ev.notifications();
        assert_eq!(n.len(), 2);
        assert_eq!(n[0], Notification::new(7, "Your request to join store 3 was accepted"));
        assert_eq!(n[1], Notification::new(2, "User 7 has joined your store"));
        assert_eq!(n[1].channel(), "user_2");

        let ev = MembershipUpdatedEvent::new(membership(MembershipStatus::Rejected), 2);
        let n = EventType::MembershipUpdated(ev).notifications();
        assert_eq!(n[0].message, "Your request to join store 3 was rejected");
        assert_eq!(n[1].message, "User 7 has been rejected from your store");

        assert!(MembershipUpdatedEvent::new(membership(MembershipStatus::Pending), 2).notifications().is_empty());
    }

    #[test]
    fn status_change_notification() {
        let order = Order {
            id: 12,
            buyer_id: 5,
            store_id: 1,
            total_price: Cents::from(6000),
            status: OrderStatusType::Completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let n = OrderStatusChangedEvent::new(order, OrderStatusType::Pending).notifications();
        assert_eq!(n, vec![Notification::new(5, "Your order 12 status has been updated to completed")]);
    }

    #[test]
    fn codes_are_not_printed() {
        let ev = VerificationCodeIssuedEvent {
            email: "a@b.c".into(),
            code: "123456".into(),
            purpose: VerificationPurpose::Registration,
        };
        assert!(!format!("{ev:?}").contains("123456"));
    }
}
