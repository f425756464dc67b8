//! Order relay queue - the cashier-side order lifecycle.
//!
//! Holds customer orders in arrival order until the cashier forwards them to
//! the kitchen or cancels them:
//!
//! ```text
//! inbound frame ──decode──► queued ──forward──► kitchen (removed)
//!                              │
//!                              └──cancel──► discarded (removed)
//! ```
//!
//! Every queued order gets a stable [`OrderId`]. Operator actions name a
//! position in the [`QueueView`] that was last rendered, so an order that
//! arrives between render and action can never shift the target.

use chrono::{DateTime, Utc};
use stall_common::{decode_frame, encode, Frame, Order, ProtocolError};
use stall_link::{LinkError, OrderSink};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned for operator actions.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no order at position {0}")]
    IndexOutOfRange(usize),

    #[error("not connected")]
    NotConnected,

    #[error("failed to encode order: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("failed to send order: {0}")]
    Link(LinkError),
}

impl From<LinkError> for RelayError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::NotConnected => RelayError::NotConnected,
            other => RelayError::Link(other),
        }
    }
}

/// Stable identifier of a queued order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(u64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An order waiting for the cashier.
#[derive(Debug, Clone)]
pub struct QueuedOrder {
    pub id: OrderId,
    pub order: Order,
    pub received_at: DateTime<Utc>,
}

/// What happened to an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    /// Added to the queue.
    Enqueued(OrderId),
    /// Already forwarded by a cashier; not for this queue.
    Discarded,
    /// Could not be decoded.
    Dropped,
}

/// Snapshot of queue order as shown to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueView {
    ids: Vec<OrderId>,
}

impl QueueView {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Order shown at `index`.
    pub fn get(&self, index: usize) -> Option<OrderId> {
        self.ids.get(index).copied()
    }
}

/// FIFO of orders awaiting a cashier decision.
#[derive(Debug)]
pub struct RelayQueue {
    entries: Vec<QueuedOrder>,
    next_id: u64,
}

impl Default for RelayQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayQueue {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued orders in display order.
    pub fn entries(&self) -> &[QueuedOrder] {
        &self.entries
    }

    pub fn get(&self, id: OrderId) -> Option<&QueuedOrder> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Snapshot of the current display order.
    pub fn view(&self) -> QueueView {
        QueueView {
            ids: self.entries.iter().map(|e| e.id).collect(),
        }
    }

    /// Handle one inbound frame.
    ///
    /// Undecodable frames and orders already forwarded by a cashier never
    /// reach the queue.
    pub fn on_frame(&mut self, frame: &Frame) -> Intake {
        let order = match decode_frame(frame) {
            Ok(order) => order,
            Err(e) => {
                warn!("Dropping inbound message: {e}");
                return Intake::Dropped;
            }
        };

        if order.forwarded {
            debug!("Discarding forwarded order for {}", order.customer_name);
            return Intake::Discarded;
        }

        Intake::Enqueued(self.push(order))
    }

    /// Append an order and return its id.
    pub fn push(&mut self, order: Order) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;

        info!(
            id = %id,
            customer = %order.customer_name,
            items = order.items.len(),
            "Order received"
        );
        self.entries.push(QueuedOrder {
            id,
            order,
            received_at: Utc::now(),
        });
        id
    }

    /// Position of the order shown at `index` in `view`, if still queued.
    fn resolve(&self, view: &QueueView, index: usize) -> Result<usize, RelayError> {
        let id = view.get(index).ok_or(RelayError::IndexOutOfRange(index))?;
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(RelayError::IndexOutOfRange(index))
    }

    /// Send the order shown at `index` to the kitchen and remove it.
    ///
    /// The kitchen copy carries no total and is marked as forwarded. If the
    /// send fails the order stays queued.
    pub fn forward_to_kitchen<S>(
        &mut self,
        view: &QueueView,
        index: usize,
        sink: &mut S,
    ) -> Result<QueuedOrder, RelayError>
    where
        S: OrderSink + ?Sized,
    {
        let pos = self.resolve(view, index)?;
        let payload = encode(&self.entries[pos].order.for_kitchen())?;
        sink.send_text(payload)?;

        let entry = self.entries.remove(pos);
        info!(id = %entry.id, customer = %entry.order.customer_name, "Order forwarded to kitchen");
        Ok(entry)
    }

    /// Drop the order shown at `index` without telling anyone.
    pub fn cancel(&mut self, view: &QueueView, index: usize) -> Result<QueuedOrder, RelayError> {
        let pos = self.resolve(view, index)?;
        let entry = self.entries.remove(pos);
        info!(id = %entry.id, customer = %entry.order.customer_name, "Order cancelled");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stall_common::{LineItem, Money};

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<String>,
        offline: bool,
    }

    impl OrderSink for RecordingSink {
        fn send_text(&mut self, text: String) -> Result<(), LinkError> {
            if self.offline {
                return Err(LinkError::NotConnected);
            }
            self.sent.push(text);
            Ok(())
        }
    }

    fn order_frame(name: &str, total: &str) -> Frame {
        Frame::Text(format!(
            r#"{{"Nome":"{name}","Produtos":[{{"flavor":"Jerry","ingredients":""}}],"Total":"{total}"}}"#
        ))
    }

    #[test]
    fn test_enqueue_in_arrival_order() {
        let mut queue = RelayQueue::new();
        let a = queue.on_frame(&order_frame("Ana", "8.00"));
        let b = queue.on_frame(&order_frame("Bia", "10.00"));

        assert!(matches!(a, Intake::Enqueued(_)));
        assert!(matches!(b, Intake::Enqueued(_)));
        let names: Vec<&str> = queue
            .entries()
            .iter()
            .map(|e| e.order.customer_name.as_str())
            .collect();
        assert_eq!(names, vec!["Ana", "Bia"]);
        assert_eq!(queue.entries()[0].order.total, Some(Money::from_cents(800)));
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut queue = RelayQueue::new();
        let first = queue.push(Order::new("Ana", vec![LineItem::plain("Jerry")], Money::ZERO));
        let second = queue.push(Order::new("Bia", vec![LineItem::plain("Jerry")], Money::ZERO));
        assert!(first < second);
    }

    #[test]
    fn test_forwarded_frames_are_discarded() {
        let mut queue = RelayQueue::new();
        let frame = Frame::Text(
            r#"{"Nome":"Ana","Produtos":[{"flavor":"Jerry","ingredients":""}],"forwardedToCozinha":true}"#
                .to_string(),
        );
        assert_eq!(queue.on_frame(&frame), Intake::Discarded);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let mut queue = RelayQueue::new();
        assert_eq!(queue.on_frame(&Frame::Text(r#"{"Nome":"Ana","Prod"#.into())), Intake::Dropped);
        assert_eq!(queue.on_frame(&Frame::Text("hello".into())), Intake::Dropped);
        assert_eq!(queue.on_frame(&Frame::Binary(vec![0xc3, 0x28])), Intake::Dropped);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_oversized_total_is_dropped() {
        let mut queue = RelayQueue::new();
        let frame = Frame::Text(
            r#"{"Nome":"Ana","Produtos":[{"flavor":"Jerry","ingredients":""}],"Total":"79228162514264337593543950335"}"#
                .to_string(),
        );
        assert_eq!(queue.on_frame(&frame), Intake::Dropped);
        assert!(queue.is_empty());

        assert!(matches!(
            queue.on_frame(&order_frame("Bia", "8.00")),
            Intake::Enqueued(_)
        ));
    }

    #[test]
    fn test_binary_frames_are_decoded() {
        let mut queue = RelayQueue::new();
        let Frame::Text(text) = order_frame("Ana", "8.00") else {
            unreachable!()
        };
        assert!(matches!(
            queue.on_frame(&Frame::Binary(text.into_bytes())),
            Intake::Enqueued(_)
        ));
    }

    #[test]
    fn test_forward_strips_total_and_marks() {
        let mut queue = RelayQueue::new();
        queue.on_frame(&order_frame("Ana", "10.00"));
        let mut sink = RecordingSink::default();

        let view = queue.view();
        let entry = queue.forward_to_kitchen(&view, 0, &mut sink).unwrap();
        assert_eq!(entry.order.customer_name, "Ana");
        assert!(queue.is_empty());

        let sent: serde_json::Value = serde_json::from_str(&sink.sent[0]).unwrap();
        assert_eq!(sent["Nome"], "Ana");
        assert_eq!(sent["forwardedToCozinha"], true);
        assert!(sent.get("Total").is_none());
    }

    #[test]
    fn test_forwarded_copy_loops_back_to_nothing() {
        let mut queue = RelayQueue::new();
        queue.on_frame(&order_frame("Ana", "10.00"));
        let mut sink = RecordingSink::default();
        let view = queue.view();
        queue.forward_to_kitchen(&view, 0, &mut sink).unwrap();

        let echoed = Frame::Text(sink.sent.remove(0));
        assert_eq!(queue.on_frame(&echoed), Intake::Discarded);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_forward_when_offline_keeps_order() {
        let mut queue = RelayQueue::new();
        queue.on_frame(&order_frame("Ana", "10.00"));
        let mut sink = RecordingSink {
            offline: true,
            ..Default::default()
        };

        let view = queue.view();
        assert!(matches!(
            queue.forward_to_kitchen(&view, 0, &mut sink),
            Err(RelayError::NotConnected)
        ));
        assert_eq!(queue.len(), 1);

        sink.offline = false;
        assert!(queue.forward_to_kitchen(&view, 0, &mut sink).is_ok());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_forward_out_of_range() {
        let mut queue = RelayQueue::new();
        let mut sink = RecordingSink::default();
        let view = queue.view();
        assert!(matches!(
            queue.forward_to_kitchen(&view, 0, &mut sink),
            Err(RelayError::IndexOutOfRange(0))
        ));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_cancel_has_no_network_effect() {
        let mut queue = RelayQueue::new();
        queue.on_frame(&order_frame("Ana", "8.00"));
        queue.on_frame(&order_frame("Bia", "8.00"));

        let view = queue.view();
        let cancelled = queue.cancel(&view, 0).unwrap();
        assert_eq!(cancelled.order.customer_name, "Ana");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.entries()[0].order.customer_name, "Bia");
    }

    #[test]
    fn test_repeated_actions_fail_idempotently() {
        let mut queue = RelayQueue::new();
        queue.on_frame(&order_frame("Ana", "8.00"));
        queue.on_frame(&order_frame("Bia", "8.00"));
        let mut sink = RecordingSink::default();

        let view = queue.view();
        queue.cancel(&view, 0).unwrap();
        assert!(matches!(queue.cancel(&view, 0), Err(RelayError::IndexOutOfRange(0))));
        assert!(matches!(
            queue.forward_to_kitchen(&view, 0, &mut sink),
            Err(RelayError::IndexOutOfRange(0))
        ));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.entries()[0].order.customer_name, "Bia");
        assert!(sink.sent.is_empty());

        queue.forward_to_kitchen(&view, 1, &mut sink).unwrap();
        assert!(matches!(
            queue.forward_to_kitchen(&view, 1, &mut sink),
            Err(RelayError::IndexOutOfRange(1))
        ));
        assert_eq!(sink.sent.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_arrival_after_render_does_not_shift_target() {
        let mut queue = RelayQueue::new();
        queue.on_frame(&order_frame("Ana", "8.00"));
        queue.on_frame(&order_frame("Bia", "8.00"));
        let view = queue.view();

        // Ana is cancelled elsewhere and Caio arrives before the operator acts.
        let fresh = queue.view();
        queue.cancel(&fresh, 0).unwrap();
        queue.on_frame(&order_frame("Caio", "8.00"));

        let mut sink = RecordingSink::default();
        let entry = queue.forward_to_kitchen(&view, 1, &mut sink).unwrap();
        assert_eq!(entry.order.customer_name, "Bia");
        assert_eq!(queue.entries()[0].order.customer_name, "Caio");
    }
}
