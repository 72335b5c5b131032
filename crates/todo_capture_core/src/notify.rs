//! One-way push notifications toward a presentation surface.
//!
//! # Responsibility
//! - Define the two push events (`todo-added`, `prefill-todo`).
//! - Provide channel-backed and fan-out delivery targets.
//!
//! # Invariants
//! - Delivery is fire-and-forget; a gone receiver never fails the sender.
//! - Receivers must deduplicate `todo-added` by id, because the same todo
//!   also arrives in the response to the `add-todo` call that created it.

use crate::model::todo::Todo;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Push event sent to a registered presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum TodoEvent {
    /// A todo was created; carries the full record.
    TodoAdded(Todo),
    /// Captured text the user should confirm before it becomes a todo.
    PrefillTodo(String),
}

impl TodoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TodoAdded(_) => "todo-added",
            Self::PrefillTodo(_) => "prefill-todo",
        }
    }
}

/// Receiving end of push notifications.
pub trait NotificationTarget {
    fn deliver(&self, event: &TodoEvent);
}

/// Target that forwards events into an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelTarget {
    sender: Sender<TodoEvent>,
}

impl ChannelTarget {
    /// Creates a target plus the receiver the presentation loop drains.
    pub fn new() -> (Self, Receiver<TodoEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }

    pub fn from_sender(sender: Sender<TodoEvent>) -> Self {
        Self { sender }
    }
}

impl NotificationTarget for ChannelTarget {
    fn deliver(&self, event: &TodoEvent) {
        match self.sender.send(event.clone()) {
            Ok(()) => debug!("event=push module=notify status=ok name={}", event.name()),
            Err(_) => warn!(
                "event=push module=notify status=dropped name={} reason=receiver_closed",
                event.name()
            ),
        }
    }
}

/// Target that forwards every event to several subscribers in order.
#[derive(Default, Clone)]
pub struct FanoutTarget {
    targets: Vec<Arc<dyn NotificationTarget>>,
}

impl FanoutTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: Arc<dyn NotificationTarget>) {
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl NotificationTarget for FanoutTarget {
    fn deliver(&self, event: &TodoEvent) {
        for target in &self.targets {
            target.deliver(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelTarget, FanoutTarget, NotificationTarget, TodoEvent};
    use crate::model::todo::Todo;
    use std::sync::Arc;

    #[test]
    fn events_serialize_with_kebab_case_names() {
        let json = serde_json::to_value(TodoEvent::PrefillTodo("copy".to_string())).unwrap();
        assert_eq!(json["event"], "prefill-todo");
        assert_eq!(json["payload"], "copy");

        let todo = Todo::new("ship it");
        let json = serde_json::to_value(TodoEvent::TodoAdded(todo.clone())).unwrap();
        assert_eq!(json["event"], "todo-added");
        assert_eq!(json["payload"]["id"], todo.id.as_str());
    }

    #[test]
    fn channel_target_survives_dropped_receiver() {
        let (target, receiver) = ChannelTarget::new();
        drop(receiver);
        target.deliver(&TodoEvent::PrefillTodo("late".to_string()));
    }

    #[test]
    fn fanout_delivers_to_every_subscriber() {
        let (first, first_rx) = ChannelTarget::new();
        let (second, second_rx) = ChannelTarget::new();
        let mut fanout = FanoutTarget::new();
        fanout.push(Arc::new(first));
        fanout.push(Arc::new(second));
        assert_eq!(fanout.len(), 2);

        fanout.deliver(&TodoEvent::PrefillTodo("hello".to_string()));

        assert_eq!(
            first_rx.try_recv().unwrap(),
            TodoEvent::PrefillTodo("hello".to_string())
        );
        assert_eq!(
            second_rx.try_recv().unwrap(),
            TodoEvent::PrefillTodo("hello".to_string())
        );
    }
}
