//! Messages exchanged between simulated processes.
//!
//! Any `'static` type becomes a message by implementing [`Message`]. The
//! network shares one allocation between the sender and every holder, so
//! handlers receive a [`MessagePtr`] and downcast it to the concrete type they
//! expect.

use std::{any::Any, cmp::Reverse, collections::BinaryHeap, rc::Rc};

use crate::{process::ProcessId, time::Jiffies};

/// Marker trait for everything that can travel through the simulated network.
///
/// ```rust
/// use restsim::Message;
///
/// struct Heartbeat;
///
/// impl Message for Heartbeat {}
/// ```
pub trait Message: Any {}

/// Shared, type-erased handle to a delivered message.
///
/// ```rust
/// use restsim::{Message, MessagePtr};
///
/// struct Ping(u32);
/// struct Pong(u32);
///
/// impl Message for Ping {}
/// impl Message for Pong {}
///
/// fn handle(message: MessagePtr) {
///     if let Some(ping) = message.try_as::<Ping>() {
///         println!("ping {}", ping.0);
///     } else if message.is::<Pong>() {
///         println!("pong {}", message.as_type::<Pong>().0);
///     }
/// }
/// ```
pub struct MessagePtr(pub Rc<dyn Message>);

impl MessagePtr {
    /// Returns the message as `T`, or `None` when it carries another type.
    pub fn try_as<T: 'static>(&self) -> Option<Rc<T>> {
        match (self.0.clone() as Rc<dyn Any>).downcast::<T>() {
            Err(_) => None,
            Ok(m) => Some(m),
        }
    }

    /// Checks the concrete type without extracting it.
    pub fn is<T: 'static>(&self) -> bool {
        (self.0.clone() as Rc<dyn Any>).is::<T>()
    }

    /// Casts the message to `T`.
    ///
    /// # Panics
    ///
    /// Panics if the message is not a `T`. Use [`MessagePtr::try_as`] when the
    /// type is not known in advance.
    pub fn as_type<T: 'static>(self) -> Rc<T> {
        (self.0 as Rc<dyn Any>)
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("Message is not a {}", std::any::type_name::<T>()))
    }
}

#[derive(Clone)]
pub(crate) struct ProcessStep {
    pub(crate) source: ProcessId,
    pub(crate) dest: ProcessId,
    pub(crate) message: Rc<dyn Message>,
}

#[derive(Clone)]
pub(crate) struct RoutedMessage {
    pub(crate) arrival_time: Jiffies,
    // Submission order, breaks ties between equal arrival times
    pub(crate) sequence: u64,
    pub(crate) step: ProcessStep,
}

impl RoutedMessage {
    fn key(&self) -> (Jiffies, u64) {
        (self.arrival_time, self.sequence)
    }
}

impl PartialEq for RoutedMessage {
    fn eq(&self, other: &Self) -> bool {
        self.key().eq(&other.key())
    }
}

impl Eq for RoutedMessage {}

impl PartialOrd for RoutedMessage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoutedMessage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

pub(crate) type TimePriorityMessageQueue = BinaryHeap<Reverse<RoutedMessage>>;
