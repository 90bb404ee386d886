mod message;
mod sim_message;

pub use message::Message;
pub use message::MessagePtr;
pub(crate) use message::ProcessStep;
pub(crate) use message::RoutedMessage;
pub(crate) use message::TimePriorityMessageQueue;
pub(crate) use sim_message::SimMessage;
