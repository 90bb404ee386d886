use crate::{MessagePtr, TimerId};

pub(crate) enum SimMessage {
    NetworkMessage(MessagePtr),
    Timer(TimerId),
}
