use std::fmt::{self, Display};

use crate::{
    error::DecodeError,
    identity::ServerIdentity,
    role::RestoreRole,
    wire::{FileIdentifier, WireMessage, WireReader, WireWriter},
};

/// Anything a handler sends back: at least the identity of the responder.
pub trait ReplyEnvelope: Clone + 'static {
    fn sender(&self) -> ServerIdentity;
}

/// The minimal reply, naming the participant that answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RestoreCommonReply {
    pub id: ServerIdentity,
}

impl RestoreCommonReply {
    pub fn new(id: ServerIdentity) -> Self {
        Self { id }
    }
}

impl ReplyEnvelope for RestoreCommonReply {
    fn sender(&self) -> ServerIdentity {
        self.id
    }
}

impl WireMessage for RestoreCommonReply {
    const FILE_IDENTIFIER: FileIdentifier = 56140435;

    fn encode_payload(&self, writer: &mut WireWriter) {
        writer.put_identity(&self.id);
    }

    fn decode_payload(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self::new(reader.get_identity()?))
    }
}

impl Display for RestoreCommonReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerNodeID:{}", self.id)
    }
}

/// Reply to a role query: the common envelope plus the role the responder
/// runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RestoreRoleReply {
    pub common: RestoreCommonReply,
    pub role: RestoreRole,
}

impl RestoreRoleReply {
    pub fn new(id: ServerIdentity, role: RestoreRole) -> Self {
        Self {
            common: RestoreCommonReply::new(id),
            role,
        }
    }
}

impl ReplyEnvelope for RestoreRoleReply {
    fn sender(&self) -> ServerIdentity {
        self.common.id
    }
}

impl WireMessage for RestoreRoleReply {
    const FILE_IDENTIFIER: FileIdentifier = 63782112;

    fn encode_payload(&self, writer: &mut WireWriter) {
        self.common.encode_payload(writer);
        writer.put_role(self.role);
    }

    fn decode_payload(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let common = RestoreCommonReply::decode_payload(reader)?;
        let role = reader.get_role()?;
        Ok(Self { common, role })
    }
}

impl Display for RestoreRoleReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Role:{}", self.common, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::hex_string;

    #[test]
    fn common_reply_layout() {
        let reply = RestoreCommonReply::new(ServerIdentity::new(1, 2));
        let bytes = reply.encode();
        assert_eq!(bytes.len(), 4 + 16);
        assert_eq!(&bytes[..4], &56140435u32.to_le_bytes());
        assert_eq!(
            hex_string(&bytes[4..]),
            "01000000 00000000 02000000 00000000"
        );
        assert_eq!(RestoreCommonReply::decode(&bytes), Ok(reply));
        assert_eq!(reply.to_string(), format!("ServerNodeID:{}", reply.id));
    }

    #[test]
    fn replies_do_not_decode_as_each_other() {
        let common = RestoreCommonReply::new(ServerIdentity::new(3, 4)).encode();
        assert_eq!(
            RestoreRoleReply::decode(&common),
            Err(DecodeError::UnexpectedFileIdentifier {
                expected: RestoreRoleReply::FILE_IDENTIFIER,
                found: RestoreCommonReply::FILE_IDENTIFIER,
            })
        );
    }

    #[test]
    fn role_reply_with_bad_role_tag_fails() {
        let mut bytes =
            RestoreRoleReply::new(ServerIdentity::new(3, 4), RestoreRole::Loader).encode();
        let tag_at = bytes.len() - 4;
        bytes[tag_at..].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(
            RestoreRoleReply::decode(&bytes),
            Err(DecodeError::UnknownRoleTag(9))
        );
    }

    #[test]
    fn role_reply_carries_common_sender() {
        let id = ServerIdentity::new(5, 6);
        let reply = RestoreRoleReply::new(id, RestoreRole::Applier);
        assert_eq!(reply.sender(), id);
        assert_eq!(RestoreRoleReply::decode(&reply.encode()), Ok(reply));
        assert!(reply.to_string().ends_with("Role:Applier"));
    }
}
