//! Wire layout shared by every restore request and reply.
//!
//! A message is its 4-byte little-endian file identifier followed by its
//! payload. Integers are little-endian, roles are their 4-byte tag and
//! identities are 16 bytes. Decoding checks the identifier first, so a message
//! of another type is rejected instead of being read as this one.

use std::fmt::Write;

use crate::{error::DecodeError, identity::ServerIdentity, role::RestoreRole};

pub type FileIdentifier = u32;

pub trait WireMessage: Sized {
    const FILE_IDENTIFIER: FileIdentifier;

    fn encode_payload(&self, writer: &mut WireWriter);

    fn decode_payload(reader: &mut WireReader<'_>) -> Result<Self, DecodeError>;

    fn encode(&self) -> Vec<u8> {
        let mut writer = WireWriter::default();
        writer.put_u32(Self::FILE_IDENTIFIER);
        self.encode_payload(&mut writer);
        writer.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = WireReader::new(bytes);
        let found = reader.get_u32()?;
        if found != Self::FILE_IDENTIFIER {
            return Err(DecodeError::UnexpectedFileIdentifier {
                expected: Self::FILE_IDENTIFIER,
                found,
            });
        }
        let message = Self::decode_payload(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }
}

/// Reads the identifier of an encoded message without decoding the rest.
#[cfg(test)]
pub(crate) fn peek_file_identifier(bytes: &[u8]) -> Result<FileIdentifier, DecodeError> {
    WireReader::new(bytes).get_u32()
}

#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_role(&mut self, role: RestoreRole) {
        self.put_u32(role.tag());
    }

    pub fn put_identity(&mut self, id: &ServerIdentity) {
        self.buf.extend_from_slice(&id.to_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let available = self.buf.len() - self.pos;
        if available < N {
            return Err(DecodeError::Truncated {
                needed: N,
                available,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    pub fn get_role(&mut self) -> Result<RestoreRole, DecodeError> {
        RestoreRole::from_tag(self.get_u32()?)
    }

    pub fn get_identity(&mut self) -> Result<ServerIdentity, DecodeError> {
        Ok(ServerIdentity::from_bytes(self.take()?))
    }

    pub fn finish(self) -> Result<(), DecodeError> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            rest => Err(DecodeError::TrailingBytes(rest)),
        }
    }
}

/// Hex dump of raw bytes in 4-byte groups, e.g. `0a0b0c0d 0e0f`.
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + bytes.len() / 4);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tag_is_fixed_width() {
        for role in RestoreRole::ALL {
            let mut writer = WireWriter::default();
            writer.put_role(role);
            let bytes = writer.into_bytes();
            assert_eq!(bytes.len(), 4);
            let mut reader = WireReader::new(&bytes);
            assert_eq!(reader.get_role(), Ok(role));
            assert_eq!(reader.finish(), Ok(()));
        }
    }

    #[test]
    fn out_of_range_role_tag_fails() {
        let bytes = 7u32.to_le_bytes();
        assert_eq!(
            WireReader::new(&bytes).get_role(),
            Err(DecodeError::UnknownRoleTag(7))
        );
    }

    #[test]
    fn truncated_and_trailing_input() {
        let mut reader = WireReader::new(&[1, 2, 3]);
        assert_eq!(
            reader.get_u32(),
            Err(DecodeError::Truncated {
                needed: 4,
                available: 3
            })
        );

        let mut reader = WireReader::new(&[1, 0, 0, 0, 9]);
        assert_eq!(reader.get_u32(), Ok(1));
        assert_eq!(reader.finish(), Err(DecodeError::TrailingBytes(1)));
    }

    #[test]
    fn hex_dump_groups_by_four() {
        assert_eq!(hex_string(&[]), "");
        assert_eq!(hex_string(&[0x0a, 0x0b, 0x0c]), "0a0b0c");
        assert_eq!(
            hex_string(&[0x00, 0x01, 0x02, 0x03, 0xff, 0x10]),
            "00010203 ff10"
        );
    }
}
