use std::fmt::{self, Debug, Display};

use rand::Rng;

/// 128-bit identity of one participant process, fixed for its lifetime.
/// The all-zero value is reserved as "no identity".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ServerIdentity {
    first: u64,
    second: u64,
}

impl ServerIdentity {
    pub const fn new(first: u64, second: u64) -> Self {
        Self { first, second }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let id = Self::new(rng.random(), rng.random());
            if id.is_valid() {
                return id;
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.first != 0 || self.second != 0
    }

    pub fn first(&self) -> u64 {
        self.first
    }

    pub fn second(&self) -> u64 {
        self.second
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.first.to_le_bytes());
        bytes[8..].copy_from_slice(&self.second.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut first = [0u8; 8];
        let mut second = [0u8; 8];
        first.copy_from_slice(&bytes[..8]);
        second.copy_from_slice(&bytes[8..]);
        Self::new(u64::from_le_bytes(first), u64::from_le_bytes(second))
    }

    pub fn short_string(&self) -> String {
        format!("{:016x}", self.first)
    }
}

impl Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.first, self.second)
    }
}

impl Debug for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerIdentity({self})")
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn bytes_round_trip() {
        let id = ServerIdentity::new(0x0102_0304_0506_0708, u64::MAX - 1);
        let bytes = id.to_bytes();
        assert_eq!(bytes[0], 0x08);
        assert_eq!(ServerIdentity::from_bytes(bytes), id);
    }

    #[test]
    fn formatting() {
        let id = ServerIdentity::new(0xab, 0x1);
        assert_eq!(id.to_string(), "00000000000000ab0000000000000001");
        assert_eq!(id.short_string(), "00000000000000ab");
        assert_eq!(format!("{id:?}"), "ServerIdentity(00000000000000ab0000000000000001)");
    }

    #[test]
    fn random_identities_are_valid_and_seeded() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let left: Vec<_> = (0..16).map(|_| ServerIdentity::random(&mut a)).collect();
        let right: Vec<_> = (0..16).map(|_| ServerIdentity::random(&mut b)).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(ServerIdentity::is_valid));
        assert!(!ServerIdentity::default().is_valid());
    }
}
