//! The fixed set of restore participant roles.
//!
//! Roles travel on the wire as a 4-byte tag. [`RestoreRole::Invalid`] only
//! exists as the default and as the zero tag; no running participant holds it.

use std::fmt::{self, Display};

use crate::error::DecodeError;

/// Number of roles a participant can actually hold, `Invalid` excluded.
pub const NUM_ROLES: usize = 3;

const ROLE_NAMES: [&str; 4] = ["Invalid", "Master", "Loader", "Applier"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u32)]
pub enum RestoreRole {
    #[default]
    Invalid = 0,
    Master = 1,
    Loader = 2,
    Applier = 3,
}

impl RestoreRole {
    pub const ALL: [RestoreRole; 4] = [
        RestoreRole::Invalid,
        RestoreRole::Master,
        RestoreRole::Loader,
        RestoreRole::Applier,
    ];

    /// Roles a registered participant may hold, in tag order.
    pub const PARTICIPANTS: [RestoreRole; NUM_ROLES] =
        [RestoreRole::Master, RestoreRole::Loader, RestoreRole::Applier];

    pub const fn tag(self) -> u32 {
        self as u32
    }

    pub fn from_tag(tag: u32) -> Result<Self, DecodeError> {
        match tag {
            0 => Ok(RestoreRole::Invalid),
            1 => Ok(RestoreRole::Master),
            2 => Ok(RestoreRole::Loader),
            3 => Ok(RestoreRole::Applier),
            other => Err(DecodeError::UnknownRoleTag(other)),
        }
    }

    pub fn name(self) -> &'static str {
        ROLE_NAMES[self as usize]
    }

    pub fn is_participant(self) -> bool {
        self != RestoreRole::Invalid
    }

    /// Slot of the role in containers sized by [`NUM_ROLES`].
    pub fn participant_index(self) -> Option<usize> {
        (self as usize).checked_sub(1)
    }
}

impl TryFrom<u32> for RestoreRole {
    type Error = DecodeError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        RestoreRole::from_tag(tag)
    }
}

impl Display for RestoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn role_name(role: RestoreRole) -> &'static str {
    role.name()
}

/// Every role name, `Invalid` included, ordered by tag.
pub fn role_names() -> &'static [&'static str] {
    &ROLE_NAMES
}

/// Fixed-size container with one slot per participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerRole<T>([T; NUM_ROLES]);

impl<T> PerRole<T> {
    pub fn new(master: T, loader: T, applier: T) -> Self {
        PerRole([master, loader, applier])
    }

    pub fn get(&self, role: RestoreRole) -> Option<&T> {
        self.0.get(role.participant_index()?)
    }

    pub fn get_mut(&mut self, role: RestoreRole) -> Option<&mut T> {
        self.0.get_mut(role.participant_index()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RestoreRole, &T)> {
        RestoreRole::PARTICIPANTS.into_iter().zip(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tags_round_trip_and_reject_unknown() {
        for role in RestoreRole::ALL {
            assert_eq!(RestoreRole::from_tag(role.tag()), Ok(role));
        }
        for tag in [4, 5, 42, u32::MAX] {
            assert_eq!(
                RestoreRole::try_from(tag),
                Err(DecodeError::UnknownRoleTag(tag))
            );
        }
    }

    #[test]
    fn names_are_distinct_and_stable() {
        let names: HashSet<&str> = RestoreRole::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), RestoreRole::ALL.len());
        assert_eq!(RestoreRole::Loader.name(), role_name(RestoreRole::Loader));
        assert_eq!(RestoreRole::Applier.to_string(), "Applier");
        assert_eq!(role_names(), &["Invalid", "Master", "Loader", "Applier"]);
    }

    #[test]
    fn invalid_is_default_and_never_a_participant() {
        assert_eq!(RestoreRole::default(), RestoreRole::Invalid);
        assert!(!RestoreRole::Invalid.is_participant());
        assert_eq!(RestoreRole::Invalid.participant_index(), None);
        assert_eq!(RestoreRole::PARTICIPANTS.len(), NUM_ROLES);
        assert!(RestoreRole::PARTICIPANTS.iter().all(|r| r.is_participant()));
    }

    #[test]
    fn per_role_slots() {
        let mut sizes = PerRole::new(1, 8, 4);
        *sizes.get_mut(RestoreRole::Applier).unwrap() += 1;
        assert_eq!(sizes.get(RestoreRole::Loader), Some(&8));
        assert_eq!(sizes.get(RestoreRole::Applier), Some(&5));
        assert_eq!(sizes.get(RestoreRole::Invalid), None);
        let listed: Vec<_> = sizes.iter().map(|(role, n)| (role, *n)).collect();
        assert_eq!(
            listed,
            vec![
                (RestoreRole::Master, 1),
                (RestoreRole::Loader, 8),
                (RestoreRole::Applier, 5)
            ]
        );
    }
}
