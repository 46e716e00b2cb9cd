//! Topic keys

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of an event category: the type a subscriber list is keyed by.
///
/// Equality and hashing use the [`TypeId`] only; the type name is carried
/// along for diagnostics.
#[derive(Clone, Copy)]
pub struct TopicKey {
    id: TypeId,
    name: &'static str,
}

impl TopicKey {
    /// Key for `T`. Works for unsized types such as `dyn Trait`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TopicKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TopicKey {}

impl Hash for TopicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TopicKey").field(&self.name).finish()
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Dead {}
    struct PlayerDead;

    #[test]
    fn test_same_type_same_key() {
        assert_eq!(TopicKey::of::<dyn Dead>(), TopicKey::of::<dyn Dead>());
        assert_ne!(TopicKey::of::<dyn Dead>(), TopicKey::of::<PlayerDead>());
    }

    #[test]
    fn test_hash_by_type_id() {
        let mut keys = HashSet::new();
        keys.insert(TopicKey::of::<PlayerDead>());
        keys.insert(TopicKey::of::<PlayerDead>());
        keys.insert(TopicKey::of::<dyn Dead>());
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_display_uses_type_name() {
        let key = TopicKey::of::<PlayerDead>();
        assert!(key.to_string().ends_with("PlayerDead"));
        assert_eq!(key.type_id(), TypeId::of::<PlayerDead>());
    }
}
