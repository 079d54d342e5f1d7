//! ** idgen module **
//! Namespaces and helpers for generating stable v5 uuids for authored entities.
//! Entities created at runtime (spawned, cloned) use v4 (random) UUIDs instead.
use uuid::Uuid;

pub const NAMESPACE_ENTITY: Uuid = uuid::uuid!("47d2aad8-22cc-4dd4-bf9f-b9eddc4fe2cf");

/// Generate a v5 UUID for an authored symbol (e.g. `"brass_lantern"`).
///
/// The same symbol always yields the same id, across runs and machines.
pub fn uuid_from_token(namespace: &Uuid, token: &str) -> Uuid {
    Uuid::new_v5(namespace, token.as_bytes())
}

/// A fresh random id for entities that don't come from authored content.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_ids_are_deterministic() {
        let a = uuid_from_token(&NAMESPACE_ENTITY, "lantern");
        let b = uuid_from_token(&NAMESPACE_ENTITY, "lantern");
        assert_eq!(a, b);
        assert_ne!(a, uuid_from_token(&NAMESPACE_ENTITY, "lamp"));
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
