use crate::domain::components::Expirable;
use crate::domain::store::{ComponentSet, EntityStore};
use std::time::Duration;

/// Removes every entity whose deadline has been reached, whatever else it carries.
pub fn sweep_expired(store: &mut EntityStore, now: Duration) -> usize {
    let expired: Vec<_> = store
        .query(ComponentSet::EXPIRABLE)
        .into_iter()
        .filter(|entity| {
            store
                .get::<Expirable>(*entity)
                .is_some_and(|tag| tag.is_expired(now))
        })
        .collect();

    for entity in &expired {
        store.despawn(*entity);
    }
    expired.len()
}
