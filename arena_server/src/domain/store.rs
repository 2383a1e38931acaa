// Sparse entity-component store.
//
// Entities are generational handles into an arena of slots. Every component
// kind lives in its own column indexed by slot, and each slot keeps a
// `ComponentSet` mask so queries are a set-membership test instead of a
// walk over every column.

use super::components::{BulletData, Expirable, ExplosionData, PlayerData};
use super::position::Position;
use std::collections::VecDeque;
use std::fmt;

/// Generational entity handle. A stale handle never resolves after its slot is recycled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Bit mask over the component kinds attached to one entity.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentSet(u8);

impl ComponentSet {
    pub const EMPTY: Self = Self(0);
    pub const POSITION: Self = Self(1 << 0);
    pub const PLAYER: Self = Self(1 << 1);
    pub const BULLET: Self = Self(1 << 2);
    pub const EXPLOSION: Self = Self(1 << 3);
    pub const EXPIRABLE: Self = Self(1 << 4);

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentSet({:#07b})", self.0)
    }
}

/// One column of optional component values, indexed by entity slot.
#[derive(Debug)]
pub struct Column<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Column<T> {
    fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize).and_then(Option::as_mut)
    }

    fn insert(&mut self, index: u32, value: T) -> Option<T> {
        let index = index as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index].replace(value)
    }

    fn take(&mut self, index: u32) -> Option<T> {
        self.slots.get_mut(index as usize).and_then(Option::take)
    }
}

/// Every component column the store knows about.
#[derive(Debug, Default)]
pub struct Columns {
    positions: Column<Position>,
    players: Column<PlayerData>,
    bullets: Column<BulletData>,
    explosions: Column<ExplosionData>,
    expirables: Column<Expirable>,
}

impl Columns {
    fn clear_slot(&mut self, index: u32) {
        self.positions.take(index);
        self.players.take(index);
        self.bullets.take(index);
        self.explosions.take(index);
        self.expirables.take(index);
    }
}

/// A value type that can be attached to an entity.
pub trait Component: Sized {
    const SET: ComponentSet;

    fn column(columns: &Columns) -> &Column<Self>;
    fn column_mut(columns: &mut Columns) -> &mut Column<Self>;
}

macro_rules! component {
    ($ty:ty, $set:expr, $field:ident) => {
        impl Component for $ty {
            const SET: ComponentSet = $set;

            fn column(columns: &Columns) -> &Column<Self> {
                &columns.$field
            }

            fn column_mut(columns: &mut Columns) -> &mut Column<Self> {
                &mut columns.$field
            }
        }
    };
}

component!(Position, ComponentSet::POSITION, positions);
component!(PlayerData, ComponentSet::PLAYER, players);
component!(BulletData, ComponentSet::BULLET, bullets);
component!(ExplosionData, ComponentSet::EXPLOSION, explosions);
component!(Expirable, ComponentSet::EXPIRABLE, expirables);

#[derive(Debug, Default)]
pub struct EntityStore {
    generations: Vec<u32>,
    // `None` marks a free slot.
    masks: Vec<Option<ComponentSet>>,
    free: VecDeque<u32>,
    columns: Columns,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an entity with no components. Recycled slots get a bumped generation.
    pub fn spawn(&mut self) -> Entity {
        if let Some(index) = self.free.pop_front() {
            self.masks[index as usize] = Some(ComponentSet::EMPTY);
            return Entity {
                index,
                generation: self.generations[index as usize],
            };
        }

        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.masks.push(Some(ComponentSet::EMPTY));
        Entity {
            index,
            generation: 0,
        }
    }

    /// Removes the entity and every attached component. Returns false for stale handles.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let index = entity.index;
        self.columns.clear_slot(index);
        self.masks[index as usize] = None;
        self.generations[index as usize] = self.generations[index as usize].wrapping_add(1);
        self.free.push_back(index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let index = entity.index as usize;
        matches!(self.masks.get(index), Some(Some(_))) && self.generations[index] == entity.generation
    }

    pub fn len(&self) -> usize {
        self.masks.iter().filter(|mask| mask.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attaches (or replaces) a component. Returns the previous value if there was one.
    ///
    /// Panics on a stale handle: attaching to a dead entity is a caller bug.
    pub fn insert<C: Component>(&mut self, entity: Entity, value: C) -> Option<C> {
        assert!(self.is_alive(entity), "insert on dead entity {entity:?}");
        let index = entity.index;
        if let Some(mask) = self.masks[index as usize].as_mut() {
            *mask = mask.with(C::SET);
        }
        C::column_mut(&mut self.columns).insert(index, value)
    }

    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        if !self.is_alive(entity) {
            return None;
        }
        let index = entity.index;
        if let Some(mask) = self.masks[index as usize].as_mut() {
            *mask = mask.without(C::SET);
        }
        C::column_mut(&mut self.columns).take(index)
    }

    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        if !self.is_alive(entity) {
            return None;
        }
        C::column(&self.columns).get(entity.index)
    }

    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        if !self.is_alive(entity) {
            return None;
        }
        C::column_mut(&mut self.columns).get_mut(entity.index)
    }

    pub fn components(&self, entity: Entity) -> Option<ComponentSet> {
        if !self.is_alive(entity) {
            return None;
        }
        self.masks[entity.index as usize]
    }

    pub fn has(&self, entity: Entity, set: ComponentSet) -> bool {
        self.components(entity)
            .is_some_and(|mask| mask.contains(set))
    }

    /// Entities carrying every component in `set`, in slot order.
    ///
    /// Collected eagerly so callers can mutate the store while walking the result.
    pub fn query(&self, set: ComponentSet) -> Vec<Entity> {
        self.masks
            .iter()
            .enumerate()
            .filter_map(|(index, mask)| match mask {
                Some(mask) if mask.contains(set) => Some(Entity {
                    index: index as u32,
                    generation: self.generations[index],
                }),
                _ => None,
            })
            .collect()
    }
}
