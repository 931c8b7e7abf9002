//! Static component predicates evaluated against entity bitmasks.

use super::component::{Component, ComponentKind, ComponentMask};

/// "All of" / "any of" / "none of" predicate over component kinds.
///
/// A query holds no results; [`EntityStore::query`](crate::EntityStore::query)
/// evaluates it against the current attach state on every call, so results
/// are never stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Query {
    all: ComponentMask,
    any: ComponentMask,
    none: ComponentMask,
}

impl Query {
    /// An empty predicate. Add at least one kind before running it.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            all: ComponentMask::EMPTY,
            any: ComponentMask::EMPTY,
            none: ComponentMask::EMPTY,
        }
    }

    /// Builds a predicate from kind lists.
    #[must_use]
    pub const fn from_kinds(all: &[ComponentKind], any: &[ComponentKind]) -> Self {
        Self {
            all: ComponentMask::of(all),
            any: ComponentMask::of(any),
            none: ComponentMask::EMPTY,
        }
    }

    /// Requires `C`.
    #[must_use]
    pub fn with<C: Component>(mut self) -> Self {
        self.all.insert(C::KIND);
        self
    }

    /// Requires at least one of the kinds added this way.
    #[must_use]
    pub fn with_any<C: Component>(mut self) -> Self {
        self.any.insert(C::KIND);
        self
    }

    /// Excludes entities holding `C`.
    #[must_use]
    pub fn without<C: Component>(mut self) -> Self {
        self.none.insert(C::KIND);
        self
    }

    /// False for a predicate that names no kind at all.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !(self.all.is_empty() && self.any.is_empty())
    }

    /// Evaluates the predicate against one mask.
    #[inline]
    #[must_use]
    pub const fn matches(&self, mask: ComponentMask) -> bool {
        mask.contains_all(self.all)
            && (self.any.is_empty() || mask.intersects(self.any))
            && !mask.intersects(self.none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{AiTag, Dead, Health, Position};

    #[test]
    fn test_all_any_none() {
        let query = Query::new()
            .with::<Position>()
            .with_any::<Health>()
            .with_any::<AiTag>()
            .without::<Dead>();

        let mut mask = ComponentMask::of(&[ComponentKind::Position]);
        assert!(!query.matches(mask));

        mask.insert(ComponentKind::AiTag);
        assert!(query.matches(mask));

        mask.insert(ComponentKind::Dead);
        assert!(!query.matches(mask));
    }

    #[test]
    fn test_empty_query_is_invalid() {
        assert!(!Query::new().is_valid());
        assert!(Query::from_kinds(&[], &[ComponentKind::Opaque]).is_valid());
    }
}
