//! Identifiers and simple allocators for counter targets and subscriptions.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

/// Hands out ids in registration order, starting at zero.
///
/// The engine relies on target ids matching their slot in its target list.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_target: u32,
    next_subscription: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_target(&mut self) -> TargetId {
        let id = TargetId(self.next_target);
        self.next_target = self.next_target.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_subscription(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.wrapping_add(1);
        id
    }
}
