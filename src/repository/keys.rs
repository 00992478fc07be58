//! Key derivation for the single-table layout.
//!
//! Four key shapes cover every access pattern:
//!
//! - canonical record: `<Entity>#<id>` / `DETAILS`
//! - global listing: `<Entity>` / `DETAILS#<created_at>#<id>`
//! - owner listing: `<Owner>#<owner_id>` / `<Entity>#<created_at>#<id>`
//! - uniqueness lookup: `<Entity>` / `<Attribute>#<value>`
//!
//! `created_at` is embedded as raw epoch milliseconds; at thirteen digits its
//! lexicographic order matches numeric order, so listings come back oldest first.

use crate::store::ItemKey;

/// Sort key of every canonical record.
pub const DETAILS: &str = "DETAILS";

/// Lookup attribute under which user emails claim uniqueness.
pub const EMAIL: &str = "EMAIL";

/// Key builder for one entity family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyScheme {
    prefix: &'static str,
}

impl KeyScheme {
    pub const USER: Self = Self { prefix: "USER" };
    pub const PROJECT: Self = Self { prefix: "PROJECT" };
    pub const DEPARTMENT: Self = Self { prefix: "DEPARTMENT" };
    pub const EXPENSE: Self = Self { prefix: "EXPENSE" };
    pub const ADVANCE: Self = Self { prefix: "ADVANCE" };
    pub const IMAGE: Self = Self { prefix: "IMAGE" };

    /// Key of the canonical record.
    #[must_use]
    pub fn canonical(self, id: &str) -> ItemKey {
        ItemKey::new(format!("{}#{id}", self.prefix), DETAILS)
    }

    /// Key of the global listing copy.
    #[must_use]
    pub fn listing(self, created_at: i64, id: &str) -> ItemKey {
        ItemKey::new(self.prefix, format!("{DETAILS}#{created_at}#{id}"))
    }

    /// Partition holding the global listing and any lookup items.
    #[must_use]
    pub fn listing_partition(self) -> String {
        self.prefix.to_string()
    }

    /// Sort prefix selecting only listing copies within [`Self::listing_partition`].
    /// Lookup items share the partition, so queries must not drop this.
    #[must_use]
    pub fn listing_sort_prefix(self) -> String {
        format!("{DETAILS}#")
    }

    /// Key of a uniqueness lookup copy, e.g. a user email.
    #[must_use]
    pub fn lookup(self, attribute: &str, value: &str) -> ItemKey {
        ItemKey::new(self.prefix, format!("{attribute}#{value}"))
    }

    /// Key of the copy scoped under an owning entity.
    #[must_use]
    pub fn owned(self, owner: KeyScheme, owner_id: &str, created_at: i64, id: &str) -> ItemKey {
        ItemKey::new(
            owner.owner_partition(owner_id),
            format!("{}#{created_at}#{id}", self.prefix),
        )
    }

    /// Partition holding everything scoped under one owner.
    #[must_use]
    pub fn owner_partition(self, owner_id: &str) -> String {
        format!("{}#{owner_id}", self.prefix)
    }

    /// Sort prefix selecting this entity's copies within an owner partition.
    #[must_use]
    pub fn owned_sort_prefix(self) -> String {
        format!("{}#", self.prefix)
    }
}
