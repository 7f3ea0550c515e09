//! Secondary index slots.
//!
//! The table schema fixes twenty global secondary index slots, `GSI1` through
//! `GSI20`. Each slot stores its keys in `<slot>PK` / `<slot>SK`. A facet maps
//! the slots it uses to an [`IndexDescriptor`] once, at construction time.

use std::fmt;
use std::str::FromStr;

use crate::error::FacetError;
use crate::key::KeyConfiguration;

/// One of the fixed secondary index slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum IndexSlot {
    Gsi1 = 1,
    Gsi2,
    Gsi3,
    Gsi4,
    Gsi5,
    Gsi6,
    Gsi7,
    Gsi8,
    Gsi9,
    Gsi10,
    Gsi11,
    Gsi12,
    Gsi13,
    Gsi14,
    Gsi15,
    Gsi16,
    Gsi17,
    Gsi18,
    Gsi19,
    Gsi20,
}

impl IndexSlot {
    /// Every slot, in ordinal order.
    pub const ALL: [Self; 20] = [
        Self::Gsi1,
        Self::Gsi2,
        Self::Gsi3,
        Self::Gsi4,
        Self::Gsi5,
        Self::Gsi6,
        Self::Gsi7,
        Self::Gsi8,
        Self::Gsi9,
        Self::Gsi10,
        Self::Gsi11,
        Self::Gsi12,
        Self::Gsi13,
        Self::Gsi14,
        Self::Gsi15,
        Self::Gsi16,
        Self::Gsi17,
        Self::Gsi18,
        Self::Gsi19,
        Self::Gsi20,
    ];

    /// The slot number, 1 through 20.
    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The slot from its number.
    #[must_use]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal).checked_sub(1)?).copied()
    }

    /// The index name in the table schema, e.g. `GSI3`.
    #[must_use]
    pub fn name(self) -> String {
        format!("GSI{}", self.ordinal())
    }

    /// The partition key attribute, e.g. `GSI3PK`.
    #[must_use]
    pub fn partition_attribute(self) -> String {
        format!("GSI{}PK", self.ordinal())
    }

    /// The sort key attribute, e.g. `GSI3SK`.
    #[must_use]
    pub fn sort_attribute(self) -> String {
        format!("GSI{}SK", self.ordinal())
    }
}

impl fmt::Display for IndexSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GSI{}", self.ordinal())
    }
}

impl FromStr for IndexSlot {
    type Err = FacetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let no_such = || FacetError::NoSuchIndex {
            index: s.to_owned(),
        };
        let digits = s
            .get(..3)
            .filter(|p| p.eq_ignore_ascii_case("GSI"))
            .and_then(|_| s.get(3..))
            .ok_or_else(no_such)?;
        if digits.starts_with('0') {
            return Err(no_such());
        }
        digits
            .parse::<u8>()
            .ok()
            .and_then(Self::from_ordinal)
            .ok_or_else(no_such)
    }
}

/// The key layout a facet uses in one index slot.
pub struct IndexDescriptor<T> {
    slot: IndexSlot,
    alias: Option<String>,
    partition: KeyConfiguration<T>,
    sort: KeyConfiguration<T>,
}

impl<T> IndexDescriptor<T> {
    /// Describe how `slot` is keyed.
    #[must_use]
    pub fn new(slot: IndexSlot, partition: KeyConfiguration<T>, sort: KeyConfiguration<T>) -> Self {
        Self {
            slot,
            alias: None,
            partition,
            sort,
        }
    }

    /// Give the slot an access-layer name, e.g. `"byAuthor"`.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The slot.
    #[must_use]
    pub fn slot(&self) -> IndexSlot {
        self.slot
    }

    /// The alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Partition key configuration.
    #[must_use]
    pub fn partition(&self) -> &KeyConfiguration<T> {
        &self.partition
    }

    /// Sort key configuration.
    #[must_use]
    pub fn sort(&self) -> &KeyConfiguration<T> {
        &self.sort
    }
}

impl<T> Clone for IndexDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            alias: self.alias.clone(),
            partition: self.partition.clone(),
            sort: self.sort.clone(),
        }
    }
}

impl<T> fmt::Debug for IndexDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDescriptor")
            .field("slot", &self.slot)
            .field("alias", &self.alias)
            .field("partition", &self.partition)
            .field("sort", &self.sort)
            .finish()
    }
}
