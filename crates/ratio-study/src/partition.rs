//! Generic partitioning of records by a key-extraction function
//!
//! [`Partition`] splits a slice into groups keyed by any `Eq + Hash` value.
//! Groups appear in the order their key was first encountered in the input,
//! and members keep their input order within each group.
//!
//! The partition knows nothing about parcels or report rows; the grouped
//! report in [`crate::report`] is one consumer.
//!
//! # Examples
//!
//! ```
//! use ratio_study::partition::Partition;
//!
//! let words = ["pear", "apple", "plum", "avocado", "banana"];
//! let partition = Partition::by_key(&words, |w| w.chars().next());
//!
//! let keys = partition.iter().map(|g| g.key).collect::<Vec<_>>();
//! assert_eq!(keys, [Some('p'), Some('a'), Some('b')]);
//! assert_eq!(partition.iter().next().unwrap().members, [&"pear", &"plum"]);
//! ```

use std::{collections::HashMap, hash::Hash};

/// One group of a [`Partition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, K, T> {
    pub key: K,
    pub members: Vec<&'a T>,
}

impl<K, T> Group<'_, K, T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Collects `f` applied to every member, in member order.
    pub fn map<U, F>(&self, f: F) -> Vec<U>
    where
        F: FnMut(&T) -> U,
    {
        self.members.iter().copied().map(f).collect()
    }
}

/// Records split into groups in first-seen key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<'a, K, T> {
    groups: Vec<Group<'a, K, T>>,
}

impl<'a, K, T> Partition<'a, K, T> {
    /// Partitions `items` by the key returned from `key_fn`.
    ///
    /// # Arguments
    ///
    /// * `items` - Records to partition
    /// * `key_fn` - Extracts the group key of a record
    ///
    /// # Returns
    ///
    /// A partition with one group per distinct key. An empty input yields an
    /// empty partition.
    pub fn by_key<F>(items: &'a [T], mut key_fn: F) -> Self
    where
        K: Eq + Hash + Clone,
        F: FnMut(&T) -> K,
    {
        let mut index = HashMap::<K, usize>::new();
        let mut groups: Vec<Group<'a, K, T>> = vec![];
        for item in items {
            let key = key_fn(item);
            if let Some(&i) = index.get(&key) {
                groups[i].members.push(item);
            } else {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    members: vec![item],
                });
            }
        }
        Self { groups }
    }

    /// Builds a partition from pre-formed groups.
    ///
    /// Groups without members are omitted, so every group of the returned
    /// partition has at least one record.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = Group<'a, K, T>>,
    {
        let groups = groups
            .into_iter()
            .filter(|group| {
                if group.is_empty() {
                    log::debug!("omitting group without parcels");
                }
                !group.is_empty()
            })
            .collect();
        Self { groups }
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group<'a, K, T>> {
        self.groups.iter()
    }
}

impl<'a, K, T> IntoIterator for Partition<'a, K, T> {
    type Item = Group<'a, K, T>;
    type IntoIter = std::vec::IntoIter<Group<'a, K, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'p, 'a, K, T> IntoIterator for &'p Partition<'a, K, T> {
    type Item = &'p Group<'a, K, T>;
    type IntoIter = std::slice::Iter<'p, Group<'a, K, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
