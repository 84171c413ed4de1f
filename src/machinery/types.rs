//! Diff item types.

use crate::api::Context;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::BitOr;

/// ChangeKind is a single tag of a [`ChangeType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ChangeKind {
    /// A context was added and does not interfere with any existing ones.
    New,
    /// A context was renamed but otherwise has no conflicts.
    Rename,
    /// An existing context was removed.
    Delete,
    /// A new context completely replaces an existing one.
    Replace,
    /// An existing context is patched field by field.
    Modify,
    /// Some additional things need to be taken care of, see [`ComplexDiff`].
    Complex,
}

/// ComplexDiff is a single tag of a [`ComplexDiffType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ComplexDiff {
    /// The server URL has been changed.
    ServerChanged,
    /// The user auth info has changed.
    UserAuthChanged,
    /// The cluster CA has changed.
    ClusterCAChanged,
    /// The preferences have changed. Reserved, applying it does nothing.
    PreferencesChanged,
    /// The context needs to be renamed as it conflicts with an existing one.
    /// Only valid together with [`ChangeKind::New`].
    RenameRequired,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for ComplexDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Flags is a small set over a closed tag enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Flags<T: Ord> {
    tags: BTreeSet<T>,
}

/// ChangeType is the set of [`ChangeKind`] tags describing a diff item.
pub type ChangeType = Flags<ChangeKind>;

/// ComplexDiffType is the set of field-level changes of a complex diff item.
pub type ComplexDiffType = Flags<ComplexDiff>;

impl<T: Ord + Copy> Flags<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Flags {
            tags: BTreeSet::new(),
        }
    }

    /// Returns true if the tag is set.
    pub fn contains(&self, tag: T) -> bool {
        self.tags.contains(&tag)
    }

    /// Sets a tag.
    pub fn insert(&mut self, tag: T) {
        self.tags.insert(tag);
    }

    /// Returns true if no tag is set.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the number of tags set.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns an iterator over the set tags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.tags.iter().copied()
    }
}

impl<T: Ord + Copy> Default for Flags<T> {
    fn default() -> Self {
        Flags::new()
    }
}

impl<T: Ord + Copy> From<T> for Flags<T> {
    fn from(tag: T) -> Self {
        let mut flags = Flags::new();
        flags.insert(tag);
        flags
    }
}

impl<T: Ord + Copy> FromIterator<T> for Flags<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Flags {
            tags: iter.into_iter().collect(),
        }
    }
}

impl<T: Ord + Copy> BitOr<T> for Flags<T> {
    type Output = Flags<T>;

    fn bitor(mut self, rhs: T) -> Flags<T> {
        self.insert(rhs);
        self
    }
}

impl BitOr for ChangeKind {
    type Output = ChangeType;

    fn bitor(self, rhs: ChangeKind) -> ChangeType {
        ChangeType::from(self) | rhs
    }
}

impl BitOr for ComplexDiff {
    type Output = ComplexDiffType;

    fn bitor(self, rhs: ComplexDiff) -> ComplexDiffType {
        ComplexDiffType::from(self) | rhs
    }
}

impl<T: Ord + Copy + fmt::Display> fmt::Display for Flags<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        for (i, tag) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{}", tag)?;
        }
        Ok(())
    }
}

/// NamedContext is a context together with its name in the owning config.
///
/// Diff items own their NamedContexts so that mutating a config after the
/// diff was computed cannot change the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

impl NamedContext {
    /// Creates a NamedContext holding a copy of the given context.
    pub fn new(name: impl Into<String>, context: &Context) -> Self {
        NamedContext {
            name: name.into(),
            context: context.clone(),
        }
    }

    /// Name of the referenced cluster.
    pub fn cluster(&self) -> &str {
        &self.context.cluster
    }

    /// Name of the referenced auth info.
    pub fn auth_info(&self) -> &str {
        &self.context.auth_info
    }
}

impl fmt::Display for NamedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (cluster: {}, user: {})",
            self.name, self.context.cluster, self.context.auth_info
        )
    }
}

/// DiffItem is one typed edit from the existing config toward the incoming one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffItem {
    /// The context in the existing config this item touches. Empty for New.
    pub affected_existing: Option<NamedContext>,
    /// The context in the incoming config this item comes from. Empty for Delete.
    pub affected_incoming: Option<NamedContext>,
    pub change_type: ChangeType,
    pub complex: ComplexDiffType,
}

impl DiffItem {
    /// An incoming context with no counterpart in the existing config.
    pub fn new_context(incoming: NamedContext, rename_required: bool) -> Self {
        let (change_type, complex) = if rename_required {
            (
                ChangeKind::New | ChangeKind::Complex,
                ComplexDiffType::from(ComplexDiff::RenameRequired),
            )
        } else {
            (ChangeType::from(ChangeKind::New), ComplexDiffType::new())
        };
        DiffItem {
            affected_existing: None,
            affected_incoming: Some(incoming),
            change_type,
            complex,
        }
    }

    /// The same context content under different names.
    pub fn rename(existing: NamedContext, incoming: NamedContext) -> Self {
        DiffItem {
            affected_existing: Some(existing),
            affected_incoming: Some(incoming),
            change_type: ChangeKind::Rename.into(),
            complex: ComplexDiffType::new(),
        }
    }

    /// A field-level patch of an existing context.
    pub fn modify(existing: NamedContext, incoming: NamedContext, complex: ComplexDiffType) -> Self {
        DiffItem {
            affected_existing: Some(existing),
            affected_incoming: Some(incoming),
            change_type: ChangeKind::Modify | ChangeKind::Complex,
            complex,
        }
    }

    /// A different identity now serving the endpoint of an existing context.
    pub fn replace(existing: NamedContext, incoming: NamedContext) -> Self {
        DiffItem {
            affected_existing: Some(existing),
            affected_incoming: Some(incoming),
            change_type: ChangeKind::Replace.into(),
            complex: ComplexDiffType::new(),
        }
    }

    /// An existing context with no counterpart in the incoming config.
    pub fn delete(existing: NamedContext) -> Self {
        DiffItem {
            affected_existing: Some(existing),
            affected_incoming: None,
            change_type: ChangeKind::Delete.into(),
            complex: ComplexDiffType::new(),
        }
    }

    /// Returns true if this item touches the named existing context.
    pub fn affects_existing(&self, name: &str) -> bool {
        self.affected_existing
            .as_ref()
            .is_some_and(|existing| existing.name == name)
    }
}

impl fmt::Display for DiffItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.change_type)?;
        if !self.complex.is_empty() {
            write!(f, " [{}]", self.complex)?;
        }
        match (&self.affected_existing, &self.affected_incoming) {
            (Some(existing), Some(incoming)) => write!(f, ": {} -> {}", existing, incoming),
            (Some(existing), None) => write!(f, ": {}", existing),
            (None, Some(incoming)) => write!(f, ": {}", incoming),
            (None, None) => Ok(()),
        }
    }
}

/// Diff is the ordered list of edits between two configs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub items: Vec<DiffItem>,
}

impl Diff {
    /// Creates a new empty Diff.
    pub fn new() -> Self {
        Diff { items: Vec::new() }
    }

    /// Adds an item.
    pub fn push(&mut self, item: DiffItem) {
        self.items.push(item);
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items.
    pub fn iter(&self) -> impl Iterator<Item = &DiffItem> {
        self.items.iter()
    }

    /// Returns true if any item touches the named existing context.
    pub fn references_existing(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.affects_existing(name))
    }
}

impl From<Vec<DiffItem>> for Diff {
    fn from(items: Vec<DiffItem>) -> Self {
        Diff { items }
    }
}

impl IntoIterator for Diff {
    type Item = DiffItem;
    type IntoIter = std::vec::IntoIter<DiffItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}
