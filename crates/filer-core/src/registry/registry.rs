//! Format registry keyed by file extension.

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::debug;

use super::traits::FormatAttributes;

type FormatMap = IndexMap<String, Arc<FormatAttributes>>;

/// One or more extensions to register a format under.
///
/// Built from a single extension (`".json"`) or a list
/// (`[".yml", ".yaml"]`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions(Vec<String>);

impl Extensions {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Extensions {
    fn from(extension: &str) -> Self {
        Self(vec![extension.to_string()])
    }
}

impl From<String> for Extensions {
    fn from(extension: String) -> Self {
        Self(vec![extension])
    }
}

impl From<Vec<String>> for Extensions {
    fn from(extensions: Vec<String>) -> Self {
        Self(extensions)
    }
}

impl From<Vec<&str>> for Extensions {
    fn from(extensions: Vec<&str>) -> Self {
        Self(extensions.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Extensions {
    fn from(extensions: &[&str]) -> Self {
        Self(extensions.iter().map(|ext| ext.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Extensions {
    fn from(extensions: [&str; N]) -> Self {
        Self(extensions.iter().map(|ext| ext.to_string()).collect())
    }
}

/// An immutable view of every registered format at one point in time.
///
/// Snapshots are cheap to clone and never change once taken; later
/// registrations publish a new snapshot instead.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    formats: Arc<FormatMap>,
}

impl Snapshot {
    /// Check whether an exact extension is registered.
    pub fn has(&self, extension: &str) -> bool {
        self.formats.contains_key(extension)
    }

    /// Get the attributes for an extension, or empty attributes if it is not
    /// registered.
    pub fn get(&self, extension: &str) -> Arc<FormatAttributes> {
        self.formats.get(extension).cloned().unwrap_or_default()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Registered extensions in registration order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// Iterate over `(extension, attributes)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<FormatAttributes>)> {
        self.formats.iter().map(|(ext, attrs)| (ext.as_str(), attrs))
    }
}

/// Registry of file formats keyed by extension.
///
/// Lookups read the current [`Snapshot`]; `register`, `unregister` and
/// `clear` copy the table, change the copy and publish it. Clones of a
/// registry share the same table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    current: Arc<RwLock<Snapshot>>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check whether an exact extension is registered.
    pub fn has(&self, extension: &str) -> bool {
        self.snapshot().has(extension)
    }

    /// Get the attributes for an extension, or empty attributes if it is not
    /// registered. Never fails.
    pub fn get(&self, extension: &str) -> Arc<FormatAttributes> {
        self.snapshot().get(extension)
    }

    /// Register a format under one or more extensions.
    ///
    /// Replaces any existing association for each extension. All listed
    /// extensions share the same attributes.
    pub fn register(&self, extensions: impl Into<Extensions>, attributes: FormatAttributes) {
        let extensions = extensions.into();
        let attributes = Arc::new(attributes);

        self.publish(|formats| {
            for ext in extensions.iter() {
                formats.insert(ext.to_string(), Arc::clone(&attributes));
            }
        });

        debug!(extensions = ?extensions, "Registered format");
    }

    /// Unregister an extension. Returns `false` if it was not registered,
    /// in which case the registry is left untouched.
    pub fn unregister(&self, extension: &str) -> bool {
        if !self.has(extension) {
            return false;
        }

        let mut removed = false;
        self.publish(|formats| {
            removed = formats.shift_remove(extension).is_some();
        });

        debug!(extension, removed, "Unregistered format");
        removed
    }

    /// Remove every registered format.
    pub fn clear(&self) {
        self.publish(FormatMap::clear);
        debug!("Cleared format registry");
    }

    /// Copy the current table, apply `change` and publish the copy.
    fn publish(&self, change: impl FnOnce(&mut FormatMap)) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut formats = FormatMap::clone(&current.formats);
        change(&mut formats);
        *current = Snapshot {
            formats: Arc::new(formats),
        };
    }
}
