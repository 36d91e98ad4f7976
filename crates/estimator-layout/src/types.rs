//! Layout primitives
//!
//! The target store organizes data as a hierarchy:
//!
//! ```text
//! Container
//! └── Object (count = identical objects)
//!     └── distribution key (count = identical keys)
//!         └── attribute key
//!             └── Value (count x size bytes)
//! ```
//!
//! Every `count` multiplies the cost of everything beneath it, so N identical
//! files or chunks are represented once instead of N times. Keys and values
//! are assembled by value and moved into their parent; once attached nothing
//! hands out a mutable reference to them.

use estimator_common::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Overhead classification of a key and everything stored under it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Overhead {
    /// Bookkeeping written by the filesystem layer
    Meta,
    /// User payload
    User,
}

/// Level of a key in the hierarchy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Distribution key: one per directory entry, metadata record or chunk
    Distribution,
    /// Attribute key: holds the values under a distribution key
    Attribute,
}

/// How the store indexes a key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    Integer,
    Hashed,
}

/// Record layout of an attribute key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Single,
    Array,
}

/// Key identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyName {
    /// Integer index (`0` is the file metadata record)
    Integer(u64),
    /// Hashed name (directory entries, inode attribute)
    Hashed(String),
}

impl KeyName {
    /// The key type implied by the identifier
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::Integer(_) => KeyType::Integer,
            Self::Hashed(_) => KeyType::Hashed,
        }
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(index) => write!(f, "{index}"),
            Self::Hashed(name) => write!(f, "{name}"),
        }
    }
}

impl From<u64> for KeyName {
    fn from(index: u64) -> Self {
        Self::Integer(index)
    }
}

impl From<&str> for KeyName {
    fn from(name: &str) -> Self {
        Self::Hashed(name.to_string())
    }
}

impl From<String> for KeyName {
    fn from(name: String) -> Self {
        Self::Hashed(name)
    }
}

/// `count` repetitions of a `size`-byte payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Value {
    count: u64,
    size: u64,
}

impl Value {
    /// Create a value repeated `count` times
    ///
    /// `count * size` must fit in a `u64`.
    pub fn new(count: u64, size: u64) -> Result<Self> {
        if count == 0 {
            return Err(Error::invalid_input("value count must be >= 1"));
        }
        if count.checked_mul(size).is_none() {
            return Err(overflow("value bytes"));
        }
        Ok(Self { count, size })
    }

    /// Create a single value
    #[must_use]
    pub const fn single(size: u64) -> Self {
        Self { count: 1, size }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Total bytes (`count * size`), checked at construction
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.count * self.size
    }
}

/// Entry under a key
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Child {
    Key(Key),
    Value(Value),
}

/// A key and its children
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Key {
    name: KeyName,
    kind: KeyKind,
    key_type: KeyType,
    count: u64,
    overhead: Overhead,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_type: Option<ValueType>,
    children: Vec<Child>,
}

impl Key {
    /// Create a distribution key with count 1
    pub fn distribution(name: impl Into<KeyName>, overhead: Overhead) -> Self {
        Self::with_kind(name.into(), KeyKind::Distribution, overhead, None)
    }

    /// Create an attribute key with count 1
    pub fn attribute(name: impl Into<KeyName>, overhead: Overhead, value_type: ValueType) -> Self {
        Self::with_kind(name.into(), KeyKind::Attribute, overhead, Some(value_type))
    }

    fn with_kind(
        name: KeyName,
        kind: KeyKind,
        overhead: Overhead,
        value_type: Option<ValueType>,
    ) -> Self {
        Self {
            key_type: name.key_type(),
            name,
            kind,
            count: 1,
            overhead,
            value_type,
            children: Vec::new(),
        }
    }

    /// Set the number of identical keys this entry stands for
    pub fn with_count(mut self, count: u64) -> Result<Self> {
        if count == 0 {
            return Err(Error::invalid_input(format!(
                "key {} count must be >= 1",
                self.name
            )));
        }
        self.count = count;
        Ok(self)
    }

    /// Append a sub-key
    #[must_use]
    pub fn with_key(mut self, key: Self) -> Self {
        self.children.push(Child::Key(key));
        self
    }

    /// Append a value
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.children.push(Child::Value(value));
        self
    }

    #[must_use]
    pub const fn name(&self) -> &KeyName {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn overhead(&self) -> Overhead {
        self.overhead
    }

    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    #[must_use]
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Direct sub-keys in order
    pub fn keys(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|c| match c {
            Child::Key(k) => Some(k),
            Child::Value(_) => None,
        })
    }

    /// Direct values in order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.children.iter().filter_map(|c| match c {
            Child::Value(v) => Some(v),
            Child::Key(_) => None,
        })
    }

    /// Modeled footprint of this key, including its own count
    pub fn footprint(&self) -> Result<Footprint> {
        let mut inner = Footprint {
            keys: 1,
            ..Footprint::default()
        };
        for child in &self.children {
            let part = match child {
                Child::Key(key) => key.footprint()?,
                Child::Value(value) => {
                    let (meta_bytes, user_bytes) = match self.overhead {
                        Overhead::Meta => (value.bytes(), 0),
                        Overhead::User => (0, value.bytes()),
                    };
                    Footprint {
                        meta_bytes,
                        user_bytes,
                        keys: 0,
                        values: value.count(),
                    }
                }
            };
            inner.add(&part)?;
        }
        inner.scaled(self.count)
    }
}

/// Position of an object inside a container
///
/// Ids are plain indices: removing an object shifts every later id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level layout unit
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Object {
    count: u64,
    keys: Vec<Key>,
}

impl Default for Object {
    fn default() -> Self {
        Self {
            count: 1,
            keys: Vec::new(),
        }
    }
}

impl Object {
    /// Create an empty object standing for `count` identical objects
    pub fn with_count(count: u64) -> Result<Self> {
        if count == 0 {
            return Err(Error::invalid_input("object count must be >= 1"));
        }
        Ok(Self {
            count,
            keys: Vec::new(),
        })
    }

    /// Append a key
    pub fn push_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Modeled footprint of this object, including its own count
    pub fn footprint(&self) -> Result<Footprint> {
        let mut total = Footprint::default();
        for key in &self.keys {
            total.add(&key.footprint()?)?;
        }
        total.scaled(self.count)
    }
}

/// Ordered collection of objects
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Container {
    objects: Vec<Object>,
}

impl Container {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Append an object and return its id
    pub fn push(&mut self, object: Object) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    /// Remove an object; every id after it shifts down by one
    pub fn remove(&mut self, id: ObjectId) -> Result<Object> {
        if id.0 >= self.objects.len() {
            return Err(Self::missing(id));
        }
        Ok(self.objects.remove(id.0))
    }

    /// Append a key to an existing object
    pub fn append_key(&mut self, id: ObjectId, key: Key) -> Result<()> {
        let object = self.objects.get_mut(id.0).ok_or_else(|| Self::missing(id))?;
        object.push_key(key);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0)
    }

    #[must_use]
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.objects.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Modeled footprint of every object
    pub fn footprint(&self) -> Result<Footprint> {
        let mut total = Footprint::default();
        for object in &self.objects {
            total.add(&object.footprint()?)?;
        }
        Ok(total)
    }

    fn missing(id: ObjectId) -> Error {
        Error::invalid_input(format!("no object with id {id}"))
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

/// Byte and record totals multiplied through every ancestor count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Footprint {
    /// Bytes under META keys
    pub meta_bytes: u64,
    /// Bytes under USER keys
    pub user_bytes: u64,
    /// Number of keys (both levels)
    pub keys: u64,
    /// Number of value records
    pub values: u64,
}

impl Footprint {
    /// Total modeled bytes
    pub fn total_bytes(&self) -> Result<u64> {
        self.meta_bytes
            .checked_add(self.user_bytes)
            .ok_or_else(|| overflow("total bytes"))
    }

    /// Pointwise sum; `self` is unchanged on overflow
    pub fn add(&mut self, other: &Self) -> Result<()> {
        *self = Self {
            meta_bytes: checked(self.meta_bytes.checked_add(other.meta_bytes), "meta bytes")?,
            user_bytes: checked(self.user_bytes.checked_add(other.user_bytes), "user bytes")?,
            keys: checked(self.keys.checked_add(other.keys), "key count")?,
            values: checked(self.values.checked_add(other.values), "value count")?,
        };
        Ok(())
    }

    /// Pointwise multiply
    pub fn scaled(self, factor: u64) -> Result<Self> {
        Ok(Self {
            meta_bytes: checked(self.meta_bytes.checked_mul(factor), "meta bytes")?,
            user_bytes: checked(self.user_bytes.checked_mul(factor), "user bytes")?,
            keys: checked(self.keys.checked_mul(factor), "key count")?,
            values: checked(self.values.checked_mul(factor), "value count")?,
        })
    }
}

/// Error for modeled arithmetic that does not fit in a `u64`
pub(crate) fn overflow(what: &str) -> Error {
    Error::invalid_input(format!("{what} overflow the layout model"))
}

pub(crate) fn checked(value: Option<u64>, what: &str) -> Result<u64> {
    value.ok_or_else(|| overflow(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inode() -> Key {
        Key::attribute("DFS_INODE", Overhead::Meta, ValueType::Array).with_value(Value::single(64))
    }

    #[test]
    fn test_value_count() {
        assert!(Value::new(0, 10).is_err());
        let value = Value::new(8, 131_072).unwrap();
        assert_eq!(value.count(), 8);
        assert_eq!(value.bytes(), 1_048_576);
        assert_eq!(Value::single(0).bytes(), 0);
        assert_eq!(Value::new(2, u64::MAX / 2).unwrap().bytes(), u64::MAX - 1);
        assert!(matches!(
            Value::new(3, u64::MAX / 2),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_key_type_follows_name() {
        let key = Key::distribution(0_u64, Overhead::Meta);
        assert_eq!(key.key_type(), KeyType::Integer);
        assert_eq!(key.kind(), KeyKind::Distribution);
        assert_eq!(key.value_type(), None);

        let key = inode();
        assert_eq!(key.key_type(), KeyType::Hashed);
        assert_eq!(key.kind(), KeyKind::Attribute);
        assert_eq!(key.name().to_string(), "DFS_INODE");
    }

    #[test]
    fn test_key_zero_count_rejected() {
        let err = Key::distribution("a", Overhead::Meta).with_count(0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_footprint_multiplies_counts() {
        let chunk = Key::distribution(1_u64, Overhead::User)
            .with_count(4)
            .unwrap()
            .with_key(
                Key::attribute(0_u64, Overhead::User, ValueType::Array)
                    .with_value(Value::new(8, 100).unwrap())
                    .with_value(Value::single(10)),
            );
        let entry = Key::distribution("file", Overhead::Meta).with_key(inode());

        let mut object = Object::with_count(3).unwrap();
        object.push_key(entry);
        object.push_key(chunk);

        let footprint = object.footprint().unwrap();
        assert_eq!(footprint.user_bytes, 3 * 4 * 810);
        assert_eq!(footprint.meta_bytes, 3 * 64);
        // object x (entry + inode + 4 x (chunk + attribute))
        assert_eq!(footprint.keys, 3 * (2 + 4 * 2));
        assert_eq!(footprint.values, 3 * (1 + 4 * 9));
        assert_eq!(footprint.total_bytes().unwrap(), 3 * 4 * 810 + 3 * 64);
    }

    #[test]
    fn test_footprint_overflow_is_an_error() {
        let chunk = Key::distribution(1_u64, Overhead::User)
            .with_count(u64::MAX / 2)
            .unwrap()
            .with_key(
                Key::attribute(0_u64, Overhead::User, ValueType::Array).with_value(Value::single(4)),
            );
        let mut object = Object::default();
        object.push_key(chunk);
        assert!(matches!(object.footprint(), Err(Error::InvalidInput(_))));

        let mut total = Footprint {
            user_bytes: u64::MAX,
            ..Footprint::default()
        };
        let before = total;
        let one = Footprint {
            user_bytes: 1,
            ..Footprint::default()
        };
        assert!(total.add(&one).is_err());
        assert_eq!(total, before);
        assert!(one.scaled(u64::MAX).is_ok());
        assert!(total.scaled(2).is_err());

        let mixed = Footprint {
            meta_bytes: 1,
            user_bytes: u64::MAX,
            ..Footprint::default()
        };
        assert!(mixed.total_bytes().is_err());
    }

    #[test]
    fn test_container_ids_shift_on_remove() {
        let mut container = Container::new();
        let a = container.push(Object::default());
        let b = container.push(Object::with_count(2).unwrap());
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);

        container.remove(a).unwrap();
        assert_eq!(container.len(), 1);
        assert_eq!(container.get(a).unwrap().count(), 2);
        assert!(container.get(b).is_none());
        assert!(container.remove(b).is_err());
        assert!(container.append_key(b, inode()).is_err());
    }

    #[test]
    fn test_serialize_key() {
        let key = Key::distribution("link", Overhead::Meta)
            .with_count(2)
            .unwrap()
            .with_key(inode());
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["name"], "link");
        assert_eq!(json["kind"], "distribution");
        assert_eq!(json["key_type"], "HASHED");
        assert_eq!(json["count"], 2);
        assert_eq!(json["overhead"], "META");
        assert!(json.get("value_type").is_none());
        assert_eq!(json["children"][0]["value_type"], "ARRAY");
        assert_eq!(json["children"][0]["children"][0]["size"], 64);
    }
}
