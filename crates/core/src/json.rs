//! Value and path model for the state tree
//!
//! This module defines the types every other layer speaks:
//! - JsonValue: Newtype wrapper around serde_json::Value
//! - JsonPath: Path into the state tree (e.g., `$.user.name` or `$.items[0]`)
//! - PathSegment: Individual path component (Key, Index or the `$every` wildcard)
//! - Path operations: get, set, delete and merge-defaults at a path
//!
//! # Limits
//!
//! | Limit | Value | Constant |
//! |-------|-------|----------|
//! | Max nesting depth | 100 levels | [`MAX_NESTING_DEPTH`] |
//! | Max path length | 256 segments | [`MAX_PATH_LENGTH`] |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Limits
// =============================================================================

/// Maximum nesting depth of a stored value (100 levels)
///
/// Prevents stack overflow during recursive operations like deep copy,
/// merge-defaults and subtree diffing.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Maximum path length in segments (256 segments)
pub const MAX_PATH_LENGTH: usize = 256;

/// Textual marker for the root of the state tree
pub const ROOT_TOKEN: &str = "$";

/// Textual form of the wildcard-children segment
pub const EVERY_TOKEN: &str = "$every";

/// Error type for limit violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Value nesting exceeds maximum depth
    #[error("value nesting depth {depth} exceeds maximum of {max} levels")]
    NestingTooDeep {
        /// Actual nesting depth
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// Path exceeds maximum length
    #[error("path length {length} exceeds maximum of {max} segments")]
    PathTooLong {
        /// Actual path length
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
}

/// JSON value wrapper
///
/// Newtype around serde_json::Value providing:
/// - Direct access to underlying serde_json::Value via Deref/DerefMut
/// - Easy construction from common types
/// - Serialization/deserialization support
///
/// Cloning a `JsonValue` is a deep copy: no two values ever share
/// interior storage, which is what makes materialization alias-free.
///
/// # Examples
///
/// ```
/// use pathbind_core::JsonValue;
///
/// let obj = JsonValue::object();
/// let arr = JsonValue::array();
/// let s = JsonValue::from("hello");
///
/// assert!(obj.is_object());
/// assert!(arr.is_array());
/// assert_eq!(s.as_str(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct JsonValue(serde_json::Value);

impl JsonValue {
    /// Create a null JSON value
    pub fn null() -> Self {
        JsonValue(serde_json::Value::Null)
    }

    /// Create an empty JSON object
    pub fn object() -> Self {
        JsonValue(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Create an empty JSON array
    pub fn array() -> Self {
        JsonValue(serde_json::Value::Array(Vec::new()))
    }

    /// Create from a serde_json::Value
    pub fn from_value(value: serde_json::Value) -> Self {
        JsonValue(value)
    }

    /// Get the underlying serde_json::Value
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Get a reference to the underlying serde_json::Value
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }

    /// Get a mutable reference to the underlying serde_json::Value
    pub fn as_inner_mut(&mut self) -> &mut serde_json::Value {
        &mut self.0
    }

    /// Calculate the maximum nesting depth of this JSON value
    ///
    /// Returns 0 for primitives (null, bool, number, string),
    /// and counts nested objects/arrays.
    pub fn nesting_depth(&self) -> usize {
        fn depth_of(value: &serde_json::Value) -> usize {
            match value {
                serde_json::Value::Null
                | serde_json::Value::Bool(_)
                | serde_json::Value::Number(_)
                | serde_json::Value::String(_) => 0,
                serde_json::Value::Array(arr) => 1 + arr.iter().map(depth_of).max().unwrap_or(0),
                serde_json::Value::Object(obj) => 1 + obj.values().map(depth_of).max().unwrap_or(0),
            }
        }
        depth_of(&self.0)
    }

    /// Validate nesting depth against [`MAX_NESTING_DEPTH`]
    pub fn validate_depth(&self) -> Result<(), LimitError> {
        let depth = self.nesting_depth();
        if depth > MAX_NESTING_DEPTH {
            Err(LimitError::NestingTooDeep {
                depth,
                max: MAX_NESTING_DEPTH,
            })
        } else {
            Ok(())
        }
    }
}

impl Deref for JsonValue {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for JsonValue {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for JsonValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(v: serde_json::Value) -> Self {
        JsonValue(v)
    }
}

impl From<JsonValue> for serde_json::Value {
    fn from(v: JsonValue) -> Self {
        v.0
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> Self {
        JsonValue(serde_json::Value::Bool(v))
    }
}

impl From<i64> for JsonValue {
    fn from(v: i64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<i32> for JsonValue {
    fn from(v: i32) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<u64> for JsonValue {
    fn from(v: u64) -> Self {
        JsonValue(serde_json::Value::Number(v.into()))
    }
}

impl From<f64> for JsonValue {
    fn from(v: f64) -> Self {
        serde_json::Number::from_f64(v)
            .map(|n| JsonValue(serde_json::Value::Number(n)))
            .unwrap_or_else(Self::null)
    }
}

impl From<&str> for JsonValue {
    fn from(v: &str) -> Self {
        JsonValue(serde_json::Value::String(v.to_string()))
    }
}

impl From<String> for JsonValue {
    fn from(v: String) -> Self {
        JsonValue(serde_json::Value::String(v))
    }
}

// =============================================================================
// JsonPath and PathSegment
// =============================================================================

/// Error type for path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty key in path
    #[error("empty key in path at position {0}")]
    EmptyKey(usize),
    /// Unclosed bracket
    #[error("unclosed bracket starting at position {0}")]
    UnclosedBracket(usize),
    /// Invalid array index
    #[error("invalid array index at position {0}: {1}")]
    InvalidIndex(usize, String),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    /// `$every` anywhere but the final segment
    #[error("wildcard segment at position {0} must be the last segment")]
    MisplacedWildcard(usize),
}

/// A segment in a path
///
/// # Examples
///
/// ```
/// use pathbind_core::PathSegment;
///
/// let key = PathSegment::Key("name".to_string());
/// let idx = PathSegment::Index(0);
/// let every = PathSegment::Every;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key: `.foo`
    Key(String),
    /// Array index: `[0]`
    Index(usize),
    /// Any direct child: `.$every`
    Every,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
            PathSegment::Every => write!(f, ".{}", EVERY_TOKEN),
        }
    }
}

/// A path into the state tree
///
/// # Path Syntax
///
/// | Syntax | Meaning | Example |
/// |--------|---------|---------|
/// | `$` | Root | `$` |
/// | `.key` | Object property | `$.user` |
/// | `[n]` | Array index | `$.items[0]` |
/// | `.$every` | Any direct child (listen paths only) | `$.items.$every` |
///
/// The leading `$` is optional when parsing: `user.name` and `$.user.name`
/// are the same path. Paths always render with the `$` prefix.
///
/// # Examples
///
/// ```
/// use pathbind_core::JsonPath;
///
/// let user_name = JsonPath::root().key("user").key("name");
/// let parsed: JsonPath = "$.user.name".parse().unwrap();
/// assert_eq!(parsed, user_name);
/// assert_eq!(parsed.to_string(), "$.user.name");
///
/// let user = JsonPath::root().key("user");
/// assert!(user.is_ancestor_of(&user_name));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        JsonPath {
            segments: Vec::new(),
        }
    }

    /// Create a path from a vector of segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        JsonPath { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Get the number of segments in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path (empty)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key segment (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index segment (builder pattern)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Append the wildcard-children segment (builder pattern)
    pub fn every(mut self) -> Self {
        self.segments.push(PathSegment::Every);
        self
    }

    /// Push a key segment (mutating)
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Push an index segment (mutating)
    pub fn push_index(&mut self, idx: usize) {
        self.segments.push(PathSegment::Index(idx));
    }

    /// Concatenate a relative path onto this one
    pub fn join(&self, relative: &JsonPath) -> JsonPath {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        JsonPath { segments }
    }

    /// Get the parent path (None if root)
    pub fn parent(&self) -> Option<JsonPath> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent = self.clone();
            parent.segments.pop();
            Some(parent)
        }
    }

    /// Get the last segment (None if root)
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Whether the path ends in the `$every` wildcard
    pub fn is_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::Every))
    }

    /// Whether any segment is the `$every` wildcard
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, PathSegment::Every))
    }

    /// For a wildcard path, the path whose children it matches
    pub fn wildcard_base(&self) -> Option<JsonPath> {
        if self.is_wildcard() {
            self.parent()
        } else {
            None
        }
    }

    /// Check whether this path, used as a listen path, matches a concrete path
    ///
    /// A plain path matches itself. A wildcard path `X.$every` matches any
    /// direct child of `X`.
    pub fn matches(&self, concrete: &JsonPath) -> bool {
        match self.wildcard_base() {
            Some(base) => concrete.parent().as_ref() == Some(&base),
            None => self == concrete,
        }
    }

    /// Check if this path is an ancestor of another (or equal)
    ///
    /// A path is an ancestor if it is a prefix of the other path.
    /// The root path is an ancestor of all paths.
    pub fn is_ancestor_of(&self, other: &JsonPath) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Check if this path is a descendant of another (or equal)
    pub fn is_descendant_of(&self, other: &JsonPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// Check if this path is a strict ancestor of another (not equal)
    pub fn is_strict_ancestor_of(&self, other: &JsonPath) -> bool {
        self.segments.len() < other.segments.len() && self.is_ancestor_of(other)
    }

    /// Strip `ancestor` from the front of this path
    ///
    /// Returns `None` if `ancestor` is not an ancestor of this path.
    pub fn relative_to(&self, ancestor: &JsonPath) -> Option<JsonPath> {
        if !ancestor.is_ancestor_of(self) {
            return None;
        }
        Some(JsonPath::from_segments(
            self.segments[ancestor.segments.len()..].to_vec(),
        ))
    }

    /// Validate path length limit
    ///
    /// Returns an error if the path exceeds [`MAX_PATH_LENGTH`].
    pub fn validate(&self) -> Result<(), LimitError> {
        let length = self.segments.len();
        if length > MAX_PATH_LENGTH {
            Err(LimitError::PathTooLong {
                length,
                max: MAX_PATH_LENGTH,
            })
        } else {
            Ok(())
        }
    }

    /// Convert to a string representation (always `$`-prefixed)
    pub fn to_path_string(&self) -> String {
        let mut result = String::from(ROOT_TOKEN);
        for seg in &self.segments {
            result.push_str(&seg.to_string());
        }
        result
    }
}

/// Whether a path string begins with the root marker (`$`, `$.`, `$[`)
///
/// `$every` is *not* rooted: it is the relative wildcard segment.
pub fn is_rooted(s: &str) -> bool {
    match s.strip_prefix(ROOT_TOKEN) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl FromStr for JsonPath {
    type Err = PathParseError;

    /// Parse a path from a string
    ///
    /// Supported syntax:
    /// - `$` or empty - root
    /// - `foo`, `.foo` or `$.foo` - object key
    /// - `[0]` - array index
    /// - `foo.bar` - nested keys
    /// - `foo[0].bar` - mixed
    /// - `foo.$every` - wildcard children (final segment only)
    ///
    /// The empty string is the root, like `$`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        if is_rooted(s) {
            i += 1;
        }

        // Skip leading dot if present
        if i < chars.len() && chars[i] == '.' {
            i += 1;
            if i >= chars.len() || chars[i] == '.' {
                return Err(PathParseError::EmptyKey(i));
            }
        }

        while i < chars.len() {
            if chars[i] == '.' {
                i += 1;
                if i >= chars.len() || chars[i] == '.' {
                    return Err(PathParseError::EmptyKey(i));
                }
            } else if !segments.is_empty() && chars[i] != '[' {
                // Only `.` or `[` may follow a segment: `[0]name` is rejected.
                return Err(PathParseError::UnexpectedChar(chars[i], i));
            }

            if matches!(segments.last(), Some(PathSegment::Every)) {
                return Err(PathParseError::MisplacedWildcard(i));
            }

            if chars[i] == '[' {
                let start = i;
                i += 1;
                let idx_start = i;

                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }

                if i >= chars.len() {
                    return Err(PathParseError::UnclosedBracket(start));
                }

                let idx_str: String = chars[idx_start..i].iter().collect();
                let idx = idx_str
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(idx_start, idx_str))?;

                segments.push(PathSegment::Index(idx));
                i += 1;
            } else if chars[i] == '$' {
                let token_start = i;
                i += 1;
                while i < chars.len() && is_key_char(chars[i]) {
                    i += 1;
                }
                let token: String = chars[token_start..i].iter().collect();
                if token != EVERY_TOKEN {
                    return Err(PathParseError::UnexpectedChar('$', token_start));
                }
                segments.push(PathSegment::Every);
            } else if is_key_char(chars[i]) {
                let key_start = i;
                while i < chars.len() && is_key_char(chars[i]) {
                    i += 1;
                }
                let key: String = chars[key_start..i].iter().collect();
                segments.push(PathSegment::Key(key));
            } else {
                return Err(PathParseError::UnexpectedChar(chars[i], i));
            }
        }

        Ok(JsonPath { segments })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

// =============================================================================
// Path Errors
// =============================================================================

/// Error type for path operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPathError {
    /// Type mismatch during traversal
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type
        expected: &'static str,
        /// Found type
        found: &'static str,
    },

    /// Array index out of bounds
    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// The array length
        len: usize,
    },

    /// Wildcard segments address no single value
    #[error("wildcard path cannot address a value")]
    Wildcard,
}

// =============================================================================
// Path Operations
// =============================================================================

/// Get value at path within a document
///
/// Returns `None` if the path doesn't exist, crosses a type mismatch,
/// or contains a wildcard.
///
/// # Examples
///
/// ```
/// use pathbind_core::{get_at_path, JsonPath, JsonValue};
///
/// let json: JsonValue = serde_json::json!({
///     "user": { "name": "Alice", "scores": [100, 95, 88] }
/// }).into();
///
/// let path: JsonPath = "$.user.scores[1]".parse().unwrap();
/// assert_eq!(get_at_path(&json, &path).unwrap().as_i64(), Some(95));
/// assert_eq!(get_at_path(&json, &JsonPath::root()), Some(&json));
/// ```
pub fn get_at_path<'a>(value: &'a JsonValue, path: &JsonPath) -> Option<&'a JsonValue> {
    if path.is_root() {
        return Some(value);
    }

    let mut current: &serde_json::Value = value.as_inner();

    for segment in path.segments() {
        match (segment, current) {
            (PathSegment::Key(key), serde_json::Value::Object(obj)) => {
                current = obj.get(key)?;
            }
            (PathSegment::Index(idx), serde_json::Value::Array(arr)) => {
                current = arr.get(*idx)?;
            }
            _ => return None,
        }
    }

    // SAFETY: JsonValue is #[repr(transparent)] over serde_json::Value, so the
    // layouts are identical and the lifetime stays tied to `value`.
    Some(unsafe { &*(current as *const serde_json::Value as *const JsonValue) })
}

/// Set value at path within a document
///
/// Creates intermediate objects and arrays as needed. The type of an
/// intermediate container is chosen by the next segment in the path.
/// Returns the previous value at the path, if any.
pub fn set_at_path(
    root: &mut JsonValue,
    path: &JsonPath,
    value: JsonValue,
) -> Result<Option<JsonValue>, JsonPathError> {
    if path.has_wildcard() {
        return Err(JsonPathError::Wildcard);
    }

    if path.is_root() {
        let old = std::mem::replace(root, value);
        return Ok(Some(old));
    }

    let segments = path.segments();
    let (parent_segments, last_segment) = segments.split_at(segments.len() - 1);
    let last_segment = &last_segment[0];

    let mut current = root.as_inner_mut();

    for (i, segment) in parent_segments.iter().enumerate() {
        let next_segment = &segments[i + 1];

        current = match (segment, current) {
            (PathSegment::Key(key), serde_json::Value::Object(obj)) => {
                obj.entry(key.clone()).or_insert_with(|| match next_segment {
                    PathSegment::Index(_) => serde_json::Value::Array(Vec::new()),
                    _ => serde_json::Value::Object(serde_json::Map::new()),
                })
            }
            (PathSegment::Index(idx), serde_json::Value::Array(arr)) => {
                let len = arr.len();
                arr.get_mut(*idx)
                    .ok_or(JsonPathError::IndexOutOfBounds { index: *idx, len })?
            }
            (PathSegment::Key(_), other) => {
                return Err(JsonPathError::TypeMismatch {
                    expected: "object",
                    found: value_type_name(other),
                })
            }
            (PathSegment::Index(_), other) => {
                return Err(JsonPathError::TypeMismatch {
                    expected: "array",
                    found: value_type_name(other),
                })
            }
            (PathSegment::Every, _) => return Err(JsonPathError::Wildcard),
        };
    }

    match (last_segment, current) {
        (PathSegment::Key(key), serde_json::Value::Object(obj)) => Ok(obj
            .insert(key.clone(), value.into_inner())
            .map(JsonValue::from)),
        (PathSegment::Index(idx), serde_json::Value::Array(arr)) => {
            if *idx < arr.len() {
                let old = std::mem::replace(&mut arr[*idx], value.into_inner());
                Ok(Some(JsonValue::from(old)))
            } else if *idx == arr.len() {
                arr.push(value.into_inner());
                Ok(None)
            } else {
                Err(JsonPathError::IndexOutOfBounds {
                    index: *idx,
                    len: arr.len(),
                })
            }
        }
        (PathSegment::Key(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "object",
            found: value_type_name(other),
        }),
        (PathSegment::Index(_), other) => Err(JsonPathError::TypeMismatch {
            expected: "array",
            found: value_type_name(other),
        }),
        (PathSegment::Every, _) => Err(JsonPathError::Wildcard),
    }
}

/// Helper to get type name for error messages
pub(crate) fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Delete value at path within a document
///
/// For objects this removes the key; for arrays it removes the element and
/// shifts subsequent elements. Deleting the root replaces it with null.
///
/// Returns `Ok(None)` if the path didn't exist.
pub fn delete_at_path(
    root: &mut JsonValue,
    path: &JsonPath,
) -> Result<Option<JsonValue>, JsonPathError> {
    if path.has_wildcard() {
        return Err(JsonPathError::Wildcard);
    }

    let Some(parent) = path.parent() else {
        let old = std::mem::take(root);
        return Ok(Some(old));
    };

    let Some(container) = get_at_path_mut(root, &parent) else {
        return Ok(None);
    };

    match (path.last_segment(), container.as_inner_mut()) {
        (Some(PathSegment::Key(key)), serde_json::Value::Object(obj)) => {
            Ok(obj.remove(key).map(JsonValue::from))
        }
        (Some(PathSegment::Index(idx)), serde_json::Value::Array(arr)) => {
            if *idx < arr.len() {
                Ok(Some(JsonValue::from(arr.remove(*idx))))
            } else {
                Ok(None)
            }
        }
        (Some(PathSegment::Key(_)), other) => Err(JsonPathError::TypeMismatch {
            expected: "object",
            found: value_type_name(other),
        }),
        (Some(PathSegment::Index(_)), other) => Err(JsonPathError::TypeMismatch {
            expected: "array",
            found: value_type_name(other),
        }),
        _ => Err(JsonPathError::Wildcard),
    }
}

/// Get mutable reference to value at path within a document
pub fn get_at_path_mut<'a>(value: &'a mut JsonValue, path: &JsonPath) -> Option<&'a mut JsonValue> {
    let mut current: &mut serde_json::Value = value.as_inner_mut();

    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Key(key), serde_json::Value::Object(obj)) => obj.get_mut(key)?,
            (PathSegment::Index(idx), serde_json::Value::Array(arr)) => arr.get_mut(*idx)?,
            _ => return None,
        };
    }

    // SAFETY: see get_at_path
    Some(unsafe { &mut *(current as *mut serde_json::Value as *mut JsonValue) })
}

// =============================================================================
// Merge Defaults
// =============================================================================

/// Apply `defaults` to `target` only where `target` leaves a field unset
///
/// Objects are merged key by key, recursing into nested objects. Any value
/// already present in `target` wins, including arrays, scalars and explicit
/// nulls. Returns the paths (relative to `target`) of every inserted field,
/// in insertion order.
///
/// # Examples
///
/// ```
/// use pathbind_core::{merge_defaults, JsonValue};
///
/// let mut target: JsonValue = serde_json::json!({"text": "kept"}).into();
/// let defaults: JsonValue = serde_json::json!({"text": "ignored", "subText": "added"}).into();
/// let added = merge_defaults(&mut target, &defaults);
///
/// assert_eq!(added.len(), 1);
/// assert_eq!(target["text"], "kept");
/// assert_eq!(target["subText"], "added");
/// ```
pub fn merge_defaults(target: &mut JsonValue, defaults: &JsonValue) -> Vec<JsonPath> {
    let mut added = Vec::new();
    merge_defaults_inner(
        target.as_inner_mut(),
        defaults.as_inner(),
        &JsonPath::root(),
        &mut added,
    );
    added
}

fn merge_defaults_inner(
    target: &mut serde_json::Value,
    defaults: &serde_json::Value,
    at: &JsonPath,
    added: &mut Vec<JsonPath>,
) {
    let (serde_json::Value::Object(target_obj), serde_json::Value::Object(default_obj)) =
        (target, defaults)
    else {
        return;
    };

    for (key, default_value) in default_obj {
        let child = at.clone().key(key.clone());
        match target_obj.get_mut(key) {
            Some(existing) => merge_defaults_inner(existing, default_value, &child, added),
            None => {
                target_obj.insert(key.clone(), default_value.clone());
                added.push(child);
            }
        }
    }
}
