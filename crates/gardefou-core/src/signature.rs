//! Call arguments and the canonical signature used for duplicate detection.
//!
//! Arguments are captured as JSON values so that calls with arbitrary Rust
//! argument types can be compared. Positional order is significant; keyword
//! order is not.
//!
//! Capture is injective per argument type: two different values of one type
//! never produce the same [`CallArgs`]. Only shapes fixed by the type itself
//! (unit, tuples, structs) are spread into several arguments; everything else
//! stays one positional argument. Non-finite floats have no JSON encoding and
//! are rejected.

use std::collections::BTreeMap;

use serde::ser::{self, Serialize};
use serde_json::{Map, Value};

use crate::error::{GuardError, Result};

/// Positional and keyword arguments of one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Serialize) -> Result<Self> {
        self.positional.push(capture(&value)?.1);
        Ok(self)
    }

    /// Sets a keyword argument, replacing any previous value under `name`.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Serialize) -> Result<Self> {
        self.keyword.insert(name.into(), capture(&value)?.1);
        Ok(self)
    }

    /// Captures a serializable argument bundle.
    ///
    /// Tuples, tuple structs and fixed-size arrays become positional
    /// arguments, structs become keyword arguments and `()` becomes an empty
    /// list. Any other value (options, vectors, maps, enums, scalars) becomes
    /// a single positional argument.
    ///
    /// # Errors
    /// Returns [`GuardError::Arguments`] if the value has no JSON form, such
    /// as a map with non-string keys or a NaN or infinite float.
    pub fn from_serialize<T: Serialize + ?Sized>(args: &T) -> Result<Self> {
        Ok(match capture(args)? {
            (Shape::Unit, _) => Self::default(),
            (Shape::Tuple, Value::Array(positional)) => Self {
                positional,
                keyword: BTreeMap::new(),
            },
            (Shape::Struct, Value::Object(map)) => Self {
                positional: Vec::new(),
                keyword: map.into_iter().collect(),
            },
            (_, single) => Self {
                positional: vec![single],
                keyword: BTreeMap::new(),
            },
        })
    }

    /// Positional arguments in call order.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments, sorted by name.
    #[must_use]
    pub const fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    /// Returns true if the call carries no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// JSON rendering of the positional arguments, e.g. `[1,"a"]`.
    #[must_use]
    pub fn positional_display(&self) -> String {
        Value::Array(self.positional.clone()).to_string()
    }

    /// JSON rendering of the keyword arguments, e.g. `{"x":2}`.
    #[must_use]
    pub fn keyword_display(&self) -> String {
        let map: Map<String, Value> = self
            .keyword
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map).to_string()
    }
}

fn capture<T: Serialize + ?Sized>(value: &T) -> Result<(Shape, Value)> {
    let shape = value
        .serialize(ShapeOf)
        .map_err(|e| GuardError::arguments(e.to_string()))?;
    let value = serde_json::to_value(value).map_err(|e| GuardError::arguments(e.to_string()))?;
    Ok((shape, value))
}

/// Top-level form of a serialized argument bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Unit,
    Tuple,
    Struct,
    Single,
}

/// Serializer that reports the top-level [`Shape`] of a value and rejects
/// non-finite floats at any depth. Produces no output.
struct ShapeOf;

/// Walks the elements of a compound value, keeping its top-level shape.
struct Walk(Shape);

type WalkResult = std::result::Result<Shape, serde_json::Error>;

fn finite(v: f64) -> WalkResult {
    if v.is_finite() {
        Ok(Shape::Single)
    } else {
        Err(ser::Error::custom(format!("float {v} has no JSON representation")))
    }
}

fn walk<T: Serialize + ?Sized>(value: &T) -> std::result::Result<(), serde_json::Error> {
    value.serialize(ShapeOf).map(|_| ())
}

impl ser::Serializer for ShapeOf {
    type Ok = Shape;
    type Error = serde_json::Error;
    type SerializeSeq = Walk;
    type SerializeTuple = Walk;
    type SerializeTupleStruct = Walk;
    type SerializeTupleVariant = Walk;
    type SerializeMap = Walk;
    type SerializeStruct = Walk;
    type SerializeStructVariant = Walk;

    fn serialize_bool(self, _: bool) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_i8(self, _: i8) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_i16(self, _: i16) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_i32(self, _: i32) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_i64(self, _: i64) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_i128(self, _: i128) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_u8(self, _: u8) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_u16(self, _: u16) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_u32(self, _: u32) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_u64(self, _: u64) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_u128(self, _: u128) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_f32(self, v: f32) -> WalkResult {
        finite(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> WalkResult {
        finite(v)
    }

    fn serialize_char(self, _: char) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_str(self, _: &str) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_bytes(self, _: &[u8]) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_none(self) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> WalkResult {
        walk(value).map(|()| Shape::Single)
    }

    fn serialize_unit(self) -> WalkResult {
        Ok(Shape::Unit)
    }

    fn serialize_unit_struct(self, _: &'static str) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> WalkResult {
        Ok(Shape::Single)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> WalkResult {
        walk(value).map(|()| Shape::Single)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> WalkResult {
        walk(value).map(|()| Shape::Single)
    }

    fn serialize_seq(self, _: Option<usize>) -> std::result::Result<Walk, serde_json::Error> {
        Ok(Walk(Shape::Single))
    }

    fn serialize_tuple(self, _: usize) -> std::result::Result<Walk, serde_json::Error> {
        Ok(Walk(Shape::Tuple))
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Walk, serde_json::Error> {
        Ok(Walk(Shape::Tuple))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Walk, serde_json::Error> {
        Ok(Walk(Shape::Single))
    }

    fn serialize_map(self, _: Option<usize>) -> std::result::Result<Walk, serde_json::Error> {
        Ok(Walk(Shape::Single))
    }

    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Walk, serde_json::Error> {
        Ok(Walk(Shape::Struct))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Walk, serde_json::Error> {
        Ok(Walk(Shape::Single))
    }
}

impl ser::SerializeSeq for Walk {
    type Ok = Shape;
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(value)
    }

    fn end(self) -> WalkResult {
        Ok(self.0)
    }
}

impl ser::SerializeTuple for Walk {
    type Ok = Shape;
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(value)
    }

    fn end(self) -> WalkResult {
        Ok(self.0)
    }
}

impl ser::SerializeTupleStruct for Walk {
    type Ok = Shape;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(value)
    }

    fn end(self) -> WalkResult {
        Ok(self.0)
    }
}

impl ser::SerializeTupleVariant for Walk {
    type Ok = Shape;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(value)
    }

    fn end(self) -> WalkResult {
        Ok(self.0)
    }
}

impl ser::SerializeMap for Walk {
    type Ok = Shape;
    type Error = serde_json::Error;

    fn serialize_key<T: Serialize + ?Sized>(
        &mut self,
        key: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(key)
    }

    fn serialize_value<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(value)
    }

    fn end(self) -> WalkResult {
        Ok(self.0)
    }
}

impl ser::SerializeStruct for Walk {
    type Ok = Shape;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(value)
    }

    fn end(self) -> WalkResult {
        Ok(self.0)
    }
}

impl ser::SerializeStructVariant for Walk {
    type Ok = Shape;
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> std::result::Result<(), Self::Error> {
        walk(value)
    }

    fn end(self) -> WalkResult {
        Ok(self.0)
    }
}

/// Canonical identity of a call: callable name plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSignature {
    identity: String,
    canonical_args: String,
}

impl CallSignature {
    /// Computes the signature of a call.
    #[must_use]
    pub fn new(identity: &str, args: &CallArgs) -> Self {
        let positional = args.positional.iter().map(canonicalize).collect();
        let keyword = args
            .keyword
            .iter()
            .map(|(k, v)| (k.clone(), canonicalize(v)))
            .collect();
        let canonical_args = Value::Array(vec![Value::Array(positional), Value::Object(keyword)]);

        Self {
            identity: identity.to_string(),
            canonical_args: canonical_args.to_string(),
        }
    }

    /// Identity of the callable.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Rebuilds nested objects with sorted keys.
///
/// `serde_json::Map` is already sorted by default; this keeps signatures
/// stable if the `preserve_order` feature gets enabled through feature
/// unification elsewhere in the dependency graph.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}
