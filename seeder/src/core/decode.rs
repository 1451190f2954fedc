//! Case-insensitive decoding of JSON values into typed targets.
//!
//! Definition files are authored by hand, so `Order`, `order` and `ORDER`
//! must all reach the same struct field, and enum values written as
//! `value1` must match a `Value1` variant. Serde matches names exactly, so
//! this module wraps a [`Value`] in a deserializer that folds object keys and
//! enum variant names onto the names the target type asks for. Folding
//! happens at every nesting level, in a single pass.

use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer,
    VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

type Error = serde_json::Error;

/// Decode `value` into `T`, matching field and variant names ignoring ASCII case.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(FoldCase(value))
}

struct FoldCase(Value);

impl<'de> IntoDeserializer<'de, Error> for FoldCase {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for FoldCase {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.0 {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
                (Some(u), _, _) => visitor.visit_u64(u),
                (None, Some(i), _) => visitor.visit_i64(i),
                (None, None, Some(f)) => visitor.visit_f64(f),
                _ => Err(de::Error::custom(format!("unsupported number {n}"))),
            },
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visit_array(items, visitor),
            Value::Object(map) => visit_object(map.into_iter().collect(), visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(FoldCase(other)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.0 {
            Value::Object(map) => visit_object(fold_keys(map, fields), visitor),
            other => FoldCase(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.0 {
            Value::String(variant) => {
                let access: StringDeserializer<Error> =
                    fold_name(variant, variants).into_deserializer();
                visitor.visit_enum(access)
            }
            Value::Object(map) if map.len() == 1 => {
                let Some((variant, content)) = map.into_iter().next() else {
                    return Err(de::Error::custom("empty enum object"));
                };
                visitor.visit_enum(FoldVariant {
                    variant: fold_name(variant, variants),
                    content,
                })
            }
            other => Err(de::Error::invalid_type(
                unexpected(&other),
                &"a variant name or a single-key object",
            )),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

fn visit_array<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> Result<V::Value, Error> {
    let mut seq = SeqDeserializer::<_, Error>::new(items.into_iter().map(FoldCase));
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

fn visit_object<'de, V: Visitor<'de>>(
    entries: Vec<(String, Value)>,
    visitor: V,
) -> Result<V::Value, Error> {
    let mut map = MapDeserializer::<_, Error>::new(
        entries
            .into_iter()
            .map(|(key, value)| (key, FoldCase(value))),
    );
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

/// Rename keys that match a declared field ignoring case. Keys are kept as a
/// list so two spellings of one field surface as a duplicate-field error.
fn fold_keys(map: Map<String, Value>, fields: &'static [&'static str]) -> Vec<(String, Value)> {
    map.into_iter()
        .map(|(key, value)| (fold_name(key, fields), value))
        .collect()
}

fn fold_name(name: String, candidates: &'static [&'static str]) -> String {
    if candidates.contains(&name.as_str()) {
        return name;
    }
    candidates
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(&name))
        .map_or(name, |candidate| (*candidate).to_string())
}

fn unexpected(value: &Value) -> de::Unexpected<'_> {
    match value {
        Value::Null => de::Unexpected::Unit,
        Value::Bool(b) => de::Unexpected::Bool(*b),
        Value::Number(_) => de::Unexpected::Other("number"),
        Value::String(s) => de::Unexpected::Str(s),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
    }
}

struct FoldVariant {
    variant: String,
    content: Value,
}

impl<'de> EnumAccess<'de> for FoldVariant {
    type Error = Error;
    type Variant = FoldCase;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, FoldCase), Error> {
        let name: StringDeserializer<Error> = self.variant.into_deserializer();
        let value = seed.deserialize(name)?;
        Ok((value, FoldCase(self.content)))
    }
}

impl<'de> VariantAccess<'de> for FoldCase {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.0 {
            Value::Null => Ok(()),
            other => Err(de::Error::invalid_type(unexpected(&other), &"unit variant")),
        }
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, Error> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        Deserializer::deserialize_any(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}
