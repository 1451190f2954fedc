//! Explicit table of seedable item types and their handlers.
//!
//! The set of item types a host can seed is closed and known at build time,
//! so resolution is a plain lookup: a logical name resolves to a
//! [`TypeHandle`], and a handle maps to at most one handler. A name may be
//! registered without a handler; validation reports such steps as unmapped.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::decode::decode;

/// Resolved identity of a registered item type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    name: String,
    type_id: TypeId,
}

impl TypeHandle {
    fn of<T: 'static>(name: String) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
        }
    }

    /// Logical name the type was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Answers whether a resolved type has a handler.
///
/// Validation only needs this question, not the handlers themselves.
pub trait HandlerLookup {
    fn has_handler(&self, handle: &TypeHandle) -> bool;
}

/// Why a single item could not be processed.
#[derive(Debug)]
pub(crate) enum ItemFailure {
    Unmapped,
    Decode(serde_json::Error),
    Handler(anyhow::Error),
}

trait ErasedHandler {
    fn invoke(&mut self, item: Value) -> Result<(), ItemFailure>;
}

struct TypedHandler<T, F> {
    handler: F,
    _item: PhantomData<fn(T)>,
}

impl<T, F> ErasedHandler for TypedHandler<T, F>
where
    T: DeserializeOwned,
    F: FnMut(T) -> anyhow::Result<()>,
{
    fn invoke(&mut self, item: Value) -> Result<(), ItemFailure> {
        let typed: T = decode(item).map_err(ItemFailure::Decode)?;
        (self.handler)(typed).map_err(ItemFailure::Handler)
    }
}

/// Registry mapping logical item type names to typed handlers.
#[derive(Default)]
pub struct ItemRegistry {
    types: BTreeMap<String, TypeHandle>,
    handlers: HashMap<TypeId, Box<dyn ErasedHandler>>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `T` resolvable under `name`. Re-registering a name replaces it.
    pub fn register_type<T>(&mut self, name: impl Into<String>) -> TypeHandle
    where
        T: DeserializeOwned + 'static,
    {
        let handle = TypeHandle::of::<T>(name.into());
        self.types.insert(handle.name.clone(), handle.clone());
        handle
    }

    /// Install the handler that receives every decoded `T`.
    pub fn register_handler<T, F>(&mut self, handler: F)
    where
        T: DeserializeOwned + 'static,
        F: FnMut(T) -> anyhow::Result<()> + 'static,
    {
        self.handlers.insert(
            TypeId::of::<T>(),
            Box::new(TypedHandler {
                handler,
                _item: PhantomData,
            }),
        );
    }

    /// Register `T` under `name` together with its handler.
    pub fn register<T, F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        T: DeserializeOwned + 'static,
        F: FnMut(T) -> anyhow::Result<()> + 'static,
    {
        self.register_type::<T>(name);
        self.register_handler::<T, F>(handler);
        self
    }

    /// Resolve a logical name. Names are matched exactly.
    pub fn resolve_type(&self, name: &str) -> Option<TypeHandle> {
        self.types.get(name).cloned()
    }

    /// Registered logical names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Decode `item` as the handle's type and hand it to the handler.
    pub(crate) fn invoke(&mut self, handle: &TypeHandle, item: Value) -> Result<(), ItemFailure> {
        let handler = self
            .handlers
            .get_mut(&handle.type_id)
            .ok_or(ItemFailure::Unmapped)?;
        handler.invoke(item)
    }
}

impl HandlerLookup for ItemRegistry {
    fn has_handler(&self, handle: &TypeHandle) -> bool {
        self.handlers.contains_key(&handle.type_id)
    }
}

impl fmt::Debug for ItemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
