//! Process-wide registry of pre-parsed struct metadata.
//!
//! Registration is a one-shot startup phase by convention: the map grows one
//! way, entries are immutable once inserted, and traversals take a read
//! guard for the duration of one call so they observe a consistent snapshot.

use core::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use log::trace;
use once_cell::sync::Lazy;

use crate::error::Error;
use crate::serializer::validate_ops;
use crate::shape::{FieldShape, Kind, Shape};
use crate::value::Wire;

/// Cached layout of one registered struct.
pub struct StructInfo {
    /// One entry per declared field, in declaration order.
    pub fields: Box<[FieldInfo]>,
}

/// Pre-parsed metadata for one struct field.
pub struct FieldInfo {
    /// Shape of the field's type; `None` for ignored fields.
    pub shape: Option<&'static Shape>,
    /// Skipped in both directions.
    pub ignore: bool,
    /// Varint encoding requested for a fixed-width integer field.
    pub packed: bool,
    /// The field's type carries the full custom-serializer triad.
    pub is_serializer: bool,
}

/// The registry map: struct layouts plus the validated-serializer set.
#[derive(Default)]
pub(crate) struct Registry {
    structs: HashMap<TypeId, StructInfo>,
    serializers: HashSet<TypeId>,
}

impl Registry {
    /// Cached layout for a struct shape, if it was registered.
    pub(crate) fn struct_info(&self, shape: &'static Shape) -> Option<&StructInfo> {
        self.structs.get(&shape.id())
    }

    fn contains(&self, id: TypeId) -> bool {
        self.structs.contains_key(&id) || self.serializers.contains(&id)
    }

    fn add(&mut self, shape: &'static Shape, need_error: bool) -> Result<(), Error> {
        let id = shape.id();
        if self.contains(id) {
            if need_error {
                return Err(Error::DuplicateRegistration(shape.type_identifier));
            }
            return Ok(());
        }

        if let Some(ops) = shape.serializer {
            if let Err(err) = validate_ops(shape.type_identifier, ops) {
                if need_error {
                    return Err(err);
                }
                return Ok(());
            }
            trace!("registering serializer {}", shape.type_identifier);
            self.serializers.insert(id);
            // A serializer struct keeps its layout cached for calls that
            // run with serializers disabled; serializer containers pull in
            // their key/element types.
            match shape.kind {
                Kind::Struct(fields) => self.add_struct(id, fields),
                Kind::Seq(elem) | Kind::Array(_, elem) | Kind::Ptr(elem) => {
                    self.add(elem, false)?;
                }
                Kind::Map(key, value) => {
                    self.add(key, false)?;
                    self.add(value, false)?;
                }
                _ => {}
            }
            return Ok(());
        }

        match shape.kind {
            Kind::Struct(fields) => {
                trace!("registering struct {}", shape.type_identifier);
                self.add_struct(id, fields);
                Ok(())
            }
            _ if need_error => Err(Error::ExpectedStructOrSerializer(shape.type_identifier)),
            Kind::Seq(elem) | Kind::Array(_, elem) | Kind::Ptr(elem) => self.add(elem, false),
            Kind::Map(key, value) => {
                self.add(key, false)?;
                self.add(value, false)
            }
            _ => Ok(()),
        }
    }

    fn add_struct(&mut self, id: TypeId, fields: &'static [FieldShape]) {
        let info = StructInfo {
            fields: fields
                .iter()
                .map(|field| FieldInfo {
                    shape: field.shape,
                    ignore: field.ignore,
                    packed: field.packed,
                    is_serializer: field
                        .shape
                        .is_some_and(|shape| shape.has_full_serializer()),
                })
                .collect(),
        };
        debug_assert_eq!(info.fields.len(), fields.len());
        self.structs.insert(id, info);
        // Field types come along, leniently.
        for field in fields {
            if let Some(field_shape) = field.shape {
                let _ = self.add(field_shape, false);
            }
        }
    }
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));

/// Takes the read guard a traversal holds for the duration of one call.
pub(crate) fn read() -> RwLockReadGuard<'static, Registry> {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

/// Registers `T`, pre-parsing struct field metadata into the cache.
///
/// Only structs and custom serializers are registrable at top level; field,
/// element, and key types are pulled in recursively and leniently. A second
/// registration of the same type fails with
/// [`Error::DuplicateRegistration`]; nothing mutates on failure.
pub fn register<T: Wire>() -> Result<(), Error> {
    let mut registry = REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    registry.add(T::SHAPE, true)
}
