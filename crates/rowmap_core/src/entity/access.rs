//! Field-level access to entity instances.

use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use rowmap_codec::{Row, Value};

/// A struct the manager can load, track and write back.
///
/// The trait is the capability table the manager works through: read a field
/// by name, write a field by name, and build a fresh instance from a row keyed
/// by property name. Column naming and key layout live in
/// [`crate::EntityAttributes`], not here.
///
/// Most entities implement the three methods with [`crate::entity_accessors!`]:
///
/// ```rust
/// use rowmap_core::{entity_accessors, Entity};
///
/// struct Setting {
///     key: String,
///     value: Option<String>,
/// }
///
/// impl Entity for Setting {
///     const ENTITY_TYPE: &'static str = "Setting";
///     entity_accessors!(key, value);
/// }
/// ```
pub trait Entity: Send + Sync + 'static {
    /// Unqualified type name; the manager prefixes the configured namespace.
    const ENTITY_TYPE: &'static str;

    /// Returns the current value of `field`, or `None` if there is no such
    /// field.
    fn read_field(&self, field: &str) -> Option<Value>;

    /// Assigns `value` to `field`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] for an unknown field, or a codec
    /// error if the value does not convert to the field type.
    fn write_field(&mut self, field: &str, value: &Value) -> CoreResult<()>;

    /// Builds an instance from a row keyed by property name.
    ///
    /// # Errors
    ///
    /// Returns an error if a property is missing or does not convert.
    fn from_row(row: &Row) -> CoreResult<Self>
    where
        Self: Sized;
}

/// Implements [`Entity::read_field`], [`Entity::write_field`] and
/// [`Entity::from_row`] for a struct whose fields are all mapped.
///
/// Every listed field must convert into [`crate::Value`] and implement
/// [`crate::FromValue`]. Structs with unmapped fields implement the methods
/// by hand.
#[macro_export]
macro_rules! entity_accessors {
    ($($field:ident),+ $(,)?) => {
        fn read_field(&self, field: &str) -> ::core::option::Option<$crate::Value> {
            match field {
                $(
                    ::core::stringify!($field) => ::core::option::Option::Some(
                        $crate::Value::from(::core::clone::Clone::clone(&self.$field)),
                    ),
                )+
                _ => ::core::option::Option::None,
            }
        }

        fn write_field(&mut self, field: &str, value: &$crate::Value) -> $crate::CoreResult<()> {
            match field {
                $(
                    ::core::stringify!($field) => {
                        self.$field = $crate::FromValue::from_value(value)?;
                        ::core::result::Result::Ok(())
                    }
                )+
                _ => ::core::result::Result::Err($crate::CoreError::unknown_field(
                    <Self as $crate::Entity>::ENTITY_TYPE,
                    field,
                )),
            }
        }

        fn from_row(row: &$crate::Row) -> $crate::CoreResult<Self> {
            ::core::result::Result::Ok(Self {
                $($field: row.get_as(::core::stringify!($field))?,)+
            })
        }
    };
}

/// Type-erased view of a tracked instance.
///
/// Access never blocks: if the caller holds a conflicting guard on the
/// instance the call fails with [`CoreError::InvalidState`].
pub(crate) trait TrackedInstance: Send + Sync {
    fn entity_type(&self) -> &'static str;

    /// Reads `fields` under a single guard, in order.
    fn read_fields(&self, fields: &[&str]) -> CoreResult<Vec<Value>>;

    fn write_field(&self, field: &str, value: &Value) -> CoreResult<()>;

    /// Takes the write guard, reads `fields` and hands them to `produce`.
    /// A value it returns is assigned to `target` before the guard is
    /// released. Returns `fields` as they read after the assignment.
    fn write_back(
        &self,
        fields: &[&str],
        target: Option<&str>,
        produce: &mut dyn FnMut(Vec<Value>) -> CoreResult<Option<Value>>,
    ) -> CoreResult<Vec<Value>>;
}

fn read_all<T: Entity>(entity: &T, fields: &[&str]) -> CoreResult<Vec<Value>> {
    fields
        .iter()
        .map(|field| {
            entity
                .read_field(field)
                .ok_or_else(|| CoreError::unknown_field(T::ENTITY_TYPE, *field))
        })
        .collect()
}

impl<T: Entity> TrackedInstance for RwLock<T> {
    fn entity_type(&self) -> &'static str {
        T::ENTITY_TYPE
    }

    fn read_fields(&self, fields: &[&str]) -> CoreResult<Vec<Value>> {
        let guard = self.try_read().ok_or_else(|| {
            CoreError::invalid_state(format!(
                "{} instance is locked for writing",
                T::ENTITY_TYPE
            ))
        })?;
        read_all(&*guard, fields)
    }

    fn write_field(&self, field: &str, value: &Value) -> CoreResult<()> {
        let mut guard = self.try_write().ok_or_else(|| {
            CoreError::invalid_state(format!("{} instance is borrowed", T::ENTITY_TYPE))
        })?;
        guard.write_field(field, value)
    }

    fn write_back(
        &self,
        fields: &[&str],
        target: Option<&str>,
        produce: &mut dyn FnMut(Vec<Value>) -> CoreResult<Option<Value>>,
    ) -> CoreResult<Vec<Value>> {
        let mut guard = self.try_write().ok_or_else(|| {
            CoreError::invalid_state(format!("{} instance is borrowed", T::ENTITY_TYPE))
        })?;
        let produced = produce(read_all(&*guard, fields)?)?;
        if let (Some(field), Some(value)) = (target, produced) {
            guard.write_field(field, &value)?;
        }
        read_all(&*guard, fields)
    }
}
