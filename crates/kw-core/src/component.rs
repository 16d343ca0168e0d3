use std::any::Any;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::entity::Entity;
use crate::event::EventKind;
use crate::store::{ErasedTable, Table};
use crate::world::World;

/// The closed set of components a [`World`] can hold.
///
/// A schema ties together three generated types: an enum of component names,
/// an enum carrying any one component value (used for dumps and restores),
/// and a struct holding one typed [`Table`] per component. Implement it with
/// [`component_schema!`](crate::component_schema) rather than by hand.
pub trait Schema: Sized + 'static {
    /// Component names. One variant per component type.
    type Name: Copy
        + Eq
        + Ord
        + Hash
        + fmt::Debug
        + fmt::Display
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + 'static;

    /// An owned value of any component, tagged by its name.
    type Value: Clone + fmt::Debug + Send + Serialize + DeserializeOwned;

    /// Per-component tables. Every table starts out unallocated.
    type Tables: Default + Send;

    /// Every name in declaration order.
    const NAMES: &'static [Self::Name];

    /// Type-erased view of the table for `name`, if it was ever allocated.
    fn table(tables: &Self::Tables, name: Self::Name) -> Option<&dyn ErasedTable<Self>>;

    /// Mutable type-erased view of the table for `name`.
    fn table_mut(tables: &mut Self::Tables, name: Self::Name)
    -> Option<&mut dyn ErasedTable<Self>>;

    /// The name a tagged value belongs to.
    fn name_of(value: &Self::Value) -> Self::Name;

    /// Unwrap a tagged value and attach it through [`World::add_component`].
    fn attach(world: &mut World<Self>, entity: Entity, value: Self::Value) -> EventKind;
}

/// A value type registered under exactly one name of schema `S`.
pub trait Component<S: Schema>: Clone + fmt::Debug + Send + 'static {
    /// The name this type is stored under.
    const NAME: S::Name;

    /// This component's table, if allocated.
    fn table(tables: &S::Tables) -> Option<&Table<Self>>;

    /// The slot holding this component's table. Allocated lazily by the store.
    fn table_slot(tables: &mut S::Tables) -> &mut Option<Table<Self>>;

    /// Wrap into the schema's tagged value.
    fn into_value(self) -> S::Value;
}

/// Object-safe view of a stored component, used by events.
pub trait ComponentData: Any + fmt::Debug {
    /// Upcast for downcasting back to the concrete component type.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> ComponentData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Declare a component schema.
///
/// ```ignore
/// component_schema! {
///     /// Components of the arena demo.
///     pub schema Arena(ArenaComponent, ArenaValue, ArenaTables) {
///         Transform => Transform,
///         Health => Health,
///     }
/// }
/// ```
///
/// Generates the marker type `Arena`, the name enum `ArenaComponent`, the
/// tagged value enum `ArenaValue`, the table struct `ArenaTables`, and the
/// [`Schema`] / [`Component`] impls. Component types must implement `Clone`,
/// `Debug`, `Send`, `Serialize` and `Deserialize`; the invoking crate needs a
/// `serde` dependency with the `derive` feature.
#[macro_export]
macro_rules! component_schema {
    (
        $(#[$meta:meta])*
        $vis:vis schema $schema:ident($name:ident, $value:ident, $tables:ident) {
            $( $variant:ident => $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $schema;

        /// Component names of this schema.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        $vis enum $name {
            $(
                #[allow(missing_docs)]
                $variant,
            )+
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let label = match self {
                    $( Self::$variant => stringify!($variant), )+
                };
                f.write_str(label)
            }
        }

        /// Any component value of this schema, tagged by name.
        #[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(tag = "component", content = "value")]
        $vis enum $value {
            $(
                #[allow(missing_docs)]
                $variant($ty),
            )+
        }

        /// One lazily allocated table per component of this schema.
        #[derive(Default)]
        #[allow(non_snake_case)]
        $vis struct $tables {
            $( $variant: ::std::option::Option<$crate::store::Table<$ty>>, )+
        }

        impl $crate::component::Schema for $schema {
            type Name = $name;
            type Value = $value;
            type Tables = $tables;

            const NAMES: &'static [$name] = &[ $( $name::$variant, )+ ];

            fn table(
                tables: &$tables,
                name: $name,
            ) -> ::std::option::Option<&dyn $crate::store::ErasedTable<Self>> {
                match name {
                    $(
                        $name::$variant => tables
                            .$variant
                            .as_ref()
                            .map(|t| t as &dyn $crate::store::ErasedTable<Self>),
                    )+
                }
            }

            fn table_mut(
                tables: &mut $tables,
                name: $name,
            ) -> ::std::option::Option<&mut dyn $crate::store::ErasedTable<Self>> {
                match name {
                    $(
                        $name::$variant => tables
                            .$variant
                            .as_mut()
                            .map(|t| t as &mut dyn $crate::store::ErasedTable<Self>),
                    )+
                }
            }

            fn name_of(value: &$value) -> $name {
                match value {
                    $( $value::$variant(_) => $name::$variant, )+
                }
            }

            fn attach(
                world: &mut $crate::world::World<Self>,
                entity: $crate::entity::Entity,
                value: $value,
            ) -> $crate::event::EventKind {
                match value {
                    $( $value::$variant(component) => world.add_component(entity, component), )+
                }
            }
        }

        $(
            impl $crate::component::Component<$schema> for $ty {
                const NAME: $name = $name::$variant;

                fn table(tables: &$tables) -> ::std::option::Option<&$crate::store::Table<Self>> {
                    tables.$variant.as_ref()
                }

                fn table_slot(
                    tables: &mut $tables,
                ) -> &mut ::std::option::Option<$crate::store::Table<Self>> {
                    &mut tables.$variant
                }

                fn into_value(self) -> $value {
                    $value::$variant(self)
                }
            }
        )+
    };
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn names_follow_declaration_order() {
        assert_eq!(
            Game::NAMES,
            &[
                GameComponent::Transform,
                GameComponent::Velocity,
                GameComponent::Health,
                GameComponent::Label,
            ]
        );
    }

    #[test]
    fn each_type_binds_to_its_own_name() {
        assert_eq!(<Health as Component<Game>>::NAME, GameComponent::Health);
        assert_eq!(<Label as Component<Game>>::NAME, GameComponent::Label);
    }

    #[test]
    fn name_display_is_variant_name() {
        assert_eq!(GameComponent::Velocity.to_string(), "Velocity");
    }

    #[test]
    fn value_knows_its_name() {
        let value = Health(3).into_value();
        assert_eq!(Game::name_of(&value), GameComponent::Health);
    }

    #[test]
    fn value_serializes_adjacently_tagged() {
        let json = serde_json::to_string(&Health(7).into_value()).unwrap();
        assert_eq!(json, r#"{"component":"Health","value":7}"#);
        let back: GameValue = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, GameValue::Health(Health(7))));
    }

    #[test]
    fn component_data_downcasts_to_concrete_type() {
        let hp = Health(9);
        let data: &dyn ComponentData = &hp;
        assert_eq!(data.as_any().downcast_ref::<Health>(), Some(&Health(9)));
        assert!(data.as_any().downcast_ref::<Label>().is_none());
    }

    #[test]
    fn tables_start_unallocated() {
        let tables = GameTables::default();
        for name in Game::NAMES {
            assert!(Game::table(&tables, *name).is_none());
        }
    }
}
