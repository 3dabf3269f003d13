//! # Stock Strategies
//!
//! The implementations every [`Mapper`](crate::Mapper) starts with, grouped
//! into installable [`Module`]s.
//!
//! | Module | Registers |
//! |--------|-----------|
//! | [`StandardModule`] | scalar converters, element resolvers, multiplicity factories, `Option` wrapper |
//! | [`SetterModule`] | setter inspector + factory |
//! | [`RecordModule`] | record inspector + factory |

pub mod convert;
pub mod element;
pub mod multiplicity;
pub mod record;
pub mod setter;
pub mod wrapper;

pub use convert::{BoolConverter, FromStrConverter, IriConverter, StringConverter};
pub use element::{ArrayResolver, ParameterizedResolver};
pub use multiplicity::{ArrayFactory, CollectionFactory, OptionalFactory, SingleFactory};
pub use record::{RecordFactory, RecordInspector};
pub use setter::{SetterFactory, SetterInspector};
pub use wrapper::OptionalWrapper;

use crate::spi::{Module, Registry};

/// Converters, element resolvers, multiplicities and the `Option` wrapper.
pub struct StandardModule;

impl Module for StandardModule {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn setup(&self, registry: &mut Registry) {
        convert::register_scalars(registry);
        registry
            .add_resolver(ParameterizedResolver)
            .add_resolver(ArrayResolver)
            .add_multiplicity(SingleFactory)
            .add_multiplicity(OptionalFactory)
            .add_multiplicity(CollectionFactory)
            .add_multiplicity(ArrayFactory)
            .add_wrapper(OptionalWrapper);
    }
}

/// Setter-populated entities (`EntityDef::default_constructible`).
pub struct SetterModule;

impl Module for SetterModule {
    fn name(&self) -> &'static str {
        "setter"
    }

    fn setup(&self, registry: &mut Registry) {
        registry.add_inspector(SetterInspector).add_instance_factory(SetterFactory);
    }
}

/// Constructor-built entities (`EntityDef::constructor`).
pub struct RecordModule;

impl Module for RecordModule {
    fn name(&self) -> &'static str {
        "record"
    }

    fn setup(&self, registry: &mut Registry) {
        registry.add_inspector(RecordInspector).add_instance_factory(RecordFactory);
    }
}
