//! Argument-based construction (records, constructors): property values
//! are collected by name and the entity's constructor runs once at the end.

use crate::analyzer::PropertyDescriptor;
use crate::meta::{AnyValue, Arguments, Construct, Construction, Facet, TypeDef};
use crate::spi::{InstanceStrategy, InstanceStrategyFactory, Mutation, PropertyDraft, TypeInspector};
use crate::{Error, Result};
use std::sync::Arc;

/// Lists fields of argument-constructed types. Mutators are ignored.
pub struct RecordInspector;

impl TypeInspector for RecordInspector {
    fn name(&self) -> &'static str {
        "record"
    }

    fn supports(&self, def: &TypeDef) -> bool {
        match def.construction() {
            Construction::Arguments(_) => true,
            Construction::Unspecified => !def.all_mutable(),
            Construction::Setters(_) => false,
        }
    }

    fn inspect(
        &self,
        def: &TypeDef,
        facet: Facet,
        sink: &mut dyn FnMut(PropertyDraft) -> Result<()>,
    ) -> Result<()> {
        for field in def.fields().iter().filter(|f| f.attribute.facet() == facet) {
            sink(PropertyDraft {
                name: field.name,
                declared: field.declared.clone(),
                access: field.access.clone(),
                mutation: Mutation::Argument,
                attribute: field.attribute.clone(),
            })?;
        }
        Ok(())
    }
}

pub struct RecordFactory;

impl InstanceStrategyFactory for RecordFactory {
    fn name(&self) -> &'static str {
        "record"
    }

    fn supports(&self, def: &TypeDef) -> bool {
        matches!(def.construction(), Construction::Arguments(_))
    }

    fn create(&self, def: &TypeDef) -> Result<Box<dyn InstanceStrategy>> {
        let Construction::Arguments(construct) = def.construction() else {
            return Err(Error::NoInstanceStrategy { type_name: def.name().to_string() });
        };
        Ok(Box::new(RecordStrategy {
            construct: construct.clone(),
            arguments: Arguments::new(def.name()),
        }))
    }
}

struct RecordStrategy {
    construct: Arc<dyn Construct>,
    arguments: Arguments,
}

impl InstanceStrategy for RecordStrategy {
    fn add(&mut self, property: &PropertyDescriptor, value: AnyValue) -> Result<()> {
        self.arguments.insert(property.name, value);
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<AnyValue> {
        self.construct.construct(&mut self.arguments)
    }
}
