//! Setter-based construction: start from a blank instance, apply each
//! property through its mutator.

use crate::analyzer::PropertyDescriptor;
use crate::meta::{AnyValue, Construction, Facet, TypeDef};
use crate::spi::{InstanceStrategy, InstanceStrategyFactory, Mutation, PropertyDraft, TypeInspector};
use crate::{Error, Result};

/// Lists fields of setter-constructed types. Every field needs a mutator.
pub struct SetterInspector;

impl TypeInspector for SetterInspector {
    fn name(&self) -> &'static str {
        "setter"
    }

    fn supports(&self, def: &TypeDef) -> bool {
        match def.construction() {
            Construction::Setters(_) => true,
            Construction::Unspecified => def.all_mutable(),
            Construction::Arguments(_) => false,
        }
    }

    fn inspect(
        &self,
        def: &TypeDef,
        facet: Facet,
        sink: &mut dyn FnMut(PropertyDraft) -> Result<()>,
    ) -> Result<()> {
        for field in def.fields().iter().filter(|f| f.attribute.facet() == facet) {
            let mutate = field.mutate.clone().ok_or_else(|| Error::MissingSetter {
                type_name: def.name().to_string(),
                property: field.name.to_string(),
            })?;
            sink(PropertyDraft {
                name: field.name,
                declared: field.declared.clone(),
                access: field.access.clone(),
                mutation: Mutation::Setter(mutate),
                attribute: field.attribute.clone(),
            })?;
        }
        Ok(())
    }
}

pub struct SetterFactory;

impl InstanceStrategyFactory for SetterFactory {
    fn name(&self) -> &'static str {
        "setter"
    }

    fn supports(&self, def: &TypeDef) -> bool {
        matches!(def.construction(), Construction::Setters(_))
    }

    fn create(&self, def: &TypeDef) -> Result<Box<dyn InstanceStrategy>> {
        let Construction::Setters(create) = def.construction() else {
            return Err(Error::NoInstanceStrategy { type_name: def.name().to_string() });
        };
        Ok(Box::new(SetterStrategy {
            type_name: def.name(),
            instance: create.create(),
        }))
    }
}

struct SetterStrategy {
    type_name: &'static str,
    instance: AnyValue,
}

impl InstanceStrategy for SetterStrategy {
    fn add(&mut self, property: &PropertyDescriptor, value: AnyValue) -> Result<()> {
        match &property.mutation {
            Mutation::Setter(mutate) => mutate.set(&mut *self.instance, value),
            Mutation::Argument => Err(Error::MissingSetter {
                type_name: self.type_name.to_string(),
                property: property.name.to_string(),
            }),
        }
    }

    fn finish(self: Box<Self>) -> Result<AnyValue> {
        Ok(self.instance)
    }
}
