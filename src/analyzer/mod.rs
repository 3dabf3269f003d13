//! # Type Analyzer
//!
//! Builds one [`TypeDescriptor`] per entity type and caches it for the life
//! of the analyzer.
//!
//! Analysis walks the parent entity first (its descriptor is copied and
//! re-based), merges the type's own subject / `rdf:type` declarations, picks
//! an instance strategy factory and a type inspector, then resolves every
//! discovered property: intrinsic element type, nested analysis or scalar
//! converter, multiplicity factory and write wrapper.
//!
//! A per-call stack of types under analysis breaks cycles: a nested type
//! already on the stack is accepted as nested without re-entering it. The
//! cache is only written once a descriptor is complete.

pub mod descriptor;

use std::any::TypeId;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

pub use descriptor::{PropertyDescriptor, SubjectDescriptor, TypeDescriptor, TypeEmission, ValueKind};

use crate::meta::{Attribute, Facet, Reflect, TypeDef, TypeRef};
use crate::model::Iri;
use crate::spi::{PropertyDraft, Registry};
use crate::{Error, Result};

/// Descriptor cache in front of a frozen [`Registry`].
pub struct Analyzer {
    registry: Registry,
    cache: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

impl Analyzer {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn analyze<T: Reflect>(&self) -> Result<Arc<TypeDescriptor>> {
        self.analyze_type(&T::type_ref())
    }

    pub fn analyze_type(&self, ty: &TypeRef) -> Result<Arc<TypeDescriptor>> {
        let mut in_progress = Vec::new();
        self.analyze_in(ty, &mut in_progress)
    }

    /// Cached descriptor, without analyzing.
    pub fn cached(&self, ty: &TypeRef) -> Option<Arc<TypeDescriptor>> {
        self.cache.read().get(&ty.id()).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    fn analyze_in(&self, ty: &TypeRef, in_progress: &mut Vec<TypeId>) -> Result<Arc<TypeDescriptor>> {
        if let Some(hit) = self.cached(ty) {
            tracing::trace!(type_name = ty.name(), "descriptor cache hit");
            return Ok(hit);
        }
        let definition = ty.definition().ok_or_else(|| Error::NotAnEntity {
            type_name: ty.name().to_string(),
        })?;
        tracing::debug!(type_name = ty.name(), depth = in_progress.len(), "analyzing type");

        in_progress.push(ty.id());
        let built = self.build(ty, Arc::new(definition), in_progress);
        in_progress.pop();
        let descriptor = built?;

        tracing::debug!(
            type_name = ty.name(),
            properties = descriptor.properties.len(),
            types = descriptor.types.len(),
            instantiable = descriptor.factory.is_some(),
            "type analyzed"
        );
        // Racing analyses produce equal descriptors; the first one stored wins.
        let mut cache = self.cache.write();
        Ok(cache.entry(ty.id()).or_insert_with(|| Arc::new(descriptor)).clone())
    }

    fn build(&self, ty: &TypeRef, def: Arc<TypeDef>, in_progress: &mut Vec<TypeId>) -> Result<TypeDescriptor> {
        let mut descriptor = match def.parent() {
            Some(parent) if parent.type_ref.is_entity() && !in_progress.contains(&parent.type_ref.id()) => {
                let inherited = self.analyze_in(&parent.type_ref, in_progress)?;
                TypeDescriptor::inherit(&inherited, parent, ty.clone(), def.clone())
            }
            _ => TypeDescriptor::empty(ty.clone(), def.clone()),
        };

        if let Some(subject) = def.subject() {
            descriptor.subject = Some(SubjectDescriptor::Type(subject.clone()));
        }
        for declared in def.types() {
            descriptor.types.push(TypeEmission {
                iris: validate_iris(&declared.iris)?,
                property: None,
            });
        }

        descriptor.factory = self.registry.instance_factory_for(&def);
        let inspector = self.registry.inspector_for(&def).ok_or_else(|| Error::NoInspector {
            type_name: def.name().to_string(),
        })?;

        for facet in [Facet::Predicate, Facet::Subject, Facet::Type] {
            let mut drafts = Vec::new();
            inspector.inspect(&def, facet, &mut |draft| {
                drafts.push(draft);
                Ok(())
            })?;

            for draft in drafts {
                let property = Arc::new(self.resolve_property(&def, draft, in_progress)?);
                match &property.attribute {
                    Attribute::Predicate(_) => descriptor.properties.push(property),
                    Attribute::Subject(rule) => {
                        descriptor.subject = Some(SubjectDescriptor::Property {
                            rule: rule.clone(),
                            property: property.clone(),
                        });
                    }
                    Attribute::Type(types) => descriptor.types.push(TypeEmission {
                        iris: validate_iris(&types.iris)?,
                        property: Some(property.clone()),
                    }),
                }
            }
        }
        Ok(descriptor)
    }

    fn resolve_property(
        &self,
        def: &TypeDef,
        draft: PropertyDraft,
        in_progress: &mut Vec<TypeId>,
    ) -> Result<PropertyDescriptor> {
        let qualified = || format!("{}.{}", def.name(), draft.name);
        let intrinsic = self.registry.resolve_element(&draft.declared)?;

        let value = if intrinsic.is_builtin() {
            let converter = self.registry.converter_for(&intrinsic).ok_or_else(|| Error::NoValueConverter {
                type_name: intrinsic.name().to_string(),
                property: qualified(),
            })?;
            ValueKind::Scalar(converter)
        } else {
            if !in_progress.contains(&intrinsic.id()) {
                self.analyze_in(&intrinsic, in_progress)
                    .map_err(|source| Error::NestedAnalysis {
                        property: qualified(),
                        source: Box::new(source),
                    })?;
            }
            ValueKind::Nested
        };

        let multiplicity = self.registry.multiplicity_for(&draft.declared).ok_or_else(|| Error::NoMultiplicity {
            type_name: draft.declared.name().to_string(),
            property: qualified(),
        })?;
        let wrapper = self.registry.wrapper_for(&draft.declared);

        tracing::trace!(property = %qualified(), intrinsic = intrinsic.name(), "property resolved");
        PropertyDescriptor::new(
            draft.name,
            draft.declared,
            intrinsic,
            draft.access,
            draft.mutation,
            wrapper,
            multiplicity,
            value,
            draft.attribute,
        )
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("registry", &self.registry)
            .field("cached", &self.cache_len())
            .finish()
    }
}

fn validate_iris(iris: &[String]) -> Result<Vec<Iri>> {
    iris.iter().map(|iri| Iri::new(iri.as_str())).collect()
}
