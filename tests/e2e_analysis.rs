//! End-to-end tests for type analysis and strategy selection.
//!
//! Covers:
//! - descriptor caching and idempotence
//! - setter vs. record (constructor) construction
//! - analysis failures and how nested ones are reported
//! - user modules: extra scalar types and converter precedence

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use triplemap::meta::{Arguments, Entity, EntityDef, Predicate, Reflect, TypeRef};
use triplemap::model::vocab::xsd;
use triplemap::spi::ValueConverter;
use triplemap::support::{FromStrConverter, SetterFactory, SetterInspector};
use triplemap::{Error, ErrorKind, Iri, Literal, Mapper, Model, Module, Registry, Resource, Term};

const EX: &str = "http://example.com/";

fn ex(local: &str) -> String {
    format!("{EX}{local}")
}

fn iri(local: &str) -> Iri {
    Iri::new(ex(local)).unwrap()
}

fn res(local: &str) -> Resource {
    Resource::Iri(iri(local))
}

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

/// Built through a constructor; no setters, no `Default`.
#[derive(Debug, Clone, PartialEq)]
struct Book {
    title: String,
    pages: u32,
    tags: Vec<String>,
    subtitle: Option<String>,
}

/// A user scalar type with no stock converter.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Celsius(f64);

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Celsius {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Celsius)
    }
}

impl Reflect for Celsius {
    fn type_ref() -> TypeRef {
        TypeRef::scalar::<Celsius>()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Reading {
    temperature: Celsius,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Station {
    latest: Reading,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Flag {
    on: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct HalfWritable {
    fixed: String,
    loose: String,
}

/// Neither a constructor nor setters.
#[derive(Debug, Default, Clone, PartialEq)]
struct Frozen {
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct BadPredicate {
    name: String,
}

triplemap::reflect_entity!(Point, Book, Reading, Station, Flag, HalfWritable, Frozen, BadPredicate);

impl Entity for Point {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("x", |p: &Point| &p.x)
            .set(|p, v| p.x = v)
            .predicate(Predicate::new(ex("x")).datatype(xsd::INT));
        def.field("y", |p: &Point| &p.y)
            .set(|p, v| p.y = v)
            .predicate(Predicate::new(ex("y")).datatype(xsd::INT));
    }
}

fn build_book(args: &mut Arguments) -> triplemap::Result<Book> {
    Ok(Book {
        title: args.take("title")?,
        pages: args.take("pages")?,
        tags: args.take_or_default("tags")?,
        subtitle: args.take_or_default("subtitle")?,
    })
}

impl Entity for Book {
    fn define(def: &mut EntityDef<Self>) {
        def.constructor(build_book);
        def.field("title", |b: &Book| &b.title)
            .predicate(Predicate::new(ex("title")).literal());
        def.field("pages", |b: &Book| &b.pages)
            .predicate(Predicate::new(ex("pages")).datatype(xsd::UNSIGNED_INT));
        def.field("tags", |b: &Book| &b.tags)
            .predicate(Predicate::new(ex("tag")).literal().optional());
        def.field("subtitle", |b: &Book| &b.subtitle)
            .predicate(Predicate::new(ex("subtitle")).literal().optional());
    }
}

impl Entity for Reading {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible()
            .subject(triplemap::Subject::relative("latest"));
        def.field("temperature", |r: &Reading| &r.temperature)
            .set(|r, v| r.temperature = v)
            .predicate(Predicate::new(ex("temperature")).datatype(xsd::DOUBLE));
    }
}

impl Entity for Station {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("latest", |s: &Station| &s.latest)
            .set(|s, v| s.latest = v)
            .predicate(Predicate::new(ex("latest")));
    }
}

impl Entity for Flag {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("on", |f: &Flag| &f.on)
            .set(|f, v| f.on = v)
            .predicate(Predicate::new(ex("on")).datatype(xsd::BOOLEAN));
    }
}

impl Entity for HalfWritable {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("fixed", |h: &HalfWritable| &h.fixed)
            .predicate(Predicate::new(ex("fixed")).literal());
        def.field("loose", |h: &HalfWritable| &h.loose)
            .set(|h, v| h.loose = v)
            .predicate(Predicate::new(ex("loose")).literal());
    }
}

impl Entity for Frozen {
    fn define(def: &mut EntityDef<Self>) {
        def.field("name", |f: &Frozen| &f.name)
            .predicate(Predicate::new(ex("name")).literal());
    }
}

impl Entity for BadPredicate {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("name", |b: &BadPredicate| &b.name)
            .set(|b, v| b.name = v)
            .predicate(Predicate::new("not an iri"));
    }
}

// ============================================================================
// Modules
// ============================================================================

struct CelsiusModule;

impl Module for CelsiusModule {
    fn name(&self) -> &'static str {
        "celsius"
    }

    fn setup(&self, registry: &mut Registry) {
        registry.add_converter::<Celsius>(FromStrConverter::<Celsius>::new());
    }
}

/// Reads `yes` / `no` booleans.
struct YesNo;

impl ValueConverter for YesNo {
    fn convert(&self, term: &Term) -> triplemap::Result<triplemap::meta::AnyValue> {
        match term.text() {
            "yes" => Ok(Box::new(true)),
            "no" => Ok(Box::new(false)),
            other => Err(Error::Conversion {
                value: other.to_string(),
                type_name: "bool",
                reason: "expected yes or no".into(),
            }),
        }
    }
}

struct YesNoModule;

impl Module for YesNoModule {
    fn name(&self) -> &'static str {
        "yes-no"
    }

    fn setup(&self, registry: &mut Registry) {
        registry.add_converter::<bool>(YesNo);
    }
}

/// Setters and an `i32` converter, but no multiplicity factories.
struct BareSetters;

impl Module for BareSetters {
    fn name(&self) -> &'static str {
        "bare-setters"
    }

    fn setup(&self, registry: &mut Registry) {
        registry
            .add_inspector(SetterInspector)
            .add_instance_factory(SetterFactory)
            .add_converter::<i32>(FromStrConverter::<i32>::new());
    }
}

// ============================================================================
// 1. Caching
// ============================================================================

#[test]
fn test_analysis_is_cached() {
    let mapper = Mapper::new();
    let first = mapper.analyze::<Point>().unwrap();
    let second = mapper.analyze::<Point>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mapper.analyzer().cache_len(), 1);

    let names: Vec<_> = first.properties.iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert_eq!(first.property("x").unwrap().predicate(), Some(&iri("x")));
}

#[test]
fn test_nested_types_are_cached_too() {
    let mapper = Mapper::builder().module(CelsiusModule).build();
    mapper.analyze::<Station>().unwrap();
    assert_eq!(mapper.analyzer().cache_len(), 2);
    assert!(mapper.analyzer().cached(&Reading::type_ref()).is_some());
}

#[test]
fn test_concurrent_analysis_agrees() {
    let mapper = Mapper::new();
    let descriptors: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| mapper.analyze::<Point>().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let first = &descriptors[0];
    assert!(descriptors.iter().all(|d| Arc::ptr_eq(d, first)));
}

// ============================================================================
// 2. Record construction
// ============================================================================

#[test]
fn test_record_round_trip() {
    let mapper = Mapper::new();
    let book = Book {
        title: "Dune".into(),
        pages: 412,
        tags: vec!["sf".into(), "classic".into()],
        subtitle: None,
    };
    let model = mapper.write(&book, ex("dune").as_str()).unwrap();
    assert_eq!(model.len(), 4);

    let back: Book = mapper.read(&model, ex("dune").as_str()).unwrap().unwrap();
    assert_eq!(back, book);
}

#[test]
fn test_record_missing_argument() {
    let mapper = Mapper::new();
    let mut model = Model::new();
    model.add(res("b"), iri("title"), Literal::string("Untitled"));
    // pages is required; the reader reports it before the constructor runs.
    let err = mapper.read::<Book>(&model, ex("b").as_str()).unwrap_err();
    assert!(matches!(err, Error::MissingRequired { ref property, .. } if property == "pages"));
}

#[test]
fn test_record_family_is_selected() {
    let mapper = Mapper::new();
    let descriptor = mapper.analyze::<Book>().unwrap();
    assert!(descriptor.factory.is_some());
    assert_eq!(descriptor.factory.as_ref().unwrap().name(), "record");
}

// ============================================================================
// 3. Analysis failures
// ============================================================================

#[test]
fn test_missing_setter_is_reported() {
    let mapper = Mapper::new();
    let err = mapper.analyze::<HalfWritable>().unwrap_err();
    assert!(matches!(err, Error::MissingSetter { ref property, .. } if property == "fixed"));
    assert_eq!(err.kind(), ErrorKind::Analysis);
}

#[test]
fn test_type_without_construction_reads_fail() {
    let mapper = Mapper::new();
    let descriptor = mapper.analyze::<Frozen>().unwrap();
    assert!(descriptor.factory.is_none());

    // Writing only needs accessors.
    let model = mapper.write(&Frozen { name: "ice".into() }, ex("f").as_str()).unwrap();
    assert_eq!(model.len(), 1);

    let err = mapper.read::<Frozen>(&model, ex("f").as_str()).unwrap_err();
    assert!(matches!(err, Error::NoInstanceStrategy { .. }));
}

#[test]
fn test_no_value_converter() {
    let mapper = Mapper::new();
    let err = mapper.analyze::<Reading>().unwrap_err();
    assert!(matches!(err, Error::NoValueConverter { ref property, .. } if property.ends_with("Reading.temperature")));
}

#[test]
fn test_nested_failure_names_the_path() {
    let mapper = Mapper::new();
    let err = mapper.analyze::<Station>().unwrap_err();
    match err {
        Error::NestedAnalysis { property, source } => {
            assert!(property.ends_with("Station.latest"), "got {property}");
            assert!(matches!(*source, Error::NoValueConverter { .. }));
        }
        other => panic!("expected NestedAnalysis, got {other:?}"),
    }
    assert_eq!(mapper.analyzer().cache_len(), 0, "failed analyses are not cached");
}

#[test]
fn test_invalid_predicate_iri() {
    let mapper = Mapper::new();
    let err = mapper.analyze::<BadPredicate>().unwrap_err();
    assert!(matches!(err, Error::InvalidIri { reason: "contains whitespace", .. }));
}

#[test]
fn test_scalar_is_not_an_entity() {
    let mapper = Mapper::new();
    let err = mapper.analyze::<i32>().unwrap_err();
    assert!(matches!(err, Error::NotAnEntity { .. }));
}

#[test]
fn test_without_defaults_has_no_inspector() {
    let mapper = Mapper::builder().without_defaults().build();
    let err = mapper.analyze::<Point>().unwrap_err();
    assert!(matches!(err, Error::NoInspector { .. }));
}

#[test]
fn test_missing_multiplicity_strategy() {
    let mapper = Mapper::builder().without_defaults().module(BareSetters).build();
    let err = mapper.analyze::<Point>().unwrap_err();
    assert!(matches!(err, Error::NoMultiplicity { ref property, .. } if property.ends_with("Point.x")));
}

// ============================================================================
// 4. User modules
// ============================================================================

#[test]
fn test_module_adds_scalar_type() {
    let mapper = Mapper::builder().module(CelsiusModule).build();
    let station = Station { latest: Reading { temperature: Celsius(21.5) } };
    let model = mapper.write(&station, ex("s").as_str()).unwrap();

    assert_eq!(
        model.objects(&res("s/latest"), &iri("temperature")),
        vec![&Term::Literal(Literal::typed("21.5", Iri::new_unchecked(xsd::DOUBLE)))]
    );

    let back: Station = mapper.read(&model, ex("s").as_str()).unwrap().unwrap();
    assert_eq!(back, station);
}

#[test]
fn test_module_converter_takes_precedence() {
    let mut model = Model::new();
    model.add(res("f"), iri("on"), Literal::typed("yes", Iri::new_unchecked(xsd::BOOLEAN)));

    let stock = Mapper::new();
    let err = stock.read::<Flag>(&model, ex("f").as_str()).unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }));

    let custom = Mapper::builder().module(YesNoModule).build();
    let flag: Flag = custom.read(&model, ex("f").as_str()).unwrap().unwrap();
    assert!(flag.on);
    assert_eq!(custom.analyzer().registry().modules(), &["yes-no", "standard", "setter", "record"]);
}
