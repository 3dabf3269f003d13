//! End-to-end tests for field shapes: single values, `Option`, `Vec`,
//! `BTreeSet` and fixed-size arrays, on both read and write.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use triplemap::meta::{Entity, EntityDef, Predicate, Subject};
use triplemap::model::vocab::xsd;
use triplemap::{Error, Iri, Literal, Mapper, Model, Resource, Term};

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

fn int(value: i32) -> Literal {
    Literal::typed(value.to_string(), Iri::new_unchecked(xsd::INT))
}

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Triple {
    values: [i32; 3],
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Bag {
    numbers: Vec<i32>,
    words: BTreeSet<String>,
    links: Vec<Iri>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Needy {
    items: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Leaf {
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Pair {
    leaves: [Leaf; 2],
}

triplemap::reflect_entity!(Triple, Bag, Needy, Leaf, Pair);

impl Entity for Triple {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("values", |t: &Triple| &t.values)
            .set(|t, v| t.values = v)
            .predicate(Predicate::new(ex("value")).datatype(xsd::INT));
    }
}

impl Entity for Bag {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("numbers", |b: &Bag| &b.numbers)
            .set(|b, v| b.numbers = v)
            .predicate(Predicate::new(ex("number")).datatype(xsd::INT).optional());
        def.field("words", |b: &Bag| &b.words)
            .set(|b, v| b.words = v)
            .predicate(Predicate::new(ex("word")).literal().optional());
        // Non-literal scalars are written as IRIs.
        def.field("links", |b: &Bag| &b.links)
            .set(|b, v| b.links = v)
            .predicate(Predicate::new(ex("link")).optional());
    }
}

impl Entity for Needy {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("items", |n: &Needy| &n.items)
            .set(|n, v| n.items = v)
            .predicate(Predicate::new(ex("item")).literal());
    }
}

impl Entity for Leaf {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("name", |l: &Leaf| &l.name)
            .set(|l, v| l.name = v)
            .subject(Subject::property().make_relative());
    }
}

impl Entity for Pair {
    fn define(def: &mut EntityDef<Self>) {
        def.default_constructible();
        def.field("leaves", |p: &Pair| &p.leaves)
            .set(|p, v| p.leaves = v)
            .predicate(Predicate::new(ex("leaf")));
    }
}

// ============================================================================
// 1. Fixed-size arrays
// ============================================================================

#[test]
fn test_array_round_trip() {
    let mapper = Mapper::new();
    let triple = Triple { values: [1, 2, 3] };
    let model = mapper.write(&triple, ex("t").as_str()).unwrap();
    assert_eq!(model.len(), 3);

    let back: Triple = mapper.read(&model, ex("t").as_str()).unwrap().unwrap();
    assert_eq!(back, triple);
}

#[test]
fn test_array_with_too_few_objects_fails() {
    let mapper = Mapper::new();
    let mut model = Model::new();
    model.add(res("t"), iri("value"), int(1));
    model.add(res("t"), iri("value"), int(2));

    let err = mapper.read::<Triple>(&model, ex("t").as_str()).unwrap_err();
    assert!(matches!(err, Error::Cardinality { got: 2, ref expected, .. } if expected == "exactly 3"));
}

#[test]
fn test_array_with_too_many_objects_fails() {
    let mapper = Mapper::new();
    let mut model = Model::new();
    for v in 1..=4 {
        model.add(res("t"), iri("value"), int(v));
    }

    let err = mapper.read::<Triple>(&model, ex("t").as_str()).unwrap_err();
    assert!(matches!(err, Error::Cardinality { got: 4, .. }));
}

#[test]
fn test_array_with_dangling_element_fails() {
    let mapper = Mapper::new();
    let mut model = Model::new();
    model.add(res("p"), iri("leaf"), iri("p/a"));
    model.add(res("p"), iri("leaf"), iri("p/ghost"));
    model.add(res("p/a"), iri("other"), Literal::string("present"));

    // Two raw objects pass the first check; one is dropped as dangling.
    let err = mapper.read::<Pair>(&model, ex("p").as_str()).unwrap_err();
    assert!(matches!(err, Error::Cardinality { got: 1, .. }));
}

#[test]
fn test_array_of_entities_with_relative_subjects() {
    let mapper = Mapper::new();
    let pair = Pair {
        leaves: [Leaf { name: "left".into() }, Leaf { name: "right".into() }],
    };
    let model = mapper.write(&pair, ex("p").as_str()).unwrap();
    assert_eq!(
        model.objects(&res("p"), &iri("leaf")),
        vec![&Term::Iri(iri("p/left")), &Term::Iri(iri("p/right"))]
    );
}

// ============================================================================
// 2. Growable collections
// ============================================================================

#[test]
fn test_collections_round_trip() {
    let mapper = Mapper::new();
    let bag = Bag {
        numbers: vec![3, 1, 2],
        words: ["beta", "alpha"].into_iter().map(String::from).collect(),
        links: vec![iri("a"), iri("b")],
    };
    let model = mapper.write(&bag, ex("bag").as_str()).unwrap();

    assert_eq!(model.objects(&res("bag"), &iri("number")).len(), 3);
    assert_eq!(
        model.objects(&res("bag"), &iri("link")),
        vec![&Term::Iri(iri("a")), &Term::Iri(iri("b"))]
    );

    let back: Bag = mapper.read(&model, ex("bag").as_str()).unwrap().unwrap();
    assert_eq!(back, bag, "sequence order follows statement order");
}

#[test]
fn test_empty_optional_collections() {
    let mapper = Mapper::new();
    let model = mapper.write(&Bag::default(), ex("bag").as_str()).unwrap();
    assert!(model.is_empty());

    let mut model = Model::new();
    model.add(res("bag"), iri("number"), int(7));
    let back: Bag = mapper.read(&model, ex("bag").as_str()).unwrap().unwrap();
    assert_eq!(back.numbers, vec![7]);
    assert!(back.words.is_empty());
    assert!(back.links.is_empty());
}

#[test]
fn test_duplicate_objects_collapse() {
    let mapper = Mapper::new();
    let bag = Bag {
        numbers: vec![5, 5, 6],
        ..Bag::default()
    };
    let model = mapper.write(&bag, ex("bag").as_str()).unwrap();
    let back: Bag = mapper.read(&model, ex("bag").as_str()).unwrap().unwrap();
    assert_eq!(back.numbers, vec![5, 6]);
}

#[test]
fn test_required_collection_needs_one_value() {
    let mapper = Mapper::new();
    let mut model = Model::new();
    model.add(res("n"), iri("unrelated"), Literal::string("x"));

    let err = mapper.read::<Needy>(&model, ex("n").as_str()).unwrap_err();
    assert!(matches!(err, Error::MissingRequired { ref property, .. } if property == "items"));

    model.add(res("n"), iri("item"), Literal::string("one"));
    let back: Needy = mapper.read(&model, ex("n").as_str()).unwrap().unwrap();
    assert_eq!(back.items, vec!["one".to_string()]);
}

#[test]
fn test_required_empty_collection_writes_nothing() {
    let mapper = Mapper::new();
    let model = mapper.write(&Needy::default(), ex("n").as_str()).unwrap();
    assert!(model.is_empty());
}
