//! Context caching and type lookup integration tests

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use xmlbind::converters::DataType;
use xmlbind::models::{ClassDescriptor, FieldDescriptor};
use xmlbind::namespaces::QName;
use xmlbind::{ContextConfig, DataObject, NameConvention, XmlContext, XmlParser};

use common::{books_fixture, books_model, shapes_model};

#[test]
fn test_meta_cache_is_shared_across_threads() {
    let model = shapes_model();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let context = Arc::clone(&model.context);
            let circle = model.circle;
            thread::spawn(move || context.fetch(circle, Some("urn:shapes"), None).unwrap())
        })
        .collect();

    let metas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for meta in &metas[1..] {
        assert!(Arc::ptr_eq(&metas[0], meta));
    }
}

#[test]
fn test_cache_keyed_by_parent_namespace() {
    let context = XmlContext::new();
    let item = context
        .register(
            ClassDescriptor::new("Item").with_field(FieldDescriptor::element("name", DataType::String)),
        )
        .unwrap();

    let plain = context.build(item, None).unwrap();
    let nested = context.build(item, Some("urn:outer")).unwrap();
    assert_eq!(plain.qname, QName::local("Item"));
    assert_eq!(nested.qname, QName::namespaced("urn:outer", "Item"));
    assert_eq!(
        nested.find_var_by_name("name").unwrap().qname,
        QName::namespaced("urn:outer", "name")
    );
    assert_eq!(context.cached_len(), 2);
}

#[test]
fn test_parsers_share_context_cache() {
    let model = books_model();
    let mut first = XmlParser::new(model.context.clone());
    first.from_path(books_fixture("books.xml"), model.books).unwrap();
    let cached = model.context.cached_len();
    assert!(cached >= 2);

    let mut second = XmlParser::new(model.context.clone());
    second.from_path(books_fixture("books.xml"), model.books).unwrap();
    assert_eq!(model.context.cached_len(), cached);
}

#[test]
fn test_late_registration_is_visible_to_xsi_lookup() {
    let model = shapes_model();
    let triangle = QName::namespaced("urn:shapes", "Triangle");
    assert_eq!(model.context.find_type(&triangle), None);
    assert!(!model.context.build_xsi_cache());

    let id = model
        .context
        .register(
            ClassDescriptor::new("Triangle")
                .with_namespace("urn:shapes")
                .extends("Shape"),
        )
        .unwrap();
    assert_eq!(model.context.find_type(&triangle), Some(id));
    assert_eq!(model.context.find_subclass(model.shape, &triangle), Some(id));
    assert_eq!(model.context.find_subclass(model.circle, &triangle), Some(id));
}

#[test]
fn test_fetch_unchanged_registry_hits_cache() {
    let model = shapes_model();
    let circle = QName::namespaced("urn:shapes", "Circle");
    let first = model.context.fetch(model.shape, Some("urn:shapes"), Some(&circle)).unwrap();
    let cached = model.context.cached_len();

    assert!(!model.context.build_xsi_cache());
    let second = model.context.fetch(model.shape, Some("urn:shapes"), Some(&circle)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(model.context.cached_len(), cached);
}

#[test]
fn test_xsi_type_dispatches_to_sibling() {
    let model = shapes_model();
    let square = QName::namespaced("urn:shapes", "Square");
    let meta = model.context.fetch(model.circle, None, Some(&square)).unwrap();
    assert_eq!(meta.clazz, model.square);

    let stranger = model
        .context
        .register(ClassDescriptor::new("Stranger").with_namespace("urn:shapes"))
        .unwrap();
    let name = QName::namespaced("urn:shapes", "Stranger");
    assert_eq!(model.context.find_subclass(model.circle, &name), None);
    let meta = model.context.fetch(model.circle, None, Some(&name)).unwrap();
    assert_eq!(meta.clazz, model.circle);
    assert_ne!(meta.clazz, stranger);
}

#[test]
fn test_xsi_type_picks_first_registered_match() {
    let model = shapes_model();
    let newer = model
        .context
        .register(
            ClassDescriptor::new("v2.Circle")
                .with_namespace("urn:shapes")
                .extends("Shape"),
        )
        .unwrap();
    let circle = QName::namespaced("urn:shapes", "Circle");
    assert_eq!(model.context.find_types(&circle), vec![model.circle, newer]);
    assert_eq!(model.context.find_type(&circle), Some(newer));

    let meta = model.context.fetch(model.shape, None, Some(&circle)).unwrap();
    assert_eq!(meta.clazz, model.circle);
}

#[test]
fn test_is_derived_accepts_parent_instance() {
    let model = shapes_model();
    let shape = DataObject::new(model.shape, "Shape");
    let circle = DataObject::new(model.circle, "Circle");

    assert!(model.context.is_derived(&circle, model.shape));
    assert!(model.context.is_derived(&shape, model.circle));
    assert!(!model.context.is_derived(&circle, model.square));
    assert!(!model.context.is_derived(&shape, model.drawing));
}

#[test]
fn test_find_type_by_fields() {
    let model = shapes_model();
    let fields = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<HashSet<_>>();

    assert_eq!(model.context.find_type_by_fields(&fields(&["id", "radius"])), Some(model.circle));
    assert_eq!(model.context.find_type_by_fields(&fields(&["id"])), Some(model.shape));
    assert_eq!(model.context.find_type_by_fields(&fields(&["radius", "side"])), None);
}

#[test]
fn test_context_config_from_json() {
    let config: ContextConfig =
        serde_json::from_str(r#"{"element_name_generator": "kebabCase"}"#).unwrap();
    assert_eq!(config.element_name_generator, NameConvention::KebabCase);

    let context = XmlContext::with_config(config);
    let clazz = context
        .register(
            ClassDescriptor::new("PurchaseOrder")
                .with_field(FieldDescriptor::element("shipDate", DataType::Date)),
        )
        .unwrap();
    let meta = context.build(clazz, None).unwrap();
    assert_eq!(meta.qname, QName::local("purchase-order"));
    assert!(meta.find_element(&QName::local("ship-date")).is_some());
}
