//! Document binding integration tests

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use xmlbind::codegen::{Attr, AttrType, Class, ClassContainer, ClassPipeline, Tag};
use xmlbind::converters::DataType;
use xmlbind::models::{ClassDescriptor, FieldDescriptor};
use xmlbind::namespaces::QName;
use xmlbind::{
    DataObject, Error, HandlerKind, JsonSerializer, ParserConfig, SerializerConfig, Value,
    XmlContext, XmlParser, XmlSerializer,
};

use common::{books_fixture, books_model, shapes_model};

const SHAPES: &str = r#"<d:drawing xmlns:d="urn:shapes" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <d:shape id="a" xsi:type="d:Circle"><d:radius>1.5</d:radius></d:shape>
  <d:shape id="b" xsi:type="d:Square"><d:side>2</d:side></d:shape>
  <d:shape id="c"/>
  <d:other xsi:type="d:Square"><d:side>3</d:side></d:other>
</d:drawing>"#;

fn books(obj: &DataObject) -> Vec<&DataObject> {
    obj.get("book")
        .and_then(Value::as_list)
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap())
        .collect()
}

#[test]
fn test_bind_books() {
    let model = books_model();
    let mut parser = XmlParser::new(model.context);
    let obj = parser.from_path(books_fixture("books.xml"), model.books).unwrap();

    assert_eq!(obj.class(), model.books);
    let books = books(&obj);
    assert_eq!(books.len(), 2);

    let first = books[0];
    assert_eq!(first.class(), model.book);
    assert_eq!(first.get("id"), Some(&Value::from("bk001")));
    assert_eq!(first.get("author"), Some(&Value::from("Hightower, Kim")));
    assert_eq!(first.get("price"), Some(&Value::Float(44.95)));
    assert_eq!(
        first.get("pub_date"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2000, 10, 1).unwrap()))
    );
    assert_eq!(
        first.get("review"),
        Some(&Value::List(vec![Value::from("An amazing story of nothing.")]))
    );

    let second = books[1];
    assert_eq!(second.get("price"), Some(&Value::Null));
    assert_eq!(second.get("pub_date"), Some(&Value::Null));
    assert_eq!(
        second.field_names().collect::<Vec<_>>(),
        vec!["author", "title", "genre", "price", "pub_date", "review", "id"]
    );
}

#[test]
fn test_default_namespace_binds_the_same() {
    let model = books_model();
    let mut parser = XmlParser::new(model.context);
    let prefixed = parser.from_path(books_fixture("books.xml"), model.books).unwrap();
    let default_ns = parser
        .from_path(books_fixture("books_default_ns.xml"), model.books)
        .unwrap();
    assert_eq!(prefixed, default_ns);
}

#[test]
fn test_books_round_trip() {
    let model = books_model();
    let mut parser = XmlParser::new(model.context.clone());
    let obj = parser.from_path(books_fixture("books.xml"), model.books).unwrap();

    let config = SerializerConfig::default().with_namespace("brk", "urn:books");
    let xml = XmlSerializer::new(model.context).with_config(config).render(&obj).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<brk:books xmlns:brk=\"urn:books\"><book id=\"bk001\">"), "{}", xml);
    assert!(xml.contains("<price>44.95</price><pub_date>2000-10-01</pub_date>"), "{}", xml);

    let reparsed = parser.from_str(&xml, model.books).unwrap();
    assert_eq!(reparsed, obj);
}

#[test]
fn test_xsi_type_polymorphism() {
    let model = shapes_model();
    let mut parser = XmlParser::new(model.context.clone());
    let obj = parser.from_str(SHAPES, model.drawing).unwrap();

    let shapes: Vec<_> = obj
        .get("shape")
        .and_then(Value::as_list)
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap())
        .collect();
    assert_eq!(
        shapes.iter().map(|s| s.class()).collect::<Vec<_>>(),
        vec![model.circle, model.square, model.shape]
    );
    assert_eq!(shapes[0].get("radius"), Some(&Value::Float(1.5)));
    assert_eq!(shapes[0].get("id"), Some(&Value::from("a")));

    let extra = obj.get("extra").and_then(Value::as_list).unwrap();
    assert_eq!(extra.len(), 1);
    match &extra[0] {
        Value::Derived(derived) => {
            assert_eq!(derived.qname, QName::namespaced("urn:shapes", "other"));
            assert_eq!(derived.xsi_type, Some(QName::namespaced("urn:shapes", "Square")));
            let square = derived.value.as_object().unwrap();
            assert_eq!(square.class(), model.square);
            assert_eq!(square.get("side"), Some(&Value::Float(3.0)));
        }
        other => panic!("expected a derived element, got {:?}", other),
    }
}

#[test]
fn test_polymorphic_round_trip() {
    let model = shapes_model();
    let mut parser = XmlParser::new(model.context.clone()).with_handler(HandlerKind::Sax);
    let obj = parser.from_str(SHAPES, model.drawing).unwrap();

    let xml = XmlSerializer::new(model.context)
        .with_config(SerializerConfig::default().with_xml_declaration(false))
        .render(&obj)
        .unwrap();
    assert!(xml.contains("xsi:type=\"ns0:Circle\""), "{}", xml);
    assert_eq!(parser.from_str(&xml, model.drawing).unwrap(), obj);
}

#[test]
fn test_unknown_xsi_type_keeps_declared_class() {
    let model = shapes_model();
    let xml = r#"<d:drawing xmlns:d="urn:shapes" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
        <d:shape id="x" xsi:type="d:Triangle"/></d:drawing>"#;
    let mut parser = XmlParser::new(model.context);
    let obj = parser.from_str(xml, model.drawing).unwrap();
    let shape = obj.get("shape").and_then(Value::as_list).unwrap()[0].as_object().unwrap();
    assert_eq!(shape.class(), model.shape);
}

#[test]
fn test_root_xsi_type() {
    let model = shapes_model();
    let xml = r#"<d:shape xmlns:d="urn:shapes" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:type="d:Circle" id="r"><d:radius>4</d:radius></d:shape>"#;
    let mut parser = XmlParser::new(model.context);
    let obj = parser.from_str(xml, model.shape).unwrap();
    assert_eq!(obj.class(), model.circle);
    assert_eq!(obj.get("radius"), Some(&Value::Float(4.0)));
}

#[test]
fn test_serializer_rejects_unrelated_class() {
    let model = shapes_model();
    let stranger = DataObject::new(model.drawing, "Drawing");
    let drawing = DataObject::new(model.drawing, "Drawing")
        .with_field("shape", Value::List(vec![Value::from(stranger)]))
        .with_field("extra", Value::List(Vec::new()));
    let result = XmlSerializer::new(model.context).render(&drawing);
    assert!(matches!(result, Err(Error::Context(_))), "{:?}", result);
}

#[test]
fn test_wildcard_capture() {
    let model = shapes_model();
    let xml = r#"<d:drawing xmlns:d="urn:shapes"><x:note xmlns:x="urn:x" a="1">text<x:sub/></x:note>
</d:drawing>"#;
    let mut parser = XmlParser::new(model.context);
    let obj = parser.from_str(xml, model.drawing).unwrap();

    let extra = obj.get("extra").and_then(Value::as_list).unwrap();
    let note = extra[0].as_any().unwrap();
    assert_eq!(note.qname, Some(QName::namespaced("urn:x", "note")));
    assert_eq!(note.text.as_deref(), Some("text"));
    assert_eq!(note.tail.as_deref(), Some("\n"));
    assert_eq!(note.attributes.get(&QName::local("a")).map(String::as_str), Some("1"));
    assert_eq!(note.children.len(), 1);
    assert_eq!(
        note.children[0].as_any().unwrap().qname,
        Some(QName::namespaced("urn:x", "sub"))
    );
}

#[test]
fn test_mixed_content_through_pipeline() {
    let para = Class::new(QName::local("para"), Tag::ComplexType)
        .mixed()
        .with_attr(Attr::new(Tag::Attribute, "lang").with_type(AttrType::Native(DataType::String)));
    let mut container: ClassContainer = vec![para].into_iter().collect();
    container.process(&ClassPipeline::standard());

    let context = Arc::new(XmlContext::new());
    let mut clazz = None;
    for descriptor in container.to_descriptors().unwrap() {
        clazz = Some(context.register(descriptor).unwrap());
    }
    let clazz = clazz.unwrap();

    let xml = "<para lang=\"en\">Hello <b>bold</b> and <i>italic</i>!</para>";
    for handler in [HandlerKind::Event, HandlerKind::Sax] {
        let mut parser = XmlParser::new(context.clone()).with_handler(handler);
        let obj = parser.from_str(xml, clazz).unwrap();

        let content = obj.get("content").and_then(Value::as_list).unwrap();
        assert_eq!(content.len(), 5, "{:?}", handler);
        assert_eq!(content[0], Value::from("Hello "));
        assert_eq!(content[2], Value::from(" and "));
        assert_eq!(content[4], Value::from("!"));
        let bold = content[1].as_any().unwrap();
        assert_eq!(bold.text.as_deref(), Some("bold"));
        assert_eq!(bold.tail, None);

        let rendered = XmlSerializer::new(context.clone())
            .with_config(SerializerConfig::default().with_xml_declaration(false))
            .render(&obj)
            .unwrap();
        assert_eq!(rendered, xml);
    }
}

#[test]
fn test_missing_required_field() {
    let model = books_model();
    let xml = r#"<brk:books xmlns:brk="urn:books"><book><author>a</author></book></brk:books>"#;
    let mut parser = XmlParser::new(model.context);
    match parser.from_str(xml, model.books) {
        Err(Error::MissingField { class, field }) => {
            assert_eq!(class, "BookForm");
            assert_eq!(field, "id");
        }
        other => panic!("expected a missing field error, got {:?}", other),
    }
}

#[test]
fn test_unknown_property() {
    let model = books_model();
    let xml = r#"<brk:books xmlns:brk="urn:books"><book id="1"><isbn>1</isbn></book></brk:books>"#;

    let mut strict = XmlParser::new(model.context.clone());
    let err = strict.from_str(xml, model.books).unwrap_err();
    assert_eq!(err.to_string(), "parser error: Unknown property book:isbn");

    let config = ParserConfig::default().with_fail_on_unknown_properties(false);
    let mut lenient = XmlParser::new(model.context).with_config(config);
    let obj = lenient.from_str(xml, model.books).unwrap();
    assert_eq!(books(&obj)[0].get("id"), Some(&Value::from("1")));
}

#[test]
fn test_unknown_attribute() {
    let model = books_model();
    let xml = r#"<brk:books xmlns:brk="urn:books"><book id="1" lang="en"/></brk:books>"#;

    let mut lenient = XmlParser::new(model.context.clone());
    assert!(lenient.from_str(xml, model.books).is_ok());

    let config = ParserConfig::default().with_fail_on_unknown_attributes(true);
    let mut strict = XmlParser::new(model.context).with_config(config);
    assert!(matches!(strict.from_str(xml, model.books), Err(Error::Parser(_))));
}

#[test]
fn test_xsi_nil() {
    let model = books_model();
    let xml = r#"<brk:books xmlns:brk="urn:books" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
        <book id="1"><price xsi:nil="true"/></book>
        <book xsi:nil="true"/>
    </brk:books>"#;
    let mut parser = XmlParser::new(model.context);
    let obj = parser.from_str(xml, model.books).unwrap();

    let list = obj.get("book").and_then(Value::as_list).unwrap();
    assert_eq!(list[0].as_object().unwrap().get("price"), Some(&Value::Null));
    assert_eq!(list[1], Value::Null);
}

#[test]
fn test_converter_warnings() {
    let model = books_model();
    let xml = r#"<brk:books xmlns:brk="urn:books"><book id="1"><price>cheap</price></book></brk:books>"#;

    let mut lenient = XmlParser::new(model.context.clone());
    let obj = lenient.from_str(xml, model.books).unwrap();
    assert_eq!(books(&obj)[0].get("price"), Some(&Value::from("cheap")));

    let config = ParserConfig::default().with_fail_on_converter_warnings(true);
    let mut strict = XmlParser::new(model.context).with_config(config);
    assert!(matches!(strict.from_str(xml, model.books), Err(Error::Conversion(_))));
}

#[test]
fn test_defaults_and_empty_elements() {
    let context = Arc::new(XmlContext::new());
    let clazz = context
        .register(
            ClassDescriptor::new("Entry")
                .with_local_name("entry")
                .with_field(FieldDescriptor::attribute("status", DataType::String).with_default("draft"))
                .with_field(FieldDescriptor::element("count", DataType::Int).with_default("1"))
                .with_field(FieldDescriptor::element("label", DataType::String))
                .with_field(FieldDescriptor::element("size", DataType::Int)),
        )
        .unwrap();

    let mut parser = XmlParser::new(context);
    let obj = parser.from_str("<entry><count/><label/><size/></entry>", clazz).unwrap();
    assert_eq!(obj.get("status"), Some(&Value::from("draft")));
    assert_eq!(obj.get("count"), Some(&Value::Int(1)));
    assert_eq!(obj.get("label"), Some(&Value::from("")));
    assert_eq!(obj.get("size"), Some(&Value::Null));
}

#[test]
fn test_parse_subtree() {
    let model = books_model();
    let text = std::fs::read_to_string(books_fixture("books.xml")).unwrap();
    let document = roxmltree::Document::parse(&text).unwrap();
    let second = document
        .descendants()
        .filter(|n| n.has_tag_name("book"))
        .nth(1)
        .unwrap();

    let mut parser = XmlParser::new(model.context).with_handler(HandlerKind::Sax);
    let obj = parser.parse_tree(second, model.book).unwrap();
    assert_eq!(obj.get("id"), Some(&Value::from("bk002")));
    assert_eq!(obj.get("author"), Some(&Value::from("Nagata, Suanne")));
}

#[test]
fn test_books_to_json() {
    let model = books_model();
    let mut parser = XmlParser::new(model.context);
    let obj = parser.from_path(books_fixture("books.xml"), model.books).unwrap();

    let json = JsonSerializer::new().to_value(&obj);
    assert_eq!(json["book"][0]["price"], serde_json::json!(44.95));
    assert_eq!(json["book"][0]["pub_date"], serde_json::json!("2000-10-01"));
    assert_eq!(json["book"][1]["price"], serde_json::Value::Null);
    assert_eq!(json["book"][1]["review"][0], serde_json::json!("A masterpiece of the fine art of gossiping."));
}

proptest::proptest! {
    #[test]
    fn test_text_survives_round_trip(label in "[a-zA-Z0-9 <>&'\"]{0,24}", note in "[a-z0-9 <&\"]{0,12}") {
        let context = Arc::new(XmlContext::new());
        let clazz = context
            .register(
                ClassDescriptor::new("Entry")
                    .with_local_name("entry")
                    .with_field(FieldDescriptor::attribute("note", DataType::String))
                    .with_field(FieldDescriptor::element("label", DataType::String)),
            )
            .unwrap();
        let obj = DataObject::new(clazz, "Entry")
            .with_field("note", note.as_str())
            .with_field("label", label.as_str());

        let xml = XmlSerializer::new(context.clone()).render(&obj).unwrap();
        for handler in [HandlerKind::Event, HandlerKind::Sax] {
            let mut parser = XmlParser::new(context.clone()).with_handler(handler);
            let parsed = parser.from_str(&xml, clazz).unwrap();
            proptest::prop_assert_eq!(&parsed, &obj);
        }
    }
}
