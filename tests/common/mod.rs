//! Shared models and fixture helpers for the integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use xmlbind::converters::DataType;
use xmlbind::models::{ClassDescriptor, ClassId, FieldDescriptor, FieldType};
use xmlbind::XmlContext;

pub fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

pub fn books_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("books").join(name)
}

/// The books model: a `brk:books` root in `urn:books` holding
/// unqualified `book` entries
pub struct BooksModel {
    pub context: Arc<XmlContext>,
    pub books: ClassId,
    pub book: ClassId,
}

pub fn books_model() -> BooksModel {
    let context = Arc::new(XmlContext::new());
    let book = context
        .register(
            ClassDescriptor::new("BookForm")
                .with_local_name("book")
                .with_namespace("")
                .with_field(FieldDescriptor::element("author", DataType::String))
                .with_field(FieldDescriptor::element("title", DataType::String))
                .with_field(FieldDescriptor::element("genre", DataType::String))
                .with_field(FieldDescriptor::element("price", DataType::Double).optional())
                .with_field(FieldDescriptor::element("pub_date", DataType::Date).optional())
                .with_field(FieldDescriptor::element("review", DataType::String).list())
                .with_field(FieldDescriptor::attribute("id", DataType::String).required()),
        )
        .unwrap();
    let books = context
        .register(
            ClassDescriptor::new("Books")
                .with_local_name("books")
                .with_namespace("urn:books")
                .with_field(
                    FieldDescriptor::element("book", FieldType::class("BookForm"))
                        .with_namespace("")
                        .list(),
                ),
        )
        .unwrap();
    BooksModel {
        context,
        books,
        book,
    }
}

/// A shape hierarchy for `xsi:type` tests, all in `urn:shapes`
pub struct ShapesModel {
    pub context: Arc<XmlContext>,
    pub shape: ClassId,
    pub circle: ClassId,
    pub square: ClassId,
    pub drawing: ClassId,
}

pub fn shapes_model() -> ShapesModel {
    let context = Arc::new(XmlContext::new());
    let shape = context
        .register(
            ClassDescriptor::new("Shape")
                .with_namespace("urn:shapes")
                .with_field(FieldDescriptor::attribute("id", DataType::String)),
        )
        .unwrap();
    let circle = context
        .register(
            ClassDescriptor::new("Circle")
                .with_namespace("urn:shapes")
                .extends("Shape")
                .with_field(FieldDescriptor::element("radius", DataType::Double)),
        )
        .unwrap();
    let square = context
        .register(
            ClassDescriptor::new("Square")
                .with_namespace("urn:shapes")
                .extends("Shape")
                .with_field(FieldDescriptor::element("side", DataType::Double)),
        )
        .unwrap();
    let drawing = context
        .register(
            ClassDescriptor::new("Drawing")
                .with_local_name("drawing")
                .with_namespace("urn:shapes")
                .with_field(FieldDescriptor::element("shape", FieldType::class("Shape")).list())
                .with_field(FieldDescriptor::wildcard("extra")),
        )
        .unwrap();
    ShapesModel {
        context,
        shape,
        circle,
        square,
        drawing,
    }
}
