//! Command-line interface for xmlbind

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
use xmlbind::models::{ClassDescriptor, FieldDescriptor};
#[cfg(feature = "cli")]
use xmlbind::{HandlerKind, JsonSerializer, ParserConfig, XmlContext, XmlParser};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmlbind")]
#[command(author, version, about = "XML data binding tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the parse events a handler produces for a document
    Events {
        /// Path to the XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Handler: event or sax
        #[arg(long, default_value = "event")]
        handler: HandlerKind,

        /// Process XInclude elements
        #[arg(long)]
        xinclude: bool,
    },

    /// Convert an XML document to JSON
    #[command(name = "xml2json")]
    XmlToJson {
        /// Path to the XML file to convert
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Handler: event or sax
        #[arg(long, default_value = "event")]
        handler: HandlerKind,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Events {
            file,
            handler,
            xinclude,
        } => cmd_events(file, handler, xinclude),
        Commands::XmlToJson {
            file,
            handler,
            pretty,
            output,
        } => cmd_xml2json(file, handler, pretty, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// A parser whose root class accepts any document: every attribute and
/// child is captured as-is.
#[cfg(feature = "cli")]
fn generic_parser(handler: HandlerKind, xinclude: bool) -> xmlbind::Result<(XmlParser, xmlbind::models::ClassId)> {
    let context = Arc::new(XmlContext::new());
    let clazz = context.register(
        ClassDescriptor::new("Document")
            .mixed()
            .with_field(FieldDescriptor::attributes("attributes"))
            .with_field(FieldDescriptor::wildcard("content")),
    )?;
    let config = ParserConfig::default()
        .with_xinclude(xinclude)
        .with_fail_on_unknown_attributes(false);
    let parser = XmlParser::new(context)
        .with_config(config)
        .with_handler(handler);
    Ok((parser, clazz))
}

#[cfg(feature = "cli")]
fn cmd_events(file: PathBuf, handler: HandlerKind, xinclude: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (parser, clazz) = generic_parser(handler, xinclude)?;
    let mut parser = parser.with_event_recording(true);
    let result = parser.from_path(&file, clazz);

    for event in parser.events() {
        println!("{}", event);
    }
    result?;
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_xml2json(
    file: PathBuf,
    handler: HandlerKind,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut parser, clazz) = generic_parser(handler, false)?;
    let obj = parser.from_path(&file, clazz)?;
    let json_str = JsonSerializer::new().with_pretty(pretty).render(&obj)?;

    if let Some(output_path) = output {
        fs::write(output_path, &json_str)?;
    } else {
        println!("{}", json_str);
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    std::process::exit(1);
}
