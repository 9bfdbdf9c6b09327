//! Minimal binary demonstrating `fieldwire` usage.
//!
//! Builds a small authorization-style field table, formats a message from
//! CLI arguments, prints the redacted wire image, and parses it back.

mod cli;

use clap::Parser;
use fieldwire::{
    FieldNumber,
    LoggingHooks,
    Message,
    Result,
    context::{FormatterContext, ParserContext},
    encoding::DataEncoding,
    formatter::{FieldFormatter, MessageFormatter, Padding},
    length::{LengthEncoder, LengthManager},
    security::{Obfuscation, SecuritySchema, redacted_hex_dump},
};

fn demo_table() -> Result<MessageFormatter> {
    let schema =
        SecuritySchema::new().obfuscated(FieldNumber::new(2), Obfuscation::CardNumber);
    let table = MessageFormatter::builder()
        .packet_header_text("ISO")
        .header(FieldFormatter::text(
            LengthManager::fixed(4),
            DataEncoding::PLAIN,
        ))
        .field(
            FieldNumber::new(1),
            FieldFormatter::bitmap(
                FieldNumber::new(2),
                FieldNumber::new(64),
                DataEncoding::PLAIN,
            )?,
        )?
        .field(
            FieldNumber::new(2),
            FieldFormatter::text(
                LengthManager::variable(1, 19, LengthEncoder::ASCII_LL)?,
                DataEncoding::BCD,
            ),
        )?
        .field(
            FieldNumber::new(3),
            FieldFormatter::padded_text(
                LengthManager::fixed(6),
                DataEncoding::PLAIN,
                Padding::SPACES_RIGHT,
            ),
        )?
        .hooks(LoggingHooks::new(schema.clone()))
        .security(schema)
        .build()?;
    Ok(table)
}

fn main() -> Result<()> {
    // Enable structured logging for the demo binary. Applications embedding
    // the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let formatter = demo_table()?;

    let mut message = Message::new();
    message.set_header(cli.header);
    message.set_text(FieldNumber::new(2), cli.pan);
    message.set_text(FieldNumber::new(3), cli.processing_code);

    let mut out = FormatterContext::new();
    formatter.format(&message, &mut out)?;
    println!("wire image ({} bytes)", out.len());
    println!("{}", redacted_hex_dump(out.bytes(), out.redacted_ranges()));

    let mut parser = ParserContext::new();
    parser.feed(&out.take());
    if let Some(parsed) = formatter.parse(&mut parser)? {
        println!();
        print!("{}", formatter.schema().describe(&parsed));
    }
    Ok(())
}
