//! Drivers that feed wire images to a formatter in controlled slices.
//!
//! Each driver exercises a different delivery pattern: one-shot, a single
//! split, fixed-size chunks, and a framed in-memory transport. Suspension
//! must be invisible in the result, so every driver returns the same
//! messages for the same image regardless of slicing.

use fieldwire::{
    CodecError,
    context::ParserContext,
    formatter::MessageFormatter,
    message::Message,
    transport::MessageCodec,
};
use futures::StreamExt;
use tokio::io::{AsyncWriteExt, duplex};
use tokio_util::codec::FramedRead;

/// Parse `image` in one call, expecting a complete message.
///
/// # Errors
///
/// Propagates any protocol error the formatter raises.
///
/// # Panics
///
/// Panics when `image` does not hold a complete message.
pub fn parse_whole(
    formatter: &MessageFormatter,
    image: &[u8],
) -> fieldwire::Result<Message> {
    let mut ctx = ParserContext::new();
    ctx.feed(image);
    let message = formatter
        .parse(&mut ctx)?
        .expect("image holds a complete message");
    Ok(message)
}

/// Parse `image` delivered in two slices split at `split`.
///
/// The first parse attempt may already complete when the split lands at the
/// end of the image; otherwise the driver resumes with the remainder.
///
/// # Errors
///
/// Propagates any protocol error the formatter raises.
///
/// # Panics
///
/// Panics when the resumed parse still does not complete.
pub fn parse_split(
    formatter: &MessageFormatter,
    image: &[u8],
    split: usize,
) -> fieldwire::Result<Message> {
    let (first, second) = image.split_at(split.min(image.len()));
    let mut ctx = ParserContext::new();
    ctx.feed(first);
    if let Some(message) = formatter.parse(&mut ctx)? {
        return Ok(message);
    }
    ctx.feed(second);
    let message = formatter
        .parse(&mut ctx)?
        .expect("resumed parse completes the message");
    Ok(message)
}

/// Feed `image` in `chunk`-byte slices, returning every completed message.
///
/// A zero chunk size is treated as one so the driver always makes progress.
///
/// # Errors
///
/// Propagates any protocol error the formatter raises.
pub fn parse_in_chunks(
    formatter: &MessageFormatter,
    image: &[u8],
    chunk: usize,
) -> fieldwire::Result<Vec<Message>> {
    let mut ctx = ParserContext::new();
    let mut messages = Vec::new();
    for slice in image.chunks(chunk.max(1)) {
        ctx.feed(slice);
        while let Some(message) = formatter.parse(&mut ctx)? {
            messages.push(message);
        }
    }
    Ok(messages)
}

/// Decode `image` through a framed in-memory transport, written `chunk`
/// bytes at a time.
///
/// The writer and reader run concurrently on a `tokio::io::duplex` pair, so
/// flow control exercises the codec's suspend-and-resume path the same way a
/// socket would.
///
/// # Errors
///
/// Propagates codec errors from the reader and I/O errors from the writer.
pub async fn decode_framed(
    formatter: MessageFormatter,
    image: Vec<u8>,
    chunk: usize,
) -> Result<Vec<Message>, CodecError> {
    let (mut client, server) = duplex(64);

    let writer = async move {
        for slice in image.chunks(chunk.max(1)) {
            client.write_all(slice).await?;
            client.flush().await?;
        }
        client.shutdown().await?;
        Ok::<(), std::io::Error>(())
    };

    let reader = async move {
        let mut framed = FramedRead::new(server, MessageCodec::from_table(formatter));
        let mut messages = Vec::new();
        while let Some(decoded) = framed.next().await {
            messages.push(decoded?);
        }
        Ok::<_, CodecError>(messages)
    };

    let (written, messages) = tokio::join!(writer, reader);
    written?;
    messages
}
