use serde_json::Value;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// How a message arrived on stdin; replies go out the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    /// One JSON document per line.
    Line,
    /// `Content-Length` headers, a blank line, then the body.
    ContentLength,
}

#[derive(Debug)]
pub struct Frame {
    pub framing: Framing,
    pub body: Vec<u8>,
}

/// Upper bound on a `Content-Length` body; larger frames are discarded unread.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Reads the next frame. `Ok(None)` on a clean EOF between messages.
///
/// Blank lines between messages are skipped. A line starting with
/// `Content-Length:` switches to header framing for that one message. Frames
/// with an unreadable or oversized length are logged and dropped so the
/// caller keeps reading; only EOF inside a frame or an I/O failure is an error.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let length = match content_length(trimmed) {
            HeaderLine::NotHeader => {
                return Ok(Some(Frame {
                    framing: Framing::Line,
                    body: trimmed.to_vec(),
                }));
            }
            HeaderLine::Invalid => {
                tracing::warn!("skipping frame with invalid Content-Length header");
                skip_remaining_headers(reader).await?;
                continue;
            }
            HeaderLine::Length(length) if length > MAX_FRAME_BYTES => {
                tracing::warn!(
                    length,
                    max = MAX_FRAME_BYTES,
                    "skipping oversized frame"
                );
                skip_remaining_headers(reader).await?;
                let mut discard = (&mut *reader).take(length as u64);
                io::copy(&mut discard, &mut io::sink()).await?;
                continue;
            }
            HeaderLine::Length(length) => length,
        };

        skip_remaining_headers(reader).await?;
        let mut body = vec![0_u8; length];
        reader.read_exact(&mut body).await?;
        return Ok(Some(Frame {
            framing: Framing::ContentLength,
            body,
        }));
    }
}

enum HeaderLine {
    NotHeader,
    Length(usize),
    Invalid,
}

fn content_length(line: &[u8]) -> HeaderLine {
    let Ok(line) = std::str::from_utf8(line) else {
        return HeaderLine::NotHeader;
    };
    let Some((name, value)) = line.split_once(':') else {
        return HeaderLine::NotHeader;
    };
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return HeaderLine::NotHeader;
    }
    match value.trim().parse::<usize>() {
        Ok(length) => HeaderLine::Length(length),
        Err(_) => HeaderLine::Invalid,
    }
}

async fn skip_remaining_headers<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Unexpected EOF while reading MCP headers",
            ));
        }
        if line.trim_ascii().is_empty() {
            return Ok(());
        }
    }
}

pub async fn write_frame<W>(writer: &mut W, framing: Framing, value: &Value) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to serialize JSON: {e}"),
        )
    })?;
    match framing {
        Framing::Line => {
            writer.write_all(&body).await?;
            writer.write_all(b"\n").await?;
        }
        Framing::ContentLength => {
            let header = format!(
                "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
                body.len()
            );
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(&body).await?;
        }
    }
    writer.flush().await
}
