use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io;

/// Compact JSON with `", "` between items and `": "` after keys, the layout FPL
/// tooling and its consumers commonly exchange. Non-ASCII text is written as UTF-8, not
/// as `\u` escapes.
pub fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(256);
    let mut serializer = Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
