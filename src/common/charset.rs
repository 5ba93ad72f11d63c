use encoding_rs::{Encoding, UTF_8};

use super::error::{Error, Result};

/// Resolve a charset label such as `utf-8`, `UTF8` or `GBK`.
///
/// Labels follow the WHATWG encoding registry, plus the bare `utf8` spelling
/// that gateway configs commonly carry.
pub fn resolve(label: &str) -> Result<&'static Encoding> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("utf8") {
        return Ok(UTF_8);
    }
    Encoding::for_label(trimmed.as_bytes())
        .ok_or_else(|| Error::Config(format!("unsupported charset: {}", label)))
}

/// Encode `text` into bytes of the given charset.
///
/// Characters the charset cannot represent are an error rather than being
/// replaced, since a substituted byte would never match the server's string.
pub fn encode(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(Error::Config(format!(
            "value not representable in {}",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}
