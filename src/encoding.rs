//! Payload stream transcoding.
//!
//! Decodes one byte source (the header stream's tail, a sibling file, or one
//! entry of a multi-file set) into element bytes or ASCII text, honouring
//! line/byte pre-skips. The encode side wraps element bytes with the chosen
//! encoding and compression level.

use std::io::{Read, Seek, SeekFrom, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::error::{Error, Result};
use crate::header::Encoding;

/// What one stream decoded to. ASCII stays text until the element type is
/// known; everything else becomes raw element bytes.
#[derive(Debug)]
pub(crate) enum StreamPayload {
    Binary(Vec<u8>),
    Text(String),
}

/// Decode a single payload stream.
///
/// `line skip` consumes lines of the stored stream before anything else;
/// `byte skip` discards bytes of the stored stream for raw/hex/ascii and of
/// the decoded stream for compressed encodings. A `byte_skip` of -1 (raw
/// only, validated by the caller) seeks to `end - element_count *
/// element_size` and overrides the line skip.
pub(crate) fn decode_stream<R: Read + Seek>(
    reader: &mut R,
    encoding: Encoding,
    line_skip: u64,
    byte_skip: i64,
    element_count: usize,
    element_size: usize,
) -> Result<StreamPayload> {
    if encoding == Encoding::Raw && byte_skip == -1 {
        let payload_len = (element_count * element_size) as i64;
        reader.seek(SeekFrom::End(-payload_len))?;
        let mut bytes = Vec::with_capacity(element_count * element_size);
        reader.read_to_end(&mut bytes)?;
        return Ok(StreamPayload::Binary(bytes));
    }

    skip_lines(reader, line_skip)?;

    match encoding {
        Encoding::Raw => {
            skip_bytes(reader, byte_skip as u64)?;
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            Ok(StreamPayload::Binary(bytes))
        }
        Encoding::Hex => {
            skip_bytes(reader, byte_skip as u64)?;
            let mut text = Vec::new();
            reader.read_to_end(&mut text)?;
            Ok(StreamPayload::Binary(decode_hex(&text)?))
        }
        Encoding::Ascii => {
            skip_bytes(reader, byte_skip as u64)?;
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            Ok(StreamPayload::Text(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        }
        Encoding::Gzip => {
            let mut compressed = Vec::new();
            reader.read_to_end(&mut compressed)?;
            let mut decoder = MultiGzDecoder::new(compressed.as_slice());
            let mut bytes = Vec::with_capacity(element_count * element_size);
            decoder
                .read_to_end(&mut bytes)
                .map_err(|e| Error::Encoding(format!("gzip stream decode failed: {e}")))?;
            drop_decoded_prefix(bytes, byte_skip as usize).map(StreamPayload::Binary)
        }
        Encoding::Bzip2 => {
            let mut compressed = Vec::new();
            reader.read_to_end(&mut compressed)?;
            let mut decoder = BzDecoder::new(compressed.as_slice());
            let mut bytes = Vec::with_capacity(element_count * element_size);
            decoder
                .read_to_end(&mut bytes)
                .map_err(|e| Error::Encoding(format!("bzip2 stream decode failed: {e}")))?;
            drop_decoded_prefix(bytes, byte_skip as usize).map(StreamPayload::Binary)
        }
    }
}

/// Encode element bytes into `writer`. ASCII payloads arrive here already
/// formatted as text bytes and pass through unchanged.
pub(crate) fn encode_stream<W: Write>(
    writer: &mut W,
    bytes: &[u8],
    encoding: Encoding,
    compression_level: u32,
) -> Result<()> {
    match encoding {
        Encoding::Raw | Encoding::Ascii => {
            writer.write_all(bytes)?;
        }
        Encoding::Hex => {
            // 35 byte pairs per line keeps lines at 70 columns.
            let mut line = String::with_capacity(71);
            for chunk in bytes.chunks(35) {
                line.clear();
                for byte in chunk {
                    line.push_str(&format!("{byte:02x}"));
                }
                line.push('\n');
                writer.write_all(line.as_bytes())?;
            }
        }
        Encoding::Gzip => {
            let level = flate2::Compression::new(compression_level.clamp(1, 9));
            let mut encoder = GzEncoder::new(&mut *writer, level);
            encoder.write_all(bytes)?;
            encoder.finish()?;
        }
        Encoding::Bzip2 => {
            let level = bzip2::Compression::new(compression_level.clamp(1, 9));
            let mut encoder = BzEncoder::new(&mut *writer, level);
            encoder.write_all(bytes)?;
            encoder.finish()?;
        }
    }
    Ok(())
}

fn skip_lines<R: Read>(reader: &mut R, count: u64) -> Result<()> {
    let mut byte = [0u8; 1];
    for _ in 0..count {
        loop {
            match reader.read(&mut byte)? {
                0 => return Ok(()),
                _ if byte[0] == b'\n' => break,
                _ => {}
            }
        }
    }
    Ok(())
}

fn skip_bytes<R: Read>(reader: &mut R, count: u64) -> Result<()> {
    std::io::copy(&mut reader.by_ref().take(count), &mut std::io::sink())?;
    Ok(())
}

fn drop_decoded_prefix(bytes: Vec<u8>, skip: usize) -> Result<Vec<u8>> {
    if skip == 0 {
        return Ok(bytes);
    }
    if skip > bytes.len() {
        return Err(Error::Encoding(format!(
            "byte skip {skip} exceeds the {} decoded payload bytes",
            bytes.len()
        )));
    }
    Ok(bytes[skip..].to_vec())
}

/// Decode pairs of hex digits, tolerating interleaved whitespace.
fn decode_hex(text: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut high: Option<u8> = None;
    for &byte in text {
        if byte.is_ascii_whitespace() {
            continue;
        }
        let nibble = (byte as char)
            .to_digit(16)
            .ok_or_else(|| Error::Encoding(format!("Invalid hex character: {}", byte as char)))?
            as u8;
        high = match high {
            None => Some(nibble),
            Some(h) => {
                out.push((h << 4) | nibble);
                None
            }
        };
    }
    if high.is_some() {
        return Err(Error::Encoding(
            "Odd number of hex digits in payload".to_string(),
        ));
    }
    Ok(out)
}

/// A parsed `data file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DataFileSpec {
    /// One sibling file.
    Single(String),
    /// Expanded multi-file set, in range order.
    Multi(Vec<String>),
}

/// Parse a `data file` value: either a plain path or the templated
/// `<format> <min> <max> <step> [<subdim>]` multi-file form. The `LIST`
/// manifest form is rejected.
pub(crate) fn parse_data_file(value: &str, dimension: usize) -> Result<DataFileSpec> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.first() == Some(&"LIST") {
        return Err(Error::InvariantViolation(
            "The LIST data file form is not supported".to_string(),
        ));
    }
    if !(tokens.len() == 4 || tokens.len() == 5) || !tokens[0].contains('%') {
        return Ok(DataFileSpec::Single(value.to_string()));
    }

    let parse_bound = |token: &str| -> Result<i64> {
        token.parse::<i64>().map_err(|_| {
            Error::InvariantViolation(format!("Invalid data file range value: {token}"))
        })
    };
    let min = parse_bound(tokens[1])?;
    let max = parse_bound(tokens[2])?;
    let step = parse_bound(tokens[3])?;
    if step == 0 || (step > 0 && min > max) || (step < 0 && min < max) {
        return Err(Error::InvariantViolation(format!(
            "Invalid data file range: {min} {max} {step}"
        )));
    }
    if let Some(token) = tokens.get(4) {
        let subdim = parse_bound(token)?;
        if subdim < 1 || subdim > dimension as i64 {
            return Err(Error::InvariantViolation(format!(
                "Data file subdim {subdim} is out of range for dimension {dimension}"
            )));
        }
    }

    let mut paths = Vec::new();
    let mut value = min;
    while (step > 0 && value <= max) || (step < 0 && value >= max) {
        paths.push(expand_template(tokens[0], value)?);
        value += step;
    }
    Ok(DataFileSpec::Multi(paths))
}

/// Apply a printf-style integer template (`%d`, `%03d`, `%x`, ...) to one
/// range value.
fn expand_template(template: &str, value: i64) -> Result<String> {
    let percent = template.find('%').ok_or_else(|| {
        Error::InvariantViolation(format!(
            "Data file format is missing a format specifier: {template}"
        ))
    })?;
    let rest = &template[percent + 1..];
    let bytes = rest.as_bytes();

    let mut zero_pad = false;
    let mut left_align = false;
    let mut index = 0;
    while index < bytes.len() && matches!(bytes[index], b'-' | b'+' | b' ' | b'0') {
        match bytes[index] {
            b'0' => zero_pad = true,
            b'-' => left_align = true,
            _ => {}
        }
        index += 1;
    }
    let width_start = index;
    while index < bytes.len() && bytes[index].is_ascii_digit() {
        index += 1;
    }
    let width: usize = rest[width_start..index].parse().unwrap_or(0);

    let conversion = bytes.get(index).copied();
    let formatted = match conversion {
        Some(b'd' | b'i' | b'u') => value.to_string(),
        Some(b'o') => format!("{value:o}"),
        Some(b'x') => format!("{value:x}"),
        Some(b'X') => format!("{value:X}"),
        _ => {
            return Err(Error::InvariantViolation(format!(
                "Unsupported data file format specifier: {template}"
            )))
        }
    };

    let padded = if formatted.len() >= width {
        formatted
    } else if left_align {
        format!("{formatted:<width$}")
    } else if zero_pad {
        match formatted.strip_prefix('-') {
            Some(digits) => format!("-{digits:0>w$}", w = width - 1),
            None => format!("{formatted:0>width$}"),
        }
    } else {
        format!("{formatted:>width$}")
    };

    Ok(format!(
        "{}{}{}",
        &template[..percent],
        padded,
        &rest[index + 1..]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_hex_with_whitespace() {
        let bytes = decode_hex(b"01 00\n0a ff").unwrap();
        assert_eq!(bytes, vec![0x01, 0x00, 0x0a, 0xff]);
    }

    #[test]
    fn test_decode_hex_odd_digits() {
        let err = decode_hex(b"012").unwrap_err();
        assert!(err.to_string().contains("Odd number of hex digits"));
    }

    #[test]
    fn test_decode_hex_invalid_char() {
        let err = decode_hex(b"0g").unwrap_err();
        assert!(err.to_string().contains("Invalid hex character"));
    }

    #[test]
    fn test_hex_encode_decode_roundtrip() {
        let payload: Vec<u8> = (0..=255).collect();
        let mut encoded = Vec::new();
        encode_stream(&mut encoded, &payload, Encoding::Hex, 9).unwrap();
        assert_eq!(decode_hex(&encoded).unwrap(), payload);
    }

    #[test]
    fn test_skip_lines_then_bytes() {
        let mut reader = Cursor::new(b"skip me\nand me\nabcpayload".to_vec());
        let payload = decode_stream(&mut reader, Encoding::Raw, 2, 3, 7, 1).unwrap();
        let StreamPayload::Binary(bytes) = payload else {
            panic!("expected binary payload")
        };
        assert_eq!(bytes, b"payload");
    }

    #[test]
    fn test_byte_skip_minus_one_reads_tail() {
        let mut data = vec![0xEE; 32];
        data.extend_from_slice(&[1, 2, 3, 4]);
        let mut reader = Cursor::new(data);
        let payload = decode_stream(&mut reader, Encoding::Raw, 0, -1, 4, 1).unwrap();
        let StreamPayload::Binary(bytes) = payload else {
            panic!("expected binary payload")
        };
        assert_eq!(bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_gzip_roundtrip_with_decoded_byte_skip() {
        let mut compressed = Vec::new();
        encode_stream(&mut compressed, b"abcpayload", Encoding::Gzip, 9).unwrap();
        let mut reader = Cursor::new(compressed);
        let payload = decode_stream(&mut reader, Encoding::Gzip, 0, 3, 7, 1).unwrap();
        let StreamPayload::Binary(bytes) = payload else {
            panic!("expected binary payload")
        };
        assert_eq!(bytes, b"payload");
    }

    #[test]
    fn test_bzip2_roundtrip() {
        let input: Vec<u8> = (0..200u16).map(|v| (v % 251) as u8).collect();
        let mut compressed = Vec::new();
        encode_stream(&mut compressed, &input, Encoding::Bzip2, 9).unwrap();
        let mut reader = Cursor::new(compressed);
        let payload = decode_stream(&mut reader, Encoding::Bzip2, 0, 0, input.len(), 1).unwrap();
        let StreamPayload::Binary(bytes) = payload else {
            panic!("expected binary payload")
        };
        assert_eq!(bytes, input);
    }

    #[test]
    fn test_corrupt_gzip_stream() {
        let mut reader = Cursor::new(b"not a gzip stream".to_vec());
        let err = decode_stream(&mut reader, Encoding::Gzip, 0, 0, 4, 1).unwrap_err();
        assert!(err.to_string().contains("gzip stream decode failed"));
    }

    #[test]
    fn test_parse_data_file_single() {
        let spec = parse_data_file("volume.raw", 3).unwrap();
        assert_eq!(spec, DataFileSpec::Single("volume.raw".to_string()));
    }

    #[test]
    fn test_parse_data_file_template() {
        let spec = parse_data_file("slice%03d.raw 1 3 1", 3).unwrap();
        assert_eq!(
            spec,
            DataFileSpec::Multi(vec![
                "slice001.raw".to_string(),
                "slice002.raw".to_string(),
                "slice003.raw".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_data_file_negative_step() {
        let spec = parse_data_file("s%d.raw 3 1 -1", 3).unwrap();
        assert_eq!(
            spec,
            DataFileSpec::Multi(vec![
                "s3.raw".to_string(),
                "s2.raw".to_string(),
                "s1.raw".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_data_file_subdim_bounds() {
        assert!(parse_data_file("s%d.raw 0 1 1 3", 3).is_ok());
        let err = parse_data_file("s%d.raw 0 1 1 4", 3).unwrap_err();
        assert!(err.to_string().contains("subdim"));
    }

    #[test]
    fn test_parse_data_file_bad_range() {
        assert!(parse_data_file("s%d.raw 3 1 1", 3).is_err());
        assert!(parse_data_file("s%d.raw 1 3 0", 3).is_err());
    }

    #[test]
    fn test_parse_data_file_list_rejected() {
        let err = parse_data_file("LIST", 3).unwrap_err();
        assert!(err.to_string().contains("LIST"));
    }

    #[test]
    fn test_expand_template_forms() {
        assert_eq!(expand_template("s%d.raw", 7).unwrap(), "s7.raw");
        assert_eq!(expand_template("s%04d.raw", 7).unwrap(), "s0007.raw");
        assert_eq!(expand_template("s%3d.raw", 7).unwrap(), "s  7.raw");
        assert_eq!(expand_template("s%02x.raw", 255).unwrap(), "sff.raw");
        assert_eq!(expand_template("s%03d.raw", -7).unwrap(), "s-07.raw");
        assert!(expand_template("s%f.raw", 7).is_err());
    }
}
