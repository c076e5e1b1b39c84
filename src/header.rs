//! NRRD header parsing and representation.
//!
//! A header is an insertion-ordered mapping from lowercased field names to
//! typed [`FieldValue`]s. Parsing accepts any `BufRead` source; the
//! orchestrator in [`crate::io`] owns path handling.

use std::fmt;
use std::io::{BufRead, Write};

use crate::error::{Error, Result};
use crate::field::{field_type_of, is_standard_field, FieldValue};
use crate::io::ReadOptions;

/// Highest NRRD format version this library understands.
pub const MAX_VERSION: u32 = 5;

/// Version emitted by the writer unless overridden.
pub const DEFAULT_VERSION: u32 = 4;

/// Canonical field order on write, pinned against the reference corpus.
/// Fields not in this list are treated as custom and written last with the
/// `:=` delimiter, in insertion order.
pub(crate) const FIELD_ORDER: &[&str] = &[
    "type",
    "dimension",
    "space dimension",
    "space",
    "sizes",
    "space directions",
    "kinds",
    "endian",
    "encoding",
    "min",
    "max",
    "oldmin",
    "old min",
    "oldmax",
    "old max",
    "content",
    "sample units",
    "spacings",
    "thicknesses",
    "axis mins",
    "axismins",
    "axis maxs",
    "axismaxs",
    "centerings",
    "labels",
    "units",
    "space units",
    "space origin",
    "measurement frame",
    "block size",
    "blocksize",
    "line skip",
    "lineskip",
    "byte skip",
    "byteskip",
    "data file",
    "datafile",
];

/// Scalar element type of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    /// Opaque fixed-size chunks; accepted structurally (requires the
    /// `block size` field) but not decodable.
    Block,
}

impl ScalarType {
    /// Parse an NRRD type name, accepting the common aliases
    /// case-insensitively.
    pub fn from_nrrd(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "signed char" | "int8" | "int8_t" => Ok(Self::Int8),
            "uchar" | "unsigned char" | "uint8" | "uint8_t" => Ok(Self::UInt8),
            "short" | "short int" | "signed short" | "signed short int" | "int16" | "int16_t" => {
                Ok(Self::Int16)
            }
            "ushort" | "unsigned short" | "unsigned short int" | "uint16" | "uint16_t" => {
                Ok(Self::UInt16)
            }
            "int" | "signed int" | "int32" | "int32_t" => Ok(Self::Int32),
            "uint" | "unsigned int" | "uint32" | "uint32_t" => Ok(Self::UInt32),
            "longlong" | "long long" | "long long int" | "signed long long"
            | "signed long long int" | "int64" | "int64_t" => Ok(Self::Int64),
            "ulonglong" | "unsigned long long" | "unsigned long long int" | "uint64"
            | "uint64_t" => Ok(Self::UInt64),
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "block" => Ok(Self::Block),
            _ => Err(Error::UnsupportedType(format!(
                "Unsupported scalar type: {name}"
            ))),
        }
    }

    /// Canonical spelling used on write.
    pub const fn nrrd_name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Block => "block",
        }
    }

    /// Size of one element in bytes. `Block` has no intrinsic size and
    /// returns 0; decode paths reject it before this matters.
    pub const fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float => 4,
            Self::Int64 | Self::UInt64 | Self::Double => 8,
            Self::Block => 0,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nrrd_name())
    }
}

/// Payload encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Raw,
    Ascii,
    Hex,
    Gzip,
    Bzip2,
}

impl Encoding {
    /// Parse an encoding name, accepting the legacy spellings
    /// (`txt`/`text`, `gz`, `bz2`) case-insensitively.
    pub fn from_nrrd(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "ascii" | "txt" | "text" => Ok(Self::Ascii),
            "hex" => Ok(Self::Hex),
            "gzip" | "gz" => Ok(Self::Gzip),
            "bzip2" | "bz2" => Ok(Self::Bzip2),
            _ => Err(Error::Encoding(format!("Unsupported encoding: {name}"))),
        }
    }

    /// Canonical spelling.
    pub const fn nrrd_name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Ascii => "ascii",
            Self::Hex => "hex",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }

    /// Extension of the detached data file written next to a `.nhdr` header.
    pub(crate) const fn detached_extension(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Ascii => "txt",
            Self::Hex => "hex",
            Self::Gzip => "raw.gz",
            Self::Bzip2 => "raw.bz2",
        }
    }
}

/// Byte order of multi-byte elements on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn from_nrrd(name: &str) -> Result<Self> {
        match name {
            "little" => Ok(Self::Little),
            "big" => Ok(Self::Big),
            _ => Err(Error::Encoding(format!(
                "Invalid endian value in header: {name}"
            ))),
        }
    }

    /// Byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    pub const fn nrrd_name(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }
}

/// An NRRD header: field names mapped to typed values, in insertion order.
///
/// Names are stored lowercased with their spaces preserved; aliased
/// spellings (`byteskip` vs `byte skip`) are distinct entries, and the
/// accessors below check both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NrrdHeader {
    fields: Vec<(String, FieldValue)>,
}

impl NrrdHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// First present value among alias spellings, checked in order.
    pub fn get_any(&self, names: &[&str]) -> Option<&FieldValue> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Insert a field, replacing the value in place if the name exists.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(std::mem::replace(&mut slot.1, value))
        } else {
            self.fields.push((name, value));
            None
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of axes, from the `dimension` field.
    pub fn dimension(&self) -> Result<usize> {
        match self.get("dimension") {
            Some(FieldValue::Int(d)) if *d >= 1 => Ok(*d as usize),
            Some(FieldValue::Int(d)) => Err(Error::InvariantViolation(format!(
                "dimension must be at least 1, got {d}"
            ))),
            Some(_) => Err(Error::TypeMismatch(
                "dimension field must be an int".to_string(),
            )),
            None => Err(missing_field("dimension")),
        }
    }

    /// Axis lengths in fastest-first order, from the `sizes` field.
    pub fn sizes(&self) -> Result<Vec<usize>> {
        match self.get("sizes") {
            Some(FieldValue::IntList(sizes)) => sizes
                .iter()
                .map(|&s| {
                    if s >= 1 {
                        Ok(s as usize)
                    } else {
                        Err(Error::InvariantViolation(format!(
                            "sizes must be greater than zero, got {s}"
                        )))
                    }
                })
                .collect(),
            Some(_) => Err(Error::TypeMismatch(
                "sizes field must be an int list".to_string(),
            )),
            None => Err(missing_field("sizes")),
        }
    }

    /// Scalar element type, from the `type` field.
    pub fn scalar_type(&self) -> Result<ScalarType> {
        match self.get("type") {
            Some(FieldValue::String(name)) => ScalarType::from_nrrd(name),
            Some(_) => Err(Error::TypeMismatch(
                "type field must be a string".to_string(),
            )),
            None => Err(missing_field("type")),
        }
    }

    /// Payload encoding, from the `encoding` field.
    pub fn encoding(&self) -> Result<Encoding> {
        match self.get("encoding") {
            Some(FieldValue::String(name)) => Encoding::from_nrrd(name),
            Some(_) => Err(Error::TypeMismatch(
                "encoding field must be a string".to_string(),
            )),
            None => Err(missing_field("encoding")),
        }
    }

    /// Declared byte order. Required whenever the element type is
    /// multi-byte and the encoding is binary.
    pub fn endianness(&self) -> Result<Endianness> {
        match self.get("endian") {
            Some(FieldValue::String(name)) => Endianness::from_nrrd(name),
            Some(_) => Err(Error::TypeMismatch(
                "endian field must be a string".to_string(),
            )),
            None => Err(missing_field("endian")),
        }
    }

    /// Total element count, the product of `sizes`.
    pub fn element_count(&self) -> Result<usize> {
        let mut count: usize = 1;
        for size in self.sizes()? {
            count = count.checked_mul(size).ok_or_else(|| {
                Error::InvariantViolation("dimension product overflow".to_string())
            })?;
        }
        Ok(count)
    }

    /// The `data file` field (either spelling), if present.
    pub fn data_file(&self) -> Option<&str> {
        self.get_any(&["datafile", "data file"])
            .and_then(FieldValue::as_str)
    }

    pub(crate) fn line_skip(&self) -> Result<i64> {
        skip_value(self.get_any(&["lineskip", "line skip"]), "line skip")
    }

    pub(crate) fn byte_skip(&self) -> Result<i64> {
        skip_value(self.get_any(&["byteskip", "byte skip"]), "byte skip")
    }
}

fn skip_value(value: Option<&FieldValue>, name: &str) -> Result<i64> {
    match value {
        None => Ok(0),
        Some(FieldValue::Int(v)) => Ok(*v),
        Some(_) => Err(Error::TypeMismatch(format!("{name} field must be an int"))),
    }
}

pub(crate) fn missing_field(name: &str) -> Error {
    Error::InvariantViolation(format!("Header is missing required field: {name}"))
}

/// Validate the `NRRD<version>` magic line, returning the version.
fn validate_magic_line(line: &str) -> Result<u32> {
    let Some(rest) = line.strip_prefix("NRRD") else {
        return Err(Error::MalformedHeader(
            "Invalid NRRD magic line. Is this an NRRD file?".to_string(),
        ));
    };
    let version: u32 = rest
        .parse()
        .map_err(|_| Error::MalformedHeader(format!("Invalid NRRD magic line: {line}")))?;
    if version == 0 {
        return Err(Error::MalformedHeader(format!(
            "Invalid NRRD magic line: {line}"
        )));
    }
    if version > MAX_VERSION {
        return Err(Error::MalformedHeader(format!(
            "Unsupported NRRD file version (version: {version}). \
             This library only supports v{MAX_VERSION} and below."
        )));
    }
    Ok(version)
}

/// Parse a header from a byte-line source, stopping after the blank
/// separator line. End of input also terminates the header: detached
/// `.nhdr` files routinely omit the trailing blank line.
pub(crate) fn parse_header<R: BufRead>(reader: &mut R, options: &ReadOptions) -> Result<NrrdHeader> {
    let mut line = String::new();
    if read_logical_line(reader, &mut line)? == 0 {
        return Err(Error::MalformedHeader(
            "Invalid NRRD magic line. Is this an NRRD file?".to_string(),
        ));
    }
    let magic = line.trim_end_matches(['\n', '\r']);
    let magic = magic.strip_prefix('\u{feff}').unwrap_or(magic);
    validate_magic_line(magic)?;

    let mut header = NrrdHeader::new();
    loop {
        line.clear();
        if read_logical_line(reader, &mut line)? == 0 {
            break;
        }
        let trimmed = line.trim_end();
        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed.is_empty() {
            break;
        }
        parse_header_line(&mut header, trimmed, options)?;
    }
    Ok(header)
}

fn read_logical_line<R: BufRead>(reader: &mut R, line: &mut String) -> Result<usize> {
    reader.read_line(line).map_err(Error::Io)
}

fn parse_header_line(header: &mut NrrdHeader, line: &str, options: &ReadOptions) -> Result<()> {
    let colon = line
        .find(':')
        .ok_or_else(|| Error::MalformedHeader(format!("Invalid header line: {line}")))?;
    let is_custom = line.as_bytes().get(colon + 1) == Some(&b'=');

    let name = line[..colon].trim().to_lowercase();
    if name.is_empty() {
        return Err(Error::MalformedHeader(format!("Invalid header line: {line}")));
    }
    let value_text = if is_custom {
        &line[colon + 2..]
    } else {
        &line[colon + 1..]
    };

    if header.contains(&name) {
        // Custom fields are unique per file by policy; the duplicate toggle
        // only relaxes standard fields.
        if is_custom || !options.config.allow_duplicate_field {
            return Err(Error::DuplicateField(name));
        }
        log::warn!("Duplicate header field: {name}");
        return Ok(());
    }

    let field_type = field_type_of(
        &name,
        options.config.space_directions,
        options.custom_field_map.as_ref(),
    );
    let value = FieldValue::parse(value_text.trim(), field_type)?;
    header.insert(name, value);
    Ok(())
}

/// Serialize `header`: magic line, standard fields in canonical order,
/// custom fields in insertion order, blank separator line.
pub(crate) fn write_header<W: Write>(
    writer: &mut W,
    header: &NrrdHeader,
    version: u32,
) -> Result<()> {
    writeln!(writer, "NRRD{version:04}")?;
    for &field in FIELD_ORDER {
        if let Some(value) = header.get(field) {
            writeln!(writer, "{field}: {}", value.format())?;
        }
    }
    for (name, value) in header.iter() {
        if !is_standard_field(name) {
            writeln!(writer, "{name}:={}", value.format())?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldMap;
    use crate::io::ReadOptions;
    use crate::{FieldType, NrrdConfig};
    use std::io::Cursor;

    fn parse(text: &str) -> Result<NrrdHeader> {
        parse_header(&mut Cursor::new(text), &ReadOptions::default())
    }

    #[test]
    fn test_magic_line_versions() {
        assert!(validate_magic_line("NRRD0005").is_ok());
        assert!(validate_magic_line("NRRD0001").is_ok());
        assert!(validate_magic_line("NRRD4").is_ok());

        let err = validate_magic_line("NRRD2000").unwrap_err();
        assert!(err
            .to_string()
            .contains("Unsupported NRRD file version (version: 2000)"));

        let err = validate_magic_line("NRRDnono").unwrap_err();
        assert!(err.to_string().contains("Invalid NRRD magic line: NRRDnono"));

        let err = validate_magic_line("invalid magic line").unwrap_err();
        assert!(err.to_string().contains("Is this an NRRD file?"));
    }

    #[test]
    fn test_parse_basic_header() {
        let header = parse("NRRD0005\ntype: float\ndimension: 3\nmin: 0\nmax: 35.4\n\n").unwrap();
        assert_eq!(header.get("type"), Some(&FieldValue::String("float".into())));
        assert_eq!(header.get("dimension"), Some(&FieldValue::Int(3)));
        assert_eq!(header.get("min"), Some(&FieldValue::Double(0.0)));
        assert_eq!(header.get("max"), Some(&FieldValue::Double(35.4)));
    }

    #[test]
    fn test_parse_preserves_insertion_order() {
        let header = parse("NRRD0004\ndimension: 2\ntype: uint8\nsizes: 3 4\n").unwrap();
        let names: Vec<&str> = header.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["dimension", "type", "sizes"]);
    }

    #[test]
    fn test_custom_field_with_colon_equals() {
        let header = parse("NRRD0005\nmy extra info:=my : colon-separated : values\n").unwrap();
        assert_eq!(
            header.get("my extra info"),
            Some(&FieldValue::String("my : colon-separated : values".into()))
        );
    }

    #[test]
    fn test_comments_discarded_and_crlf_accepted() {
        let header =
            parse("NRRD0004\r\n# a comment\r\ntype: uchar\r\ndimension: 1\r\n\r\n").unwrap();
        assert_eq!(header.len(), 2);
        assert_eq!(header.get("type"), Some(&FieldValue::String("uchar".into())));
    }

    #[test]
    fn test_names_lowercased() {
        let header = parse("NRRD0004\nTYPE: uchar\nDimension: 1\n").unwrap();
        assert!(header.contains("type"));
        assert!(header.contains("dimension"));
    }

    #[test]
    fn test_duplicate_field_fatal_by_default() {
        let err = parse("NRRD0005\ntype: float\ndimension: 3\ntype: float\n").unwrap_err();
        assert_eq!(err.to_string(), "Duplicate header field: type");
    }

    #[test]
    fn test_duplicate_field_first_wins_when_allowed() {
        let options = ReadOptions {
            config: NrrdConfig {
                allow_duplicate_field: true,
                ..NrrdConfig::default()
            },
            ..ReadOptions::default()
        };
        let header = parse_header(
            &mut Cursor::new("NRRD0005\ntype: float\ntype: int32\ndimension: 3\n"),
            &options,
        )
        .unwrap();
        assert_eq!(header.get("type"), Some(&FieldValue::String("float".into())));
    }

    #[test]
    fn test_duplicate_custom_field_always_fatal() {
        let options = ReadOptions {
            config: NrrdConfig {
                allow_duplicate_field: true,
                ..NrrdConfig::default()
            },
            ..ReadOptions::default()
        };
        let err = parse_header(
            &mut Cursor::new("NRRD0005\ninfo:=a\ninfo:=b\n"),
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateField(_)));
    }

    #[test]
    fn test_invalid_header_line() {
        let err = parse("NRRD0004\nno delimiter here\n").unwrap_err();
        assert!(err.to_string().contains("Invalid header line"));
    }

    #[test]
    fn test_eof_terminates_header() {
        // Detached headers often end without a blank line.
        let header = parse("NRRD0004\ntype: uchar\ndimension: 1\nsizes: 4").unwrap();
        assert_eq!(header.len(), 3);
    }

    #[test]
    fn test_custom_field_map_typing() {
        let mut map = FieldMap::new();
        map.insert("double vector".to_string(), FieldType::DoubleVector);
        let options = ReadOptions {
            custom_field_map: Some(map),
            ..ReadOptions::default()
        };
        let header = parse_header(
            &mut Cursor::new("NRRD0004\ndouble vector:=(100.5,200.3,-300.99)\n"),
            &options,
        )
        .unwrap();
        assert_eq!(
            header.get("double vector"),
            Some(&FieldValue::DoubleVector(vec![100.5, 200.3, -300.99]))
        );

        // Without a map entry the same line stays a string.
        let header = parse("NRRD0004\ndouble vector:=(100.5,200.3,-300.99)\n").unwrap();
        assert_eq!(
            header.get("double vector"),
            Some(&FieldValue::String("(100.5,200.3,-300.99)".into()))
        );
    }

    #[test]
    fn test_scalar_type_aliases() {
        for (name, expected) in [
            ("signed char", ScalarType::Int8),
            ("uchar", ScalarType::UInt8),
            ("unsigned short int", ScalarType::UInt16),
            ("short", ScalarType::Int16),
            ("int", ScalarType::Int32),
            ("unsigned int", ScalarType::UInt32),
            ("long long", ScalarType::Int64),
            ("ulonglong", ScalarType::UInt64),
            ("FLOAT", ScalarType::Float),
            ("double", ScalarType::Double),
            ("block", ScalarType::Block),
        ] {
            assert_eq!(ScalarType::from_nrrd(name).unwrap(), expected, "{name}");
        }
        assert!(ScalarType::from_nrrd("quadfloat").is_err());
    }

    #[test]
    fn test_encoding_aliases() {
        assert_eq!(Encoding::from_nrrd("gz").unwrap(), Encoding::Gzip);
        assert_eq!(Encoding::from_nrrd("ASCII").unwrap(), Encoding::Ascii);
        assert_eq!(Encoding::from_nrrd("txt").unwrap(), Encoding::Ascii);
        assert_eq!(Encoding::from_nrrd("bz2").unwrap(), Encoding::Bzip2);
        let err = Encoding::from_nrrd("fake").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported encoding: fake");
    }

    #[test]
    fn test_endianness() {
        assert_eq!(Endianness::from_nrrd("little").unwrap(), Endianness::Little);
        let err = Endianness::from_nrrd("fake").unwrap_err();
        assert_eq!(err.to_string(), "Invalid endian value in header: fake");
    }

    #[test]
    fn test_geometry_accessors() {
        let header = parse(
            "NRRD0004\ntype: short\ndimension: 3\nsizes: 30 30 30\nencoding: raw\nendian: little\n\n",
        )
        .unwrap();
        assert_eq!(header.dimension().unwrap(), 3);
        assert_eq!(header.sizes().unwrap(), vec![30, 30, 30]);
        assert_eq!(header.element_count().unwrap(), 27000);
        assert_eq!(header.scalar_type().unwrap(), ScalarType::Int16);
        assert_eq!(header.encoding().unwrap(), Encoding::Raw);
        assert_eq!(header.endianness().unwrap(), Endianness::Little);
    }

    #[test]
    fn test_negative_size_rejected() {
        let header = parse("NRRD0004\nsizes: 4 -2\n").unwrap();
        let err = header.sizes().unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_skip_alias_precedence() {
        let header = parse("NRRD0004\nbyteskip: 4\nbyte skip: 9\n").unwrap();
        assert_eq!(header.byte_skip().unwrap(), 4);
        let header = parse("NRRD0004\nline skip: 3\n").unwrap();
        assert_eq!(header.line_skip().unwrap(), 3);
        let header = parse("NRRD0004\n").unwrap();
        assert_eq!(header.byte_skip().unwrap(), 0);
    }

    #[test]
    fn test_write_header_canonical_order() {
        let mut header = NrrdHeader::new();
        header.insert("encoding", FieldValue::String("raw".into()));
        header.insert("sizes", FieldValue::IntList(vec![4]));
        header.insert("custom info", FieldValue::String("abc".into()));
        header.insert("type", FieldValue::String("int32".into()));
        header.insert("dimension", FieldValue::Int(1));

        let mut out = Vec::new();
        write_header(&mut out, &header, DEFAULT_VERSION).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "NRRD0004",
                "type: int32",
                "dimension: 1",
                "sizes: 4",
                "encoding: raw",
                "custom info:=abc",
                "",
            ]
        );
    }

    #[test]
    fn test_header_roundtrip_preserves_values() {
        let input = "NRRD0004\ntype: double\ndimension: 3\nsizes: 32 40 16\n\
                     space directions: (1.5,0,0) (0,1.5,0) none\nencoding: raw\n\
                     endian: little\nlabels: \"X\" \"Y\" \"Z\"\n\n";
        let header = parse(input).unwrap();
        let mut out = Vec::new();
        write_header(&mut out, &header, 4).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("space directions: (1.5,0,0) (0,1.5,0) none\n"));
        assert!(text.contains("labels: \"X\" \"Y\" \"Z\"\n"));

        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed.get("labels"), header.get("labels"));
        assert_eq!(reparsed.get("sizes"), header.get("sizes"));
    }
}
