//! Reading and writing NRRD files.
//!
//! This is the only module that opens files: header and payload codecs take
//! byte streams, and the orchestration here wires them to paths, resolves
//! detached data files, and synthesizes the writer's geometry fields.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::data::{IndexOrder, NrrdArray};
use crate::encoding::{decode_stream, encode_stream, parse_data_file, DataFileSpec, StreamPayload};
use crate::error::{Error, Result};
use crate::field::{FieldMap, FieldValue};
use crate::header::{self, missing_field, Encoding, Endianness, NrrdHeader, DEFAULT_VERSION};
use crate::NrrdConfig;

/// Options for [`read`], [`read_header`], and [`read_data`].
///
/// `Default` snapshots the process-level configuration, so the global
/// toggles apply unless overridden per call.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Axis ordering of the returned buffer.
    pub index_order: IndexOrder,
    /// Shapes for custom fields, keyed by lowercased field name.
    pub custom_field_map: Option<FieldMap>,
    /// Duplicate-field and space-directions behaviour.
    pub config: NrrdConfig,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            index_order: IndexOrder::default(),
            custom_field_map: None,
            config: NrrdConfig::global(),
        }
    }
}

/// Options for [`write`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Axis ordering of the supplied buffer.
    pub index_order: IndexOrder,
    /// Force a detached header even for `.nrrd` destinations.
    pub detached_header: bool,
    /// Point the `data file` field at a basename relative to the header
    /// rather than an absolute path.
    pub relative_data_path: bool,
    /// Compression level for gzip/bzip2 payloads, 1 (fastest) to 9 (best).
    pub compression_level: u32,
    /// NRRD format version for the magic line.
    pub version: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            index_order: IndexOrder::default(),
            detached_header: false,
            relative_data_path: true,
            compression_level: 9,
            version: DEFAULT_VERSION,
        }
    }
}

/// Read an NRRD file, returning the decoded buffer and its header.
pub fn read<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<(NrrdArray, NrrdHeader)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let header = header::parse_header(&mut reader, options)?;
    let data = read_data(&header, &mut reader, Some(path), options)?;
    Ok((data, header))
}

/// Parse a header from any byte-line source. The reader is left positioned
/// just past the blank separator line; the caller retains ownership.
pub fn read_header<R: BufRead>(reader: &mut R, options: &ReadOptions) -> Result<NrrdHeader> {
    header::parse_header(reader, options)
}

/// Parse the header of the NRRD file at `path`.
pub fn read_header_file<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<NrrdHeader> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    header::parse_header(&mut reader, options)
}

/// Decode the payload for `header`.
///
/// `reader` must be positioned at the first payload byte (as left by
/// [`read_header`]) and is ignored when the header points at detached data
/// files. `filename` is the path of the header file; it is required to
/// resolve relative detached paths.
pub fn read_data<R: Read + Seek>(
    header: &NrrdHeader,
    reader: &mut R,
    filename: Option<&Path>,
    options: &ReadOptions,
) -> Result<NrrdArray> {
    for field in ["dimension", "type", "encoding", "sizes"] {
        if !header.contains(field) {
            return Err(missing_field(field));
        }
    }

    let dimension = header.dimension()?;
    let sizes = header.sizes()?;
    if dimension != sizes.len() {
        return Err(Error::InvariantViolation(format!(
            "Number of elements in sizes does not match dimension. \
             Dimension: {dimension}, len(sizes): {}",
            sizes.len()
        )));
    }

    let scalar_type = header.scalar_type()?;
    let encoding = header.encoding()?;
    let element_size = scalar_type.size();
    if element_size == 0 {
        return Err(Error::UnsupportedType(
            "Decoding data of type 'block' is not supported".to_string(),
        ));
    }
    let element_count = header.element_count()?;

    // Endianness only matters for multi-byte binary payloads.
    let endian = if element_size > 1 && encoding != Encoding::Ascii {
        if !header.contains("endian") {
            return Err(missing_field("endian"));
        }
        header.endianness()?
    } else {
        Endianness::native()
    };

    let line_skip = header.line_skip()?;
    if line_skip < 0 {
        return Err(Error::InvariantViolation(
            "Invalid lineskip, allowed values are greater than or equal to 0".to_string(),
        ));
    }
    let byte_skip = header.byte_skip()?;
    if byte_skip < -1 {
        return Err(Error::InvariantViolation(
            "Invalid byteskip, allowed values are greater than or equal to -1".to_string(),
        ));
    }
    if byte_skip == -1 && encoding != Encoding::Raw {
        return Err(Error::InvariantViolation(
            "byteskip of -1 is only valid with raw encoding".to_string(),
        ));
    }

    let payloads = match header.data_file() {
        None => vec![decode_stream(
            reader,
            encoding,
            line_skip as u64,
            byte_skip,
            element_count,
            element_size,
        )?],
        Some(value) => {
            let paths = match parse_data_file(value, dimension)? {
                DataFileSpec::Single(path) => vec![path],
                DataFileSpec::Multi(paths) => paths,
            };
            // Each detached file holds an equal slab of the split axis.
            let per_file_count = element_count / paths.len().max(1);
            let mut payloads = Vec::with_capacity(paths.len());
            for data_path in &paths {
                let resolved = resolve_data_path(data_path, filename)?;
                let file = File::open(&resolved)?;
                let mut file_reader = BufReader::new(file);
                payloads.push(decode_stream(
                    &mut file_reader,
                    encoding,
                    line_skip as u64,
                    byte_skip,
                    per_file_count,
                    element_size,
                )?);
            }
            payloads
        }
    };

    // Concatenate per-file payloads; the split axis varies slowest, so the
    // element order is preserved.
    if matches!(payloads.first(), Some(StreamPayload::Text(_))) {
        let mut text = String::new();
        for payload in payloads {
            let StreamPayload::Text(chunk) = payload else {
                unreachable!("encoding is uniform across data files")
            };
            text.push_str(&chunk);
            text.push('\n');
        }
        NrrdArray::from_ascii(scalar_type, &sizes, &text, options.index_order)
    } else {
        let mut bytes = Vec::with_capacity(element_count * element_size);
        for payload in payloads {
            let StreamPayload::Binary(chunk) = payload else {
                unreachable!("encoding is uniform across data files")
            };
            bytes.extend_from_slice(&chunk);
        }
        NrrdArray::from_bytes(scalar_type, &sizes, &bytes, endian, options.index_order)
    }
}

fn resolve_data_path(data_file: &str, filename: Option<&Path>) -> Result<PathBuf> {
    let path = Path::new(data_file);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let header_path = filename.ok_or_else(|| {
        Error::InvariantViolation(
            "Filename parameter must be specified when a relative data file path is given"
                .to_string(),
        )
    })?;
    Ok(header_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(path))
}

enum Layout {
    Attached,
    Detached { header_path: PathBuf, data_path: PathBuf },
}

/// Write `data` with `header` to `path`.
///
/// The `type`, `endian`, `dimension`, and `sizes` fields are always derived
/// from the buffer, overriding caller-provided values; `encoding` defaults
/// to gzip. A `.nhdr` destination forces a detached layout; a `.nrrd`
/// destination honours `detached_header` by writing the header to
/// `<base>.nhdr` and the payload to the `.nrrd` path.
pub fn write<P: AsRef<Path>>(
    path: P,
    data: &NrrdArray,
    header: &NrrdHeader,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut header = header.clone();

    header.insert(
        "type",
        FieldValue::String(data.scalar_type().nrrd_name().to_string()),
    );
    let sizes = data.disk_sizes(options.index_order);
    header.insert("dimension", FieldValue::Int(sizes.len() as i64));
    header.insert(
        "sizes",
        FieldValue::IntList(sizes.iter().map(|&s| s as i64).collect()),
    );

    if !header.contains("encoding") {
        header.insert("encoding", FieldValue::String("gzip".to_string()));
    }
    let encoding_name = header
        .get("encoding")
        .and_then(FieldValue::as_str)
        .ok_or_else(|| Error::TypeMismatch("encoding field must be a string".to_string()))?
        .to_string();
    let is_ascii = matches!(
        encoding_name.to_lowercase().as_str(),
        "ascii" | "text" | "txt"
    );

    if data.scalar_type().size() > 1 && !is_ascii {
        header.insert(
            "endian",
            FieldValue::String(Endianness::native().nrrd_name().to_string()),
        );
    } else {
        header.remove("endian");
    }

    // `space` and `space dimension` are mutually exclusive.
    if header.contains("space") {
        header.remove("space dimension");
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let layout = if extension == "nhdr" {
        let encoding = Encoding::from_nrrd(&encoding_name).map_err(|_| {
            Error::Encoding(format!(
                "Invalid encoding specification while writing NRRD file: {encoding_name}"
            ))
        })?;
        let data_path = path.with_extension(encoding.detached_extension());
        set_data_file(&mut header, &data_path, options)?;
        Layout::Detached {
            header_path: path.to_path_buf(),
            data_path,
        }
    } else if extension == "nrrd" && options.detached_header {
        let data_path = path.to_path_buf();
        set_data_file(&mut header, &data_path, options)?;
        Layout::Detached {
            header_path: path.with_extension("nhdr"),
            data_path,
        }
    } else {
        header.remove("data file");
        header.remove("datafile");
        Layout::Attached
    };

    let encoding = Encoding::from_nrrd(&encoding_name)?;

    match layout {
        Layout::Attached => {
            let file = File::create(path)?;
            let mut writer = BufWriter::with_capacity(1024 * 1024, file);
            header::write_header(&mut writer, &header, options.version)?;
            write_payload(&mut writer, data, encoding, options)?;
            writer.flush()?;
        }
        Layout::Detached {
            header_path,
            data_path,
        } => {
            let file = File::create(&header_path)?;
            let mut writer = BufWriter::new(file);
            header::write_header(&mut writer, &header, options.version)?;
            writer.flush()?;

            let file = File::create(&data_path)?;
            let mut writer = BufWriter::with_capacity(1024 * 1024, file);
            write_payload(&mut writer, data, encoding, options)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Replace any caller-provided data-file field with the synthesized path.
fn set_data_file(header: &mut NrrdHeader, data_path: &Path, options: &WriteOptions) -> Result<()> {
    header.remove("datafile");
    let value = if options.relative_data_path {
        data_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "Cannot derive a data file name from {}",
                    data_path.display()
                ))
            })?
            .to_string()
    } else {
        std::path::absolute(data_path)?.display().to_string()
    };
    header.insert("data file", FieldValue::String(value));
    Ok(())
}

fn write_payload<W: Write>(
    writer: &mut W,
    data: &NrrdArray,
    encoding: Encoding,
    options: &WriteOptions,
) -> Result<()> {
    if encoding == Encoding::Ascii {
        let text = data.to_ascii(options.index_order);
        encode_stream(writer, text.as_bytes(), encoding, options.compression_level)
    } else {
        let bytes = data.to_bytes(options.index_order);
        encode_stream(writer, &bytes, encoding, options.compression_level)
    }
}
