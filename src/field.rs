//! Header field value shapes and their parse/format rules.
//!
//! Every NRRD header field carries a value in one of a closed set of shapes
//! (integer, double, string, lists, vectors, matrices, and the nullable
//! vector-list forms). The registry maps field names to shapes; unknown
//! fields default to plain strings unless a custom field map says otherwise.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::SpaceDirectionsKind;

/// Map from field name to the shape its value should be parsed as.
///
/// Used to extend the registry with caller-defined custom fields.
pub type FieldMap = HashMap<String, FieldType>;

/// The closed set of value shapes a header field can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Decimal integer, e.g. `5`.
    Int,
    /// IEEE-754 double, e.g. `2.5`.
    Double,
    /// Rest of the line, surrounding whitespace trimmed.
    String,
    /// Whitespace-separated integers, e.g. `1 2 3`.
    IntList,
    /// Whitespace-separated doubles, e.g. `1.2 2.0 3.1`.
    DoubleList,
    /// Whitespace-split strings (no quote handling).
    StringList,
    /// Double-quoted strings separated by whitespace, e.g. `"mm" "cm"`.
    QuotedStringList,
    /// Parenthesized comma-separated integers, e.g. `(1,0,0)`.
    IntVector,
    /// Parenthesized comma-separated doubles.
    DoubleVector,
    /// Space-separated integer vectors of uniform width.
    IntMatrix,
    /// Space-separated double vectors of uniform width; a row may be the
    /// literal `none`, decoded as a row of NaNs.
    DoubleMatrix,
    /// Space-separated integer vectors where `none` decodes to an explicit
    /// null entry.
    IntVectorList,
    /// Space-separated double vectors where `none` decodes to an explicit
    /// null entry.
    DoubleVectorList,
}

impl FieldType {
    /// The identifier used for this shape in custom field maps.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::IntList => "int list",
            Self::DoubleList => "double list",
            Self::StringList => "string list",
            Self::QuotedStringList => "quoted string list",
            Self::IntVector => "int vector",
            Self::DoubleVector => "double vector",
            Self::IntMatrix => "int matrix",
            Self::DoubleMatrix => "double matrix",
            Self::IntVectorList => "int vector list",
            Self::DoubleVectorList => "double vector list",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(Self::Int),
            "double" => Ok(Self::Double),
            "string" => Ok(Self::String),
            "int list" => Ok(Self::IntList),
            "double list" => Ok(Self::DoubleList),
            "string list" => Ok(Self::StringList),
            "quoted string list" => Ok(Self::QuotedStringList),
            "int vector" => Ok(Self::IntVector),
            "double vector" => Ok(Self::DoubleVector),
            "int matrix" => Ok(Self::IntMatrix),
            "double matrix" => Ok(Self::DoubleMatrix),
            "int vector list" => Ok(Self::IntVectorList),
            "double vector list" => Ok(Self::DoubleVectorList),
            _ => Err(Error::UnknownField(s.to_string())),
        }
    }
}

/// A parsed header field value.
///
/// The variant records the representation the value was parsed as (or was
/// constructed with), and formatting preserves it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Double(f64),
    String(String),
    IntList(Vec<i64>),
    DoubleList(Vec<f64>),
    StringList(Vec<String>),
    QuotedStringList(Vec<String>),
    IntVector(Vec<i64>),
    DoubleVector(Vec<f64>),
    IntMatrix(Vec<Vec<i64>>),
    DoubleMatrix(Vec<Vec<f64>>),
    IntVectorList(Vec<Option<Vec<i64>>>),
    DoubleVectorList(Vec<Option<Vec<f64>>>),
}

impl FieldValue {
    /// Parse `text` as the given shape.
    pub fn parse(text: &str, field_type: FieldType) -> Result<Self> {
        let text = text.trim();
        match field_type {
            FieldType::Int => Ok(Self::Int(parse_int(text)?)),
            FieldType::Double => Ok(Self::Double(parse_double(text)?)),
            FieldType::String => Ok(Self::String(text.to_string())),
            FieldType::IntList => Ok(Self::IntList(parse_int_list(text)?)),
            FieldType::DoubleList => Ok(Self::DoubleList(parse_double_list(text)?)),
            FieldType::StringList => Ok(Self::StringList(
                text.split_whitespace().map(str::to_string).collect(),
            )),
            FieldType::QuotedStringList => {
                Ok(Self::QuotedStringList(parse_quoted_string_list(text)?))
            }
            FieldType::IntVector => Ok(Self::IntVector(parse_int_vector(text)?)),
            FieldType::DoubleVector => Ok(Self::DoubleVector(parse_double_vector(text)?)),
            FieldType::IntMatrix => Ok(Self::IntMatrix(parse_int_matrix(text)?)),
            FieldType::DoubleMatrix => Ok(Self::DoubleMatrix(parse_optional_matrix(text)?)),
            FieldType::IntVectorList => Ok(Self::IntVectorList(parse_int_vector_list(text)?)),
            FieldType::DoubleVectorList => {
                Ok(Self::DoubleVectorList(parse_double_vector_list(text)?))
            }
        }
    }

    /// Format the value back to its header text representation.
    pub fn format(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Double(v) => format_double(*v),
            Self::String(s) => s.clone(),
            Self::IntList(v) => join(v.iter().map(|x| x.to_string())),
            Self::DoubleList(v) => join(v.iter().map(|x| format_double(*x))),
            Self::StringList(v) => v.join(" "),
            Self::QuotedStringList(v) => join(v.iter().map(|s| format!("\"{s}\""))),
            Self::IntVector(v) => format_int_vector(v),
            Self::DoubleVector(v) => format_double_vector(v),
            Self::IntMatrix(m) => join(m.iter().map(|row| format_int_vector(row))),
            Self::DoubleMatrix(m) => join(m.iter().map(|row| format_optional_row(row))),
            Self::IntVectorList(rows) => join(rows.iter().map(|row| match row {
                Some(v) => format_int_vector(v),
                None => "none".to_string(),
            })),
            Self::DoubleVectorList(rows) => join(rows.iter().map(|row| match row {
                Some(v) => format_double_vector(v),
                None => "none".to_string(),
            })),
        }
    }

    /// The string payload, if this value is a plain string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this value is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer-list payload, if this value is an integer list.
    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Self::IntList(v) => Some(v),
            _ => None,
        }
    }
}

/// Resolve a (lowercased) field name to its value shape.
///
/// Standard fields use the fixed registry; `space directions` honours the
/// configured shape; everything else falls back to the custom field map and
/// finally to a plain string.
pub(crate) fn field_type_of(
    field: &str,
    space_directions: SpaceDirectionsKind,
    custom_field_map: Option<&FieldMap>,
) -> FieldType {
    match field {
        "dimension" | "lineskip" | "line skip" | "byteskip" | "byte skip" | "space dimension"
        | "block size" | "blocksize" => FieldType::Int,
        "min" | "max" | "oldmin" | "old min" | "oldmax" | "old max" => FieldType::Double,
        "endian" | "encoding" | "content" | "sample units" | "datafile" | "data file"
        | "space" | "type" => FieldType::String,
        "sizes" => FieldType::IntList,
        "spacings" | "thicknesses" | "axismins" | "axis mins" | "axismaxs" | "axis maxs" => {
            FieldType::DoubleList
        }
        "kinds" | "centerings" => FieldType::StringList,
        "labels" | "units" | "space units" => FieldType::QuotedStringList,
        "space origin" => FieldType::DoubleVector,
        "measurement frame" => FieldType::DoubleMatrix,
        "space directions" => match space_directions {
            SpaceDirectionsKind::Matrix => FieldType::DoubleMatrix,
            SpaceDirectionsKind::VectorList => FieldType::DoubleVectorList,
        },
        _ => custom_field_map
            .and_then(|map| map.get(field).copied())
            .unwrap_or(FieldType::String),
    }
}

/// True if `field` belongs to the standard registry.
pub(crate) fn is_standard_field(field: &str) -> bool {
    crate::header::FIELD_ORDER.contains(&field)
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn parse_int(text: &str) -> Result<i64> {
    text.parse::<i64>()
        .map_err(|_| Error::TypeMismatch(format!("Invalid int value: {text}")))
}

fn parse_double(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| Error::TypeMismatch(format!("Invalid double value: {text}")))
}

fn parse_double_list(text: &str) -> Result<Vec<f64>> {
    text.split_whitespace().map(parse_double).collect()
}

// List and vector elements are parsed as doubles first and truncated, so
// tokens like `3.0` are accepted where an integer is expected.
fn parse_int_list(text: &str) -> Result<Vec<i64>> {
    parse_double_list(text).map(|v| v.into_iter().map(|x| x as i64).collect())
}

fn parse_double_vector(text: &str) -> Result<Vec<f64>> {
    if !text.starts_with('(') || !text.ends_with(')') {
        return Err(Error::TypeMismatch(
            "Vector should be enclosed by parentheses.".to_string(),
        ));
    }
    text[1..text.len() - 1]
        .split(',')
        .map(|part| parse_double(part.trim()))
        .collect()
}

fn parse_int_vector(text: &str) -> Result<Vec<i64>> {
    parse_double_vector(text).map(|v| v.into_iter().map(|x| x as i64).collect())
}

/// Split matrix text into row tokens. Rows never contain whitespace on
/// parse input beyond the separators, so whitespace splitting is enough.
fn matrix_rows(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

fn check_uniform_width<T>(rows: &[Vec<T>]) -> Result<()> {
    if rows.windows(2).any(|w| w[0].len() != w[1].len()) {
        return Err(Error::TypeMismatch(
            "Matrix should have same number of elements in each row".to_string(),
        ));
    }
    Ok(())
}

fn parse_int_matrix(text: &str) -> Result<Vec<Vec<i64>>> {
    let rows = matrix_rows(text)
        .map(parse_int_vector)
        .collect::<Result<Vec<_>>>()?;
    check_uniform_width(&rows)?;
    Ok(rows)
}

/// Parse a double matrix where a row may be the literal `none`; such rows
/// become all-NaN rows of the common width.
fn parse_optional_matrix(text: &str) -> Result<Vec<Vec<f64>>> {
    let rows = parse_double_vector_list(text)?;
    let mut width = None;
    for row in rows.iter().flatten() {
        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => {
                return Err(Error::TypeMismatch(
                    "Matrix should have same number of elements in each row".to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    let width = width.ok_or_else(|| {
        Error::TypeMismatch("Matrix must contain at least one non-none row".to_string())
    })?;
    Ok(rows
        .into_iter()
        .map(|row| row.unwrap_or_else(|| vec![f64::NAN; width]))
        .collect())
}

fn parse_double_vector_list(text: &str) -> Result<Vec<Option<Vec<f64>>>> {
    matrix_rows(text)
        .map(|row| {
            if row == "none" {
                Ok(None)
            } else {
                parse_double_vector(row).map(Some)
            }
        })
        .collect()
}

fn parse_int_vector_list(text: &str) -> Result<Vec<Option<Vec<i64>>>> {
    matrix_rows(text)
        .map(|row| {
            if row == "none" {
                Ok(None)
            } else {
                parse_int_vector(row).map(Some)
            }
        })
        .collect()
}

/// Quoted string lists accept both quoted and bare tokens on read; files in
/// the wild predate the quoting convention.
fn parse_quoted_string_list(text: &str) -> Result<Vec<String>> {
    if !text.contains('"') {
        return Ok(text.split_whitespace().map(str::to_string).collect());
    }

    let mut items = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('"') {
        let tail = &rest[start + 1..];
        let end = tail.find('"').ok_or_else(|| {
            Error::TypeMismatch(format!("Unterminated quote in string list: {text}"))
        })?;
        items.push(tail[..end].to_string());
        rest = &tail[end + 1..];
    }
    Ok(items)
}

/// Format a double with Rust's shortest round-trip representation.
///
/// Re-parsing the output always yields the original value, which is the
/// property header round trips rely on.
pub(crate) fn format_double(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        value.to_string()
    }
}

fn format_int_vector(v: &[i64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
    format!("({})", parts.join(","))
}

fn format_double_vector(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format_double(*x)).collect();
    format!("({})", parts.join(","))
}

/// A matrix row whose entries are all NaN is written as `none`.
fn format_optional_row(row: &[f64]) -> String {
    if !row.is_empty() && row.iter().all(|x| x.is_nan()) {
        "none".to_string()
    } else {
        format_double_vector(row)
    }
}
