//! Reading and writing NRRD (Nearly Raw Raster Data) files.
//!
//! NRRD is a self-describing container for N-dimensional numeric arrays: an
//! ASCII header followed by a payload that may live in the same file or in
//! one or more sibling data files. This crate maps between on-disk NRRD
//! containers and [`ndarray`]-backed buffers with a typed header.
//!
//! # Example
//!
//! ```no_run
//! use nrrd::{read, write, NrrdHeader, ReadOptions, WriteOptions};
//! use ndarray::ArrayD;
//!
//! let volume = ArrayD::<f32>::zeros(ndarray::IxDyn(&[64, 64, 64]));
//! write(
//!     "volume.nrrd",
//!     &volume.into(),
//!     &NrrdHeader::new(),
//!     &WriteOptions::default(),
//! )?;
//!
//! let (data, header) = read("volume.nrrd", &ReadOptions::default())?;
//! assert_eq!(data.shape(), &[64, 64, 64]);
//! assert_eq!(header.encoding()?, nrrd::Encoding::Gzip);
//! # Ok::<(), nrrd::Error>(())
//! ```
//!
//! Headers list axes fastest-varying first; [`IndexOrder`] selects whether
//! buffers follow that convention (`Fortran`, the default) or reverse it
//! (`C`).

use std::sync::RwLock;

mod data;
mod encoding;
mod error;
mod field;
mod header;
mod io;

pub use data::{IndexOrder, NrrdArray};
pub use error::{Error, Result};
pub use field::{FieldMap, FieldType, FieldValue};
pub use header::{Encoding, Endianness, NrrdHeader, ScalarType, DEFAULT_VERSION, MAX_VERSION};
pub use io::{read, read_data, read_header, read_header_file, write, ReadOptions, WriteOptions};

/// Parse shape of the `space directions` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpaceDirectionsKind {
    /// Double matrix; `none` rows decode to rows of NaNs.
    #[default]
    Matrix,
    /// Double vector list; `none` rows decode to explicit null entries.
    VectorList,
}

/// Process-level configuration toggles.
///
/// These are threaded through [`ReadOptions`]; the global mirror set by
/// [`set_allow_duplicate_field`] and [`set_space_directions_kind`] only
/// seeds `ReadOptions::default()`. Set the globals before spawning
/// concurrent reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NrrdConfig {
    /// Downgrade repeated standard fields to a warning, keeping the first
    /// occurrence. Defaults to false (duplicates are fatal).
    pub allow_duplicate_field: bool,
    /// Shape used for the `space directions` field.
    pub space_directions: SpaceDirectionsKind,
}

static GLOBAL_CONFIG: RwLock<NrrdConfig> = RwLock::new(NrrdConfig {
    allow_duplicate_field: false,
    space_directions: SpaceDirectionsKind::Matrix,
});

impl NrrdConfig {
    /// Snapshot of the process-level configuration.
    pub fn global() -> Self {
        GLOBAL_CONFIG.read().map(|config| *config).unwrap_or_default()
    }
}

/// Set the process-level duplicate-field toggle.
pub fn set_allow_duplicate_field(allow: bool) {
    if let Ok(mut config) = GLOBAL_CONFIG.write() {
        config.allow_duplicate_field = allow;
    }
}

/// Set the process-level `space directions` shape.
pub fn set_space_directions_kind(kind: SpaceDirectionsKind) {
    if let Ok(mut config) = GLOBAL_CONFIG.write() {
        config.space_directions = kind;
    }
}
