//! One-column-per-file ingestion.
//!
//! A flat file holds one value per line. An optional first line picks the
//! column kind:
//!
//! ```text
//! # dtype=raw_floats      (default when absent)
//! # dtype=binned_floats
//! # dtype=strings
//! ```
//!
//! Other lines starting with `#` are comments. Float lines that do not parse
//! become NaN; empty string lines become the missing category.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::data::{BucketizedFloatColumn, Column, DataStore, RawFloatColumn, StringColumn};
use crate::error::{Error, Result};

const DTYPE_PREFIX: &str = "# dtype=";

/// Column kind named by a flat file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatfileDtype {
    RawFloats,
    BinnedFloats,
    Strings,
}

impl FlatfileDtype {
    /// Parse the value after `# dtype=`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim() {
            "raw_floats" => Ok(Self::RawFloats),
            "binned_floats" => Ok(Self::BinnedFloats),
            "strings" => Ok(Self::Strings),
            other => Err(Error::validation(format!("unknown flat file dtype '{other}'"))),
        }
    }
}

/// Read one column from `reader`.
///
/// `num_buckets` is used for `binned_floats` columns.
///
/// # Example
///
/// ```
/// use gbforest::data::Column;
/// use gbforest::io::flatfile::read_column;
///
/// let text = "# dtype=strings\nred\n\nblue\n";
/// let column = read_column(text.as_bytes(), 256).unwrap();
/// match column {
///     Column::String(c) => assert_eq!(c.value(1), "__missing__"),
///     _ => unreachable!(),
/// }
/// ```
pub fn read_column<R: BufRead>(reader: R, num_buckets: usize) -> Result<Column> {
    let mut dtype = FlatfileDtype::RawFloats;
    let mut values: Vec<String> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if index == 0 {
            if let Some(name) = line.strip_prefix(DTYPE_PREFIX) {
                dtype = FlatfileDtype::parse(name)?;
                continue;
            }
        }
        if line.starts_with('#') {
            continue;
        }
        values.push(line.to_string());
    }

    let column = match dtype {
        FlatfileDtype::Strings => Column::from(StringColumn::from_strs(&values)),
        FlatfileDtype::RawFloats => Column::from(RawFloatColumn::new(parse_floats(&values))),
        FlatfileDtype::BinnedFloats => {
            Column::from(BucketizedFloatColumn::from_values(&parse_floats(&values), num_buckets))
        }
    };
    Ok(column)
}

fn parse_floats(values: &[String]) -> Vec<f64> {
    values
        .iter()
        .map(|v| v.trim().parse::<f64>().unwrap_or(f64::NAN))
        .collect()
}

/// Path of the first `dir/name` that exists.
pub fn find_flatfile<P: AsRef<Path>>(dirs: &[P], name: &str) -> Option<PathBuf> {
    dirs.iter().map(|dir| dir.as_ref().join(name)).find(|path| path.is_file())
}

/// Build a store with one column per name, each read from the first
/// directory holding a file of that name.
///
/// # Errors
///
/// - [`Error::NotFound`] if no directory has the file.
/// - [`Error::Validation`] for an unknown dtype or mismatched row counts.
pub fn load_columns<P, S>(dirs: &[P], names: &[S], num_buckets: usize) -> Result<DataStore>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let mut store = DataStore::new();
    for name in names {
        let name = name.as_ref();
        if store.contains(name) {
            continue;
        }
        let path = find_flatfile(dirs, name).ok_or_else(|| {
            let searched: Vec<String> = dirs.iter().map(|d| d.as_ref().display().to_string()).collect();
            Error::NotFound(format!("{name} in {}", searched.join(",")))
        })?;
        let column = read_column(BufReader::new(File::open(&path)?), num_buckets)?;
        log::debug!("loaded {} rows of '{name}' from {}", column.len(), path.display());
        store.add_column(name, column)?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dtype_is_raw_floats() {
        let column = read_column("1.5\nabc\n# note\n-2\n".as_bytes(), 256).unwrap();
        match column {
            Column::RawFloat(c) => {
                assert_eq!(c.len(), 3);
                assert_eq!(c.get(0), 1.5);
                assert!(c.get(1).is_nan());
                assert_eq!(c.get(2), -2.0);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_binned_floats() {
        let column = read_column("# dtype=binned_floats\r\n3\r\n1\r\n2\r\n".as_bytes(), 256).unwrap();
        match column {
            Column::BucketizedFloat(c) => {
                assert_eq!(c.len(), 3);
                assert!(c.bucket(1) < c.bucket(2) && c.bucket(2) < c.bucket(0));
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_unknown_dtype() {
        assert!(matches!(
            read_column("# dtype=ints\n1\n".as_bytes(), 256),
            Err(Error::Validation(_))
        ));
    }
}
