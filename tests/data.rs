//! Column store operations, bucketization laws and file ingestion.

use std::fs;
use std::sync::Arc;

use ndarray::array;
use proptest::prelude::*;

use gbforest::data::{BucketizedFloatColumn, Column, ColumnKind, DataStore, MISSING_BUCKET, MISSING_CATEGORY};
use gbforest::io::scores::score_file_path;
use gbforest::io::{checkpoints_from_interval, load_columns, write_checkpoint_scores};
use gbforest::Error;

fn store() -> DataStore {
    let mut store = DataStore::new();
    store
        .add_bucketized_float_column("age", &[30.0, f64::NAN, 50.0, 20.0], 256)
        .unwrap();
    store.add_raw_float_column("w", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    store.add_string_column("city", ["a", "", "b", "a"]).unwrap();
    store
}

#[test]
fn add_column_rules() {
    let mut s = store();
    assert!(matches!(
        s.add_raw_float_column("city", vec![0.0; 4]),
        Err(Error::TypeMismatch {
            expected: ColumnKind::String,
            found: ColumnKind::RawFloat,
            ..
        })
    ));
    assert!(matches!(
        s.add_raw_float_column("short", vec![0.0; 3]),
        Err(Error::Validation(_))
    ));
    assert!(matches!(s.column("nope"), Err(Error::NotFound(_))));
    // Replacing with the same kind is allowed.
    s.add_raw_float_column("w", vec![0.0; 4]).unwrap();
    assert_eq!(s.raw_float_column("w").unwrap().values(), &[0.0; 4]);
    assert_eq!(s.column_names().collect::<Vec<_>>(), vec!["age", "w", "city"]);
}

#[test]
fn replacing_only_column_resets_row_count() {
    let mut s = DataStore::new();
    s.add_raw_float_column("x", vec![1.0, 2.0, 3.0]).unwrap();
    s.add_raw_float_column("x", vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    assert_eq!(s.n_rows(), 5);
    s.add_raw_float_column("y", vec![0.0; 5]).unwrap();
    assert!(matches!(
        s.add_raw_float_column("z", vec![0.0; 3]),
        Err(Error::Validation(_))
    ));
    // With two columns, the length is fixed again.
    assert!(matches!(
        s.add_raw_float_column("x", vec![0.0; 3]),
        Err(Error::Validation(_))
    ));
    assert_eq!(s.n_rows(), 5);
}

#[test]
fn erase_and_merge() {
    let mut s = store();
    let removed = s.erase("w").unwrap();
    assert_eq!(removed.kind(), ColumnKind::RawFloat);
    assert_eq!(s.n_columns(), 2);
    assert!(matches!(s.erase("w"), Err(Error::NotFound(_))));

    let mut other = DataStore::new();
    other.add_raw_float_column("extra", vec![9.0; 4]).unwrap();
    s.merge(other).unwrap();
    assert_eq!(s.n_columns(), 3);

    let mut wrong_rows = DataStore::new();
    wrong_rows.add_raw_float_column("z", vec![1.0]).unwrap();
    assert!(matches!(s.merge(wrong_rows), Err(Error::Validation(_))));
}

#[test]
fn slice_keeps_boundaries_and_dictionaries() {
    let s = store();
    let sliced = s.slice(&[3, 1, 3]).unwrap();
    assert_eq!(sliced.n_rows(), 3);

    let full_age = s.bucketized_float_column("age").unwrap();
    let age = sliced.bucketized_float_column("age").unwrap();
    assert!(Arc::ptr_eq(age.boundaries(), full_age.boundaries()));
    assert_eq!(age.bucket(0), full_age.bucket(3));
    assert_eq!(age.bucket(1), MISSING_BUCKET);

    let city = sliced.string_column("city").unwrap();
    assert!(Arc::ptr_eq(city.dictionary(), s.string_column("city").unwrap().dictionary()));
    assert_eq!(city.value(0), "a");
    assert_eq!(city.value(1), MISSING_CATEGORY);

    assert!(matches!(s.slice(&[4]), Err(Error::Validation(_))));
}

proptest! {
    #[test]
    fn buckets_are_monotone(
        values in prop::collection::vec(-1e6f64..1e6, 1..300),
        num_buckets in 2usize..64,
    ) {
        let column = BucketizedFloatColumn::from_values(&values, num_buckets);
        let bounds = column.boundaries();
        prop_assert!(column.n_buckets() <= num_buckets.max(3));
        for (i, &a) in values.iter().enumerate() {
            let ba = column.bucket(i);
            prop_assert_ne!(ba, MISSING_BUCKET);
            prop_assert!(a <= bounds.bucket_max(ba));
            prop_assert!(a >= bounds.bucket_min(ba));
            for (j, &b) in values.iter().enumerate() {
                if a < b {
                    prop_assert!(ba <= column.bucket(j));
                }
            }
        }
    }

    #[test]
    fn missing_values_use_the_reserved_bucket(n in 1usize..50) {
        let mut values = vec![1.0; n];
        values.push(f64::NAN);
        let column = BucketizedFloatColumn::from_values(&values, 16);
        prop_assert_eq!(column.bucket(n), MISSING_BUCKET);
        prop_assert!(column.decode(n).is_nan());
    }
}

#[test]
fn flat_files_load_from_the_first_directory_holding_them() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(first.path().join("x"), "1\n2\n3\n").unwrap();
    fs::write(second.path().join("x"), "7\n8\n9\n").unwrap();
    fs::write(second.path().join("city"), "# dtype=strings\nparis\n\nrome\n").unwrap();
    fs::write(second.path().join("b"), "# dtype=binned_floats\n# scaled\n0.5\nNaN\n1.5\n").unwrap();

    let dirs = [first.path(), second.path()];
    let store = load_columns(&dirs, &["x", "city", "b"], 256).unwrap();
    assert_eq!(store.n_rows(), 3);
    assert_eq!(store.raw_float_column("x").unwrap().values(), &[1.0, 2.0, 3.0]);
    assert_eq!(store.string_column("city").unwrap().value(1), MISSING_CATEGORY);
    let b = store.bucketized_float_column("b").unwrap();
    assert_eq!(b.bucket(1), MISSING_BUCKET);
    assert!(b.bucket(0) < b.bucket(2));

    assert!(matches!(
        load_columns(&dirs, &["absent"], 256),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn mismatched_flat_file_lengths_fail() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a"), "1\n2\n").unwrap();
    fs::write(dir.path().join("b"), "1\n").unwrap();
    assert!(matches!(
        load_columns(&[dir.path()], &["a", "b"], 256),
        Err(Error::Validation(_))
    ));
}

#[test]
fn checkpoint_score_files() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoints = checkpoints_from_interval(5, 2);
    assert_eq!(checkpoints, vec![1, 3, 5]);
    let scores = array![[0.5, -1.0], [0.25, 2.0], [1e-3, 0.0]];
    let written = write_checkpoint_scores(dir.path(), "model", &checkpoints, &scores).unwrap();
    assert_eq!(written.len(), 3);
    assert_eq!(written[1], score_file_path(dir.path(), "model", 3));
    assert_eq!(fs::read_to_string(&written[0]).unwrap(), "0.5\n-1\n");
    let last: Vec<f64> = fs::read_to_string(&written[2])
        .unwrap()
        .lines()
        .map(|l| l.parse().unwrap())
        .collect();
    assert_eq!(last, vec![1e-3, 0.0]);
}

#[test]
fn column_enum_reports_kinds() {
    let s = store();
    let kinds: Vec<ColumnKind> = s.iter().map(|(_, c)| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![ColumnKind::BucketizedFloat, ColumnKind::RawFloat, ColumnKind::String]
    );
    assert!(matches!(s.column("w").unwrap(), Column::RawFloat(_)));
}
