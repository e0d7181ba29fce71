//! Span tables for multi-column list partitionings.
//!
//! `t(a INT, b STRING, PRIMARY KEY (a, b)) PARTITION BY LIST (a, b)` with
//! tuples fixing two, one and zero columns.

use zonal_catalog::{
    ColumnDescriptor, ColumnType, Datum, Direction, IndexColumn, IndexDescriptor, KeyEncoder,
    ListPartition, OrderedKeyEncoder, PartitionValue, Partitioning, TableDescriptor, prefix_end,
};
use zonal_core::{Subzone, SubzoneTable, ZoneConfig};
use zonal_placement::{SubzoneSpan, generate_subzone_spans, lookup};

fn column(name: &str, column_type: ColumnType) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        column_type,
        nullable: false,
    }
}

fn partition(name: &str, values: Vec<Vec<PartitionValue>>) -> ListPartition {
    ListPartition {
        name: name.to_string(),
        values,
        subpartitioning: Partitioning::default(),
    }
}

fn table() -> TableDescriptor {
    TableDescriptor {
        id: 60,
        parent_id: 50,
        name: "t".to_string(),
        columns: vec![column("a", ColumnType::Int), column("b", ColumnType::String)],
        indexes: vec![IndexDescriptor {
            id: 1,
            name: "t_pkey".to_string(),
            key_columns: vec![
                IndexColumn {
                    column: "a".to_string(),
                    direction: Direction::Asc,
                },
                IndexColumn {
                    column: "b".to_string(),
                    direction: Direction::Asc,
                },
            ],
            partitioning: Partitioning {
                num_columns: 2,
                list: vec![
                    partition(
                        "exact",
                        vec![vec![PartitionValue::int(1), PartitionValue::string("x")]],
                    ),
                    partition(
                        "one",
                        vec![vec![PartitionValue::int(1), PartitionValue::Default]],
                    ),
                    partition(
                        "rest",
                        vec![vec![PartitionValue::Default, PartitionValue::Default]],
                    ),
                ],
                range: Vec::new(),
            },
            temporary: false,
            temporary_for: None,
        }],
        adding_indexes: Vec::new(),
    }
}

fn row_key(a: i64, b: &str) -> Vec<u8> {
    let table = table();
    let mut key = OrderedKeyEncoder.index_prefix(60, 1);
    OrderedKeyEncoder
        .encode_datum(&mut key, &Datum::Int(a), &table.columns[0], Direction::Asc)
        .unwrap();
    OrderedKeyEncoder
        .encode_datum(&mut key, &Datum::String(b.to_string()), &table.columns[1], Direction::Asc)
        .unwrap();
    key
}

fn all_subzones() -> SubzoneTable {
    let mut subzones = SubzoneTable::new(60);
    subzones.set(Subzone::for_partition(1, "rest", ZoneConfig::new().with_gc_ttl(1)));
    subzones.set(Subzone::for_partition(1, "one", ZoneConfig::new().with_gc_ttl(2)));
    subzones.set(Subzone::for_partition(1, "exact", ZoneConfig::new().with_gc_ttl(3)));
    subzones
}

fn tag_at(spans: &[SubzoneSpan], key: &[u8]) -> Option<usize> {
    lookup(spans, key).and_then(|s| s.subzone_index)
}

#[test]
fn more_specific_tuples_win() {
    let table = table();
    let spans = generate_subzone_spans(&OrderedKeyEncoder, &table, &all_subzones(), false).unwrap();

    // Positions: rest = 0, one = 1, exact = 2.
    assert_eq!(tag_at(&spans, &row_key(1, "x")), Some(2));
    assert_eq!(tag_at(&spans, &row_key(1, "y")), Some(1));
    assert_eq!(tag_at(&spans, &row_key(1, "a")), Some(1));
    assert_eq!(tag_at(&spans, &row_key(2, "x")), Some(0));
    assert_eq!(tag_at(&spans, &row_key(0, "x")), Some(0));

    let tags: Vec<Option<usize>> = spans.iter().map(|s| s.subzone_index).collect();
    assert_eq!(
        tags,
        vec![None, Some(0), Some(1), Some(2), Some(1), Some(0), None]
    );
}

#[test]
fn spans_tile_table_without_gaps() {
    let table = table();
    let spans = generate_subzone_spans(&OrderedKeyEncoder, &table, &all_subzones(), false).unwrap();

    let table_start = OrderedKeyEncoder.table_prefix(60);
    assert_eq!(spans[0].key, table_start);
    assert_eq!(spans[spans.len() - 1].end(), prefix_end(&table_start));
    for pair in spans.windows(2) {
        assert_eq!(pair[0].end(), pair[1].key);
    }
    for span in &spans {
        if let Some(end) = &span.end_key {
            assert_ne!(*end, prefix_end(&span.key), "explicit end equal to successor");
        }
    }
}

#[test]
fn dropping_the_middle_subzone_leaves_its_keys_untagged() {
    let table = table();
    let mut subzones = all_subzones();
    subzones.remove(1, "one");
    let spans = generate_subzone_spans(&OrderedKeyEncoder, &table, &subzones, false).unwrap();

    // Positions after removal: rest = 0, exact = 1. Keys of "one" fall
    // through to the table rather than to the less specific "rest".
    assert_eq!(tag_at(&spans, &row_key(1, "x")), Some(1));
    assert_eq!(tag_at(&spans, &row_key(1, "y")), None);
    assert_eq!(tag_at(&spans, &row_key(2, "x")), Some(0));
    let tags: Vec<Option<usize>> = spans.iter().map(|s| s.subzone_index).collect();
    assert_eq!(
        tags,
        vec![None, Some(0), None, Some(1), None, Some(0), None]
    );
}

#[test]
fn index_subzone_fills_unconfigured_tuples_ahead_of_default() {
    let table = table();
    let mut subzones = SubzoneTable::new(60);
    subzones.set(Subzone::for_index(1, ZoneConfig::new().with_gc_ttl(5)));
    subzones.set(Subzone::for_partition(1, "rest", ZoneConfig::new().with_gc_ttl(1)));
    let spans = generate_subzone_spans(&OrderedKeyEncoder, &table, &subzones, false).unwrap();

    // Positions: index = 0, rest = 1.
    assert_eq!(tag_at(&spans, &row_key(1, "x")), Some(0));
    assert_eq!(tag_at(&spans, &row_key(1, "y")), Some(0));
    assert_eq!(tag_at(&spans, &row_key(2, "x")), Some(1));
}
