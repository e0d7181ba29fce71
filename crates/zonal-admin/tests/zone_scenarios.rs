//! Inheritance and override scenarios over a partitioned table.
//!
//! `d.t(c STRING PRIMARY KEY) PARTITION BY LIST (c)` with `p0 VALUES IN
//! ('a')` and `p1 VALUES IN (DEFAULT)`, next to an unpartitioned
//! `system.jobs`.

use zonal_admin::{ZoneAdmin, ZoneUpdate};
use zonal_catalog::{Catalog, KeyEncoder, OrderedKeyEncoder, ResolvedTarget, TargetSpec};
use zonal_core::{ErrorKind, ZoneConfig, ZoneLocator};
use zonal_placement::lookup;
use zonal_state::ZoneStore;

const CATALOG: &str = r#"{
    "databases": [
        {"id": 1, "name": "system"},
        {"id": 50, "name": "d"}
    ],
    "tables": [
        {
            "id": 15, "parent_id": 1, "name": "jobs",
            "columns": [{"name": "id", "column_type": "int", "nullable": false}],
            "indexes": [{"id": 1, "name": "jobs_pkey", "key_columns": [{"column": "id"}]}]
        },
        {
            "id": 52, "parent_id": 50, "name": "t",
            "columns": [{"name": "c", "column_type": "string", "nullable": false}],
            "indexes": [{
                "id": 1, "name": "t_pkey",
                "key_columns": [{"column": "c"}],
                "partitioning": {
                    "num_columns": 1,
                    "list": [
                        {"name": "p0", "values": [[{"value": "a"}]]},
                        {"name": "p1", "values": [["default"]]}
                    ]
                }
            }]
        }
    ]
}"#;

const DATABASE: &str = "DATABASE d";
const TABLE: &str = "TABLE t";
const INDEX: &str = "INDEX t@t_pkey";
const P0: &str = "PARTITION p0 OF INDEX t@t_pkey";
const P1: &str = "PARTITION p1 OF INDEX t@t_pkey";

fn catalog() -> Catalog {
    Catalog::from_json(CATALOG).unwrap()
}

fn admin() -> ZoneAdmin {
    let admin = ZoneAdmin::new(ZoneStore::open_in_memory().unwrap(), ZoneConfig::default_zone());
    admin.bootstrap().unwrap();
    admin
}

fn target(s: &str) -> TargetSpec {
    s.parse().unwrap()
}

fn gc(ttl: i32) -> ZoneUpdate {
    ZoneUpdate::SetFields(ZoneConfig::new().with_gc_ttl(ttl))
}

fn ttl(admin: &ZoneAdmin, catalog: &Catalog, s: &str) -> i32 {
    let res = admin.show(catalog, Some("d"), &target(s)).unwrap();
    res.config.gc.unwrap().ttl_seconds
}

fn ttls(admin: &ZoneAdmin, catalog: &Catalog) -> [i32; 5] {
    [DATABASE, TABLE, INDEX, P0, P1].map(|s| ttl(admin, catalog, s))
}

fn set(admin: &ZoneAdmin, catalog: &Catalog, s: &str, ttl: i32) {
    admin.configure(catalog, Some("d"), &target(s), &gc(ttl)).unwrap();
}

fn discard(admin: &ZoneAdmin, catalog: &Catalog, s: &str) {
    admin.discard(catalog, Some("d"), &target(s)).unwrap();
}

const DEFAULT_TTL: i32 = 4 * 60 * 60;

// ── Individual scenarios ───────────────────────────────────────────

#[test]
fn unconfigured_partition_matches_default() {
    let admin = admin();
    let catalog = catalog();
    let partition = admin.show(&catalog, Some("d"), &target(P0)).unwrap();
    let default = admin.show(&catalog, Some("d"), &TargetSpec::Default).unwrap();
    assert_eq!(partition.config, default.config);
    assert_eq!(partition.supplied_by, ResolvedTarget::Default);
}

#[test]
fn database_override_reaches_table_not_default() {
    let admin = admin();
    let catalog = catalog();
    set(&admin, &catalog, DATABASE, 42);

    let table = admin.show(&catalog, Some("d"), &target(TABLE)).unwrap();
    assert_eq!(table.config.gc.unwrap().ttl_seconds, 42);
    assert_eq!(table.supplied_by, ResolvedTarget::Database { database_id: 50 });
    assert_eq!(ttl(&admin, &catalog, "RANGE default"), DEFAULT_TTL);
}

#[test]
fn partition_override_yields_one_exact_prefix_span() {
    let admin = admin();
    let catalog = catalog();
    let outcome = admin
        .configure(&catalog, Some("d"), &target("PARTITION p0 OF TABLE t"), &gc(42))
        .unwrap();

    let spans = outcome.spans.unwrap();
    let tagged: Vec<_> = spans.iter().filter(|s| s.subzone_index.is_some()).collect();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].subzone_index, Some(0));
    assert_eq!(tagged[0].end_key, None);

    let mut a = OrderedKeyEncoder.index_prefix(52, 1);
    a.extend_from_slice(&[0x30, b'a', 0x00, 0x01]);
    assert_eq!(tagged[0].key, a);
    assert!(spans.iter().filter(|s| s.subzone_index.is_none()).count() >= 1);
    assert_eq!(admin.spans(&catalog, Some("d"), &target(TABLE)).unwrap(), spans);
}

#[test]
fn default_partition_override_leaves_sibling_keys_alone() {
    let admin = admin();
    let catalog = catalog();
    set(&admin, &catalog, P1, 9);

    let spans = admin.spans(&catalog, Some("d"), &target(TABLE)).unwrap();
    let mut a = OrderedKeyEncoder.index_prefix(52, 1);
    a.extend_from_slice(&[0x30, b'a', 0x00, 0x01]);
    let mut b = OrderedKeyEncoder.index_prefix(52, 1);
    b.extend_from_slice(&[0x30, b'b', 0x00, 0x01]);

    assert_eq!(lookup(&spans, &a).and_then(|s| s.subzone_index), None);
    assert_eq!(lookup(&spans, &b).and_then(|s| s.subzone_index), Some(0));
    assert_eq!(ttl(&admin, &catalog, P0), DEFAULT_TTL);
    assert_eq!(ttl(&admin, &catalog, P1), 9);
}

#[test]
fn partition_min_above_inherited_max_is_rejected() {
    let admin = admin();
    let catalog = catalog();
    let raise_min = ZoneUpdate::SetFields(ZoneConfig {
        range_min_bytes: Some(1 << 30),
        ..ZoneConfig::new()
    });

    let err = admin
        .configure(&catalog, Some("d"), &target(P0), &raise_min)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    assert!(err.to_string().contains("range_min_bytes"), "{err}");
    assert_eq!(admin.show_all().unwrap().len(), 1);
    let p0 = admin.show(&catalog, Some("d"), &target(P0)).unwrap();
    assert_eq!(p0.config, ZoneConfig::default_zone());
}

#[test]
fn removing_database_override_keeps_table_override() {
    let admin = admin();
    let catalog = catalog();
    set(&admin, &catalog, DATABASE, 100);
    set(&admin, &catalog, TABLE, 200);
    discard(&admin, &catalog, DATABASE);

    assert_eq!(ttl(&admin, &catalog, DATABASE), DEFAULT_TTL);
    assert_eq!(ttl(&admin, &catalog, TABLE), 200);
}

#[test]
fn missing_targets_report_literal_identifiers() {
    let admin = admin();
    let catalog = catalog();

    let err = admin
        .show(&catalog, Some("d"), &target("INDEX foo"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains(r#"index "foo" does not exist"#), "{err}");

    let err = admin
        .configure(
            &catalog,
            Some("d"),
            &target("PARTITION p0 OF TABLE system.jobs"),
            &gc(42),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains(r#"partition "p0" does not exist"#), "{err}");
}

#[test]
fn shorthand_index_uses_session_database() {
    let admin = admin();
    let catalog = catalog();

    admin
        .configure(&catalog, Some("d"), &target(r#"INDEX "t_pkey""#), &gc(7))
        .unwrap();
    assert_eq!(ttl(&admin, &catalog, INDEX), 7);

    let err = admin
        .show(&catalog, Some("system"), &target(r#"INDEX "t_pkey""#))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let qualified = admin
        .show(&catalog, None, &target("INDEX d.t@t_pkey"))
        .unwrap();
    assert_eq!(qualified.config.gc.unwrap().ttl_seconds, 7);
}

#[test]
fn subzones_exist_without_table_zone() {
    let admin = admin();
    let catalog = catalog();
    set(&admin, &catalog, P1, 9);

    let all = admin.show_all().unwrap();
    let locators: Vec<ZoneLocator> = all.iter().map(|z| z.locator.clone()).collect();
    assert_eq!(
        locators,
        vec![ZoneLocator::root(), ZoneLocator::partition(52, 1, "p1")]
    );
    assert_eq!(ttl(&admin, &catalog, P1), 9);
    assert_eq!(ttl(&admin, &catalog, TABLE), DEFAULT_TTL);
}

#[test]
fn replace_and_use_default_rewrite_only_the_target() {
    let admin = admin();
    let catalog = catalog();
    admin
        .configure(
            &catalog,
            Some("d"),
            &target(TABLE),
            &ZoneUpdate::Replace(ZoneConfig::new().with_num_replicas(5).with_gc_ttl(1)),
        )
        .unwrap();
    admin
        .configure(
            &catalog,
            Some("d"),
            &target(TABLE),
            &ZoneUpdate::Replace(ZoneConfig::new().with_num_replicas(7)),
        )
        .unwrap();
    set(&admin, &catalog, INDEX, 3);

    let table = admin.show(&catalog, Some("d"), &target(TABLE)).unwrap();
    assert_eq!(table.config.num_replicas, Some(7));
    assert_eq!(table.config.gc.unwrap().ttl_seconds, DEFAULT_TTL);

    admin
        .configure(&catalog, Some("d"), &target(TABLE), &ZoneUpdate::UseDefault)
        .unwrap();
    let table = admin.show(&catalog, Some("d"), &target(TABLE)).unwrap();
    assert_eq!(table.config, ZoneConfig::default_zone());
    assert_eq!(ttl(&admin, &catalog, INDEX), 3);
}

// ── Full override sequence ─────────────────────────────────────────

#[test]
fn overrides_apply_downward_and_deletes_never_cascade() {
    let admin = admin();
    let catalog = catalog();
    let d = DEFAULT_TTL;
    assert_eq!(ttls(&admin, &catalog), [d, d, d, d, d]);

    set(&admin, &catalog, DATABASE, 100);
    assert_eq!(ttls(&admin, &catalog), [100, 100, 100, 100, 100]);
    assert_eq!(ttl(&admin, &catalog, "RANGE default"), d);

    set(&admin, &catalog, TABLE, 200);
    assert_eq!(ttls(&admin, &catalog), [100, 200, 200, 200, 200]);

    set(&admin, &catalog, INDEX, 300);
    assert_eq!(ttls(&admin, &catalog), [100, 200, 300, 300, 300]);

    set(&admin, &catalog, P0, 400);
    assert_eq!(ttls(&admin, &catalog), [100, 200, 300, 400, 300]);

    // Only zones without their own TTL follow the default.
    set(&admin, &catalog, "RANGE default", 500);
    assert_eq!(ttl(&admin, &catalog, "RANGE default"), 500);
    assert_eq!(ttl(&admin, &catalog, "TABLE system.jobs"), 500);
    assert_eq!(ttls(&admin, &catalog), [100, 200, 300, 400, 300]);

    discard(&admin, &catalog, DATABASE);
    assert_eq!(ttls(&admin, &catalog), [500, 200, 300, 400, 300]);

    discard(&admin, &catalog, TABLE);
    assert_eq!(ttls(&admin, &catalog), [500, 500, 300, 400, 300]);

    discard(&admin, &catalog, INDEX);
    assert_eq!(ttls(&admin, &catalog), [500, 500, 500, 400, 500]);

    discard(&admin, &catalog, P0);
    assert_eq!(ttls(&admin, &catalog), [500; 5]);

    // Deleting zones that have no override is not an error.
    for s in [DATABASE, TABLE, INDEX, P0, P1] {
        discard(&admin, &catalog, s);
    }
    assert_eq!(admin.show_all().unwrap().len(), 1);
}

#[test]
fn show_reports_nearest_supplier() {
    let admin = admin();
    let catalog = catalog();
    set(&admin, &catalog, TABLE, 200);

    let res = admin.show(&catalog, Some("d"), &target(P0)).unwrap();
    assert_eq!(
        res.supplied_by,
        ResolvedTarget::Table {
            database_id: 50,
            table_id: 52
        }
    );
    assert!(res.config.is_complete());
}
