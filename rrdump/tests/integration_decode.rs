//! Integration tests for decoding complete dumps.
//!
//! The fixture under `tests/fixtures/traffic.xml` is laid out the way
//! `rrdtool dump` writes it: doctype, tab indentation, padded names and
//! timestamp comments in front of every row.

use std::time::Duration;

use rrdump::coerce::FieldKind;
use rrdump::{Archive, ConsolidationFn, RrdError, StructuralError, Value, decode};

const TRAFFIC: &[u8] = include_bytes!("fixtures/traffic.xml");

/// A single data source, single archive dump with the given rows.
fn minimal_dump(rows: &[&str]) -> String {
    let rows: String = rows
        .iter()
        .map(|v| format!("<row><v>{v}</v></row>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<rrd>
  <version>0003</version>
  <step>60</step>
  <lastupdate>1700000000</lastupdate>
  <ds>
    <name> temp </name>
    <type> GAUGE </type>
    <minimal_heartbeat>120</minimal_heartbeat>
    <min>NaN</min>
    <max>NaN</max>
    <last_ds>21</last_ds>
    <value>0.0000000000e+00</value>
    <unknown_sec>
	42
  </unknown_sec>
  </ds>
  <rra>
    <cf>AVERAGE</cf>
    <pdp_per_row>1</pdp_per_row>
    <params><xff>5.0000000000e-01</xff></params>
    <cdp_prep>
      <ds>
        <primary_value>NaN</primary_value>
        <secondary_value>NaN</secondary_value>
        <value>NaN</value>
        <unknown_datapoints>0</unknown_datapoints>
      </ds>
    </cdp_prep>
    <database>
{rows}    </database>
  </rra>
</rrd>
"#
    )
}

#[test]
fn test_decode_fixture_header() {
    let archive = decode(TRAFFIC).unwrap();

    assert_eq!(archive.version, "0003");
    assert_eq!(archive.step, Duration::from_secs(300));
    assert_eq!(archive.last_update.timestamp(), 1_700_000_123);
}

#[test]
fn test_decode_fixture_data_sources() {
    let archive = decode(TRAFFIC).unwrap();

    let names: Vec<&str> = archive
        .data_sources
        .iter()
        .map(|ds| ds.name.as_str())
        .collect();
    assert_eq!(names, ["rx", "tx"]);

    let rx = archive.data_source("rx").unwrap();
    assert_eq!(rx.kind, "COUNTER");
    assert_eq!(rx.minimal_heartbeat, 600);
    assert_eq!(rx.min, Value::new(0.0));
    assert_eq!(rx.max, Value::new(125_000_000.0));
    assert_eq!(rx.last_ds, 829_341);
    assert_eq!(rx.value, Value::new(4100.0));
    assert_eq!(rx.unknown_sec, 0);

    let tx = archive.data_source("tx").unwrap();
    assert!(tx.max.is_unknown());
    assert!(tx.value.is_unknown());
    assert_eq!(tx.unknown_sec, 23);

    assert_eq!(archive.data_source_index("tx"), Some(1));
    assert!(archive.data_source("missing").is_none());
}

#[test]
fn test_decode_fixture_archives() {
    let archive = decode(TRAFFIC).unwrap();
    assert_eq!(archive.archives.len(), 2);

    let average = &archive.archives[0];
    assert_eq!(average.cf, "AVERAGE");
    assert_eq!(average.consolidation_fn(), Some(ConsolidationFn::Average));
    assert_eq!(average.pdp_per_row, 1);
    assert_eq!(average.xff(), Some(0.5));
    assert_eq!(average.cdp_prep.len(), 2);
    assert!((average.cdp_prep[0].primary_value.get() - 13.666_666_666_7).abs() < 1e-9);
    assert!(average.cdp_prep[1].primary_value.is_unknown());
    assert_eq!(average.rows.len(), 4);

    let max = &archive.archives[1];
    assert_eq!(max.consolidation_fn(), Some(ConsolidationFn::Max));
    assert_eq!(max.pdp_per_row, 12);
    // A configured xff of zero is kept, not confused with "absent".
    assert_eq!(max.xff(), Some(0.0));
    assert_eq!(max.cdp_prep[1].unknown_datapoints, Value::new(2.0));
    assert_eq!(max.rows.len(), 2);
}

#[test]
fn test_order_is_preserved() {
    let archive = decode(TRAFFIC).unwrap();

    let cfs: Vec<&str> = archive.archives.iter().map(|a| a.cf.as_str()).collect();
    assert_eq!(cfs, ["AVERAGE", "MAX"]);

    let rx: Vec<Option<f64>> = archive.archives[0].column(0).map(Value::known).collect();
    assert_eq!(rx, [Some(10.0), Some(12.0), None, Some(13.666_666_666_7)]);

    let tx: Vec<Option<f64>> = archive.archives[0].column(1).map(Value::known).collect();
    assert_eq!(tx, [Some(2.5), None, None, Some(3.0)]);
}

#[test]
fn test_rows_align_with_data_sources() {
    let archive = decode(TRAFFIC).unwrap();
    let width = archive.data_sources.len();

    for rra in &archive.archives {
        assert_eq!(rra.cdp_prep.len(), width);
        for row in &rra.rows {
            assert_eq!(row.len(), width);
        }
    }
}

#[test]
fn test_decode_is_deterministic() {
    let first = decode(TRAFFIC).unwrap();
    let second = Archive::decode(TRAFFIC).unwrap();
    // Equality holds even though both trees contain unknown samples.
    assert_eq!(first, second);
}

#[test]
fn test_row_timestamps_match_dump_comments() {
    let archive = decode(TRAFFIC).unwrap();

    let average: Vec<i64> = archive
        .row_timestamps(0)
        .unwrap()
        .iter()
        .map(|t| t.timestamp())
        .collect();
    assert_eq!(
        average,
        [1_699_999_200, 1_699_999_500, 1_699_999_800, 1_700_000_100]
    );

    let max: Vec<i64> = archive
        .row_timestamps(1)
        .unwrap()
        .iter()
        .map(|t| t.timestamp())
        .collect();
    assert_eq!(max, [1_699_995_600, 1_699_999_200]);

    assert!(archive.row_timestamps(2).is_none());
}

#[test]
fn test_two_row_example() {
    let dump = minimal_dump(&["1.5", "U"]);
    let archive = decode(dump.as_bytes()).unwrap();

    let rows = &archive.archives[0].rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(0), Some(Value::new(1.5)));
    assert!(rows[1].get(0).unwrap().is_unknown());
}

#[test]
fn test_padded_integer_field() {
    let archive = decode(minimal_dump(&[]).as_bytes()).unwrap();
    assert_eq!(archive.data_sources[0].unknown_sec, 42);
    assert_eq!(archive.data_sources[0].name, "temp");
}

#[test]
fn test_unknown_sample_does_not_disturb_other_fields() {
    let archive = decode(minimal_dump(&["U", "not-a-number", "7"]).as_bytes()).unwrap();

    let ds = &archive.data_sources[0];
    assert_eq!(ds.last_ds, 21);
    assert!(ds.min.is_unknown());
    assert_eq!(archive.step, Duration::from_secs(60));

    let values: Vec<Option<f64>> = archive.archives[0].column(0).map(Value::known).collect();
    assert_eq!(values, [None, None, Some(7.0)]);
}

#[test]
fn test_missing_required_top_level_element() {
    let dump = String::from_utf8(TRAFFIC.to_vec())
        .unwrap()
        .replace("<lastupdate>1700000123</lastupdate>", "");

    match decode(dump.as_bytes()) {
        Err(RrdError::Structural(StructuralError::MissingElement { path })) => {
            assert_eq!(path, "rrd/lastupdate");
        }
        other => panic!("expected missing element, got {other:?}"),
    }
}

#[test]
fn test_corrupt_integer_is_a_field_error() {
    let dump = String::from_utf8(TRAFFIC.to_vec())
        .unwrap()
        .replace("<pdp_per_row>12</pdp_per_row>", "<pdp_per_row>twelve</pdp_per_row>");

    match decode(dump.as_bytes()) {
        Err(RrdError::Field(err)) => {
            assert_eq!(err.path, "rrd/rra[1]/pdp_per_row");
            assert_eq!(err.kind, FieldKind::Integer);
            assert_eq!(err.raw, "twelve");
        }
        other => panic!("expected field error, got {other:?}"),
    }
}

#[test]
fn test_malformed_input() {
    assert!(matches!(
        decode(b""),
        Err(RrdError::Structural(StructuralError::Empty))
    ));

    let truncated = &TRAFFIC[..TRAFFIC.len() / 2];
    assert!(matches!(decode(truncated), Err(RrdError::Structural(_))));

    assert!(matches!(
        decode(b"this is not markup"),
        Err(RrdError::Structural(_))
    ));
}

#[test]
fn test_deeply_nested_unknown_element() {
    let depth = 100_000;
    let filler = format!("{}{}", "<x>".repeat(depth), "</x>".repeat(depth));
    let xml = minimal_dump(&["1"]).replace("</rrd>", &format!("{filler}</rrd>"));

    let archive = decode(xml.as_bytes()).unwrap();
    assert_eq!(archive.archives[0].rows.len(), 1);

    let unclosed = minimal_dump(&["1"]).replace("</rrd>", &"<x>".repeat(depth));
    assert!(matches!(decode(unclosed.as_bytes()), Err(RrdError::Structural(_))));
}

#[test]
fn test_archive_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Archive>();
    assert_send_sync::<Value>();
    assert_send_sync::<RrdError>();

    let expected = decode(TRAFFIC).unwrap();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| decode(TRAFFIC).unwrap())).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
