//! End-to-end tests for filtering, projection, ordering and the result cap.

use insightql_core::{Dataset, InMemoryCatalog, QueryEngine, QueryError, Room, Section};
use serde_json::json;

fn courses_engine() -> QueryEngine<InMemoryCatalog> {
    let mut catalog = InMemoryCatalog::new();
    catalog
        .add(Dataset::courses(
            "courses",
            vec![
                Section::new(
                    "cpsc", "310", "allen", "software eng", "1001", 78.3, 120.0, 10.0, 2.0, 2015.0,
                ),
                Section::new(
                    "cpsc", "110", "baker", "computation", "1002", 71.1, 300.0, 40.0, 5.0, 2015.0,
                ),
                Section::new(
                    "cpsc", "110", "baker", "computation", "1003", 68.9, 280.0, 55.0, 3.0, 2016.0,
                ),
                Section::new(
                    "math", "100", "carter", "calculus", "1004", 65.0, 200.0, 60.0, 1.0, 2016.0,
                ),
                Section::new(
                    "biol", "112", "davis", "biology", "1005", 82.0, 150.0, 12.0, 0.0, 2014.0,
                ),
            ],
        ))
        .unwrap();
    QueryEngine::new(catalog)
}

fn rooms_engine() -> QueryEngine<InMemoryCatalog> {
    let mut catalog = InMemoryCatalog::new();
    catalog
        .add(Dataset::rooms(
            "rooms",
            vec![
                Room::new(
                    "Hugh Dempster Pavilion",
                    "DMP",
                    "310",
                    "DMP_310",
                    "6245 Agronomy Road",
                    "Small Group",
                    "Movable Tables & Chairs",
                    "http://campus/DMP-310",
                    49.261_29,
                    -123.248_98,
                    80.0,
                ),
                Room::new(
                    "Hugh Dempster Pavilion",
                    "DMP",
                    "110",
                    "DMP_110",
                    "6245 Agronomy Road",
                    "Tiered Large Group",
                    "Fixed Tables",
                    "http://campus/DMP-110",
                    49.261_29,
                    -123.248_98,
                    120.0,
                ),
                Room::new(
                    "Frank Forward",
                    "FORW",
                    "303",
                    "FORW_303",
                    "6350 Stores Road",
                    "Small Group",
                    "Movable Tables & Chairs",
                    "http://campus/FORW-303",
                    49.264_78,
                    -123.251_79,
                    44.0,
                ),
            ],
        ))
        .unwrap();
    QueryEngine::new(catalog)
}

#[test]
fn test_filter_combinators_end_to_end() {
    let engine = courses_engine();

    let rows = engine
        .evaluate(&json!({
            "WHERE": {
                "AND": [
                    { "IS": { "courses_dept": "cpsc" } },
                    { "GT": { "courses_avg": 70 } }
                ]
            },
            "OPTIONS": { "COLUMNS": ["courses_uuid"] }
        }))
        .unwrap();
    assert_eq!(
        rows,
        vec![json!({"courses_uuid": "1001"}), json!({"courses_uuid": "1002"})]
    );

    let rows = engine
        .evaluate(&json!({
            "WHERE": {
                "OR": [
                    { "EQ": { "courses_year": 2014 } },
                    { "LT": { "courses_avg": 66 } }
                ]
            },
            "OPTIONS": { "COLUMNS": ["courses_uuid"] }
        }))
        .unwrap();
    assert_eq!(
        rows,
        vec![json!({"courses_uuid": "1004"}), json!({"courses_uuid": "1005"})]
    );
}

#[test]
fn test_not_selects_the_complement() {
    let engine = courses_engine();

    let matched = engine
        .evaluate(&json!({
            "WHERE": { "IS": { "courses_dept": "cpsc" } },
            "OPTIONS": { "COLUMNS": ["courses_uuid"] }
        }))
        .unwrap();
    let complement = engine
        .evaluate(&json!({
            "WHERE": { "NOT": { "IS": { "courses_dept": "cpsc" } } },
            "OPTIONS": { "COLUMNS": ["courses_uuid"] }
        }))
        .unwrap();

    assert_eq!(matched.len() + complement.len(), 5);
    for row in &matched {
        assert!(!complement.contains(row));
    }
}

#[test]
fn test_wildcard_filters() {
    let engine = courses_engine();

    let rows = engine
        .evaluate(&json!({
            "WHERE": { "IS": { "courses_title": "c*" } },
            "OPTIONS": { "COLUMNS": ["courses_title"] }
        }))
        .unwrap();
    assert_eq!(
        rows,
        vec![
            json!({"courses_title": "computation"}),
            json!({"courses_title": "computation"}),
            json!({"courses_title": "calculus"}),
        ]
    );

    let rows = engine
        .evaluate(&json!({
            "WHERE": { "IS": { "courses_instructor": "*er" } },
            "OPTIONS": { "COLUMNS": ["courses_uuid"] }
        }))
        .unwrap();
    assert_eq!(rows.len(), 3); // baker x2, carter
}

#[test]
fn test_columns_order_is_preserved_in_output() {
    let engine = courses_engine();
    let rows = engine
        .evaluate(&json!({
            "WHERE": { "IS": { "courses_uuid": "1001" } },
            "OPTIONS": { "COLUMNS": ["courses_avg", "courses_dept", "courses_id"] }
        }))
        .unwrap();
    assert_eq!(
        serde_json::to_string(&rows[0]).unwrap(),
        r#"{"courses_avg":78.3,"courses_dept":"cpsc","courses_id":"310"}"#
    );
}

#[test]
fn test_order_by_single_column() {
    let engine = courses_engine();
    let rows = engine
        .evaluate(&json!({
            "WHERE": {},
            "OPTIONS": {
                "COLUMNS": ["courses_avg"],
                "ORDER": "courses_avg"
            }
        }))
        .unwrap();
    let avgs: Vec<f64> = rows
        .iter()
        .map(|row| row["courses_avg"].as_f64().unwrap())
        .collect();
    assert_eq!(avgs, vec![65.0, 68.9, 71.1, 78.3, 82.0]);
}

#[test]
fn test_order_ties_keep_upstream_order() {
    let engine = courses_engine();
    let rows = engine
        .evaluate(&json!({
            "WHERE": { "IS": { "courses_dept": "cpsc" } },
            "OPTIONS": {
                "COLUMNS": ["courses_id", "courses_uuid"],
                "ORDER": "courses_id"
            }
        }))
        .unwrap();
    // Both 110 sections tie on the sort key; dataset order decides.
    assert_eq!(
        rows,
        vec![
            json!({"courses_id": "110", "courses_uuid": "1002"}),
            json!({"courses_id": "110", "courses_uuid": "1003"}),
            json!({"courses_id": "310", "courses_uuid": "1001"}),
        ]
    );
}

#[test]
fn test_order_down_reverses_every_key() {
    let engine = courses_engine();
    let rows = engine
        .evaluate(&json!({
            "WHERE": { "IS": { "courses_dept": "cpsc" } },
            "OPTIONS": {
                "COLUMNS": ["courses_id", "courses_avg"],
                "ORDER": { "dir": "DOWN", "keys": ["courses_id", "courses_avg"] }
            }
        }))
        .unwrap();
    assert_eq!(
        rows,
        vec![
            json!({"courses_id": "310", "courses_avg": 78.3}),
            json!({"courses_id": "110", "courses_avg": 71.1}),
            json!({"courses_id": "110", "courses_avg": 68.9}),
        ]
    );
}

#[test]
fn test_rooms_dataset_end_to_end() {
    let engine = rooms_engine();
    let rows = engine
        .evaluate(&json!({
            "WHERE": {
                "AND": [
                    { "IS": { "rooms_furniture": "*Movable*" } },
                    { "GT": { "rooms_seats": 50 } }
                ]
            },
            "OPTIONS": { "COLUMNS": ["rooms_name", "rooms_seats"] }
        }))
        .unwrap();
    assert_eq!(rows, vec![json!({"rooms_name": "DMP_310", "rooms_seats": 80})]);
}

#[test]
fn test_unknown_dataset_is_rejected() {
    let engine = courses_engine();
    let result = engine.evaluate(&json!({
        "WHERE": {},
        "OPTIONS": { "COLUMNS": ["archive_dept"] }
    }));
    assert!(matches!(result, Err(QueryError::DatasetNotFound(id)) if id == "archive"));
}

#[test]
fn test_evaluation_is_repeatable() {
    let engine = courses_engine();
    let query = json!({
        "WHERE": { "GT": { "courses_avg": 66 } },
        "OPTIONS": {
            "COLUMNS": ["courses_dept", "courses_avg"],
            "ORDER": "courses_avg"
        }
    });
    let first = engine.evaluate(&query).unwrap();
    let second = engine.evaluate(&query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_result_cap() {
    let sections: Vec<Section> = (0..5001)
        .map(|i| {
            Section::new(
                "span",
                "100",
                "lee",
                "survey",
                i.to_string(),
                (i % 100) as f64,
                30.0,
                2.0,
                0.0,
                2015.0,
            )
        })
        .collect();
    let mut catalog = InMemoryCatalog::new();
    catalog.add(Dataset::courses("big", sections)).unwrap();
    let engine = QueryEngine::new(catalog);

    let result = engine.evaluate(&json!({
        "WHERE": {},
        "OPTIONS": { "COLUMNS": ["big_uuid"] }
    }));
    assert!(matches!(result, Err(QueryError::ResultTooLarge(5001))));

    // Narrowing the filter below the cap succeeds.
    let rows = engine
        .evaluate(&json!({
            "WHERE": { "GT": { "big_avg": 98 } },
            "OPTIONS": { "COLUMNS": ["big_uuid"] }
        }))
        .unwrap();
    assert_eq!(rows.len(), 50);
}

#[test]
fn test_catalog_lifecycle_through_engine() {
    let mut engine = courses_engine();

    engine
        .source_mut()
        .add(Dataset::courses(
            "archive",
            vec![Section::new(
                "hist", "200", "evans", "history", "2001", 75.0, 90.0, 5.0, 1.0, 2010.0,
            )],
        ))
        .unwrap();

    let rows = engine
        .evaluate(&json!({
            "WHERE": {},
            "OPTIONS": { "COLUMNS": ["archive_dept"] }
        }))
        .unwrap();
    assert_eq!(rows, vec![json!({"archive_dept": "hist"})]);

    engine.source_mut().remove("archive").unwrap();
    let result = engine.evaluate(&json!({
        "WHERE": {},
        "OPTIONS": { "COLUMNS": ["archive_dept"] }
    }));
    assert!(matches!(result, Err(QueryError::DatasetNotFound(_))));
}
