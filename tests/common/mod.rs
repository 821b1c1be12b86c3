#![allow(dead_code)]

//! Shared fixtures for integration tests: the purchases table and the
//! two-part load used across the query-stream scenarios.

use eventide::{DataType, Field, QueryResponse, TableConfig, TableSchema};
use serde_json::json;
use tokio::sync::mpsc;

pub const JAN_1: i64 = 1_577_836_800_000_000_000;
pub const JAN_2: i64 = 1_577_923_200_000_000_000;
pub const JAN_3: i64 = 1_578_009_600_000_000_000;
pub const JAN_4: i64 = 1_578_096_000_000_000_000;
pub const JAN_5: i64 = 1_578_182_400_000_000_000;
pub const JAN_6: i64 = 1_578_268_800_000_000_000;
pub const JAN_7: i64 = 1_578_355_200_000_000_000;
pub const JAN_8: i64 = 1_578_441_600_000_000_000;

pub const QUICKSTART_EXPR: &str = "{\n\
    time: purchases.purchase_time,\n\
    entity: purchases.customer_id,\n\
    max_amount: purchases.amount | max(),\n\
    min_amount: purchases.amount | min(),\n\
    }";

pub fn purchases_table() -> TableConfig {
    TableConfig {
        table_name: "purchases".to_string(),
        schema: TableSchema::new(vec![
            Field::new("id", DataType::String),
            Field::new("purchase_time", DataType::TimestampNanosecond),
            Field::new("customer_id", DataType::String),
            Field::new("vendor_id", DataType::String),
            Field::new("amount", DataType::Int64),
            Field::new("subsort_id", DataType::Int64),
        ]),
        time_column_name: "purchase_time".to_string(),
        entity_key_column_name: "customer_id".to_string(),
        subsort_column_name: Some("subsort_id".to_string()),
    }
}

fn purchase(
    id: &str,
    time: i64,
    customer: &str,
    vendor: &str,
    amount: i64,
    subsort: i64,
) -> serde_json::Value {
    json!({
        "id": id,
        "purchase_time": time,
        "customer_id": customer,
        "vendor_id": vendor,
        "amount": amount,
        "subsort_id": subsort,
    })
}

/// First load: ten purchases across karen and patrick.
pub fn part1_rows() -> Vec<serde_json::Value> {
    vec![
        purchase("cb_001", JAN_1, "karen", "chum_bucket", 9, 0),
        purchase("kk_001", JAN_1, "patrick", "krusty_krab", 3, 1),
        purchase("cb_002", JAN_2, "karen", "chum_bucket", 2, 2),
        purchase("kk_002", JAN_2, "patrick", "krusty_krab", 5, 3),
        purchase("cb_003", JAN_3, "karen", "chum_bucket", 4, 4),
        purchase("kk_003", JAN_3, "patrick", "krusty_krab", 12, 5),
        purchase("cb_004", JAN_4, "patrick", "chum_bucket", 5000, 6),
        purchase("cb_005", JAN_4, "karen", "chum_bucket", 3, 7),
        purchase("cb_006", JAN_5, "karen", "chum_bucket", 5, 8),
        purchase("kk_004", JAN_5, "patrick", "krusty_krab", 9, 9),
    ]
}

/// Second load: five more purchases, introducing spongebob.
pub fn part2_rows() -> Vec<serde_json::Value> {
    vec![
        purchase("kk_005", JAN_6, "patrick", "krusty_krab", 2, 10),
        purchase("wh_001", JAN_6, "spongebob", "weenie_hut", 7, 11),
        purchase("cb_007", JAN_7, "spongebob", "chum_bucket", 34, 12),
        purchase("wh_002", JAN_8, "karen", "weenie_hut", 8, 13),
        purchase("kk_006", JAN_8, "patrick", "krusty_krab", 9, 14),
    ]
}

/// Drain a response stream to completion.
pub async fn collect(mut rx: mpsc::Receiver<QueryResponse>) -> Vec<QueryResponse> {
    let mut responses = Vec::new();
    while let Some(response) = rx.recv().await {
        responses.push(response);
    }
    responses
}

/// Batch locations referenced by COMPUTING responses, in stream order.
pub fn output_paths(responses: &[QueryResponse]) -> Vec<String> {
    responses
        .iter()
        .filter_map(|r| r.output.as_ref().map(|o| o.path.clone()))
        .collect()
}
