//! Poll loop, failure handling and type normalization through `run_query`.

use std::time::Duration;

use tokio::time::Instant;

use dbtools_athena::*;

use crate::fakes::*;

fn explicit() -> OutputLocation {
    OutputLocation::Explicit("s3://my-bucket/results/".into())
}

fn timeout(seconds: u64) -> QueryOptions {
    QueryOptions {
        return_raw_types: false,
        timeout_seconds: Some(seconds),
    }
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_two_sleeps() {
    let queries = FakeQueryService::new(
        vec![running(), running(), succeeded()],
        vec![col("id", "bigint"), col("name", "varchar")],
    );
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    let start = Instant::now();
    let response = client
        .run_query("SELECT id, name FROM people", &explicit(), &timeout(10))
        .await
        .expect("query succeeds");

    assert_eq!(start.elapsed(), Duration::from_secs(4));
    assert_eq!(queries.status_calls(), 3);
    assert_eq!(response.s3_path, RESULT_PATH);
    assert_eq!(response.meta, vec![col("id", "long"), col("name", "character")]);
}

#[tokio::test(start_paused = true)]
async fn submits_sql_with_resolved_location_and_reads_one_row() {
    let queries = FakeQueryService::new(vec![succeeded()], vec![col("n", "integer")]);
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    client
        .run_query("SELECT 1 AS n", &explicit(), &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(
        queries.submitted(),
        vec![QueryRequest {
            sql: "SELECT 1 AS n".into(),
            output_location: "s3://my-bucket/results/".into(),
        }],
    );
    assert_eq!(*queries.result_rows_requested.lock().unwrap(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn times_out_after_second_poll() {
    let queries = FakeQueryService::new(vec![running(), running(), running()], vec![]);
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    let start = Instant::now();
    let err = client
        .run_query("SELECT 1", &explicit(), &timeout(3))
        .await
        .unwrap_err();

    match err {
        AthenaError::QueryTimeout { query_id, seconds } => {
            assert_eq!(query_id, QUERY_ID);
            assert_eq!(seconds, 3);
        }
        other => panic!("expected QueryTimeout, got {other:?}"),
    }
    assert_eq!(queries.status_calls(), 2);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
    assert!(queries.result_rows_requested.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn queued_counts_towards_timeout() {
    let queries = FakeQueryService::new(vec![queued()], vec![]);
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    let err = client
        .run_query("SELECT 1", &explicit(), &timeout(6))
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaError::QueryTimeout { .. }));
    // 2, 4, 6 are within budget; the fourth sleep pushes elapsed to 8.
    assert_eq!(queries.status_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn config_default_timeout_applies_when_call_sets_none() {
    let queries = FakeQueryService::new(vec![running()], vec![]);
    let config = AthenaConfig {
        default_timeout_seconds: Some(1),
        ..AthenaConfig::default()
    };
    let client = client_with(config, queries.clone(), FakeRoles::empty());

    let err = client
        .run_query("SELECT 1", &explicit(), &QueryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaError::QueryTimeout { seconds: 1, .. }));
    assert_eq!(queries.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn call_timeout_overrides_config_default() {
    let queries = FakeQueryService::new(
        vec![running(), running(), running(), succeeded()],
        vec![col("d", "date")],
    );
    let config = AthenaConfig {
        default_timeout_seconds: Some(1),
        ..AthenaConfig::default()
    };
    let client = client_with(config, queries.clone(), FakeRoles::empty());

    let response = client
        .run_query("SELECT current_date AS d", &explicit(), &timeout(60))
        .await
        .unwrap();

    assert_eq!(response.meta, vec![col("d", "date")]);
    assert_eq!(queries.status_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn no_timeout_polls_until_done() {
    let mut statuses = vec![running(); 50];
    statuses.push(succeeded());
    let queries = FakeQueryService::new(statuses, vec![]);
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    let start = Instant::now();
    let response = client
        .run_query("SELECT 1", &explicit(), &QueryOptions::default())
        .await
        .unwrap();

    assert!(response.meta.is_empty());
    assert_eq!(queries.status_calls(), 51);
    assert_eq!(start.elapsed(), Duration::from_secs(100));
}

#[tokio::test(start_paused = true)]
async fn failed_surfaces_reason_without_further_polling() {
    let queries = FakeQueryService::new(
        vec![
            status(QueryState::Failed, Some("SYNTAX_ERROR: line 1:8: Column 'x' cannot be resolved")),
            succeeded(),
        ],
        vec![],
    );
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    let start = Instant::now();
    let err = client
        .run_query("SELECT x", &explicit(), &timeout(10))
        .await
        .unwrap_err();

    match err {
        AthenaError::QueryFailed { query_id, reason } => {
            assert_eq!(query_id, QUERY_ID);
            assert!(reason.contains("Column 'x' cannot be resolved"));
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
    assert_eq!(queries.status_calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn failed_without_reason_reports_unknown() {
    let queries = FakeQueryService::new(vec![running(), status(QueryState::Failed, None)], vec![]);
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    let err = client
        .run_query("SELECT 1", &explicit(), &QueryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaError::QueryFailed { ref reason, .. } if reason == "unknown"));
    assert_eq!(queries.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn unrecognized_state_fails_immediately() {
    for raw in ["CANCELLED", "UNKNOWN"] {
        let queries = FakeQueryService::new(
            vec![status(QueryState::from(raw), None), succeeded()],
            vec![],
        );
        let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

        let err = client
            .run_query("SELECT 1", &explicit(), &timeout(10))
            .await
            .unwrap_err();

        match err {
            AthenaError::UnknownState { state, .. } => assert_eq!(state, raw),
            other => panic!("expected UnknownState, got {other:?}"),
        }
        assert_eq!(queries.status_calls(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn unmapped_type_fails_unless_raw_types_requested() {
    let columns = vec![col("id", "bigint"), col("tags", "array")];

    let queries = FakeQueryService::new(vec![succeeded()], columns.clone());
    let client = client_with(AthenaConfig::default(), queries, FakeRoles::empty());
    let err = client
        .run_query("SELECT id, tags FROM t", &explicit(), &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, AthenaError::UnknownType { ref column, ref data_type } if column == "tags" && data_type == "array")
    );

    let queries = FakeQueryService::new(vec![succeeded()], columns.clone());
    let client = client_with(AthenaConfig::default(), queries, FakeRoles::empty());
    let raw = QueryOptions {
        return_raw_types: true,
        timeout_seconds: None,
    };
    let response = client
        .run_query("SELECT id, tags FROM t", &explicit(), &raw)
        .await
        .unwrap();
    assert_eq!(response.meta, columns);
}

#[tokio::test(start_paused = true)]
async fn succeeded_without_output_location_is_a_parse_error() {
    let queries = FakeQueryService::new(vec![status(QueryState::Succeeded, None)], vec![]);
    let client = client_with(AthenaConfig::default(), queries, FakeRoles::empty());

    let err = client
        .run_query("SELECT 1", &explicit(), &QueryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaError::Parse(_)));
}

#[tokio::test(start_paused = true)]
async fn custom_poll_interval_drives_elapsed_time() {
    let queries = FakeQueryService::new(vec![running(), running()], vec![]);
    let config = AthenaConfig {
        poll_interval_seconds: 5,
        ..AthenaConfig::default()
    };
    let client = client_with(config, queries.clone(), FakeRoles::empty());

    let err = client
        .run_query("SELECT 1", &explicit(), &timeout(9))
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaError::QueryTimeout { .. }));
    assert_eq!(queries.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_polls_until_done() {
    let queries = FakeQueryService::new(
        vec![running(), running(), succeeded()],
        vec![col("id", "bigint")],
    );
    let client = client_with(AthenaConfig::default(), queries.clone(), FakeRoles::empty());

    let start = Instant::now();
    let response = client
        .run_query("SELECT id FROM people", &explicit(), &timeout(0))
        .await
        .expect("zero timeout does not abandon the query");

    assert_eq!(response.meta, vec![col("id", "long")]);
    assert_eq!(queries.status_calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn zero_config_default_timeout_polls_until_done() {
    let queries = FakeQueryService::new(vec![running(), running(), succeeded()], vec![]);
    let config = AthenaConfig {
        default_timeout_seconds: Some(0),
        ..AthenaConfig::default()
    };
    let client = client_with(config, queries.clone(), FakeRoles::empty());

    client
        .run_query("SELECT 1", &explicit(), &QueryOptions::default())
        .await
        .expect("zero default timeout does not abandon the query");

    assert_eq!(queries.status_calls(), 3);
}
