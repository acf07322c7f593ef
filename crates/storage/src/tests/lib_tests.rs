use super::*;

#[tokio::test]
async fn fresh_database_starts_at_round_one() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let state = storage.load_state().await.expect("state");
    assert_eq!(
        state,
        RoundCounters {
            round: 1,
            position: 0,
            left_pulls: 0,
            right_pulls: 0,
        }
    );
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn pulls_move_position_and_count_per_side() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.record_pull(Side::Right).await.expect("right");
    storage.record_pull(Side::Right).await.expect("right");
    let state = storage.record_pull(Side::Left).await.expect("left");

    assert_eq!(state.position, 1);
    assert_eq!(state.left_pulls, 1);
    assert_eq!(state.right_pulls, 2);
    assert_eq!(storage.load_state().await.expect("state"), state);
}

#[tokio::test]
async fn finishing_a_round_records_result_and_resets_counters() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .write_state(RoundCounters {
            round: 4,
            position: -9,
            left_pulls: 12,
            right_pulls: 3,
        })
        .await
        .expect("seed");

    let (result, next) = storage.finish_round(Side::Left).await.expect("finish");
    assert_eq!(result.round, 4);
    assert_eq!(result.winner, Side::Left);
    assert_eq!(result.left_pulls, 12);
    assert_eq!(result.right_pulls, 3);
    assert_eq!(
        next,
        RoundCounters {
            round: 5,
            position: 0,
            left_pulls: 0,
            right_pulls: 0,
        }
    );

    let history = storage.list_results(10).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].round, 4);
    assert_eq!(history[0].winner, Side::Left);
}

#[tokio::test]
async fn history_lists_newest_round_first_and_honours_limit() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.finish_round(Side::Right).await.expect("round 1");
    storage.finish_round(Side::Left).await.expect("round 2");
    storage.finish_round(Side::Right).await.expect("round 3");

    let history = storage.list_results(2).await.expect("history");
    let rounds: Vec<i64> = history.iter().map(|result| result.round).collect();
    assert_eq!(rounds, vec![3, 2]);
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("tug.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn memory_url_has_no_parent_directory() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/tug.db?mode=rwc"),
        Some(PathBuf::from("./data/tug.db"))
    );
}
