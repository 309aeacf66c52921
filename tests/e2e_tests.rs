//! End-to-end integration tests
//!
//! These tests validate the complete processing pipeline using predefined
//! CSV fixtures. Each test:
//! 1. Seeds participants from participants.csv in a fixture directory
//! 2. Runs every command in commands.csv through the selected strategy
//! 3. Generates the participant report
//! 4. Compares the report with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Two-way and three-way creation
//! - Resolution by each kind of participant, including failed attempts
//! - Invalid participant references and unknown script references
//! - Repeated resolution and reused references
//! - Participants playing more than one part in a transaction
//! - Malformed script and seed rows
//!
//! Each fixture runs with both strategies, and again against a file store.

#[cfg(test)]
mod tests {
    use job_ledger::cli::StrategyType;
    use job_ledger::strategy::{create_strategy, BatchConfig, EngineConfig, StoreConfig};
    use job_ledger::{FileParticipantStore, ParticipantStore};
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Run a fixture and compare the report with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if a fixture file cannot be read or the report does not match.
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType, engine: EngineConfig) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let participants_path = format!("{}/participants.csv", fixture_dir);
        let commands_path = format!("{}/commands.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        for path in [&participants_path, &commands_path, &expected_path] {
            assert!(Path::new(path).exists(), "Fixture file not found: {}", path);
        }

        // Small batches so references straddle batch boundaries
        let strategy = create_strategy(strategy_type, Some(BatchConfig::new(3, 4)), engine);

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .process(
                Some(Path::new(&participants_path)),
                Path::new(&commands_path),
                &mut temp_output,
            )
            .unwrap_or_else(|e| panic!("Failed to process script: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("happy_path")]
    #[case("three_way")]
    #[case("resolution_flow")]
    #[case("invalid_references")]
    #[case("re_resolution")]
    #[case("same_participant")]
    #[case("malformed_data")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, EngineConfig::default());
    }

    #[rstest]
    #[case("happy_path")]
    #[case("three_way")]
    #[case("same_participant")]
    fn test_fixtures_with_file_store(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let dir = tempfile::tempdir().expect("Failed to create store dir");
        let engine = EngineConfig {
            store: StoreConfig::Directory(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };

        run_test_fixture(fixture, strategy, engine);
    }

    #[test]
    fn test_file_store_documents_share_correlation_id() {
        let dir = tempfile::tempdir().expect("Failed to create store dir");
        let engine = EngineConfig {
            store: StoreConfig::Directory(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };

        run_test_fixture("three_way", StrategyType::Sync, engine);

        let store = FileParticipantStore::open(dir.path()).expect("Failed to reopen store");
        let worker = store.find("w1").unwrap().expect("w1 document missing");
        let designer = store.find("d1").unwrap().expect("d1 document missing");
        let customer = store.find("c1").unwrap().expect("c1 document missing");

        let resolved = &worker.past_transactions[0];
        for record in [&designer, &customer] {
            let copy = record
                .find_past(&resolved.correlation_id)
                .expect("resolved copy missing");
            assert!(copy.content_matches(resolved));
        }
    }

    #[test]
    fn test_rerun_against_existing_store_keeps_history() {
        let dir = tempfile::tempdir().expect("Failed to create store dir");
        let engine = EngineConfig {
            store: StoreConfig::Directory(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };

        run_test_fixture("happy_path", StrategyType::Sync, engine.clone());

        let strategy = create_strategy(StrategyType::Sync, None, engine);
        let mut output = Vec::new();
        strategy
            .process(
                Some(Path::new("tests/fixtures/happy_path/participants.csv")),
                Path::new("tests/fixtures/happy_path/commands.csv"),
                &mut output,
            )
            .expect("second run failed");

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("d1,Interior Designer,2,2"));
        assert!(report.contains("w1,Worker/Carpenter,0,2"));
    }
}
