//! Integration tests for running the bundled example models.
use imes::cli::RunOpts;
use imes::cli::example::handle_example_run_command;
use imes::settings::Settings;
use tempfile::tempdir;

/// Run the multi-energy example end to end.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("IMES_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
        debug_model: false,
    };
    handle_example_run_command("multi_energy", &opts, Some(Settings::default())).unwrap();

    assert!(output_dir.join("summary.csv").is_file());
    assert!(output_dir.join("investments.csv").is_file());
    assert!(!output_dir.join("debug_costs.csv").exists());
}
