use log::{error, info, warn};
use rollout_timeline::sheet::{EXPERIMENTS_TABLE, Workbook};
use rollout_timeline::{ExtractorConfig, analyze_experiments, analyze_weekly_sheet, version};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    // Initialize logger
    if std::env::var_os("RUST_LOG").is_none() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        error!("Not enough arguments provided");
        eprintln!(
            "Usage: {} <weekly_csv_or_workbook_dir> [output_path] [num_threads] [config_json]",
            args[0]
        );
        eprintln!("Version: {}", version());
        return ExitCode::FAILURE;
    }

    let input_path = Path::new(&args[1]);
    let output_path = if args.len() >= 3 {
        Path::new(&args[2])
    } else {
        Path::new("timeline.json")
    };

    let config = if args.len() >= 5 {
        match ExtractorConfig::from_path(Path::new(&args[4])) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config {:?}: {}", args[4], e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        ExtractorConfig::default()
    };

    let config = if args.len() >= 4 {
        match args[3].parse::<usize>() {
            Ok(num_threads) if num_threads > 0 => config.with_num_threads(num_threads),
            _ => {
                let cpu_count = num_cpus::get();
                warn!(
                    "Invalid thread count provided, defaulting to {} CPUs",
                    cpu_count
                );
                config.with_num_threads(cpu_count)
            }
        }
    } else {
        info!("Using default thread count: {}", config.num_threads);
        config
    };

    info!("Rollout Timeline v{}", version());
    info!("Processing weekly sheet at: {:?}", input_path);
    info!("Using {} threads", config.num_threads);
    info!("Bucket marker: {:?}", config.bucket_marker);

    let start_time = Instant::now();

    let extraction = match analyze_weekly_sheet(input_path, output_path, &config) {
        Ok(extraction) => extraction,
        Err(e) => {
            error!("Extraction failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for rejected in &extraction.rejected {
        warn!(
            "Rejected row at line {} ('{}'): {}",
            rejected.source_line, rejected.entity_key, rejected.error
        );
    }

    // A workbook's experiments report goes next to the timeline. Failing it
    // does not fail the run.
    if input_path.is_dir() {
        let has_experiments = Workbook::open(input_path)
            .map(|workbook| workbook.contains_table(EXPERIMENTS_TABLE))
            .unwrap_or(false);
        if has_experiments {
            let experiments_path = output_path.with_file_name("experiments.json");
            let today = chrono::Local::now().date_naive();
            match analyze_experiments(input_path, &experiments_path, &config, today) {
                Ok(_) => info!("Experiments saved to: {:?}", experiments_path),
                Err(e) => warn!("Skipping experiments report: {}", e),
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!("Extraction completed in {:.2?}", elapsed);
    info!("Output saved to: {:?}", output_path);

    ExitCode::SUCCESS
}
