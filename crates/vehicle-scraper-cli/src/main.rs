use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use vehicle_scraper_core::browser::ChromeResultsPage;
use vehicle_scraper_core::fetch::HttpImageSource;
use vehicle_scraper_core::platform::KeepAwake;
use vehicle_scraper_core::{logging, Config, LogLevel, SortOrder, VehicleScraper};

#[derive(Parser)]
#[command(name = "vehicle-scraper")]
#[command(about = "Collect vehicle images for each make, model and year")]
#[command(version)]
struct Cli {
    /// Root directory of the image dataset
    #[arg(required_unless_present = "write_config")]
    output_dir: Option<PathBuf>,

    /// Target number of images per make/model/year
    #[arg(required_unless_present = "write_config")]
    num_images: Option<usize>,

    /// Work through the reference table from the top (ascending)
    #[arg(
        long,
        conflicts_with = "bottom",
        required_unless_present_any = ["bottom", "write_config"]
    )]
    top: bool,

    /// Work through the reference table from the bottom (descending)
    #[arg(long, required_unless_present_any = ["top", "write_config"])]
    bottom: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV of make/model/year combinations
    #[arg(long)]
    reference_table: Option<PathBuf>,

    /// JSON file mapping saved images to their source URLs
    #[arg(long)]
    index: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Print the work list and exit
    #[arg(long)]
    dry_run: bool,

    /// Allow the machine to sleep during the run
    #[arg(long)]
    no_keep_awake: bool,

    /// Write rotating log files to this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Set up configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("loading config {}", config_path.display()))?
    } else {
        Config::default()
    };

    // Override config with command line arguments
    if let Some(reference_table) = cli.reference_table {
        config.reference_table = reference_table;
    }
    if let Some(index) = cli.index {
        config.index_path = index;
    }
    if cli.headless {
        config.headless = true;
    }
    if cli.no_keep_awake {
        config.keep_awake = false;
    }
    if cli.verbose > 0 {
        config.log_level = match cli.verbose {
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
    }

    config.validate()?;

    if let Some(path) = cli.write_config {
        config.save_to_file(&path)?;
        println!("Configuration file generated at: {}", path.display());
        return Ok(());
    }

    // Initialize logger
    let level = LevelFilter::from(config.log_level);
    if let Some(log_dir) = &cli.log_dir {
        logging::init_logger(log_dir, level)
            .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;
    } else {
        env_logger::Builder::from_env(
            env_logger::Env::default().filter_or("SCRAPER_LOG", level.to_string()),
        )
        .init();
    }

    let (Some(output_dir), Some(num_images)) = (cli.output_dir, cli.num_images) else {
        bail!("OUTPUT_DIR and NUM_IMAGES are required");
    };
    let order = if cli.bottom {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };

    let scraper = VehicleScraper::new(config);
    let worklist = scraper.build_worklist(&output_dir, num_images, order)?;

    if cli.dry_run {
        for item in &worklist {
            println!(
                "{}\t{} of {} stored, {} wanted",
                item.class.query(),
                item.existing,
                num_images,
                item.wanted
            );
        }
        println!("{} classes need images", worklist.len());
        return Ok(());
    }

    if worklist.is_empty() {
        info!("Every class already has {} images", num_images);
        return Ok(());
    }

    let shutdown = scraper.shutdown_handle();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping after the current step");
        shutdown.store(true, Ordering::SeqCst);
    })?;

    let _keep_awake = if scraper.config().keep_awake {
        KeepAwake::acquire()
    } else {
        KeepAwake::inactive()
    };

    let source = HttpImageSource::new(scraper.config())?;
    let mut page = ChromeResultsPage::launch(scraper.config())?;

    info!("Starting image collection...");
    let result = scraper.run(&mut page, &source, &output_dir, &worklist);
    page.close();
    let summary = result?;

    info!(
        "Collection {}: {} classes, {} images stored, {} duplicates, {} failures",
        if summary.interrupted { "interrupted" } else { "complete" },
        summary.classes,
        summary.images_stored,
        summary.duplicates,
        summary.failures
    );

    Ok(())
}
