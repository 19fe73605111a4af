use clap::Parser;
use weekend_fares::config::cli::Args;
use weekend_fares::utils::error::ErrorSeverity;
use weekend_fares::utils::{logger, validation::Validate};
use weekend_fares::{build_pipeline, AppConfig, SearchEngine};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting weekend-fares");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 命令列覆蓋設定
    if let Some(first_friday) = &args.first_friday {
        config.search.first_friday = Some(first_friday.clone());
        tracing::info!("🔧 First Friday overridden to: {}", first_friday);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let today = chrono::Local::now().date_naive();
    display_config_summary(&config, today);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No searches will be made");
        let ranges = config.date_ranges(today)?;
        println!("📅 {} date ranges:", ranges.len());
        for range in &ranges {
            println!("  {}", range);
        }
        return Ok(());
    }

    let outcome = match build_pipeline(&config, today) {
        Ok(pipeline) => SearchEngine::new(pipeline).run().await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(summary) => {
            if summary.notified {
                println!("Report written with {} flights.", summary.matches);
            } else {
                println!("No flights found today.");
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &AppConfig, today: chrono::NaiveDate) {
    let filter = config.filter_config();
    println!("📋 Configuration Summary:");
    println!("  Origins: {}", config.origins().join(", "));
    println!("  Providers: {}", config.enabled_providers().join(", "));
    match config.anchor(today) {
        Ok(anchor) => println!(
            "  Weekends: {} every {} days from {}",
            config.count(),
            config.interval_days(),
            anchor
        ),
        Err(e) => println!("  Weekends: invalid anchor ({})", e),
    }
    println!(
        "  Ceilings: Europe {:.2}€ / World {:.2}€, min duration {} min",
        filter.europe_price_ceiling, filter.world_price_ceiling, filter.min_duration_minutes
    );
    println!("  Request delay: {:?}", config.request_delay());
    println!("  Output: {}", config.output_path());
}
