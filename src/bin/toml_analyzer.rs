use anyhow::Context;
use clap::Parser;
use light_analyzer::core::ConfigProvider;
use light_analyzer::domain::model::CoordinateSpace;
use light_analyzer::utils::{logger, validation::Validate};
use light_analyzer::{AnalysisEngine, LightLossPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-analyzer")]
#[command(about = "Light loss analyzer driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "light-analyzer.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the image path from config
    #[arg(long)]
    image: Option<String>,

    /// Override the physical length from config
    #[arg(long)]
    length: Option<f64>,

    /// Dry run - show what would be analyzed without reading the image
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(image) = args.image.clone() {
        tracing::info!("🔧 Image overridden to: {}", image);
        config.analysis.image_path = image;
    }
    if let Some(length) = args.length {
        tracing::info!("🔧 Length overridden to: {}", length);
        config.analysis.length = length;
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No image will be read");
        let metadata = std::fs::metadata(config.image_path())
            .with_context(|| format!("Image not found: {}", config.image_path()))?;
        println!("✅ Image present ({} bytes)", metadata.len());
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = LightLossPipeline::new(LocalStorage::default(), config);
    let engine = AnalysisEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            println!("{}", outcome.summary);
            println!();
            for path in &outcome.artifacts {
                println!("📁 Saved: {}", path);
            }
            tracing::info!("✅ Analysis completed successfully!");
        }
        Err(e) => {
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Image: {}", config.image_path());
    if let Some(roi) = config.roi_request() {
        println!("  ROI: {}", roi);
    }
    match config.coordinate_space() {
        CoordinateSpace::Image => println!("  ROI Space: image pixels"),
        CoordinateSpace::Canvas { zoom } => println!("  ROI Space: canvas (zoom {:.2})", zoom),
    }
    println!("  Length: {} units", config.length());
    println!("  Smoothing Window: {}", config.smoothing_window());

    let t = config.thresholds();
    println!(
        "  Thresholds: R² < {}, |slope| < {} dB/unit, noise > {}, saturation ≥ {}",
        t.r_squared_min, t.slope_near_zero, t.noise_ratio, t.saturation_sum
    );

    let formats: Vec<String> = config.output_formats().iter().map(|f| f.to_string()).collect();
    println!("  Output: {} ({})", config.output_path(), formats.join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
