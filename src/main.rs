use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use linkforge::generator::Template;
use linkforge::interfaces::{convert_file, ConversionReport};
use linkforge::utils::geo::GeoResolver;
use linkforge::Settings;

/// Convert VLESS/VMess/Trojan share links into a Clash/Mihomo configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// File with one share link per line
    #[arg(short, long, value_name = "FILE")]
    input: Option<String>,

    /// Clash/Mihomo template (JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    template: Option<String>,

    /// Where to write the generated configuration
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Skip geolocation lookups and label every server with the globe flag
    #[arg(long)]
    no_geo: bool,

    /// Log filter, e.g. info or debug
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match args.config.as_deref() {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path))?,
        None => Settings::default(),
    };

    if let Some(input) = &args.input {
        settings.input = input.clone();
    }
    if let Some(template) = &args.template {
        settings.template = template.clone();
    }
    if let Some(output) = &args.output {
        settings.output = output.clone();
    }
    if let Some(level) = &args.log_level {
        settings.log_level = level.clone();
    }
    if args.no_geo {
        settings.geo.enabled = false;
    }
    Ok(settings)
}

fn print_summary(settings: &Settings, report: &ConversionReport, groups: usize) {
    println!();
    println!("Configuration generated successfully!");
    println!("  File: {}", settings.output);
    println!("  Proxies: {}", report.proxies.len());
    println!("  Proxy groups: {}", groups);

    let by_type = report
        .count_by_type()
        .iter()
        .map(|(label, count)| format!("{}: {}", label, count))
        .collect::<Vec<_>>()
        .join(", ");
    println!("  By type: {}", by_type);

    let names = report.names();
    if !names.is_empty() {
        println!("  Examples:");
        for name in names.iter().take(3) {
            println!("    - {}", name);
        }
    }

    println!(
        "  Lines: {} total, {} processed, {} converted, {} failed, {} skipped, {} duplicates removed",
        report.total_lines,
        report.processed,
        report.converted,
        report.failures.len(),
        report.skipped.len(),
        report.duplicates.len()
    );
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;

    // Initialize the logger
    env_logger::init_from_env(Env::default().default_filter_or(settings.log_level.as_str()));

    if !settings.geo.enabled {
        warn!("Geolocation disabled, all servers get the fallback flag");
    }
    let mut resolver = GeoResolver::from_settings(&settings.geo);

    info!("Reading share links from {}", settings.input);
    let report = convert_file(&settings.input, &mut resolver)?;
    info!(
        "Processed {} lines, converted {}, failed {}, skipped {}, kept {}",
        report.processed,
        report.converted,
        report.failures.len(),
        report.skipped.len(),
        report.proxies.len()
    );
    if report.proxies.is_empty() {
        bail!("No valid proxies found in {}", settings.input);
    }
    if settings.geo.enabled {
        info!("Geolocation lookups issued: {}", resolver.lookups());
    }

    let mut template = Template::load(&settings.template)?;
    template.merge_proxies(&report.proxies, &settings.placeholder_prefix)?;
    template.write(&settings.output)?;

    print_summary(&settings, &report, template.group_count());
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
