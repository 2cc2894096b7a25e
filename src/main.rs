use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
use wheretopublish::cli::{self, Args};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use wheretopublish::{
    merge, render, AppConfig, CacheManager, CategoryFilter, Column,
    ConfigManager, PreferenceStore, Session, APP_NAME,
};

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = if debug {
        EnvFilter::new(format!("{APP_NAME}={default_level}"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Push the filter, sort and column flags into the session.
fn apply_args(session: &mut Session, args: &Args) -> Result<()> {
    if args.reset_columns {
        session.reset_columns();
    }
    if let Some(columns) = cli::column_set(args)? {
        session.set_columns(columns);
    }
    if let Some(order) = cli::sort_order(args)? {
        session.set_sort(Some(order));
    }
    if let Some(search) = &args.search {
        session.set_text_query(search);
    }
    if let Some(choice) = args.publisher_type {
        session.set_category_filter(CategoryFilter::PublisherType(choice.into()));
    }
    if let Some(choice) = args.business_model {
        session.set_category_filter(CategoryFilter::BusinessModel(choice.into()));
    }
    if let Some(field) = &args.field {
        session.set_field_filter(Some(field));
    }
    let value_filters = [
        (Column::Country, &args.country),
        (Column::InstitutionType, &args.institution_type),
        (Column::PciPartner, &args.pci_partner),
    ];
    for (column, value) in value_filters {
        if let Some(value) = value {
            session.set_column_filter(column, Some(value));
        }
    }
    match (args.apc_min, args.apc_max) {
        (Some(min), Some(max)) => session.set_apc_range(min, max),
        (Some(min), None) => session.set_apc_min(min),
        (None, Some(max)) => session.set_apc_max(max),
        (None, None) => {}
    }
    Ok(())
}

fn list_sources(config: &AppConfig) {
    for source in &config.data.sources {
        let marker = if source.id == config.data.default_source {
            " (default)"
        } else {
            ""
        };
        println!("{:<28} {}{}", source.id, source.label, marker);
    }
}

fn build_all(output: &Path, args: &Args, config: &AppConfig) -> Result<()> {
    let records = merge::build_from_catalog(&config.data, args.compression)?;
    let file = File::create(output)?;
    merge::write_records(&records, BufWriter::new(file))?;
    println!("Wrote {} journals to {}", records.len(), output.display());
    Ok(())
}

fn run(args: &Args, config: AppConfig) -> Result<()> {
    if args.list_sources {
        list_sources(&config);
        return Ok(());
    }
    if let Some(output) = &args.build_all {
        return build_all(output, args, &config);
    }

    let store = PreferenceStore::new(CacheManager::new(APP_NAME)?, &config.preferences);
    let mut session = Session::new(config).with_compression(args.compression);

    if let Some(snapshot) = store.load() {
        session.restore(&snapshot);
    }
    apply_args(&mut session, args)?;

    let source = session.resolve(args.source.as_deref());
    session.load_dataset(source);

    if let Some(status) = session.status_message() {
        eprintln!("Warning: {}", status);
    }
    if let Some(notice) = cli::business_model_notice(args, &session) {
        eprintln!("Warning: {}", notice);
    }

    let rows = session.visible_rows();
    let total = rows.len();
    if rows.is_empty() {
        println!("{}", session.empty_message());
    } else {
        let shown = &rows[..args.limit.unwrap_or(total).min(total)];
        print!("{}", render::table(shown, session.columns()));
        println!();
        println!(
            "Showing {} of {} journals ({} in dataset)",
            shown.len(),
            total,
            session.dataset().rows.len()
        );
    }

    if args.histogram {
        println!();
        print!("{}", render::histogram(&session.histogram()));
    }
    if args.counts {
        println!();
        print!(
            "{}",
            render::counts(&session.category_counts(), session.filters())
        );
    }

    if !args.no_save {
        store.save(&session.snapshot());
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                match cache.clear_all() {
                    Ok(removed) => println!("Cache cleared successfully ({} files)", removed),
                    Err(e) => {
                        eprintln!("Error clearing cache: {}", e);
                        std::process::exit(1);
                    }
                }
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(manager) => match manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Wrote default configuration to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing config: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = AppConfig::load(APP_NAME)?;
    init_tracing(args.debug || config.debug.enabled);

    if let Err(e) = run(&args, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
