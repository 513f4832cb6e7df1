use anyhow::{bail, Context, Result};
use chichewa_text2sql_db::{
    cli::{Cli, Commands},
    config::LoaderConfig,
    filter::resolve_tables,
    parser::read_records,
    schema::{get_table, table_names},
    ui::{LogUi, Ui, UiApp},
    writer::{load_directory, LoadSummary, SqliteStore},
};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let tui = matches!(cli.command, Commands::Load { tui: true, .. });

    // The TUI owns the terminal, so logging stays quiet unless RUST_LOG asks otherwise
    let default_filter = if tui { "off" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = LoaderConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Reset { db } => {
            let db_path = config.resolve_database(db)?;
            let mut store = SqliteStore::open(&db_path)?;
            store.reset_schema()?;
            store.finalize()?;
            log::info!("Reset {} tables in {:?}", table_names().len(), db_path);
        }

        Commands::Load {
            input_dir,
            db,
            include,
            exclude,
            policy,
            append,
            tui,
        } => {
            let start = Instant::now();
            let input_dir = config.resolve_input_dir(input_dir)?;
            let db_path = config.resolve_database(db)?;
            let policy = config.resolve_policy(policy);

            // Resolve table filters
            let (include, exclude) = config.resolve_filters(include, exclude);
            let tables = resolve_tables(include, exclude)?;

            let summary = if tui {
                let mut ui = UiApp::new()?;
                ui.set_info(format!("{:?} -> {:?}", input_dir, db_path));
                match load_directory(&input_dir, &db_path, &tables, policy, !append, &mut ui) {
                    Ok(summary) => {
                        ui.finish(&summary_line(&summary, start))?;
                        summary
                    }
                    Err(e) => {
                        ui.restore()?;
                        return Err(e);
                    }
                }
            } else {
                let mut ui = LogUi::new();
                let summary = load_directory(&input_dir, &db_path, &tables, policy, !append, &mut ui)?;
                log::info!("{}", summary_line(&summary, start));
                summary
            };

            for rejected in summary.reports.iter().flat_map(|r| &r.rejected) {
                println!("rejected: {}", rejected);
            }
            println!(
                "Loaded {:?}: {} records, {} rejected",
                db_path,
                summary.total_inserted(),
                summary.total_rejected()
            );
        }

        Commands::Reload {
            table,
            file,
            db,
            policy,
        } => {
            if get_table(&table).is_none() {
                bail!("Unknown table: {}", table);
            }
            let db_path = config.resolve_database(db)?;
            let policy = config.resolve_policy(policy);

            let records = read_records(&file)?;
            let mut store = SqliteStore::open(&db_path)?;
            let report = store
                .reload_table(&table, &records, policy)
                .with_context(|| format!("Failed to reload {} from {:?}", table, file))?;
            store.finalize()?;

            for rejected in &report.rejected {
                println!("rejected: {}", rejected);
            }
            println!(
                "Reloaded {}: {} records, {} rejected",
                table,
                report.inserted,
                report.rejected.len()
            );
        }

        Commands::Inspect { db } => {
            let db_path = config.resolve_database(db)?;
            if !db_path.exists() {
                bail!("Database not found: {:?}", db_path);
            }
            let store = SqliteStore::open_read_only(&db_path)?;

            for info in store.inspect()? {
                println!("\n=== {} ({} rows) ===", info.name.to_uppercase(), info.row_count);
                for (name, col_type) in &info.columns {
                    println!("  {} ({})", name, col_type);
                }
                println!("  indexes: {}", info.indexes.join(", "));
                if let Some(sample) = &info.sample {
                    let values: Vec<String> = sample.values.iter().take(5).map(|v| v.to_string()).collect();
                    println!("  sample #{}: {}...", sample.id, values.join(", "));
                }
            }
        }

        Commands::ListTables => {
            println!("Available tables:\n");
            for name in table_names() {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

fn summary_line(summary: &LoadSummary, start: Instant) -> String {
    let mut line = format!(
        "{} records loaded into {} tables ({} rejected) in {:.1}s",
        summary.total_inserted(),
        summary.reports.len(),
        summary.total_rejected(),
        start.elapsed().as_secs_f64()
    );
    if summary.stopped {
        line.push_str(", stopped early");
    }
    line
}
