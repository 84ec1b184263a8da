//! CLI subcommand handlers.

use crate::{Commands, ConfigAction, Overrides, RunArgs};
use augmentor_core::config::{WORKSPACE_CONFIG_FILE, user_config_path};
use augmentor_core::{
    AugmentorConfig, RunReport, SqliteStore, Technique, build_augmenter, clean_collection,
    import_file, load_config, run_technique,
};
use std::path::{Path, PathBuf};

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    overrides: &Overrides,
) -> anyhow::Result<()> {
    match command {
        Commands::Import {
            file,
            collection,
            format,
        } => {
            let config = effective_config(workspace, overrides)?;
            let collection = collection.unwrap_or_else(|| config.data.raw_collection.clone());
            let store = open_store(&config)?;
            let result = import_file(
                &store,
                &file,
                &collection,
                &config.data.text_field,
                format.map(Into::into),
            )
            .await;
            close_store(store);
            let written = result?;
            println!("Imported {written} documents into '{collection}'");
            Ok(())
        }
        Commands::Clean { from, to } => {
            let config = effective_config(workspace, overrides)?;
            let from = from.unwrap_or_else(|| config.data.raw_collection.clone());
            let to = to.unwrap_or_else(|| config.data.source_collection.clone());
            let store = open_store(&config)?;
            let result = clean_collection(&store, &from, &to, &config.data.text_field).await;
            close_store(store);
            let written = result?;
            println!("Copied {written} documents from '{from}' to '{to}'");
            Ok(())
        }
        Commands::BackTranslate(args) => {
            handle_augment(Technique::BackTranslation, args, workspace, overrides).await
        }
        Commands::Contextual(args) => {
            handle_augment(Technique::ContextualReplacement, args, workspace, overrides).await
        }
        Commands::Synonym(args) => {
            handle_augment(Technique::SynonymReplacement, args, workspace, overrides).await
        }
        Commands::Random(args) => {
            handle_augment(Technique::RandomAugmentations, args, workspace, overrides).await
        }
        Commands::Config { action } => handle_config(action, workspace, overrides),
    }
}

async fn handle_augment(
    technique: Technique,
    args: RunArgs,
    workspace: &Path,
    overrides: &Overrides,
) -> anyhow::Result<()> {
    let mut config = effective_config(workspace, overrides)?;
    if args.single {
        config.set_batch_size(technique, None);
    } else if let Some(size) = args.batch_size {
        config.set_batch_size(technique, Some(size));
    }
    config.validate()?;

    let augmenter = build_augmenter(technique, &config)?;
    let store = open_store(&config)?;
    let result = run_technique(&store, augmenter.as_ref(), &config).await;
    close_store(store);
    let report = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "{}: {} records in {} batch(es), {} kept original text",
        report.technique, report.records, report.batches, report.fallbacks
    );
    println!("  collection: {}", report.collection);
    for file in &report.files {
        println!("  csv: {}", file.display());
    }
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    overrides: &Overrides,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join(WORKSPACE_CONFIG_FILE);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&AugmentorConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = effective_config(workspace, overrides)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
        ConfigAction::Path => {
            match user_config_path() {
                Some(path) => println!("user:      {}", path.display()),
                None => println!("user:      (no home directory)"),
            }
            println!(
                "workspace: {}",
                workspace.join(WORKSPACE_CONFIG_FILE).display()
            );
            Ok(())
        }
    }
}

/// Layered configuration with command-line overrides applied on top.
///
/// Relative paths from configuration files resolve against the workspace;
/// paths given on the command line are used as typed.
fn effective_config(workspace: &Path, overrides: &Overrides) -> anyhow::Result<AugmentorConfig> {
    let mut config = load_config(Some(workspace))
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    config.store.path = resolve(workspace, &config.store.path);
    config.data.output_dir = resolve(workspace, &config.data.output_dir);
    if let Some(path) = &config.synonym.thesaurus_path {
        config.synonym.thesaurus_path = Some(resolve(workspace, path));
    }

    if let Some(store) = &overrides.store {
        config.store.path = store.clone();
    }
    if let Some(dir) = &overrides.output_dir {
        config.data.output_dir = dir.clone();
    }
    if overrides.seed.is_some() {
        config.seed = overrides.seed;
    }
    if config.contextual.api_token.is_none() {
        config.contextual.api_token = std::env::var("HF_API_TOKEN").ok();
    }

    config.validate()?;
    Ok(config)
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

fn open_store(config: &AugmentorConfig) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(&config.store.path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to open store at {}: {}",
            config.store.path.display(),
            e
        )
    })
}

fn close_store(store: SqliteStore) {
    if let Err(e) = store.close() {
        tracing::warn!(error = %e, "Failed to close store cleanly");
    }
}
