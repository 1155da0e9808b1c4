use storage_resolver::cache::{CacheConfig, CachedStorageReader};
use storage_resolver::cli::Cli;
use storage_resolver::errors::ResolveError;
use storage_resolver::layout::{known, LayoutDescriptor, LayoutFile};
use storage_resolver::logging;
use storage_resolver::onchain::{
    GenesisStorageReader, MappingKeys, ResolvedFields, ResolverConfig, StorageResolver,
};
use storage_resolver::output;

use clap::Parser;
use eyre::WrapErr;
use tracing::{info, warn};

/// Main entry point for the slot inspector
fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json)?;

    let (layout_name, layout) = load_layout(&cli)?;
    info!(layout = %layout_name, fields = layout.len(), "Loaded layout");

    let genesis = GenesisStorageReader::load(&cli.genesis)?;
    info!(path = %cli.genesis.display(), accounts = genesis.accounts().count(), "Loaded genesis");

    let mut keys = MappingKeys::new();
    for (field, key) in &cli.keys {
        if !layout.contains(field) {
            warn!(field = %field, "Key given for a field that is not in the layout");
        }
        keys.push(field.clone(), *key);
    }

    let resolver = StorageResolver::new()
        .with_config(ResolverConfig { max_array_length: cli.max_array_length });

    // Without explicit fields, resolve everything that can be resolved with the given keys
    let mut skipped = Vec::new();
    let names: Vec<String> = if cli.fields.is_empty() {
        let mut names = Vec::with_capacity(layout.len());
        for field in layout.iter() {
            match resolver.plan(&layout, &field.name, &keys) {
                Ok(_) => names.push(field.name.clone()),
                Err(ResolveError::MissingMappingKey(_)) => skipped.push(field.name.clone()),
                Err(e) => return Err(e.into()),
            }
        }
        names
    } else {
        cli.fields.clone()
    };
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    if !cli.json {
        output::print_banner(&layout_name, &cli.address, layout.len());
        output::print_source(&cli.genesis, cli.cache_size);
    }

    if cli.show_plan && !cli.json {
        println!();
        for name in &names {
            let plan = resolver
                .plan(&layout, name, &keys)
                .wrap_err_with(|| format!("cannot plan field `{name}`"))?;
            output::print_plan(name, &plan);
        }
    }

    let (resolved, stats) = if cli.cache_size == 0 {
        let resolved = resolve(&resolver, &layout, &names, &cli, &genesis, &keys)?;
        (resolved, None)
    } else {
        let reader =
            CachedStorageReader::new(genesis, CacheConfig { max_entries: cli.cache_size });
        let resolved = resolve(&resolver, &layout, &names, &cli, &reader, &keys)?;
        (resolved, Some(reader.stats()))
    };
    info!(fields = resolved.len(), skipped = skipped.len(), "Resolution complete");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resolved.to_json())?);
        return Ok(());
    }

    output::print_resolved(&resolved);
    for field in &skipped {
        output::print_skipped_mapping(field);
    }
    if let Some(stats) = stats {
        output::print_cache_stats(&stats);
    }
    output::print_done(resolved.len());
    Ok(())
}

/// Load the layout from `--layout` or `--builtin`, returning a display name with it.
fn load_layout(cli: &Cli) -> eyre::Result<(String, LayoutDescriptor)> {
    if let Some(path) = &cli.layout {
        let file = LayoutFile::load(path)?;
        let name = file.contract.clone().unwrap_or_else(|| path.display().to_string());
        let layout = file.into_descriptor().wrap_err("layout file is inconsistent")?;
        return Ok((name, layout));
    }

    let builtin = cli
        .builtin
        .ok_or_else(|| eyre::eyre!("either --layout or --builtin is required"))?;
    let layout = known::by_name(builtin.name())
        .ok_or_else(|| eyre::eyre!("no built-in layout named {}", builtin.name()))??;
    Ok((builtin.name().to_string(), layout))
}

fn resolve<R: storage_resolver::onchain::StorageReader>(
    resolver: &StorageResolver,
    layout: &LayoutDescriptor,
    names: &[&str],
    cli: &Cli,
    reader: &R,
    keys: &MappingKeys,
) -> eyre::Result<ResolvedFields> {
    resolver
        .resolve_fields(layout, names, cli.address, reader, keys)
        .wrap_err_with(|| format!("cannot resolve storage of {}", cli.address))
}
