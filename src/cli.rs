use crate::onchain::MappingKey;
use alloy_primitives::Address;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the slot inspector
#[derive(Parser, Debug)]
#[command(
    name = "slot-inspect",
    about = "Resolve and decode contract storage from a declared layout"
)]
pub struct Cli {
    /// Layout JSON file describing the contract's storage fields.
    #[arg(long, conflicts_with = "builtin", required_unless_present = "builtin")]
    pub layout: Option<PathBuf>,

    /// Use one of the built-in layouts instead of a layout file.
    #[arg(long, value_enum)]
    pub builtin: Option<BuiltinLayout>,

    /// Genesis JSON file whose alloc holds the contract storage.
    /// Can also be set via SLOT_INSPECT_GENESIS environment variable.
    #[arg(long, env = "SLOT_INSPECT_GENESIS")]
    pub genesis: PathBuf,

    /// Address of the contract to inspect.
    #[arg(long)]
    pub address: Address,

    /// Field to resolve (repeatable). Resolves every field when omitted;
    /// mappings without a `--key` are skipped in that case.
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Mapping key as `field=value` (repeatable). Values are 0x-prefixed hex
    /// (left-padded to 32 bytes) or decimal. Repeat for nested mappings, outermost first.
    #[arg(long = "key", value_parser = parse_key_arg)]
    pub keys: Vec<(String, MappingKey)>,

    /// Maximum number of cached storage words. Set to 0 to disable caching.
    #[arg(long, default_value = "1024")]
    pub cache_size: usize,

    /// Largest dynamic array length that will be read.
    #[arg(long, default_value = "10000")]
    pub max_array_length: u64,

    /// Print the planned slots of every resolved field.
    #[arg(long)]
    pub show_plan: bool,

    /// Print resolved values as JSON instead of colored text.
    #[arg(long)]
    pub json: bool,

    /// Enable structured JSON logging instead of human-readable output.
    #[arg(long)]
    pub log_json: bool,
}

/// Layouts compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuiltinLayout {
    /// The buy-me-a-coffee funding contract
    Coffee,
    /// The storage inspection demo contract
    Inspection,
}

impl BuiltinLayout {
    pub fn name(self) -> &'static str {
        match self {
            Self::Coffee => "coffee",
            Self::Inspection => "inspection",
        }
    }
}

/// Parse a `field=value` mapping key argument.
pub fn parse_key_arg(arg: &str) -> Result<(String, MappingKey), String> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected `field=value`, got `{arg}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{arg}`"));
    }
    let key = value
        .trim()
        .parse::<MappingKey>()
        .map_err(|e| format!("invalid key for `{field}`: {e}"))?;
    Ok((field.to_string(), key))
}
