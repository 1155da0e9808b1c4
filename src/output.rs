//! Colored console output for `slot-inspect`.
//!
//! Color scheme: blue+bold headers, cyan values, green success,
//! yellow warnings, dimmed secondary text.

use crate::cache::CacheStats;
use crate::onchain::{slot_to_word, DecodedValue, ResolvedFields, SlotPlan};
use alloy_primitives::{Address, U256};
use colored::Colorize;
use std::path::Path;

/// Arrays longer than this are elided when printed as text.
const MAX_PRINTED_ELEMENTS: usize = 8;

// ── Helpers ────────────────────────────────────────────────────────

/// Format a slot index for display.
///
/// - Declared slots (below 2^64) → decimal, e.g. `"1003"`
/// - Hash-derived slots → the full `0x`-prefixed word
pub fn format_slot(slot: U256) -> String {
    if slot.bit_len() <= 64 {
        slot.to_string()
    } else {
        slot_to_word(slot).to_string()
    }
}

/// Format a decoded value, eliding the middle of long arrays.
pub fn format_value(value: &DecodedValue) -> String {
    match value {
        DecodedValue::Array(items) if items.len() > MAX_PRINTED_ELEMENTS => {
            let head = items[..MAX_PRINTED_ELEMENTS / 2].iter().map(format_value);
            let tail = items[items.len() - MAX_PRINTED_ELEMENTS / 2..].iter().map(format_value);
            let head = head.collect::<Vec<_>>().join(", ");
            let tail = tail.collect::<Vec<_>>().join(", ");
            format!(
                "[{head}, ... {} more ..., {tail}] (len {})",
                items.len() - MAX_PRINTED_ELEMENTS,
                items.len()
            )
        }
        DecodedValue::Array(items) => {
            format!("[{}]", items.iter().map(format_value).collect::<Vec<_>>().join(", "))
        }
        other => other.to_string(),
    }
}

// ── Banner ─────────────────────────────────────────────────────────

/// Print the banner naming the layout and the contract being inspected.
pub fn print_banner(layout: &str, address: &Address, field_count: usize) {
    println!();
    println!("{}", "=== Storage Inspector ===".blue().bold());
    println!("  Layout:   {}", layout.cyan());
    println!("  Contract: {}", format!("{address}").cyan());
    println!("  Fields:   {}", field_count.to_string().cyan());
}

/// Print where storage is read from.
pub fn print_source(genesis: &Path, cache_size: usize) {
    println!("  {} {:?}", "Genesis: ".dimmed(), genesis);
    if cache_size == 0 {
        println!("  {} {}", "Cache:   ".dimmed(), "disabled".normal());
    } else {
        println!(
            "  {} {} entries",
            "Cache:   ".dimmed(),
            cache_size.to_string().cyan()
        );
    }
}

// ── Resolution ─────────────────────────────────────────────────────

/// Print every resolved field as `name = value`.
pub fn print_resolved(fields: &ResolvedFields) {
    println!();
    println!("{}", "Resolved fields:".blue().bold());
    let width = fields.iter().map(|v| v.field_name.len()).max().unwrap_or(0);
    for resolved in fields.iter() {
        println!(
            "  {:width$} = {}",
            resolved.field_name.bold(),
            format_value(&resolved.value).cyan(),
        );
    }
}

/// Print the statically known slots of a field's plan.
pub fn print_plan(field: &str, plan: &SlotPlan) {
    match plan {
        SlotPlan::Word { slot, ty, byte_offset } => println!(
            "  {} {}: slot {} offset {} ({})",
            "PLAN".dimmed(),
            field,
            format_slot(*slot).cyan(),
            byte_offset.to_string().cyan(),
            ty.to_string().dimmed(),
        ),
        SlotPlan::Fixed(items) => {
            let slots = plan.static_slots();
            let first = slots.first().copied().map(format_slot).unwrap_or_default();
            let last = slots.last().copied().map(format_slot).unwrap_or_default();
            println!(
                "  {} {}: {} elements, slots {}..={}",
                "PLAN".dimmed(),
                field,
                items.len().to_string().cyan(),
                first.cyan(),
                last.cyan(),
            );
        }
        SlotPlan::Dynamic { length_slot, data_base, .. } => println!(
            "  {} {}: length at {}, data from {}",
            "PLAN".dimmed(),
            field,
            format_slot(*length_slot).cyan(),
            format_slot(*data_base).cyan(),
        ),
    }
}

/// Print a note when a mapping was skipped because no key was supplied.
pub fn print_skipped_mapping(field: &str) {
    println!(
        "  {} {} skipped: mapping needs {}",
        "NOTE:".yellow().bold(),
        field.bold(),
        format!("--key {field}=<value>").dimmed(),
    );
}

/// Print cache counters after resolution.
pub fn print_cache_stats(stats: &CacheStats) {
    println!();
    println!(
        "  {} {} reads, {} hits ({:.0}%)",
        "Cache:".dimmed(),
        (stats.hits + stats.misses).to_string().cyan(),
        stats.hits.to_string().cyan(),
        stats.hit_rate() * 100.0,
    );
}

/// Print a success line.
pub fn print_done(count: usize) {
    println!();
    println!(
        "{} {} field(s) resolved",
        "OK".green().bold(),
        count.to_string().cyan()
    );
}
