//! Terminal rendering of preflight results
//!
//! Results go to stdout as a titled block of status lines and aligned
//! fields. Formatting is kept in plain functions returning `String` so the
//! layout can be checked without a terminal.

use colored::*;

use preflight_rpc::PreflightResult;
use preflight_tx::TxOutcome;
use preflight_types::{ClassifiedError, TokenAmount, VestingProgress};

/// Width of the field label column
const LABEL_WIDTH: usize = 18;

/// Header for one result block, e.g. `Simulation · transfer`
fn header(title: &str, subject: Option<&str>) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    match subject {
        Some(subject) => println!(
            " {} {} {}",
            title.bright_white().bold(),
            "·".bright_black(),
            subject.bright_white()
        ),
        None => println!(" {}", title.bright_white().bold()),
    }
    println!("{}", "━".repeat(60).bright_black());
}

fn passed(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// A classified failure: the readable message, then its code, then the
/// node's own text when it says something the message does not
fn failed(err: &ClassifiedError) {
    println!("  {} {}", "✗".bright_red(), err.message.bright_red());
    field("code", err.kind.error_code());
    if !err.raw.is_empty() && err.raw != err.message {
        field("node said", &err.raw);
    }
}

fn caution(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

fn field(label: &str, value: &str) {
    println!("    {} {}", label_cell(label).bright_black(), value.bright_cyan());
}

/// Label padded to the field column, colon included
fn label_cell(label: &str) -> String {
    format!("{:<width$}", format!("{}:", label), width = LABEL_WIDTH)
}

fn stroops(fee: impl std::fmt::Display) -> String {
    format!("{} stroops", fee)
}

/// Basis points as a percentage with two places
fn percent(bps: u32) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

/// A contract `i128` amount, scaled by `decimals` when known. Negative
/// values and unknown precision fall back to the raw integer.
fn token_amount(raw: i128, decimals: Option<u32>) -> String {
    decimals
        .and_then(|decimals| {
            let raw = u128::try_from(raw).ok()?;
            TokenAmount::new(raw, decimals).ok()
        })
        .map(|amount| amount.to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn preflight(method: &str, result: &PreflightResult) {
    header("Simulation", Some(method));
    if result.success() {
        passed("Simulation succeeded");
    } else {
        result.errors().iter().for_each(failed);
    }

    for warning in result.warnings() {
        caution(warning);
    }
    if let Some(value) = result.return_value() {
        field("returns", &format!("{:?}", value));
    }
    if let Some(resources) = result.resources() {
        field("resource fee", &stroops(resources.min_resource_fee));
        field("cpu instructions", &resources.cpu_instructions.to_string());
        field("memory bytes", &resources.memory_bytes.to_string());
    }
    if let Some(ledger) = result.latest_ledger() {
        field("ledger", &ledger.to_string());
    }
}

/// Amounts are shown with `decimals` when known, raw otherwise
pub fn vesting(progress: &VestingProgress, decimals: Option<u32>) {
    let amount = |raw: i128| token_amount(raw, decimals);

    header("Vesting", None);
    if progress.revoked {
        caution("Schedule revoked; nothing further will vest");
    }
    field("ledger", &progress.ledger.to_string());
    field("total", &amount(progress.total));
    field(
        "vested",
        &format!("{} ({})", amount(progress.vested), percent(progress.vested_bps)),
    );
    field("released", &amount(progress.released));
    field("releasable", &amount(progress.releasable));
    field("unvested", &amount(progress.unvested));
}

pub fn outcome(outcome: &TxOutcome) {
    match outcome {
        TxOutcome::Success {
            hash,
            ledger,
            fee_charged,
        } => {
            header("Transaction", Some(hash));
            passed("Included");
            if let Some(ledger) = ledger {
                field("ledger", &ledger.to_string());
            }
            if let Some(fee) = fee_charged {
                field("fee charged", &stroops(*fee));
            }
        }
        TxOutcome::Failed { hash, ledger, message } => {
            header("Transaction", Some(hash));
            println!("  {} {}", "✗".bright_red(), message.bright_red());
            if let Some(ledger) = ledger {
                field("ledger", &ledger.to_string());
            }
        }
        TxOutcome::TimedOut { hash, attempts } => {
            header("Transaction", Some(hash));
            caution(&format!(
                "No final status after {} queries; check again later",
                attempts
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_align() {
        assert_eq!(label_cell("ledger").len(), LABEL_WIDTH);
        assert_eq!(label_cell("cpu instructions"), "cpu instructions: ");
        // overlong labels are never cut
        assert_eq!(label_cell("a label wider than the column"), "a label wider than the column:");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(5_000), "50.00%");
        assert_eq!(percent(1), "0.01%");
        assert_eq!(percent(10_000), "100.00%");
    }

    #[test]
    fn test_token_amount_falls_back_to_raw() {
        assert_eq!(token_amount(15_000_000, Some(7)), "1.5");
        assert_eq!(token_amount(15_000_000, None), "15000000");
        assert_eq!(token_amount(-5, Some(7)), "-5");
        assert_eq!(token_amount(15_000_000, Some(u32::MAX)), "15000000");
    }
}
