//! Display utilities for the CLI

use accord_negotiation::{NegotiationOutcome, Proposal};
use colored::*;

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a labeled value
pub fn labeled(label: &str, value: &str) {
    println!("  {}: {}", label.bright_white(), value.bright_cyan());
}

fn proposal_line(label: &str, proposal: &Proposal) {
    println!(
        "    {:8} ${:<10} {:>3}%  {}",
        label.bright_white(),
        proposal.licensing_cost.to_string().bright_cyan(),
        proposal.royalties_percent,
        proposal.rationale.bright_black()
    );
}

/// Print every round of a negotiation
pub fn transcript(outcome: &NegotiationOutcome) {
    section("Rounds");
    for record in &outcome.transcript.rounds {
        let marker = if record.converged {
            "converged".bright_green()
        } else {
            "apart".yellow()
        };
        println!("  Round {} ({})", record.round, marker);
        proposal_line("Agent A", &record.role_a);
        proposal_line("Agent B", &record.role_b);
    }
}

/// Print the final settlement
pub fn settlement(outcome: &NegotiationOutcome) {
    section("Settlement");
    labeled(
        "Licensing Cost",
        &format!("${}", outcome.settlement.licensing_cost),
    );
    labeled(
        "Royalties",
        &format!("{}%", outcome.settlement.royalties_percent),
    );
    labeled("Rounds", &outcome.rounds.to_string());
    if outcome.converged {
        success("Roles converged within tolerance");
    } else {
        warning("Round budget exhausted; best-effort average of the last offers");
    }
}
