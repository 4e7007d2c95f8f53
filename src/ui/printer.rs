use crate::app::RunReport;
use crate::core::models::ScanStatus;
use colored::*;

pub fn print_summary(report: &RunReport) {
    println!("\n{}", "═══════════════════════════════════════".green().bold());
    println!("{}", "Recon Run Complete".green().bold());
    println!("{}", "═══════════════════════════════════════".green().bold());

    println!("\n{}: {}", "Target".cyan().bold(), report.record.target);
    println!("{}: {}", "Run ID".cyan().bold(), report.record.run_id);
    println!("{}: {}", "HTTP".cyan().bold(), availability(report.protocols.http_available()));
    println!("{}: {}", "HTTPS".cyan().bold(), availability(report.protocols.https_available()));

    println!("\n{}", "Scans:".yellow().bold());
    for outcome in &report.outcomes {
        let status = match outcome.status {
            ScanStatus::Success => "success".green(),
            ScanStatus::Timeout => "timeout".yellow(),
            ScanStatus::Error => "error".red(),
            ScanStatus::Skipped => "skipped".dimmed(),
        };
        if outcome.status == ScanStatus::Skipped {
            println!("  • {:<12} {}", outcome.job, status);
        } else {
            println!("  • {:<12} {:<8} {}", outcome.job, status, outcome.output_path.display());
        }
    }

    if !report.retention.removed.is_empty() {
        println!(
            "\n{} {}",
            "Pruned old runs:".yellow().bold(),
            report.retention.removed.join(", ")
        );
    }
    if !report.retention.failed.is_empty() {
        println!(
            "{} {}",
            "Could not prune:".red().bold(),
            report.retention.failed.len()
        );
    }

    println!("\n{} {}", "Summary:".green(), report.summary_path.display());
    println!("{} {}", "Log:".green(), report.log_path.display());
    println!("{} {}", "Archive:".green(), report.archive_path.display());
}

fn availability(up: bool) -> ColoredString {
    if up {
        "available".green()
    } else {
        "unavailable".red()
    }
}
