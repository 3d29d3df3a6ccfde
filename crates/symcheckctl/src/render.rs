//! Report rendering for the terminal

use std::io::{self, Write};

use owo_colors::OwoColorize;
use symcheck_common::report::SymptomEntry;
use symcheck_common::{RankedSymptom, Report};

fn labels(entries: &[SymptomEntry]) -> String {
    if entries.is_empty() {
        return "none".to_string();
    }
    entries
        .iter()
        .map(|e| e.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_report<W: Write>(report: &Report, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Symptom check summary".bright_white().bold())?;
    writeln!(out, "   {} {}", "Confirmed:".dimmed(), labels(&report.confirmed))?;
    writeln!(out, "   {} {}", "Excluded: ".dimmed(), labels(&report.excluded))?;
    if !report.unsure.is_empty() {
        writeln!(out, "   {} {}", "Not sure: ".dimmed(), labels(&report.unsure))?;
    }
    writeln!(out, "   {} {}", "Questions:".dimmed(), report.questions_asked)?;
    writeln!(out)?;

    if report.decisions.is_empty() {
        writeln!(out, "   {}", "No condition was reviewed.".dimmed())?;
    }
    for decision in &report.decisions {
        if decision.accepted {
            write!(out, "   {}  {}", "+".bright_green(), decision.disease.label.bright_white().bold())?;
        } else {
            write!(out, "   {}  {}", "-".dimmed(), decision.disease.label.dimmed())?;
        }
        if let Some(severity) = decision.severity {
            if severity.is_critical() {
                write!(out, "  {}", severity.prompt_label().bright_red().bold())?;
            } else {
                write!(out, "  {}", severity.prompt_label().yellow())?;
            }
        }
        writeln!(out)?;
    }

    if report.accepted().next().is_some() {
        writeln!(out)?;
        writeln!(
            out,
            "   {}",
            "This is not a diagnosis. Please consult a medical professional.".dimmed()
        )?;
    }
    Ok(())
}

/// Ranked symptoms as a numbered table, highest score first.
pub fn render_ranking<W: Write>(
    ranking: &[RankedSymptom],
    label_of: impl Fn(&RankedSymptom) -> String,
    out: &mut W,
) -> io::Result<()> {
    if ranking.is_empty() {
        return writeln!(out, "   {}", "No open symptom left to ask about.".dimmed());
    }
    for (i, ranked) in ranking.iter().enumerate() {
        writeln!(
            out,
            "   {}  {:.4}  {}",
            format!("[{}]", i + 1).cyan(),
            ranked.score,
            label_of(ranked)
        )?;
    }
    Ok(())
}
