//! Report files written after a run

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use msglog::Message;

use crate::simulate::{PhaseReport, Summary};

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// List of generated messages
pub fn write_seed_file(path: &Path, messages: &[Message]) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "Generated and stored {} messages", messages.len())?;
    for msg in messages {
        writeln!(
            out,
            "Message created: id={} time_sent={} content={}",
            msg.id, msg.time_sent, msg.content
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Per-access hit/miss lines followed by the phase totals
pub fn write_phase_report(path: &Path, policy: &str, phase: &PhaseReport) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "------> {} replacement policy", policy)?;
    writeln!(out, "{}: {} random lookups", phase.name, phase.accesses.len())?;
    for access in &phase.accesses {
        let verdict = if access.origin == "cache" { "hit" } else { "miss" };
        writeln!(out, "Message {} {} ({})", access.id, verdict, access.origin)?;
    }
    write_totals(&mut out, policy, phase)?;
    out.flush()?;
    Ok(())
}

/// Phase totals only
pub fn write_phase_totals(path: &Path, policy: &str, phase: &PhaseReport) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "------> {} replacement policy", policy)?;
    write_totals(&mut out, policy, phase)?;
    out.flush()?;
    Ok(())
}

fn write_totals(out: &mut impl Write, policy: &str, phase: &PhaseReport) -> Result<()> {
    writeln!(
        out,
        "{} {} - Accesses: {}, Hits: {}, Misses: {}, Hit Rate: {:.2}%",
        policy,
        phase.name,
        phase.accesses.len(),
        phase.hits,
        phase.misses,
        phase.hit_rate_percent()
    )?;
    Ok(())
}

/// Run summary as pretty JSON
pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    let mut out = create(path)?;
    serde_json::to_writer_pretty(&mut out, summary)
        .with_context(|| format!("writing {}", path.display()))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
