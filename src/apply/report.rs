//! Literal report rendering.
//!
//! The report format is a contract: one header line per issue, one line per
//! assignee action, optionally a FALLBACK line. Failed mutations render an
//! ERROR line on the error stream instead of their action line.
//!
//! ```text
//! -> octocat/hello-world#7 (https://github.com/octocat/hello-world/issues/7)
//!    = bob
//!    + alice
//!    FALLBACK: added label "need-triage"
//! ```

use std::io::{self, Write};

use super::{ApplyReport, FallbackOutcome};

/// Renders one issue's report: action lines to `out`, error lines to `err`.
pub fn render<W: Write, E: Write>(
    report: &ApplyReport,
    out: &mut W,
    err: &mut E,
) -> io::Result<()> {
    writeln!(out, "-> {}{} ({})", report.repo, report.number, report.url)?;

    for outcome in &report.outcomes {
        if outcome.applied {
            writeln!(out, "   {} {}", outcome.action.sign(), outcome.username)?;
        } else {
            writeln!(
                err,
                "   ERROR: Could not update issue {}{}",
                report.repo, report.number
            )?;
        }
    }

    match &report.fallback {
        FallbackOutcome::None => {}
        FallbackOutcome::AlreadyPresent { label } => {
            writeln!(out, "   FALLBACK: already has label \"{}\"", label)?;
        }
        FallbackOutcome::Applied { label, ok } => {
            if !*ok {
                writeln!(
                    err,
                    "   ERROR: Could not update issue {}{}",
                    report.repo, report.number
                )?;
            }
            writeln!(out, "   FALLBACK: added label \"{}\"", label)?;
        }
    }

    Ok(())
}

/// Renders to the process stdout/stderr, ignoring stream errors.
pub fn print(report: &ApplyReport) {
    let _ = render(report, &mut io::stdout().lock(), &mut io::stderr().lock());
}
