use std::io::{self, Write};

use airq_core::{Report, Severity, model::CONCENTRATION_UNIT};

use crate::term::dot;

// Width of the longest pollutant label.
const LABEL_WIDTH: usize = 23;

/// Print the full report: header, AQI line, one row per pollutant, legend.
pub fn render<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    let overall = report.aqi.severity();

    writeln!(out, "Air quality in {} {}", report.point.resolved_name, dot(overall))?;
    writeln!(out)?;
    writeln!(out, "\tAQI {} ({})", report.aqi.value(), overall.label())?;
    writeln!(out)?;

    for reading in &report.readings {
        writeln!(
            out,
            "\t{:<width$}\t{} {:.2} {CONCENTRATION_UNIT}",
            reading.kind.label(),
            dot(reading.severity()),
            reading.value,
            width = LABEL_WIDTH,
        )?;
    }

    writeln!(out)?;
    render_legend(out)?;
    out.flush()
}

fn render_legend<W: Write>(out: &mut W) -> io::Result<()> {
    let entries: Vec<_> = Severity::ALL
        .iter()
        .map(|s| format!("{} {}", dot(*s), s.label()))
        .collect();
    writeln!(out, "\t{}", entries.join("  "))
}
