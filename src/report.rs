//! Console summary of an insights snapshot

use std::io::{self, Write};

use crate::insights::InsightsSnapshot;
use crate::trend::TrendSource;

/// Print the snapshot summary to stdout
pub fn print_summary(snapshot: &InsightsSnapshot) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, snapshot)?;
    out.flush()
}

/// Write the snapshot as a plain-text report
pub fn write_summary<W: Write>(out: &mut W, snapshot: &InsightsSnapshot) -> io::Result<()> {
    writeln!(out, "=== Customer Insights ===")?;
    writeln!(out, "Total customers: {}", snapshot.total_customers)?;
    writeln!(out, "Total revenue: {:.2}", snapshot.total_revenue)?;
    writeln!(out, "Average value: {:.2}", snapshot.avg_value)?;
    if let Some(top) = &snapshot.top_segment {
        writeln!(out, "Top segment: {}", top)?;
    }

    let fields = &snapshot.fields;
    writeln!(out, "\n=== Detected Fields ===")?;
    writeln!(
        out,
        "  Identifier: {}",
        fields.identifier_field.as_deref().unwrap_or("-")
    )?;
    writeln!(out, "  Amount:     {}", join_or_dash(&fields.amount_fields))?;
    writeln!(out, "  Date:       {}", join_or_dash(&fields.date_fields))?;
    writeln!(out, "  Numeric:    {}", join_or_dash(&fields.numeric_fields))?;

    writeln!(out, "\n=== Segments ({:?}) ===", snapshot.strategy)?;
    writeln!(out, "  {:<22} | {:>7} | {:>6}", "Segment", "Count", "Share")?;
    writeln!(out, "  {:-<22}-|-{:->7}-|-{:->6}", "", "", "")?;
    for share in &snapshot.segments {
        writeln!(
            out,
            "  {:<22} | {:>7} | {:>5.1}%",
            share.name, share.count, share.percentage
        )?;
    }

    let source = match snapshot.trend_source {
        TrendSource::Dates => "from dates",
        TrendSource::Synthetic => "synthetic",
    };
    writeln!(out, "\n=== Monthly Trend ({}) ===", source)?;
    for point in &snapshot.monthly_data {
        writeln!(
            out,
            "  {} | {:>6} customers | {:>12.2}",
            point.month, point.customers, point.revenue
        )?;
    }

    if let Some(quality) = &snapshot.cluster_quality {
        writeln!(out, "\n=== Cluster Quality ===")?;
        writeln!(out, "  Clusters (k): {}", quality.k)?;
        let sizes: Vec<String> = quality.sizes.iter().map(|s| s.to_string()).collect();
        writeln!(out, "  Cluster sizes: {}", sizes.join(" / "))?;
        writeln!(out, "  Within-cluster sum of squares: {:.2}", quality.inertia)?;
        writeln!(out, "  Silhouette score (sample): {:.3}", quality.silhouette)?;
    }

    Ok(())
}

fn join_or_dash(fields: &[String]) -> String {
    if fields.is_empty() {
        "-".to_string()
    } else {
        fields.join(", ")
    }
}
