//! Human-readable corpus report

use crate::output::stats::CorpusStatistics;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE_WIDTH: usize = 80;

/// Formats statistics as the plain-text corpus report
pub fn format_text_report(stats: &CorpusStatistics) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut report = String::new();

    report.push_str(&format!("{}\nFASHION CORPUS REPORT\n{}\n\n", rule, rule));

    report.push_str("Overview:\n");
    report.push_str(&format!("  Documents: {}\n", stats.total_documents));
    report.push_str(&format!("  Words: {}\n", stats.total_words));
    report.push_str(&format!(
        "  Average document size: {:.0} words\n",
        stats.avg_words_per_doc
    ));
    report.push_str(&format!(
        "  Due for recheck: {} documents\n\n",
        stats.stale_documents
    ));

    report.push_str("Sources:\n");
    for source in &stats.sources {
        report.push_str(&format!("  {}: {} documents\n", source.source, source.count));
        report.push_str(&format!(
            "    Average size: {:.0} words (min {}, max {})\n",
            source.avg_words, source.min_words, source.max_words
        ));
    }

    report.push_str(&format!(
        "\nGenerated at {}\n{}\n",
        stats.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        rule
    ));
    report
}

/// Writes the text report to a file
pub fn write_text_report(stats: &CorpusStatistics, output_path: &Path) -> OutputResult<()> {
    let report = format_text_report(stats);

    let mut file = File::create(output_path)?;
    file.write_all(report.as_bytes())?;

    Ok(())
}

/// Prints the text report to stdout
pub fn print_report(stats: &CorpusStatistics) {
    println!("{}", format_text_report(stats));
}
