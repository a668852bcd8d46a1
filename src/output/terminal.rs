// Colored terminal output for detection, analysis and age results.

use colored::Colorize;

use crate::service::{AgeRatingResponse, AnalysisResponse, DetectionResponse};

/// Display the yes/no detection result.
pub fn display_detection(response: &DetectionResponse) {
    if !response.success {
        display_failure(response.error.as_deref());
        return;
    }

    let verdict = if response.is_hate_speech {
        "HATE SPEECH".red().bold()
    } else {
        "not hate speech".green()
    };
    println!("Verdict: {verdict}");
    if let Some(len) = response.text_length {
        println!("{}", format!("({len} characters analyzed)").dimmed());
    }
}

/// Display a full analysis report.
pub fn display_analysis(response: &AnalysisResponse) {
    let Some(report) = response.analysis.as_ref().filter(|_| response.success) else {
        display_failure(response.error.as_deref());
        return;
    };

    println!("\n{}", "=== Hate Speech Analysis ===".bold());
    let verdict = if report.verdict {
        "HATE SPEECH".red().bold()
    } else {
        "not hate speech".green()
    };
    println!("  Verdict:    {verdict}");
    println!("  Confidence: {:.3}", report.confidence_score);

    if report.detected_categories.is_empty() {
        println!("  Signals:    {}", "none".dimmed());
    } else {
        println!("  Signals:");
        for category in &report.detected_categories {
            println!("    - {}", category.yellow());
        }
    }

    if !report.classifications.is_empty() {
        println!("\n  {:<52} {:>6}", "Category".dimmed(), "Score".dimmed());
        println!("  {}", "-".repeat(60).dimmed());
        for c in &report.classifications {
            let line = format!("  {:<52} {:>6.3}", c.category, c.confidence);
            if c.is_flagged {
                println!("{}", line.red());
            } else {
                println!("{line}");
            }
        }
    }

    if report.fallback_triggered {
        println!(
            "\n  {} {}",
            "Fallback:".yellow(),
            report
                .error_detail
                .as_deref()
                .unwrap_or("a model was unavailable")
        );
    }
    println!(
        "\n{}",
        format!(
            "engine {} at {}",
            report.engine_version,
            report.timestamp.to_rfc3339()
        )
        .dimmed()
    );
}

/// Display an age rating.
pub fn display_age(response: &AgeRatingResponse) {
    println!(
        "Recommended minimum age: {}",
        response.rating.to_string().bold()
    );
}

fn display_failure(error: Option<&str>) {
    println!(
        "{} {}",
        "Analysis failed:".red().bold(),
        error.unwrap_or("unknown error")
    );
}
