//! Plain-text rendering of search results for chat replies.

use std::fmt::Write;

use crate::models::ResumeRecord;
use crate::search::SearchOutcome;

const MISSING: &str = "N/A";

pub fn format_resume(record: &ResumeRecord) -> String {
    let mut out = format!("Resume: {}\n", record.source_url);

    if let Some(salary) = &record.salary_expectation {
        let _ = writeln!(out, "Salary expectation: {salary}");
    }

    if !record.experience.is_empty() {
        out.push_str("Experience/Education:\n");
        for entry in &record.experience {
            let _ = writeln!(out, "    Position: {}", entry.position.as_deref().unwrap_or(MISSING));
            let _ = writeln!(out, "    Duration: {}", entry.duration.as_deref().unwrap_or(MISSING));
            let _ = writeln!(out, "    Details: {}\n", entry.details.as_deref().unwrap_or(MISSING));
        }
    }

    let _ = writeln!(out, "Resume filling percentage: {}%", record.filling_percentage);
    out
}

/// "Found N resumes" header, the ranked records, and a note on sources that failed.
pub fn format_results(outcome: &SearchOutcome) -> String {
    let mut out = format!("Found {} resumes\n", outcome.total_found);

    if !outcome.resumes.is_empty() {
        let _ = writeln!(out, "You can see top {} below:", outcome.resumes.len());
        let rendered: Vec<String> = outcome.resumes.iter().map(format_resume).collect();
        out.push_str(&rendered.join("\n"));
    }

    if !outcome.failures.is_empty() {
        let names: Vec<&str> = outcome.failures.iter().map(|f| f.source.as_str()).collect();
        let _ = writeln!(out, "Not searched (unavailable): {}", names.join(", "));
    }

    out
}
