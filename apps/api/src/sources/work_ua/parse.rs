//! HTML extraction for work.ua listing and resume pages.
//!
//! Everything here is pure: strings in, structured values out.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::models::resume::{normalize_text, ExperienceEntry, ResumeRecord};
use crate::ranking::completeness::{self, StopWords};

const WORK_EXPERIENCE_HEADING: &str = "Work experience";
const SALARY_MARKER: &str = "salary starting at";
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

macro_rules! selector {
    ($css:expr) => {{
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        SELECTOR.get_or_init(|| Selector::parse($css).expect("valid CSS selector"))
    }};
}

/// Total candidates announced on a results page ("1234 candidates").
pub fn parse_total_candidates(html: &str) -> Option<u64> {
    static COUNT: OnceLock<Regex> = OnceLock::new();
    let count = COUNT.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s+candidates?\b").expect("valid candidate count regex")
    });

    let text = visible_text(&Html::parse_document(html));
    count
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One detail-page link per resume card, in page order.
pub fn extract_resume_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector!("div.card.resume-link"))
        .filter_map(|card| card.select(selector!("a[href]")).next())
        .filter_map(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a resume detail page.
///
/// Missing salary or experience sections are not errors. Only a page without any
/// visible text is rejected, since there is nothing to score.
pub fn parse_resume_page(
    html: &str,
    source_url: String,
    stop_words: &StopWords,
) -> Result<ResumeRecord, String> {
    let document = Html::parse_document(html);

    let text = visible_text(&document);
    if text.is_empty() {
        return Err(format!("{source_url}: page has no visible text"));
    }

    Ok(ResumeRecord::new(
        source_url,
        extract_salary(&document),
        extract_experience(&document),
        i64::from(completeness::score_with(&text, stop_words)),
    ))
}

/// Text nodes outside hidden elements, each trimmed, joined with single spaces.
pub fn visible_text(document: &Html) -> String {
    let root = document.root_element();
    let mut pieces: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed);
        }
    }

    pieces.join(" ")
}

fn extract_salary(document: &Html) -> Option<String> {
    let content = document
        .select(selector!(r#"meta[name="Description"], meta[name="description"]"#))
        .find_map(|meta| meta.value().attr("content"))?;

    if !content.contains(SALARY_MARKER) {
        return None;
    }
    content
        .rsplit(SALARY_MARKER)
        .next()
        .and_then(|tail| tail.split_whitespace().next())
        .and_then(normalize_text)
}

fn extract_experience(document: &Html) -> Vec<ExperienceEntry> {
    let Some(heading) = document
        .select(selector!("h2"))
        .find(|h2| element_text(h2) == WORK_EXPERIENCE_HEADING)
    else {
        return Vec::new();
    };

    let siblings: Vec<ElementRef> = heading.next_siblings().filter_map(ElementRef::wrap).collect();
    let mut entries = Vec::new();

    for (i, sibling) in siblings.iter().enumerate() {
        if !is_role_heading(sibling) {
            continue;
        }

        let details_tag = siblings[i + 1..]
            .iter()
            .take_while(|next| !is_role_heading(next))
            .find(|next| next.value().name() == "p" && has_class(next, "mb-0"));

        let (duration, details) = match details_tag {
            Some(p) => role_details(p),
            None => (None, None),
        };

        entries.push(ExperienceEntry {
            position: normalize_text(&element_text(sibling)),
            duration,
            details,
        });
    }

    entries
}

fn role_details(paragraph: &ElementRef) -> (Option<String>, Option<String>) {
    let duration = paragraph
        .select(selector!("span.text-default-7"))
        .next()
        .and_then(|span| normalize_text(&span.text().collect::<String>()));

    let mut details = joined_text(paragraph).replace('\u{a0}', " ");
    if let Some(duration) = &duration {
        details = details.replace(duration.as_str(), "");
    }
    let details = details.trim_matches(|c: char| c.is_whitespace() || c == ',');

    (duration, normalize_text(details))
}

fn is_role_heading(element: &ElementRef) -> bool {
    element.value().name() == "h2" && has_class(element, "h4")
}

fn has_class(element: &ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn joined_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
