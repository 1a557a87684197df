//! Best-effort extraction of structured artifacts from model replies.
//!
//! Nothing here fails: malformed or missing sections simply produce empty
//! results or default scores.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, trace};

use labrat_core::{defaults, CellType, CodeCell, ExtractedArtifacts, ReasoningSection};

/// Fenced block: info string (language) and body.
static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+.#-]*)[^\n]*\n(.*?)```").expect("valid fence regex")
});

/// Optional range marker directly after a score label, e.g. ` (1-10):`.
static RANGE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s*_:]*\(?\s*1\s*[-–]\s*10\s*\)?").expect("valid range regex")
});

/// Score value after separators, with an optional `/10` suffix.
static SCORE_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s*_:=\-–]*(\d{1,3})(?:\s*/\s*10)?").expect("valid score regex")
});

static THINKING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<thinking>(.*?)</thinking>").expect("valid thinking regex")
});

static AFFIRMATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bYES\b").expect("valid affirmative regex"));

/// Section titles recognized as reasoning, longest first.
const REASONING_TITLES: &[&str] = &[
    "detailed reasoning process",
    "reasoning process",
    "code conversion assessment",
    "feasibility assessment",
    "step-by-step analysis",
];

/// Keywords marking a reasoning line when no titled section exists.
const REASONING_KEYWORDS: &[&str] = &[
    "step-by-step",
    "step by step",
    "feasibility",
    "assessment",
    "reasoning",
    "because",
    "therefore",
];

/// Score labels pulled out of every reply.
const SCORE_LABELS: &[&str] = &[defaults::FEASIBILITY_LABEL, defaults::CONFIDENCE_LABEL];

/// Characters of text after a label searched for its value.
const SCORE_WINDOW: usize = 48;

/// Extract code cells, scores and reasoning sections from a reply.
#[instrument(skip(text), fields(subsystem = "inference", op = "extract", response_len = text.len()))]
pub fn extract(text: &str) -> ExtractedArtifacts {
    let code_cells = extract_code_cells(text);

    let mut scores = BTreeMap::new();
    for label in SCORE_LABELS {
        if let Some(value) = find_score(text, label) {
            scores.insert(label.to_string(), value);
        }
    }

    let reasoning_sections = extract_reasoning(text);

    debug!(
        cell_count = code_cells.len(),
        score_count = scores.len(),
        section_count = reasoning_sections.len(),
        "Extracted artifacts"
    );

    ExtractedArtifacts {
        code_cells,
        scores,
        reasoning_sections,
    }
}

// =============================================================================
// CODE CELLS
// =============================================================================

/// Canonical name for a recognized code language tag.
fn canonical_language(tag: &str) -> Option<&'static str> {
    match tag.to_ascii_lowercase().as_str() {
        "python" | "py" | "python3" => Some("python"),
        "sql" => Some("sql"),
        "r" => Some("r"),
        "javascript" | "js" => Some("javascript"),
        "bash" | "sh" | "shell" => Some("bash"),
        _ => None,
    }
}

/// Split a leading comment line off a code block body.
fn split_description(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim_matches(|c| c == '\n' || c == '\r');
    let (first, rest) = match trimmed.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (trimmed, ""),
    };

    let line = first.trim();
    let comment = if line.starts_with("#!") {
        None
    } else if let Some(stripped) = line.strip_prefix('#') {
        Some(stripped.trim_start_matches('#'))
    } else if let Some(stripped) = line.strip_prefix("--") {
        Some(stripped)
    } else {
        line.strip_prefix("//")
    };

    match comment {
        Some(description) => {
            let description = description.trim();
            let description = (!description.is_empty()).then(|| description.to_string());
            (description, rest.trim_end().to_string())
        }
        None => (None, trimmed.trim_end().to_string()),
    }
}

/// Fenced code blocks tagged with a recognized language, numbered from 1.
///
/// Untagged blocks, unknown languages and blocks with no code are skipped.
pub fn extract_code_cells(text: &str) -> Vec<CodeCell> {
    let mut cells = Vec::new();
    for caps in FENCE_RE.captures_iter(text) {
        let tag = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let Some(language) = canonical_language(tag) else {
            trace!(tag, "Skipping fenced block with unrecognized language");
            continue;
        };
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let (description, code) = split_description(body);
        if code.trim().is_empty() {
            continue;
        }
        cells.push(CodeCell {
            cell_type: CellType::Code,
            language: language.to_string(),
            description,
            code,
            index: cells.len() as u32 + 1,
        });
    }
    cells
}

// =============================================================================
// SCORES
// =============================================================================

/// First score following `label`, clamped to `[1, 10]`.
fn find_score(text: &str, label: &str) -> Option<u8> {
    let label_re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(label))).ok()?;

    for m in label_re.find_iter(text) {
        let tail: String = text[m.end()..].chars().take(SCORE_WINDOW).collect();
        let tail = match RANGE_PREFIX_RE.find(&tail) {
            Some(range) => &tail[range.end()..],
            None => tail.as_str(),
        };
        let Some(caps) = SCORE_VALUE_RE.captures(tail) else {
            continue;
        };
        if let Ok(value) = caps[1].parse::<u32>() {
            let clamped = value.clamp(defaults::MIN_SCORE as u32, defaults::MAX_SCORE as u32);
            return Some(clamped as u8);
        }
    }
    None
}

/// Score following `label`, or the neutral default of 5.
pub fn extract_score(text: &str, label: &str) -> u8 {
    find_score(text, label).unwrap_or(defaults::DEFAULT_SCORE)
}

/// Whether the reply recommends converting the drawing to code.
///
/// Requires both the affirmative `YES` token and a feasibility score of at
/// least 6.
pub fn conversion_recommended(text: &str, feasibility_score: u8) -> bool {
    AFFIRMATIVE_RE.is_match(text) && feasibility_score >= defaults::CONVERSION_THRESHOLD
}

// =============================================================================
// REASONING
// =============================================================================

/// Strip markdown heading decoration from a line.
fn heading_text(line: &str) -> &str {
    line.trim()
        .trim_start_matches('#')
        .trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace())
}

/// Known reasoning title at the start of `line`, with any inline text after
/// a colon.
fn match_reasoning_title(line: &str) -> Option<(String, String)> {
    let cleaned = heading_text(line);
    let lower = cleaned.to_lowercase();
    let lower = lower.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ');
    REASONING_TITLES.iter().find(|title| lower.starts_with(**title))?;

    let (heading, inline) = match cleaned.split_once(':') {
        Some((heading, inline)) => (heading, inline),
        None => (cleaned, ""),
    };
    let heading = heading.trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
    let inline = inline.trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
    Some((heading.to_string(), inline.to_string()))
}

fn is_markdown_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') && trimmed.trim_start_matches('#').starts_with(' ')
}

fn push_section(sections: &mut Vec<ReasoningSection>, heading: String, lines: &[String]) {
    let text = lines.join("\n").trim().to_string();
    if !text.is_empty() {
        sections.push(ReasoningSection { heading, text });
    }
}

/// Titled reasoning sections, `<thinking>` blocks, or a keyword fallback.
pub fn extract_reasoning(text: &str) -> Vec<ReasoningSection> {
    let mut sections = Vec::new();

    for caps in THINKING_RE.captures_iter(text) {
        let thought = caps[1].trim();
        if !thought.is_empty() {
            sections.push(ReasoningSection {
                heading: "Thinking".to_string(),
                text: thought.to_string(),
            });
        }
    }
    let without_thinking = THINKING_RE.replace_all(text, "");

    let mut current: Option<(String, Vec<String>)> = None;
    let mut in_fence = false;
    let mut titled = 0usize;

    for line in without_thinking.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        let title = if in_fence { None } else { match_reasoning_title(line) };
        if let Some((heading, inline)) = title {
            if let Some((prev_heading, prev_lines)) = current.take() {
                push_section(&mut sections, prev_heading, &prev_lines);
            }
            let mut lines = Vec::new();
            if !inline.is_empty() {
                lines.push(inline);
            }
            titled += 1;
            current = Some((heading, lines));
            continue;
        }

        if !in_fence && is_markdown_heading(line) {
            if let Some((prev_heading, prev_lines)) = current.take() {
                push_section(&mut sections, prev_heading, &prev_lines);
            }
            continue;
        }

        if let Some((_, lines)) = current.as_mut() {
            lines.push(line.to_string());
        }
    }
    if let Some((heading, lines)) = current.take() {
        push_section(&mut sections, heading, &lines);
    }

    if !sections.is_empty() || titled > 0 {
        return sections;
    }

    let keyword_lines: Vec<String> = {
        let mut in_fence = false;
        without_thinking
            .lines()
            .filter(|line| {
                if line.trim_start().starts_with("```") {
                    in_fence = !in_fence;
                    return false;
                }
                if in_fence {
                    return false;
                }
                let lower = line.to_lowercase();
                REASONING_KEYWORDS.iter().any(|k| lower.contains(k))
            })
            .map(|line| line.trim().to_string())
            .collect()
    };

    push_section(&mut sections, "Reasoning".to_string(), &keyword_lines);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_python_block_with_description() {
        let cells = extract_code_cells("```python\n# Load data\nimport pandas\n```");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].description.as_deref(), Some("Load data"));
        assert_eq!(cells[0].code, "import pandas");
        assert_eq!(cells[0].index, 1);
        assert_eq!(cells[0].language, "python");
        assert_eq!(cells[0].cell_type, CellType::Code);
    }

    #[test]
    fn test_no_fenced_blocks_yields_no_cells() {
        assert!(extract_code_cells("Think about what the slope means.").is_empty());
    }

    #[test]
    fn test_untagged_and_unknown_blocks_skipped() {
        let text = "```\nplain\n```\n```haskell\nmain = pure ()\n```\n```sql\n-- Count rows\nSELECT COUNT(*) FROM t;\n```";
        let cells = extract_code_cells(text);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].language, "sql");
        assert_eq!(cells[0].description.as_deref(), Some("Count rows"));
        assert_eq!(cells[0].index, 1);
    }

    #[test]
    fn test_cells_numbered_in_order_with_aliases() {
        let text = "Intro\n```py\nx = 1\n```\nthen\n```js\n// Plot\nplot(x)\n```\n```R\nsummary(df)\n```";
        let cells = extract_code_cells(text);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].language, "python");
        assert!(cells[0].description.is_none());
        assert_eq!(cells[0].code, "x = 1");
        assert_eq!(cells[1].language, "javascript");
        assert_eq!(cells[1].description.as_deref(), Some("Plot"));
        assert_eq!(cells[2].language, "r");
        let indices: Vec<u32> = cells.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_shebang_is_code_not_description() {
        let cells = extract_code_cells("```bash\n#!/bin/bash\necho hi\n```");
        assert_eq!(cells.len(), 1);
        assert!(cells[0].description.is_none());
        assert_eq!(cells[0].code, "#!/bin/bash\necho hi");
    }

    #[test]
    fn test_comment_only_block_skipped() {
        assert!(extract_code_cells("```python\n# nothing here\n```").is_empty());
    }

    #[test]
    fn test_score_with_range_marker() {
        assert_eq!(extract_score("Feasibility Score (1-10): 8", "feasibility score"), 8);
    }

    #[test]
    fn test_score_missing_defaults_to_five() {
        assert_eq!(extract_score("No scores here.", "feasibility score"), 5);
    }

    #[test]
    fn test_score_case_insensitive_with_suffix_and_bold() {
        assert_eq!(extract_score("**feasibility score:** 7/10", "feasibility score"), 7);
        assert_eq!(extract_score("CONFIDENCE LEVEL - 9", "confidence level"), 9);
    }

    #[test]
    fn test_score_clamped() {
        assert_eq!(extract_score("Feasibility Score: 42", "feasibility score"), 10);
        assert_eq!(extract_score("Feasibility Score: 0", "feasibility score"), 1);
    }

    #[test]
    fn test_score_first_match_wins() {
        let text = "Feasibility Score: 3\nLater: Feasibility Score: 9";
        assert_eq!(extract_score(text, "feasibility score"), 3);
    }

    #[test]
    fn test_range_marker_alone_is_not_a_score() {
        let text = "Feasibility Score (1-10): <integer>\nFeasibility Score: 6";
        assert_eq!(extract_score(text, "feasibility score"), 6);
    }

    #[test]
    fn test_conversion_requires_yes_and_threshold() {
        assert!(conversion_recommended("Convertible: YES", 7));
        assert!(!conversion_recommended("Convertible: YES", 4));
        assert!(!conversion_recommended("Convertible: NO", 9));
        assert!(!conversion_recommended("yesterday we tried", 9));
        assert!(conversion_recommended("YES", 6));
    }

    #[test]
    fn test_titled_reasoning_sections() {
        let text = "## Drawing Description\nA line.\n\n## Detailed Reasoning Process\nFirst I saw a line.\nIt has slope 2.\n\n## Code Conversion Assessment\nYES, it converts.\n\n## Suggested Notebook Cells\n```python\n# Reasoning process\nx = 1\n```";
        let sections = extract_reasoning(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "Detailed Reasoning Process");
        assert_eq!(sections[0].text, "First I saw a line.\nIt has slope 2.");
        assert_eq!(sections[1].heading, "Code Conversion Assessment");
        assert_eq!(sections[1].text, "YES, it converts.");
    }

    #[test]
    fn test_bold_heading_with_inline_text() {
        let text = "**Feasibility Assessment:** Straightforward linear model.\nNeeds data.";
        let sections = extract_reasoning(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Feasibility Assessment");
        assert!(sections[0].text.starts_with("Straightforward linear model."));
        assert!(sections[0].text.ends_with("Needs data."));
    }

    #[test]
    fn test_thinking_block_captured() {
        let text = "<thinking>The axes are time and distance.</thinking>\nThe graph shows motion.";
        let sections = extract_reasoning(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Thinking");
        assert_eq!(sections[0].text, "The axes are time and distance.");
    }

    #[test]
    fn test_keyword_fallback() {
        let text = "The drawing shows a parabola.\nStep by step, find the vertex.\nThe feasibility is high because data exists.\nGood luck!";
        let sections = extract_reasoning(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Reasoning");
        assert_eq!(
            sections[0].text,
            "Step by step, find the vertex.\nThe feasibility is high because data exists."
        );
    }

    #[test]
    fn test_no_reasoning_yields_empty() {
        assert!(extract_reasoning("Nice drawing of a cat.").is_empty());
    }

    #[test]
    fn test_extract_collects_everything() {
        let text = "## Code Conversion Assessment\nYES\n\nFeasibility Score (1-10): 8\nConfidence Level (1-10): 6\n\n## Suggested Notebook Cells\n```python\n# Load data\nimport pandas\n```";
        let artifacts = extract(text);
        assert_eq!(artifacts.code_cells.len(), 1);
        assert_eq!(artifacts.feasibility_score(), 8);
        assert_eq!(artifacts.confidence_score(), 6);
        assert_eq!(artifacts.reasoning_sections.len(), 1);
        assert!(conversion_recommended(text, artifacts.feasibility_score()));
    }
}
