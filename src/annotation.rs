//! TMDL annotation value extraction.
//!
//! TMDL declares model metadata as `annotation <Name> = <value>` lines. A
//! value is either inline (optionally quoted), fenced with triple backticks,
//! or an indented block on the following lines. Inline values starting with
//! `[` or `{` open an indented block so multi-line JSON stays intact.

use regex::Regex;

const FENCE: &str = "```";

/// Return the value of `annotation <key> = ...` in `content`, if declared.
pub fn extract_annotation_value(content: &str, key: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r"^(\s*)annotation\s+{}\s*=\s*(.*)$",
        regex::escape(key)
    ))
    .ok()?;
    let lines: Vec<&str> = content.split('\n').map(|l| l.trim_end_matches('\r')).collect();

    let mut block: Option<usize> = None;
    let mut value_lines: Vec<String> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some(base) = block {
            let stripped = line.trim_start();
            if stripped.is_empty() {
                continue;
            }
            let indent = line.len() - stripped.len();
            if indent <= base {
                break;
            }
            value_lines.push(stripped.to_string());
            continue;
        }

        let Some(caps) = re.captures(line) else {
            continue;
        };
        let base = caps.get(1).map_or(0, |m| m.as_str().len());
        let remainder = caps.get(2).map_or("", |m| m.as_str()).trim();

        if let Some(after) = remainder.strip_prefix(FENCE) {
            return Some(read_fenced(after, &lines[i + 1..]));
        }
        if !remainder.is_empty() {
            if remainder.starts_with('[') || remainder.starts_with('{') {
                value_lines.push(remainder.to_string());
                block = Some(base);
                continue;
            }
            return Some(strip_quotes(remainder).to_string());
        }
        block = Some(base);
    }

    if value_lines.is_empty() {
        None
    } else {
        Some(value_lines.join("\n"))
    }
}

/// Accumulate a fenced value starting with the text after the opening fence.
fn read_fenced(first: &str, rest: &[&str]) -> String {
    if let Some(idx) = first.find(FENCE) {
        return first[..idx].trim().to_string();
    }
    let mut combined = first.to_string();
    for line in rest {
        if let Some(idx) = line.find(FENCE) {
            combined.push('\n');
            combined.push_str(&line[..idx]);
            return combined.trim().to_string();
        }
        combined.push('\n');
        combined.push_str(line);
    }
    combined.trim().to_string()
}

/// Remove one layer of matching single or double quotes.
fn strip_quotes(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_quoted() {
        let tmdl = "model Model\n\tannotation X = \"hello\"\n";
        assert_eq!(extract_annotation_value(tmdl, "X").as_deref(), Some("hello"));
        let tmdl = "\tannotation X = 'hi there'";
        assert_eq!(extract_annotation_value(tmdl, "X").as_deref(), Some("hi there"));
        let tmdl = "\tannotation X = plain";
        assert_eq!(extract_annotation_value(tmdl, "X").as_deref(), Some("plain"));
    }

    #[test]
    fn test_fenced_multi_line() {
        let tmdl = "model Model\n\tannotation Rules = ```\n\t\tline one\n\t\tline two\n\t\tline three\n\t\t```\n\tculture: en-US\n";
        let v = extract_annotation_value(tmdl, "Rules").unwrap();
        assert_eq!(v, "line one\n\t\tline two\n\t\tline three");
    }

    #[test]
    fn test_fenced_closed_on_same_line() {
        let tmdl = "\tannotation X = ```[1, 2]```\n";
        assert_eq!(extract_annotation_value(tmdl, "X").as_deref(), Some("[1, 2]"));
    }

    #[test]
    fn test_unterminated_fence_returns_rest() {
        let tmdl = "\tannotation X = ```\n\tabc\n";
        assert_eq!(extract_annotation_value(tmdl, "X").as_deref(), Some("abc"));
    }

    #[test]
    fn test_indented_block_stops_at_dedent() {
        let tmdl = "model Model\n\tannotation Ignore =\n\t\t{\n\n\t\t  \"RuleIDs\": [\"A\"]\n\t\t}\n\tannotation Other = 1\n";
        let v = extract_annotation_value(tmdl, "Ignore").unwrap();
        assert_eq!(v, "{\n\"RuleIDs\": [\"A\"]\n}");
    }

    #[test]
    fn test_inline_json_continues_on_indented_lines() {
        let tmdl = "\tannotation Urls = [\n\t\t\"https://a/rules.json\"\n\t\t]\nref table Sales\n";
        let v = extract_annotation_value(tmdl, "Urls").unwrap();
        let urls: Vec<String> = serde_json::from_str(&v).unwrap();
        assert_eq!(urls, vec!["https://a/rules.json"]);
    }

    #[test]
    fn test_key_not_found_and_prefix_keys_do_not_collide() {
        let tmdl = "\tannotation BestPracticeAnalyzer_IgnoreRules = {}\n";
        assert!(extract_annotation_value(tmdl, "BestPracticeAnalyzer").is_none());
        assert!(extract_annotation_value("", "X").is_none());
    }
}
