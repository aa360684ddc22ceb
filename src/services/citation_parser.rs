//! 引用解析服务 - 业务能力层
//!
//! 只负责把带 `(Source: …)` / `(Region: …)` 标注的文本拆成结构化引用，永不失败

use crate::models::Citation;
use regex::Regex;
use std::sync::LazyLock;

/// AI 回答中常见的引导语，展示前去掉
const LEAD_IN_PHRASES: [&str; 2] = [
    "Use this local metaphor:",
    "Use this general African wisdom:",
];

const DEFAULT_REGION: &str = "General";
const DEFAULT_SOURCE: &str = "Unknown Source";

static REGION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Region: (.*?)\)").expect("region pattern"));
static URL_SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Source: (https?://[^\s]+)\)").expect("url source pattern"));
static TEXT_SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Source: (.*?)\)").expect("text source pattern"));
static ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(Source: .*?\)|\(Region: .*?\)").expect("annotation pattern")
});

/// 解析标注文本
///
/// # 参数
/// - `raw`: 教学服务返回的 `source_data`
///
/// # 返回
/// 返回引用；没有标注时出处与地区取默认值，正文为去空白后的原文
pub fn parse_citation(raw: &str) -> Citation {
    let mut text = raw.to_string();
    for phrase in LEAD_IN_PHRASES {
        text = text.replacen(phrase, "", 1);
    }
    let text = text.trim();

    let region = REGION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let source = extract_source(text).unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let is_url = source.starts_with("http");

    let content = ANNOTATION_RE.replace_all(text, "").trim().to_string();

    Citation {
        content,
        source,
        region,
        is_url,
    }
}

/// 优先取 URL 形式的出处，其次取任意文本出处
fn extract_source(text: &str) -> Option<String> {
    if let Some(m) = URL_SOURCE_RE.captures(text).and_then(|caps| caps.get(1)) {
        let url = m.as_str();
        return Some(url.strip_suffix(')').unwrap_or(url).to_string());
    }
    TEXT_SOURCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_source_and_region() {
        let citation = parse_citation(
            "Use this local metaphor: text (Source: https://x.org/a) (Region: Lagos)",
        );
        assert_eq!(
            citation,
            Citation {
                content: "text".to_string(),
                source: "https://x.org/a".to_string(),
                region: "Lagos".to_string(),
                is_url: true,
            }
        );
    }

    #[test]
    fn test_url_with_nested_parens_loses_one_paren() {
        let citation =
            parse_citation("note (Source: https://en.wikipedia.org/wiki/A_(b_(c)))");
        assert_eq!(citation.source, "https://en.wikipedia.org/wiki/A_(b_(c)");
        assert!(citation.is_url);
    }

    #[test]
    fn test_empty_input_uses_defaults() {
        let citation = parse_citation("");
        assert_eq!(citation.content, "");
        assert_eq!(citation.source, "Unknown Source");
        assert_eq!(citation.region, "General");
        assert!(!citation.is_url);
    }

    #[test]
    fn test_plain_text_is_kept() {
        let citation = parse_citation("  The river does not flow backwards.  ");
        assert_eq!(citation.content, "The river does not flow backwards.");
        assert_eq!(citation.source, "Unknown Source");
        assert_eq!(citation.region, "General");
    }

    #[test]
    fn test_free_text_source_in_any_order() {
        let citation = parse_citation(
            "Use this general African wisdom: (Region: Sahel) Many hands (Source: Hausa proverb) make light work.",
        );
        assert_eq!(citation.source, "Hausa proverb");
        assert_eq!(citation.region, "Sahel");
        assert!(!citation.is_url);
        assert_eq!(citation.content, "Many hands  make light work.");
    }

    #[test]
    fn test_only_first_source_kept_but_all_stripped() {
        let citation = parse_citation(
            "Danfo buses (Source: Lagos Gazette) crowd the road (Source: https://news.ng/x) (Region: Lagos) (Region: Abuja)",
        );
        // URL 形式的出处优先，即使它出现在后面
        assert_eq!(citation.source, "https://news.ng/x");
        assert_eq!(citation.region, "Lagos");
        assert!(!citation.content.contains("Source:"));
        assert!(!citation.content.contains("Region:"));
        assert_eq!(citation.content, "Danfo buses  crowd the road");
    }

    #[test]
    fn test_first_text_source_wins() {
        let citation = parse_citation("x (Source: First) y (Source: Second)");
        assert_eq!(citation.source, "First");
        assert_eq!(citation.content, "x  y");
    }
}
