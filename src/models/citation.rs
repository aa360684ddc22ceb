use crate::utils::encoding::encode_uri_component;

/// 从标注文本中提取出的引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// 去掉标注后的正文
    pub content: String,
    /// 出处（URL 或自由文本）
    pub source: String,
    /// 地区
    pub region: String,
    pub is_url: bool,
}

/// 深链接中引用正文的最大字符数
const DEEP_LINK_TEXT_CHARS: usize = 200;

impl Citation {
    /// 生成带文本片段定位的出处链接（仅当出处是 URL 时）
    ///
    /// 形如 `https://x.org/a#:~:text=...`，浏览器会高亮对应段落
    pub fn deep_link(&self) -> Option<String> {
        if !self.is_url {
            return None;
        }
        let fragment: String = self.content.chars().take(DEEP_LINK_TEXT_CHARS).collect();
        Some(format!("{}#:~:text={}", self.source, encode_uri_component(&fragment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_encodes_content() {
        let citation = Citation {
            content: "Ọjà market & trade".to_string(),
            source: "https://x.org/a".to_string(),
            region: "Lagos".to_string(),
            is_url: true,
        };
        assert_eq!(
            citation.deep_link().unwrap(),
            "https://x.org/a#:~:text=%E1%BB%8Cj%C3%A0%20market%20%26%20trade"
        );
    }

    #[test]
    fn test_no_deep_link_for_free_text_source() {
        let citation = Citation {
            content: "text".to_string(),
            source: "Oral tradition".to_string(),
            region: "General".to_string(),
            is_url: false,
        };
        assert!(citation.deep_link().is_none());
    }
}
