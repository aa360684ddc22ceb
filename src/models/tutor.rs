use serde::{Deserialize, Serialize};

/// 教学服务返回的讲解
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorResponse {
    /// 讲解正文（可能带引用标注）
    pub response: String,
    /// 带 `(Source: …)` / `(Region: …)` 标注的本地语境原文
    #[serde(default)]
    pub source_data: String,
    /// 配图地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_aid: Option<String>,
}

impl TutorResponse {
    pub fn explanation_text(&self) -> &str {
        &self.response
    }

    pub fn source_annotation(&self) -> &str {
        &self.source_data
    }
}

/// 讲解语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Pidgin,
}

/// 展示模式，影响语言风格与朗读韵律
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Standard,
    Pidgin,
    Griot,
}

impl Mode {
    /// 标准名称
    pub fn name(self) -> &'static str {
        match self {
            Mode::Standard => "standard",
            Mode::Pidgin => "pidgin",
            Mode::Griot => "griot",
        }
    }

    /// 从字符串解析模式（忽略大小写）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "english" => Some(Mode::Standard),
            "pidgin" => Some(Mode::Pidgin),
            "griot" | "story" => Some(Mode::Griot),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 洋泾浜 / 说书人两个开关，二者互斥
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeToggles {
    pub pidgin: bool,
    pub griot: bool,
}

impl ModeToggles {
    /// 切换说书人模式；打开时关闭洋泾浜
    pub fn toggle_griot(&mut self) {
        self.griot = !self.griot;
        if self.griot {
            self.pidgin = false;
        }
    }

    /// 切换洋泾浜模式；打开时关闭说书人
    pub fn toggle_pidgin(&mut self) {
        self.pidgin = !self.pidgin;
        if self.pidgin {
            self.griot = false;
        }
    }

    /// 直接设置为某个模式
    pub fn set(&mut self, mode: Mode) {
        self.pidgin = mode == Mode::Pidgin;
        self.griot = mode == Mode::Griot;
    }

    pub fn language(&self) -> Language {
        if self.pidgin {
            Language::Pidgin
        } else {
            Language::English
        }
    }

    /// 请求体中的 mode 字段只区分 standard / griot
    pub fn request_mode(&self) -> Mode {
        if self.griot {
            Mode::Griot
        } else {
            Mode::Standard
        }
    }

    /// 朗读使用的模式，洋泾浜优先
    pub fn narration_mode(&self) -> Mode {
        if self.pidgin {
            Mode::Pidgin
        } else if self.griot {
            Mode::Griot
        } else {
            Mode::Standard
        }
    }
}

/// POST /teach 请求体
#[derive(Debug, Clone, Serialize)]
pub struct TeachRequest {
    pub subject: String,
    pub language: Language,
    pub mode: Mode,
}

impl TeachRequest {
    pub fn new(subject: impl Into<String>, toggles: &ModeToggles) -> Self {
        Self {
            subject: subject.into(),
            language: toggles.language(),
            mode: toggles.request_mode(),
        }
    }
}

/// POST /quiz 请求体
#[derive(Debug, Clone, Serialize)]
pub struct QuizRequest {
    pub subject: String,
}

/// POST /quiz 响应体
#[derive(Debug, Clone, Deserialize)]
pub struct QuizResponse {
    pub quiz: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_are_mutually_exclusive() {
        let mut toggles = ModeToggles::default();
        toggles.toggle_griot();
        assert!(toggles.griot);

        toggles.toggle_pidgin();
        assert!(toggles.pidgin);
        assert!(!toggles.griot);

        toggles.toggle_pidgin();
        assert_eq!(toggles, ModeToggles::default());
    }

    #[test]
    fn test_teach_request_wire_format() {
        let mut toggles = ModeToggles::default();
        toggles.toggle_griot();
        let body = serde_json::to_value(TeachRequest::new("Gravity", &toggles)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"subject": "Gravity", "language": "english", "mode": "griot"})
        );

        toggles.toggle_pidgin();
        let body = serde_json::to_value(TeachRequest::new("Gravity", &toggles)).unwrap();
        assert_eq!(body["language"], "pidgin");
        assert_eq!(body["mode"], "standard");
        assert_eq!(toggles.narration_mode(), Mode::Pidgin);
    }

    #[test]
    fn test_response_without_visual_aid() {
        let resp: TutorResponse =
            serde_json::from_str(r#"{"response": "Energy na power", "source_data": ""}"#).unwrap();
        assert_eq!(resp.explanation_text(), "Energy na power");
        assert!(resp.visual_aid.is_none());
    }
}
