use serde::{Deserialize, Serialize};

use crate::rules::{DomainRule, InstructionTemplate};

/// Id of the built-in default summary template.
pub const DEFAULT_TEMPLATE_ID: &str = "default-summary";

/// Affordance size options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Theme preference. Purely informational for the core; the panel applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// All recognized configuration options. Stored as one object in the
/// synchronized settings store; unknown fields are dropped on load and
/// missing fields take their defaults, so older stored shapes keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Note service base URL.
    pub target_url: String,
    /// Note service auth key.
    pub auth_key: String,
    /// Model endpoint base URL.
    pub model_url: String,
    /// Model API key.
    pub api_key: String,
    pub model_name: String,
    pub temperature: f32,
    pub templates: Vec<InstructionTemplate>,
    pub active_template_id: String,
    pub domain_rules: Vec<DomainRule>,
    pub include_summary_url: bool,
    pub include_selection_url: bool,
    pub include_image_url: bool,
    pub include_quick_note_url: bool,
    pub summary_tag: String,
    pub selection_tag: String,
    pub image_tag: String,
    pub extract_tag: String,
    pub enable_floating_ball: bool,
    pub floating_ball_size: BallSize,
    /// Reader service API key and whether to send it.
    pub reader_api_key: String,
    pub use_reader_api_key: bool,
    /// Whether the reader should retain image links.
    pub save_web_images: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            auth_key: String::new(),
            model_url: String::new(),
            api_key: String::new(),
            model_name: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            templates: builtin_templates(),
            active_template_id: DEFAULT_TEMPLATE_ID.to_string(),
            domain_rules: Vec::new(),
            include_summary_url: true,
            include_selection_url: true,
            include_image_url: true,
            include_quick_note_url: false,
            summary_tag: "#网页/总结".to_string(),
            selection_tag: "#网页/摘录".to_string(),
            image_tag: "#网页/图片".to_string(),
            extract_tag: "#网页/剪藏".to_string(),
            enable_floating_ball: true,
            floating_ball_size: BallSize::Medium,
            reader_api_key: String::new(),
            use_reader_api_key: false,
            save_web_images: false,
            theme: Theme::System,
        }
    }
}

impl Settings {
    /// Repairs the template invariants after load or edit: an empty template
    /// list regenerates the built-in set, and a dangling active id falls back
    /// to the built-in default, else the first template.
    pub fn normalize(&mut self) {
        if self.templates.is_empty() {
            self.templates = builtin_templates();
            self.active_template_id = DEFAULT_TEMPLATE_ID.to_string();
            return;
        }
        if !self.templates.iter().any(|t| t.id == self.active_template_id) {
            self.active_template_id = if self.templates.iter().any(|t| t.id == DEFAULT_TEMPLATE_ID)
            {
                DEFAULT_TEMPLATE_ID.to_string()
            } else {
                self.templates[0].id.clone()
            };
        }
    }
}

/// The built-in template set, regenerated whenever the stored list is empty.
pub fn builtin_templates() -> Vec<InstructionTemplate> {
    vec![
        InstructionTemplate {
            id: DEFAULT_TEMPLATE_ID.to_string(),
            name: "默认摘要模板".to_string(),
            content: "请你根据提供的网页内容，撰写一份结构清晰、重点突出且不遗漏重要内容的摘要。\n\
                      \n\
                      要求：\n\
                      1. **摘要结构：**\n\
                      \u{20}   *   第一行使用'# 标题'格式取一个简要的大标题。\n\
                      \u{20}   *   一句话总结：请提供一个简洁、精炼的概括性语句，准确概括整个网页的核心内容。\n\
                      \u{20}   *   按照网页内容的逻辑顺序，依次总结各个主要部分的核心内容。\n\
                      2. **突出重点：**  请识别并突出显示网页中的关键信息、主题、重要论点和结论。\n\
                      3. **不遗漏重要内容：**  在总结时，请确保覆盖网页的所有重要方面，避免关键信息缺失。\n\
                      \n\
                      请注意：\n\
                      *   摘要应保持客观中立，避免掺杂个人观点或情感色彩。\n\
                      *   摘要的语言应简洁明了，并使用中文进行总结。\n\
                      *   摘要的长度适中，既要全面覆盖重要内容，又要避免冗长啰嗦。\n\
                      以下是网页内容：{content}"
                .to_string(),
        },
        InstructionTemplate {
            id: "short-summary".to_string(),
            name: "简洁摘要模板".to_string(),
            content: "请用一句话总结以下网页内容：{content}".to_string(),
        },
    ]
}
