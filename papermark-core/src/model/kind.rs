use serde::{Deserialize, Serialize};

/// Region classification: five base kinds, each with an image variant.
///
/// An image variant marks a region holding a figure that belongs to a text
/// region of the base kind. Wire names are the Chinese strings used by the
/// external question-bank format; the `的图片` suffix marks image variants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnnotationKind {
    #[serde(rename = "问题")]
    Question,
    #[serde(rename = "问题的图片")]
    QuestionImage,
    #[serde(rename = "选项")]
    Option,
    #[serde(rename = "选项的图片")]
    OptionImage,
    #[serde(rename = "答案")]
    Answer,
    #[serde(rename = "答案的图片")]
    AnswerImage,
    #[serde(rename = "其他")]
    Other,
    #[serde(rename = "其他的图片")]
    OtherImage,
    #[serde(rename = "解析")]
    Explanation,
    #[serde(rename = "解析的图片")]
    ExplanationImage,
}

impl AnnotationKind {
    pub fn all() -> &'static [AnnotationKind] {
        &[
            AnnotationKind::Question,
            AnnotationKind::QuestionImage,
            AnnotationKind::Option,
            AnnotationKind::OptionImage,
            AnnotationKind::Answer,
            AnnotationKind::AnswerImage,
            AnnotationKind::Other,
            AnnotationKind::OtherImage,
            AnnotationKind::Explanation,
            AnnotationKind::ExplanationImage,
        ]
    }

    /// The wire name, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Question => "问题",
            AnnotationKind::QuestionImage => "问题的图片",
            AnnotationKind::Option => "选项",
            AnnotationKind::OptionImage => "选项的图片",
            AnnotationKind::Answer => "答案",
            AnnotationKind::AnswerImage => "答案的图片",
            AnnotationKind::Other => "其他",
            AnnotationKind::OtherImage => "其他的图片",
            AnnotationKind::Explanation => "解析",
            AnnotationKind::ExplanationImage => "解析的图片",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(
            self,
            AnnotationKind::QuestionImage
                | AnnotationKind::OptionImage
                | AnnotationKind::AnswerImage
                | AnnotationKind::OtherImage
                | AnnotationKind::ExplanationImage
        )
    }

    /// The image variant this kind accepts as link children.
    ///
    /// Image kinds have no image variant of their own, so an image annotation
    /// can never be a link parent.
    pub fn image_variant(&self) -> Option<AnnotationKind> {
        match self {
            AnnotationKind::Question => Some(AnnotationKind::QuestionImage),
            AnnotationKind::Option => Some(AnnotationKind::OptionImage),
            AnnotationKind::Answer => Some(AnnotationKind::AnswerImage),
            AnnotationKind::Other => Some(AnnotationKind::OtherImage),
            AnnotationKind::Explanation => Some(AnnotationKind::ExplanationImage),
            _ => None,
        }
    }

    /// Strip the image suffix, mapping each image variant to its base kind.
    pub fn base(&self) -> AnnotationKind {
        match self {
            AnnotationKind::QuestionImage => AnnotationKind::Question,
            AnnotationKind::OptionImage => AnnotationKind::Option,
            AnnotationKind::AnswerImage => AnnotationKind::Answer,
            AnnotationKind::OtherImage => AnnotationKind::Other,
            AnnotationKind::ExplanationImage => AnnotationKind::Explanation,
            other => *other,
        }
    }
}
