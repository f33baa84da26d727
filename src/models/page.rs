use serde::{Deserialize, Serialize};

/// 单页 OCR 结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(deserialize_with = "deserialize_student_id")]
    pub student_id: String,
    pub student_name: String,
    pub essay_text: String,
}

impl Page {
    pub fn new(
        student_id: impl Into<String>,
        student_name: impl Into<String>,
        essay_text: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            student_name: student_name.into(),
            essay_text: essay_text.into(),
        }
    }

    /// OCR 解析失败时的兜底页：原文整体保留为作文内容
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            essay_text: text.into(),
            ..Self::default()
        }
    }
}

/// 一份学生作文（可能由多页合并而成）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Submission {
    pub student_id: String,
    pub student_name: String,
    pub essay_text: String,
    /// 来源文件名（多篇拆分时带 `#n` 后缀）
    pub source: String,
}

// 学号既可能是字符串也可能被模型写成整数
fn deserialize_student_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct StudentIdVisitor;

    impl<'de> Visitor<'de> for StudentIdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a student id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StudentIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_id_accepts_integer() {
        let page: Page = serde_json::from_str(
            r#"{"student_id": 10305, "student_name": "홍길동", "essay_text": "본문"}"#,
        )
        .unwrap();
        assert_eq!(page.student_id, "10305");
    }

    #[test]
    fn test_student_id_rejects_null() {
        let result: Result<Page, _> = serde_json::from_str(
            r#"{"student_id": null, "student_name": "", "essay_text": ""}"#,
        );
        assert!(result.is_err());
    }
}
