//! 标签过滤 (Tag Filter)
//!
//! 正则包含/排除过滤，保持输入顺序；空模式视为恒等，可任意串联。

use regex::Regex;

use crate::core::error::{ConvertError, Result};

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ConvertError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// 单次过滤: include 保留匹配项，exclude 保留不匹配项
pub fn filter(is_include: bool, pattern: &str, tags: &[String]) -> Result<Vec<String>> {
    if pattern.is_empty() {
        return Ok(tags.to_vec());
    }
    let re = compile(pattern)?;
    Ok(tags
        .iter()
        .filter(|tag| re.is_match(tag) == is_include)
        .cloned()
        .collect())
}

/// 预编译的过滤链，按添加顺序依次执行
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    passes: Vec<(bool, Regex)>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(self, pattern: &str) -> Result<Self> {
        self.pass(true, pattern)
    }

    pub fn exclude(self, pattern: &str) -> Result<Self> {
        self.pass(false, pattern)
    }

    fn pass(mut self, is_include: bool, pattern: &str) -> Result<Self> {
        if !pattern.is_empty() {
            self.passes.push((is_include, compile(pattern)?));
        }
        Ok(self)
    }

    pub fn is_identity(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn apply(&self, tags: &[String]) -> Vec<String> {
        tags.iter()
            .filter(|tag| {
                self.passes
                    .iter()
                    .all(|(is_include, re)| re.is_match(tag) == *is_include)
            })
            .cloned()
            .collect()
    }
}

/// 先 include 后 exclude
pub fn filter_tags(tags: &[String], include: &str, exclude: &str) -> Result<Vec<String>> {
    Ok(TagFilter::new().include(include)?.exclude(exclude)?.apply(tags))
}
