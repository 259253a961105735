//! 错误处理体系 (Error Handling System)
//!
//! 定义转换与模板修补相关的错误类型、批量错误聚合以及全局 Result 别名。

use std::fmt;
use std::num::ParseIntError;

use thiserror::Error;

/// 全局错误定义 (Conversion Domain Errors)
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unsupported proxy type: {kind}")]
    UnsupportedType { kind: String },

    #[error("invalid port {port:?}: {source}")]
    InvalidPort {
        port: String,
        #[source]
        source: ParseIntError,
    },

    #[error("port must be positive")]
    ZeroPort,

    /// 协议字段缺失或格式错误 (例如凭据无法解码)
    #[error("{protocol} {name:?}: {reason}")]
    Field {
        protocol: &'static str,
        name: String,
        reason: String,
    },

    /// 与内置合成出站标签冲突
    #[error("tag {tag:?} is reserved")]
    ReservedTag { tag: String },

    /// 生成的标签与已有出站重复
    #[error("tag {tag:?} is already in use")]
    DuplicateTag { tag: String },

    #[error("relay group {group:?}: member {member:?} not found")]
    RelayMember { group: String, member: String },

    /// 模板结构错误
    #[error("invalid template format: {0}")]
    Format(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid subscription url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 携带产生错误的操作名，形成无需堆栈的调用链
    #[error("{op}: {source}")]
    Op {
        op: &'static str,
        #[source]
        source: Box<ConvertError>,
    },
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub fn field(protocol: &'static str, name: &str, reason: impl Into<String>) -> Self {
        Self::Field {
            protocol,
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// 剥离所有操作上下文，返回最内层的根因
    pub fn root(&self) -> &ConvertError {
        match self {
            ConvertError::Op { source, .. } => source.root(),
            other => other,
        }
    }

    /// 从外到内的操作名链路
    pub fn ops(&self) -> Vec<&'static str> {
        let mut ops = Vec::new();
        let mut current = self;
        while let ConvertError::Op { op, source } = current {
            ops.push(*op);
            current = source;
        }
        ops
    }
}

/// 为 Result 附加操作名
pub trait OpContext<T> {
    fn op(self, op: &'static str) -> Result<T>;
}

impl<T, E> OpContext<T> for std::result::Result<T, E>
where
    E: Into<ConvertError>,
{
    fn op(self, op: &'static str) -> Result<T> {
        self.map_err(|e| ConvertError::Op {
            op,
            source: Box::new(e.into()),
        })
    }
}

/// 批量错误聚合 (Composite Error)
///
/// 批处理中每个条目的失败都被收集于此，调用方既能拿到部分成功的结果，
/// 也能逐条遍历失败原因。
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<ConvertError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ConvertError) {
        self.errors.push(err);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConvertError> {
        self.errors.iter()
    }

    /// 无错误时返回 Ok(())
    pub fn into_result(self) -> std::result::Result<(), ErrorList> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

impl Extend<ConvertError> for ErrorList {
    fn extend<I: IntoIterator<Item = ConvertError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ErrorList {
    type Item = ConvertError;
    type IntoIter = std::vec::IntoIter<ConvertError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ConvertError;
    type IntoIter = std::slice::Iter<'a, ConvertError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_context_chain() {
        let inner: Result<()> = Err(ConvertError::ZeroPort);
        let err = inner.op("comm").op("convert").unwrap_err();

        assert_eq!(err.to_string(), "convert: comm: port must be positive");
        assert_eq!(err.ops(), vec!["convert", "comm"]);
        assert!(matches!(err.root(), ConvertError::ZeroPort));
    }

    #[test]
    fn test_op_context_from_foreign_error() {
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err = parsed.op("patch").unwrap_err();
        assert!(matches!(err.root(), ConvertError::Json(_)));
        assert!(err.to_string().starts_with("patch: JSON error"));
    }

    #[test]
    fn test_error_list() {
        let mut list = ErrorList::new();
        assert!(list.is_empty());

        list.push(ConvertError::UnsupportedType { kind: "ssr".into() });
        list.push(ConvertError::ReservedTag { tag: "direct".into() });

        assert_eq!(list.len(), 2);
        assert_eq!(
            list.to_string(),
            "unsupported proxy type: ssr\ntag \"direct\" is reserved"
        );
        assert_eq!(list.iter().count(), 2);
        assert!(list.into_result().is_err());
        assert!(ErrorList::new().into_result().is_ok());
    }
}
