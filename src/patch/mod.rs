//! 模板修补 (Template Patcher)
//!
//! 将转换得到的出站写入 sing-box 配置模板：
//! 1. 解析模板并提取其中已有的出站 ([`ExtTag`])
//! 2. 聚合标签，生成 `select` / `urltest` / `direct` / `block` / `dns-out` 合成出站
//! 3. 整体替换模板的 `outbounds`，再解析分组中的 `include:` / `exclude:` 指令
//! 4. 以固定缩进序列化，模板其余内容保持原有键序

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use tracing::{debug, info, warn};

use crate::core::error::{ConvertError, OpContext, Result};
use crate::model::singbox::{Outbound, OutboundType};
use crate::patch::access::OutboundNode;
use crate::patch::filter::filter_tags;

pub mod access;
pub mod filter;
pub mod urltest;

/// 内置配置模板
pub const DEFAULT_TEMPLATE: &str = include_str!("../../assets/template.json");

/// 合成出站标签
pub const SELECT_TAG: &str = "select";
pub const URLTEST_TAG: &str = "urltest";

/// 模板中这些出站会被合成节点取代，不予保留
const SKIPPED_TAGS: [&str; 3] = ["direct", "block", "dns-out"];

const INDENT: &[u8] = b"    ";

/// 模板中已有的出站节点
#[derive(Debug, Clone, PartialEq)]
pub struct ExtTag {
    pub tag: String,
    pub kind: String,
    pub node: Value,
}

impl ExtTag {
    /// 分组节点的成员是派生的，不参与标签聚合
    pub fn is_group(&self) -> bool {
        matches!(self.kind.parse::<OutboundType>(), Ok(kind) if kind.is_group())
    }
}

/// 提取模板中的出站节点，跳过会被合成节点取代的标签
pub fn ext_tags(template: &Value) -> Result<Vec<ExtTag>> {
    let outbounds = template
        .get("outbounds")
        .ok_or_else(|| ConvertError::Format("missing \"outbounds\"".into()))?
        .as_array()
        .ok_or_else(|| ConvertError::Format("\"outbounds\" is not an array".into()))?;

    Ok(outbounds
        .iter()
        .filter_map(|node| {
            let tag: String = access::get(node, "tag");
            if SKIPPED_TAGS.contains(&tag.as_str()) {
                debug!("模板出站 {} 由合成节点取代", tag);
                return None;
            }
            Some(ExtTag {
                kind: access::get(node, "type"),
                tag,
                node: node.clone(),
            })
        })
        .collect())
}

/// 解析模板字节流，根节点必须是对象
pub fn parse_template(template: &[u8]) -> Result<Value> {
    let root: Value = serde_json::from_slice(template)?;
    if !root.is_object() {
        return Err(ConvertError::Format("template root is not an object".into()));
    }
    Ok(root)
}

/// 修补模板并序列化
///
/// `ext_out` 为调用方追加的原始出站节点，`extra_tags` 追加到聚合标签末尾。
pub fn patch(
    template: &[u8],
    outbounds: &[Outbound],
    include: &str,
    exclude: &str,
    ext_out: Vec<Value>,
    extra_tags: &[String],
) -> Result<Vec<u8>> {
    let patched = parse_template(template)
        .and_then(|root| patch_value(root, outbounds, include, exclude, ext_out, extra_tags))
        .op("patch")?;
    to_pretty_json(&patched).op("patch")
}

/// 修补已解析的模板，返回完整配置树
pub fn patch_value(
    mut root: Value,
    outbounds: &[Outbound],
    include: &str,
    exclude: &str,
    ext_out: Vec<Value>,
    extra_tags: &[String],
) -> Result<Value> {
    // 与转换节点同名的模板/附加出站由转换结果取代
    let converted: HashSet<&str> = outbounds.iter().map(|o| o.tag.as_str()).collect();
    let superseded = |tag: &str| {
        let hit = !tag.is_empty() && converted.contains(tag);
        if hit {
            warn!("模板出站 {} 与转换节点同名，已被取代", tag);
        }
        hit
    };

    let existing: Vec<ExtTag> = ext_tags(&root)?
        .into_iter()
        .filter(|e| !superseded(&e.tag))
        .collect();
    let ext_out: Vec<Value> = ext_out
        .into_iter()
        .filter(|v| !superseded(&access::get::<String, _>(v, "tag")))
        .collect();

    // 聚合顺序: 转换节点 -> 模板非分组节点 -> 调用方附加标签
    let aggregate: Vec<String> = outbounds
        .iter()
        .filter(|o| !o.ignored)
        .map(|o| o.tag.as_str())
        .chain(existing.iter().filter(|e| !e.is_group()).map(|e| e.tag.as_str()))
        .chain(extra_tags.iter().map(String::as_str))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();

    let candidates = filter_tags(&aggregate, include, exclude)?;
    debug!("urltest 候选 {}/{}", candidates.len(), aggregate.len());

    let mut members = Vec::with_capacity(aggregate.len() + 1);
    members.push(URLTEST_TAG.to_string());
    members.extend(aggregate.iter().cloned());

    let synthetic = [
        Outbound::selector(SELECT_TAG, members, URLTEST_TAG),
        Outbound::urltest(URLTEST_TAG, candidates),
        Outbound::new(OutboundType::Direct, "direct"),
        Outbound::new(OutboundType::Block, "block"),
        Outbound::new(OutboundType::Dns, "dns-out"),
    ];

    let mut nodes: Vec<OutboundNode> = outbounds
        .iter()
        .cloned()
        .chain(synthetic)
        .map(OutboundNode::from)
        .chain(existing.into_iter().map(|e| OutboundNode::from(e.node)))
        .chain(ext_out.into_iter().map(OutboundNode::from))
        .collect();

    urltest::resolve_outbounds(&mut nodes, &aggregate)?;

    let count = nodes.len();
    if !access::set(&mut root, "outbounds", nodes) {
        return Err(ConvertError::Format("cannot replace \"outbounds\"".into()));
    }

    info!("模板修补完成: {} 个出站, {} 个聚合标签", count, aggregate.len());
    Ok(root)
}

/// 四空格缩进输出，末尾带换行
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
