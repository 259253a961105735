//! 分组成员指令解析 (urltest Tag Resolver)
//!
//! 分组出站的 `outbounds` 中可以写入 `include: <regex>` / `exclude: <regex>`，
//! 修补时替换为具体标签，并与同列表中的字面标签合并去重。

use indexmap::IndexSet;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::error::{OpContext, Result};
use crate::patch::access::{self, JsonAccess};
use crate::patch::filter::filter_tags;

const INCLUDE: &str = "include:";
const EXCLUDE: &str = "exclude:";

/// 解析单个成员列表，没有指令时返回 None (保持原样)
///
/// 同一列表中重复出现的同类指令以最后一条为准。
pub fn resolve_members(members: &[String], tags: &[String]) -> Result<Option<Vec<String>>> {
    let mut include: Option<&str> = None;
    let mut exclude: Option<&str> = None;
    let mut literals = Vec::new();

    for member in members {
        if let Some(pattern) = member.strip_prefix(INCLUDE) {
            include = Some(pattern.trim_start());
        } else if let Some(pattern) = member.strip_prefix(EXCLUDE) {
            exclude = Some(pattern.trim_start());
        } else {
            literals.push(member.clone());
        }
    }

    let (include, exclude) = (include.unwrap_or_default(), exclude.unwrap_or_default());
    if include.is_empty() && exclude.is_empty() {
        return Ok(None);
    }

    let matched = filter_tags(tags, include, exclude)?;
    let resolved: IndexSet<String> = literals.into_iter().chain(matched).collect();
    Ok(Some(resolved.into_iter().collect()))
}

/// 遍历出站列表，就地替换含指令的成员列表
pub fn resolve_outbounds<N: JsonAccess>(nodes: &mut [N], tags: &[String]) -> Result<()> {
    for node in nodes.iter_mut() {
        let members: Vec<Value> = access::get(&*node, "outbounds");
        if members.is_empty() {
            continue;
        }

        let members: Vec<String> = members
            .into_iter()
            .filter_map(|m| match m {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();

        let Some(resolved) = resolve_members(&members, tags).op("urltest")? else {
            continue;
        };

        let tag: String = access::get(&*node, "tag");
        debug!("{}: 指令解析为 {} 个成员", tag, resolved.len());
        if !access::set(node, "outbounds", resolved) {
            warn!("{}: 无法写回解析后的成员列表", tag);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::singbox::Outbound;
    use crate::patch::access::OutboundNode;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn universe() -> Vec<String> {
        strings(&["a1", "a2", "b1"])
    }

    #[test]
    fn test_include_directive() {
        let resolved = resolve_members(&strings(&["include: ^a"]), &universe()).unwrap();
        assert_eq!(resolved, Some(strings(&["a1", "a2"])));
    }

    #[test]
    fn test_include_then_exclude() {
        let resolved =
            resolve_members(&strings(&["include: ^a", "exclude: 2$"]), &universe()).unwrap();
        assert_eq!(resolved, Some(strings(&["a1"])));
    }

    #[test]
    fn test_exclude_only() {
        let resolved = resolve_members(&strings(&["exclude: ^a"]), &universe()).unwrap();
        assert_eq!(resolved, Some(strings(&["b1"])));
    }

    #[test]
    fn test_literals_first_and_deduplicated() {
        let resolved =
            resolve_members(&strings(&["direct", "a2", "include: ^a"]), &universe()).unwrap();
        assert_eq!(resolved, Some(strings(&["direct", "a2", "a1"])));
    }

    #[test]
    fn test_no_directive_untouched() {
        assert_eq!(resolve_members(&strings(&["a1", "b1"]), &universe()).unwrap(), None);

        let original = json!({"type": "selector", "tag": "s", "outbounds": ["b1", "a1"], "x": [1, 2]});
        let mut nodes = vec![OutboundNode::Opaque(original.clone())];
        resolve_outbounds(&mut nodes, &universe()).unwrap();
        assert_eq!(
            serde_json::to_string(&nodes[0]).unwrap(),
            serde_json::to_string(&original).unwrap()
        );
    }

    #[test]
    fn test_resolve_both_representations() {
        let mut nodes = vec![
            OutboundNode::Structured(Outbound::urltest("auto", strings(&["include: ^a"]))),
            OutboundNode::Opaque(json!({
                "type": "selector",
                "tag": "manual",
                "outbounds": ["exclude: ^a"],
                "interrupt_exist_connections": true
            })),
            OutboundNode::Opaque(json!({"type": "direct", "tag": "direct"})),
        ];
        resolve_outbounds(&mut nodes, &universe()).unwrap();

        assert_eq!(access::get::<Vec<String>, _>(&nodes[0], "outbounds"), strings(&["a1", "a2"]));
        assert_eq!(access::get::<Vec<String>, _>(&nodes[1], "outbounds"), strings(&["b1"]));
        assert_eq!(
            nodes[1].get_field("interrupt_exist_connections"),
            Some(json!(true))
        );
        assert_eq!(nodes[2].get_field("outbounds"), None);
    }

    /// 只读节点: 可读出成员列表但拒绝写入
    struct ReadOnly(Value);

    impl JsonAccess for ReadOnly {
        fn get_field(&self, name: &str) -> Option<Value> {
            self.0.get_field(name)
        }

        fn set_field(&mut self, _name: &str, _value: Value) -> bool {
            false
        }
    }

    #[test]
    fn test_rejected_write_is_not_fatal() {
        let mut nodes = vec![ReadOnly(json!({"tag": "g", "outbounds": ["include: ^a"]}))];
        resolve_outbounds(&mut nodes, &universe()).unwrap();
        assert_eq!(nodes[0].get_field("outbounds"), Some(json!(["include: ^a"])));
    }

    #[test]
    fn test_invalid_directive_pattern() {
        let mut nodes = vec![OutboundNode::Opaque(json!({"tag": "g", "outbounds": ["include: ("]}))];
        let err = resolve_outbounds(&mut nodes, &universe()).unwrap_err();
        assert_eq!(err.ops(), vec!["urltest"]);
    }
}
