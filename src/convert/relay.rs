//! 链式代理解析 (Relay Resolver)
//!
//! 成员 `[A, B, C]` 表示流量依次经过 A、B、C：C 经 detour 走 B，B 走 A。
//! 中间跳复制为 `<group>_<member>` 并标记为 ignored，末跳使用组名。

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::error::{ConvertError, Result};
use crate::model::singbox::Outbound;

pub fn resolve(outbounds: &HashMap<String, Outbound>, members: &[String], name: &str) -> Result<Vec<Outbound>> {
    if members.is_empty() {
        return Err(ConvertError::Format(format!("relay group {:?} has no members", name)));
    }

    let mut chain = Vec::with_capacity(members.len());
    let mut previous: Option<String> = None;

    for (i, member) in members.iter().enumerate() {
        let source = outbounds.get(member).ok_or_else(|| ConvertError::RelayMember {
            group: name.to_string(),
            member: member.clone(),
        })?;

        let mut hop = source.clone();
        let last = i + 1 == members.len();
        hop.tag = if last {
            name.to_string()
        } else {
            format!("{}_{}", name, member)
        };
        hop.ignored = !last;
        // 成员自带的 detour (如 shadow-tls) 仅保留在首跳
        if let Some(prev) = previous.take() {
            if let Some(own) = hop.detour.as_deref() {
                warn!("relay {}: {} 的 detour {} 被上一跳 {} 取代", name, member, own, prev);
            }
            hop.detour = Some(prev);
        }

        debug!("relay {}: {} -> {}", name, member, hop.tag);
        previous = Some(hop.tag.clone());
        chain.push(hop);
    }

    Ok(chain)
}
