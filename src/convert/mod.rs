//! 订阅转换流水线 (Conversion Pipeline)
//!
//! 逐个节点独立转换，单个节点失败只记录不阻断；relay 组在全部直接转换完成后解析。

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::core::error::{ConvertError, ErrorList, OpContext, Result};
use crate::model::clash::{ClashProfile, ClashProxy};
use crate::model::singbox::{Multiplex, Outbound};
use crate::protocols::{ConverterRegistry, Protocol};

pub mod relay;

/// 合成出站保留标签，用户节点不可占用
pub const RESERVED_TAGS: [&str; 5] = ["select", "urltest", "direct", "block", "dns-out"];

pub fn is_reserved(tag: &str) -> bool {
    RESERVED_TAGS.contains(&tag)
}

/// 批量转换结果: 部分成功的出站列表 + 聚合错误
#[derive(Debug, Default)]
pub struct Conversion {
    pub outbounds: Vec<Outbound>,
    pub errors: ErrorList,
}

/// 使用内置注册表转换整个订阅
pub fn clash_to_singbox(profile: &ClashProfile) -> Conversion {
    clash_to_singbox_with(&ConverterRegistry::new(), profile)
}

pub fn clash_to_singbox_with(registry: &ConverterRegistry, profile: &ClashProfile) -> Conversion {
    let mut result = Conversion {
        outbounds: Vec::with_capacity(profile.proxies.len() + 1),
        errors: ErrorList::new(),
    };

    let tags = unique_tags(&profile.proxies);
    // 节点名先全部占位，派生标签 (如 `<name>_shadowtls`) 不得与之冲突
    let names: HashSet<String> = tags.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::new();

    for (proxy, tag) in profile.proxies.iter().zip(tags) {
        let converted = convert_one(registry, proxy, tag.clone())
            .and_then(|outs| check_derived_tags(&outs, &tag, &names, &used).map(|_| outs).op("convert"));
        match converted {
            Ok(outs) => {
                debug!("{} -> {} outbound(s)", proxy.name, outs.len());
                used.extend(outs.iter().map(|o| o.tag.clone()));
                result.outbounds.extend(outs);
            }
            Err(e) => {
                warn!("跳过节点 {}: {}", proxy.name, e);
                result.errors.push(e);
            }
        }
    }

    let converted: HashMap<String, Outbound> = result
        .outbounds
        .iter()
        .map(|o| (o.tag.clone(), o.clone()))
        .collect();

    for group in profile.proxy_groups.iter().filter(|g| g.kind == "relay") {
        let resolved = if is_reserved(&group.name) {
            Err(ConvertError::ReservedTag {
                tag: group.name.clone(),
            })
        } else {
            relay::resolve(&converted, &group.proxies, &group.name)
                .and_then(|chain| check_relay_tags(&chain, &used).map(|_| chain))
        };
        match resolved.op("relay") {
            Ok(chain) => {
                used.extend(chain.iter().map(|o| o.tag.clone()));
                result.outbounds.extend(chain);
            }
            Err(e) => {
                warn!("跳过 relay 组 {}: {}", group.name, e);
                result.errors.push(e);
            }
        }
    }

    info!(
        "转换完成: {} 个出站, {} 个失败",
        result.outbounds.len(),
        result.errors.len()
    );
    result
}

fn convert_one(registry: &ConverterRegistry, proxy: &ClashProxy, tag: String) -> Result<Vec<Outbound>> {
    let (mut common, protocol) = comm(proxy).op("comm")?;
    if is_reserved(&tag) {
        return Err(ConvertError::ReservedTag { tag }).op("comm");
    }
    common.tag = tag;
    registry.convert(protocol, proxy, common).op("convert")
}

/// 派生出站的标签不得占用其他节点名或已生成的标签
fn check_derived_tags(
    outs: &[Outbound],
    primary: &str,
    names: &HashSet<String>,
    used: &HashSet<String>,
) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for out in outs {
        let derived = out.tag != primary;
        if !seen.insert(out.tag.as_str())
            || used.contains(&out.tag)
            || (derived && (names.contains(&out.tag) || is_reserved(&out.tag)))
        {
            return Err(ConvertError::DuplicateTag { tag: out.tag.clone() });
        }
    }
    Ok(())
}

/// relay 组名与中间跳标签不得与已生成的标签重复
fn check_relay_tags(chain: &[Outbound], used: &HashSet<String>) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for hop in chain {
        if used.contains(&hop.tag) || !seen.insert(hop.tag.as_str()) {
            return Err(ConvertError::DuplicateTag { tag: hop.tag.clone() });
        }
    }
    Ok(())
}

/// 公共字段提取 (Common Field Extraction)
///
/// 协议无关字段在此统一填充，端口必须能解析为正整数。
pub fn comm(proxy: &ClashProxy) -> Result<(Outbound, Protocol)> {
    let protocol = Protocol::parse(&proxy.kind)?;

    let port: u16 = proxy
        .port
        .trim()
        .parse()
        .map_err(|source| ConvertError::InvalidPort {
            port: proxy.port.clone(),
            source,
        })?;
    if port == 0 {
        return Err(ConvertError::ZeroPort);
    }

    let mut out = Outbound::new(protocol.target(), proxy.name.clone());
    out.server = proxy.server.clone();
    out.server_port = port;
    out.password = proxy.password.clone();
    out.tcp_fast_open = proxy.tfo;
    out.tcp_multi_path = proxy.mptcp;

    if proxy.smux.enabled {
        let smux = &proxy.smux;
        let mut multiplex = Multiplex {
            enabled: true,
            protocol: smux.protocol.clone(),
            max_streams: smux.max_streams,
            padding: smux.padding,
            ..Default::default()
        };
        // max_streams 与 min_streams/max_connections 互斥
        if smux.max_streams == 0 {
            multiplex.min_streams = smux.min_streams.max(4);
            multiplex.max_connections = smux.max_connections.max(4);
        }
        out.multiplex = Some(multiplex);
    }

    Ok((out, protocol))
}

/// 为重名节点追加序号后缀: "a", "a 2", "a 3"...
fn unique_tags(proxies: &[ClashProxy]) -> Vec<String> {
    let mut used: HashSet<String> = proxies.iter().map(|p| p.name.clone()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    proxies
        .iter()
        .map(|p| {
            if seen.insert(p.name.as_str()) {
                return p.name.clone();
            }
            let count = counts.entry(p.name.as_str()).or_insert(1);
            loop {
                *count += 1;
                let candidate = format!("{} {}", p.name, count);
                if used.insert(candidate.clone()) {
                    debug!("重名节点 {} 重命名为 {}", p.name, candidate);
                    return candidate;
                }
            }
        })
        .collect()
}

/// 跳过全部节点的证书校验
pub fn to_insecure(profile: &mut ClashProfile) {
    for proxy in &mut profile.proxies {
        proxy.skip_cert_verify = true;
    }
}
