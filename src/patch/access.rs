//! 通用 JSON 字段访问 (Generic JSON Accessor)
//!
//! 生成的出站是结构化的 [`Outbound`]，模板中的出站则是任意 JSON 对象。
//! [`JsonAccess`] 把两者统一成按字段名读写的接口，修补逻辑无需区分来源。

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::singbox::Outbound;

pub trait JsonAccess {
    /// 读取字段，缺失或容器不支持时返回 None
    fn get_field(&self, name: &str) -> Option<Value>;

    /// 就地更新单个字段，容器不可写或类型不匹配时返回 false
    fn set_field(&mut self, name: &str, value: Value) -> bool;
}

/// 按类型读取字段，缺失、类型不符均返回零值
pub fn get<T, A>(node: &A, name: &str) -> T
where
    T: DeserializeOwned + Default,
    A: JsonAccess + ?Sized,
{
    node.get_field(name)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

pub fn set<T, A>(node: &mut A, name: &str, value: T) -> bool
where
    T: Serialize,
    A: JsonAccess + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(v) => node.set_field(name, v),
        Err(_) => false,
    }
}

fn to_value<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

fn assign<T: DeserializeOwned>(slot: &mut T, value: Value) -> bool {
    match serde_json::from_value(value) {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

impl JsonAccess for Outbound {
    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "type" => to_value(&self.kind),
            "tag" => to_value(&self.tag),
            "server" => to_value(&self.server),
            "server_port" => to_value(&self.server_port),
            "password" => to_value(&self.password),
            "outbounds" => to_value(&self.outbounds),
            "default" => self.default.as_ref().and_then(to_value),
            "detour" => self.detour.as_ref().and_then(to_value),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "type" => assign(&mut self.kind, value),
            "tag" => assign(&mut self.tag, value),
            "server" => assign(&mut self.server, value),
            "server_port" => assign(&mut self.server_port, value),
            "password" => assign(&mut self.password, value),
            "outbounds" => assign(&mut self.outbounds, value),
            "default" => assign(&mut self.default, value),
            "detour" => assign(&mut self.detour, value),
            _ => false,
        }
    }
}

impl JsonAccess for Map<String, Value> {
    fn get_field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        // preserve_order 下覆盖已有键不改变其位置
        self.insert(name.to_string(), value);
        true
    }
}

impl JsonAccess for Value {
    fn get_field(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(map) => map.get_field(name),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self {
            Value::Object(map) => map.set_field(name, value),
            _ => false,
        }
    }
}

/// 出站列表元素: 结构化出站或模板中的原始 JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundNode {
    Structured(Outbound),
    Opaque(Value),
}

impl JsonAccess for OutboundNode {
    fn get_field(&self, name: &str) -> Option<Value> {
        match self {
            OutboundNode::Structured(o) => o.get_field(name),
            OutboundNode::Opaque(v) => v.get_field(name),
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self {
            OutboundNode::Structured(o) => o.set_field(name, value),
            OutboundNode::Opaque(v) => v.set_field(name, value),
        }
    }
}

impl From<Outbound> for OutboundNode {
    fn from(o: Outbound) -> Self {
        OutboundNode::Structured(o)
    }
}

impl From<Value> for OutboundNode {
    fn from(v: Value) -> Self {
        OutboundNode::Opaque(v)
    }
}
