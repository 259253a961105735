use clash2sing::model::clash::ClashProfile;
use clash2sing::{ConvertError, clash_to_singbox, patch, to_insecure};
use serde_json::{Value, json};

const PROFILE: &str = r#"
proxies:
  - name: hk-ss
    type: ss
    server: hk.example.com
    port: 8388
    cipher: aes-128-gcm
    password: secret
  - name: hk-trojan
    type: trojan
    server: hk2.example.com
    port: "443"
    password: pw
    sni: cdn.example.com
    network: ws
    ws-opts:
      path: /ws
      headers:
        Host: cdn.example.com
  - name: jp-vless
    type: vless
    server: jp.example.com
    port: 443
    uuid: 6a2b7b42-8f7e-4c1d-9d2c-4e3c1f0a9b11
    tls: true
    servername: jp.example.com
    flow: xtls-rprx-vision
    client-fingerprint: chrome
  - name: legacy
    type: ssr
    server: old.example.com
    port: 1
  - name: bad-port
    type: socks5
    server: s.example.com
    port: http
proxy-groups:
  - name: via-hk
    type: relay
    proxies: [hk-ss, jp-vless]
"#;

const TEMPLATE: &str = r#"{
    "log": {"level": "info"},
    "outbounds": [
        {"type": "direct", "tag": "direct"},
        {"type": "urltest", "tag": "hk-auto", "outbounds": ["include: ^hk", "exclude: trojan"], "interval": "3m"},
        {"type": "selector", "tag": "proxy", "outbounds": ["direct", "include: .*"]}
    ],
    "route": {"final": "proxy"}
}"#;

fn outbound<'a>(root: &'a Value, tag: &str) -> &'a Value {
    root["outbounds"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["tag"] == tag)
        .unwrap_or_else(|| panic!("missing outbound {tag}"))
}

#[test]
fn test_profile_to_patched_config() {
    let profile = ClashProfile::from_yaml(PROFILE).unwrap();
    let conversion = clash_to_singbox(&profile);

    assert_eq!(conversion.errors.len(), 2);
    let roots: Vec<_> = conversion.errors.iter().map(|e| e.root()).collect();
    assert!(matches!(roots[0], ConvertError::UnsupportedType { kind } if kind == "ssr"));
    assert!(matches!(roots[1], ConvertError::InvalidPort { .. }));

    let bytes = patch(TEMPLATE.as_bytes(), &conversion.outbounds, "", "trojan", vec![], &[]).unwrap();
    let root: Value = serde_json::from_slice(&bytes).unwrap();

    let tags: Vec<_> = root["outbounds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["tag"].as_str().unwrap())
        .collect();
    assert_eq!(
        tags,
        vec![
            "hk-ss", "hk-trojan", "jp-vless", "via-hk_hk-ss", "via-hk", "select", "urltest", "direct", "block",
            "dns-out", "hk-auto", "proxy"
        ]
    );

    let aggregate = json!(["hk-ss", "hk-trojan", "jp-vless", "via-hk"]);
    assert_eq!(outbound(&root, "select")["outbounds"][0], "urltest");
    assert_eq!(outbound(&root, "select")["outbounds"].as_array().unwrap()[1..], aggregate.as_array().unwrap()[..]);
    assert_eq!(outbound(&root, "urltest")["outbounds"], json!(["hk-ss", "jp-vless", "via-hk"]));
    assert_eq!(outbound(&root, "hk-auto")["outbounds"], json!(["hk-ss"]));
    assert_eq!(outbound(&root, "hk-auto")["interval"], "3m");

    let mut proxy_members = vec![json!("direct")];
    proxy_members.extend(aggregate.as_array().unwrap().iter().cloned());
    assert_eq!(outbound(&root, "proxy")["outbounds"], Value::Array(proxy_members));

    let relay = outbound(&root, "via-hk");
    assert_eq!(relay["type"], "vless");
    assert_eq!(relay["detour"], "via-hk_hk-ss");

    let trojan = outbound(&root, "hk-trojan");
    assert_eq!(trojan["tls"]["server_name"], "cdn.example.com");
    assert_eq!(trojan["transport"]["type"], "ws");
    assert_eq!(trojan["transport"]["path"], "/ws");

    assert_eq!(root["log"], json!({"level": "info"}));
    assert_eq!(root["route"], json!({"final": "proxy"}));
    assert!(String::from_utf8(bytes).unwrap().ends_with("}\n"));
}

#[test]
fn test_insecure_rewrite_reaches_output() {
    let mut profile = ClashProfile::from_yaml(PROFILE).unwrap();
    to_insecure(&mut profile);
    let conversion = clash_to_singbox(&profile);

    let bytes = patch(br#"{"outbounds": []}"#, &conversion.outbounds, "", "", vec![], &[]).unwrap();
    let root: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(outbound(&root, "hk-trojan")["tls"]["insecure"], true);
    assert_eq!(outbound(&root, "jp-vless")["tls"]["insecure"], true);
}

#[test]
fn test_broken_template_fails_whole_patch() {
    let profile = ClashProfile::from_yaml(PROFILE).unwrap();
    let conversion = clash_to_singbox(&profile);

    for template in [&b"[]"[..], b"{\"outbounds\": 1}", b"{"] {
        assert!(patch(template, &conversion.outbounds, "", "", vec![], &[]).is_err());
    }
    assert!(patch(TEMPLATE.as_bytes(), &conversion.outbounds, "[", "", vec![], &[]).is_err());
}
