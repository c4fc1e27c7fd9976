//! Per-vendor mapping into the canonical schema
//!
//! Each arm reads only the paths that vendor documents. A missing path,
//! a null, or a value of the wrong shape becomes an absent field.

use super::registry::SourceId;
use crate::types::CanonicalFields;
use serde_json::{Number, Value};

/// Map a quarantined vendor body onto `CanonicalFields`
pub fn normalize(source: SourceId, data: &Value) -> CanonicalFields {
    match source {
        SourceId::Ipinfo => {
            let org = text_at(data, &["org"]);
            CanonicalFields {
                country: text_at(data, &["country"]),
                city: text_at(data, &["city"]),
                asn: org.as_deref().and_then(first_word),
                isp: org,
                loc: text_at(data, &["loc"]),
                ..Default::default()
            }
        }
        SourceId::Ipapi => CanonicalFields {
            country: text_at(data, &["country"]),
            city: text_at(data, &["city"]),
            isp: text_at(data, &["isp"]),
            org: text_at(data, &["org"]),
            asn: text_at(data, &["as"]).as_deref().and_then(first_word),
            ..Default::default()
        },
        SourceId::Ipsb => CanonicalFields {
            country: text_at(data, &["country"]),
            city: text_at(data, &["city"]),
            isp: text_at(data, &["organization"]),
            asn: text_at(data, &["asn"]),
            ..Default::default()
        },
        SourceId::Ipgs | SourceId::Skk | SourceId::Ipzx => CanonicalFields {
            country: text_at(data, &["country"]),
            city: text_at(data, &["city"]),
            isp: text_at(data, &["isp"]),
            ..Default::default()
        },
        SourceId::Ipregistry => CanonicalFields {
            country: text_at(data, &["location", "country", "code"]),
            city: text_at(data, &["location", "city"]),
            isp: text_at(data, &["company", "name"]),
            asn: text_at(data, &["connection", "asn"]),
            ..Default::default()
        },
        SourceId::Ipdata => CanonicalFields {
            country: text_at(data, &["country_code"]),
            city: text_at(data, &["city"]),
            isp: text_at(data, &["org"]),
            asn: text_at(data, &["asn", "asn"]),
            ..Default::default()
        },
        SourceId::Ipwhois => CanonicalFields {
            country: text_at(data, &["country_code"]),
            city: text_at(data, &["city"]),
            isp: text_at(data, &["isp"]),
            asn: text_at(data, &["connection", "asn"]),
            ..Default::default()
        },
        SourceId::Ipqs => CanonicalFields {
            country: text_at(data, &["country"]).or_else(|| text_at(data, &["country_code"])),
            city: text_at(data, &["city"]),
            isp: text_at(data, &["organization"]),
            fraud_score: number_at(data, &["fraud_score"]),
            proxy: flag_at(data, &["proxy"]),
            vpn: flag_at(data, &["vpn"]),
            tor: flag_at(data, &["tor"]),
            ..Default::default()
        },
        SourceId::Scamalytics => CanonicalFields {
            fraud_score: number_at(data, &["score", "risk"])
                .or_else(|| number_at(data, &["score"])),
            proxy: flag_at(data, &["signals", "proxy"]),
            vpn: flag_at(data, &["signals", "vpn"]),
            tor: flag_at(data, &["signals", "tor"]),
            ..Default::default()
        },
        SourceId::Abuseipdb => CanonicalFields {
            abuse_score: number_at(data, &["data", "abuseConfidenceScore"]),
            isp: text_at(data, &["data", "isp"]),
            country: text_at(data, &["data", "countryCode"]),
            ..Default::default()
        },
        // security block is flattened into the canonical flags
        SourceId::Vpnapi => CanonicalFields {
            country: text_at(data, &["location", "country_code"]),
            city: text_at(data, &["location", "city"]),
            isp: text_at(data, &["network", "autonomous_system_organization"]),
            asn: text_at(data, &["network", "autonomous_system_number"]),
            vpn: flag_at(data, &["security", "vpn"]),
            proxy: flag_at(data, &["security", "proxy"]),
            tor: flag_at(data, &["security", "tor"]),
            ..Default::default()
        },
        SourceId::Ip2location => CanonicalFields {
            country: text_at(data, &["country_code"]),
            city: text_at(data, &["city_name"]),
            isp: text_at(data, &["isp"]),
            asn: text_at(data, &["asn"]).or_else(|| text_at(data, &["as"])),
            ..Default::default()
        },
        SourceId::Cloudflare => CanonicalFields {
            risk_score: number_at(data, &["ip", "riskScore"]),
            proxy: flag_at(data, &["ip", "proxy"]),
            ..Default::default()
        },
    }
}

fn value_at<'a>(data: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(data, |node, key| node.as_object()?.get(*key))
        .filter(|v| !v.is_null())
}

fn text_at(data: &Value, path: &[&str]) -> Option<String> {
    match value_at(data, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_at(data: &Value, path: &[&str]) -> Option<Number> {
    match value_at(data, path)? {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}

fn flag_at(data: &Value, path: &[&str]) -> Option<bool> {
    match value_at(data, path)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn first_word(s: &str) -> Option<String> {
    s.split_whitespace().next().map(str::to_string)
}
