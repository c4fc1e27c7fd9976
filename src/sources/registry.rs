//! Static vendor table and request resolution

use crate::types::CredentialSet;

/// Closed set of upstream vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    Ipinfo,
    Ipapi,
    Ipsb,
    Ipgs,
    Skk,
    Ipzx,
    Ipregistry,
    Ipdata,
    Ipwhois,
    Ipqs,
    Scamalytics,
    Abuseipdb,
    Vpnapi,
    Ip2location,
    Cloudflare,
}

/// Where a source expects its caller-supplied key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPlacement {
    None,
    /// Substituted for `{API_KEY}` in the URL template
    Url,
    /// Sent as the named request header
    Header(&'static str),
}

/// Immutable description of one vendor endpoint
#[derive(Debug, Clone, Copy)]
pub struct SourceConfig {
    pub id: SourceId,
    pub url_template: &'static str,
    pub credential: CredentialPlacement,
    /// Relative abuse cost of querying this vendor
    pub weight: u32,
}

impl SourceConfig {
    pub fn requires_key(&self) -> bool {
        !matches!(self.credential, CredentialPlacement::None)
    }
}

impl SourceId {
    /// Every vendor, in the order queried when no `api` is given
    pub const ALL: [SourceId; 15] = [
        SourceId::Ipinfo,
        SourceId::Ipapi,
        SourceId::Ipsb,
        SourceId::Ipgs,
        SourceId::Skk,
        SourceId::Ipzx,
        SourceId::Ipregistry,
        SourceId::Ipdata,
        SourceId::Ipwhois,
        SourceId::Ipqs,
        SourceId::Scamalytics,
        SourceId::Abuseipdb,
        SourceId::Vpnapi,
        SourceId::Ip2location,
        SourceId::Cloudflare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Ipinfo => "ipinfo",
            SourceId::Ipapi => "ipapi",
            SourceId::Ipsb => "ipsb",
            SourceId::Ipgs => "ipgs",
            SourceId::Skk => "skk",
            SourceId::Ipzx => "ipzx",
            SourceId::Ipregistry => "ipregistry",
            SourceId::Ipdata => "ipdata",
            SourceId::Ipwhois => "ipwhois",
            SourceId::Ipqs => "ipqs",
            SourceId::Scamalytics => "scamalytics",
            SourceId::Abuseipdb => "abuseipdb",
            SourceId::Vpnapi => "vpnapi",
            SourceId::Ip2location => "ip2location",
            SourceId::Cloudflare => "cloudflare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        SourceId::ALL.into_iter().find(|id| id.as_str() == s)
    }

    pub fn config(&self) -> SourceConfig {
        use CredentialPlacement::{Header, Url};

        let (url_template, credential, weight) = match self {
            SourceId::Ipinfo => ("https://ipinfo.io/{ip}/json", CredentialPlacement::None, 1),
            SourceId::Ipapi => (
                "http://ip-api.com/json/{ip}?lang=zh-CN",
                CredentialPlacement::None,
                1,
            ),
            SourceId::Ipsb => ("https://api.ip.sb/geoip?ip={ip}", CredentialPlacement::None, 1),
            SourceId::Ipgs => ("https://ip.gs/json?ip={ip}", CredentialPlacement::None, 1),
            SourceId::Skk => ("https://api.skk.moe/ip?ip={ip}", CredentialPlacement::None, 1),
            SourceId::Ipzx => ("https://ip.zxinc.org/?ip={ip}", CredentialPlacement::None, 1),
            SourceId::Ipregistry => (
                "https://api.ipregistry.co/{ip}?key=tryout",
                CredentialPlacement::None,
                1,
            ),
            SourceId::Ipdata => ("https://api.ipdata.co/{ip}?api-key={API_KEY}", Url, 1),
            SourceId::Ipwhois => ("https://ipwhois.app/json/{ip}", CredentialPlacement::None, 1),
            SourceId::Ipqs => ("https://www.ipqualityscore.com/api/json/ip/{API_KEY}/{ip}", Url, 2),
            SourceId::Scamalytics => (
                "https://scamalytics.com/ip/{ip}",
                CredentialPlacement::None,
                1,
            ),
            SourceId::Abuseipdb => (
                "https://api.abuseipdb.com/api/v2/check?ipAddress={ip}",
                Header("Key"),
                1,
            ),
            SourceId::Vpnapi => ("https://vpnapi.io/api/{ip}?key={API_KEY}", Url, 1),
            SourceId::Ip2location => ("https://api.ip2location.io/?key={API_KEY}&ip={ip}", Url, 1),
            SourceId::Cloudflare => ("https://ip.nodeget.com/json", CredentialPlacement::None, 1),
        };

        SourceConfig {
            id: *self,
            url_template,
            credential,
            weight,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved outbound call for one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub source: SourceId,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn get(source: SourceId, url: impl Into<String>) -> Self {
        Self {
            source,
            url: url.into(),
            headers: Vec::new(),
        }
    }
}

/// Build the outbound request for `source_id`, or `None` to skip it
///
/// Unknown ids and key-gated sources without a key resolve to `None`;
/// the caller reports them without touching the network.
pub fn resolve_request(
    source_id: &str,
    ip: &str,
    credentials: &CredentialSet,
) -> Option<RequestSpec> {
    let source = SourceId::parse(source_id)?;
    let config = source.config();
    let url = config.url_template.replace("{ip}", ip);

    match config.credential {
        CredentialPlacement::None => Some(RequestSpec::get(source, url)),
        CredentialPlacement::Url => {
            let key = credentials.get(source.as_str())?;
            Some(RequestSpec::get(source, url.replace("{API_KEY}", key)))
        }
        CredentialPlacement::Header(name) => {
            let key = credentials.get(source.as_str())?;
            Some(RequestSpec {
                source,
                url,
                headers: vec![
                    (name.to_string(), key.to_string()),
                    ("Accept".to_string(), "application/json".to_string()),
                ],
            })
        }
    }
}
