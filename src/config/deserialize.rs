// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Accepts ports written either as integers or as numeric strings.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortEntry {
    Number(u64),
    Text(String),
}

impl PortEntry {
    fn into_port(self) -> Result<u16, String> {
        match self {
            PortEntry::Number(n) => u16::try_from(n).map_err(|_| format!("invalid port: {}", n)),
            PortEntry::Text(s) => s
                .trim()
                .parse::<u16>()
                .map_err(|_| format!("invalid port: {}", s)),
        }
    }
}

pub fn port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<PortEntry> = Option::deserialize(deserializer)?;
    opt.map(PortEntry::into_port)
        .transpose()
        .map_err(serde::de::Error::custom)
}
