use anyhow::{anyhow, Result};

pub const DEFAULT_HUB_URL: &str = "http://geo.craigslist.org/iso/";

/// A country searched as one unit. The name goes into report filenames, the
/// code onto the hub URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub name: String,
    pub code: String,
}

impl Region {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    pub fn hub_url(&self, base: &str) -> String {
        format!("{}{}", base, self.code)
    }

    /// Parses `Name=code,Name=code`.
    pub fn parse_list(list: &str) -> Result<Vec<Region>> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (name, code) = entry
                    .split_once('=')
                    .ok_or_else(|| anyhow!("region '{}' is not in Name=code form", entry))?;
                let (name, code) = (name.trim(), code.trim());
                if name.is_empty() || code.is_empty() {
                    return Err(anyhow!("region '{}' has an empty name or code", entry));
                }
                Ok(Region::new(name, code))
            })
            .collect()
    }
}

pub fn default_regions() -> Vec<Region> {
    [
        ("Australia", "au"),
        ("Canada", "ca"),
        ("Japan", "jp"),
        ("New_Zealand", "nz"),
        ("South_Africa", "za"),
        ("UK", "gb"),
        ("USA", "us"),
    ]
    .into_iter()
    .map(|(name, code)| Region::new(name, code))
    .collect()
}
