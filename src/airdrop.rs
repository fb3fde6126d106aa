use anyhow::{Result, anyhow};

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_WEBSITE_LEN: usize = 2048;
pub const MAX_HANDLE_LEN: usize = 128;
pub const MAX_WALLET_ADDRESS_LEN: usize = 128;
pub const MAX_NOTES_LEN: usize = 4096;

pub const CATEGORY_DELIMITER: char = ',';

/// Fixed tag vocabulary offered by the add/edit forms. Every entry is
/// delimiter-free, which is what keeps the comma-joined persistence lossless.
pub const CATEGORY_VOCABULARY: &[&str] = &[
    "Whitelist",
    "Testnet",
    "Social Media",
    "Web",
    "Depin",
    "Light Node",
    "Mini Apps",
];

const _: [(); 32 - CATEGORY_VOCABULARY.len()] = [(); 32 - CATEGORY_VOCABULARY.len()];

pub const STATUS_SELESAI: &str = "Selesai";
pub const STATUS_DELAY: &str = "Delay";
pub const STATUS_BELUM_BERJALAN: &str = "Belum Berjalan";
pub const STATUS_SEDANG_BERJALAN: &str = "Sedang Berjalan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirdropStatus {
    Selesai,
    Delay,
    BelumBerjalan,
    SedangBerjalan,
}

impl AirdropStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Selesai => STATUS_SELESAI,
            Self::Delay => STATUS_DELAY,
            Self::BelumBerjalan => STATUS_BELUM_BERJALAN,
            Self::SedangBerjalan => STATUS_SEDANG_BERJALAN,
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        let status = match value.trim() {
            STATUS_SELESAI => Self::Selesai,
            STATUS_DELAY => Self::Delay,
            STATUS_BELUM_BERJALAN => Self::BelumBerjalan,
            STATUS_SEDANG_BERJALAN => Self::SedangBerjalan,
            other => {
                return Err(anyhow!("Unsupported status value: {other}"));
            }
        };
        Ok(status)
    }
}

/// Validates a set of tags against the vocabulary and joins them with the
/// persistence delimiter. Duplicate tags are collapsed, input order kept.
pub fn join_categories(tags: &[String]) -> Result<String> {
    if tags.len() > 32 {
        return Err(anyhow!("Tag list exceeds the defensive bound of 32 entries"));
    }
    let mut seen: Vec<&str> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Category tag cannot be empty"));
        }
        if trimmed.contains(CATEGORY_DELIMITER) {
            return Err(anyhow!(
                "Category tag '{trimmed}' contains the reserved delimiter"
            ));
        }
        if !CATEGORY_VOCABULARY.contains(&trimmed) {
            return Err(anyhow!("Unknown category tag: {trimmed}"));
        }
        if !seen.contains(&trimmed) {
            seen.push(trimmed);
        }
    }
    Ok(seen.join(","))
}

/// Splits a persisted category string back into tags: split on the delimiter,
/// trim whitespace, drop empties.
pub fn split_categories(value: &str) -> Vec<String> {
    value
        .split(CATEGORY_DELIMITER)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn canonicalize_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Project name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(anyhow!("Project name exceeds {MAX_NAME_LEN} character limit"));
    }
    Ok(trimmed.to_string())
}

pub fn canonicalize_website(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Website URL cannot be empty"));
    }
    if trimmed.len() > MAX_WEBSITE_LEN {
        return Err(anyhow!("Website URL exceeds {MAX_WEBSITE_LEN} character limit"));
    }
    Ok(trimmed.to_string())
}

pub fn canonicalize_handle(value: Option<&str>, label: &str) -> Result<Option<String>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_HANDLE_LEN {
        return Err(anyhow!("{label} exceeds {MAX_HANDLE_LEN} character limit"));
    }
    Ok(Some(trimmed.to_string()))
}

pub fn canonicalize_wallet(value: Option<&str>) -> Result<Option<String>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_WALLET_ADDRESS_LEN {
        return Err(anyhow!(
            "Wallet address exceeds {MAX_WALLET_ADDRESS_LEN} character limit"
        ));
    }
    Ok(Some(trimmed.to_string()))
}

pub fn canonicalize_notes(value: Option<&str>) -> Result<Option<String>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    if raw.chars().count() > MAX_NOTES_LEN {
        return Err(anyhow!("Notes exceed {MAX_NOTES_LEN} character limit"));
    }
    Ok(Some(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [
            AirdropStatus::Selesai,
            AirdropStatus::Delay,
            AirdropStatus::BelumBerjalan,
            AirdropStatus::SedangBerjalan,
        ] {
            assert_eq!(AirdropStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(AirdropStatus::parse("Done").is_err());
        assert_eq!(
            AirdropStatus::parse("  Selesai ").unwrap(),
            AirdropStatus::Selesai
        );
    }

    #[test]
    fn category_roundtrip() {
        let tags = vec!["Web".to_string(), "Testnet".to_string()];
        let joined = join_categories(&tags).unwrap();
        assert_eq!(joined, "Web,Testnet");
        assert_eq!(split_categories(&joined), tags);
    }

    #[test]
    fn category_split_trims_and_drops_empties() {
        assert_eq!(
            split_categories(" Web , , Testnet ,"),
            vec!["Web".to_string(), "Testnet".to_string()]
        );
        assert!(split_categories("").is_empty());
    }

    #[test]
    fn category_rejects_unknown_tags() {
        let tags = vec!["Rugpull".to_string()];
        assert!(join_categories(&tags).is_err());
    }

    #[test]
    fn category_rejects_delimiter_in_tag() {
        let tags = vec!["Web,Testnet".to_string()];
        assert!(join_categories(&tags).is_err());
    }

    #[test]
    fn category_collapses_duplicates() {
        let tags = vec!["Web".to_string(), "Web".to_string()];
        assert_eq!(join_categories(&tags).unwrap(), "Web");
    }

    #[test]
    fn name_validation() {
        assert_eq!(canonicalize_name("  Foo ").unwrap(), "Foo");
        assert!(canonicalize_name("   ").is_err());
        let long_name = "a".repeat(MAX_NAME_LEN + 1);
        assert!(canonicalize_name(&long_name).is_err());
    }

    #[test]
    fn optional_fields_blank_to_none() {
        assert!(canonicalize_handle(Some("  "), "Twitter").unwrap().is_none());
        assert!(canonicalize_handle(None, "Twitter").unwrap().is_none());
        assert_eq!(
            canonicalize_handle(Some("@garapan"), "Twitter").unwrap(),
            Some("@garapan".to_string())
        );
        assert!(canonicalize_wallet(Some("")).unwrap().is_none());
        assert!(canonicalize_notes(Some(" \n ")).unwrap().is_none());
    }
}
