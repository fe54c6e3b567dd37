//! Announcement data structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization behind an announcement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneralInfo {
    /// Organizer name
    pub organization: String,

    /// Organizer legal address
    pub address: String,
}

/// Contact person for an announcement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One procurement line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lot {
    /// Lot name
    pub name: String,

    /// Extended description
    pub description: String,

    /// Price per unit, as printed on the page
    pub price_per_unit: String,

    /// Quantity, as printed on the page
    pub amount: String,
}

/// A procurement announcement scraped from the source site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    /// Full URL of the announcement page
    pub url: String,

    /// When this crawler first saw the announcement
    pub discovered_at: DateTime<Utc>,

    pub general_info: GeneralInfo,

    pub organizer: OrganizerContact,

    /// Lots in table order
    pub lots: Vec<Lot>,
}

impl Announcement {
    /// Create an empty announcement for the given URL, stamped with the current time.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            discovered_at: Utc::now(),
            general_info: GeneralInfo::default(),
            organizer: OrganizerContact::default(),
            lots: Vec::new(),
        }
    }
}

impl fmt::Display for OrganizerContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.name)?;
        writeln!(f, "  {}", self.email)?;
        writeln!(f, "  {}", self.phone)
    }
}

impl fmt::Display for GeneralInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Организация: {}", self.organization)?;
        writeln!(f, "  Адрес: {}", self.address)
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "  Наименование: {}", self.name)?;
        writeln!(f, "  Цена: {}", self.price_per_unit)?;
        writeln!(f, "  Количество: {}", self.amount)?;
        writeln!(f, "  Описание: {}", self.description)
    }
}

/// Chat rendering: organizer, general info, lots, then the link.
impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Организатор:")?;
        writeln!(f, "{}", self.organizer)?;
        writeln!(f, "Общая информация:")?;
        writeln!(f, "{}", self.general_info)?;
        writeln!(f, "Лоты:")?;
        for lot in &self.lots {
            write!(f, "{lot}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_announcement() -> Announcement {
        let mut announce = Announcement::new("https://example.com/ru/announce/index/1");
        announce.general_info = GeneralInfo {
            organization: "ACME Corp".to_string(),
            address: "Астана, ул. Кенесары 1".to_string(),
        };
        announce.organizer = OrganizerContact {
            name: "Иванов И.И.".to_string(),
            email: "ivanov@example.com".to_string(),
            phone: "+7 700 000 00 00".to_string(),
        };
        announce.lots = vec![Lot {
            name: "Dell Laptop".to_string(),
            description: "15-inch".to_string(),
            price_per_unit: "120000".to_string(),
            amount: "5".to_string(),
        }];
        announce
    }

    #[test]
    fn test_new_is_empty() {
        let announce = Announcement::new("https://example.com/a");
        assert_eq!(announce.url, "https://example.com/a");
        assert_eq!(announce.general_info, GeneralInfo::default());
        assert_eq!(announce.organizer, OrganizerContact::default());
        assert!(announce.lots.is_empty());
    }

    #[test]
    fn test_display_section_order() {
        let text = sample_announcement().to_string();

        let organizer = text.find("Организатор:").unwrap();
        let general = text.find("Общая информация:").unwrap();
        let lots = text.find("Лоты:").unwrap();
        assert!(organizer < general && general < lots);

        assert!(text.contains("  Иванов И.И.\n  ivanov@example.com\n  +7 700 000 00 00\n"));
        assert!(text.contains("  Организация: ACME Corp\n"));
        assert!(text.contains("  Наименование: Dell Laptop\n  Цена: 120000\n"));
        assert!(text.ends_with("https://example.com/ru/announce/index/1"));
    }

    #[test]
    fn test_display_without_lots() {
        let mut announce = sample_announcement();
        announce.lots.clear();
        let text = announce.to_string();
        assert!(text.contains("Лоты:\n\nhttps://example.com"));
    }
}
