use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub announcement_type: AnnouncementKind,
    pub department_id: i64,
    pub author_id: i64,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    /// Only ever set for assignments.
    pub due_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    Announcement,
    Assignment,
    Notice,
}

impl AnnouncementKind {
    pub const ALL: [AnnouncementKind; 3] = [
        AnnouncementKind::Announcement,
        AnnouncementKind::Assignment,
        AnnouncementKind::Notice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementKind::Announcement => "announcement",
            AnnouncementKind::Assignment => "assignment",
            AnnouncementKind::Notice => "notice",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnnouncementKind::Announcement => "Announcement",
            AnnouncementKind::Assignment => "Assignment",
            AnnouncementKind::Notice => "Notice",
        }
    }
}

impl fmt::Display for AnnouncementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnouncementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "announcement" => Ok(AnnouncementKind::Announcement),
            "assignment" => Ok(AnnouncementKind::Assignment),
            "notice" => Ok(AnnouncementKind::Notice),
            other => Err(format!("Invalid announcement type: {}", other)),
        }
    }
}

/// `?type=` filter of the listing page. Anything unrecognised means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(AnnouncementKind),
}

impl KindFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse::<AnnouncementKind>().ok())
            .map(KindFilter::Only)
            .unwrap_or(KindFilter::All)
    }

    pub fn kind(&self) -> Option<AnnouncementKind> {
        match self {
            KindFilter::All => None,
            KindFilter::Only(kind) => Some(*kind),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KindFilter::All => "all",
            KindFilter::Only(kind) => kind.as_str(),
        }
    }
}

/// Stored attachment: the generated on-disk name and the name shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub original_name: String,
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub announcement_type: AnnouncementKind,
    pub department_id: i64,
    pub author_id: i64,
    pub file: Option<StoredFile>,
    pub due_date: Option<NaiveDateTime>,
}

/// Input to the create operation before authorization and normalisation.
#[derive(Debug, Clone)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    pub announcement_type: AnnouncementKind,
    pub due_date: Option<NaiveDateTime>,
    pub file: Option<StoredFile>,
}
