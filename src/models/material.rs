use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "material_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Pdf,
    Image,
    Video,
    Audio,
    Document,
    Archive,
}

impl MaterialType {
    pub const ALL: [MaterialType; 6] = [
        MaterialType::Pdf,
        MaterialType::Image,
        MaterialType::Video,
        MaterialType::Audio,
        MaterialType::Document,
        MaterialType::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Pdf => "pdf",
            MaterialType::Image => "image",
            MaterialType::Video => "video",
            MaterialType::Audio => "audio",
            MaterialType::Document => "document",
            MaterialType::Archive => "archive",
        }
    }
}

impl std::str::FromStr for MaterialType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaterialType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl std::fmt::Display for MaterialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
