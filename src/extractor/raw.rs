//! The loosely typed JSON the extraction collaborator prints (`yt-dlp -J`).
//!
//! Every field is optional and a value of an unexpected type reads as absent
//! rather than failing the whole document.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawMediaInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uploader: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub upload_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub view_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub like_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawFormat {
    #[serde(default, deserialize_with = "lenient")]
    pub format_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ext: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub format_note: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub filesize: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub filesize_approx: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub vcodec: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub acodec: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub fps: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tbr: Option<f64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// Entries that are not objects are skipped; the rest keep their order.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<RawFormat>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
