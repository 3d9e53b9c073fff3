//! JSON output for collected items.
//!
//! # Output Structure
//!
//! One file per run, named after what was requested:
//! ```text
//! output_dir/
//! ├── 2025-09-16.json               # date
//! ├── 2025-09-14_2025-09-16.json    # range
//! ├── latest_20.json                # latest
//! └── recent_24h.json               # recent
//! ```

use crate::models::Collection;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize a [`Collection`] as pretty JSON.
pub fn to_pretty_json(collection: &Collection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(collection)
}

/// Write a [`Collection`] to `{output_dir}/{label}.json`.
///
/// Creates `output_dir` if needed and returns the path written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, label = %label))]
pub async fn write_collection(
    collection: &Collection,
    output_dir: &str,
    label: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = to_pretty_json(collection)?;

    info!(%output_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = PathBuf::from(output_dir).join(format!("{label}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), items = collection.items.len(), "Wrote collection JSON");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectWarning, Item, TimeConfidence};
    use chrono::NaiveDate;

    fn collection() -> Collection {
        Collection {
            items: vec![Item {
                id: 21001,
                title: "腾讯混元大模型发布新版本".to_string(),
                url: "https://news.aibase.com/zh/news/21001".to_string(),
                published_at: NaiveDate::from_ymd_opt(2025, 9, 16)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap(),
                raw_time_text: "2025年9月16日 10:30".to_string(),
                time_confidence: TimeConfidence::Absolute,
                content: "正文".to_string(),
                images: Vec::new(),
                source: "AIBase快讯".to_string(),
                source_weight: 5,
            }],
            warnings: vec![CollectWarning::FeedExhausted { batches: 25 }],
        }
    }

    #[tokio::test]
    async fn test_write_collection_round_trips() {
        let dir = std::env::temp_dir().join(format!("fnc_json_{}", std::process::id()));
        let dir_str = dir.to_string_lossy().into_owned();

        let path = write_collection(&collection(), &dir_str, "2025-09-16")
            .await
            .unwrap();
        assert!(path.ends_with("2025-09-16.json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: Collection = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, collection());
        assert!(raw.contains(r#""publishedAt": "2025-09-16 10:30:00""#));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
