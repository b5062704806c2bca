//! Jikan search response types.
//!
//! Only the fields the catalog renders are modeled; everything else in the
//! Jikan payload is ignored. Missing fields default rather than fail, since
//! the API omits score and images for some entries.

use serde::{Deserialize, Serialize};

/// Response envelope from the Jikan `/anime` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Anime>,
}

/// One search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anime {
    pub mal_id: u64,
    pub title: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub images: Images,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Images {
    #[serde(default)]
    pub jpg: JpgImage,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JpgImage {
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_payload() {
        let json = r#"{
            "data": [
                {
                    "mal_id": 5114,
                    "title": "Fullmetal Alchemist: Brotherhood",
                    "score": 9.1,
                    "images": {
                        "jpg": {
                            "large_image_url": "https://cdn.myanimelist.net/images/anime/1208/94745l.jpg"
                        }
                    }
                }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 1);
        let anime = &response.data[0];
        assert_eq!(anime.mal_id, 5114);
        assert_eq!(anime.title, "Fullmetal Alchemist: Brotherhood");
        assert_eq!(anime.score, Some(9.1));
        assert_eq!(
            anime.images.jpg.large_image_url.as_deref(),
            Some("https://cdn.myanimelist.net/images/anime/1208/94745l.jpg")
        );
    }

    #[test]
    fn test_deserialize_missing_optionals() {
        let json = r#"{"data": [{"mal_id": 1, "title": "Cowboy Bebop", "score": null}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let anime = &response.data[0];
        assert_eq!(anime.score, None);
        assert!(anime.images.jpg.large_image_url.is_none());
    }

    #[test]
    fn test_deserialize_empty_data() {
        let response: SearchResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_deserialize_missing_data_field() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.data.is_empty());
    }
}
