/// Places returned by keyword search
///
/// The backend proxies the Kakao local keyword search and returns its
/// `documents` as [`Place`]s. Coordinates stay as strings because that is how
/// the provider sends them. A place typed without searching keeps only
/// `place_name`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Place {
    pub place_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_address_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_url: Option<String>,

    /// Provider's place id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Longitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Latitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Place {
    /// Free-text location with no search result behind it
    pub fn from_text(name: impl Into<String>) -> Self {
        Self {
            place_name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the place came from a search result
    pub fn is_searched(&self) -> bool {
        self.id.is_some()
    }
}

/// Body of the keyword search endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceSearchResponse {
    pub documents: Vec<Place>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_document() {
        let body = r#"{
            "documents": [{
                "address_name": "서울 강남구 역삼동 858",
                "category_group_code": "SW8",
                "distance": "",
                "id": "21160803",
                "phone": "02-6110-2221",
                "place_name": "강남역 2호선",
                "place_url": "http://place.map.kakao.com/21160803",
                "road_address_name": "서울 강남구 강남대로 396",
                "x": "127.02800140627488",
                "y": "37.49808633653005"
            }],
            "meta": { "is_end": true, "pageable_count": 1, "total_count": 1 }
        }"#;

        let parsed: PlaceSearchResponse = serde_json::from_str(body).expect("Should parse");
        let place = &parsed.documents[0];

        assert_eq!(place.place_name, "강남역 2호선");
        assert_eq!(place.id.as_deref(), Some("21160803"));
        assert_eq!(place.y.as_deref(), Some("37.49808633653005"));
        assert!(place.is_searched());
    }

    #[test]
    fn test_free_text_place() {
        let place = Place::from_text("우리 집");
        let json = serde_json::to_value(&place).expect("Should serialize");

        assert!(!place.is_searched());
        assert_eq!(json, serde_json::json!({ "place_name": "우리 집" }));
    }
}
