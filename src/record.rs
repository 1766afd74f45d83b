use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One extracted business listing. Every field defaults independently, so a
/// record is always serializable no matter which extractors came up empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyRecord {
    pub name: String,
    pub address: String,
    pub url: String,
    pub id: String,
    pub website: String,
    pub opening_hours: Vec<String>,
    /// Item name -> price, in document order.
    pub goods: IndexMap<String, String>,
    pub phones: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub rating: String,
    pub reviews: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_serializes_every_field() {
        let value = serde_json::to_value(CompanyRecord::default()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "name", "address", "url", "id", "website", "openingHours", "goods", "phones",
            "categories", "rating", "reviews",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(obj["goods"].is_object());
        assert!(obj["phones"].is_array());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let record: CompanyRecord =
            serde_json::from_str(r#"{"name":"Кафе","phones":["+7 495 000-00-00"]}"#).unwrap();
        assert_eq!(record.name, "Кафе");
        assert_eq!(record.phones.len(), 1);
        assert!(record.reviews.is_empty());
        assert!(record.goods.is_empty());
    }

    #[test]
    fn goods_keep_insertion_order() {
        let mut record = CompanyRecord::default();
        record.goods.insert("Борщ".into(), "350 ₽".into());
        record.goods.insert("Блины".into(), "200 ₽".into());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.find("Борщ").unwrap() < json.find("Блины").unwrap());
    }
}
