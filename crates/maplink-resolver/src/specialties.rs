use serde_json::Value;

/// Keys a provider profile may store its map link under, in lookup order.
const MAPS_URL_KEYS: [&str; 4] = ["mapsUrl", "maps_url", "googleMapsUrl", "google_maps_url"];

/// Map URL stored in a provider's free-form "specialties" object.
///
/// The first key with a non-blank value wins. Non-string scalars are
/// stringified; anything that is not an object yields `None`.
#[must_use]
pub fn maps_url_from_specialties(specialties: &Value) -> Option<String> {
    let object = specialties.as_object()?;
    MAPS_URL_KEYS.iter().find_map(|&key| {
        let text = match object.get(key)? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_owned(),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    })
}
