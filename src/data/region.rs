//! Static region data for supported Paraguayan departments
//!
//! This module contains the static list of departments the weather endpoint
//! can serve, with the coordinates sent to the weather provider, and the
//! resolver that maps caller input onto a registry key.

use thiserror::Error;

use super::Region;

/// Static array of all supported departments
///
/// Each department is queried through the coordinates of its main city.
pub static REGIONS: [Region; 4] = [
    Region {
        key: "ASUNCION",
        name: "Asunción",
        latitude: -25.2637,
        longitude: -57.5759,
    },
    Region {
        key: "ALTO_PARANA",
        name: "Ciudad del Este (Alto Parana)",
        latitude: -25.5000,
        longitude: -54.6167,
    },
    Region {
        key: "CENTRAL",
        name: "San Lorenzo (Central)",
        latitude: -25.3333,
        longitude: -57.5000,
    },
    Region {
        key: "ITAPUA",
        name: "Encarnación (Itapúa)",
        latitude: -27.3333,
        longitude: -56.0000,
    },
];

/// Errors that can occur when resolving a region name
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    /// The name does not match any supported department
    #[error("Department '{name}' not found or not supported. Supported departments: {}", supported.join(", "))]
    NotFound {
        name: String,
        supported: Vec<&'static str>,
    },
}

/// Get a region by its exact registry key
///
/// # Arguments
///
/// * `key` - The uppercase registry key (e.g., "ASUNCION", "ITAPUA")
///
/// # Returns
///
/// Returns `Some(&Region)` if found, `None` otherwise
pub fn get_region_by_key(key: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|region| region.key == key)
}

/// Get all supported regions
pub fn all_regions() -> &'static [Region] {
    &REGIONS
}

/// Registry keys of all supported regions, in registry order
pub fn supported_keys() -> Vec<&'static str> {
    REGIONS.iter().map(|region| region.key).collect()
}

/// Resolves a caller-supplied department name to a registry entry
///
/// Matching is case-insensitive: the name is trimmed and uppercased before
/// the lookup.
///
/// # Returns
/// * `Ok(&Region)` if the name matches a supported department
/// * `Err(RegionError::NotFound)` carrying the supported keys otherwise
pub fn resolve(name: &str) -> Result<&'static Region, RegionError> {
    let key = name.trim().to_uppercase();
    get_region_by_key(&key).ok_or_else(|| RegionError::NotFound {
        name: name.to_string(),
        supported: supported_keys(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_array_has_4_entries() {
        assert_eq!(REGIONS.len(), 4);
        assert_eq!(all_regions().len(), 4);
    }

    #[test]
    fn test_each_region_has_valid_paraguay_coordinates() {
        // Paraguay latitude range: -19.3 to -27.6
        // Paraguay longitude range: -54.2 to -62.7
        for region in all_regions() {
            assert!(
                region.latitude <= -19.0 && region.latitude >= -28.0,
                "Region {} has invalid latitude: {}",
                region.key,
                region.latitude
            );
            assert!(
                region.longitude <= -54.0 && region.longitude >= -63.0,
                "Region {} has invalid longitude: {}",
                region.key,
                region.longitude
            );
        }
    }

    #[test]
    fn test_all_regions_have_unique_uppercase_keys() {
        let mut keys: Vec<&str> = all_regions().iter().map(|r| r.key).collect();
        for key in &keys {
            assert_eq!(*key, key.to_uppercase(), "Key {} is not uppercase", key);
        }
        keys.sort();
        let original_len = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), original_len, "Region keys are not unique");
    }

    #[test]
    fn test_get_region_by_key_is_case_sensitive() {
        assert!(get_region_by_key("ASUNCION").is_some());
        assert!(get_region_by_key("asuncion").is_none());
        assert!(get_region_by_key("").is_none());
    }

    #[test]
    fn test_resolve_accepts_any_casing() {
        for region in all_regions() {
            let lower = region.key.to_lowercase();
            let mixed: String = region
                .key
                .chars()
                .enumerate()
                .map(|(i, c)| if i % 2 == 0 { c.to_ascii_lowercase() } else { c })
                .collect();

            for name in [region.key.to_string(), lower, mixed] {
                let resolved = resolve(&name).expect("Supported region should resolve");
                assert_eq!(resolved.key, region.key);
            }
        }
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        assert_eq!(resolve("  itapua ").unwrap().key, "ITAPUA");
    }

    #[test]
    fn test_resolve_unknown_lists_supported_keys() {
        let err = resolve("Boqueron").unwrap_err();
        let RegionError::NotFound { name, supported } = &err;
        assert_eq!(name, "Boqueron");
        assert_eq!(supported, &vec!["ASUNCION", "ALTO_PARANA", "CENTRAL", "ITAPUA"]);

        let message = err.to_string();
        assert!(message.contains("Boqueron"));
        assert!(message.contains("ASUNCION, ALTO_PARANA, CENTRAL, ITAPUA"));
    }

    #[test]
    fn test_specific_region_coordinates() {
        let test_cases = [
            ("ASUNCION", -25.2637, -57.5759),
            ("ALTO_PARANA", -25.5000, -54.6167),
            ("CENTRAL", -25.3333, -57.5000),
            ("ITAPUA", -27.3333, -56.0000),
        ];

        for (key, expected_lat, expected_lon) in test_cases {
            let region = get_region_by_key(key).expect("Region not found");
            assert!((region.latitude - expected_lat).abs() < 0.0001);
            assert!((region.longitude - expected_lon).abs() < 0.0001);
        }
    }
}
