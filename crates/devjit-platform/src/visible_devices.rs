//! Parsing of accelerator allow-lists.

use std::collections::BTreeSet;

use crate::config::ConfigSource;
use crate::error::{JitError, Result};

/// Accelerator ordinals a client may use. `None` means no restriction.
pub type AllowedDevices = Option<BTreeSet<i32>>;

/// Parse a comma-separated list of device ordinals.
///
/// An empty list means "no restriction" and yields `None`, never an empty
/// set. Duplicate ordinals collapse.
pub fn parse_visible_device_list(visible_device_list: &str) -> Result<AllowedDevices> {
    if visible_device_list.is_empty() {
        return Ok(None);
    }
    let mut ordinals = BTreeSet::new();
    for entry in visible_device_list.split(',') {
        let ordinal = entry
            .trim_matches(|c: char| c.is_ascii_whitespace())
            .parse::<i32>()
            .map_err(|_| JitError::InvalidArgument {
                message: format!(
                    "could not parse entry in 'visible_device_list': '{entry}'. \
                     visible_device_list = {visible_device_list}"
                ),
            })?;
        ordinals.insert(ordinal);
    }
    Ok(Some(ordinals))
}

/// Allow-list carried by `source`'s session configuration.
///
/// A source without a session configuration is unrestricted.
pub fn allowed_devices(source: &dyn ConfigSource) -> Result<AllowedDevices> {
    match source.session_config() {
        Some(config) => parse_visible_device_list(&config.gpu_options.visible_device_list),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn set(ordinals: &[i32]) -> BTreeSet<i32> {
        ordinals.iter().copied().collect()
    }

    #[test]
    fn empty_is_unrestricted() {
        assert_eq!(parse_visible_device_list("").unwrap(), None);
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(
            parse_visible_device_list("0,1,1,2").unwrap(),
            Some(set(&[0, 1, 2]))
        );
    }

    #[test]
    fn order_is_irrelevant() {
        let a = parse_visible_device_list("3,1,2").unwrap();
        let b = parse_visible_device_list("2,3,1,3").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Some(set(&[1, 2, 3])));
    }

    #[test]
    fn single_entry() {
        assert_eq!(parse_visible_device_list("7").unwrap(), Some(set(&[7])));
    }

    #[test]
    fn accepts_signs_and_surrounding_whitespace() {
        assert_eq!(
            parse_visible_device_list(" 0, +1 ,-2").unwrap(),
            Some(set(&[-2, 0, 1]))
        );
    }

    #[test]
    fn bad_token_names_token_and_input() {
        let err = parse_visible_device_list("0,x").unwrap_err();
        assert!(err.is_invalid_argument());
        let message = err.to_string();
        assert!(message.contains("'x'"), "{message}");
        assert!(message.contains("visible_device_list = 0,x"), "{message}");
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = parse_visible_device_list("0,,1").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("''"));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = parse_visible_device_list("4294967296").unwrap_err();
        assert!(err.to_string().contains("'4294967296'"));
    }

    #[test]
    fn allowed_devices_from_config() {
        assert_eq!(allowed_devices(&()).unwrap(), None);
        let config = SessionConfig::with_visible_devices("1,0");
        assert_eq!(allowed_devices(&config).unwrap(), Some(set(&[0, 1])));
        let unrestricted = SessionConfig::default();
        assert_eq!(allowed_devices(&unrestricted).unwrap(), None);
    }

    #[test]
    fn allowed_devices_propagates_parse_failure() {
        let config = SessionConfig::with_visible_devices("gpu0");
        assert!(allowed_devices(&config).unwrap_err().is_invalid_argument());
    }
}
