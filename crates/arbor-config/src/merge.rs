//! Layer merging.

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> toml::Value {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_tables_merge_per_field() {
        let mut base = parse("[server]\nbase_url = \"http://a\"\ntimeout_secs = 5\n");
        deep_merge(&mut base, &parse("[server]\ntimeout_secs = 9\n"));

        assert_eq!(base["server"]["base_url"].as_str(), Some("http://a"));
        assert_eq!(base["server"]["timeout_secs"].as_integer(), Some(9));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = parse("[logging]\ndirectives = [\"a=debug\", \"b=warn\"]\n");
        deep_merge(&mut base, &parse("[logging]\ndirectives = [\"c=trace\"]\n"));

        let directives = base["logging"]["directives"].as_array().unwrap();
        assert_eq!(directives.len(), 1);
    }

    #[test]
    fn test_new_sections_are_added() {
        let mut base = parse("[server]\ntimeout_secs = 5\n");
        deep_merge(&mut base, &parse("[bus]\ncapacity = 8\n"));
        assert_eq!(base["bus"]["capacity"].as_integer(), Some(8));
    }
}
