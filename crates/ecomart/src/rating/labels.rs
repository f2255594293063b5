//! Display labels for the rating form's select options.

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"VAN - cargo"` becomes `"VAN - Cargo"`; segments are split on `" - "`.
pub fn vehicle_class_label(vehicle_class: &str) -> String {
    vehicle_class
        .split(" - ")
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" - ")
}

/// `"home_appliance"` becomes `"Home Appliance"`.
pub fn category_label(category: &str) -> String {
    category
        .split('_')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_are_title_cased() {
        assert_eq!(category_label("home_appliance"), "Home Appliance");
        assert_eq!(category_label("grocery"), "Grocery");
        assert_eq!(category_label(""), "");
    }

    #[test]
    fn vehicle_labels_keep_segment_separator() {
        assert_eq!(vehicle_class_label("PICKUP TRUCK - SMALL"), "PICKUP TRUCK - SMALL");
        assert_eq!(vehicle_class_label("van - cargo"), "Van - Cargo");
    }
}
