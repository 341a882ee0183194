use scraper::ElementRef;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Text of the element's own text nodes only, skipping child elements.
/// The widget nests a type badge `<span>` inside the class name div.
pub fn extract_direct_text(node: ElementRef) -> String {
    node.children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// "water_aerobics" -> "Water Aerobics", for when the widget gives us a
/// machine name but no display name.
pub fn humanize_raw_name(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + chars.as_str().to_lowercase().as_str()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
