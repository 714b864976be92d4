//! Case conversion for query-string keys. Clients send `pageSize`, `PageSize` or `page_size`;
//! handlers look keys up in snake_case.

use std::collections::HashMap;

/// Convert camelCase or PascalCase to snake_case. Acronym runs stay together:
/// "categoryId" -> "category_id", "SortBy" -> "sort_by", "CategoryID" -> "category_id".
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map(char::is_lowercase).unwrap_or(false),
                Some(_) => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Re-key a query map to snake_case. When two spellings collide the first one seen wins.
pub fn hashmap_keys_to_snake_case(map: HashMap<String, String>) -> HashMap<String, String> {
    let mut out = HashMap::with_capacity(map.len());
    for (k, v) in map {
        out.entry(to_snake_case(&k)).or_insert(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_accepts_camel_and_pascal() {
        assert_eq!(to_snake_case("pageSize"), "page_size");
        assert_eq!(to_snake_case("PageSize"), "page_size");
        assert_eq!(to_snake_case("page_size"), "page_size");
        assert_eq!(to_snake_case("CategoryID"), "category_id");
        assert_eq!(to_snake_case("HTTPStatus"), "http_status");
        assert_eq!(to_snake_case("q"), "q");
    }

    #[test]
    fn rekeys_query_maps() {
        let map = HashMap::from([
            ("SortBy".to_string(), "title".to_string()),
            ("categoryId".to_string(), "3".to_string()),
        ]);
        let out = hashmap_keys_to_snake_case(map);
        assert_eq!(out.get("sort_by").map(String::as_str), Some("title"));
        assert_eq!(out.get("category_id").map(String::as_str), Some("3"));
    }
}
