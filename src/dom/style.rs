//! Inline `style` attribute handling
//!
//! Only what the renderer and the table filter need: reading and writing
//! single declarations, and resolving a length to pixels.

use crate::sparkline::series::parse_decimal;

/// Parse `name: value; ...` into ordered pairs. Names are lowercased.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            Some((name, value.trim().to_string()))
        })
        .collect()
}

pub fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn get(style: &str, name: &str) -> Option<String> {
    let name = name.to_ascii_lowercase();
    parse_declarations(style)
        .into_iter()
        .rev()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}

/// Set or replace a declaration, keeping the order of the others
pub fn set(style: &str, name: &str, value: &str) -> String {
    let name = name.to_ascii_lowercase();
    let mut decls = parse_declarations(style);
    decls.retain(|(n, _)| *n != name);
    decls.push((name, value.to_string()));
    serialize_declarations(&decls)
}

pub fn remove(style: &str, name: &str) -> String {
    let name = name.to_ascii_lowercase();
    let mut decls = parse_declarations(style);
    decls.retain(|(n, _)| *n != name);
    serialize_declarations(&decls)
}

/// Resolve a CSS length to pixels. `auto`, percentages and other units are
/// unresolvable without layout and yield `None`.
pub fn resolve_length(value: &str, em_px: f64) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    let number = |text: &str| parse_decimal(text.trim()).filter(|v| v.is_finite());
    if let Some(px) = value.strip_suffix("px") {
        return number(px);
    }
    if let Some(em) = value.strip_suffix("em") {
        // `rem` is measured against the same root size here
        let em = em.strip_suffix('r').unwrap_or(em);
        return number(em).map(|v| v * em_px);
    }
    match number(&value) {
        Some(v) if v == 0.0 => Some(0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let decls = parse_declarations("Width: 100px; height:20px;; bogus");
        assert_eq!(
            decls,
            vec![
                ("width".to_string(), "100px".to_string()),
                ("height".to_string(), "20px".to_string()),
            ]
        );
    }

    #[test]
    fn test_get_last_wins() {
        assert_eq!(get("display: none; display: block", "display").as_deref(), Some("block"));
        assert_eq!(get("width: 1px", "display"), None);
    }

    #[test]
    fn test_set_replaces() {
        assert_eq!(set("display: none; color: red", "display", "inline"), "color: red; display: inline");
        assert_eq!(set("", "display", "inline"), "display: inline");
    }

    #[test]
    fn test_remove() {
        assert_eq!(remove("display: none; color: red", "display"), "color: red");
        assert_eq!(remove("display: none", "display"), "");
    }

    #[test]
    fn test_resolve_length() {
        assert_eq!(resolve_length("100px", 16.0), Some(100.0));
        assert_eq!(resolve_length(" 2em ", 16.0), Some(32.0));
        assert_eq!(resolve_length("1.5rem", 10.0), Some(15.0));
        assert_eq!(resolve_length("0", 16.0), Some(0.0));
        assert_eq!(resolve_length("auto", 16.0), None);
        assert_eq!(resolve_length("50%", 16.0), None);
        assert_eq!(resolve_length("12", 16.0), None);
    }

    #[test]
    fn test_resolve_length_rejects_non_numbers() {
        assert_eq!(resolve_length("NaNpx", 16.0), None);
        assert_eq!(resolve_length("infpx", 16.0), None);
        assert_eq!(resolve_length("Infinityem", 16.0), None);
        assert_eq!(resolve_length("nan", 16.0), None);
    }
}
