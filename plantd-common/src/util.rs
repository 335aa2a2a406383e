//! Small helpers shared by list views, dashboards and the REST layer

use std::cmp::Ordering;

pub const DEFAULT_NAMESPACE: &str = "default";

/// Orders namespaces with `default` first, then lexicographically
pub fn sort_namespace(a: &str, b: &str) -> Ordering {
    match (a == DEFAULT_NAMESPACE, b == DEFAULT_NAMESPACE) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

/// Step between `n` evenly spaced samples in `[start, end]`, never below 1
pub fn get_step(start: i64, end: i64, n: u32) -> i64 {
    let span = end - start;
    if n < 2 {
        return span.max(1);
    }
    span.div_euclid(i64::from(n) - 1).max(1)
}

/// Joins the non-empty segments with `/`
pub fn concat_in_path(segments: &[Option<&str>]) -> String {
    segments
        .iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace_sorts_first() {
        assert_eq!(sort_namespace("default", "aaa"), Ordering::Less);
        assert_eq!(sort_namespace("aaa", "default"), Ordering::Greater);
        assert_eq!(sort_namespace("default", "default"), Ordering::Equal);
        assert_eq!(sort_namespace("b", "a"), Ordering::Greater);
        assert_eq!(sort_namespace("team", "team"), Ordering::Equal);

        let mut namespaces = vec!["zeta", "default", "alpha"];
        namespaces.sort_by(|a, b| sort_namespace(a, b));
        assert_eq!(namespaces, vec!["default", "alpha", "zeta"]);
    }

    #[test]
    fn test_get_step() {
        assert_eq!(get_step(0, 10, 2), 10);
        assert_eq!(get_step(0, 10, 11), 1);
        assert_eq!(get_step(0, 10, 4), 3);
        assert_eq!(get_step(0, 10, 100), 1);
        assert_eq!(get_step(5, 5, 10), 1);
        assert_eq!(get_step(0, 10, 1), 10);
    }

    #[test]
    fn test_concat_in_path() {
        assert_eq!(concat_in_path(&[None, Some("a"), None, Some("b")]), "a/b");
        assert_eq!(concat_in_path(&[Some(""), Some("a")]), "a");
        assert_eq!(concat_in_path(&[None, None]), "");
    }
}
