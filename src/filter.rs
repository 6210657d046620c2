/// Tag-based eligibility: `not` excludes, `only` requires
use crate::source::Item;

fn intersects(constraint: &[String], tags: &[String]) -> bool {
    tags.iter().any(|tag| constraint.contains(tag))
}

fn passes_not(item: &Item, tags: &[String]) -> bool {
    item.not.is_empty() || !intersects(&item.not, tags)
}

fn passes_only(item: &Item, tags: &[String]) -> bool {
    if item.only.is_empty() {
        return true;
    }
    !tags.is_empty() && intersects(&item.only, tags)
}

/// Check whether an item may be drawn given the tags accumulated so far
pub fn is_eligible(item: &Item, tags: &[String]) -> bool {
    passes_not(item, tags) && passes_only(item, tags)
}

/// Narrow `items` to those eligible under `tags`, preserving order
pub fn filter_eligible<'a>(items: &'a [Item], tags: &[String]) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| passes_not(item, tags))
        .filter(|item| passes_only(item, tags))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unconstrained_always_eligible() {
        let item = Item::new("x");
        assert!(is_eligible(&item, &[]));
        assert!(is_eligible(&item, &tags(&["a", "b"])));
    }

    #[test]
    fn test_only_requires_tag() {
        let item = Item::new("x").only(["a"]);
        assert!(!is_eligible(&item, &[]));
        assert!(!is_eligible(&item, &tags(&["b"])));
        assert!(is_eligible(&item, &tags(&["b", "a"])));
    }

    #[test]
    fn test_not_wins_over_only() {
        let item = Item::new("x").only(["a"]).not(["x"]);
        assert!(!is_eligible(&item, &tags(&["a", "x"])));
        assert!(is_eligible(&item, &tags(&["a"])));
    }

    #[test]
    fn test_not_with_no_tags() {
        let item = Item::new("x").not(["x"]);
        assert!(is_eligible(&item, &[]));
    }

    #[test]
    fn test_filter_preserves_order() {
        let items = vec![
            Item::new(1).only(["big"]),
            Item::new(2),
            Item::new(3).not(["big"]),
            Item::new(4).only(["big", "small"]),
        ];
        let kept: Vec<f64> = filter_eligible(&items, &tags(&["big"]))
            .iter()
            .map(|item| item.value.preview().parse().unwrap())
            .collect();
        assert_eq!(kept, vec![1.0, 2.0, 4.0]);
    }
}
