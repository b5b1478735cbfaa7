use std::collections::HashMap;

use uuid::Uuid;

/// Total prep and cook time of every recipe in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDurations {
    pub category: String,
    pub total_prep_duration: i64,
    pub total_cook_duration: i64,
}

/// Sum recipe durations per category.
///
/// `categories` are (id, name) pairs and decide the output order.
/// `links` are (category id, prep, cook), one per recipe in that category.
/// Categories without recipes report zero.
pub fn sum_durations(
    categories: &[(Uuid, String)],
    links: &[(Uuid, i32, i32)],
) -> Vec<CategoryDurations> {
    let mut totals: HashMap<Uuid, (i64, i64)> = HashMap::new();
    for (category_id, prep, cook) in links {
        let entry = totals.entry(*category_id).or_default();
        entry.0 += i64::from(*prep);
        entry.1 += i64::from(*cook);
    }

    categories
        .iter()
        .map(|(id, name)| {
            let (prep, cook) = totals.get(id).copied().unwrap_or_default();
            CategoryDurations {
                category: name.clone(),
                total_prep_duration: prep,
                total_cook_duration: cook,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_per_category() {
        let dessert = Uuid::new_v4();
        let empty = Uuid::new_v4();
        let categories = vec![(dessert, "Dessert".to_string()), (empty, "Empty".to_string())];
        let links = vec![(dessert, 10, 20), (dessert, 5, 5)];

        let totals = sum_durations(&categories, &links);
        assert_eq!(
            totals,
            vec![
                CategoryDurations {
                    category: "Dessert".to_string(),
                    total_prep_duration: 15,
                    total_cook_duration: 25,
                },
                CategoryDurations {
                    category: "Empty".to_string(),
                    total_prep_duration: 0,
                    total_cook_duration: 0,
                },
            ]
        );
    }

    #[test]
    fn test_negative_durations_are_summed_as_is() {
        let id = Uuid::new_v4();
        let totals = sum_durations(&[(id, "Odd".to_string())], &[(id, -5, 3), (id, 2, -10)]);
        assert_eq!(totals[0].total_prep_duration, -3);
        assert_eq!(totals[0].total_cook_duration, -7);
    }

    #[test]
    fn test_large_totals_do_not_overflow() {
        let id = Uuid::new_v4();
        let totals = sum_durations(&[(id, "Long".to_string())], &[(id, i32::MAX, 0), (id, i32::MAX, 0)]);
        assert_eq!(totals[0].total_prep_duration, 2 * i64::from(i32::MAX));
    }
}
