use std::collections::HashMap;

/// Built-in relatedness table between specialties.
///
/// Lookup is directional: the key is the member's preferred specialty,
/// the values are trainer specialties considered adjacent to it.
const BUILTIN_RELATIONS: &[(&str, &[&str])] = &[
    ("strength_training", &["crossfit", "bodybuilding", "powerlifting", "sports_performance"]),
    ("crossfit", &["strength_training", "hiit", "functional_training"]),
    ("bodybuilding", &["strength_training", "powerlifting"]),
    ("powerlifting", &["strength_training", "bodybuilding"]),
    ("sports_performance", &["strength_training", "crossfit", "hiit"]),
    ("functional_training", &["crossfit", "strength_training", "hiit"]),
    ("weight_loss", &["cardio", "hiit", "nutrition"]),
    ("cardio", &["weight_loss", "hiit", "swimming"]),
    ("hiit", &["cardio", "crossfit", "weight_loss"]),
    ("nutrition", &["weight_loss"]),
    ("yoga", &["pilates", "flexibility", "meditation"]),
    ("pilates", &["yoga", "flexibility", "rehabilitation"]),
    ("flexibility", &["yoga", "pilates"]),
    ("meditation", &["yoga"]),
    ("rehabilitation", &["pilates", "senior_fitness", "flexibility"]),
    ("senior_fitness", &["rehabilitation", "flexibility"]),
    ("boxing", &["martial_arts", "hiit"]),
    ("martial_arts", &["boxing", "self_defense"]),
    ("swimming", &["cardio"]),
];

/// Immutable specialty-relatedness map, injected at engine construction
#[derive(Debug, Clone)]
pub struct SpecialtyRelations {
    relations: HashMap<String, Vec<String>>,
}

impl SpecialtyRelations {
    /// The built-in table used in production
    pub fn builtin() -> Self {
        Self::from_pairs(
            BUILTIN_RELATIONS
                .iter()
                .map(|(key, related)| (*key, related.iter().copied())),
        )
    }

    /// Build a table from (preferred, related...) pairs
    pub fn from_pairs<'a, I, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, R)>,
        R: IntoIterator<Item = &'a str>,
    {
        let relations = pairs
            .into_iter()
            .map(|(key, related)| {
                (
                    key.to_string(),
                    related.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();
        Self { relations }
    }

    /// Whether `candidate` counts as related to the preferred specialty.
    /// Directional; unknown specialties relate to nothing.
    #[inline]
    pub fn are_related(&self, preferred: &str, candidate: &str) -> bool {
        self.relations
            .get(preferred)
            .map(|related| related.iter().any(|name| name == candidate))
            .unwrap_or(false)
    }

    /// Specialties adjacent to `preferred`, empty for unknown specialties
    pub fn related_to(&self, preferred: &str) -> &[String] {
        self.relations
            .get(preferred)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for SpecialtyRelations {
    fn default() -> Self {
        Self::builtin()
    }
}
