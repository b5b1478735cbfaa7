//! Turning raw recipe form fields into a validated [`RecipeSubmission`].
//!
//! Multipart and JSON requests both feed a [`SubmissionForm`], so there is a
//! single validation path no matter how the recipe arrived.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::SubmissionError;

pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const INSTRUCTIONS: &str = "instructions";
pub const PREP_DURATION: &str = "prep_duration";
pub const COOK_DURATION: &str = "cook_duration";
pub const INGREDIENTS: &str = "ingredients";
pub const CATEGORIES: &str = "categories";
pub const THUMBNAIL_IMAGE: &str = "thumbnail_image";
pub const STEP_ARCHIVE: &str = "step_by_step_zip_file";
pub const INGREDIENT_ARCHIVE: &str = "ingredient_zip_file";

/// Longest title, ingredient name or category name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

const REQUIRED: &str = "This field is required.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";

/// Field error for a title or name longer than [`MAX_NAME_LENGTH`].
pub fn check_length(value: &str) -> Option<String> {
    (value.chars().count() > MAX_NAME_LENGTH).then(|| {
        format!(
            "Ensure this field has no more than {} characters.",
            MAX_NAME_LENGTH
        )
    })
}

/// Field error for the first over-long name in a list, if any.
pub fn check_names(names: &[String]) -> Option<String> {
    names.iter().find_map(|name| {
        check_length(name).map(|_| {
            format!(
                "Ensure each name has no more than {} characters.",
                MAX_NAME_LENGTH
            )
        })
    })
}

/// Ingredient or category names, either comma-joined or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    Joined(String),
    Items(Vec<String>),
}

impl NameList {
    pub fn into_names(self) -> Vec<String> {
        match self {
            NameList::Joined(raw) => split_names(&raw),
            NameList::Items(items) => dedup_names(items.iter().map(String::as_str)),
        }
    }
}

/// Split a comma-delimited list, trimming names and dropping blanks and repeats.
pub fn split_names(raw: &str) -> Vec<String> {
    dedup_names(raw.split(','))
}

fn dedup_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names.map(str::trim).filter(|n| !n.is_empty()) {
        if !out.iter().any(|existing| existing == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Non-blank instruction lines, in order. Line `n` (1-based) is step `n`.
pub fn instruction_steps(instructions: &str) -> Vec<&str> {
    instructions
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Raw fields collected from a request before validation.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    title: Option<String>,
    description: Option<String>,
    instructions: Option<String>,
    prep_duration: Option<String>,
    cook_duration: Option<String>,
    ingredients: Vec<String>,
    categories: Vec<String>,
    thumbnail: Option<Vec<u8>>,
    step_archive: Option<Vec<u8>>,
    ingredient_archive: Option<Vec<u8>>,
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_file_field(name: &str) -> bool {
        matches!(name, THUMBNAIL_IMAGE | STEP_ARCHIVE | INGREDIENT_ARCHIVE)
    }

    /// Accept one multipart field. File fields keep their bytes, everything
    /// else must be UTF-8 text. Unknown fields are ignored.
    pub fn push_field(&mut self, name: &str, data: Vec<u8>) -> Result<(), SubmissionError> {
        if Self::is_file_field(name) {
            self.push_file(name, data);
            return Ok(());
        }

        let text = String::from_utf8(data)
            .map_err(|_| SubmissionError::Parse(format!("field `{}` is not valid UTF-8", name)))?;
        self.push_text(name, text);
        Ok(())
    }

    pub fn push_text(&mut self, name: &str, value: String) {
        match name {
            TITLE => self.title = Some(value),
            DESCRIPTION => self.description = Some(value),
            INSTRUCTIONS => self.instructions = Some(value),
            PREP_DURATION => self.prep_duration = Some(value),
            COOK_DURATION => self.cook_duration = Some(value),
            INGREDIENTS => self.ingredients = split_names(&value),
            CATEGORIES => self.categories = split_names(&value),
            _ => tracing::debug!(field = name, "Ignoring unknown recipe field"),
        }
    }

    pub fn push_names(&mut self, name: &str, names: NameList) {
        match name {
            INGREDIENTS => self.ingredients = names.into_names(),
            CATEGORIES => self.categories = names.into_names(),
            _ => tracing::debug!(field = name, "Ignoring unknown name list"),
        }
    }

    /// Browsers send an empty part for an unselected file input; that counts
    /// as no attachment.
    pub fn push_file(&mut self, name: &str, data: Vec<u8>) {
        if data.is_empty() {
            return;
        }
        match name {
            THUMBNAIL_IMAGE => self.thumbnail = Some(data),
            STEP_ARCHIVE => self.step_archive = Some(data),
            INGREDIENT_ARCHIVE => self.ingredient_archive = Some(data),
            _ => tracing::debug!(field = name, "Ignoring unknown file field"),
        }
    }

    pub fn validate(self) -> Result<RecipeSubmission, SubmissionError> {
        let mut errors = BTreeMap::new();

        let title = match self.title.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => match check_length(&t) {
                Some(message) => {
                    errors.insert(TITLE.to_string(), message);
                    None
                }
                None => Some(t),
            },
            _ => {
                errors.insert(TITLE.to_string(), REQUIRED.to_string());
                None
            }
        };

        for (field, names) in [(INGREDIENTS, &self.ingredients), (CATEGORIES, &self.categories)] {
            if let Some(message) = check_names(names) {
                errors.insert(field.to_string(), message);
            }
        }

        let prep_duration = parse_duration(PREP_DURATION, self.prep_duration, &mut errors);
        let cook_duration = parse_duration(COOK_DURATION, self.cook_duration, &mut errors);

        match title {
            Some(title) if errors.is_empty() => Ok(RecipeSubmission {
                title,
                description: self.description.unwrap_or_default(),
                instructions: self.instructions.unwrap_or_default(),
                prep_duration,
                cook_duration,
                ingredients: self.ingredients,
                categories: self.categories,
                thumbnail: self.thumbnail,
                step_archive: self.step_archive,
                ingredient_archive: self.ingredient_archive,
            }),
            _ => Err(SubmissionError::Invalid(errors)),
        }
    }
}

// Absent durations default to zero; negative values are allowed.
fn parse_duration(
    field: &str,
    raw: Option<String>,
    errors: &mut BTreeMap<String, String>,
) -> i32 {
    let Some(raw) = raw else {
        return 0;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    raw.parse().unwrap_or_else(|_| {
        errors.insert(field.to_string(), NOT_AN_INTEGER.to_string());
        0
    })
}

/// A validated recipe creation request, attachments included.
#[derive(Debug, Clone)]
pub struct RecipeSubmission {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub prep_duration: i32,
    pub cook_duration: i32,
    pub ingredients: Vec<String>,
    pub categories: Vec<String>,
    pub thumbnail: Option<Vec<u8>>,
    pub step_archive: Option<Vec<u8>>,
    pub ingredient_archive: Option<Vec<u8>>,
}

impl RecipeSubmission {
    pub fn steps(&self) -> Vec<&str> {
        instruction_steps(&self.instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> SubmissionForm {
        let mut form = SubmissionForm::new();
        for (name, value) in fields {
            form.push_field(name, value.as_bytes().to_vec()).unwrap();
        }
        form
    }

    #[test]
    fn test_split_names_trims_and_dedups() {
        assert_eq!(
            split_names(" flour, sugar ,,flour, eggs "),
            vec!["flour", "sugar", "eggs"]
        );
        assert!(split_names("").is_empty());
    }

    #[test]
    fn test_instruction_steps_skip_blank_lines() {
        let steps = instruction_steps("Mix\n\n  Bake  \r\nServe\n");
        assert_eq!(steps, vec!["Mix", "Bake", "Serve"]);
    }

    #[test]
    fn test_full_form_validates() {
        let submission = form(&[
            ("title", "Pancakes"),
            ("description", "Fluffy"),
            ("instructions", "Mix\nFry"),
            ("prep_duration", "10"),
            ("cook_duration", " 20 "),
            ("ingredients", "flour, milk"),
            ("categories", "breakfast"),
        ])
        .validate()
        .unwrap();

        assert_eq!(submission.title, "Pancakes");
        assert_eq!(submission.prep_duration, 10);
        assert_eq!(submission.cook_duration, 20);
        assert_eq!(submission.ingredients, vec!["flour", "milk"]);
        assert_eq!(submission.categories, vec!["breakfast"]);
        assert_eq!(submission.steps(), vec!["Mix", "Fry"]);
        assert!(submission.thumbnail.is_none());
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let err = form(&[("description", "no title")]).validate().unwrap_err();
        match err {
            SubmissionError::Invalid(fields) => {
                assert_eq!(fields.get("title").map(String::as_str), Some(REQUIRED));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_title_is_rejected() {
        assert!(form(&[("title", "   ")]).validate().is_err());
    }

    #[test]
    fn test_over_long_title_is_rejected() {
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let err = form(&[("title", long.as_str())]).validate().unwrap_err();
        match err {
            SubmissionError::Invalid(fields) => assert!(fields.contains_key("title")),
            other => panic!("unexpected error: {other:?}"),
        }

        // Length counts characters, not bytes
        let wide = "é".repeat(MAX_NAME_LENGTH);
        assert!(form(&[("title", wide.as_str())]).validate().is_ok());
    }

    #[test]
    fn test_over_long_names_are_rejected() {
        let long = format!("salt, {}", "p".repeat(MAX_NAME_LENGTH + 1));
        let mut form = form(&[("title", "Soup"), ("ingredients", long.as_str())]);
        form.push_names(CATEGORIES, NameList::Items(vec!["c".repeat(300)]));

        match form.validate().unwrap_err() {
            SubmissionError::Invalid(fields) => {
                assert!(fields.contains_key("ingredients"));
                assert!(fields.contains_key("categories"));
                assert!(!fields.contains_key("title"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_duration_reports_field() {
        let err = form(&[("title", "Soup"), ("cook_duration", "ten")])
            .validate()
            .unwrap_err();
        match err {
            SubmissionError::Invalid(fields) => {
                assert!(fields.contains_key("cook_duration"));
                assert!(!fields.contains_key("title"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_negative_and_missing_durations() {
        let submission = form(&[("title", "Soup"), ("prep_duration", "-5")])
            .validate()
            .unwrap();
        assert_eq!(submission.prep_duration, -5);
        assert_eq!(submission.cook_duration, 0);
    }

    #[test]
    fn test_non_utf8_text_is_a_parse_error() {
        let mut form = SubmissionForm::new();
        let err = form.push_field("title", vec![0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, SubmissionError::Parse(_)));
    }

    #[test]
    fn test_empty_file_part_is_ignored() {
        let mut form = form(&[("title", "Soup")]);
        form.push_field(THUMBNAIL_IMAGE, Vec::new()).unwrap();
        form.push_field(STEP_ARCHIVE, vec![1, 2, 3]).unwrap();
        let submission = form.validate().unwrap();
        assert!(submission.thumbnail.is_none());
        assert_eq!(submission.step_archive, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_name_list_accepts_string_or_array() {
        let joined: NameList = serde_json::from_str("\"salt, pepper\"").unwrap();
        let items: NameList = serde_json::from_str("[\"salt\", \" pepper \", \"salt\"]").unwrap();
        assert_eq!(joined.into_names(), vec!["salt", "pepper"]);
        assert_eq!(items.into_names(), vec!["salt", "pepper"]);
    }
}
