use crate::record::Record;
use crate::StoreError;
use serde::Serialize;
use serde_json::{Map, Value};

/// A partial update: fields to set and fields to remove.
#[derive(Debug, Clone)]
pub struct Update<P> {
    pub id: String,
    pub set: Option<P>,
    pub delete: Vec<String>,
}

impl<P> Update<P> {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), set: None, delete: Vec::new() }
    }

    pub fn set(id: impl Into<String>, patch: P) -> Self {
        Self { id: id.into(), set: Some(patch), delete: Vec::new() }
    }

    pub fn with_set(mut self, patch: P) -> Self {
        self.set = Some(patch);
        self
    }

    pub fn with_delete<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delete.extend(fields.into_iter().map(Into::into));
        self
    }
}

/// Apply `patch` and `delete` onto a copy of `existing`.
///
/// Protected fields are dropped from both the patch and the delete list.
/// Null patch values are skipped; any other value, including `false`, `0`
/// and `""`, overwrites. Deleted fields become absent, so deleting a
/// required field fails with `Validation`, as does a result that breaks
/// [`Record::validate`].
pub fn apply<R, P>(existing: &R, patch: Option<&P>, delete: &[String]) -> Result<R, StoreError>
where
    R: Record,
    P: Serialize,
{
    let mut target = to_object(existing)?;

    if let Some(patch) = patch {
        for (field, value) in to_object(patch)? {
            if value.is_null() || R::PROTECTED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            target.insert(field, value);
        }
    }

    for field in delete {
        if R::PROTECTED_FIELDS.contains(&field.as_str()) {
            continue;
        }
        target.remove(field);
    }

    let merged: R = serde_json::from_value(Value::Object(target)).map_err(|e| {
        StoreError::Validation(format!("update of {} {} produced an invalid record: {}", R::KIND, existing.id(), e))
    })?;
    merged.validate()?;

    Ok(merged)
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Validation(format!("expected an object, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Item {
        id: String,
        label: String,
        #[serde(default)]
        flag: bool,
        #[serde(default)]
        score: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<DateTime<Utc>>,
    }

    impl Record for Item {
        const KIND: &'static str = "items";

        fn id(&self) -> &str {
            &self.id
        }

        fn fill_defaults(&mut self, now: DateTime<Utc>) {
            self.created_at.get_or_insert(now);
        }
    }

    fn item() -> Item {
        Item {
            id: "1".to_string(),
            label: "first".to_string(),
            flag: true,
            score: 7,
            note: Some("keep".to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_null_fields_are_skipped() {
        let existing = item();
        let merged = apply(&existing, Some(&json!({ "label": null, "note": null })), &[]).unwrap();
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_falsy_values_overwrite() {
        let merged = apply(&item(), Some(&json!({ "label": "", "flag": false, "score": 0 })), &[]).unwrap();
        assert_eq!(merged.label, "");
        assert!(!merged.flag);
        assert_eq!(merged.score, 0);
        assert_eq!(merged.note.as_deref(), Some("keep"));
    }

    #[test]
    fn test_protected_fields_survive() {
        let existing = item();
        let patch = json!({ "id": "2", "createdAt": "2030-05-05T00:00:00Z", "label": "changed" });
        let merged = apply(&existing, Some(&patch), &["createdAt".to_string(), "id".to_string()]).unwrap();

        assert_eq!(merged.id, "1");
        assert_eq!(merged.created_at, existing.created_at);
        assert_eq!(merged.label, "changed");
    }

    #[test]
    fn test_delete_removes_optional_field() {
        let merged = apply::<Item, Value>(&item(), None, &["note".to_string()]).unwrap();
        assert_eq!(merged.note, None);
    }

    #[test]
    fn test_delete_required_field_fails() {
        let result = apply::<Item, Value>(&item(), None, &["label".to_string()]);
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_update_builder() {
        let update = Update::new("x").with_set(json!({ "a": 1 })).with_delete(["b", "c"]);
        assert_eq!(update.id, "x");
        assert!(update.set.is_some());
        assert_eq!(update.delete, vec!["b".to_string(), "c".to_string()]);
    }
}
