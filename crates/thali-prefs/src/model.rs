//! Preference record model: mandatory slots, optional sets, merge rules.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel tag meaning "the user explicitly has nothing for this slot".
pub const NONE_SENTINEL: &str = "none";

/// Mandatory preference slots, in fixed priority order.
///
/// The order is load-bearing: clarification questions are always asked for
/// the first missing slot, so conversation scripts stay reproducible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MandatorySlot {
    /// Dietary restrictions such as vegetarian or vegan.
    Restrictions,
    /// Food allergies.
    Allergies,
    /// Preferred cuisines.
    Cuisines,
}

/// Fixed priority order for mandatory slots.
pub const MANDATORY_ORDER: [MandatorySlot; 3] = [
    MandatorySlot::Restrictions,
    MandatorySlot::Allergies,
    MandatorySlot::Cuisines,
];

impl MandatorySlot {
    /// Return the slot name used in schemas and stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            MandatorySlot::Restrictions => "restrictions",
            MandatorySlot::Allergies => "allergies",
            MandatorySlot::Cuisines => "cuisines",
        }
    }

    /// Parse a category name, accepting the aliases engines tend to emit.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "restrictions" | "restriction" | "dietary_restrictions" => {
                Some(MandatorySlot::Restrictions)
            }
            "allergies" | "allergy" => Some(MandatorySlot::Allergies),
            "cuisines" | "cuisine" | "cuisine_preferences" => Some(MandatorySlot::Cuisines),
            _ => None,
        }
    }
}

/// Value state for one mandatory slot.
///
/// `Unset` and `None` are distinct everywhere: `Unset` means the user was
/// never asked or never answered, `None` means they explicitly declined.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotValue {
    /// The user has never provided this slot.
    #[default]
    Unset,
    /// The user explicitly has nothing for this slot.
    None,
    /// Non-empty set of free-form tags provided by the user.
    Tags(BTreeSet<String>),
}

impl SlotValue {
    /// Build a tag set from string-like values.
    pub fn tags<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if tags.is_empty() {
            SlotValue::Unset
        } else {
            SlotValue::Tags(tags)
        }
    }

    /// Whether a value (including the sentinel) has been supplied.
    pub fn is_known(&self) -> bool {
        !matches!(self, SlotValue::Unset)
    }
}

impl Serialize for SlotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SlotValue::Unset => serializer.serialize_none(),
            SlotValue::None => serializer.serialize_str(NONE_SENTINEL),
            SlotValue::Tags(tags) => tags.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SlotValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Tags(BTreeSet<String>),
        }

        // A bare string is accepted as a single tag; engines frequently
        // send "vegetarian" instead of ["vegetarian"]. An empty list is
        // indistinguishable from never-answered and maps to Unset.
        match Option::<Repr>::deserialize(deserializer)? {
            Option::None => Ok(SlotValue::Unset),
            Some(Repr::Text(text)) if text == NONE_SENTINEL => Ok(SlotValue::None),
            Some(Repr::Text(text)) => Ok(SlotValue::tags([text])),
            Some(Repr::Tags(tags)) if tags.is_empty() => Ok(SlotValue::Unset),
            Some(Repr::Tags(tags)) => Ok(SlotValue::Tags(tags)),
        }
    }
}

/// Preference record owned by the store on behalf of one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PreferenceRecord {
    /// Dietary restrictions slot.
    #[serde(default)]
    pub restrictions: SlotValue,
    /// Allergies slot.
    #[serde(default)]
    pub allergies: SlotValue,
    /// Preferred cuisines slot.
    #[serde(default)]
    pub cuisines: SlotValue,
    /// Foods the user likes.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub likes: BTreeSet<String>,
    /// Foods the user dislikes.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dislikes: BTreeSet<String>,
    /// Free-form notes, including facts that fit no named category.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub notes: BTreeSet<String>,
    /// Timestamp of the last merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PreferenceRecord {
    /// Borrow the value for a mandatory slot.
    pub fn slot(&self, slot: MandatorySlot) -> &SlotValue {
        match slot {
            MandatorySlot::Restrictions => &self.restrictions,
            MandatorySlot::Allergies => &self.allergies,
            MandatorySlot::Cuisines => &self.cuisines,
        }
    }

    /// Mutably borrow the value for a mandatory slot.
    fn slot_mut(&mut self, slot: MandatorySlot) -> &mut SlotValue {
        match slot {
            MandatorySlot::Restrictions => &mut self.restrictions,
            MandatorySlot::Allergies => &mut self.allergies,
            MandatorySlot::Cuisines => &mut self.cuisines,
        }
    }

    /// Mandatory slots still unset, in the fixed priority order.
    pub fn missing_mandatory(&self) -> Vec<MandatorySlot> {
        MANDATORY_ORDER
            .into_iter()
            .filter(|slot| !self.slot(*slot).is_known())
            .collect()
    }

    /// Whether every mandatory slot holds a value or the sentinel.
    pub fn is_complete(&self) -> bool {
        self.missing_mandatory().is_empty()
    }

    /// Merge a partial update into this record.
    ///
    /// Mandatory slots present in the update replace the stored value
    /// wholesale (last write wins per slot); optional sets are unioned.
    /// A merge never moves a slot back to `Unset`.
    pub fn merge(&mut self, update: &PreferenceUpdate) {
        for slot in MANDATORY_ORDER {
            if let Some(value) = update.slot(slot)
                && value.is_known()
            {
                *self.slot_mut(slot) = value.clone();
            }
        }
        self.likes.extend(update.likes.iter().cloned());
        self.dislikes.extend(update.dislikes.iter().cloned());
        self.notes.extend(update.notes.iter().cloned());
        self.updated_at = Some(Utc::now());
    }
}

/// Partial record carried by write operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PreferenceUpdate {
    /// Replacement for the restrictions slot, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<SlotValue>,
    /// Replacement for the allergies slot, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<SlotValue>,
    /// Replacement for the cuisines slot, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisines: Option<SlotValue>,
    /// Likes to union into the record.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub likes: BTreeSet<String>,
    /// Dislikes to union into the record.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dislikes: BTreeSet<String>,
    /// Notes to union into the record.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub notes: BTreeSet<String>,
}

impl PreferenceUpdate {
    /// Borrow the update value for a mandatory slot.
    fn slot(&self, slot: MandatorySlot) -> Option<&SlotValue> {
        match slot {
            MandatorySlot::Restrictions => self.restrictions.as_ref(),
            MandatorySlot::Allergies => self.allergies.as_ref(),
            MandatorySlot::Cuisines => self.cuisines.as_ref(),
        }
    }

    /// Build the singleton update for one extracted fact.
    ///
    /// Known mandatory categories set the slot (the literal value "none"
    /// sets the sentinel); `likes`, `dislikes` and `notes` union a single
    /// entry; any other category lands in `notes` as "category: value".
    pub fn single(category: &str, value: &str) -> Self {
        let mut update = Self::default();
        if let Some(slot) = MandatorySlot::parse(category) {
            let slot_value = if value == NONE_SENTINEL {
                SlotValue::None
            } else {
                SlotValue::tags([value])
            };
            match slot {
                MandatorySlot::Restrictions => update.restrictions = Some(slot_value),
                MandatorySlot::Allergies => update.allergies = Some(slot_value),
                MandatorySlot::Cuisines => update.cuisines = Some(slot_value),
            }
            return update;
        }
        match category {
            "likes" => {
                update.likes.insert(value.to_string());
            }
            "dislikes" => {
                update.dislikes.insert(value.to_string());
            }
            "notes" => {
                update.notes.insert(value.to_string());
            }
            other => {
                update.notes.insert(format!("{other}: {value}"));
            }
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MANDATORY_ORDER, MandatorySlot, PreferenceRecord, PreferenceUpdate, SlotValue,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn slot_value_round_trips_through_json() {
        let record = PreferenceRecord {
            restrictions: SlotValue::tags(["vegetarian"]),
            allergies: SlotValue::None,
            ..PreferenceRecord::default()
        };
        let encoded = serde_json::to_value(&record).expect("serialize");
        assert_eq!(encoded["restrictions"], json!(["vegetarian"]));
        assert_eq!(encoded["allergies"], json!("none"));
        assert_eq!(encoded["cuisines"], json!(null));

        let decoded: PreferenceRecord = serde_json::from_value(encoded).expect("deserialize");
        assert_eq!(decoded.restrictions, SlotValue::tags(["vegetarian"]));
        assert_eq!(decoded.allergies, SlotValue::None);
        assert_eq!(decoded.cuisines, SlotValue::Unset);
    }

    #[test]
    fn bare_string_deserializes_as_single_tag() {
        let decoded: SlotValue = serde_json::from_value(json!("vegan")).expect("deserialize");
        assert_eq!(decoded, SlotValue::tags(["vegan"]));
    }

    #[test]
    fn empty_list_deserializes_as_unset() {
        let decoded: SlotValue = serde_json::from_value(json!([])).expect("deserialize");
        assert_eq!(decoded, SlotValue::Unset);
    }

    #[test]
    fn missing_mandatory_keeps_fixed_order() {
        let record = PreferenceRecord::default();
        assert_eq!(record.missing_mandatory(), MANDATORY_ORDER.to_vec());

        let record = PreferenceRecord {
            allergies: SlotValue::tags(["nuts"]),
            ..PreferenceRecord::default()
        };
        assert_eq!(
            record.missing_mandatory(),
            vec![MandatorySlot::Restrictions, MandatorySlot::Cuisines]
        );
    }

    #[test]
    fn sentinel_counts_as_answered() {
        let record = PreferenceRecord {
            restrictions: SlotValue::None,
            allergies: SlotValue::None,
            cuisines: SlotValue::None,
            ..PreferenceRecord::default()
        };
        assert_eq!(record.is_complete(), true);
    }

    #[test]
    fn merge_replaces_mandatory_and_unions_optional() {
        let mut record = PreferenceRecord {
            restrictions: SlotValue::tags(["vegetarian"]),
            likes: BTreeSet::from(["dal".to_string()]),
            ..PreferenceRecord::default()
        };
        let update = PreferenceUpdate {
            restrictions: Some(SlotValue::tags(["vegan"])),
            likes: BTreeSet::from(["paneer".to_string()]),
            ..PreferenceUpdate::default()
        };
        record.merge(&update);

        assert_eq!(record.restrictions, SlotValue::tags(["vegan"]));
        assert_eq!(
            record.likes,
            BTreeSet::from(["dal".to_string(), "paneer".to_string()])
        );
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn merge_never_regresses_to_unset() {
        let mut record = PreferenceRecord {
            allergies: SlotValue::None,
            ..PreferenceRecord::default()
        };
        let update = PreferenceUpdate {
            allergies: Some(SlotValue::Unset),
            ..PreferenceUpdate::default()
        };
        record.merge(&update);
        assert_eq!(record.allergies, SlotValue::None);
    }

    #[test]
    fn single_update_sets_sentinel_for_none() {
        let update = PreferenceUpdate::single("allergies", "none");
        assert_eq!(update.allergies, Some(SlotValue::None));
        assert_eq!(update.restrictions, None);
    }

    #[test]
    fn single_update_accepts_category_aliases() {
        let update = PreferenceUpdate::single("cuisine_preferences", "indian");
        assert_eq!(update.cuisines, Some(SlotValue::tags(["indian"])));
    }

    #[test]
    fn single_update_routes_unknown_categories_to_notes() {
        let update = PreferenceUpdate::single("spice_level", "medium");
        assert_eq!(
            update.notes,
            BTreeSet::from(["spice_level: medium".to_string()])
        );
    }
}
