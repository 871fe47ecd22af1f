//! Preference gate: answer first, ask second.

use log::{debug, warn};
use std::sync::Arc;
use thali_prefs::{MandatorySlot, PreferenceStore};

/// Policy layer deciding whether a reply needs a clarifying question.
///
/// Generation is never blocked on incomplete preferences. After a turn in
/// which a generation capability produced content, the gate appends exactly
/// one follow-up question for the highest-priority missing mandatory slot,
/// keeping content and question in a single combined message.
pub(crate) struct PreferenceGate {
    preferences: Arc<dyn PreferenceStore>,
}

impl PreferenceGate {
    /// Create a gate over the preference store.
    pub(crate) fn new(preferences: Arc<dyn PreferenceStore>) -> Self {
        Self { preferences }
    }

    /// Append at most one clarifying question to the reply.
    pub(crate) fn apply(&self, user_id: &str, generation_ran: bool, reply: &mut String) {
        if !generation_ran {
            return;
        }
        let record = match self.preferences.get(user_id) {
            Ok(record) => record.unwrap_or_default(),
            Err(err) => {
                // the question is additive; a store hiccup must not fail the turn
                warn!("gate skipped, preference read failed (user_id={user_id}, err={err})");
                return;
            }
        };
        let Some(slot) = record.missing_mandatory().into_iter().next() else {
            return;
        };
        debug!("appending clarification (user_id={user_id}, slot={})", slot.as_str());
        reply.push_str("\n\n");
        reply.push_str(clarifying_question(slot));
    }
}

/// Fixed follow-up question for each mandatory slot.
pub(crate) fn clarifying_question(slot: MandatorySlot) -> &'static str {
    match slot {
        MandatorySlot::Restrictions => {
            "Quick question so I can tailor things: do you have any dietary \
             restrictions, like vegetarian or vegan?"
        }
        MandatorySlot::Allergies => {
            "Do you have any food allergies I should know about? This helps me \
             suggest safe options."
        }
        MandatorySlot::Cuisines => {
            "What type of food are you usually in the mood for? Indian, Italian, \
             Chinese, or anything specific?"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PreferenceGate, clarifying_question};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use thali_prefs::{
        InMemoryPreferenceStore, MandatorySlot, PreferenceStore, PreferenceUpdate,
    };

    #[test]
    fn appends_highest_priority_question_after_generation() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        store
            .merge("u1", &PreferenceUpdate::single("restrictions", "vegetarian"))
            .expect("merge");
        let gate = PreferenceGate::new(store);

        let mut reply = "1. Dal\n2. Khichdi\n3. Poha".to_string();
        gate.apply("u1", true, &mut reply);

        assert!(reply.starts_with("1. Dal"));
        assert!(reply.ends_with(clarifying_question(MandatorySlot::Allergies)));
        assert!(!reply.contains(clarifying_question(MandatorySlot::Cuisines)));
    }

    #[test]
    fn silent_without_generation_or_when_complete() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let gate = PreferenceGate::new(store.clone());

        let mut reply = "Saved your preferences.".to_string();
        gate.apply("u1", false, &mut reply);
        assert_eq!(reply, "Saved your preferences.");

        store
            .merge(
                "u1",
                &PreferenceUpdate {
                    restrictions: Some(thali_prefs::SlotValue::None),
                    allergies: Some(thali_prefs::SlotValue::None),
                    cuisines: Some(thali_prefs::SlotValue::tags(["indian"])),
                    ..PreferenceUpdate::default()
                },
            )
            .expect("merge");
        let mut reply = "1. Dal".to_string();
        gate.apply("u1", true, &mut reply);
        assert_eq!(reply, "1. Dal");
    }

    #[test]
    fn store_failure_skips_the_question() {
        let gate = PreferenceGate::new(Arc::new(thali_test_utils::FailingPreferenceStore::new(
            "down",
        )));
        let mut reply = "1. Dal".to_string();
        gate.apply("u1", true, &mut reply);
        assert_eq!(reply, "1. Dal");
    }
}
