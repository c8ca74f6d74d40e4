//! Instruction text sent as the first request part.

pub const NOTES_PLACEHOLDER: &str = "{{CLINICAL_NOTES}}";

pub const IMAGE_ONLY_STAND_IN: &str =
    "(No typed notes were provided. Read the clinical information from the attached image.)";

pub const ADMISSION_NOTE_TEMPLATE: &str = r#"You are a clinical documentation assistant. Extract the information below into an admission note.

Rules:
- Answer with a single JSON object and nothing else. Do not wrap it in markdown.
- Omit any field the notes do not mention. Never invent findings.
- Keep the wording of the source; use strings for free text and true/false for yes/no items.

Schema (all fields optional):
{
  "chief_complaint": "string",
  "present_illness": "string",
  "past_medical_history": "string",
  "past_surgical_history": "string",
  "medications": "string",
  "allergies": {"has_allergy": true, "drug": "string", "food": "string", "other": "string"},
  "family_history": {"hypertension": true, "diabetes": true, "heart_disease": true, "cancer": true, "other": "string"},
  "social_history": {"smoking": true, "alcohol": true, "betel_nut": true, "occupation": "string", "travel": "string"},
  "vitals": {"temperature": "string", "heart_rate": "string", "respiratory_rate": "string", "blood_pressure": "string", "spo2": "string", "pain_score": "string"},
  "physical_exam": "string",
  "laboratory": "string",
  "imaging": "string",
  "impression": "string",
  "plan": "string"
}

Clinical notes:
{{CLINICAL_NOTES}}"#;

/// Fills the template with the notes, or the image stand-in when there are none.
pub fn build_instruction(notes: &str) -> String {
    let notes = notes.trim();
    let body = if notes.is_empty() {
        IMAGE_ONLY_STAND_IN
    } else {
        notes
    };
    ADMISSION_NOTE_TEMPLATE.replace(NOTES_PLACEHOLDER, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_notes() {
        let s = build_instruction("  Patient has fever and cough ");
        assert!(s.ends_with("Clinical notes:\nPatient has fever and cough"));
        assert!(!s.contains(NOTES_PLACEHOLDER));
    }

    #[test]
    fn empty_notes_use_stand_in() {
        let s = build_instruction("   ");
        assert!(s.contains(IMAGE_ONLY_STAND_IN));
    }
}
