use crate::models::{Lead, RedactedLead};

/// Characters of a phone number left visible in a masked hint.
const VISIBLE_PHONE_PREFIX: usize = 5;

/// Masks a phone number down to its first five characters.
///
/// `"541-555-8765"` becomes `"541-5***-****"`.
pub fn mask_phone(phone: &str) -> String {
    let prefix: String = phone.chars().take(VISIBLE_PHONE_PREFIX).collect();
    format!("{}***-****", prefix)
}

/// Reduces a contact name to its initial: `"Michael Davis"` becomes
/// `"Lead from M..."`.
pub fn teaser_name(name: &str) -> String {
    match name.trim().chars().next() {
        Some(initial) => format!("Lead from {}...", initial),
        None => "Lead from ...".to_string(),
    }
}

/// Builds the redacted form of a lead.
///
/// Email addresses are withheld entirely; phones keep only their masked
/// prefix. Status is dropped because pipeline management is a paid feature.
pub fn redact_lead(lead: &Lead) -> RedactedLead {
    RedactedLead {
        id: lead.id,
        teaser: teaser_name(&lead.name),
        contact_type: lead.contact_type,
        contact_hint: lead.phone.as_deref().map(mask_phone),
        timestamp: lead.timestamp.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactType, LeadStatus};

    fn lead(phone: Option<&str>, email: Option<&str>) -> Lead {
        Lead {
            id: 3,
            name: "David Wilson".to_string(),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            contact_type: ContactType::PhoneCall,
            status: LeadStatus::Contacted,
            timestamp: "11:03 AM".to_string(),
        }
    }

    #[test]
    fn test_phone_is_masked() {
        assert_eq!(mask_phone("541-555-8765"), "541-5***-****");
    }

    #[test]
    fn test_short_phone_is_not_padded() {
        assert_eq!(mask_phone("12"), "12***-****");
    }

    #[test]
    fn test_teaser_keeps_only_initial() {
        assert_eq!(teaser_name("David Wilson"), "Lead from D...");
        assert_eq!(teaser_name("   "), "Lead from ...");
    }

    #[test]
    fn test_redacted_phone_lead() {
        let redacted = redact_lead(&lead(Some("541-555-8765"), None));
        assert_eq!(redacted.teaser, "Lead from D...");
        assert_eq!(redacted.contact_hint.as_deref(), Some("541-5***-****"));
        assert_eq!(redacted.timestamp, "11:03 AM");
    }

    #[test]
    fn test_redacted_email_lead_has_no_hint() {
        let redacted = redact_lead(&lead(None, Some("jen.smith@example.com")));
        assert!(redacted.contact_hint.is_none());
        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("example.com"));
    }
}
