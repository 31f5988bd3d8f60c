use serde::{Deserialize, Serialize};

use super::tracked::{EntryId, RemoveOutcome, TrackedList};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investigator {
    pub name: String,
    pub designation: String,
    pub mobile: String,
    /// Internal investigators are picked from the user lookup; external ones
    /// are free-typed.
    pub is_internal: bool,
    pub user_id: Option<String>,
}

/// Shared shape of corrective and preventive actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub description: String,
    pub responsible_person: String,
    pub target_date: String,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCause {
    pub category_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuredPerson {
    pub name: String,
    pub mobile: String,
    pub age: String,
    pub company: String,
    pub role: String,
    pub injury_type: String,
    pub is_internal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDamage {
    pub category_id: String,
    pub description: String,
}

/// Aggregate for the four-step incident lifecycle
/// (Report / Investigate / Provisional / Final Closure).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentForm {
    pub description: String,
    pub incident_at: String,
    pub incident_over_time: String,
    pub category_id: String,
    pub sub_category_id: String,
    pub severity: String,
    pub support_required: bool,
    pub has_injury: bool,
    pub has_property_damage: bool,

    pub investigation_description: String,
    pub next_review_date: String,
    pub next_review_responsible: String,
    pub final_corrective_description: String,
    pub final_preventive_description: String,

    pub investigators: TrackedList<Investigator>,
    pub corrective_actions: TrackedList<ActionItem>,
    pub preventive_actions: TrackedList<ActionItem>,
    pub root_causes: TrackedList<RootCause>,
    pub injured_persons: TrackedList<InjuredPerson>,
    pub property_damages: TrackedList<PropertyDamage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IncidentPatch {
    Description(String),
    IncidentAt(String),
    IncidentOverTime(String),
    CategoryId(String),
    SubCategoryId(String),
    Severity(String),
    SupportRequired(bool),
    HasInjury(bool),
    HasPropertyDamage(bool),
    InvestigationDescription(String),
    NextReviewDate(String),
    NextReviewResponsible(String),
    FinalCorrectiveDescription(String),
    FinalPreventiveDescription(String),

    InvestigatorAdded(Investigator),
    InvestigatorRemoved { id: EntryId },
    CorrectiveActionAdded(ActionItem),
    CorrectiveActionRemoved { id: EntryId },
    PreventiveActionAdded(ActionItem),
    PreventiveActionRemoved { id: EntryId },
    RootCauseAdded(RootCause),
    RootCauseRemoved { id: EntryId },
    InjuredPersonAdded(InjuredPerson),
    InjuredPersonRemoved { id: EntryId },
    PropertyDamageAdded(PropertyDamage),
    PropertyDamageRemoved { id: EntryId },
}

impl IncidentForm {
    pub fn apply(&mut self, patch: IncidentPatch) -> Result<(), String> {
        match patch {
            IncidentPatch::Description(v) => self.description = v,
            IncidentPatch::IncidentAt(v) => self.incident_at = v,
            IncidentPatch::IncidentOverTime(v) => self.incident_over_time = v,
            IncidentPatch::CategoryId(v) => {
                // Category changes invalidate the dependent selection.
                if self.category_id != v {
                    self.sub_category_id.clear();
                }
                self.category_id = v;
            }
            IncidentPatch::SubCategoryId(v) => self.sub_category_id = v,
            IncidentPatch::Severity(v) => self.severity = v,
            IncidentPatch::SupportRequired(v) => self.support_required = v,
            IncidentPatch::HasInjury(v) => self.has_injury = v,
            IncidentPatch::HasPropertyDamage(v) => self.has_property_damage = v,
            IncidentPatch::InvestigationDescription(v) => self.investigation_description = v,
            IncidentPatch::NextReviewDate(v) => self.next_review_date = v,
            IncidentPatch::NextReviewResponsible(v) => self.next_review_responsible = v,
            IncidentPatch::FinalCorrectiveDescription(v) => {
                self.final_corrective_description = v;
            }
            IncidentPatch::FinalPreventiveDescription(v) => {
                self.final_preventive_description = v;
            }

            IncidentPatch::InvestigatorAdded(inv) => {
                if inv.name.trim().is_empty() {
                    return Err("Investigator name is required.".into());
                }
                if inv.is_internal && inv.user_id.is_none() {
                    return Err("Select an internal user for this investigator.".into());
                }
                self.investigators.push_new(inv);
            }
            IncidentPatch::InvestigatorRemoved { id } => {
                Self::remove_from(&mut self.investigators, &id, "investigator")?;
            }
            IncidentPatch::CorrectiveActionAdded(action) => {
                if action.description.trim().is_empty() {
                    return Err("Corrective action description is required.".into());
                }
                self.corrective_actions.push_new(action);
            }
            IncidentPatch::CorrectiveActionRemoved { id } => {
                Self::remove_from(&mut self.corrective_actions, &id, "corrective action")?;
            }
            IncidentPatch::PreventiveActionAdded(action) => {
                if action.description.trim().is_empty() {
                    return Err("Preventive action description is required.".into());
                }
                self.preventive_actions.push_new(action);
            }
            IncidentPatch::PreventiveActionRemoved { id } => {
                Self::remove_from(&mut self.preventive_actions, &id, "preventive action")?;
            }
            IncidentPatch::RootCauseAdded(rc) => {
                if rc.description.trim().is_empty() {
                    return Err("Root cause description is required.".into());
                }
                self.root_causes.push_new(rc);
            }
            IncidentPatch::RootCauseRemoved { id } => {
                Self::remove_from(&mut self.root_causes, &id, "root cause")?;
            }
            IncidentPatch::InjuredPersonAdded(person) => {
                if person.name.trim().is_empty() {
                    return Err("Injured person name is required.".into());
                }
                self.injured_persons.push_new(person);
            }
            IncidentPatch::InjuredPersonRemoved { id } => {
                Self::remove_from(&mut self.injured_persons, &id, "injured person")?;
            }
            IncidentPatch::PropertyDamageAdded(damage) => {
                self.property_damages.push_new(damage);
            }
            IncidentPatch::PropertyDamageRemoved { id } => {
                Self::remove_from(&mut self.property_damages, &id, "property damage")?;
            }
        }
        Ok(())
    }

    fn remove_from<T>(
        list: &mut TrackedList<T>,
        id: &EntryId,
        label: &str,
    ) -> Result<(), String> {
        if list.remove(id) == RemoveOutcome::NotFound {
            return Err(format!("That {label} no longer exists."));
        }
        Ok(())
    }

    pub fn validate_step(&self, step: usize) -> Result<(), String> {
        match step {
            // Report
            0 => {
                if self.description.trim().is_empty() {
                    return Err("Incident description is required.".into());
                }
                if self.incident_at.trim().is_empty() {
                    return Err("Incident date and time are required.".into());
                }
                if self.category_id.is_empty() {
                    return Err("Select an incident category.".into());
                }
                Ok(())
            }
            // Investigate
            1 => {
                if self.investigators.active_len() == 0 {
                    return Err("Add at least one investigator.".into());
                }
                if self.has_injury && self.injured_persons.active_len() == 0 {
                    return Err("Add the injured person details.".into());
                }
                if self.has_property_damage && self.property_damages.active_len() == 0 {
                    return Err("Add the property damage details.".into());
                }
                Ok(())
            }
            // Provisional
            2 => {
                if self.root_causes.active_len() == 0 {
                    return Err("Add at least one root cause.".into());
                }
                if self.corrective_actions.active_len() == 0 {
                    return Err("Add at least one corrective action.".into());
                }
                Ok(())
            }
            // Final Closure
            3 => {
                if self.final_corrective_description.trim().is_empty() {
                    return Err("Final corrective action summary is required.".into());
                }
                if self.next_review_date.trim().is_empty() {
                    return Err("Next review date is required.".into());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reported_form() -> IncidentForm {
        let mut form = IncidentForm::default();
        form.apply(IncidentPatch::Description("Slip near tower B lobby".into())).unwrap();
        form.apply(IncidentPatch::IncidentAt("2026-08-20T10:30".into())).unwrap();
        form.apply(IncidentPatch::CategoryId("3".into())).unwrap();
        form
    }

    #[test]
    fn report_step_gates_on_required_fields() {
        let form = IncidentForm::default();
        assert!(form.validate_step(0).is_err());
        assert!(reported_form().validate_step(0).is_ok());
    }

    #[test]
    fn category_change_clears_sub_category() {
        let mut form = reported_form();
        form.apply(IncidentPatch::SubCategoryId("31".into())).unwrap();
        form.apply(IncidentPatch::CategoryId("4".into())).unwrap();
        assert!(form.sub_category_id.is_empty());
    }

    #[test]
    fn injury_flag_requires_injured_person() {
        let mut form = reported_form();
        form.apply(IncidentPatch::InvestigatorAdded(Investigator {
            name: "R. Iyer".into(),
            is_internal: false,
            ..Investigator::default()
        }))
        .unwrap();
        assert!(form.validate_step(1).is_ok());

        form.apply(IncidentPatch::HasInjury(true)).unwrap();
        assert!(form.validate_step(1).is_err());

        form.apply(IncidentPatch::InjuredPersonAdded(InjuredPerson {
            name: "Visitor".into(),
            ..InjuredPerson::default()
        }))
        .unwrap();
        assert!(form.validate_step(1).is_ok());
    }

    #[test]
    fn internal_investigator_requires_user_id() {
        let mut form = IncidentForm::default();
        let err = form
            .apply(IncidentPatch::InvestigatorAdded(Investigator {
                name: "A. Shah".into(),
                is_internal: true,
                user_id: None,
                ..Investigator::default()
            }))
            .unwrap_err();
        assert!(err.contains("internal user"));
        assert!(form.investigators.is_empty());
    }

    #[test]
    fn removing_fetched_root_cause_keeps_destroy_flag() {
        let mut form = IncidentForm::default();
        form.root_causes.hydrate(
            "12",
            RootCause { category_id: "2".into(), description: "worn flooring".into() },
        );

        form.apply(IncidentPatch::RootCauseRemoved { id: EntryId::Server("12".into()) })
            .unwrap();

        assert_eq!(form.root_causes.active_len(), 0);
        assert!(form.root_causes.entries()[0].destroy);
        // Provisional step treats it as gone.
        assert!(form.validate_step(2).is_err());
    }
}
