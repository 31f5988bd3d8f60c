use serde::{Deserialize, Serialize};

/// Nested address sub-record; flattened into namespaced keys on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line_1: String,
    pub line_2: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectForm {
    pub project_name: String,
    pub description: String,
    pub configuration_type: String,
    pub address: Address,
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectPatch {
    Name(String),
    Description(String),
    ConfigurationType(String),
    AddressLine1(String),
    AddressLine2(String),
    City(String),
    State(String),
    PinCode(String),
    AmenityToggled(String),
}

impl ProjectForm {
    pub fn apply(&mut self, patch: ProjectPatch) -> Result<(), String> {
        match patch {
            ProjectPatch::Name(v) => self.project_name = v,
            ProjectPatch::Description(v) => self.description = v,
            ProjectPatch::ConfigurationType(v) => self.configuration_type = v,
            ProjectPatch::AddressLine1(v) => self.address.line_1 = v,
            ProjectPatch::AddressLine2(v) => self.address.line_2 = v,
            ProjectPatch::City(v) => self.address.city = v,
            ProjectPatch::State(v) => self.address.state = v,
            ProjectPatch::PinCode(v) => {
                if !v.is_empty() && !v.chars().all(|c| c.is_ascii_digit()) {
                    return Err("PIN code must contain digits only.".into());
                }
                self.address.pin_code = v;
            }
            ProjectPatch::AmenityToggled(name) => {
                if let Some(idx) = self.amenities.iter().position(|a| a == &name) {
                    self.amenities.remove(idx);
                } else {
                    self.amenities.push(name);
                }
            }
        }
        Ok(())
    }

    pub fn validate_step(&self, step: usize) -> Result<(), String> {
        match step {
            0 => {
                if self.project_name.trim().is_empty() {
                    return Err("Project name is required.".into());
                }
                Ok(())
            }
            1 => {
                if self.address.line_1.trim().is_empty() {
                    return Err("Address line 1 is required.".into());
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

    #[test]
    fn amenity_toggle_adds_then_removes() {
        let mut form = ProjectForm::default();
        form.apply(ProjectPatch::AmenityToggled("Gym".into())).unwrap();
        assert_eq!(form.amenities, vec!["Gym".to_string()]);
        form.apply(ProjectPatch::AmenityToggled("Gym".into())).unwrap();
        assert!(form.amenities.is_empty());
    }

    #[test]
    fn pin_code_rejects_non_digits_without_mutation() {
        let mut form = ProjectForm::default();
        assert!(form.apply(ProjectPatch::PinCode("4000AB".into())).is_err());
        assert!(form.address.pin_code.is_empty());
        form.apply(ProjectPatch::PinCode("400001".into())).unwrap();
        assert_eq!(form.address.pin_code, "400001");
    }

    #[test]
    fn address_step_requires_line_one() {
        let mut form = ProjectForm::default();
        form.apply(ProjectPatch::Name("Sunrise Heights".into())).unwrap();
        assert!(form.validate_step(0).is_ok());
        assert!(form.validate_step(1).is_err());

        form.apply(ProjectPatch::AddressLine1("14 Hill Road".into())).unwrap();
        assert!(form.validate_step(1).is_ok());
    }
}
