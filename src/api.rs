//! Backend surface: endpoint paths, the serializable response envelope
//! events carry, and decoders that hydrate aggregates from fetched JSON.
//!
//! HTTP results are folded into [`ApiResponse`] inside the capability
//! callback so the event stream stays plain data; tests feed responses in
//! without touching the transport.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::assets::{AssetKind, ExistingAsset, MaxCount, SlotKey};
use crate::form::{
    ActionItem, EventForm, IncidentForm, InjuredPerson, Investigator, ProjectForm,
    PropertyDamage, Reminder, ReminderUnit, RootCause, Shared,
};
use crate::reference::{RefItem, ReferenceKind};
use crate::{AppError, AppResult, ErrorKind};

/// What came back from one request, reduced to data an [`crate::Event`] can
/// carry across the FFI boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiResponse {
    Status {
        code: u16,
        #[serde(with = "serde_bytes")]
        body: Vec<u8>,
    },
    /// The request never produced a status line (DNS, TLS, aborted, ...).
    TransportError { message: String },
}

impl ApiResponse {
    pub fn from_result(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> Self {
        match result {
            Ok(mut response) => Self::Status {
                code: response.status().into(),
                body: response.take_body().unwrap_or_default(),
            },
            Err(error) => Self::TransportError {
                message: error.to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Status { code, .. } if (200..300).contains(code))
    }

    /// The body of a 2xx response, or the mapped domain error.
    pub fn ok_body(&self) -> AppResult<&[u8]> {
        match self {
            Self::Status { code, body } if (200..300).contains(code) => Ok(body),
            Self::Status { code, body } => Err(AppError::from_http_status(*code, Some(body))),
            Self::TransportError { message } => Err(AppError::new(
                ErrorKind::Network,
                "Request failed before reaching the server",
            )
            .with_internal(message.clone())),
        }
    }
}

/// Relative backend paths, joined against the session base URL.
pub mod paths {
    use crate::reference::ReferenceKind;

    /// Create endpoint of a resource, e.g. `events.json`.
    #[must_use]
    pub fn collection(resource: &str) -> String {
        format!("{resource}.json")
    }

    /// Show/update endpoint of one record, e.g. `events/42.json`.
    #[must_use]
    pub fn entity(resource: &str, id: &str) -> String {
        format!("{resource}/{id}.json")
    }

    /// Immediate (two-phase) removal of one persisted attachment.
    #[must_use]
    pub fn remove_image(resource: &str, entity_id: &str, asset_id: &str) -> String {
        format!("{resource}/{entity_id}/remove_image/{asset_id}.json")
    }

    #[must_use]
    pub fn reference(kind: ReferenceKind) -> String {
        format!("{}.json", kind.as_str())
    }
}

/// Ratio-qualified slots each page edits, shared between hydration and the
/// page-open registration.
pub mod slots {
    use crate::assets::{MaxCount, SlotKey};

    #[must_use]
    pub fn event_cover() -> (SlotKey, MaxCount) {
        (SlotKey::new("cover_image", "16_by_9"), MaxCount::One)
    }

    #[must_use]
    pub fn event_gallery() -> (SlotKey, MaxCount) {
        (SlotKey::new("event_images", "16_by_9"), MaxCount::Unbounded)
    }

    #[must_use]
    pub fn incident_images() -> (SlotKey, MaxCount) {
        (SlotKey::new("incident_images", "4_by_3"), MaxCount::Unbounded)
    }

    #[must_use]
    pub fn project_creatives() -> (SlotKey, MaxCount) {
        (SlotKey::new("project_creatives", "16_by_9"), MaxCount::Unbounded)
    }
}

// Rails serializes ids and foreign keys as numbers or strings depending on
// the column; accept either.
fn lenient_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

fn lenient_strings<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(de)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

fn deserialization_error(e: &serde_json::Error) -> AppError {
    AppError::new(
        ErrorKind::Deserialization,
        "The server response could not be read",
    )
    .with_internal(e.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AttachmentDto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl AttachmentDto {
    fn into_existing(self, kind: AssetKind) -> ExistingAsset {
        let name = self
            .url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("attachment")
            .to_string();
        ExistingAsset {
            id: self.id,
            name,
            url: self.url,
            kind,
        }
    }
}

/// A reminder row as persisted: the interval lives under a unit-named key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReminderDto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub hours: Option<u32>,
    #[serde(default)]
    pub minutes: Option<u32>,
    #[serde(default)]
    pub weeks: Option<u32>,
}

impl ReminderDto {
    fn to_reminder(&self) -> Option<Reminder> {
        let (value, unit) = if let Some(v) = self.weeks {
            (v, ReminderUnit::Weeks)
        } else if let Some(v) = self.days {
            (v, ReminderUnit::Days)
        } else if let Some(v) = self.hours {
            (v, ReminderUnit::Hours)
        } else if let Some(v) = self.minutes {
            (v, ReminderUnit::Minutes)
        } else {
            return None;
        };
        Some(Reminder { value, unit })
    }
}

/// Existing attachments for one slot, ready to seed the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSeed {
    pub key: SlotKey,
    pub max: MaxCount,
    pub existing: Vec<ExistingAsset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventDetailDto {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub from_time: String,
    #[serde(default)]
    pub to_time: String,
    #[serde(default)]
    pub shared: u8,
    #[serde(default)]
    pub rsvp_action: bool,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub set_reminders: Vec<ReminderDto>,
    #[serde(default)]
    pub cover_image: Option<AttachmentDto>,
    #[serde(default)]
    pub event_images: Vec<AttachmentDto>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventHydration {
    pub form: EventForm,
    pub slots: Vec<SlotSeed>,
}

pub fn decode_event(body: &[u8]) -> AppResult<EventHydration> {
    #[derive(Deserialize)]
    struct Envelope {
        event: EventDetailDto,
    }

    let dto = serde_json::from_slice::<Envelope>(body)
        .map(|e| e.event)
        .or_else(|_| serde_json::from_slice::<EventDetailDto>(body))
        .map_err(|e| deserialization_error(&e))?;

    let mut form = EventForm {
        event_name: dto.event_name,
        description: dto.description,
        venue: dto.venue,
        start_at: dto.from_time,
        end_at: dto.to_time,
        shared: if dto.shared == 0 { Shared::All } else { Shared::SelectedGroups },
        group_ids: dto.group_ids,
        rsvp_enabled: dto.rsvp_action,
        ..EventForm::default()
    };

    for reminder in &dto.set_reminders {
        let Some(value) = reminder.to_reminder() else {
            continue;
        };
        match &reminder.id {
            Some(id) => form.reminders.hydrate(id.clone(), value),
            None => {
                form.reminders.push_new(value);
            }
        }
    }

    let (cover_key, cover_max) = slots::event_cover();
    let (gallery_key, gallery_max) = slots::event_gallery();

    let slots = vec![
        SlotSeed {
            key: cover_key,
            max: cover_max,
            existing: dto
                .cover_image
                .into_iter()
                .map(|a| a.into_existing(AssetKind::Image))
                .collect(),
        },
        SlotSeed {
            key: gallery_key,
            max: gallery_max,
            existing: dto
                .event_images
                .into_iter()
                .map(|a| a.into_existing(AssetKind::Image))
                .collect(),
        },
    ];

    Ok(EventHydration { form, slots })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestigatorDto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub is_internal: bool,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionItemDto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub responsible_person: String,
    #[serde(default)]
    pub target_date: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootCauseDto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InjuredPersonDto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub injury_type: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyDamageDto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentDetailDto {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub incident_at: String,
    #[serde(default)]
    pub incident_over_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_category_id: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub support_required: bool,
    #[serde(default)]
    pub has_injury: bool,
    #[serde(default)]
    pub has_property_damage: bool,
    #[serde(default)]
    pub investigation_description: String,
    #[serde(default)]
    pub next_review_date: String,
    #[serde(default)]
    pub next_review_responsible: String,
    #[serde(default)]
    pub final_corrective_description: String,
    #[serde(default)]
    pub final_preventive_description: String,
    #[serde(default)]
    pub incident_investigations: Vec<InvestigatorDto>,
    #[serde(default)]
    pub corrective_actions: Vec<ActionItemDto>,
    #[serde(default)]
    pub preventive_actions: Vec<ActionItemDto>,
    #[serde(default)]
    pub root_causes: Vec<RootCauseDto>,
    #[serde(default)]
    pub injured_persons: Vec<InjuredPersonDto>,
    #[serde(default)]
    pub property_damages: Vec<PropertyDamageDto>,
    #[serde(default)]
    pub incident_images: Vec<AttachmentDto>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentHydration {
    pub form: IncidentForm,
    pub slots: Vec<SlotSeed>,
}

pub fn decode_incident(body: &[u8]) -> AppResult<IncidentHydration> {
    #[derive(Deserialize)]
    struct Envelope {
        incident: IncidentDetailDto,
    }

    let dto = serde_json::from_slice::<Envelope>(body)
        .map(|e| e.incident)
        .or_else(|_| serde_json::from_slice::<IncidentDetailDto>(body))
        .map_err(|e| deserialization_error(&e))?;

    let mut form = IncidentForm {
        description: dto.description,
        incident_at: dto.incident_at,
        incident_over_time: dto.incident_over_time,
        category_id: dto.category_id,
        sub_category_id: dto.sub_category_id,
        severity: dto.severity,
        support_required: dto.support_required,
        has_injury: dto.has_injury,
        has_property_damage: dto.has_property_damage,
        investigation_description: dto.investigation_description,
        next_review_date: dto.next_review_date,
        next_review_responsible: dto.next_review_responsible,
        final_corrective_description: dto.final_corrective_description,
        final_preventive_description: dto.final_preventive_description,
        ..IncidentForm::default()
    };

    for row in dto.incident_investigations {
        let value = Investigator {
            name: row.name,
            designation: row.designation,
            mobile: row.mobile,
            is_internal: row.is_internal,
            user_id: row.user_id,
        };
        match row.id {
            Some(id) => form.investigators.hydrate(id, value),
            None => {
                form.investigators.push_new(value);
            }
        }
    }

    for row in dto.corrective_actions {
        hydrate_action(&mut form.corrective_actions, row);
    }
    for row in dto.preventive_actions {
        hydrate_action(&mut form.preventive_actions, row);
    }

    for row in dto.root_causes {
        let value = RootCause {
            category_id: row.category_id,
            description: row.description,
        };
        match row.id {
            Some(id) => form.root_causes.hydrate(id, value),
            None => {
                form.root_causes.push_new(value);
            }
        }
    }

    for row in dto.injured_persons {
        let value = InjuredPerson {
            name: row.name,
            mobile: row.mobile,
            age: row.age,
            company: row.company,
            role: row.role,
            injury_type: row.injury_type,
            is_internal: row.is_internal,
        };
        match row.id {
            Some(id) => form.injured_persons.hydrate(id, value),
            None => {
                form.injured_persons.push_new(value);
            }
        }
    }

    for row in dto.property_damages {
        let value = PropertyDamage {
            category_id: row.category_id,
            description: row.description,
        };
        match row.id {
            Some(id) => form.property_damages.hydrate(id, value),
            None => {
                form.property_damages.push_new(value);
            }
        }
    }

    let (key, max) = slots::incident_images();
    let slots = vec![SlotSeed {
        key,
        max,
        existing: dto
            .incident_images
            .into_iter()
            .map(|a| a.into_existing(AssetKind::Image))
            .collect(),
    }];

    Ok(IncidentHydration { form, slots })
}

fn hydrate_action(list: &mut crate::form::TrackedList<ActionItem>, row: ActionItemDto) {
    let value = ActionItem {
        description: row.description,
        responsible_person: row.responsible_person,
        target_date: row.target_date,
        category_id: row.category_id,
    };
    match row.id {
        Some(id) => list.hydrate(id, value),
        None => {
            list.push_new(value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressDto {
    #[serde(default)]
    pub line_1: String,
    #[serde(default)]
    pub line_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pin_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDetailDto {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub configuration_type: String,
    #[serde(default)]
    pub address: AddressDto,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub project_creatives: Vec<AttachmentDto>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectHydration {
    pub form: ProjectForm,
    pub slots: Vec<SlotSeed>,
}

pub fn decode_project(body: &[u8]) -> AppResult<ProjectHydration> {
    #[derive(Deserialize)]
    struct Envelope {
        project: ProjectDetailDto,
    }

    let dto = serde_json::from_slice::<Envelope>(body)
        .map(|e| e.project)
        .or_else(|_| serde_json::from_slice::<ProjectDetailDto>(body))
        .map_err(|e| deserialization_error(&e))?;

    let form = ProjectForm {
        project_name: dto.project_name,
        description: dto.description,
        configuration_type: dto.configuration_type,
        address: crate::form::Address {
            line_1: dto.address.line_1,
            line_2: dto.address.line_2,
            city: dto.address.city,
            state: dto.address.state,
            pin_code: dto.address.pin_code,
        },
        amenities: dto.amenities,
    };

    let (key, max) = slots::project_creatives();
    let slots = vec![SlotSeed {
        key,
        max,
        existing: dto
            .project_creatives
            .into_iter()
            .map(|a| a.into_existing(AssetKind::Image))
            .collect(),
    }];

    Ok(ProjectHydration { form, slots })
}

/// Reference endpoints answer either a bare array or an object wrapped
/// under the collection name.
pub fn decode_reference(kind: ReferenceKind, body: &[u8]) -> AppResult<Vec<RefItem>> {
    #[derive(Deserialize)]
    struct ItemDto {
        #[serde(default, deserialize_with = "lenient_string")]
        id: String,
        #[serde(default)]
        name: String,
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| deserialization_error(&e))?;
    let items = match &value {
        Value::Array(_) => value,
        Value::Object(map) => map
            .get(kind.as_str())
            .or_else(|| map.get("data"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };

    let rows: Vec<ItemDto> =
        serde_json::from_value(items).map_err(|e| deserialization_error(&e))?;
    Ok(rows
        .into_iter()
        .map(|r| RefItem { id: r.id, name: r.name })
        .collect())
}
