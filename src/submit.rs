//! Submission assembly: walks the form aggregate, asset slots, and snapshot
//! diffs to build one outbound request body.
//!
//! The body is JSON when nothing binary is staged and `multipart/form-data`
//! otherwise. Multipart field names use the backend's bracketed convention
//! (`event[set_reminders_attributes][0][days]`), produced by flattening the
//! same JSON document the JSON path would have sent.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::assets::AssetStore;
use crate::form::{EventForm, IncidentForm, ProjectForm, Tracked, TrackedList};
use crate::{AppError, AppResult, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitMode {
    Publish,
    /// Draft saves reuse the submit shape with a distinct status flag.
    Draft,
}

/// Whether an empty optional section is omitted from the body or sent as an
/// empty collection. Some endpoints treat absence and emptiness differently;
/// this is per-endpoint configuration, not a core invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptySection {
    #[default]
    Omit,
    SendEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub mode: SubmitMode,
    pub empty_sections: EmptySection,
}

impl AssemblyOptions {
    #[must_use]
    pub const fn publish() -> Self {
        Self { mode: SubmitMode::Publish, empty_sections: EmptySection::Omit }
    }

    #[must_use]
    pub const fn draft() -> Self {
        Self { mode: SubmitMode::Draft, empty_sections: EmptySection::Omit }
    }
}

/// One assembled request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Multipart { content_type: String, body: Vec<u8> },
}

impl Payload {
    #[must_use]
    pub const fn content_type(&self) -> Option<&String> {
        match self {
            Self::Json(_) => None,
            Self::Multipart { content_type, .. } => Some(content_type),
        }
    }
}

/// Hand-assembled `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: format!("----AdminFormsBoundary{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(&mut self, name: &str, value: &str) {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
    }

    pub fn file(&mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
    }

    #[must_use]
    pub fn finish(mut self) -> (String, Vec<u8>) {
        let content_type = format!("multipart/form-data; boundary={}", self.boundary);
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (content_type, self.body)
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten a JSON document into bracketed form fields. Objects nest as
/// `prefix[key]`, arrays of objects index as `prefix[i]`, scalar arrays
/// repeat `prefix[]`, nulls are dropped.
fn flatten_value(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_value(&format!("{prefix}[{key}]"), nested, out);
            }
        }
        Value::Array(items) => {
            let all_objects = !items.is_empty() && items.iter().all(Value::is_object);
            if all_objects {
                for (idx, item) in items.iter().enumerate() {
                    flatten_value(&format!("{prefix}[{idx}]"), item, out);
                }
            } else {
                for item in items {
                    flatten_value(&format!("{prefix}[]"), item, out);
                }
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

/// Serialize a tracked list as an indexed attribute collection. Entries
/// flagged for deletion become `{id, _destroy: "1"}` rather than omissions,
/// so the server can tell "explicitly removed" from "never existed".
fn attributes_json<T: Serialize>(list: &TrackedList<T>) -> AppResult<Vec<Value>> {
    list.entries().iter().map(tracked_json).collect()
}

fn tracked_json<T: Serialize>(entry: &Tracked<T>) -> AppResult<Value> {
    if entry.destroy {
        return Ok(json!({ "id": entry.id.server_id(), "_destroy": "1" }));
    }

    let mut value = serde_json::to_value(&entry.value).map_err(|e| {
        AppError::new(ErrorKind::Serialization, "Failed to serialize form entry")
            .with_internal(e.to_string())
    })?;

    if let (Some(id), Some(obj)) = (entry.id.server_id(), value.as_object_mut()) {
        obj.insert("id".into(), json!(id));
    }
    Ok(value)
}

fn insert_section(
    object: &mut Map<String, Value>,
    key: &str,
    entries: Vec<Value>,
    policy: EmptySection,
) {
    if entries.is_empty() && policy == EmptySection::Omit {
        return;
    }
    object.insert(key.to_string(), Value::Array(entries));
}

/// Removed-id lists, computed per slot against the hydration snapshot.
fn removed_asset_sections(assets: &AssetStore, object: &mut Map<String, Value>) {
    for (slot, _) in assets.slots() {
        let removed = assets.diff_against_snapshot(slot);
        if removed.is_empty() {
            continue;
        }
        object.insert(
            format!("removed_{slot}"),
            Value::Array(removed.into_iter().map(Value::String).collect()),
        );
    }
}

/// Wrap the document under its namespace and pick JSON or multipart. Binary
/// parts are contributed only by assets with staged bytes; existing assets
/// without a local file need no re-upload and are skipped.
fn build(namespace: &str, document: Value, assets: &AssetStore) -> Payload {
    if assets.staged_count() == 0 {
        return Payload::Json(json!({ namespace: document }));
    }

    let mut fields = Vec::new();
    flatten_value(namespace, &document, &mut fields);

    let mut form = MultipartForm::new();
    for (name, value) in &fields {
        form.text(name, value);
    }

    for (slot, slot_assets) in assets.slots() {
        let single = assets.is_single(slot);
        for asset in slot_assets.iter().filter(|a| a.has_staged_bytes()) {
            let name = if single {
                format!("{namespace}[{slot}]")
            } else {
                format!("{namespace}[{slot}][]")
            };
            let bytes = asset.bytes.as_deref().unwrap_or_default();
            form.file(&name, &asset.name, &asset.content_type, bytes);
        }
    }

    let (content_type, body) = form.finish();
    Payload::Multipart { content_type, body }
}

pub fn assemble_event(
    form: &EventForm,
    assets: &AssetStore,
    opts: &AssemblyOptions,
) -> AppResult<Payload> {
    let mut object = Map::new();
    object.insert("event_name".into(), json!(form.event_name));
    object.insert("description".into(), json!(form.description));
    object.insert("venue".into(), json!(form.venue));
    object.insert("from_time".into(), json!(form.start_at));
    object.insert("to_time".into(), json!(form.end_at));
    object.insert("shared".into(), json!(form.shared.backend_value()));
    object.insert("rsvp_action".into(), json!(form.rsvp_enabled));

    if form.shared == crate::form::Shared::SelectedGroups {
        object.insert("group_ids".into(), json!(form.group_ids));
    }

    // Reminders carry a unit-specific key rather than a value/unit pair.
    let reminders: Vec<Value> = form
        .reminders
        .entries()
        .iter()
        .map(|entry| {
            if entry.destroy {
                json!({ "id": entry.id.server_id(), "_destroy": "1" })
            } else {
                let mut reminder = Map::new();
                if let Some(id) = entry.id.server_id() {
                    reminder.insert("id".into(), json!(id));
                }
                reminder.insert(
                    entry.value.unit.attribute().into(),
                    json!(entry.value.value),
                );
                Value::Object(reminder)
            }
        })
        .collect();
    insert_section(&mut object, "set_reminders_attributes", reminders, opts.empty_sections);

    if form.cover_image_cleared {
        object.insert("remove_cover_image".into(), json!("1"));
    }

    if opts.mode == SubmitMode::Draft {
        object.insert("status".into(), json!("draft"));
    }

    removed_asset_sections(assets, &mut object);
    Ok(build("event", Value::Object(object), assets))
}

pub fn assemble_incident(
    form: &IncidentForm,
    assets: &AssetStore,
    opts: &AssemblyOptions,
) -> AppResult<Payload> {
    let mut object = Map::new();
    object.insert("description".into(), json!(form.description));
    object.insert("incident_at".into(), json!(form.incident_at));
    object.insert("incident_over_time".into(), json!(form.incident_over_time));
    object.insert("category_id".into(), json!(form.category_id));
    object.insert("sub_category_id".into(), json!(form.sub_category_id));
    object.insert("severity".into(), json!(form.severity));
    object.insert("support_required".into(), json!(form.support_required));
    object.insert("has_injury".into(), json!(form.has_injury));
    object.insert("has_property_damage".into(), json!(form.has_property_damage));
    object.insert(
        "investigation_description".into(),
        json!(form.investigation_description),
    );
    object.insert("next_review_date".into(), json!(form.next_review_date));
    object.insert(
        "next_review_responsible".into(),
        json!(form.next_review_responsible),
    );
    object.insert(
        "final_corrective_description".into(),
        json!(form.final_corrective_description),
    );
    object.insert(
        "final_preventive_description".into(),
        json!(form.final_preventive_description),
    );

    let policy = opts.empty_sections;
    insert_section(
        &mut object,
        "incident_investigations_attributes",
        attributes_json(&form.investigators)?,
        policy,
    );
    insert_section(
        &mut object,
        "corrective_actions_attributes",
        attributes_json(&form.corrective_actions)?,
        policy,
    );
    insert_section(
        &mut object,
        "preventive_actions_attributes",
        attributes_json(&form.preventive_actions)?,
        policy,
    );
    insert_section(
        &mut object,
        "root_causes_attributes",
        attributes_json(&form.root_causes)?,
        policy,
    );
    insert_section(
        &mut object,
        "injured_persons_attributes",
        attributes_json(&form.injured_persons)?,
        policy,
    );
    insert_section(
        &mut object,
        "property_damages_attributes",
        attributes_json(&form.property_damages)?,
        policy,
    );

    if opts.mode == SubmitMode::Draft {
        object.insert("status".into(), json!("draft"));
    }

    removed_asset_sections(assets, &mut object);
    Ok(build("incident", Value::Object(object), assets))
}

pub fn assemble_project(
    form: &ProjectForm,
    assets: &AssetStore,
    opts: &AssemblyOptions,
) -> AppResult<Payload> {
    let mut object = Map::new();
    object.insert("project_name".into(), json!(form.project_name));
    object.insert("description".into(), json!(form.description));
    object.insert("configuration_type".into(), json!(form.configuration_type));

    // Nested address sub-record flattens into project[address][...] keys.
    object.insert(
        "address".into(),
        json!({
            "line_1": form.address.line_1,
            "line_2": form.address.line_2,
            "city": form.address.city,
            "state": form.address.state,
            "pin_code": form.address.pin_code,
        }),
    );

    if !form.amenities.is_empty() || opts.empty_sections == EmptySection::SendEmpty {
        object.insert("amenities".into(), json!(form.amenities));
    }

    if opts.mode == SubmitMode::Draft {
        object.insert("status".into(), json!("draft"));
    }

    removed_asset_sections(assets, &mut object);
    Ok(build("project", Value::Object(object), assets))
}
