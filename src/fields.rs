//! Turning submitted form values into the placeholder → text mapping.

use serde::Deserialize;

use crate::model::FieldValues;

pub const GALLERY_PLACEHOLDER: &str = "{{GALLERY_TABLE}}";

/// Annexure anchors in the order they are laid out.
pub const ANNEXURE_PLACEHOLDERS: [&str; 5] = [
    "{{ANNEXURE1_TABLE}}",
    "{{ANNEXURE2_TABLE}}",
    "{{ANNEXURE3_TABLE}}",
    "{{ANNEXURE4_TABLE}}",
    "{{ANNEXURE5_TABLE}}",
];

/// `YYYY-MM-DD` → `DD-MM-YYYY`. Any three `-`-separated parts are reordered
/// as they are, without validation; other input is returned unchanged.
pub fn format_date(date: &str) -> String {
    match date.split('-').collect::<Vec<_>>().as_slice() {
        [year, month, day] => format!("{}-{}-{}", day, month, year),
        _ => date.to_string(),
    }
}

fn non_empty<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect()
}

/// First two lines joined by a comma, the third on its own line.
pub fn format_address(line1: &str, line2: &str, line3: &str) -> String {
    let mut parts = Vec::new();
    let first = non_empty(&[line1, line2]);
    if !first.is_empty() {
        parts.push(first.join(", "));
    }
    let third = line3.trim();
    if !third.is_empty() {
        parts.push(third.to_string());
    }
    parts.join("\n")
}

pub fn format_address_oneline(line1: &str, line2: &str, line3: &str) -> String {
    non_empty(&[line1, line2, line3]).join(", ")
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Person {
    pub prefix: String,
    pub name: String,
    pub designation: String,
}

/// `"Dr. A (Director)"` entries joined as `a`, `a and b`, `a, b and c`.
/// Entries without a name are dropped.
pub fn combine_person_list(people: &[Person]) -> String {
    let entries: Vec<String> = people
        .iter()
        .filter(|p| !p.name.trim().is_empty())
        .map(|p| {
            let name = p.name.trim();
            let mut entry = if p.prefix.is_empty() {
                name.to_string()
            } else {
                format!("{} {}", p.prefix, name)
            };
            let designation = p.designation.trim();
            if !designation.is_empty() {
                entry.push_str(&format!(" ({})", designation));
            }
            entry
        })
        .collect();

    match entries.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Raw report fields as submitted. Person lists may come either pre-joined
/// (`rrecl_people`, ...) or as structured entries (`sda`, ...); a pre-joined
/// value wins.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    pub training_type: String,
    pub event_date: String,
    pub submitted_to: String,
    pub submitted_by: String,
    pub address_line1: String,
    pub address_line2: String,
    pub address_line3: String,
    pub workshop_type: String,
    pub organizer: String,
    pub venue: String,
    pub date: String,
    pub cell_name: String,
    pub start_date: String,
    pub end_date: String,
    pub duration: String,
    pub participant_count: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,

    pub rrecl_people: String,
    pub guest_trainers: String,
    pub chief_guests: String,
    pub guidance_person: String,
    pub sda: Vec<Person>,
    pub guest: Vec<Person>,
    pub chief: Vec<Person>,
    pub guidance: Vec<Person>,
}

fn people(direct: &str, structured: &[Person]) -> String {
    let direct = direct.trim();
    if !direct.is_empty() {
        return direct.to_string();
    }
    combine_person_list(structured)
}

impl ReportForm {
    pub fn field_values(&self) -> FieldValues {
        let mut values = FieldValues::new();
        values.insert("{{EVENT_DATE}}", format_date(&self.event_date));
        values.insert("{{Submitted_to}}", self.submitted_to.as_str());
        values.insert("{{Submitted_by}}", self.submitted_by.as_str());
        values.insert(
            "{{ADDRESS}}",
            format_address(&self.address_line1, &self.address_line2, &self.address_line3),
        );
        values.insert(
            "{{ADDRESS_ONELINE}}",
            format_address_oneline(&self.address_line1, &self.address_line2, &self.address_line3),
        );
        values.insert("{{RRECL_PEOPLE}}", people(&self.rrecl_people, &self.sda));
        values.insert("{{WORKSHOP_TYPE}}", self.workshop_type.as_str());
        values.insert("{{GUEST_TRAINERS}}", people(&self.guest_trainers, &self.guest));
        values.insert("{{ORGANIZER}}", self.organizer.as_str());
        values.insert("{{VENUE}}", self.venue.as_str());
        values.insert("{{DATETIME}}", format_date(&self.date));
        values.insert("{{CELL_NAME}}", self.cell_name.as_str());
        values.insert("{{CHIEF_GUESTS}}", people(&self.chief_guests, &self.chief));
        values.insert("{{GUIDANCE_PERSON}}", people(&self.guidance_person, &self.guidance));
        values.insert("{{START_DATE}}", format_date(&self.start_date));
        values.insert("{{END_DATE}}", format_date(&self.end_date));
        values.insert("{{DURATION}}", self.duration.as_str());
        values.insert("{{PARTICIPANT_COUNT}}", self.participant_count.as_str());
        values.insert("{{TRAINING_TYPE}}", self.training_type.as_str());
        values.insert("{{CONTACT_PERSON}}", self.contact_person.as_str());
        values.insert("{{PHONE}}", self.phone.as_str());
        values.insert("{{EMAIL}}", self.email.as_str());
        values
    }
}
