use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::error::FieldErrors;

/// Server-assigned student identifier.
///
/// json-server emits numeric ids for seeded data and string ids for records
/// it creates itself, so both are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for StudentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<u64> for StudentId {
  fn from(id: u64) -> Self {
    Self(id.to_string())
  }
}

impl<'de> Deserialize<'de> for StudentId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
      Number(u64),
      Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
      RawId::Number(n) => StudentId(n.to_string()),
      RawId::Text(s) => StudentId(s),
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  #[default]
  Other,
}

impl Gender {
  pub fn label(&self) -> &'static str {
    match self {
      Gender::Male => "Male",
      Gender::Female => "Female",
      Gender::Other => "Other",
    }
  }

  pub fn all() -> &'static [Gender] {
    &[Gender::Male, Gender::Female, Gender::Other]
  }

  /// Next option, wrapping
  pub fn cycle(self, delta: i32) -> Gender {
    let all = Self::all();
    let idx = all.iter().position(|g| *g == self).unwrap_or(0) as i32;
    all[(idx + delta).rem_euclid(all.len() as i32) as usize]
  }
}

impl<'de> Deserialize<'de> for Gender {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(match raw.trim().to_lowercase().as_str() {
      "male" => Gender::Male,
      "female" => Gender::Female,
      _ => Gender::Other,
    })
  }
}

/// A student record as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
  pub id: StudentId,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub gender: Gender,
  #[serde(default)]
  pub country: String,
  #[serde(default)]
  pub avatar: String,
  #[serde(default)]
  pub btc_address: String,
}

impl Student {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
      .trim()
      .to_string()
  }
}

/// Editable fields of a student, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
  Email,
  Gender,
  Country,
  FirstName,
  LastName,
  Avatar,
  BtcAddress,
}

impl FormField {
  pub fn all() -> &'static [FormField] {
    &[
      FormField::Email,
      FormField::Gender,
      FormField::Country,
      FormField::FirstName,
      FormField::LastName,
      FormField::Avatar,
      FormField::BtcAddress,
    ]
  }

  /// Wire name, also the key used in validation payloads
  pub fn name(&self) -> &'static str {
    match self {
      FormField::Email => "email",
      FormField::Gender => "gender",
      FormField::Country => "country",
      FormField::FirstName => "first_name",
      FormField::LastName => "last_name",
      FormField::Avatar => "avatar",
      FormField::BtcAddress => "btc_address",
    }
  }

  pub fn from_name(name: &str) -> Option<FormField> {
    FormField::all().iter().copied().find(|f| f.name() == name)
  }

  pub fn label(&self) -> &'static str {
    match self {
      FormField::Email => "Email address",
      FormField::Gender => "Gender",
      FormField::Country => "Country",
      FormField::FirstName => "First Name",
      FormField::LastName => "Last Name",
      FormField::Avatar => "Avatar",
      FormField::BtcAddress => "BTC Address",
    }
  }

  pub fn is_required(&self) -> bool {
    !matches!(self, FormField::Avatar)
  }
}

/// A student without its id: the create payload and the form's local state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentForm {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub gender: Gender,
  pub country: String,
  pub avatar: String,
  pub btc_address: String,
}

impl StudentForm {
  /// Text value of a field (gender as its wire name)
  pub fn value(&self, field: FormField) -> &str {
    match field {
      FormField::Email => &self.email,
      FormField::Gender => match self.gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
      },
      FormField::Country => &self.country,
      FormField::FirstName => &self.first_name,
      FormField::LastName => &self.last_name,
      FormField::Avatar => &self.avatar,
      FormField::BtcAddress => &self.btc_address,
    }
  }

  /// Set a field by name. Gender values go through the same lenient parsing
  /// as server data.
  pub fn set(&mut self, field: FormField, value: impl Into<String>) {
    let value = value.into();
    match field {
      FormField::Email => self.email = value,
      FormField::Gender => {
        self.gender = serde_json::from_value(serde_json::Value::String(value)).unwrap_or_default()
      }
      FormField::Country => self.country = value,
      FormField::FirstName => self.first_name = value,
      FormField::LastName => self.last_name = value,
      FormField::Avatar => self.avatar = value,
      FormField::BtcAddress => self.btc_address = value,
    }
  }

  /// Local check that every required text field is filled in
  pub fn missing_fields(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in FormField::all() {
      if field.is_required() && self.value(*field).trim().is_empty() {
        errors.insert(field.name(), "required");
      }
    }
    errors
  }
}

impl From<Student> for StudentForm {
  fn from(s: Student) -> Self {
    Self {
      first_name: s.first_name,
      last_name: s.last_name,
      email: s.email,
      gender: s.gender,
      country: s.country,
      avatar: s.avatar,
      btc_address: s.btc_address,
    }
  }
}

/// Partial update body; unset fields are left out of the request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gender: Option<Gender>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub btc_address: Option<String>,
}

impl From<StudentForm> for StudentPatch {
  fn from(f: StudentForm) -> Self {
    Self {
      first_name: Some(f.first_name),
      last_name: Some(f.last_name),
      email: Some(f.email),
      gender: Some(f.gender),
      country: Some(f.country),
      avatar: Some(f.avatar),
      btc_address: Some(f.btc_address),
    }
  }
}

/// One page of students plus the server's total count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentPage {
  pub students: Vec<Student>,
  pub total_count: u64,
}

impl StudentPage {
  pub fn total_pages(&self, limit: u32) -> u32 {
    if limit == 0 {
      return 0;
    }
    self.total_count.div_ceil(limit as u64) as u32
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_student_id_number_or_string() {
    let a: Student = serde_json::from_value(json!({ "id": 7, "email": "a@b.c" })).unwrap();
    let b: Student = serde_json::from_value(json!({ "id": "7" })).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.id.as_str(), "7");
  }

  #[test]
  fn test_gender_lenient() {
    let s: Student = serde_json::from_value(json!({ "id": 1, "gender": "Female" })).unwrap();
    assert_eq!(s.gender, Gender::Female);
    let s: Student = serde_json::from_value(json!({ "id": 1, "gender": "Agender" })).unwrap();
    assert_eq!(s.gender, Gender::Other);
    let s: Student = serde_json::from_value(json!({ "id": 1, "gender": null })).unwrap();
    assert_eq!(s.gender, Gender::Other);
  }

  #[test]
  fn test_gender_cycle() {
    assert_eq!(Gender::Male.cycle(1), Gender::Female);
    assert_eq!(Gender::Male.cycle(-1), Gender::Other);
    assert_eq!(Gender::Other.cycle(1), Gender::Male);
  }

  #[test]
  fn test_form_serializes_without_id() {
    let form = StudentForm {
      email: "x@y.z".into(),
      gender: Gender::Male,
      ..Default::default()
    };
    let value = serde_json::to_value(&form).unwrap();
    assert!(value.get("id").is_none());
    assert_eq!(value["gender"], "male");
  }

  #[test]
  fn test_form_set_and_missing_fields() {
    let mut form = StudentForm::default();
    form.set(FormField::Email, "a@b.c");
    form.set(FormField::Gender, "male");
    form.set(FormField::Country, "Norway");

    assert_eq!(form.gender, Gender::Male);

    let missing = form.missing_fields();
    assert_eq!(missing.get("first_name"), Some("required"));
    assert_eq!(missing.get("btc_address"), Some("required"));
    assert_eq!(missing.get("email"), None);
    assert_eq!(missing.get("avatar"), None);
  }

  #[test]
  fn test_patch_skips_unset() {
    let patch = StudentPatch {
      country: Some("Chile".into()),
      ..Default::default()
    };
    assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "country": "Chile" }));
  }

  #[test]
  fn test_total_pages() {
    let page = |total| StudentPage {
      students: Vec::new(),
      total_count: total,
    };
    assert_eq!(page(0).total_pages(10), 0);
    assert_eq!(page(10).total_pages(10), 1);
    assert_eq!(page(11).total_pages(10), 2);
    assert_eq!(page(95).total_pages(10), 10);
  }
}
