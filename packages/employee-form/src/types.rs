//! Field model shared by validation, the session machine, and the clients.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldParseError;

/// One of the seven fields of an employee registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    EmployeeId,
    Name,
    Email,
    PhoneNumber,
    Department,
    DateOfJoining,
    Role,
}

impl Field {
    /// All fields in form order.
    pub const ALL: [Field; 7] = [
        Field::EmployeeId,
        Field::Name,
        Field::Email,
        Field::PhoneNumber,
        Field::Department,
        Field::DateOfJoining,
        Field::Role,
    ];

    /// Key used on the wire by both remote services.
    pub fn key(&self) -> &'static str {
        match self {
            Field::EmployeeId => "employeeID",
            Field::Name => "name",
            Field::Email => "email",
            Field::PhoneNumber => "phoneNumber",
            Field::Department => "department",
            Field::DateOfJoining => "dateOfJoining",
            Field::Role => "role",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::EmployeeId => "Employee ID",
            Field::Name => "Name",
            Field::Email => "Email",
            Field::PhoneNumber => "Phone Number",
            Field::Department => "Department",
            Field::DateOfJoining => "Date of Joining",
            Field::Role => "Role",
        }
    }

    /// Identity fields feed the duplicate check.
    pub fn is_identity(&self) -> bool {
        matches!(self, Field::EmployeeId | Field::Email)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = FieldParseError;

    /// Accepts the wire key in any case (`employeeID`, `employeeid`) or the
    /// snake_case name (`employee_id`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        Field::ALL
            .into_iter()
            .find(|field| field.key().to_ascii_lowercase() == normalized)
            .ok_or_else(|| FieldParseError::Unknown(s.trim().to_string()))
    }
}

/// Current values of every field. Also the create-record request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub department: String,
    #[serde(rename = "dateOfJoining")]
    pub date_of_joining: String,
    pub role: String,
}

impl FieldSet {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::EmployeeId => &self.employee_id,
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::PhoneNumber => &self.phone_number,
            Field::Department => &self.department,
            Field::DateOfJoining => &self.date_of_joining,
            Field::Role => &self.role,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::EmployeeId => &mut self.employee_id,
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::PhoneNumber => &mut self.phone_number,
            Field::Department => &mut self.department,
            Field::DateOfJoining => &mut self.date_of_joining,
            Field::Role => &mut self.role,
        };
        *slot = value.into();
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// True when every field is empty.
    pub fn is_blank(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_empty())
    }
}

/// Validation failures keyed by field. Only fields currently failing appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSet(BTreeMap<Field, String>);

impl ErrorSet {
    pub(crate) fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl Serialize for Field {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// A previously stored employee returned by the lookup service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateRecord {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub department: String,
    #[serde(rename = "dateOfJoining")]
    pub date_of_joining: String,
    pub role: String,
}

/// Outcome of a duplicate lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistsResult {
    NotFound,
    Exists(DuplicateRecord),
}

/// Identifies one dispatched duplicate check. Later checks carry larger tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckToken(u64);

impl CheckToken {
    pub(crate) fn next(self) -> Self {
        CheckToken(self.0 + 1)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CheckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one submission attempt. Reset supersedes the attempt in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmitToken(u64);

impl SubmitToken {
    pub(crate) fn next(self) -> Self {
        SubmitToken(self.0 + 1)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
