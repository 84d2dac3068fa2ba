//! Simulated contact data for places and services found in the itinerary

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One contact entry as returned by the contacts prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "tipo", default)]
    pub kind: String,
    #[serde(default)]
    pub web: String,
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Contacts answer. Models sometimes wrap the list in an object, both shapes
/// are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ContactListShape")]
#[serde(into = "Vec<Contact>")]
pub struct ContactList(pub Vec<Contact>);

#[derive(Deserialize)]
#[serde(untagged)]
enum ContactListShape {
    List(Vec<Contact>),
    Wrapped {
        #[serde(alias = "contacts", alias = "lugares")]
        contactos: Vec<Contact>,
    },
}

impl From<ContactListShape> for ContactList {
    fn from(shape: ContactListShape) -> Self {
        match shape {
            ContactListShape::List(list) | ContactListShape::Wrapped { contactos: list } => {
                Self(list)
            }
        }
    }
}

impl From<ContactList> for Vec<Contact> {
    fn from(list: ContactList) -> Self {
        list.0
    }
}

impl ContactList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contact> {
        self.0.iter()
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "📍 {} ({})", self.name, self.kind)?;
        writeln!(f, "   🌐 Web: {}", self.web)?;
        writeln!(f, "   📞 Tel: {}", self.phone)?;
        writeln!(f, "   ✉️  Email: {}", self.email)?;
        write!(f, "{}", "-".repeat(50))
    }
}
