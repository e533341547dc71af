//! Test resource shared by the engine's unit tests

use crate::error::{Error, Result};
use crate::gateway::{MockGateway, Payload, RemoteObject};
use crate::resource::Resource;
use crate::schema::{Discriminator, FieldSpec, ResourceDescriptor};
use crate::types::FieldValue;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const COLLECTION: &str = "deviceManagement/deviceEnrollmentConfigurations";
pub const LIMIT_TYPE: &str = "#microsoft.graph.deviceEnrollmentLimitConfiguration";
pub const OTHER_TYPE: &str = "#microsoft.graph.deviceEnrollmentPlatformRestrictionsConfiguration";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("DisplayName"),
    FieldSpec::string("Description"),
    FieldSpec::integer("Limit").range(1, 15),
];

const DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
    type_name: "EnrollmentLimit",
    collection: COLLECTION,
    key_property: "displayName",
    discriminator: Some(Discriminator::odata_type(LIMIT_TYPE)),
    fields: FIELDS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnrollmentLimit {
    pub display_name: String,
    pub description: Option<String>,
    pub limit: Option<i64>,
}

impl EnrollmentLimit {
    pub fn new(name: &str, limit: i64) -> Self {
        Self {
            display_name: name.to_string(),
            description: None,
            limit: Some(limit),
        }
    }
}

impl Resource for EnrollmentLimit {
    fn descriptor() -> &'static ResourceDescriptor {
        &DESCRIPTOR
    }

    fn natural_key(&self) -> &str {
        &self.display_name
    }

    fn with_natural_key(key: &str) -> Self {
        Self {
            display_name: key.to_string(),
            description: None,
            limit: None,
        }
    }

    fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("DisplayName", self.display_name.as_str().into()),
            ("Description", self.description.clone().into()),
            ("Limit", self.limit.into()),
        ]
    }

    fn from_remote(object: &RemoteObject) -> Result<Self> {
        Ok(Self {
            display_name: object.required_str(&DESCRIPTOR, "displayName")?.to_string(),
            description: object.str_field("description").map(String::from),
            limit: match object.properties.get("limit") {
                None | Some(Value::Null) => None,
                Some(value) => Some(value.as_i64().ok_or_else(|| {
                    Error::mapping(DESCRIPTOR.type_name, "limit is not an integer")
                })?),
            },
        })
    }

    fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("displayName".into(), Value::from(self.display_name.clone()));
        if let Some(description) = &self.description {
            payload.insert("description".into(), Value::from(description.clone()));
        }
        if let Some(limit) = self.limit {
            payload.insert("limit".into(), Value::from(limit));
        }
        payload
    }
}

/// Store a limit configuration the way Graph returns it
pub fn seed_limit(gateway: &MockGateway, name: &str, limit: i64) -> RemoteObject {
    gateway.seed(
        COLLECTION,
        json!({
            "@odata.type": LIMIT_TYPE,
            "displayName": name,
            "limit": limit,
        }),
    )
}

/// Store an object of another type in the same collection
pub fn seed_other(gateway: &MockGateway, name: &str) -> RemoteObject {
    gateway.seed(
        COLLECTION,
        json!({
            "@odata.type": OTHER_TYPE,
            "displayName": name,
        }),
    )
}
