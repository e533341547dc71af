//! IntuneDeviceEnrollmentLimitRestriction - how many devices a user may enroll

use declarative::{
    Discriminator, FieldSpec, FieldValue, Payload, RemoteObject, Resource, ResourceDescriptor,
};
use serde::{Deserialize, Serialize};

use super::{optional_i64, optional_str, put};

pub const COLLECTION: &str = "deviceManagement/deviceEnrollmentConfigurations";
pub const ODATA_TYPE: &str = "#microsoft.graph.deviceEnrollmentLimitConfiguration";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("DisplayName"),
    FieldSpec::string("Description"),
    FieldSpec::integer("Limit").range(1, 15),
    FieldSpec::string("Identity").read_only(),
];

static DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
    type_name: "IntuneDeviceEnrollmentLimitRestriction",
    collection: COLLECTION,
    key_property: "displayName",
    discriminator: Some(Discriminator::odata_type(ODATA_TYPE)),
    fields: FIELDS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct EnrollmentLimitRestriction {
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Maximum devices per user
    #[serde(default)]
    pub limit: Option<i64>,
    /// Graph object id, reported only
    #[serde(default)]
    pub identity: Option<String>,
}

impl Resource for EnrollmentLimitRestriction {
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
            identity: None,
        }
    }

    fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("DisplayName", self.display_name.as_str().into()),
            ("Description", self.description.clone().into()),
            ("Limit", self.limit.into()),
            ("Identity", self.identity.clone().into()),
        ]
    }

    fn from_remote(object: &RemoteObject) -> declarative::Result<Self> {
        Ok(Self {
            display_name: object.required_str(&DESCRIPTOR, "displayName")?.to_string(),
            description: optional_str(object, &DESCRIPTOR, "description")?,
            limit: optional_i64(object, &DESCRIPTOR, "limit")?,
            identity: Some(object.id.clone()),
        })
    }

    fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        put(&mut payload, "displayName", Some(self.display_name.clone()));
        put(&mut payload, "description", self.description.clone());
        put(&mut payload, "limit", self.limit);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{DesiredState, Error};
    use serde_json::json;

    fn demo(limit: i64) -> EnrollmentLimitRestriction {
        EnrollmentLimitRestriction {
            limit: Some(limit),
            ..EnrollmentLimitRestriction::with_natural_key("Demo")
        }
    }

    #[test]
    fn test_limit_bounds() {
        for limit in [0, 16, -1] {
            assert!(matches!(
                DesiredState::present(demo(limit)),
                Err(Error::Validation { .. })
            ));
        }
        for limit in [1, 15] {
            assert!(DesiredState::present(demo(limit)).is_ok());
        }
    }

    #[test]
    fn test_from_remote() {
        let object = RemoteObject::from_json(json!({
            "id": "a1b2",
            "@odata.type": ODATA_TYPE,
            "displayName": "Demo",
            "description": "Five devices",
            "limit": 5,
            "priority": 1,
        }))
        .unwrap();

        let record = EnrollmentLimitRestriction::from_remote(&object).unwrap();
        assert_eq!(record.display_name, "Demo");
        assert_eq!(record.description.as_deref(), Some("Five devices"));
        assert_eq!(record.limit, Some(5));
        assert_eq!(record.identity.as_deref(), Some("a1b2"));
    }

    #[test]
    fn test_payload_omits_identity() {
        let mut record = demo(5);
        record.identity = Some("a1b2".into());
        let payload = record.to_payload();
        assert_eq!(payload["limit"], json!(5));
        assert!(!payload.contains_key("identity"));
        assert!(!payload.contains_key("description"));
    }

    #[test]
    fn test_identity_never_compared() {
        assert!(DESCRIPTOR.is_excluded("Identity"));
        assert!(!DESCRIPTOR.is_excluded("Limit"));
    }

    #[test]
    fn test_deserialize_pascal_case() {
        let record: EnrollmentLimitRestriction =
            toml::from_str("DisplayName = \"Demo\"\nLimit = 5\n").unwrap();
        assert_eq!(record, demo(5));

        let unknown = toml::from_str::<EnrollmentLimitRestriction>(
            "DisplayName = \"Demo\"\nLimits = 5\n",
        );
        assert!(unknown.is_err());
    }
}
