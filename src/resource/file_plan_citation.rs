//! SCFilePlanPropertyCitation - retention file plan citations

use declarative::{FieldSpec, FieldValue, Payload, RemoteObject, Resource, ResourceDescriptor};
use serde::{Deserialize, Serialize};

use super::{optional_str, put};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("Name"),
    FieldSpec::string("CitationUrl").pattern(r"^https?://\S+$"),
    FieldSpec::string("CitationJurisdiction"),
];

static DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
    type_name: "SCFilePlanPropertyCitation",
    collection: "security/labels/citations",
    key_property: "displayName",
    discriminator: None,
    fields: FIELDS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FilePlanPropertyCitation {
    pub name: String,
    #[serde(default)]
    pub citation_url: Option<String>,
    #[serde(default)]
    pub citation_jurisdiction: Option<String>,
}

impl Resource for FilePlanPropertyCitation {
    fn descriptor() -> &'static ResourceDescriptor {
        &DESCRIPTOR
    }

    fn natural_key(&self) -> &str {
        &self.name
    }

    fn with_natural_key(key: &str) -> Self {
        Self {
            name: key.to_string(),
            citation_url: None,
            citation_jurisdiction: None,
        }
    }

    fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("Name", self.name.as_str().into()),
            ("CitationUrl", self.citation_url.clone().into()),
            (
                "CitationJurisdiction",
                self.citation_jurisdiction.clone().into(),
            ),
        ]
    }

    fn from_remote(object: &RemoteObject) -> declarative::Result<Self> {
        Ok(Self {
            name: object.required_str(&DESCRIPTOR, "displayName")?.to_string(),
            citation_url: optional_str(object, &DESCRIPTOR, "citationUrl")?,
            citation_jurisdiction: optional_str(object, &DESCRIPTOR, "citationJurisdiction")?,
        })
    }

    fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        put(&mut payload, "displayName", Some(self.name.clone()));
        put(&mut payload, "citationUrl", self.citation_url.clone());
        put(
            &mut payload,
            "citationJurisdiction",
            self.citation_jurisdiction.clone(),
        );
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::DesiredState;
    use serde_json::json;

    fn gdpr(url: &str) -> FilePlanPropertyCitation {
        FilePlanPropertyCitation {
            citation_url: Some(url.to_string()),
            citation_jurisdiction: Some("EU".into()),
            ..FilePlanPropertyCitation::with_natural_key("GDPR")
        }
    }

    #[test]
    fn test_citation_url_pattern() {
        assert!(DesiredState::present(gdpr("https://gdpr-info.eu/")).is_ok());
        assert!(DesiredState::present(gdpr("http://example.com/a")).is_ok());
        assert!(DesiredState::present(gdpr("ftp://example.com")).is_err());
        assert!(DesiredState::present(gdpr("https://has space")).is_err());
    }

    #[test]
    fn test_no_discriminator_in_payload() {
        let payload = declarative::writer::payload(&gdpr("https://gdpr-info.eu/"));
        assert_eq!(payload["displayName"], json!("GDPR"));
        assert_eq!(payload["citationJurisdiction"], json!("EU"));
        assert!(!payload.contains_key("@odata.type"));
    }

    #[test]
    fn test_from_remote() {
        let object = RemoteObject::from_json(json!({
            "id": "c1",
            "displayName": "GDPR",
            "citationUrl": "https://gdpr-info.eu/",
            "citationJurisdiction": "EU",
            "createdBy": {"user": {"displayName": "Admin"}},
        }))
        .unwrap();
        assert_eq!(
            FilePlanPropertyCitation::from_remote(&object).unwrap(),
            gdpr("https://gdpr-info.eu/")
        );
    }
}
