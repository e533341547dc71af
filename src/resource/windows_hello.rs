//! IntuneDeviceEnrollmentWindowsHelloForBusiness
//!
//! Tenant-wide Windows Hello for Business enrollment settings. Lives in the
//! same Graph collection as the enrollment limit, told apart by
//! `@odata.type`.

use declarative::{
    Discriminator, Error, FieldSpec, FieldValue, Payload, RemoteObject, Resource,
    ResourceDescriptor,
};
use serde::{Deserialize, Serialize};

use super::enrollment_limit::COLLECTION;
use super::{optional_bool, optional_i64, optional_str, put};

pub const ODATA_TYPE: &str =
    "#microsoft.graph.deviceEnrollmentWindowsHelloForBusinessConfiguration";

const STATES: &[&str] = &["enabled", "disabled", "notConfigured"];
const CHARACTER_USAGE: &[&str] = &["allowed", "required", "disallowed"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::key("DisplayName"),
    FieldSpec::string("Description"),
    FieldSpec::string("State").one_of(STATES),
    FieldSpec::integer("PinMinimumLength").range(4, 127),
    FieldSpec::integer("PinMaximumLength").range(4, 127),
    FieldSpec::integer("PinExpirationInDays").range(0, 730),
    FieldSpec::integer("PinPreviousBlockCount").range(0, 50),
    FieldSpec::string("PinUppercaseCharactersUsage").one_of(CHARACTER_USAGE),
    FieldSpec::string("PinLowercaseCharactersUsage").one_of(CHARACTER_USAGE),
    FieldSpec::string("PinSpecialCharactersUsage").one_of(CHARACTER_USAGE),
    FieldSpec::boolean("SecurityDeviceRequired"),
    FieldSpec::boolean("UnlockWithBiometricsEnabled"),
    FieldSpec::boolean("RemotePassportEnabled"),
    FieldSpec::string("Identity").read_only(),
];

static DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
    type_name: "IntuneDeviceEnrollmentWindowsHelloForBusiness",
    collection: COLLECTION,
    key_property: "displayName",
    discriminator: Some(Discriminator::odata_type(ODATA_TYPE)),
    fields: FIELDS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct WindowsHelloForBusiness {
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pin_minimum_length: Option<i64>,
    #[serde(default)]
    pub pin_maximum_length: Option<i64>,
    #[serde(default)]
    pub pin_expiration_in_days: Option<i64>,
    #[serde(default)]
    pub pin_previous_block_count: Option<i64>,
    #[serde(default)]
    pub pin_uppercase_characters_usage: Option<String>,
    #[serde(default)]
    pub pin_lowercase_characters_usage: Option<String>,
    #[serde(default)]
    pub pin_special_characters_usage: Option<String>,
    #[serde(default)]
    pub security_device_required: Option<bool>,
    #[serde(default)]
    pub unlock_with_biometrics_enabled: Option<bool>,
    #[serde(default)]
    pub remote_passport_enabled: Option<bool>,
    #[serde(default)]
    pub identity: Option<String>,
}

impl Resource for WindowsHelloForBusiness {
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
            state: None,
            pin_minimum_length: None,
            pin_maximum_length: None,
            pin_expiration_in_days: None,
            pin_previous_block_count: None,
            pin_uppercase_characters_usage: None,
            pin_lowercase_characters_usage: None,
            pin_special_characters_usage: None,
            security_device_required: None,
            unlock_with_biometrics_enabled: None,
            remote_passport_enabled: None,
            identity: None,
        }
    }

    fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("DisplayName", self.display_name.as_str().into()),
            ("Description", self.description.clone().into()),
            ("State", self.state.clone().into()),
            ("PinMinimumLength", self.pin_minimum_length.into()),
            ("PinMaximumLength", self.pin_maximum_length.into()),
            ("PinExpirationInDays", self.pin_expiration_in_days.into()),
            ("PinPreviousBlockCount", self.pin_previous_block_count.into()),
            (
                "PinUppercaseCharactersUsage",
                self.pin_uppercase_characters_usage.clone().into(),
            ),
            (
                "PinLowercaseCharactersUsage",
                self.pin_lowercase_characters_usage.clone().into(),
            ),
            (
                "PinSpecialCharactersUsage",
                self.pin_special_characters_usage.clone().into(),
            ),
            ("SecurityDeviceRequired", self.security_device_required.into()),
            (
                "UnlockWithBiometricsEnabled",
                self.unlock_with_biometrics_enabled.into(),
            ),
            ("RemotePassportEnabled", self.remote_passport_enabled.into()),
            ("Identity", self.identity.clone().into()),
        ]
    }

    fn from_remote(object: &RemoteObject) -> declarative::Result<Self> {
        let d = &DESCRIPTOR;
        Ok(Self {
            display_name: object.required_str(d, "displayName")?.to_string(),
            description: optional_str(object, d, "description")?,
            state: optional_str(object, d, "state")?,
            pin_minimum_length: optional_i64(object, d, "pinMinimumLength")?,
            pin_maximum_length: optional_i64(object, d, "pinMaximumLength")?,
            pin_expiration_in_days: optional_i64(object, d, "pinExpirationInDays")?,
            pin_previous_block_count: optional_i64(object, d, "pinPreviousBlockCount")?,
            pin_uppercase_characters_usage: optional_str(
                object,
                d,
                "pinUppercaseCharactersUsage",
            )?,
            pin_lowercase_characters_usage: optional_str(
                object,
                d,
                "pinLowercaseCharactersUsage",
            )?,
            pin_special_characters_usage: optional_str(object, d, "pinSpecialCharactersUsage")?,
            security_device_required: optional_bool(object, d, "securityDeviceRequired")?,
            unlock_with_biometrics_enabled: optional_bool(
                object,
                d,
                "unlockWithBiometricsEnabled",
            )?,
            remote_passport_enabled: optional_bool(object, d, "remotePassportEnabled")?,
            identity: Some(object.id.clone()),
        })
    }

    fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        put(&mut payload, "displayName", Some(self.display_name.clone()));
        put(&mut payload, "description", self.description.clone());
        put(&mut payload, "state", self.state.clone());
        put(&mut payload, "pinMinimumLength", self.pin_minimum_length);
        put(&mut payload, "pinMaximumLength", self.pin_maximum_length);
        put(&mut payload, "pinExpirationInDays", self.pin_expiration_in_days);
        put(&mut payload, "pinPreviousBlockCount", self.pin_previous_block_count);
        put(
            &mut payload,
            "pinUppercaseCharactersUsage",
            self.pin_uppercase_characters_usage.clone(),
        );
        put(
            &mut payload,
            "pinLowercaseCharactersUsage",
            self.pin_lowercase_characters_usage.clone(),
        );
        put(
            &mut payload,
            "pinSpecialCharactersUsage",
            self.pin_special_characters_usage.clone(),
        );
        put(&mut payload, "securityDeviceRequired", self.security_device_required);
        put(
            &mut payload,
            "unlockWithBiometricsEnabled",
            self.unlock_with_biometrics_enabled,
        );
        put(&mut payload, "remotePassportEnabled", self.remote_passport_enabled);
        payload
    }

    fn validate(&self) -> declarative::Result<()> {
        if let (Some(min), Some(max)) = (self.pin_minimum_length, self.pin_maximum_length)
            && min > max
        {
            return Err(Error::validation(
                DESCRIPTOR.type_name,
                "PinMaximumLength",
                format!("{max} is less than PinMinimumLength ({min})"),
            ));
        }
        Ok(())
    }
}
