use serde::{Deserialize, Serialize};

/// One switchable output of a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "devName", default)]
    pub name: String,
}

/// A device as returned by the cloud device list
///
/// The cloud does not know which session asked for the list, so the client
/// stamps the owning user id with [`DeviceDescriptor::with_user_id`] before
/// handing descriptors out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    #[serde(rename = "devName", default)]
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub device_type: String,
    /// MQTT broker host for this device; empty means the default broker
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Owning user id, empty until stamped by the client
    #[serde(skip)]
    pub user_id: String,
}

impl DeviceDescriptor {
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }
}
