use serde::Serialize;

/// Response envelope consumed by the admin UI: `{ code, msg, data }`
///
/// `code` is 0 on success; any other value is an application-level
/// failure with the reason in `msg`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub code: i32,
    pub msg: String,
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { code: 0, msg: "ok".to_string(), data: Some(data) }
    }

    pub fn err(code: i32, msg: impl Into<String>) -> Self {
        Self { code, msg: msg.into(), data: None }
    }
}
